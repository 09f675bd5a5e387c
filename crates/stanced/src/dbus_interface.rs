use crate::engine::{EngineError, EngineHandle, EngineResult, Shared};
use crate::event::{build_event, epoch_ms};
use stance_core::overlay::{project_body, OverlayParams};
use stance_core::{connections_for, BodyPartFilter, EventThrottle, FitMode, Rotation};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use zbus::interface;
use zbus::object_server::SignalEmitter;

pub const BUS_NAME: &str = "org.freedesktop.Stance1";
pub const OBJECT_PATH: &str = "/org/freedesktop/Stance1";

/// D-Bus interface for the stance pose streaming daemon.
///
/// Bus name: org.freedesktop.Stance1
/// Object path: /org/freedesktop/Stance1
pub struct StanceService {
    engine: EngineHandle,
}

impl StanceService {
    pub fn new(engine: EngineHandle) -> Self {
        Self { engine }
    }
}

#[interface(name = "org.freedesktop.Stance1")]
impl StanceService {
    /// Toggle between the front and back camera. Returns the facing in
    /// effect afterwards ("front" or "back"), which is unchanged when
    /// the target camera is unavailable.
    async fn switch_camera(&self) -> zbus::fdo::Result<String> {
        tracing::info!("switch_camera requested");
        let facing = self.engine.switch_camera().await.map_err(to_fdo)?;
        Ok(facing.to_string())
    }

    /// Replace the body part filter. Takes a JSON object with camelCase
    /// category keys; missing keys default to enabled.
    async fn set_filter(&self, filter_json: &str) -> zbus::fdo::Result<()> {
        let filter: BodyPartFilter = serde_json::from_str(filter_json)
            .map_err(|e| zbus::fdo::Error::InvalidArgs(format!("bad filter: {e}")))?;
        tracing::info!(?filter, "set_filter");
        self.engine.set_filter(filter);
        Ok(())
    }

    /// Cap the Landmark signal rate in events per second; 0 removes the cap.
    async fn set_event_rate(&self, events_per_second: f64) -> zbus::fdo::Result<()> {
        tracing::info!(events_per_second, "set_event_rate");
        self.engine.set_event_rate(events_per_second);
        Ok(())
    }

    /// Enable or disable pose streaming. Capture keeps running either way.
    async fn set_pose_enabled(&self, enabled: bool) -> zbus::fdo::Result<()> {
        tracing::info!(enabled, "set_pose_enabled");
        self.engine.set_pose_enabled(enabled);
        Ok(())
    }

    /// Set the viewport the overlay projects into.
    async fn set_viewport(&self, width: u32, height: u32) -> zbus::fdo::Result<()> {
        if width == 0 || height == 0 {
            return Err(zbus::fdo::Error::InvalidArgs(
                "viewport dimensions must be nonzero".into(),
            ));
        }
        tracing::info!(width, height, "set_viewport");
        self.engine.set_viewport(width, height);
        Ok(())
    }

    /// Set the image fit mode: "contain" or "cover".
    async fn set_fit_mode(&self, fit: &str) -> zbus::fdo::Result<()> {
        let fit: FitMode = fit.parse().map_err(zbus::fdo::Error::InvalidArgs)?;
        tracing::info!(?fit, "set_fit_mode");
        self.engine.set_fit_mode(fit);
        Ok(())
    }

    /// Set the display rotation in degrees (0, 90, 180 or 270).
    async fn set_rotation(&self, degrees: u32) -> zbus::fdo::Result<()> {
        let rotation = Rotation::from_degrees(degrees).ok_or_else(|| {
            zbus::fdo::Error::InvalidArgs(format!(
                "rotation must be 0, 90, 180 or 270, got {degrees}"
            ))
        })?;
        tracing::info!(degrees, "set_rotation");
        self.engine.set_rotation(rotation);
        Ok(())
    }

    /// Return daemon status information as JSON.
    async fn status(&self) -> zbus::fdo::Result<String> {
        let status = self.engine.status();
        Ok(serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "facing": status.facing.to_string(),
            "state": status.state.to_string(),
            "poseEnabled": status.pose_enabled,
            "eventsPerSecond": status.events_per_second,
            "framesSeen": status.frames_seen,
            "framesProcessed": status.frames_processed,
            "framesDropped": status.frames_dropped,
            "eventsEmitted": status.events_emitted,
            "measuredFps": status.measured_fps,
            "lastInferenceMs": status.last_inference_ms,
            "startedAt": status.started_at,
        })
        .to_string())
    }

    /// Return the newest projected overlay as JSON, or "{}" before the
    /// first pose.
    async fn overlay(&self) -> zbus::fdo::Result<String> {
        match self.engine.latest_overlay() {
            Some(overlay) => serde_json::to_string(&overlay)
                .map_err(|e| zbus::fdo::Error::Failed(format!("overlay serialization: {e}"))),
            None => Ok("{}".into()),
        }
    }

    /// One JSON landmark event per pose result that clears the rate cap.
    #[zbus(signal)]
    pub async fn landmark(emitter: &SignalEmitter<'_>, payload: &str) -> zbus::Result<()>;
}

fn to_fdo(e: EngineError) -> zbus::fdo::Error {
    zbus::fdo::Error::Failed(e.to_string())
}

/// Forward engine results onto the bus as Landmark signals.
///
/// The latest overlay is refreshed from every result; the rate cap only
/// gates signal emission. Runs until the engine closes the result
/// channel.
pub async fn run_event_pump(
    mut results: mpsc::Receiver<EngineResult>,
    shared: Arc<Shared>,
    connection: zbus::Connection,
) {
    let emitter = match SignalEmitter::new(&connection, OBJECT_PATH) {
        Ok(emitter) => emitter,
        Err(e) => {
            tracing::error!(error = %e, "failed to create signal emitter");
            return;
        }
    };

    let started = Instant::now();
    let start_timestamp = epoch_ms();
    let mut throttle = EventThrottle::new(shared.live().events_per_second);

    while let Some(result) = results.recv().await {
        let live = shared.live();

        let params = OverlayParams {
            image_width: result.width as f32,
            image_height: result.height as f32,
            viewport_width: live.viewport_width as f32,
            viewport_height: live.viewport_height as f32,
            fit: live.fit_mode,
            rotation: live.rotation,
        };
        let connections = connections_for(&live.filter);
        shared.set_overlay(project_body(&params, &result.pose.keypoints, &connections));

        throttle.set_rate(live.events_per_second);
        if !throttle.should_emit(started.elapsed().as_millis() as u64) {
            continue;
        }

        let event = build_event(
            &result.pose,
            result.width,
            result.height,
            result.presentation_ms as i64,
            result.frame_number,
            start_timestamp,
        );
        let payload = match serde_json::to_string(&event) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(error = %e, "failed to serialize landmark event");
                continue;
            }
        };

        match StanceService::landmark(&emitter, &payload).await {
            Ok(()) => shared.stats.inc_events_emitted(),
            Err(e) => tracing::warn!(error = %e, "failed to emit landmark signal"),
        }
    }

    tracing::info!("event pump exiting");
}
