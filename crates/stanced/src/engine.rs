//! Capture and inference engine.
//!
//! Two dedicated OS threads joined by a one-deep frame slot. The
//! "stance-capture" thread pulls frames from the active source and
//! publishes them keep-only-latest; the "stance-infer" thread runs the
//! pose model on whatever is newest and forwards results to the event
//! pump. Inference never blocks capture and a slow model only lowers
//! the landmark rate, never the frame age.

use crate::config::Config;
use crate::slot::LatestSlot;
use chrono::{DateTime, Utc};
use stance_core::{BodyPartFilter, FitMode, Overlay, PoseLandmarker, PoseResult, Rotation};
use stance_hw::camera::{DEFAULT_HEIGHT, DEFAULT_WIDTH};
use stance_hw::{flip_horizontal, Camera, Facing, FacingState, FrameSource, SyntheticSource};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{mpsc, oneshot};

const REOPEN_DELAY: Duration = Duration::from_millis(500);

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("camera error: {0}")]
    Camera(#[from] stance_hw::CameraError),
    #[error("landmarker error: {0}")]
    Landmarker(#[from] stance_core::LandmarkerError),
    #[error("engine thread exited")]
    ChannelClosed,
}

/// Lifecycle of the capture pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Running,
    /// Capture failed; the engine is polling the device to resume.
    Interrupted,
    Stopped,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Running => f.write_str("running"),
            SessionState::Interrupted => f.write_str("interrupted"),
            SessionState::Stopped => f.write_str("stopped"),
        }
    }
}

/// Settings adjustable at runtime through the D-Bus interface.
#[derive(Debug, Clone, Copy)]
pub struct LiveConfig {
    pub filter: BodyPartFilter,
    pub events_per_second: f64,
    pub pose_enabled: bool,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub fit_mode: FitMode,
    pub rotation: Rotation,
}

/// Rolling engine counters, all atomic.
#[derive(Default)]
pub struct Stats {
    frames_seen: AtomicU64,
    frames_processed: AtomicU64,
    frames_dropped: AtomicU64,
    events_emitted: AtomicU64,
    last_inference_ms: AtomicU64,
    /// Exponentially smoothed capture rate in millihertz.
    fps_millis: AtomicU64,
}

impl Stats {
    fn inc_frames_seen(&self) {
        self.frames_seen.fetch_add(1, Ordering::Relaxed);
    }

    fn inc_frames_dropped(&self) {
        self.frames_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_events_emitted(&self) {
        self.events_emitted.fetch_add(1, Ordering::Relaxed);
    }

    fn record_inference(&self, elapsed_ms: u64) {
        self.frames_processed.fetch_add(1, Ordering::Relaxed);
        self.last_inference_ms.store(elapsed_ms, Ordering::Relaxed);
    }

    fn record_frame_gap(&self, gap_ms: u64) {
        if gap_ms == 0 {
            return;
        }
        let instant = 1_000_000 / gap_ms;
        let prev = self.fps_millis.load(Ordering::Relaxed);
        let next = if prev == 0 { instant } else { (prev * 9 + instant) / 10 };
        self.fps_millis.store(next, Ordering::Relaxed);
    }

    pub fn frames_seen(&self) -> u64 {
        self.frames_seen.load(Ordering::Relaxed)
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed.load(Ordering::Relaxed)
    }

    pub fn frames_dropped(&self) -> u64 {
        self.frames_dropped.load(Ordering::Relaxed)
    }

    pub fn events_emitted(&self) -> u64 {
        self.events_emitted.load(Ordering::Relaxed)
    }

    pub fn last_inference_ms(&self) -> u64 {
        self.last_inference_ms.load(Ordering::Relaxed)
    }

    pub fn measured_fps(&self) -> f64 {
        self.fps_millis.load(Ordering::Relaxed) as f64 / 1000.0
    }
}

/// State shared between the engine threads and the D-Bus layer.
pub struct Shared {
    live: RwLock<LiveConfig>,
    state: RwLock<SessionState>,
    facing: RwLock<Facing>,
    latest_overlay: RwLock<Option<Overlay>>,
    pub stats: Stats,
    pub started_at: DateTime<Utc>,
}

impl Shared {
    fn new(live: LiveConfig) -> Self {
        Self {
            live: RwLock::new(live),
            state: RwLock::new(SessionState::Running),
            facing: RwLock::new(Facing::Front),
            latest_overlay: RwLock::new(None),
            stats: Stats::default(),
            started_at: Utc::now(),
        }
    }

    pub fn live(&self) -> LiveConfig {
        *self.live.read().expect("live config lock poisoned")
    }

    pub fn update_live(&self, f: impl FnOnce(&mut LiveConfig)) {
        let mut live = self.live.write().expect("live config lock poisoned");
        f(&mut live);
    }

    pub fn state(&self) -> SessionState {
        *self.state.read().expect("state lock poisoned")
    }

    fn set_state(&self, state: SessionState) {
        *self.state.write().expect("state lock poisoned") = state;
    }

    pub fn facing(&self) -> Facing {
        *self.facing.read().expect("facing lock poisoned")
    }

    fn set_facing(&self, facing: Facing) {
        *self.facing.write().expect("facing lock poisoned") = facing;
    }

    pub fn latest_overlay(&self) -> Option<Overlay> {
        self.latest_overlay
            .read()
            .expect("overlay lock poisoned")
            .clone()
    }

    pub fn set_overlay(&self, overlay: Overlay) {
        *self.latest_overlay.write().expect("overlay lock poisoned") = Some(overlay);
    }
}

/// A frame on its way to inference, tagged with the facing it was
/// captured under so mirroring survives a mid-stream switch.
struct CapturedFrame {
    frame: stance_hw::Frame,
    facing: Facing,
}

/// Messages sent from D-Bus handlers to the capture thread.
enum CaptureRequest {
    SwitchCamera { reply: oneshot::Sender<Facing> },
    Shutdown { reply: oneshot::Sender<()> },
}

/// Why an epoch finished.
enum EpochEnd {
    /// Reply is None when the control channel closed without a request.
    Shutdown(Option<oneshot::Sender<()>>),
    Switch(oneshot::Sender<Facing>),
    Interrupted,
}

/// The active frame producer for the capture thread.
enum CaptureSource {
    Camera(Camera),
    Synthetic(SyntheticSource),
}

/// One inference result on its way to the event pump.
pub struct EngineResult {
    pub pose: PoseResult,
    pub width: u32,
    pub height: u32,
    pub presentation_ms: u64,
    pub frame_number: u64,
}

/// Snapshot of engine state for the Status call.
pub struct EngineStatus {
    pub facing: Facing,
    pub state: SessionState,
    pub pose_enabled: bool,
    pub events_per_second: f64,
    pub frames_seen: u64,
    pub frames_processed: u64,
    pub frames_dropped: u64,
    pub events_emitted: u64,
    pub measured_fps: f64,
    pub last_inference_ms: u64,
    pub started_at: String,
}

/// Clone-safe handle to the engine threads.
#[derive(Clone)]
pub struct EngineHandle {
    shared: Arc<Shared>,
    ctl: mpsc::Sender<CaptureRequest>,
}

impl EngineHandle {
    /// Toggle the camera facing. Resolves to the facing in effect after
    /// the request, which is unchanged when the target is unavailable.
    pub async fn switch_camera(&self) -> Result<Facing, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.ctl
            .send(CaptureRequest::SwitchCamera { reply: reply_tx })
            .await
            .map_err(|_| EngineError::ChannelClosed)?;
        reply_rx.await.map_err(|_| EngineError::ChannelClosed)
    }

    /// Stop capture, close the frame slot and wait for acknowledgement.
    pub async fn shutdown(&self) -> Result<(), EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.ctl
            .send(CaptureRequest::Shutdown { reply: reply_tx })
            .await
            .map_err(|_| EngineError::ChannelClosed)?;
        reply_rx.await.map_err(|_| EngineError::ChannelClosed)
    }

    pub fn set_filter(&self, filter: BodyPartFilter) {
        self.shared.update_live(|live| live.filter = filter);
    }

    pub fn set_event_rate(&self, events_per_second: f64) {
        self.shared
            .update_live(|live| live.events_per_second = events_per_second);
    }

    pub fn set_pose_enabled(&self, enabled: bool) {
        self.shared.update_live(|live| live.pose_enabled = enabled);
    }

    pub fn set_viewport(&self, width: u32, height: u32) {
        self.shared.update_live(|live| {
            live.viewport_width = width;
            live.viewport_height = height;
        });
    }

    pub fn set_fit_mode(&self, fit: FitMode) {
        self.shared.update_live(|live| live.fit_mode = fit);
    }

    pub fn set_rotation(&self, rotation: Rotation) {
        self.shared.update_live(|live| live.rotation = rotation);
    }

    pub fn status(&self) -> EngineStatus {
        let live = self.shared.live();
        EngineStatus {
            facing: self.shared.facing(),
            state: self.shared.state(),
            pose_enabled: live.pose_enabled,
            events_per_second: live.events_per_second,
            frames_seen: self.shared.stats.frames_seen(),
            frames_processed: self.shared.stats.frames_processed(),
            frames_dropped: self.shared.stats.frames_dropped(),
            events_emitted: self.shared.stats.events_emitted(),
            measured_fps: self.shared.stats.measured_fps(),
            last_inference_ms: self.shared.stats.last_inference_ms(),
            started_at: self.shared.started_at.to_rfc3339(),
        }
    }

    pub fn latest_overlay(&self) -> Option<Overlay> {
        self.shared.latest_overlay()
    }

    pub fn shared(&self) -> Arc<Shared> {
        Arc::clone(&self.shared)
    }
}

/// Spawn the capture and inference threads.
///
/// Loads the landmark model and opens the configured source before
/// spawning anything. Fails fast when either resource is unavailable.
pub fn spawn_engine(
    config: &Config,
    result_tx: mpsc::Sender<EngineResult>,
) -> Result<EngineHandle, EngineError> {
    let model_path = config.model_path();
    let landmarker = PoseLandmarker::load(&model_path, config.landmarker_options())?;
    tracing::info!(path = %model_path, "pose landmark model loaded");

    let facing = FacingState::new(&config.front_device, &config.back_device);

    let source = if config.synthetic {
        tracing::info!(
            width = DEFAULT_WIDTH,
            height = DEFAULT_HEIGHT,
            "using synthetic frame source"
        );
        CaptureSource::Synthetic(SyntheticSource::new(DEFAULT_WIDTH, DEFAULT_HEIGHT))
    } else {
        let camera = Camera::open(facing.device_path())?;
        tracing::info!(
            device = %camera.device_path,
            width = camera.width,
            height = camera.height,
            "camera opened"
        );
        CaptureSource::Camera(camera)
    };

    let live = LiveConfig {
        filter: BodyPartFilter::default(),
        events_per_second: config.events_per_second,
        pose_enabled: config.pose_enabled,
        viewport_width: config.viewport_width,
        viewport_height: config.viewport_height,
        fit_mode: config.fit_mode,
        rotation: config.rotation,
    };

    let shared = Arc::new(Shared::new(live));
    let slot: Arc<LatestSlot<CapturedFrame>> = Arc::new(LatestSlot::new());
    let (ctl_tx, ctl_rx) = mpsc::channel::<CaptureRequest>(4);
    let warmup_frames = config.warmup_frames;

    {
        let shared = Arc::clone(&shared);
        let slot = Arc::clone(&slot);
        std::thread::Builder::new()
            .name("stance-capture".into())
            .spawn(move || run_capture(source, facing, shared, slot, ctl_rx, warmup_frames))
            .expect("failed to spawn capture thread");
    }

    {
        let shared = Arc::clone(&shared);
        std::thread::Builder::new()
            .name("stance-infer".into())
            .spawn(move || run_worker(landmarker, shared, slot, result_tx))
            .expect("failed to spawn inference thread");
    }

    Ok(EngineHandle {
        shared,
        ctl: ctl_tx,
    })
}

/// Capture thread body: one epoch per camera session.
///
/// An epoch ends on shutdown, a facing switch or a capture failure. A
/// failure puts the session into Interrupted and polls the device until
/// it comes back; streaming then resumes without external intervention.
fn run_capture(
    mut source: CaptureSource,
    mut facing: FacingState,
    shared: Arc<Shared>,
    slot: Arc<LatestSlot<CapturedFrame>>,
    mut ctl: mpsc::Receiver<CaptureRequest>,
    warmup_frames: usize,
) {
    tracing::info!("capture thread started");
    let mut warmup = warmup_frames;

    loop {
        let end = match &mut source {
            CaptureSource::Camera(camera) => match camera.start_stream() {
                Ok(mut session) => run_epoch(&mut session, &shared, &slot, &mut ctl, &mut warmup),
                Err(e) => {
                    tracing::error!(error = %e, "failed to start capture stream");
                    EpochEnd::Interrupted
                }
            },
            CaptureSource::Synthetic(synthetic) => {
                run_epoch(synthetic, &shared, &slot, &mut ctl, &mut warmup)
            }
        };

        match end {
            EpochEnd::Shutdown(reply) => {
                slot.close();
                shared.set_state(SessionState::Stopped);
                if let Some(reply) = reply {
                    let _ = reply.send(());
                }
                break;
            }
            EpochEnd::Switch(reply) => {
                let now = handle_switch(&mut source, &mut facing, &shared);
                let _ = reply.send(now);
            }
            EpochEnd::Interrupted => {
                shared.set_state(SessionState::Interrupted);
                tracing::warn!(device = %facing.device_path(), "capture interrupted, polling device");
                if !reopen_camera(&mut source, &mut facing, &shared, &slot, &mut ctl) {
                    break;
                }
                shared.set_state(SessionState::Running);
                tracing::info!(device = %facing.device_path(), "capture resumed");
            }
        }
    }

    tracing::info!("capture thread exiting");
}

/// Pump frames from one source until something ends the epoch.
fn run_epoch(
    source: &mut dyn FrameSource,
    shared: &Shared,
    slot: &LatestSlot<CapturedFrame>,
    ctl: &mut mpsc::Receiver<CaptureRequest>,
    warmup: &mut usize,
) -> EpochEnd {
    let (width, height) = source.dimensions();
    tracing::debug!(width, height, "capture epoch started");

    loop {
        match ctl.try_recv() {
            Ok(CaptureRequest::Shutdown { reply }) => return EpochEnd::Shutdown(Some(reply)),
            Ok(CaptureRequest::SwitchCamera { reply }) => return EpochEnd::Switch(reply),
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => return EpochEnd::Shutdown(None),
        }

        let frame = match source.next_frame() {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!(error = %e, "frame capture failed");
                return EpochEnd::Interrupted;
            }
        };

        if *warmup > 0 {
            *warmup -= 1;
            tracing::debug!(remaining = *warmup, "discarding warmup frame");
            continue;
        }

        shared.stats.inc_frames_seen();

        // Capture keeps pulling while pose streaming is off so the driver
        // queue never backs up; the frames are simply not published.
        if !shared.live().pose_enabled {
            continue;
        }

        let captured = CapturedFrame {
            frame,
            facing: shared.facing(),
        };
        if slot.publish(captured) {
            shared.stats.inc_frames_dropped();
            tracing::trace!("unconsumed frame replaced (keep-only-latest)");
        }
    }
}

/// Switch to the opposite camera, keeping the current one on failure.
fn handle_switch(source: &mut CaptureSource, facing: &mut FacingState, shared: &Shared) -> Facing {
    match source {
        CaptureSource::Synthetic(_) => {
            // No hardware to probe; the synthetic source serves both facings.
            let now = facing.switch(|_| true);
            shared.set_facing(now);
            now
        }
        CaptureSource::Camera(camera) => {
            let before = facing.facing();
            let after = facing.switch(stance_hw::is_capture_device);
            if after == before {
                return before;
            }
            match Camera::open(facing.device_path()) {
                Ok(new_camera) => {
                    *camera = new_camera;
                    shared.set_facing(after);
                    after
                }
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        device = %facing.device_path(),
                        "failed to open target camera, staying on current"
                    );
                    facing.switch(|_| true);
                    before
                }
            }
        }
    }
}

/// Poll the current device until it opens again.
///
/// Control requests are still serviced while interrupted; a switch may
/// land on a working device and end the outage early. Returns false on
/// shutdown.
fn reopen_camera(
    source: &mut CaptureSource,
    facing: &mut FacingState,
    shared: &Shared,
    slot: &LatestSlot<CapturedFrame>,
    ctl: &mut mpsc::Receiver<CaptureRequest>,
) -> bool {
    if matches!(source, CaptureSource::Synthetic(_)) {
        return true;
    }

    loop {
        match ctl.try_recv() {
            Ok(CaptureRequest::Shutdown { reply }) => {
                slot.close();
                shared.set_state(SessionState::Stopped);
                let _ = reply.send(());
                return false;
            }
            Ok(CaptureRequest::SwitchCamera { reply }) => {
                let now = facing.switch(stance_hw::is_capture_device);
                shared.set_facing(now);
                let _ = reply.send(now);
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => {
                slot.close();
                shared.set_state(SessionState::Stopped);
                return false;
            }
        }

        match Camera::open(facing.device_path()) {
            Ok(camera) => {
                *source = CaptureSource::Camera(camera);
                return true;
            }
            Err(e) => {
                tracing::debug!(error = %e, device = %facing.device_path(), "device still unavailable");
                std::thread::sleep(REOPEN_DELAY);
            }
        }
    }
}

/// Inference thread body: take the newest frame, run the model, forward
/// the result. Malformed model output is skipped without surfacing an
/// error; so are frames whose pose fails the confidence gate.
fn run_worker(
    mut landmarker: PoseLandmarker,
    shared: Arc<Shared>,
    slot: Arc<LatestSlot<CapturedFrame>>,
    result_tx: mpsc::Sender<EngineResult>,
) {
    tracing::info!("inference thread started");
    let mut frame_number: u64 = 0;
    let mut last_take: Option<Instant> = None;

    while let Some(captured) = slot.take() {
        if let Some(prev) = last_take {
            shared.stats.record_frame_gap(prev.elapsed().as_millis() as u64);
        }
        last_take = Some(Instant::now());
        frame_number += 1;

        let CapturedFrame { mut frame, facing } = captured;
        if facing.is_mirrored() {
            flip_horizontal(&mut frame.data, frame.width, frame.height);
        }

        let started = Instant::now();
        match landmarker.detect(&frame.data, frame.width, frame.height) {
            Ok(Some(pose)) => {
                shared.stats.record_inference(started.elapsed().as_millis() as u64);
                let result = EngineResult {
                    pose,
                    width: frame.width,
                    height: frame.height,
                    presentation_ms: frame.timestamp_ms,
                    frame_number,
                };
                if result_tx.blocking_send(result).is_err() {
                    tracing::info!("result channel closed, inference thread exiting");
                    break;
                }
            }
            Ok(None) => {
                shared.stats.record_inference(started.elapsed().as_millis() as u64);
            }
            Err(e) => {
                tracing::warn!(error = %e, "inference failed, frame skipped");
            }
        }
    }

    tracing::info!("inference thread exiting");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_live() -> LiveConfig {
        LiveConfig {
            filter: BodyPartFilter::default(),
            events_per_second: 0.0,
            pose_enabled: true,
            viewport_width: 720,
            viewport_height: 1280,
            fit_mode: FitMode::Cover,
            rotation: Rotation::Deg0,
        }
    }

    fn shutdown_after(ctl_tx: mpsc::Sender<CaptureRequest>, delay: Duration) {
        std::thread::spawn(move || {
            std::thread::sleep(delay);
            let (reply_tx, _reply_rx) = oneshot::channel();
            let _ = ctl_tx.blocking_send(CaptureRequest::Shutdown { reply: reply_tx });
        });
    }

    #[test]
    fn test_epoch_ends_on_shutdown_request() {
        let shared = Shared::new(test_live());
        let slot = LatestSlot::new();
        let (ctl_tx, mut ctl_rx) = mpsc::channel(4);

        let (reply_tx, _reply_rx) = oneshot::channel();
        ctl_tx
            .try_send(CaptureRequest::Shutdown { reply: reply_tx })
            .unwrap();

        let mut source = SyntheticSource::with_interval(8, 8, Duration::ZERO);
        let mut warmup = 0;
        let end = run_epoch(&mut source, &shared, &slot, &mut ctl_rx, &mut warmup);
        assert!(matches!(end, EpochEnd::Shutdown(Some(_))));
        assert_eq!(shared.stats.frames_seen(), 0);
    }

    #[test]
    fn test_epoch_ends_on_switch_request() {
        let shared = Shared::new(test_live());
        let slot = LatestSlot::new();
        let (ctl_tx, mut ctl_rx) = mpsc::channel(4);

        let (reply_tx, _reply_rx) = oneshot::channel();
        ctl_tx
            .try_send(CaptureRequest::SwitchCamera { reply: reply_tx })
            .unwrap();

        let mut source = SyntheticSource::with_interval(8, 8, Duration::ZERO);
        let mut warmup = 0;
        let end = run_epoch(&mut source, &shared, &slot, &mut ctl_rx, &mut warmup);
        assert!(matches!(end, EpochEnd::Switch(_)));
    }

    #[test]
    fn test_epoch_publishes_latest_frame() {
        let shared = Shared::new(test_live());
        let slot = LatestSlot::new();
        let (ctl_tx, mut ctl_rx) = mpsc::channel(4);
        shutdown_after(ctl_tx, Duration::from_millis(50));

        let mut source = SyntheticSource::with_interval(8, 8, Duration::from_millis(1));
        let mut warmup = 0;
        let end = run_epoch(&mut source, &shared, &slot, &mut ctl_rx, &mut warmup);

        assert!(matches!(end, EpochEnd::Shutdown(Some(_))));
        assert!(shared.stats.frames_seen() > 0);
        slot.close();
        let captured = slot.take().expect("a frame should be pending");
        assert_eq!(captured.facing, Facing::Front);
        // Only the newest frame is held; everything earlier was replaced.
        assert_eq!(shared.stats.frames_dropped(), shared.stats.frames_seen() - 1);
    }

    #[test]
    fn test_epoch_pulls_without_publishing_when_disabled() {
        let mut live = test_live();
        live.pose_enabled = false;
        let shared = Shared::new(live);
        let slot = LatestSlot::new();
        let (ctl_tx, mut ctl_rx) = mpsc::channel(4);
        shutdown_after(ctl_tx, Duration::from_millis(50));

        let mut source = SyntheticSource::with_interval(8, 8, Duration::from_millis(1));
        let mut warmup = 0;
        run_epoch(&mut source, &shared, &slot, &mut ctl_rx, &mut warmup);

        // Frames were pulled from the source but none were published.
        assert!(shared.stats.frames_seen() > 0);
        slot.close();
        assert!(slot.take().is_none());
    }

    #[test]
    fn test_warmup_frames_are_discarded() {
        let shared = Shared::new(test_live());
        let slot = LatestSlot::new();
        let (ctl_tx, mut ctl_rx) = mpsc::channel(4);
        shutdown_after(ctl_tx, Duration::from_millis(50));

        let mut source = SyntheticSource::with_interval(8, 8, Duration::from_millis(1));
        let mut warmup = 3;
        run_epoch(&mut source, &shared, &slot, &mut ctl_rx, &mut warmup);

        assert_eq!(warmup, 0);
        slot.close();
        let captured = slot.take().expect("a frame should be pending");
        assert!(captured.frame.sequence >= 3);
    }

    #[test]
    fn test_switch_on_synthetic_toggles_facing() {
        let shared = Shared::new(test_live());
        let mut source =
            CaptureSource::Synthetic(SyntheticSource::with_interval(8, 8, Duration::ZERO));
        let mut facing = FacingState::new("/dev/video0", "/dev/video1");

        assert_eq!(handle_switch(&mut source, &mut facing, &shared), Facing::Back);
        assert_eq!(shared.facing(), Facing::Back);
        assert_eq!(handle_switch(&mut source, &mut facing, &shared), Facing::Front);
        assert_eq!(shared.facing(), Facing::Front);
    }

    #[test]
    fn test_stats_fps_smoothing() {
        let stats = Stats::default();
        stats.record_frame_gap(40);
        assert!((stats.measured_fps() - 25.0).abs() < 0.1);
        stats.record_frame_gap(20);
        // One 20ms gap nudges the smoothed estimate, it does not jump.
        assert!(stats.measured_fps() > 25.0);
        assert!(stats.measured_fps() < 30.0);
    }

    #[test]
    fn test_handle_setters_update_live_config() {
        let shared = Arc::new(Shared::new(test_live()));
        let (ctl_tx, _ctl_rx) = mpsc::channel(4);
        let handle = EngineHandle {
            shared,
            ctl: ctl_tx,
        };

        handle.set_event_rate(12.5);
        handle.set_pose_enabled(false);
        handle.set_viewport(1080, 1920);
        handle.set_fit_mode(FitMode::Contain);
        handle.set_rotation(Rotation::Deg90);
        handle.set_filter(BodyPartFilter::none());

        let status = handle.status();
        assert!((status.events_per_second - 12.5).abs() < f64::EPSILON);
        assert!(!status.pose_enabled);
        assert_eq!(status.state, SessionState::Running);

        let live = handle.shared().live();
        assert_eq!(live.viewport_width, 1080);
        assert_eq!(live.viewport_height, 1920);
        assert_eq!(live.fit_mode, FitMode::Contain);
        assert_eq!(live.rotation, Rotation::Deg90);
        assert!(!live.filter.face);
    }
}
