//! Camera facing state machine.

/// Which camera the pipeline reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facing {
    Front,
    Back,
}

impl Facing {
    pub fn toggled(self) -> Facing {
        match self {
            Facing::Front => Facing::Back,
            Facing::Back => Facing::Front,
        }
    }

    /// Front frames are mirrored before inference (selfie view).
    pub fn is_mirrored(self) -> bool {
        matches!(self, Facing::Front)
    }
}

impl std::fmt::Display for Facing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Facing::Front => f.write_str("front"),
            Facing::Back => f.write_str("back"),
        }
    }
}

/// Two-state facing machine with an availability probe on every switch.
#[derive(Debug)]
pub struct FacingState {
    facing: Facing,
    front_device: String,
    back_device: String,
}

impl FacingState {
    /// Starts on the front camera.
    pub fn new(front_device: impl Into<String>, back_device: impl Into<String>) -> Self {
        Self {
            facing: Facing::Front,
            front_device: front_device.into(),
            back_device: back_device.into(),
        }
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }

    /// Device path for the current facing.
    pub fn device_path(&self) -> &str {
        match self.facing {
            Facing::Front => &self.front_device,
            Facing::Back => &self.back_device,
        }
    }

    /// Toggle facing if the probe accepts the target device.
    ///
    /// When the probe rejects the target the current facing is kept, so a
    /// missing back camera leaves the front stream running untouched.
    pub fn switch(&mut self, probe: impl Fn(&str) -> bool) -> Facing {
        let target = self.facing.toggled();
        let path = match target {
            Facing::Front => &self.front_device,
            Facing::Back => &self.back_device,
        };

        if probe(path) {
            tracing::info!(from = %self.facing, to = %target, device = %path, "camera facing switched");
            self.facing = target;
        } else {
            tracing::warn!(
                requested = %target,
                device = %path,
                "target camera unavailable, keeping current facing"
            );
        }

        self.facing
    }
}
