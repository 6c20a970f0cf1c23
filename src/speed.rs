use crate::error::{LooperError, Result};

/// Multipliers used when no configuration overrides them
pub const DEFAULT_SPEEDS: [f64; 3] = [0.5, 0.75, 1.0];

/// Cycles through a fixed, non-empty list of playback multipliers
#[derive(Debug, Clone, PartialEq)]
pub struct SpeedCycler {
    speeds: Vec<f64>,
    active_index: usize,
}

impl SpeedCycler {
    /// Create a cycler positioned on the first multiplier.
    ///
    /// Fails when the list is empty or holds a multiplier that is not a
    /// positive finite number.
    pub fn new(speeds: Vec<f64>) -> Result<Self> {
        if speeds.is_empty() {
            return Err(LooperError::Config("speed list must not be empty".to_string()));
        }
        if let Some(bad) = speeds.iter().find(|s| !s.is_finite() || **s <= 0.0) {
            return Err(LooperError::Config(format!("invalid playback speed: {}", bad)));
        }
        Ok(Self { speeds, active_index: 0 })
    }

    pub fn current(&self) -> f64 {
        self.speeds[self.active_index]
    }

    /// Advance to the next multiplier, wrapping after the last one
    pub fn cycle(&mut self) -> f64 {
        self.active_index = (self.active_index + 1) % self.speeds.len();
        self.current()
    }

    pub fn active_index(&self) -> usize {
        self.active_index
    }

    pub fn speeds(&self) -> &[f64] {
        &self.speeds
    }

    /// Label shown on the speed control, e.g. `0.75x` or `1x`
    pub fn label(&self) -> String {
        format_speed(self.current())
    }
}

impl Default for SpeedCycler {
    fn default() -> Self {
        Self {
            speeds: DEFAULT_SPEEDS.to_vec(),
            active_index: 0,
        }
    }
}

/// Render a multiplier with the shortest decimal form and an `x` suffix
pub fn format_speed(speed: f64) -> String {
    format!("{}x", speed)
}
