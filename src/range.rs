use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::config::RangeConfig;

/// Which loop bound an action targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bound {
    Start,
    End,
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::Start => write!(f, "start"),
            Bound::End => write!(f, "end"),
        }
    }
}

/// Valid window for loop bounds plus the repair constants
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeLimits {
    /// Lowest allowed value for either bound
    pub min_seconds: f64,
    /// Highest allowed value, `None` for an unbounded window
    pub max_seconds: Option<f64>,
    /// Minimum distance `end` keeps above `start`
    pub min_gap: f64,
    /// Span used when the initial end is missing or not after start
    pub default_span: f64,
}

impl RangeLimits {
    /// Highest value either bound may take. An unbounded window still stops
    /// at the largest finite `f64`.
    fn ceiling(&self) -> f64 {
        self.max_seconds.unwrap_or(f64::MAX)
    }

    /// Clamp a candidate start. The start stays strictly below the ceiling so
    /// the end can always be pushed past it.
    fn clamp_start(&self, value: f64) -> f64 {
        let ceiling = self.ceiling();
        let upper = ceiling - self.min_gap;
        let upper = if upper < ceiling { upper } else { next_below(ceiling) };
        value.min(upper).max(self.min_seconds)
    }

    fn clamp_end(&self, value: f64) -> f64 {
        value.min(self.ceiling()).max(self.min_seconds)
    }

    /// Smallest end allowed for `start`: one gap above it, or the next
    /// representable value when the gap is lost to rounding.
    fn end_floor(&self, start: f64) -> f64 {
        let end = self.clamp_end(start + self.min_gap);
        if end > start {
            end
        } else {
            next_above(start)
        }
    }
}

/// Next representable value above a finite `value`
fn next_above(value: f64) -> f64 {
    if value == 0.0 {
        f64::from_bits(1)
    } else if value > 0.0 {
        f64::from_bits(value.to_bits() + 1)
    } else {
        f64::from_bits(value.to_bits() - 1)
    }
}

fn next_below(value: f64) -> f64 {
    -next_above(-value)
}

impl Default for RangeLimits {
    fn default() -> Self {
        Self {
            min_seconds: 0.0,
            max_seconds: None,
            min_gap: 0.1,
            default_span: 3.0,
        }
    }
}

impl From<&RangeConfig> for RangeLimits {
    fn from(config: &RangeConfig) -> Self {
        Self {
            min_seconds: config.min_seconds,
            max_seconds: config.max_seconds,
            min_gap: config.min_gap,
            default_span: config.default_span,
        }
    }
}

/// Loop bounds with `end > start` enforced on every mutation.
///
/// Invalid input is repaired or ignored, never reported: a non-finite value
/// passed to a setter leaves the state untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeState {
    start: f64,
    end: f64,
    limits: RangeLimits,
}

impl RangeState {
    /// Seed the bounds from raw startup input.
    ///
    /// A missing or non-finite start becomes 0, and an end that is missing,
    /// non-finite or not after start becomes `start + default_span`.
    pub fn initialize(limits: RangeLimits, raw_start: Option<f64>, raw_end: Option<f64>) -> Self {
        let start = limits.clamp_start(raw_start.filter(|v| v.is_finite()).unwrap_or(0.0));

        let end = match raw_end.filter(|v| v.is_finite()) {
            Some(end) if end > start => end,
            _ => start + limits.default_span,
        };
        let mut end = limits.clamp_end(end);
        if end <= start {
            end = limits.end_floor(start);
        }

        debug!("Range initialized: {:.2} -> {:.2}", start, end);
        Self { start, end, limits }
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn limits(&self) -> &RangeLimits {
        &self.limits
    }

    /// Current value of one bound
    pub fn get(&self, bound: Bound) -> f64 {
        match bound {
            Bound::Start => self.start,
            Bound::End => self.end,
        }
    }

    /// Move the start, pushing the end forward if it would no longer follow it
    pub fn set_start(&mut self, value: f64) {
        if !value.is_finite() {
            return;
        }
        self.start = self.limits.clamp_start(value);
        if self.end <= self.start {
            self.end = self.limits.end_floor(self.start);
        }
    }

    /// Move the end, never closer than `min_gap` to the start
    pub fn set_end(&mut self, value: f64) {
        if !value.is_finite() {
            return;
        }
        self.end = self.limits.end_floor(self.start).max(self.limits.clamp_end(value));
    }

    /// Set one bound directly
    pub fn set(&mut self, bound: Bound, value: f64) {
        match bound {
            Bound::Start => self.set_start(value),
            Bound::End => self.set_end(value),
        }
    }

    /// Shift one bound by a signed delta
    pub fn bump(&mut self, bound: Bound, delta: f64) {
        match bound {
            Bound::Start => self.set_start(self.start + delta),
            Bound::End => self.set_end(self.end + delta),
        }
    }

    /// Apply bounds from a segment lookup. Either side may be absent.
    pub fn override_from_lookup(&mut self, start: Option<f64>, end: Option<f64>) {
        if let Some(start) = start {
            self.set_start(start);
        }
        if let Some(end) = end {
            self.set_end(end);
        }
        debug!("Range overridden from lookup: {:.2} -> {:.2}", self.start, self.end);
    }
}
