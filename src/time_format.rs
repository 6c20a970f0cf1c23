use serde::{Deserialize, Serialize};

/// Upper bound shown by the single-minute display
pub const SINGLE_MINUTE_MAX: f64 = 59.9;

/// How loop positions are rendered for display
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayPolicy {
    /// `M:SS.s` with an unbounded minute field
    #[default]
    General,
    /// Always `0:SS.s`, values clamped into `[0, 59.9]`
    SingleMinute,
}

/// Renders seconds as fixed-width display strings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeFormatter {
    policy: DisplayPolicy,
}

impl TimeFormatter {
    pub fn new(policy: DisplayPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> DisplayPolicy {
        self.policy
    }

    /// Format a position in seconds. Negative input displays as zero.
    pub fn format(&self, seconds: f64) -> String {
        match self.policy {
            DisplayPolicy::General => format_general(seconds),
            DisplayPolicy::SingleMinute => format_single_minute(seconds),
        }
    }
}

/// Format as `M:SS.s`, rounding half-up to one decimal.
///
/// Rounding is applied to the whole value before splitting off minutes, so
/// `119.96` becomes `2:00.0` rather than `1:60.0`.
pub fn format_general(seconds: f64) -> String {
    let tenths = to_tenths(seconds);
    format!("{}:{:02}.{}", tenths / 600, (tenths % 600) / 10, tenths % 10)
}

/// Format as `0:SS.s` after clamping into the single displayed minute
pub fn format_single_minute(seconds: f64) -> String {
    let tenths = to_tenths(seconds.clamp(0.0, SINGLE_MINUTE_MAX));
    format!("0:{:02}.{}", tenths / 10, tenths % 10)
}

fn to_tenths(seconds: f64) -> u64 {
    // f64::max drops a NaN operand, so this also maps NaN to zero
    (seconds.max(0.0) * 10.0).round() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn display_value(s: &str) -> f64 {
        let (m, rest) = s.split_once(':').unwrap();
        m.parse::<f64>().unwrap() * 60.0 + rest.parse::<f64>().unwrap()
    }

    #[test]
    fn test_general_format() {
        assert_eq!(format_general(125.37), "2:05.4");
        assert_eq!(format_general(0.0), "0:00.0");
        assert_eq!(format_general(9.94), "0:09.9");
        assert_eq!(format_general(59.95), "1:00.0");
        assert_eq!(format_general(600.0), "10:00.0");
    }

    #[test]
    fn test_negative_clamps_to_zero() {
        assert_eq!(format_general(-4.2), "0:00.0");
        assert_eq!(format_single_minute(-0.1), "0:00.0");
    }

    #[test]
    fn test_single_minute_format() {
        assert_eq!(format_single_minute(12.34), "0:12.3");
        assert_eq!(format_single_minute(59.9), "0:59.9");
        assert_eq!(format_single_minute(75.0), "0:59.9");
        assert_eq!(format_single_minute(3.06), "0:03.1");
    }

    #[test]
    fn test_formatter_dispatches_on_policy() {
        let general = TimeFormatter::new(DisplayPolicy::General);
        let single = TimeFormatter::new(DisplayPolicy::SingleMinute);
        assert_eq!(general.format(90.0), "1:30.0");
        assert_eq!(single.format(90.0), "0:59.9");
    }

    #[test]
    fn test_display_is_monotonic() {
        for formatter in [format_general, format_single_minute] {
            let mut previous = 0.0;
            for step in 0..2000 {
                let value = display_value(&formatter(step as f64 * 0.037));
                assert!(value >= previous, "display went backwards at step {}", step);
                assert!(value >= 0.0);
                previous = value;
            }
        }
    }
}
