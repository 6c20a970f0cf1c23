//! Segment Looper
//!
//! Loops a time range of an embedded video and shows a caption line, with the
//! loop bounds, speed and caption seeded from page URL parameters. The core is
//! the loop watchdog: it polls the player on a fixed cadence and seeks back to
//! the loop start whenever playback crosses the end boundary.

pub mod adjust;
pub mod command;
pub mod config;
pub mod error;
pub mod params;
pub mod player;
pub mod range;
pub mod readout;
pub mod schedule;
pub mod segments;
pub mod session;
pub mod speed;
pub mod state;
pub mod time_format;
pub mod watchdog;

// Re-export main types for easy access
pub use crate::adjust::{AdjustmentController, BumpAction, BumpStep};
pub use crate::command::SessionCommand;
pub use crate::config::{Config, ConfigBuilder};
pub use crate::error::{LooperError, PlayerError, Result};
pub use crate::params::StartupParams;
pub use crate::player::{PlaybackState, PlayerHandle, SimulatedPlayer};
pub use crate::range::{Bound, RangeLimits, RangeState};
pub use crate::readout::{Readout, ReadoutBoard};
pub use crate::segments::{resolve_startup_segment, Segment, SegmentLookup, SegmentSource};
pub use crate::session::LoopSession;
pub use crate::speed::SpeedCycler;
pub use crate::time_format::{DisplayPolicy, TimeFormatter};
pub use crate::watchdog::{LoopWatchdog, TickOutcome, WatchdogState};
