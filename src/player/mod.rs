//! Playback control surface the looper drives
//!
//! The embedded video widget is supplied by the host. The looper only needs
//! a handful of commands and queries from it, captured by [`PlayerHandle`].

pub mod simulated;

pub use simulated::SimulatedPlayer;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::PlayerError;

/// Coarse playback state reported by the widget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackState {
    Idle,
    Playing,
    Other,
}

/// Capabilities the looper needs from an embedded player
#[async_trait]
pub trait PlayerHandle: Send + Sync {
    /// Jump to a position in seconds
    async fn seek_to(&self, seconds: f64) -> Result<(), PlayerError>;

    async fn play(&self) -> Result<(), PlayerError>;

    async fn stop(&self) -> Result<(), PlayerError>;

    /// Current position, or `None` when it cannot be read right now
    async fn current_time(&self) -> Result<Option<f64>, PlayerError>;

    async fn set_playback_rate(&self, rate: f64) -> Result<(), PlayerError>;

    async fn playback_state(&self) -> Result<PlaybackState, PlayerError>;
}
