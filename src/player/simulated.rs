use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard};
use tokio::time::Instant;
use tracing::debug;

use super::{PlaybackState, PlayerHandle};
use crate::error::PlayerError;

/// Command received by a [`SimulatedPlayer`], recorded in arrival order
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerCommand {
    SeekTo(f64),
    Play,
    Stop,
    SetRate(f64),
}

#[derive(Debug)]
struct SimulatedState {
    /// Position at `anchor_instant` (or the frozen position when not playing)
    anchor_position: f64,
    anchor_instant: Option<Instant>,
    rate: f64,
    state: PlaybackState,
    duration: Option<f64>,
    ready: bool,
    destroyed: bool,
    commands: Vec<PlayerCommand>,
}

impl SimulatedState {
    fn position(&self) -> f64 {
        let elapsed = self
            .anchor_instant
            .map_or(0.0, |at| at.elapsed().as_secs_f64() * self.rate);
        let position = self.anchor_position + elapsed;
        match self.duration {
            Some(duration) => position.min(duration),
            None => position,
        }
    }

    /// Fold elapsed playback into the anchor so rate or state can change
    fn re_anchor(&mut self) {
        self.anchor_position = self.position();
        if self.anchor_instant.is_some() {
            self.anchor_instant = Some(Instant::now());
        }
    }
}

/// In-process player whose position advances with the tokio clock.
///
/// Stands in for the embedded widget in dry runs and tests. Position is
/// tracked as an anchor plus elapsed time scaled by the playback rate, so it
/// follows `tokio::time::pause`/`advance` exactly.
#[derive(Debug)]
pub struct SimulatedPlayer {
    inner: Mutex<SimulatedState>,
}

impl SimulatedPlayer {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(SimulatedState {
                anchor_position: 0.0,
                anchor_instant: None,
                rate: 1.0,
                state: PlaybackState::Idle,
                duration: None,
                ready: true,
                destroyed: false,
                commands: Vec::new(),
            }),
        }
    }

    /// Limit the position to a media duration
    pub fn with_duration(self, duration: f64) -> Self {
        if let Ok(mut state) = self.inner.lock() {
            state.duration = Some(duration);
        }
        self
    }

    /// Toggle whether position queries can be answered
    pub fn set_ready(&self, ready: bool) {
        if let Ok(mut state) = self.inner.lock() {
            state.ready = ready;
        }
    }

    /// Tear the player down; every later call fails with `Destroyed`
    pub fn destroy(&self) {
        if let Ok(mut state) = self.inner.lock() {
            state.destroyed = true;
            state.anchor_instant = None;
        }
    }

    /// Commands received so far
    pub fn commands(&self) -> Vec<PlayerCommand> {
        self.inner.lock().map(|s| s.commands.clone()).unwrap_or_default()
    }

    /// Current rate, for display and assertions
    pub fn rate(&self) -> f64 {
        self.inner.lock().map(|s| s.rate).unwrap_or(1.0)
    }

    fn state(&self) -> Result<MutexGuard<'_, SimulatedState>, PlayerError> {
        let state = self
            .inner
            .lock()
            .map_err(|_| PlayerError::Command("simulated player state poisoned".to_string()))?;
        if state.destroyed {
            return Err(PlayerError::Destroyed);
        }
        Ok(state)
    }
}

impl Default for SimulatedPlayer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlayerHandle for SimulatedPlayer {
    async fn seek_to(&self, seconds: f64) -> Result<(), PlayerError> {
        let mut state = self.state()?;
        state.commands.push(PlayerCommand::SeekTo(seconds));
        state.anchor_position = seconds.max(0.0);
        if state.anchor_instant.is_some() {
            state.anchor_instant = Some(Instant::now());
        }
        debug!("🎞️ simulated seek to {:.2}", seconds);
        Ok(())
    }

    async fn play(&self) -> Result<(), PlayerError> {
        let mut state = self.state()?;
        state.commands.push(PlayerCommand::Play);
        if state.anchor_instant.is_none() {
            state.anchor_instant = Some(Instant::now());
        }
        state.state = PlaybackState::Playing;
        Ok(())
    }

    async fn stop(&self) -> Result<(), PlayerError> {
        let mut state = self.state()?;
        state.commands.push(PlayerCommand::Stop);
        state.re_anchor();
        state.anchor_instant = None;
        state.state = PlaybackState::Idle;
        Ok(())
    }

    async fn current_time(&self) -> Result<Option<f64>, PlayerError> {
        let state = self.state()?;
        if !state.ready {
            return Ok(None);
        }
        Ok(Some(state.position()))
    }

    async fn set_playback_rate(&self, rate: f64) -> Result<(), PlayerError> {
        let mut state = self.state()?;
        state.commands.push(PlayerCommand::SetRate(rate));
        state.re_anchor();
        state.rate = rate;
        Ok(())
    }

    async fn playback_state(&self) -> Result<PlaybackState, PlayerError> {
        Ok(self.state()?.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_position_follows_clock_and_rate() {
        tokio::time::pause();
        let player = SimulatedPlayer::new();
        player.seek_to(10.0).await.unwrap();
        player.set_playback_rate(0.5).await.unwrap();
        player.play().await.unwrap();

        tokio::time::advance(Duration::from_secs(2)).await;
        let position = player.current_time().await.unwrap().unwrap();
        assert!((position - 11.0).abs() < 1e-6);

        player.stop().await.unwrap();
        tokio::time::advance(Duration::from_secs(2)).await;
        let position = player.current_time().await.unwrap().unwrap();
        assert!((position - 11.0).abs() < 1e-6);
        assert_eq!(player.playback_state().await.unwrap(), PlaybackState::Idle);
    }

    #[tokio::test]
    async fn test_not_ready_and_destroyed() {
        let player = SimulatedPlayer::new();
        player.set_ready(false);
        assert_eq!(player.current_time().await.unwrap(), None);

        player.destroy();
        assert_eq!(player.current_time().await, Err(PlayerError::Destroyed));
        assert_eq!(player.play().await, Err(PlayerError::Destroyed));
    }

    #[tokio::test]
    async fn test_position_capped_at_duration() {
        tokio::time::pause();
        let player = SimulatedPlayer::new().with_duration(5.0);
        player.play().await.unwrap();
        tokio::time::advance(Duration::from_secs(30)).await;
        assert_eq!(player.current_time().await.unwrap(), Some(5.0));
    }
}
