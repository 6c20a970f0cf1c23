use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::WatchdogConfig;
use crate::error::PlayerError;
use crate::player::PlayerHandle;
use crate::readout::ReadoutBoard;
use crate::schedule::{ScheduledTask, TickFlow};
use crate::state::SharedLoopState;

/// Lifecycle of the loop watchdog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogState {
    Idle,
    Running,
}

/// What a single poll tick did
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// The position could not be read; nothing changed
    Skipped,
    /// Position sampled inside the loop
    Watching { position: f64 },
    /// Position reached the end boundary and a seek to start was issued
    LoopedBack { position: f64, start: f64 },
    /// The player is gone; polling must stop
    PlayerGone,
}

/// Polls the player while running and seeks back to the loop start whenever
/// playback crosses the end boundary.
///
/// At most one poll schedule exists at a time: [`play`](Self::play) cancels
/// any previous schedule before creating a new one.
#[derive(Debug)]
pub struct LoopWatchdog {
    config: WatchdogConfig,
    schedule: Option<ScheduledTask>,
}

impl LoopWatchdog {
    pub fn new(config: WatchdogConfig) -> Self {
        Self {
            config,
            schedule: None,
        }
    }

    pub fn state(&self) -> WatchdogState {
        match &self.schedule {
            Some(schedule) if schedule.is_active() => WatchdogState::Running,
            _ => WatchdogState::Idle,
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() == WatchdogState::Running
    }

    /// Seek to the loop start, apply the active speed, start playback and
    /// begin polling. Any running session is cancelled first.
    ///
    /// If a player command fails the watchdog stays idle and the error is
    /// returned for the caller to log.
    pub async fn play(
        &mut self,
        player: Arc<dyn PlayerHandle>,
        state: SharedLoopState,
        board: Arc<ReadoutBoard>,
    ) -> Result<(), PlayerError> {
        self.cancel_polling();

        let snapshot = state.read().await.snapshot();
        player.seek_to(snapshot.start).await?;
        player.set_playback_rate(snapshot.speed).await?;
        player.play().await?;

        let tolerance = self.config.end_tolerance;
        self.schedule = Some(ScheduledTask::every(
            "loop watchdog",
            self.config.poll_interval(),
            move || {
                let player = player.clone();
                let state = state.clone();
                let board = board.clone();
                async move {
                    match poll_once(player.as_ref(), &state, &board, tolerance).await {
                        TickOutcome::PlayerGone => TickFlow::Break,
                        _ => TickFlow::Continue,
                    }
                }
            },
        ));

        info!(
            "▶️ Looping {:.2}s → {:.2}s at {}x",
            snapshot.start, snapshot.end, snapshot.speed
        );
        Ok(())
    }

    /// Stop polling and tell the player to stop. Safe to call when idle.
    pub async fn stop(&mut self, player: Option<&dyn PlayerHandle>) {
        let was_running = self.is_running();
        self.cancel_polling();

        if let Some(player) = player {
            if let Err(e) = player.stop().await {
                warn!("Failed to stop player: {}", e);
            }
        }

        if was_running {
            info!("⏹️ Loop stopped");
        }
    }

    /// Cancel the poll schedule without touching the player
    pub fn cancel_polling(&mut self) {
        if let Some(mut schedule) = self.schedule.take() {
            schedule.cancel();
        }
    }
}

/// Run one poll tick.
///
/// The readout is refreshed with the sampled position before the boundary
/// check, so the displayed position always matches the loop decision.
pub async fn poll_once(
    player: &dyn PlayerHandle,
    state: &SharedLoopState,
    board: &ReadoutBoard,
    end_tolerance: f64,
) -> TickOutcome {
    let position = match player.current_time().await {
        Ok(Some(position)) if position.is_finite() => position,
        Ok(_) => return TickOutcome::Skipped,
        Err(PlayerError::Destroyed) => {
            warn!("Player destroyed, loop watchdog going idle");
            return TickOutcome::PlayerGone;
        }
        Err(e) => {
            debug!("Skipping watchdog tick: {}", e);
            return TickOutcome::Skipped;
        }
    };

    let snapshot = state.read().await.snapshot();
    board.publish_tick(snapshot.start, snapshot.end, position, snapshot.speed);

    if position >= snapshot.end - end_tolerance {
        match player.seek_to(snapshot.start).await {
            Ok(()) => {
                debug!("🔁 Looped back at {:.2}s to {:.2}s", position, snapshot.start);
                TickOutcome::LoopedBack {
                    position,
                    start: snapshot.start,
                }
            }
            Err(PlayerError::Destroyed) => TickOutcome::PlayerGone,
            Err(e) => {
                debug!("Loop-back seek failed: {}", e);
                TickOutcome::Watching { position }
            }
        }
    } else {
        TickOutcome::Watching { position }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::range::{RangeLimits, RangeState};
    use crate::readout::Readout;
    use crate::speed::SpeedCycler;
    use crate::state::{shared, LoopState};
    use crate::time_format::TimeFormatter;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use crate::player::PlaybackState;

    /// Player that answers position queries from a fixed script
    struct ScriptedPlayer {
        positions: Mutex<VecDeque<Result<Option<f64>, PlayerError>>>,
        seeks: Mutex<Vec<f64>>,
    }

    impl ScriptedPlayer {
        fn new(script: Vec<Result<Option<f64>, PlayerError>>) -> Self {
            Self {
                positions: Mutex::new(script.into()),
                seeks: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl PlayerHandle for ScriptedPlayer {
        async fn seek_to(&self, seconds: f64) -> Result<(), PlayerError> {
            self.seeks.lock().unwrap().push(seconds);
            Ok(())
        }
        async fn play(&self) -> Result<(), PlayerError> {
            Ok(())
        }
        async fn stop(&self) -> Result<(), PlayerError> {
            Ok(())
        }
        async fn current_time(&self) -> Result<Option<f64>, PlayerError> {
            self.positions.lock().unwrap().pop_front().unwrap_or(Ok(None))
        }
        async fn set_playback_rate(&self, _rate: f64) -> Result<(), PlayerError> {
            Ok(())
        }
        async fn playback_state(&self) -> Result<PlaybackState, PlayerError> {
            Ok(PlaybackState::Playing)
        }
    }

    fn fixture(start: f64, end: f64) -> (SharedLoopState, ReadoutBoard) {
        let range = RangeState::initialize(RangeLimits::default(), Some(start), Some(end));
        let state = shared(LoopState::new(range, SpeedCycler::default()));
        let board = ReadoutBoard::new(Readout::new(TimeFormatter::default(), start, end, 0.5));
        (state, board)
    }

    #[tokio::test]
    async fn test_single_loop_back_at_boundary() {
        let (state, board) = fixture(10.0, 13.0);
        let positions = [10.0, 11.0, 12.0, 12.96, 10.1];
        let player = ScriptedPlayer::new(positions.iter().map(|p| Ok(Some(*p))).collect());

        let mut outcomes = Vec::new();
        for _ in positions {
            outcomes.push(poll_once(&player, &state, &board, 0.05).await);
        }

        assert_eq!(*player.seeks.lock().unwrap(), vec![10.0]);
        assert_eq!(
            outcomes[3],
            TickOutcome::LoopedBack {
                position: 12.96,
                start: 10.0
            }
        );
        assert_eq!(outcomes[4], TickOutcome::Watching { position: 10.1 });
    }

    #[tokio::test]
    async fn test_unavailable_position_skips_tick() {
        let (state, board) = fixture(10.0, 13.0);
        let player = ScriptedPlayer::new(vec![
            Ok(None),
            Err(PlayerError::NotReady),
            Ok(Some(f64::NAN)),
            Ok(Some(11.5)),
        ]);

        for _ in 0..3 {
            assert_eq!(poll_once(&player, &state, &board, 0.05).await, TickOutcome::Skipped);
        }
        assert_eq!(board.current().position, 0.0);

        assert_eq!(
            poll_once(&player, &state, &board, 0.05).await,
            TickOutcome::Watching { position: 11.5 }
        );
        assert_eq!(board.current().position, 11.5);
    }

    #[tokio::test]
    async fn test_readout_updated_before_loop_back() {
        let (state, board) = fixture(10.0, 13.0);
        let player = ScriptedPlayer::new(vec![Ok(Some(13.4))]);

        let outcome = poll_once(&player, &state, &board, 0.05).await;
        assert!(matches!(outcome, TickOutcome::LoopedBack { .. }));
        assert_eq!(board.current().position, 13.4);
    }

    #[tokio::test]
    async fn test_destroyed_player_reports_gone() {
        let (state, board) = fixture(10.0, 13.0);
        let player = ScriptedPlayer::new(vec![Err(PlayerError::Destroyed)]);
        assert_eq!(
            poll_once(&player, &state, &board, 0.05).await,
            TickOutcome::PlayerGone
        );
    }

    #[tokio::test]
    async fn test_loop_uses_live_bounds() {
        let (state, board) = fixture(10.0, 13.0);
        let player = ScriptedPlayer::new(vec![Ok(Some(12.5)), Ok(Some(12.5))]);

        assert_eq!(
            poll_once(&player, &state, &board, 0.05).await,
            TickOutcome::Watching { position: 12.5 }
        );

        state.write().await.range.set_end(12.5);
        assert!(matches!(
            poll_once(&player, &state, &board, 0.05).await,
            TickOutcome::LoopedBack { .. }
        ));
    }
}
