use std::sync::Arc;
use tokio::sync::RwLock;

use crate::range::RangeState;
use crate::readout::ReadoutBoard;
use crate::speed::SpeedCycler;

/// Loop bounds and speed owned by one page session
#[derive(Debug, Clone)]
pub struct LoopState {
    pub range: RangeState,
    pub speed: SpeedCycler,
}

/// Values read together by a tick or a display refresh
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopSnapshot {
    pub start: f64,
    pub end: f64,
    pub speed: f64,
}

impl LoopState {
    pub fn new(range: RangeState, speed: SpeedCycler) -> Self {
        Self { range, speed }
    }

    pub fn snapshot(&self) -> LoopSnapshot {
        LoopSnapshot {
            start: self.range.start(),
            end: self.range.end(),
            speed: self.speed.current(),
        }
    }
}

/// Shared handle to the session's loop state.
///
/// Writers hold the lock only for the duration of a mutation, never across a
/// player call, so callbacks never observe a half-applied change.
pub type SharedLoopState = Arc<RwLock<LoopState>>;

/// Wrap a loop state for sharing between the session and its schedules
pub fn shared(state: LoopState) -> SharedLoopState {
    Arc::new(RwLock::new(state))
}

/// Push the current bounds and speed to the readout board
pub async fn refresh_readout(state: &SharedLoopState, board: &ReadoutBoard) -> LoopSnapshot {
    let snapshot = state.read().await.snapshot();
    board.publish_bounds(snapshot.start, snapshot.end, snapshot.speed);
    snapshot
}
