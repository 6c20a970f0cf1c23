use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::config::AdjustConfig;
use crate::range::Bound;
use crate::readout::ReadoutBoard;
use crate::schedule::{ScheduledTask, TickFlow};
use crate::state::{refresh_readout, SharedLoopState};

/// Size and direction of a bump
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BumpStep {
    DecreaseLarge,
    DecreaseSmall,
    IncreaseSmall,
    IncreaseLarge,
}

/// One of the eight bump controls: a bound paired with a step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BumpAction {
    pub bound: Bound,
    pub step: BumpStep,
}

impl BumpAction {
    pub const ALL: [BumpAction; 8] = [
        BumpAction::new(Bound::Start, BumpStep::DecreaseLarge),
        BumpAction::new(Bound::Start, BumpStep::DecreaseSmall),
        BumpAction::new(Bound::Start, BumpStep::IncreaseSmall),
        BumpAction::new(Bound::Start, BumpStep::IncreaseLarge),
        BumpAction::new(Bound::End, BumpStep::DecreaseLarge),
        BumpAction::new(Bound::End, BumpStep::DecreaseSmall),
        BumpAction::new(Bound::End, BumpStep::IncreaseSmall),
        BumpAction::new(Bound::End, BumpStep::IncreaseLarge),
    ];

    pub const fn new(bound: Bound, step: BumpStep) -> Self {
        Self { bound, step }
    }

    /// Signed delta in seconds for this action
    pub fn delta(&self, config: &AdjustConfig) -> f64 {
        match self.step {
            BumpStep::DecreaseLarge => -config.large_step,
            BumpStep::DecreaseSmall => -config.small_step,
            BumpStep::IncreaseSmall => config.small_step,
            BumpStep::IncreaseLarge => config.large_step,
        }
    }
}

impl fmt::Display for BumpAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let suffix = match self.step {
            BumpStep::DecreaseLarge => "--",
            BumpStep::DecreaseSmall => "-",
            BumpStep::IncreaseSmall => "+",
            BumpStep::IncreaseLarge => "++",
        };
        write!(f, "{}{}", self.bound, suffix)
    }
}

/// Parse a typed bound value, accepting `,` as the decimal separator
pub fn parse_entry(input: &str) -> Option<f64> {
    input
        .trim()
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Maps bump controls and direct entry onto the shared range state.
///
/// Every action refreshes the readout afterwards. Only one hold-to-repeat
/// schedule runs at a time; pressing a new control replaces the old one.
#[derive(Debug)]
pub struct AdjustmentController {
    config: AdjustConfig,
    state: SharedLoopState,
    board: Arc<ReadoutBoard>,
    hold: Option<ScheduledTask>,
}

impl AdjustmentController {
    pub fn new(config: AdjustConfig, state: SharedLoopState, board: Arc<ReadoutBoard>) -> Self {
        Self {
            config,
            state,
            board,
            hold: None,
        }
    }

    /// Apply one bump
    pub async fn bump(&self, action: BumpAction) {
        apply_bump(&self.state, &self.board, action, action.delta(&self.config)).await;
    }

    /// Begin repeating `action` every repeat interval until released
    pub fn press_start(&mut self, action: BumpAction) {
        self.release();

        let state = self.state.clone();
        let board = self.board.clone();
        let delta = action.delta(&self.config);
        self.hold = Some(ScheduledTask::every(
            "bump repeat",
            self.config.repeat_interval(),
            move || {
                let state = state.clone();
                let board = board.clone();
                async move {
                    apply_bump(&state, &board, action, delta).await;
                    TickFlow::Continue
                }
            },
        ));
        debug!("Holding {}", action);
    }

    /// End a press. Any of release, cancel or pointer-leave lands here, and
    /// it is a no-op when nothing is held.
    pub fn release(&mut self) {
        if let Some(mut hold) = self.hold.take() {
            hold.cancel();
        }
    }

    pub fn is_holding(&self) -> bool {
        self.hold.as_ref().map_or(false, |h| h.is_active())
    }

    /// Current value of a bound as presented in the entry prompt
    pub async fn entry_prompt(&self, bound: Bound) -> String {
        let value = self.state.read().await.range.get(bound);
        format!("{}", (value * 100.0).round() / 100.0)
    }

    /// Replace a bound with a typed value.
    ///
    /// `None` means the prompt was cancelled. Cancelled or unparseable input
    /// leaves the state untouched and returns `false`.
    pub async fn direct_entry(&self, bound: Bound, input: Option<&str>) -> bool {
        let Some(value) = input.and_then(parse_entry) else {
            debug!("Ignoring {} entry: {:?}", bound, input);
            return false;
        };

        self.state.write().await.range.set(bound, value);
        refresh_readout(&self.state, &self.board).await;
        true
    }
}

async fn apply_bump(state: &SharedLoopState, board: &ReadoutBoard, action: BumpAction, delta: f64) {
    state.write().await.range.bump(action.bound, delta);
    let snapshot = refresh_readout(state, board).await;
    debug!("{} → {:.2} .. {:.2}", action, snapshot.start, snapshot.end);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::range::{RangeLimits, RangeState};
    use crate::readout::Readout;
    use crate::speed::SpeedCycler;
    use crate::state::{shared, LoopState};
    use crate::time_format::TimeFormatter;
    use std::time::Duration;

    fn controller(start: f64, end: f64) -> AdjustmentController {
        let range = RangeState::initialize(RangeLimits::default(), Some(start), Some(end));
        let state = shared(LoopState::new(range, SpeedCycler::default()));
        let board = Arc::new(ReadoutBoard::new(Readout::new(TimeFormatter::default(), start, end, 0.5)));
        AdjustmentController::new(AdjustConfig::default(), state, board)
    }

    async fn bounds(controller: &AdjustmentController) -> (f64, f64) {
        let state = controller.state.read().await;
        (state.range.start(), state.range.end())
    }

    #[test]
    fn test_parse_entry() {
        assert_eq!(parse_entry("12,5"), Some(12.5));
        assert_eq!(parse_entry(" 7.25 "), Some(7.25));
        assert_eq!(parse_entry("abc"), None);
        assert_eq!(parse_entry(""), None);
        assert_eq!(parse_entry("inf"), None);
    }

    #[test]
    fn test_action_deltas() {
        let config = AdjustConfig::default();
        let deltas: Vec<f64> = BumpAction::ALL.iter().map(|a| a.delta(&config)).collect();
        assert_eq!(deltas, vec![-0.5, -0.1, 0.1, 0.5, -0.5, -0.1, 0.1, 0.5]);
    }

    #[tokio::test]
    async fn test_bump_refreshes_readout() {
        let controller = controller(10.0, 13.0);
        controller.bump(BumpAction::new(Bound::Start, BumpStep::IncreaseLarge)).await;
        assert_eq!(bounds(&controller).await, (10.5, 13.0));
        assert_eq!(controller.board.current().start_label(), "0:10.5");
    }

    #[tokio::test]
    async fn test_direct_entry() {
        let controller = controller(10.0, 13.0);
        assert!(controller.direct_entry(Bound::End, Some("12,5")).await);
        assert_eq!(bounds(&controller).await, (10.0, 12.5));
        assert_eq!(controller.board.current().end_label(), "0:12.5");

        assert!(!controller.direct_entry(Bound::End, Some("soon")).await);
        assert!(!controller.direct_entry(Bound::Start, None).await);
        assert_eq!(bounds(&controller).await, (10.0, 12.5));

        assert!(controller.direct_entry(Bound::Start, Some("-3")).await);
        assert_eq!(bounds(&controller).await, (0.0, 12.5));
    }

    #[tokio::test]
    async fn test_entry_prompt_shows_current_value() {
        let controller = controller(10.25, 13.0);
        assert_eq!(controller.entry_prompt(Bound::Start).await, "10.25");
        assert_eq!(controller.entry_prompt(Bound::End).await, "13");
    }

    #[tokio::test]
    async fn test_hold_repeats_until_release() {
        tokio::time::pause();
        let mut controller = controller(10.0, 13.0);
        controller.press_start(BumpAction::new(Bound::End, BumpStep::IncreaseLarge));
        assert!(controller.is_holding());

        // repeats at 120, 240 and 360 ms
        tokio::time::sleep(Duration::from_millis(400)).await;
        controller.release();
        controller.release();
        assert!(!controller.is_holding());

        tokio::time::sleep(Duration::from_millis(1000)).await;
        let (_, end) = bounds(&controller).await;
        assert!((end - 14.5).abs() < 1e-9, "end was {}", end);
    }

    #[tokio::test]
    async fn test_new_press_replaces_previous_hold() {
        tokio::time::pause();
        let mut controller = controller(10.0, 13.0);
        controller.press_start(BumpAction::new(Bound::End, BumpStep::IncreaseLarge));
        controller.press_start(BumpAction::new(Bound::Start, BumpStep::DecreaseLarge));

        tokio::time::sleep(Duration::from_millis(250)).await;
        controller.release();

        assert_eq!(bounds(&controller).await, (9.0, 13.0));
    }
}
