use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::adjust::AdjustmentController;
use crate::command::SessionCommand;
use crate::config::Config;
use crate::error::{PlayerError, Result};
use crate::params::StartupParams;
use crate::player::{PlaybackState, PlayerHandle};
use crate::range::{Bound, RangeLimits, RangeState};
use crate::readout::{Readout, ReadoutBoard};
use crate::segments::Segment;
use crate::speed::SpeedCycler;
use crate::state::{refresh_readout, shared, LoopSnapshot, LoopState, SharedLoopState};
use crate::time_format::TimeFormatter;
use crate::watchdog::{LoopWatchdog, WatchdogState};

/// Caption shown when neither the URL nor a lookup supplies one
pub const CAPTION_PLACEHOLDER: &str = "(set a caption with ?t= or look one up with ?id=)";

/// Everything one page session owns: loop state, readout, schedules and the
/// player once it is ready.
///
/// All user actions go through [`dispatch`](Self::dispatch). Player failures
/// are logged and absorbed there; nothing a command does can fail the session.
pub struct LoopSession {
    params: StartupParams,
    state: SharedLoopState,
    board: Arc<ReadoutBoard>,
    watchdog: LoopWatchdog,
    adjuster: AdjustmentController,
    player: Option<Arc<dyn PlayerHandle>>,
    caption: String,
    lookup_applied: bool,
}

impl LoopSession {
    /// Seed a session from startup parameters
    pub fn new(config: &Config, params: StartupParams) -> Result<Self> {
        let range = RangeState::initialize(RangeLimits::from(&config.range), params.start, params.end);
        let speed = SpeedCycler::new(config.speed.speeds.clone())?;

        let formatter = TimeFormatter::new(config.display.policy);
        let board = Arc::new(ReadoutBoard::new(Readout::new(
            formatter,
            range.start(),
            range.end(),
            speed.current(),
        )));
        let state = shared(LoopState::new(range, speed));

        if !params.has_video() {
            warn!("No video id given (?v=...), playback controls stay disabled");
        }

        let caption = params
            .caption
            .clone()
            .unwrap_or_else(|| CAPTION_PLACEHOLDER.to_string());

        Ok(Self {
            adjuster: AdjustmentController::new(config.adjust.clone(), state.clone(), board.clone()),
            watchdog: LoopWatchdog::new(config.watchdog.clone()),
            params,
            state,
            board,
            player: None,
            caption,
            lookup_applied: false,
        })
    }

    /// Apply a segment lookup result. Only the first call has any effect.
    pub async fn apply_segment(&mut self, segment: &Segment) {
        if self.lookup_applied {
            warn!("Segment lookup already applied, ignoring {}", segment.id);
            return;
        }
        self.lookup_applied = true;

        self.state
            .write()
            .await
            .range
            .override_from_lookup(segment.start, segment.end);
        if let Some(text) = &segment.text {
            self.caption = text.clone();
        }
        refresh_readout(&self.state, &self.board).await;
    }

    /// Attach the player once it reports ready
    pub fn attach_player(&mut self, player: Arc<dyn PlayerHandle>) {
        if !self.params.has_video() {
            warn!("Ignoring player: no video id for this session");
            return;
        }
        self.player = Some(player);
        info!("🎬 Player ready for video {}", self.params.video_id);
    }

    /// Drop the player, e.g. when the widget is torn down
    pub fn detach_player(&mut self) {
        self.watchdog.cancel_polling();
        if self.player.take().is_some() {
            info!("Player detached");
        }
    }

    pub fn has_player(&self) -> bool {
        self.player.is_some()
    }

    /// Run one user action
    pub async fn dispatch(&mut self, command: SessionCommand) {
        debug!("Dispatching {:?}", command);
        match command {
            SessionCommand::Play => self.play().await,
            SessionCommand::Stop => self.stop().await,
            SessionCommand::CycleSpeed => self.cycle_speed().await,
            SessionCommand::Bump(action) => self.adjuster.bump(action).await,
            SessionCommand::PressStart(action) => self.adjuster.press_start(action),
            SessionCommand::PressEnd | SessionCommand::PressCancel => self.adjuster.release(),
            SessionCommand::DirectEntry { bound, input } => {
                self.adjuster.direct_entry(bound, input.as_deref()).await;
            }
        }
    }

    async fn play(&mut self) {
        let Some(player) = self.player.clone() else {
            debug!("Play ignored: player not ready");
            return;
        };

        match self
            .watchdog
            .play(player, self.state.clone(), self.board.clone())
            .await
        {
            Ok(()) => {}
            Err(PlayerError::Destroyed) => {
                warn!("Player destroyed before playback could start");
                self.detach_player();
            }
            Err(e) => warn!("Failed to start playback: {}", e),
        }
    }

    async fn stop(&mut self) {
        let Some(player) = self.player.clone() else {
            debug!("Stop ignored: player not ready");
            return;
        };
        self.watchdog.stop(Some(player.as_ref())).await;
    }

    async fn cycle_speed(&mut self) {
        let Some(player) = self.player.clone() else {
            debug!("Speed change ignored: player not ready");
            return;
        };

        let speed = self.state.write().await.speed.cycle();
        refresh_readout(&self.state, &self.board).await;
        info!("⏩ Speed {}x", speed);

        match player.playback_state().await {
            Ok(PlaybackState::Playing) => {
                if let Err(e) = player.set_playback_rate(speed).await {
                    warn!("Failed to apply playback rate {}: {}", speed, e);
                }
            }
            Ok(_) => debug!("Not playing, {}x applies on next play", speed),
            Err(e) => debug!("Playback state unavailable: {}", e),
        }
    }

    pub fn params(&self) -> &StartupParams {
        &self.params
    }

    pub fn caption(&self) -> &str {
        &self.caption
    }

    pub fn readout(&self) -> Readout {
        self.board.current()
    }

    pub fn subscribe(&self) -> watch::Receiver<Readout> {
        self.board.subscribe()
    }

    pub fn watchdog_state(&self) -> WatchdogState {
        self.watchdog.state()
    }

    pub fn is_holding(&self) -> bool {
        self.adjuster.is_holding()
    }

    pub async fn snapshot(&self) -> LoopSnapshot {
        self.state.read().await.snapshot()
    }

    /// Current value of a bound for the direct-entry prompt
    pub async fn entry_prompt(&self, bound: Bound) -> String {
        self.adjuster.entry_prompt(bound).await
    }
}
