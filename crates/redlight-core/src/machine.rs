use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::collaborator::{NarrationTicket, Utterance};
use crate::config::{GameSettings, SessionConfig};
use crate::error::ConfigError;
use crate::events::{GameEvent, GameOutcome};
use crate::frame::Frame;
use crate::phase::GamePhase;
use crate::roster::PlayerRoster;
use crate::timers::{TimerHandle, TimerKind, TimerRegistry};
use crate::zone::Zone;

/// Something that happened to the session from outside.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    /// Start a fresh game, or restart the current one.
    Start,
    /// Leave the game screen.
    Exit,
    TimerFired(TimerHandle),
    NarrationEnded(NarrationTicket),
    NarrationFailed(NarrationTicket),
}

/// Work the host must carry out, in order, after a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Call back with [`Input::TimerFired`] after `delay`.
    Schedule { handle: TimerHandle, delay: Duration },
    /// Drop these timers. A late delivery is harmless but wasteful.
    CancelTimers(Vec<TimerHandle>),
    Speak(Utterance),
    CancelNarration,
    /// Grab the current frame and pass it to
    /// [`RoundStateMachine::capture_references`].
    CaptureReferences,
    Emit(GameEvent),
}

fn rng_from(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

/// Phase controller for one game session.
///
/// Owns the phase, round counter, roster, reference frames and timer
/// registry. Every transition is a method call that returns the effects to
/// run; nothing here sleeps, speaks or reads the camera on its own.
///
/// Two guards make late callbacks harmless. Timer handles and narration
/// tickets carry the registry epoch, which advances whenever all timers are
/// cancelled (start, exit, game over), so anything issued before that is
/// dropped. On top of that, each transition checks the phase it expects.
pub struct RoundStateMachine {
    config: SessionConfig,
    phase: GamePhase,
    round: u32,
    roster: PlayerRoster,
    references: Vec<Option<Frame>>,
    timers: TimerRegistry,
    narration: Option<NarrationTicket>,
    narration_seq: u64,
    rng: StdRng,
}

impl RoundStateMachine {
    pub fn new(config: SessionConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let players = config.game.player_count;
        Ok(Self {
            rng: rng_from(config.game.seed),
            roster: PlayerRoster::new(players),
            references: vec![None; players],
            config,
            phase: GamePhase::Idle,
            round: 1,
            timers: TimerRegistry::new(),
            narration: None,
            narration_seq: 0,
        })
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn total_rounds(&self) -> u32 {
        self.config.game.total_rounds
    }

    pub fn roster(&self) -> &PlayerRoster {
        &self.roster
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn settings(&self) -> &GameSettings {
        &self.config.game
    }

    pub fn reference(&self, player: usize) -> Option<&Frame> {
        self.references.get(player).and_then(Option::as_ref)
    }

    pub fn epoch(&self) -> u64 {
        self.timers.epoch()
    }

    pub fn pending_timers(&self) -> Vec<TimerKind> {
        self.timers.pending_kinds()
    }

    /// Apply new settings between sessions. Rebuilds the roster and reference
    /// slots for the new player count and returns to idle.
    pub fn configure(&mut self, game: GameSettings) -> Result<Vec<Effect>, ConfigError> {
        let config = SessionConfig {
            game,
            ..self.config.clone()
        };
        config.validate()?;

        let mut effects = self.cancel_all();
        let players = config.game.player_count;
        self.roster = PlayerRoster::new(players);
        self.references = vec![None; players];
        self.round = 1;
        self.rng = rng_from(config.game.seed);
        self.config = config;
        self.go_idle(&mut effects);
        tracing::info!(players, "session reconfigured");
        Ok(effects)
    }

    pub fn handle(&mut self, input: Input) -> Vec<Effect> {
        match input {
            Input::Start => self.start(),
            Input::Exit => self.exit(),
            Input::TimerFired(handle) => self.on_timer(handle),
            Input::NarrationEnded(ticket) => self.on_narration_ended(ticket),
            Input::NarrationFailed(ticket) => self.on_narration_failed(ticket),
        }
    }

    fn start(&mut self) -> Vec<Effect> {
        let mut effects = self.cancel_all();
        self.roster.reset();
        self.clear_references();
        self.round = 1;
        tracing::info!(
            players = self.roster.len(),
            rounds = self.total_rounds(),
            "game started"
        );
        effects.push(Effect::Emit(GameEvent::RoundChanged {
            round: self.round,
            total: self.total_rounds(),
        }));
        self.enter_green(&mut effects);
        effects
    }

    fn exit(&mut self) -> Vec<Effect> {
        let mut effects = self.cancel_all();
        self.clear_references();
        self.go_idle(&mut effects);
        effects
    }

    fn on_timer(&mut self, handle: TimerHandle) -> Vec<Effect> {
        let Some(kind) = self.timers.fire(handle) else {
            tracing::debug!(
                timer = handle.id(),
                timer_epoch = handle.epoch(),
                epoch = self.timers.epoch(),
                "ignoring stale timer"
            );
            return Vec::new();
        };

        let mut effects = Vec::new();
        match kind {
            TimerKind::NarrationLeadIn => {
                if self.in_phase(GamePhase::Green, kind) {
                    self.speak(&mut effects);
                }
            },
            TimerKind::NarrationFallback => {
                if self.in_phase(GamePhase::Green, kind) {
                    self.enter_red_grace(&mut effects);
                }
            },
            TimerKind::GraceElapsed => {
                if self.in_phase(GamePhase::RedGrace, kind) {
                    self.enter_red_detecting(&mut effects);
                }
            },
            TimerKind::DetectionWindowElapsed => {
                if self.in_phase(GamePhase::RedDetecting, kind) {
                    self.end_detection_window(&mut effects);
                }
            },
        }
        effects
    }

    fn on_narration_ended(&mut self, ticket: NarrationTicket) -> Vec<Effect> {
        let mut effects = Vec::new();
        if self.take_narration(ticket) {
            self.enter_red_grace(&mut effects);
        }
        effects
    }

    fn on_narration_failed(&mut self, ticket: NarrationTicket) -> Vec<Effect> {
        let mut effects = Vec::new();
        if self.take_narration(ticket) {
            let delay = self.config.timing.fallback(self.config.game.speed);
            tracing::warn!(
                fallback_ms = delay.as_millis() as u64,
                "narration failed, continuing on a timer"
            );
            self.schedule(TimerKind::NarrationFallback, delay, &mut effects);
        }
        effects
    }

    /// Store a reference snapshot for every zone whose player is still in.
    /// Only valid right after entering `red-detecting`; returns how many
    /// zones were captured.
    pub fn capture_references(&mut self, frame: &Frame) -> usize {
        if self.phase != GamePhase::RedDetecting {
            tracing::debug!(phase = %self.phase, "reference capture outside detection, skipped");
            return 0;
        }
        let mut captured = 0;
        for zone in Zone::layout(frame.width(), frame.height(), self.roster.len()) {
            if self.roster.is_eliminated(zone.index) {
                continue;
            }
            if zone.width == 0 {
                tracing::warn!(
                    player = zone.index,
                    frame_width = frame.width(),
                    players = self.roster.len(),
                    "zone has no columns, player cannot be judged"
                );
                continue;
            }
            self.references[zone.index] = Some(zone.capture(frame));
            captured += 1;
        }
        tracing::debug!(captured, round = self.round, "reference frames captured");
        captured
    }

    /// Judge one analysis tick. Anyone whose zone moved past the threshold
    /// is eliminated; if nobody is left the game ends immediately.
    pub fn analyze(&mut self, frame: &Frame) -> Vec<Effect> {
        if self.phase != GamePhase::RedDetecting {
            return Vec::new();
        }

        let detector = self.config.detector;
        let sensitivity = self.config.game.sensitivity;
        let movers: Vec<usize> = Zone::layout(frame.width(), frame.height(), self.roster.len())
            .into_iter()
            .filter(|zone| !self.roster.is_eliminated(zone.index))
            .filter(|zone| {
                // No reference yet (or a stale size): not assessable this tick.
                self.references[zone.index].as_ref().is_some_and(|reference| {
                    detector.has_moved(&zone.capture(frame), reference, sensitivity)
                })
            })
            .map(|zone| zone.index)
            .collect();

        let mut effects = Vec::new();
        for player in movers {
            if self.roster.eliminate(player) {
                tracing::info!(player, round = self.round, "player eliminated");
                effects.push(Effect::Emit(GameEvent::PlayerEliminated { player }));
            }
        }

        if self.roster.all_eliminated() {
            self.finish(GameOutcome::AllEliminated, &mut effects);
        }
        effects
    }

    fn in_phase(&self, expected: GamePhase, kind: TimerKind) -> bool {
        if self.phase == expected {
            return true;
        }
        tracing::debug!(?kind, phase = %self.phase, expected = %expected, "timer fired in another phase");
        false
    }

    /// Accept a narration report only for the current ticket while green.
    fn take_narration(&mut self, ticket: NarrationTicket) -> bool {
        if self.phase != GamePhase::Green || self.narration != Some(ticket) {
            tracing::debug!(
                ticket_epoch = ticket.epoch,
                ticket_seq = ticket.seq,
                phase = %self.phase,
                "ignoring stale narration report"
            );
            return false;
        }
        self.narration = None;
        true
    }

    fn speak(&mut self, effects: &mut Vec<Effect>) {
        self.narration_seq += 1;
        let ticket = NarrationTicket {
            epoch: self.timers.epoch(),
            seq: self.narration_seq,
        };
        self.narration = Some(ticket);
        effects.push(Effect::Speak(Utterance {
            ticket,
            text: self.config.game.phrase.clone(),
            rate: self.config.game.speed,
        }));
    }

    fn enter_green(&mut self, effects: &mut Vec<Effect>) {
        self.clear_references();
        self.narration = None;
        self.set_phase(GamePhase::Green, effects);
        self.schedule(TimerKind::NarrationLeadIn, self.config.timing.lead_in(), effects);
    }

    fn enter_red_grace(&mut self, effects: &mut Vec<Effect>) {
        self.set_phase(GamePhase::RedGrace, effects);
        self.schedule(TimerKind::GraceElapsed, self.config.timing.grace(), effects);
    }

    fn enter_red_detecting(&mut self, effects: &mut Vec<Effect>) {
        self.set_phase(GamePhase::RedDetecting, effects);
        effects.push(Effect::CaptureReferences);
        let timing = &self.config.timing;
        let window_ms = self
            .rng
            .random_range(timing.detect_min_ms..=timing.detect_max_ms);
        tracing::debug!(window_ms, round = self.round, "detection window opened");
        self.schedule(
            TimerKind::DetectionWindowElapsed,
            Duration::from_millis(window_ms),
            effects,
        );
    }

    fn end_detection_window(&mut self, effects: &mut Vec<Effect>) {
        if self.round >= self.total_rounds() {
            let outcome = GameOutcome::from_survivors(self.roster.survivors());
            self.finish(outcome, effects);
            return;
        }
        self.round += 1;
        effects.push(Effect::Emit(GameEvent::RoundChanged {
            round: self.round,
            total: self.total_rounds(),
        }));
        self.enter_green(effects);
    }

    fn finish(&mut self, outcome: GameOutcome, effects: &mut Vec<Effect>) {
        effects.extend(self.cancel_all());
        self.set_phase(GamePhase::GameOver, effects);
        tracing::info!(%outcome, round = self.round, "game over");
        effects.push(Effect::Emit(GameEvent::GameOver { outcome }));
    }

    fn go_idle(&mut self, effects: &mut Vec<Effect>) {
        if self.phase != GamePhase::Idle {
            self.set_phase(GamePhase::Idle, effects);
        }
    }

    fn set_phase(&mut self, phase: GamePhase, effects: &mut Vec<Effect>) {
        tracing::info!(from = %self.phase, to = %phase, round = self.round, "phase changed");
        self.phase = phase;
        effects.push(Effect::Emit(GameEvent::PhaseChanged { phase }));
    }

    fn schedule(&mut self, kind: TimerKind, delay: Duration, effects: &mut Vec<Effect>) {
        let handle = self.timers.schedule(kind);
        effects.push(Effect::Schedule { handle, delay });
    }

    fn cancel_all(&mut self) -> Vec<Effect> {
        let handles = self.timers.cancel_all();
        self.narration = None;
        tracing::debug!(
            cancelled = handles.len(),
            epoch = self.timers.epoch(),
            "pending timers cancelled"
        );
        vec![Effect::CancelTimers(handles), Effect::CancelNarration]
    }

    fn clear_references(&mut self) {
        for slot in &mut self.references {
            *slot = None;
        }
    }
}
