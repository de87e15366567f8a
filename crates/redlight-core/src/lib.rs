//! Game logic for Red Light, Green Light played in front of a camera.
//!
//! Players stand side by side, each owning a vertical zone of the frame. While
//! the light is red, any zone that changes too much against its reference
//! snapshot eliminates its player. [`machine::RoundStateMachine`] drives the
//! phases and returns effects for a host to execute; the host owns real
//! clocks, speech and the camera.

pub mod analysis;
pub mod collaborator;
pub mod config;
pub mod detector;
pub mod error;
pub mod events;
pub mod frame;
pub mod machine;
pub mod phase;
pub mod roster;
pub mod timers;
pub mod zone;


#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    use std::time::Duration;

    use crate::analysis::AnalysisLoop;
    use crate::collaborator::Utterance;
    use crate::config::{GameSettings, SessionConfig};
    use crate::events::GameEvent;
    use crate::frame::Frame;
    use crate::machine::{Effect, Input, RoundStateMachine};
    use crate::phase::GamePhase;
    use crate::timers::TimerHandle;
    use crate::zone::Zone;

    /// Background colour of a frame where nobody moves.
    pub const STILL: [u8; 4] = [20, 20, 20, 255];
    /// A colour far enough from [`STILL`] to count as motion at any sensitivity.
    pub const MOVED: [u8; 4] = [230, 230, 230, 255];

    /// Valid config with a fixed seed so detection windows are reproducible.
    pub fn session_config(players: usize, rounds: u32, sensitivity: u8) -> SessionConfig {
        SessionConfig {
            game: GameSettings {
                player_count: players,
                total_rounds: rounds,
                sensitivity,
                seed: Some(7),
                ..GameSettings::default()
            },
            ..SessionConfig::default()
        }
    }

    /// Fill one player's whole zone with a colour.
    pub fn paint_zone(frame: &mut Frame, player: usize, players: usize, rgba: [u8; 4]) {
        if let Some(zone) = Zone::for_player(player, frame.width(), frame.height(), players) {
            frame.fill_rect(zone.x, 0, zone.width, zone.height, rgba);
        }
    }

    /// How the simulated speech engine answers a `Speak` effect.
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub enum NarrationScript {
        CompleteAfter(Duration),
        FailAfter(Duration),
        /// Never reports back.
        Silent,
    }

    enum Due {
        Timer(usize),
        Narration(usize),
        Frame,
    }

    /// Deterministic host for a [`RoundStateMachine`] on a virtual clock.
    ///
    /// Executes effects the way a real host would: timers and narration
    /// reports are queued with deadlines and delivered as inputs when
    /// [`SimDriver::advance`] passes them, and the analysis loop ticks at a
    /// fixed frame interval against [`SimDriver::frame_mut`].
    pub struct SimDriver {
        pub machine: RoundStateMachine,
        pub analysis: AnalysisLoop,
        pub events: Vec<GameEvent>,
        pub spoken: Vec<Utterance>,
        /// Zones captured by reference-capture effects so far.
        pub captures: usize,
        frame: Frame,
        now: Duration,
        timers: Vec<(Duration, TimerHandle)>,
        narrations: Vec<(Duration, Input)>,
        script: NarrationScript,
        honor_cancellation: bool,
        frame_interval: Duration,
        next_frame: Duration,
    }

    impl SimDriver {
        pub fn new(config: SessionConfig) -> Self {
            Self {
                machine: RoundStateMachine::new(config).expect("valid test config"),
                analysis: AnalysisLoop::new(),
                events: Vec::new(),
                spoken: Vec::new(),
                captures: 0,
                frame: Frame::filled(320, 180, STILL),
                now: Duration::ZERO,
                timers: Vec::new(),
                narrations: Vec::new(),
                script: NarrationScript::CompleteAfter(Duration::from_secs(1)),
                honor_cancellation: true,
                frame_interval: Duration::from_millis(33),
                next_frame: Duration::from_millis(33),
            }
        }

        pub fn with_script(mut self, script: NarrationScript) -> Self {
            self.script = script;
            self
        }

        /// Keep delivering cancelled timers and narration reports, like a
        /// host whose cancellation raced with the callback.
        pub fn leaky(mut self) -> Self {
            self.honor_cancellation = false;
            self
        }

        pub fn now(&self) -> Duration {
            self.now
        }

        pub fn frame_mut(&mut self) -> &mut Frame {
            &mut self.frame
        }

        pub fn phase(&self) -> GamePhase {
            self.machine.phase()
        }

        /// Timers the driver still intends to deliver.
        pub fn queued_timers(&self) -> usize {
            self.timers.len()
        }

        pub fn send(&mut self, input: Input) {
            match input {
                Input::Start => self.analysis.start(),
                Input::Exit => self.analysis.stop(),
                _ => {},
            }
            let effects = self.machine.handle(input);
            self.apply(effects);
        }

        pub fn apply(&mut self, effects: Vec<Effect>) {
            for effect in effects {
                match effect {
                    Effect::Schedule { handle, delay } => {
                        self.timers.push((self.now + delay, handle));
                    },
                    Effect::CancelTimers(handles) => {
                        if self.honor_cancellation {
                            self.timers.retain(|(_, h)| !handles.contains(h));
                        }
                    },
                    Effect::Speak(utterance) => {
                        let ticket = utterance.ticket;
                        self.spoken.push(utterance);
                        match self.script {
                            NarrationScript::CompleteAfter(d) => self
                                .narrations
                                .push((self.now + d, Input::NarrationEnded(ticket))),
                            NarrationScript::FailAfter(d) => self
                                .narrations
                                .push((self.now + d, Input::NarrationFailed(ticket))),
                            NarrationScript::Silent => {},
                        }
                    },
                    Effect::CancelNarration => {
                        if self.honor_cancellation {
                            self.narrations.clear();
                        }
                    },
                    Effect::CaptureReferences => {
                        self.captures += self.machine.capture_references(&self.frame);
                    },
                    Effect::Emit(event) => self.events.push(event),
                }
            }
        }

        fn next_due(&self, until: Duration) -> Option<(Duration, Due)> {
            let timer = self
                .timers
                .iter()
                .enumerate()
                .min_by_key(|(_, (at, _))| *at)
                .map(|(i, (at, _))| (*at, Due::Timer(i)));
            let narration = self
                .narrations
                .iter()
                .enumerate()
                .min_by_key(|(_, (at, _))| *at)
                .map(|(i, (at, _))| (*at, Due::Narration(i)));
            let frame = Some((self.next_frame, Due::Frame));

            // Ties go to timers, then narration, then the frame tick.
            [timer, narration, frame]
                .into_iter()
                .flatten()
                .filter(|(at, _)| *at <= until)
                .min_by_key(|(at, _)| *at)
        }

        /// Move the clock forward, delivering everything that falls due.
        pub fn advance(&mut self, dt: Duration) {
            let until = self.now + dt;
            while let Some((at, due)) = self.next_due(until) {
                self.now = at;
                match due {
                    Due::Timer(i) => {
                        let (_, handle) = self.timers.remove(i);
                        self.send(Input::TimerFired(handle));
                    },
                    Due::Narration(i) => {
                        let (_, input) = self.narrations.remove(i);
                        self.send(input);
                    },
                    Due::Frame => {
                        self.next_frame += self.frame_interval;
                        let frame = self.frame.clone();
                        let mut source = move || Some(frame.clone());
                        let effects = self.analysis.tick(&mut self.machine, &mut source);
                        self.apply(effects);
                    },
                }
            }
            self.now = until;
        }

        /// Advance in small steps until `phase` is reached. Returns `false` if
        /// `limit` runs out first.
        pub fn run_until_phase(&mut self, phase: GamePhase, limit: Duration) -> bool {
            let deadline = self.now + limit;
            while self.now < deadline {
                if self.machine.phase() == phase {
                    return true;
                }
                self.advance(Duration::from_millis(10));
            }
            self.machine.phase() == phase
        }

        pub fn game_over_events(&self) -> Vec<&GameEvent> {
            self.events
                .iter()
                .filter(|e| matches!(e, GameEvent::GameOver { .. }))
                .collect()
        }

        pub fn eliminated_players(&self) -> Vec<usize> {
            self.events
                .iter()
                .filter_map(|e| match e {
                    GameEvent::PlayerEliminated { player } => Some(*player),
                    _ => None,
                })
                .collect()
        }
    }
}
