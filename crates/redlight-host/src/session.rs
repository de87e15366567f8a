use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::{AbortHandle, JoinHandle};

use redlight_core::analysis::AnalysisLoop;
use redlight_core::collaborator::{EventSink, FrameSource, NarrationTicket, Narrator};
use redlight_core::config::GameSettings;
use redlight_core::error::ConfigError;
use redlight_core::events::GameEvent;
use redlight_core::machine::{Effect, Input, RoundStateMachine};
use redlight_core::timers::TimerHandle;

use crate::config::HostConfig;

/// Commands sent from the front end to the session task.
#[derive(Debug, Clone)]
pub enum SessionCommand {
    Start,
    /// Same as `Start`; offered from the game-over screen.
    Restart,
    /// Back to the setup screen.
    Exit,
    /// New settings for the next game. Rejected settings are logged and
    /// leave the session untouched.
    Configure(GameSettings),
    /// Shut the session task down.
    Stop,
}

/// Broadcasts sent from the session task to the front end.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionBroadcast {
    Event(GameEvent),
    /// Signal that the session task has exited.
    SessionEnded,
}

/// Lets a [`Narrator`] report back on an utterance from any task.
#[derive(Debug, Clone)]
pub struct NarrationNotifier {
    tx: mpsc::UnboundedSender<Input>,
}

impl NarrationNotifier {
    pub fn new(tx: mpsc::UnboundedSender<Input>) -> Self {
        Self { tx }
    }

    pub fn ended(&self, ticket: NarrationTicket) {
        let _ = self.tx.send(Input::NarrationEnded(ticket));
    }

    pub fn failed(&self, ticket: NarrationTicket) {
        let _ = self.tx.send(Input::NarrationFailed(ticket));
    }
}

pub type SessionHandles = (
    mpsc::UnboundedSender<SessionCommand>,
    mpsc::UnboundedReceiver<SessionBroadcast>,
    JoinHandle<()>,
);

/// Spawn a game session as a tokio task.
/// Returns the command sender, broadcast receiver and task handle.
///
/// The narrator is built by `make_narrator` so it can be handed the
/// session's [`NarrationNotifier`].
pub fn spawn_session<F, N, S>(
    config: &HostConfig,
    frames: F,
    make_narrator: impl FnOnce(NarrationNotifier) -> N,
    sink: S,
) -> Result<SessionHandles, ConfigError>
where
    F: FrameSource + Send + 'static,
    N: Narrator + Send + 'static,
    S: EventSink + Send + 'static,
{
    let machine = RoundStateMachine::new(config.session())?;

    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let (broadcast_tx, broadcast_rx) = mpsc::unbounded_channel();
    let (signal_tx, signal_rx) = mpsc::unbounded_channel();

    let narrator = make_narrator(NarrationNotifier::new(signal_tx.clone()));
    let frame_interval = Duration::from_secs_f64(1.0 / f64::from(config.video.fps.max(1)));

    let session = Session {
        machine,
        analysis: AnalysisLoop::new(),
        frames,
        narrator,
        sink,
        timers: HashMap::new(),
        signal_tx,
        broadcast_tx,
    };
    let handle = tokio::spawn(session.run(frame_interval, cmd_rx, signal_rx));

    Ok((cmd_tx, broadcast_rx, handle))
}

/// Everything the session task owns. Effects from the state machine are
/// executed here, one at a time, in the order they were returned.
struct Session<F, N, S> {
    machine: RoundStateMachine,
    analysis: AnalysisLoop,
    frames: F,
    narrator: N,
    sink: S,
    timers: HashMap<TimerHandle, AbortHandle>,
    signal_tx: mpsc::UnboundedSender<Input>,
    broadcast_tx: mpsc::UnboundedSender<SessionBroadcast>,
}

impl<F, N, S> Session<F, N, S>
where
    F: FrameSource + Send + 'static,
    N: Narrator + Send + 'static,
    S: EventSink + Send + 'static,
{
    async fn run(
        mut self,
        frame_interval: Duration,
        mut cmd_rx: mpsc::UnboundedReceiver<SessionCommand>,
        mut signal_rx: mpsc::UnboundedReceiver<Input>,
    ) {
        let mut interval = tokio::time::interval(frame_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let effects = self.analysis.tick(&mut self.machine, &mut self.frames);
                    self.execute(effects);
                }
                Some(input) = signal_rx.recv() => {
                    if let Input::TimerFired(handle) = input {
                        self.timers.remove(&handle);
                    }
                    let effects = self.machine.handle(input);
                    self.execute(effects);
                }
                cmd = cmd_rx.recv() => {
                    match cmd {
                        Some(SessionCommand::Start | SessionCommand::Restart) => {
                            self.analysis.start();
                            let effects = self.machine.handle(Input::Start);
                            self.execute(effects);
                        },
                        Some(SessionCommand::Exit) => {
                            self.analysis.stop();
                            let effects = self.machine.handle(Input::Exit);
                            self.execute(effects);
                        },
                        Some(SessionCommand::Configure(settings)) => {
                            match self.machine.configure(settings) {
                                Ok(effects) => {
                                    self.analysis.stop();
                                    self.execute(effects);
                                },
                                Err(e) => tracing::warn!(error = %e, "Rejected new settings"),
                            }
                        },
                        Some(SessionCommand::Stop) | None => break,
                    }
                }
            }
        }

        self.shutdown();
        let _ = self.broadcast_tx.send(SessionBroadcast::SessionEnded);
    }

    fn execute(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Schedule { handle, delay } => {
                    let tx = self.signal_tx.clone();
                    let task = tokio::spawn(async move {
                        tokio::time::sleep(delay).await;
                        let _ = tx.send(Input::TimerFired(handle));
                    });
                    self.timers.insert(handle, task.abort_handle());
                },
                Effect::CancelTimers(handles) => {
                    for handle in handles {
                        if let Some(task) = self.timers.remove(&handle) {
                            task.abort();
                        }
                    }
                },
                Effect::Speak(utterance) => self.narrator.speak(utterance),
                Effect::CancelNarration => self.narrator.cancel(),
                Effect::CaptureReferences => match self.frames.current_frame() {
                    Some(frame) => {
                        self.machine.capture_references(&frame);
                    },
                    None => tracing::warn!("No camera frame available for reference capture"),
                },
                Effect::Emit(event) => {
                    self.sink.on_event(&event);
                    let _ = self.broadcast_tx.send(SessionBroadcast::Event(event));
                },
            }
        }
    }

    fn shutdown(&mut self) {
        for (_, task) in self.timers.drain() {
            task.abort();
        }
        self.narrator.cancel();
        self.analysis.stop();
        tracing::info!("Session stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redlight_core::events::GameOutcome;
    use redlight_core::frame::Frame;
    use redlight_core::phase::GamePhase;
    use redlight_core::test_helpers::STILL;

    use crate::camera::SyntheticCamera;
    use crate::narrator::SimulatedNarrator;

    fn test_config(players: usize, rounds: u32) -> HostConfig {
        let mut config = HostConfig::default();
        config.game.player_count = players;
        config.game.total_rounds = rounds;
        config.game.seed = Some(11);
        config
    }

    fn still_frames() -> impl FnMut() -> Option<Frame> + Send + 'static {
        || Some(Frame::filled(320, 180, STILL))
    }

    /// Collect events until game over (inclusive).
    async fn events_until_game_over(
        rx: &mut mpsc::UnboundedReceiver<SessionBroadcast>,
    ) -> Vec<GameEvent> {
        let mut events = Vec::new();
        while let Some(msg) = rx.recv().await {
            match msg {
                SessionBroadcast::Event(event) => {
                    let done = matches!(event, GameEvent::GameOver { .. });
                    events.push(event);
                    if done {
                        break;
                    }
                },
                SessionBroadcast::SessionEnded => panic!("session ended before game over"),
            }
        }
        events
    }

    async fn stop(cmd_tx: mpsc::UnboundedSender<SessionCommand>, handle: JoinHandle<()>) {
        let _ = cmd_tx.send(SessionCommand::Stop);
        handle.await.expect("session task should exit cleanly");
    }

    #[tokio::test(start_paused = true)]
    async fn still_players_win() {
        let config = test_config(2, 1);
        let narration = config.narration.clone();
        let (cmd_tx, mut rx, handle) = spawn_session(
            &config,
            still_frames(),
            |n| SimulatedNarrator::new(n, &narration),
            Vec::<GameEvent>::new(),
        )
        .expect("valid config");

        cmd_tx.send(SessionCommand::Start).unwrap();
        let events = events_until_game_over(&mut rx).await;

        assert_eq!(events[0], GameEvent::RoundChanged { round: 1, total: 1 });
        assert_eq!(
            events.last(),
            Some(&GameEvent::GameOver {
                outcome: GameOutcome::Winners {
                    players: vec![0, 1]
                }
            })
        );

        cmd_tx.send(SessionCommand::Stop).unwrap();
        assert_eq!(rx.recv().await, Some(SessionBroadcast::SessionEnded));
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn fidgeting_player_is_caught() {
        let mut config = test_config(3, 2);
        config.video.fidgeting = vec![1];
        let camera = SyntheticCamera::new(&config.video, &config.game);
        let narration = config.narration.clone();
        let (cmd_tx, mut rx, handle) = spawn_session(
            &config,
            camera,
            |n| SimulatedNarrator::new(n, &narration),
            Vec::<GameEvent>::new(),
        )
        .unwrap();

        cmd_tx.send(SessionCommand::Start).unwrap();
        let events = events_until_game_over(&mut rx).await;

        let eliminated: Vec<usize> = events
            .iter()
            .filter_map(|e| match e {
                GameEvent::PlayerEliminated { player } => Some(*player),
                _ => None,
            })
            .collect();
        assert_eq!(eliminated, vec![1]);
        assert_eq!(
            events.last(),
            Some(&GameEvent::GameOver {
                outcome: GameOutcome::Winners {
                    players: vec![0, 2]
                }
            })
        );
        stop(cmd_tx, handle).await;
    }

    #[tokio::test(start_paused = true)]
    async fn failed_narration_falls_back_to_timer() {
        let mut config = test_config(1, 1);
        config.narration.force_failure = true;
        let narration = config.narration.clone();
        let (cmd_tx, mut rx, handle) = spawn_session(
            &config,
            still_frames(),
            |n| SimulatedNarrator::new(n, &narration),
            Vec::<GameEvent>::new(),
        )
        .unwrap();

        let started = tokio::time::Instant::now();
        cmd_tx.send(SessionCommand::Start).unwrap();
        let events = events_until_game_over(&mut rx).await;

        assert!(matches!(
            events.last(),
            Some(GameEvent::GameOver {
                outcome: GameOutcome::Winners { .. }
            })
        ));
        // Lead-in, failure report, fallback, grace and the shortest window.
        assert!(started.elapsed() >= Duration::from_millis(800 + 200 + 3000 + 600 + 2000));
        stop(cmd_tx, handle).await;
    }

    #[tokio::test(start_paused = true)]
    async fn exit_returns_to_idle_and_goes_quiet() {
        let config = test_config(2, 1);
        let narration = config.narration.clone();
        let (cmd_tx, mut rx, handle) = spawn_session(
            &config,
            still_frames(),
            |n| SimulatedNarrator::new(n, &narration),
            Vec::<GameEvent>::new(),
        )
        .unwrap();

        cmd_tx.send(SessionCommand::Start).unwrap();
        tokio::time::sleep(Duration::from_millis(1000)).await;
        cmd_tx.send(SessionCommand::Exit).unwrap();

        let mut last = None;
        while let Ok(Some(SessionBroadcast::Event(event))) =
            tokio::time::timeout(Duration::from_secs(10), rx.recv()).await
        {
            last = Some(event);
        }
        assert_eq!(
            last,
            Some(GameEvent::PhaseChanged {
                phase: GamePhase::Idle
            })
        );
        stop(cmd_tx, handle).await;
    }

    #[tokio::test(start_paused = true)]
    async fn configure_applies_between_games() {
        let config = test_config(2, 1);
        let narration = config.narration.clone();
        let (cmd_tx, mut rx, handle) = spawn_session(
            &config,
            still_frames(),
            |n| SimulatedNarrator::new(n, &narration),
            Vec::<GameEvent>::new(),
        )
        .unwrap();

        // Invalid settings are ignored; the session keeps the old ones.
        let mut bad = config.game.clone();
        bad.player_count = 0;
        cmd_tx.send(SessionCommand::Configure(bad)).unwrap();

        let mut good = config.game.clone();
        good.player_count = 4;
        cmd_tx.send(SessionCommand::Configure(good)).unwrap();
        cmd_tx.send(SessionCommand::Restart).unwrap();

        let events = events_until_game_over(&mut rx).await;
        assert_eq!(
            events.last(),
            Some(&GameEvent::GameOver {
                outcome: GameOutcome::Winners {
                    players: vec![0, 1, 2, 3]
                }
            })
        );
        stop(cmd_tx, handle).await;
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_command_sender_ends_session() {
        let config = test_config(2, 1);
        let narration = config.narration.clone();
        let (cmd_tx, mut rx, handle) = spawn_session(
            &config,
            still_frames(),
            |n| SimulatedNarrator::new(n, &narration),
            Vec::<GameEvent>::new(),
        )
        .unwrap();

        drop(cmd_tx);
        assert_eq!(rx.recv().await, Some(SessionBroadcast::SessionEnded));
        handle.await.unwrap();
    }

    #[test]
    fn spawn_rejects_invalid_config() {
        let mut config = test_config(2, 1);
        config.game.total_rounds = 0;
        let result = spawn_session(
            &config,
            still_frames(),
            |n| SimulatedNarrator::new(n, &config.narration),
            Vec::<GameEvent>::new(),
        );
        assert!(matches!(result, Err(ConfigError::NoRounds)));
    }
}
