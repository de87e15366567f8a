use std::io::Write;

use redlight_core::collaborator::EventSink;
use redlight_core::events::GameEvent;

/// Logs every game event with structured `tracing` fields.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn on_event(&mut self, event: &GameEvent) {
        match event {
            GameEvent::PhaseChanged { phase } => {
                tracing::info!(%phase, red = phase.is_red(), "Phase changed");
            },
            GameEvent::PlayerEliminated { player } => {
                tracing::info!(player = player + 1, "Player eliminated");
            },
            GameEvent::RoundChanged { round, total } => {
                tracing::info!(round, total, "Round {round} of {total}");
            },
            GameEvent::GameOver { outcome } => {
                tracing::info!(%outcome, "Game over");
            },
        }
    }
}

/// Writes each event as one JSON object per line.
#[derive(Debug)]
pub struct JsonLinesSink<W> {
    out: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> EventSink for JsonLinesSink<W> {
    fn on_event(&mut self, event: &GameEvent) {
        let written = serde_json::to_writer(&mut self.out, event)
            .map_err(std::io::Error::from)
            .and_then(|()| writeln!(self.out))
            .and_then(|()| self.out.flush());
        if let Err(e) = written {
            tracing::warn!(error = %e, "Failed to write event");
        }
    }
}
