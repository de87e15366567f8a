use crate::collaborator::FrameSource;
use crate::machine::{Effect, RoundStateMachine};
use crate::phase::GamePhase;

/// Per-frame driver for motion analysis.
///
/// The loop runs for as long as the game screen is shown, but only pulls a
/// frame and judges it while the machine is in `red-detecting`. Ticks in
/// every other phase are cheap no-ops.
#[derive(Debug, Default)]
pub struct AnalysisLoop {
    running: bool,
    ticks: u64,
    analyzed: u64,
}

impl AnalysisLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self) {
        if !self.running {
            tracing::debug!("analysis loop started");
        }
        self.running = true;
    }

    pub fn stop(&mut self) {
        if self.running {
            tracing::debug!(ticks = self.ticks, analyzed = self.analyzed, "analysis loop stopped");
        }
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Ticks seen while running.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Ticks that actually judged a frame.
    pub fn analyzed(&self) -> u64 {
        self.analyzed
    }

    pub fn tick(
        &mut self,
        machine: &mut RoundStateMachine,
        frames: &mut dyn FrameSource,
    ) -> Vec<Effect> {
        if !self.running {
            return Vec::new();
        }
        self.ticks += 1;
        if machine.phase() != GamePhase::RedDetecting {
            return Vec::new();
        }
        let Some(frame) = frames.current_frame() else {
            tracing::trace!("no frame available this tick");
            return Vec::new();
        };
        self.analyzed += 1;
        machine.analyze(&frame)
    }
}
