//! Interfaces to the pieces the core does not own: the camera, the speech
//! engine and whoever displays game events.

use serde::{Deserialize, Serialize};

use crate::events::GameEvent;
use crate::frame::Frame;

/// Identifies one narration request. Completion reports must echo it back;
/// reports for any other ticket are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NarrationTicket {
    pub epoch: u64,
    pub seq: u64,
}

/// A phrase to speak at a playback rate.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub ticket: NarrationTicket,
    pub text: String,
    pub rate: f32,
}

/// Supplies the latest full camera frame, already oriented for display.
pub trait FrameSource {
    fn current_frame(&mut self) -> Option<Frame>;
}

impl<F> FrameSource for F
where
    F: FnMut() -> Option<Frame>,
{
    fn current_frame(&mut self) -> Option<Frame> {
        self()
    }
}

/// Speech output. Implementations report completion or failure of an
/// utterance asynchronously, tagged with its ticket.
pub trait Narrator {
    fn speak(&mut self, utterance: Utterance);

    /// Stop any utterance in progress and suppress its completion report.
    fn cancel(&mut self);
}

/// Passive observer of game events.
pub trait EventSink {
    fn on_event(&mut self, event: &GameEvent);
}

impl EventSink for Vec<GameEvent> {
    fn on_event(&mut self, event: &GameEvent) {
        self.push(event.clone());
    }
}
