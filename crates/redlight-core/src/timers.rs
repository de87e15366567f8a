use serde::{Deserialize, Serialize};

/// What a scheduled timer does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimerKind {
    /// Start narrating the phrase shortly after green begins.
    NarrationLeadIn,
    /// Stand-in for narration completion after a speech failure.
    NarrationFallback,
    /// Reaction time is over; capture references and start judging.
    GraceElapsed,
    /// The randomized detection window is over.
    DetectionWindowElapsed,
}

/// Opaque handle for one scheduled timer. Carries the registry epoch it was
/// issued in, so a handle from before a reset can never match again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimerHandle {
    id: u64,
    epoch: u64,
}

impl TimerHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

#[derive(Debug, Clone, Copy)]
struct PendingTimer {
    handle: TimerHandle,
    kind: TimerKind,
}

/// Bookkeeping for every outstanding delayed action.
///
/// The registry does not own a clock. Whoever executes the schedule effect
/// calls [`TimerRegistry::fire`] when the delay is up; `fire` deregisters the
/// handle and only hands back the timer's kind if it is still live.
#[derive(Debug, Default)]
pub struct TimerRegistry {
    epoch: u64,
    next_id: u64,
    pending: Vec<PendingTimer>,
}

impl TimerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Incremented by every [`TimerRegistry::cancel_all`].
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn schedule(&mut self, kind: TimerKind) -> TimerHandle {
        self.next_id += 1;
        let handle = TimerHandle {
            id: self.next_id,
            epoch: self.epoch,
        };
        self.pending.push(PendingTimer { handle, kind });
        handle
    }

    /// Deregister a fired timer. Returns its kind, or `None` if the handle was
    /// cancelled, already fired, or belongs to an earlier epoch.
    pub fn fire(&mut self, handle: TimerHandle) -> Option<TimerKind> {
        let pos = self.pending.iter().position(|t| t.handle == handle)?;
        let timer = self.pending.swap_remove(pos);
        (timer.handle.epoch == self.epoch).then_some(timer.kind)
    }

    /// Forget every outstanding timer and start a new epoch. Returns the
    /// handles that were pending so the scheduler can drop them too.
    pub fn cancel_all(&mut self) -> Vec<TimerHandle> {
        self.epoch += 1;
        self.pending.drain(..).map(|t| t.handle).collect()
    }

    #[cfg(test)]
    fn is_pending(&self, handle: TimerHandle) -> bool {
        self.pending.iter().any(|t| t.handle == handle)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn pending_kinds(&self) -> Vec<TimerKind> {
        self.pending.iter().map(|t| t.kind).collect()
    }
}
