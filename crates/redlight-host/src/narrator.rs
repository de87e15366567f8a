use std::time::Duration;

use tokio::task::JoinHandle;

use redlight_core::collaborator::{Narrator, Utterance};

use crate::config::NarrationConfig;
use crate::session::NarrationNotifier;

/// Speech engine stand-in. "Speaks" for a time estimated from the word
/// count and playback rate, then reports back through the notifier.
///
/// Must be used from inside a tokio runtime.
pub struct SimulatedNarrator {
    notifier: NarrationNotifier,
    config: NarrationConfig,
    in_flight: Option<JoinHandle<()>>,
    spoken: u64,
}

impl SimulatedNarrator {
    pub fn new(notifier: NarrationNotifier, config: &NarrationConfig) -> Self {
        Self {
            notifier,
            config: config.clone(),
            in_flight: None,
            spoken: 0,
        }
    }

    /// How long `text` takes to say at `rate`.
    pub fn estimate(&self, text: &str, rate: f32) -> Duration {
        let words = text.split_whitespace().count().max(1) as f64;
        let rate = if rate.is_finite() && rate > 0.0 {
            f64::from(rate)
        } else {
            1.0
        };
        let nanos = words * self.config.word_ms as f64 * 1_000_000.0 / rate;
        Duration::from_nanos(nanos.round() as u64)
    }

    /// Utterances started so far.
    pub fn spoken(&self) -> u64 {
        self.spoken
    }
}

impl Narrator for SimulatedNarrator {
    fn speak(&mut self, utterance: Utterance) {
        self.cancel();
        self.spoken += 1;

        let ticket = utterance.ticket;
        let notifier = self.notifier.clone();
        let fail = self.config.force_failure;
        let delay = if fail {
            Duration::from_millis(self.config.failure_delay_ms)
        } else {
            self.estimate(&utterance.text, utterance.rate)
        };
        tracing::debug!(
            text = %utterance.text,
            rate = utterance.rate,
            delay_ms = delay.as_millis() as u64,
            fail,
            "Speaking"
        );

        self.in_flight = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if fail {
                notifier.failed(ticket);
            } else {
                notifier.ended(ticket);
            }
        }));
    }

    fn cancel(&mut self) {
        if let Some(task) = self.in_flight.take() {
            task.abort();
        }
    }
}

impl Drop for SimulatedNarrator {
    fn drop(&mut self) {
        self.cancel();
    }
}
