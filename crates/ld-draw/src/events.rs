//! Draw events for audio and presentation hook-up
//!
//! Events are informational. Nothing in the engine depends on whether
//! anyone is listening.

use crossbeam_channel::{Receiver, Sender, unbounded};
use serde::{Deserialize, Serialize};

use crate::history::DrawBatch;
use crate::pool::Entry;

/// Something observable happened in the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DrawEvent {
    /// Winners were selected and the reveal began
    DrawStarted { prize: String, count: usize },
    /// A reveal frame pulsed
    Tick { display: String },
    /// The final reveal is showing a deliberately wrong digit
    FakeOut { display: String },
    /// One winner finished revealing (`index` of `of`, zero-based)
    WinnerRevealed { entry: Entry, index: usize, of: usize },
    /// A batch was recorded in history
    BatchCommitted { batch: DrawBatch, is_final_prize: bool },
    /// The last prize tier has been awarded
    AllPrizesComplete,
    /// An in-flight draw was abandoned; its entries stay drawn
    DrawCancelled { entries: Vec<Entry> },
    /// The last batch was undone
    Undone { batch: DrawBatch },
    /// History was cleared and the pool refilled
    Reset,
}

/// Fan-out of events to any number of subscribers
#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: Vec<Sender<DrawEvent>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber
    pub fn subscribe(&mut self) -> Receiver<DrawEvent> {
        let (tx, rx) = unbounded();
        self.subscribers.push(tx);
        rx
    }

    /// Deliver to every live subscriber, dropping disconnected ones
    pub fn emit(&mut self, event: DrawEvent) {
        if self.subscribers.is_empty() {
            return;
        }
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}
