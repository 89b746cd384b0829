use std::time::Duration;

use indexmap::IndexMap;
use tokio::time::Instant;

use crate::{domain::types::QueueSnapshot, dom::NodeId};

/// Titles awaiting one AI decision, each with the cards that share it.
/// Insertion order is kept so prompts list titles as they were discovered.
pub type PendingBatch = IndexMap<String, Vec<NodeId>>;

/// Debounced batch queue: every push restarts the quiet period, and the
/// batch becomes due only once pushes have stopped for that long.
#[derive(Debug)]
pub struct BatchQueue {
    pending: PendingBatch,
    quiet_period: Duration,
    deadline: Option<Instant>,
}

impl BatchQueue {
    pub fn new(quiet_period: Duration) -> Self {
        Self {
            pending: IndexMap::new(),
            quiet_period,
            deadline: None,
        }
    }

    pub fn push(&mut self, title: &str, card: NodeId, now: Instant) {
        let cards = self.pending.entry(title.to_string()).or_default();
        if !cards.contains(&card) {
            cards.push(card);
        }
        self.deadline = Some(now + self.quiet_period);
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| now >= deadline)
    }

    /// Drops cards failing `keep` and every title left without cards;
    /// disarms the timer once nothing is queued. Returns the cards dropped.
    pub fn retain_cards(&mut self, mut keep: impl FnMut(NodeId) -> bool) -> usize {
        let mut dropped = 0;
        self.pending.retain(|_, cards| {
            let before = cards.len();
            cards.retain(|card| keep(*card));
            dropped += before - cards.len();
            !cards.is_empty()
        });
        if self.is_empty() {
            self.deadline = None;
        }
        dropped
    }

    /// Drains everything queued and disarms the timer.
    pub fn take(&mut self) -> PendingBatch {
        self.deadline = None;
        std::mem::take(&mut self.pending)
    }

    pub fn clear(&mut self) {
        self.deadline = None;
        self.pending.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot {
            pending_titles: self.pending.len(),
            pending_elements: self.pending.values().map(Vec::len).sum(),
        }
    }
}
