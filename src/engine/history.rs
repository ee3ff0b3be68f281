//! Applied-effect history
//!
//! Ordered diagnostic log of every uniquely applied effect, pruned to a
//! retention window and a hard entry cap. Not durable state; exists so a
//! user can see what the engine just did and why.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub at: Instant,
    pub description: String,
}

#[derive(Debug)]
pub struct History {
    entries: VecDeque<HistoryEntry>,
    retention: Duration,
    max_entries: usize,
}

impl History {
    pub fn new(retention: Duration, max_entries: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            retention,
            max_entries,
        }
    }

    /// Append an entry and prune anything outside the retention window
    pub fn record(&mut self, now: Instant, description: String) {
        self.entries.push_back(HistoryEntry {
            at: now,
            description,
        });
        self.prune(now);
    }

    pub fn prune(&mut self, now: Instant) {
        while let Some(front) = self.entries.front() {
            if now.saturating_duration_since(front.at) > self.retention {
                self.entries.pop_front();
            } else {
                break;
            }
        }
        while self.entries.len() > self.max_entries {
            self.entries.pop_front();
        }
    }

    /// Entries in insertion (and therefore timestamp) order
    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
