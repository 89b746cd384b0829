use std::collections::{HashSet, VecDeque};

use crate::domain::{HiddenReason, HiddenRecord, HiddenVideosSnapshot};

/// Bounded log of hidden videos, one record per title, oldest evicted first.
#[derive(Debug)]
pub struct HiddenLedger {
    records: VecDeque<HiddenRecord>,
    titles: HashSet<String>,
    capacity: usize,
}

impl HiddenLedger {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(capacity),
            titles: HashSet::new(),
            capacity: capacity.max(1),
        }
    }

    /// Appends a record unless one with the same title is already held.
    /// Returns whether a record was added.
    pub fn record(
        &mut self,
        title: &str,
        reason: HiddenReason,
        url: Option<String>,
        timestamp: i64,
    ) -> bool {
        if self.titles.contains(title) {
            return false;
        }
        self.titles.insert(title.to_string());
        self.records.push_back(HiddenRecord {
            title: title.to_string(),
            reason,
            timestamp,
            url,
        });
        while self.records.len() > self.capacity {
            if let Some(evicted) = self.records.pop_front() {
                self.titles.remove(&evicted.title);
            }
        }
        true
    }

    pub fn snapshot(&self) -> HiddenVideosSnapshot {
        let count = |reason: HiddenReason| {
            self.records.iter().filter(|r| r.reason == reason).count()
        };
        HiddenVideosSnapshot {
            hidden_videos: self.records.iter().rev().cloned().collect(),
            total_count: self.records.len(),
            keyword_count: count(HiddenReason::Keyword),
            ai_count: count(HiddenReason::Ai),
        }
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.titles.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deduplicates_by_title() {
        let mut ledger = HiddenLedger::new(50);
        assert!(ledger.record("Same Title", HiddenReason::Keyword, None, 1));
        assert!(!ledger.record("Same Title", HiddenReason::Ai, None, 2));
        let snap = ledger.snapshot();
        assert_eq!(snap.total_count, 1);
        assert_eq!(snap.hidden_videos[0].reason, HiddenReason::Keyword);
    }

    #[test]
    fn evicts_oldest_beyond_capacity_and_lists_newest_first() {
        let mut ledger = HiddenLedger::new(50);
        for i in 0..60 {
            let reason = if i % 2 == 0 {
                HiddenReason::Keyword
            } else {
                HiddenReason::Ai
            };
            ledger.record(&format!("video {i}"), reason, None, i);
        }
        let snap = ledger.snapshot();
        assert_eq!(snap.total_count, 50);
        assert_eq!(snap.hidden_videos.first().unwrap().title, "video 59");
        assert_eq!(snap.hidden_videos.last().unwrap().title, "video 10");
        assert_eq!(snap.keyword_count + snap.ai_count, 50);

        // evicted titles may be recorded again
        assert!(ledger.record("video 0", HiddenReason::Keyword, None, 100));
        assert_eq!(ledger.len(), 50);
    }

    #[test]
    fn clear_empties_everything() {
        let mut ledger = HiddenLedger::new(3);
        let url = Some("https://www.youtube.com/watch?v=a".to_string());
        ledger.record("a", HiddenReason::Ai, url, 1);
        ledger.clear();
        assert!(ledger.is_empty());
        assert!(ledger.record("a", HiddenReason::Ai, None, 2));
    }
}
