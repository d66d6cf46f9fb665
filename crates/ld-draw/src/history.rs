//! History ledger of committed draw batches
//!
//! Append-only during normal operation; `pop_last` exists solely for undo.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{DrawError, DrawResult};
use crate::pool::Entry;

/// Winners of one draw operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawBatch {
    pub prize_name: String,
    pub entries: Vec<Entry>,
}

impl DrawBatch {
    pub fn new(prize_name: impl Into<String>, entries: Vec<Entry>) -> Self {
        Self {
            prize_name: prize_name.into(),
            entries,
        }
    }
}

/// Ordered record of committed batches
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DrawHistory {
    batches: Vec<DrawBatch>,
}

impl DrawHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted batches, checking that no entry was drawn twice
    pub fn from_batches(batches: Vec<DrawBatch>) -> DrawResult<Self> {
        let mut seen = HashSet::new();
        for entry in batches.iter().flat_map(|b| b.entries.iter()) {
            if !seen.insert(entry) {
                return Err(DrawError::invalid(format!("Entry {entry} drawn twice")));
            }
        }
        if let Some(empty) = batches.iter().find(|b| b.entries.is_empty()) {
            return Err(DrawError::invalid(format!(
                "Batch for {} has no winners",
                empty.prize_name
            )));
        }
        Ok(Self { batches })
    }

    /// Append a batch; `prize_count` bounds the history length
    pub fn append(&mut self, batch: DrawBatch, prize_count: usize) -> DrawResult<()> {
        if self.batches.len() >= prize_count {
            return Err(DrawError::PrizesComplete);
        }
        self.batches.push(batch);
        Ok(())
    }

    pub fn pop_last(&mut self) -> DrawResult<DrawBatch> {
        self.batches.pop().ok_or(DrawError::Empty)
    }

    pub fn last(&self) -> Option<&DrawBatch> {
        self.batches.last()
    }

    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    pub fn clear(&mut self) {
        self.batches.clear();
    }

    pub fn batches(&self) -> &[DrawBatch] {
        &self.batches
    }

    /// Every drawn entry, in draw order
    pub fn drawn_entries(&self) -> impl Iterator<Item = &Entry> {
        self.batches.iter().flat_map(|b| b.entries.iter())
    }

    pub fn drawn_count(&self) -> usize {
        self.batches.iter().map(|b| b.entries.len()).sum()
    }

    /// Winners grouped by prize name, in award order
    ///
    /// Batches that share a prize name are merged.
    pub fn winners_by_prize(&self) -> Vec<(&str, Vec<&Entry>)> {
        let mut groups: Vec<(&str, Vec<&Entry>)> = Vec::new();
        for batch in &self.batches {
            let name = batch.prize_name.as_str();
            match groups.iter().position(|(n, _)| *n == name) {
                Some(i) => groups[i].1.extend(batch.entries.iter()),
                None => groups.push((name, batch.entries.iter().collect())),
            }
        }
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(prize: &str, entries: &[&str]) -> DrawBatch {
        DrawBatch::new(prize, entries.iter().map(|e| Entry::from(*e)).collect())
    }

    #[test]
    fn test_append_and_pop() {
        let mut history = DrawHistory::new();
        history.append(batch("3rd", &["04"]), 2).unwrap();
        history.append(batch("2nd", &["17", "22"]), 2).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history.drawn_count(), 3);

        let last = history.pop_last().unwrap();
        assert_eq!(last.prize_name, "2nd");
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_append_bounded_by_prizes() {
        let mut history = DrawHistory::new();
        history.append(batch("only", &["1"]), 1).unwrap();
        assert_eq!(
            history.append(batch("extra", &["2"]), 1),
            Err(DrawError::PrizesComplete)
        );
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_pop_empty() {
        let mut history = DrawHistory::new();
        assert_eq!(history.pop_last(), Err(DrawError::Empty));
    }

    #[test]
    fn test_from_batches_rejects_repeats() {
        let result = DrawHistory::from_batches(vec![batch("a", &["1"]), batch("b", &["1"])]);
        assert!(matches!(result, Err(DrawError::InvalidSpec(_))));
        assert!(DrawHistory::from_batches(vec![batch("a", &[])]).is_err());
    }

    #[test]
    fn test_winners_by_prize() {
        let history = DrawHistory::from_batches(vec![
            batch("Raffle", &["1"]),
            batch("Grand", &["2"]),
            batch("Raffle", &["3"]),
        ])
        .unwrap();
        let groups = history.winners_by_prize();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, "Raffle");
        assert_eq!(groups[0].1.len(), 2);
        assert_eq!(groups[1].0, "Grand");
    }
}
