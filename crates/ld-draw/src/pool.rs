//! Entry Pool
//!
//! Entries are parsed from a spec string (`"001-250"` or `"7, 12, 40"`),
//! or from a file with one entry per line. In numeric mode every entry is
//! zero-padded to the widest entry in the pool.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DrawError, DrawResult};

/// Maximum number of entries in a pool
pub const MAX_ENTRIES: usize = 40_000;

/// Maximum ticket width in numeric mode
pub const MAX_DIGIT_WIDTH: usize = 10;

// ═══════════════════════════════════════════════════════════════════════════════
// ENTRY
// ═══════════════════════════════════════════════════════════════════════════════

/// One ticket or name eligible to win
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Entry(String);

impl Entry {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Width in characters
    pub fn width(&self) -> usize {
        self.0.chars().count()
    }

    fn padded(&self, width: usize) -> Self {
        Self(format!("{:0>width$}", self.0))
    }

    fn is_ticket(&self) -> bool {
        !self.0.is_empty() && self.0.bytes().all(|b| b.is_ascii_digit())
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Entry {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Entry {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Entry {
    fn from(value: String) -> Self {
        Self(value)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// DRAW MODE
// ═══════════════════════════════════════════════════════════════════════════════

/// How entries are interpreted and revealed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawMode {
    /// Zero-padded numeric tickets, revealed digit by digit
    #[default]
    #[serde(alias = "numbers")]
    Numeric,
    /// Free-text names, revealed whole
    #[serde(alias = "names")]
    Name,
}

impl DrawMode {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Numeric => "numeric",
            Self::Name => "name",
        }
    }

    /// Placeholder shown when the pool has no entries
    pub fn placeholder(&self) -> &'static str {
        match self {
            Self::Numeric => "1",
            Self::Name => "Winner",
        }
    }
}

impl FromStr for DrawMode {
    type Err = DrawError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "numeric" | "numbers" | "number" => Ok(Self::Numeric),
            "name" | "names" => Ok(Self::Name),
            other => Err(DrawError::invalid(format!("Unknown draw mode: {other}"))),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SPEC PARSING
// ═══════════════════════════════════════════════════════════════════════════════

/// Parse an entry spec into raw entries (not yet padded or deduplicated)
///
/// In numeric mode a spec containing `-` and no `,` is an inclusive range
/// whose width is the width of the `start` literal. Everything else is a
/// comma-separated list.
pub fn parse_spec(spec: &str, mode: DrawMode) -> DrawResult<Vec<Entry>> {
    let spec = spec.trim();
    if mode == DrawMode::Numeric && spec.contains('-') && !spec.contains(',') {
        parse_range(spec)
    } else {
        Ok(split_items(spec.split(',')))
    }
}

fn parse_range(spec: &str) -> DrawResult<Vec<Entry>> {
    let parts: Vec<&str> = spec.split('-').map(str::trim).collect();
    if parts.len() != 2 {
        return Err(DrawError::invalid(
            "Invalid range format. Please use \"start-end\"",
        ));
    }

    let (start_str, end_str) = (parts[0], parts[1]);
    let (start, end) = match (parse_ticket(start_str), parse_ticket(end_str)) {
        (Some(start), Some(end)) if start < end => (start, end),
        _ => {
            return Err(DrawError::invalid(
                "Invalid range. Start must be less than end",
            ));
        }
    };

    let width = start_str.len();
    if width > MAX_DIGIT_WIDTH {
        return Err(DrawError::invalid(format!(
            "Ticket numbers cannot exceed {MAX_DIGIT_WIDTH} digits"
        )));
    }

    let count = end - start + 1;
    if count > MAX_ENTRIES as u64 {
        return Err(DrawError::invalid(format!(
            "Range is too large: {count} > {MAX_ENTRIES}"
        )));
    }

    Ok((start..=end)
        .map(|n| Entry(format!("{n:0width$}")))
        .collect())
}

fn parse_ticket(token: &str) -> Option<u64> {
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}

fn split_items<'a>(items: impl Iterator<Item = &'a str>) -> Vec<Entry> {
    items
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(Entry::from)
        .collect()
}

fn dedup_preserving_order(entries: Vec<Entry>) -> Vec<Entry> {
    let mut seen = HashSet::with_capacity(entries.len());
    entries
        .into_iter()
        .filter(|e| seen.insert(e.clone()))
        .collect()
}

// ═══════════════════════════════════════════════════════════════════════════════
// ENTRY POOL
// ═══════════════════════════════════════════════════════════════════════════════

/// Canonical entries plus the undrawn subset
///
/// `remaining` is always a subset of `all`, and holds no duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryPool {
    all: Vec<Entry>,
    remaining: Vec<Entry>,
    mode: DrawMode,
    width: usize,
}

impl EntryPool {
    /// Pool with no entries
    pub fn empty(mode: DrawMode) -> Self {
        Self {
            all: Vec::new(),
            remaining: Vec::new(),
            mode,
            width: 1,
        }
    }

    /// Build a pool from a spec string
    pub fn configure(spec: &str, mode: DrawMode) -> DrawResult<Self> {
        Self::from_entries(parse_spec(spec, mode)?, mode)
    }

    /// Build a pool from text with one entry per line
    pub fn from_lines(text: &str, mode: DrawMode) -> DrawResult<Self> {
        Self::from_entries(split_items(text.lines()), mode)
    }

    /// Build a pool from explicit entries
    ///
    /// Duplicates are dropped (first occurrence wins). In numeric mode every
    /// entry must be all digits and is padded to the widest entry.
    pub fn from_entries(entries: Vec<Entry>, mode: DrawMode) -> DrawResult<Self> {
        let entries = dedup_preserving_order(entries);

        if entries.is_empty() {
            return Err(DrawError::invalid("Please provide at least one valid entry"));
        }
        if entries.len() > MAX_ENTRIES {
            return Err(DrawError::invalid(format!(
                "Too many entries: {} > {MAX_ENTRIES}",
                entries.len()
            )));
        }

        let width = entries.iter().map(Entry::width).max().unwrap_or(1);

        let all = match mode {
            DrawMode::Numeric => {
                if let Some(bad) = entries.iter().find(|e| !e.is_ticket()) {
                    return Err(DrawError::invalid(format!("Not a ticket number: {bad}")));
                }
                if width > MAX_DIGIT_WIDTH {
                    return Err(DrawError::invalid(format!(
                        "Ticket numbers cannot exceed {MAX_DIGIT_WIDTH} digits"
                    )));
                }
                // Padding can merge "7" and "07" into one ticket
                let padded = entries.iter().map(|e| e.padded(width)).collect();
                dedup_preserving_order(padded)
            }
            DrawMode::Name => entries,
        };

        Ok(Self {
            remaining: all.clone(),
            all,
            mode,
            width,
        })
    }

    /// Rebuild a pool from persisted parts, validating invariants
    pub fn from_parts(all: Vec<Entry>, remaining: Vec<Entry>, mode: DrawMode) -> DrawResult<Self> {
        let mut pool = if all.is_empty() {
            Self::empty(mode)
        } else {
            let pool = Self::from_entries(all.clone(), mode)?;
            if pool.all != all {
                return Err(DrawError::invalid(
                    "Stored entries are not unique and uniformly padded",
                ));
            }
            pool
        };

        let known: HashSet<&Entry> = pool.all.iter().collect();
        let mut seen = HashSet::with_capacity(remaining.len());
        for entry in &remaining {
            if !known.contains(entry) || !seen.insert(entry) {
                return Err(DrawError::invalid(format!(
                    "Remaining entry {entry} is unknown or duplicated"
                )));
            }
        }

        pool.remaining = remaining;
        Ok(pool)
    }

    pub fn all(&self) -> &[Entry] {
        &self.all
    }

    pub fn remaining(&self) -> &[Entry] {
        &self.remaining
    }

    pub fn mode(&self) -> DrawMode {
        self.mode
    }

    /// Display width (digit count in numeric mode)
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn total_count(&self) -> usize {
        self.all.len()
    }

    pub fn remaining_count(&self) -> usize {
        self.remaining.len()
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining.is_empty()
    }

    pub fn is_remaining(&self, entry: &Entry) -> bool {
        self.remaining.contains(entry)
    }

    /// First entry to show on an idle display
    pub fn first_display(&self) -> String {
        self.remaining
            .first()
            .or_else(|| self.all.first())
            .map(|e| e.to_string())
            .unwrap_or_else(|| self.mode.placeholder().to_string())
    }

    /// Put every entry back into `remaining`
    pub fn reset(&mut self) {
        self.remaining = self.all.clone();
    }

    /// Remove drawn entries from `remaining`
    ///
    /// Fails without changes if any entry is not currently remaining.
    pub fn remove(&mut self, entries: &[Entry]) -> DrawResult<()> {
        let available: HashSet<&Entry> = self.remaining.iter().collect();
        let mut requested = HashSet::with_capacity(entries.len());
        for entry in entries {
            if !available.contains(entry) || !requested.insert(entry) {
                return Err(DrawError::NotAvailable(entry.to_string()));
            }
        }

        self.remaining.retain(|e| !requested.contains(e));
        Ok(())
    }

    /// Return entries to `remaining` and restore canonical order
    pub fn restore(&mut self, entries: &[Entry]) -> DrawResult<()> {
        let known: HashSet<&Entry> = self.all.iter().collect();
        let present: HashSet<&Entry> = self.remaining.iter().collect();
        let mut requested = HashSet::with_capacity(entries.len());
        for entry in entries {
            if !known.contains(entry) || present.contains(entry) || !requested.insert(entry) {
                return Err(DrawError::NotAvailable(entry.to_string()));
            }
        }

        self.remaining.extend(entries.iter().cloned());
        self.remaining.sort();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strs(entries: &[Entry]) -> Vec<&str> {
        entries.iter().map(Entry::as_str).collect()
    }

    #[test]
    fn test_range_pads_to_start_width() {
        let pool = EntryPool::configure("001-120", DrawMode::Numeric).unwrap();
        assert_eq!(pool.total_count(), 120);
        assert_eq!(pool.width(), 3);
        assert_eq!(pool.all()[0].as_str(), "001");
        assert_eq!(pool.all()[119].as_str(), "120");
        assert_eq!(pool.remaining(), pool.all());
    }

    #[test]
    fn test_range_repads_to_widest_entry() {
        let pool = EntryPool::configure("1-100", DrawMode::Numeric).unwrap();
        assert_eq!(pool.width(), 3);
        assert_eq!(pool.all()[0].as_str(), "001");
        assert!(pool.all().iter().all(|e| e.width() == 3));
    }

    #[test]
    fn test_range_rejections() {
        for spec in ["5-3", "4-4", "a-9", "1-2-3", "-", "12345678901-12345678902", "1-40001"] {
            let result = EntryPool::configure(spec, DrawMode::Numeric);
            assert!(
                matches!(result, Err(DrawError::InvalidSpec(_))),
                "spec {spec:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_range_at_cap() {
        let pool = EntryPool::configure("00001-40000", DrawMode::Numeric).unwrap();
        assert_eq!(pool.total_count(), MAX_ENTRIES);
    }

    #[test]
    fn test_numeric_list_dedup_and_pad() {
        let pool = EntryPool::configure(" 7, 12 ,7,, 300", DrawMode::Numeric).unwrap();
        assert_eq!(strs(pool.all()), vec!["007", "012", "300"]);
    }

    #[test]
    fn test_numeric_list_rejects_names() {
        let result = EntryPool::configure("1, two, 3", DrawMode::Numeric);
        assert!(matches!(result, Err(DrawError::InvalidSpec(_))));
    }

    #[test]
    fn test_name_list() {
        let pool = EntryPool::configure("Ana, Bo, Ana, Cy-Ri", DrawMode::Name).unwrap();
        assert_eq!(strs(pool.all()), vec!["Ana", "Bo", "Cy-Ri"]);
    }

    #[test]
    fn test_empty_spec_rejected() {
        assert!(EntryPool::configure(" , ,", DrawMode::Name).is_err());
        assert!(EntryPool::configure("", DrawMode::Numeric).is_err());
    }

    #[test]
    fn test_from_lines() {
        let pool = EntryPool::from_lines("42\n\n 7 \n42\n", DrawMode::Numeric).unwrap();
        assert_eq!(strs(pool.all()), vec!["42", "07"]);
    }

    #[test]
    fn test_remove_and_restore() {
        let mut pool = EntryPool::configure("1-5", DrawMode::Numeric).unwrap();
        let drawn = vec![Entry::from("4"), Entry::from("2")];

        pool.remove(&drawn).unwrap();
        assert_eq!(strs(pool.remaining()), vec!["1", "3", "5"]);

        pool.restore(&drawn).unwrap();
        assert_eq!(pool.remaining(), pool.all());
    }

    #[test]
    fn test_remove_unavailable_is_atomic() {
        let mut pool = EntryPool::configure("1-5", DrawMode::Numeric).unwrap();
        pool.remove(&[Entry::from("3")]).unwrap();

        let before = pool.clone();
        let result = pool.remove(&[Entry::from("1"), Entry::from("3")]);
        assert_eq!(result, Err(DrawError::NotAvailable("3".into())));
        assert_eq!(pool, before);
    }

    #[test]
    fn test_restore_rejects_remaining_entry() {
        let mut pool = EntryPool::configure("1-5", DrawMode::Numeric).unwrap();
        let result = pool.restore(&[Entry::from("2")]);
        assert!(matches!(result, Err(DrawError::NotAvailable(_))));
    }

    #[test]
    fn test_from_parts_validation() {
        let all: Vec<Entry> = ["1", "2", "3"].into_iter().map(Entry::from).collect();
        let ok = EntryPool::from_parts(all.clone(), vec![Entry::from("2")], DrawMode::Numeric);
        assert!(ok.is_ok());

        let unknown = EntryPool::from_parts(all.clone(), vec![Entry::from("9")], DrawMode::Numeric);
        assert!(unknown.is_err());

        let unpadded = vec![Entry::from("1"), Entry::from("10")];
        assert!(EntryPool::from_parts(unpadded, Vec::new(), DrawMode::Numeric).is_err());
    }

    #[test]
    fn test_first_display() {
        assert_eq!(EntryPool::empty(DrawMode::Numeric).first_display(), "1");
        assert_eq!(EntryPool::empty(DrawMode::Name).first_display(), "Winner");
        let pool = EntryPool::configure("01-03", DrawMode::Numeric).unwrap();
        assert_eq!(pool.first_display(), "01");
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!("numbers".parse::<DrawMode>().unwrap(), DrawMode::Numeric);
        assert_eq!("Names".parse::<DrawMode>().unwrap(), DrawMode::Name);
        assert!("bingo".parse::<DrawMode>().is_err());
    }
}
