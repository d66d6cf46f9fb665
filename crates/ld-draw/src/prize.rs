//! Prize tiers in draw order
//!
//! Index 0 is drawn first. The current tier is implied by the history
//! length, so the list itself carries no cursor.

use serde::{Deserialize, Serialize};

use crate::error::{DrawError, DrawResult};

/// Shown as the current prize once every tier has been awarded
pub const ALL_PRIZES_DRAWN: &str = "All prizes drawn!";

/// Unique prize identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PrizeId(pub u64);

/// One prize tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prize {
    pub id: PrizeId,
    pub name: String,
}

/// Ordered prize tiers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrizeList {
    prizes: Vec<Prize>,
    next_id: u64,
}

impl Default for PrizeList {
    fn default() -> Self {
        Self::standard()
    }
}

impl PrizeList {
    /// Third, second, then first prize
    pub fn standard() -> Self {
        Self::from_names(["3rd Prize", "2nd Prize", "1st Prize"]).unwrap_or_else(|_| Self::empty())
    }

    fn empty() -> Self {
        Self {
            prizes: Vec::new(),
            next_id: 1,
        }
    }

    /// Build from prize names in draw order
    pub fn from_names<I, S>(names: I) -> DrawResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list = Self::empty();
        for name in names {
            list.add(name.as_ref())?;
        }
        if list.is_empty() {
            return Err(DrawError::invalid("At least one prize is required"));
        }
        Ok(list)
    }

    /// Rebuild from persisted prizes, validating ids and names
    pub fn from_prizes(prizes: Vec<Prize>) -> DrawResult<Self> {
        let mut ids: Vec<PrizeId> = prizes.iter().map(|p| p.id).collect();
        ids.sort();
        ids.dedup();
        if ids.len() != prizes.len() {
            return Err(DrawError::invalid("Duplicate prize ids"));
        }
        if let Some(blank) = prizes.iter().find(|p| p.name.trim().is_empty()) {
            return Err(DrawError::invalid(format!("Prize {} has no name", blank.id.0)));
        }

        let next_id = ids.last().map(|id| id.0 + 1).unwrap_or(1);
        Ok(Self { prizes, next_id })
    }

    /// Append a tier and return its id
    pub fn add(&mut self, name: &str) -> DrawResult<PrizeId> {
        let name = validate_name(name)?;
        let id = PrizeId(self.next_id);
        self.next_id += 1;
        self.prizes.push(Prize { id, name });
        Ok(id)
    }

    /// Remove a tier that is not among the first `awarded` tiers
    pub fn remove(&mut self, id: PrizeId, awarded: usize) -> DrawResult<Prize> {
        let index = self.index_of(id)?;
        if index < awarded {
            return Err(DrawError::invalid("Cannot remove a prize that has been awarded"));
        }
        if self.prizes.len() == 1 {
            return Err(DrawError::invalid("Cannot remove the last prize"));
        }
        Ok(self.prizes.remove(index))
    }

    pub fn rename(&mut self, id: PrizeId, name: &str) -> DrawResult<()> {
        let name = validate_name(name)?;
        let index = self.index_of(id)?;
        self.prizes[index].name = name;
        Ok(())
    }

    fn index_of(&self, id: PrizeId) -> DrawResult<usize> {
        self.prizes
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| DrawError::invalid(format!("Unknown prize id {}", id.0)))
    }

    pub fn get(&self, index: usize) -> Option<&Prize> {
        self.prizes.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Prize> {
        self.prizes.iter()
    }

    pub fn as_slice(&self) -> &[Prize] {
        &self.prizes
    }

    pub fn len(&self) -> usize {
        self.prizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prizes.is_empty()
    }

    /// Name of the tier drawn after `awarded` completed batches
    pub fn current_name(&self, awarded: usize) -> &str {
        self.prizes
            .get(awarded)
            .map(|p| p.name.as_str())
            .unwrap_or(ALL_PRIZES_DRAWN)
    }

    /// Whether the tier after `awarded` batches is the last one
    pub fn is_final(&self, awarded: usize) -> bool {
        awarded + 1 == self.prizes.len()
    }

    pub fn is_complete(&self, awarded: usize) -> bool {
        awarded >= self.prizes.len()
    }
}

fn validate_name(name: &str) -> DrawResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DrawError::invalid("Prize name cannot be empty"));
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_order() {
        let prizes = PrizeList::standard();
        assert_eq!(prizes.len(), 3);
        assert_eq!(prizes.current_name(0), "3rd Prize");
        assert_eq!(prizes.current_name(2), "1st Prize");
        assert_eq!(prizes.current_name(3), ALL_PRIZES_DRAWN);
        assert!(prizes.is_final(2));
        assert!(!prizes.is_final(1));
        assert!(prizes.is_complete(3));
    }

    #[test]
    fn test_ids_are_unique_after_removal() {
        let mut prizes = PrizeList::from_names(["A", "B"]).unwrap();
        let b = prizes.iter().nth(1).unwrap().id;
        prizes.remove(b, 0).unwrap();
        let c = prizes.add("C").unwrap();
        assert_ne!(b, c);
        assert_eq!(prizes.current_name(1), "C");
    }

    #[test]
    fn test_remove_respects_awarded_tiers() {
        let mut prizes = PrizeList::from_names(["A", "B", "C"]).unwrap();
        let c = prizes.iter().nth(2).unwrap().id;
        assert!(prizes.remove(c, 3).is_err());
        assert!(prizes.remove(c, 2).is_ok());

        let a = prizes.iter().next().unwrap().id;
        prizes.remove(a, 0).unwrap();
        let last = prizes.iter().next().unwrap().id;
        assert!(prizes.remove(last, 0).is_err());
    }

    #[test]
    fn test_blank_names_rejected() {
        assert!(PrizeList::from_names(["A", "  "]).is_err());
        assert!(PrizeList::from_names(Vec::<String>::new()).is_err());

        let mut prizes = PrizeList::standard();
        let id = prizes.iter().next().unwrap().id;
        assert!(prizes.rename(id, "").is_err());
        prizes.rename(id, " Grand ").unwrap();
        assert_eq!(prizes.current_name(0), "Grand");
    }

    #[test]
    fn test_from_prizes_rejects_duplicate_ids() {
        let prizes = vec![
            Prize { id: PrizeId(1), name: "A".into() },
            Prize { id: PrizeId(1), name: "B".into() },
        ];
        assert!(PrizeList::from_prizes(prizes).is_err());
    }
}
