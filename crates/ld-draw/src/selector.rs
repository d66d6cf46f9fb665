//! Uniform sampling without replacement

use rand::Rng;

use crate::pool::Entry;

/// Pick `min(count, remaining.len())` distinct entries uniformly at random
///
/// Each step draws one index uniformly from a working index set and
/// swap-removes it, so every still-unpicked entry is equally likely at every
/// step. The input is not modified.
pub fn select_winners<R: Rng + ?Sized>(remaining: &[Entry], count: usize, rng: &mut R) -> Vec<Entry> {
    let count = count.min(remaining.len());
    let mut indices: Vec<usize> = (0..remaining.len()).collect();
    let mut picked = Vec::with_capacity(count);

    for _ in 0..count {
        let slot = rng.random_range(0..indices.len());
        let index = indices.swap_remove(slot);
        picked.push(remaining[index].clone());
    }

    picked
}
