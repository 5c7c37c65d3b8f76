//! Least-recently-used way selection.
//!
//! Each line carries an age counter. A touch zeroes the accessed way's age
//! and ages its set-mates; the victim is the oldest way. For the two-way
//! Icache/Dcache this collapses to a single "other way was used last" bit,
//! but the counter form also serves wider experimental configurations.

use super::ReplacementPolicy;

/// Per-line age counters, one row of ways per set.
pub struct LruPolicy {
    ages: Vec<u8>,
    ways: usize,
}

impl LruPolicy {
    /// Creates LRU state for a cache of `sets` x `ways` lines. Every age
    /// starts saturated, so initial fills sweep the ways in order.
    pub fn new(sets: usize, ways: usize) -> Self {
        Self {
            ages: vec![u8::MAX; sets * ways],
            ways,
        }
    }

    fn row(&mut self, set: usize) -> &mut [u8] {
        let base = set * self.ways;
        &mut self.ages[base..base + self.ways]
    }
}

impl ReplacementPolicy for LruPolicy {
    fn touch(&mut self, set: usize, way: usize) {
        for (i, age) in self.row(set).iter_mut().enumerate() {
            if i == way {
                *age = 0;
            } else {
                *age = age.saturating_add(1);
            }
        }
    }

    fn victim_way(&mut self, set: usize) -> usize {
        self.row(set)
            .iter()
            .enumerate()
            .max_by_key(|&(_, age)| *age)
            .map_or(0, |(way, _)| way)
    }
}
