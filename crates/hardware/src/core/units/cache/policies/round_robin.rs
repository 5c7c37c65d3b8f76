//! `set_0_1` rotating way selection.
//!
//! The 21264 keeps one selector bit per Icache/Dcache set that alternates
//! which of the two ways the next fill lands in, regardless of access
//! pattern. Modeled as a per-set counter so configurations wider than two
//! ways rotate through all of them.

use super::ReplacementPolicy;

/// Per-set fill rotation state.
pub struct RoundRobinPolicy {
    selector: Vec<u8>,
    ways: usize,
}

impl RoundRobinPolicy {
    /// Creates rotation state for a cache of `sets` sets of `ways` ways.
    pub fn new(sets: usize, ways: usize) -> Self {
        Self {
            selector: vec![0; sets],
            ways: ways.max(1),
        }
    }
}

impl ReplacementPolicy for RoundRobinPolicy {
    /// Accesses don't steer the rotation; only fills advance it.
    fn touch(&mut self, _set: usize, _way: usize) {}

    fn victim_way(&mut self, set: usize) -> usize {
        let way = usize::from(self.selector[set]) % self.ways;
        self.selector[set] = ((way + 1) % self.ways) as u8;
        way
    }
}
