//! Set-associative cache with MOSI coherence state.
//!
//! Models the Icache and Dcache: 64-byte lines, configurable size/ways/policy.
//! Each line carries a `LineState` (Invalid/Shared/Owned/Modified) rather than
//! a plain valid/dirty pair, since the Dcache participates in the duplicate
//! tag (DTAG) coherence scheme the Cbox maintains against Bcache probes.

/// Way-selection policy implementations (LRU, `set_0_1` round-robin).
pub mod policies;

use self::policies::{LruPolicy, ReplacementPolicy, RoundRobinPolicy};
use crate::common::constants::LINE_SIZE;
use crate::config::{CacheConfig, ReplacementPolicy as PolicyType};

/// Per-line MOSI coherence state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LineState {
    /// Line holds no valid data.
    #[default]
    Invalid,
    /// Line is valid and matches the Bcache/backing store (clean, shared).
    Shared,
    /// Line is valid, clean, and this cache is the exclusive owner.
    Owned,
    /// Line is valid and has been written (dirty, exclusive).
    Modified,
}

impl LineState {
    /// Whether the line currently holds valid data.
    pub fn is_valid(self) -> bool {
        self != LineState::Invalid
    }

    /// Whether the line must be written back before eviction.
    pub fn is_dirty(self) -> bool {
        self == LineState::Modified
    }
}

/// Cache line entry: tag plus coherence state.
#[derive(Clone, Default)]
struct CacheLine {
    tag: u64,
    state: LineState,
}

/// Set-associative cache simulator with MOSI line state.
pub struct CacheSim {
    lines: Vec<CacheLine>,
    num_sets: usize,
    ways: usize,
    policy: Box<dyn ReplacementPolicy + Send + Sync>,
}

/// Outcome of a cache access: whether it hit, and an evicted dirty line's
/// base address if a write-back is now required.
#[derive(Clone, Copy, Debug)]
pub struct AccessOutcome {
    /// Whether the access hit a valid line.
    pub hit: bool,
    /// Base address of a dirty line evicted to make room, if any.
    pub writeback: Option<u64>,
}

impl CacheSim {
    /// Creates a new cache simulator from the given geometry.
    pub fn new(config: &CacheConfig) -> Self {
        let ways = config.ways.max(1);
        let num_lines = (config.size_bytes / LINE_SIZE as usize).max(ways);
        let num_sets = (num_lines / ways).max(1);

        let policy: Box<dyn ReplacementPolicy + Send + Sync> = match config.policy {
            PolicyType::Lru => Box::new(LruPolicy::new(num_sets, ways)),
            PolicyType::RoundRobin => Box::new(RoundRobinPolicy::new(num_sets, ways)),
        };

        Self {
            lines: vec![CacheLine::default(); num_sets * ways],
            num_sets,
            ways,
            policy,
        }
    }

    fn set_index(&self, addr: u64) -> usize {
        ((addr / LINE_SIZE) as usize) % self.num_sets
    }

    fn tag(&self, addr: u64) -> u64 {
        addr / (LINE_SIZE * self.num_sets as u64)
    }

    /// Returns the coherence state of the line containing `addr`, if present.
    pub fn line_state(&self, addr: u64) -> LineState {
        let set = self.set_index(addr);
        let tag = self.tag(addr);
        let base = set * self.ways;
        for i in 0..self.ways {
            let line = &self.lines[base + i];
            if line.state.is_valid() && line.tag == tag {
                return line.state;
            }
        }
        LineState::Invalid
    }

    /// Looks up `addr`, updating replacement state on hit. Returns whether the
    /// access hit, and on a write hit upgrades the line to `Modified`.
    pub fn access(&mut self, addr: u64, is_write: bool) -> bool {
        let set = self.set_index(addr);
        let tag = self.tag(addr);
        let base = set * self.ways;

        for i in 0..self.ways {
            let idx = base + i;
            if self.lines[idx].state.is_valid() && self.lines[idx].tag == tag {
                self.policy.touch(set, i);
                if is_write {
                    self.lines[idx].state = LineState::Modified;
                }
                return true;
            }
        }
        false
    }

    /// Installs a line fetched from the Bcache/Cbox at `addr` in the given
    /// initial state, evicting a victim per the replacement policy. Returns
    /// the base address of a dirty victim that must be written back.
    pub fn install(&mut self, addr: u64, state: LineState) -> AccessOutcome {
        let set = self.set_index(addr);
        let tag = self.tag(addr);
        let base = set * self.ways;

        let victim_way = self.policy.victim_way(set);
        let victim_idx = base + victim_way;
        let victim = &self.lines[victim_idx];
        let writeback = if victim.state.is_dirty() {
            Some((victim.tag * self.num_sets as u64 + set as u64) * LINE_SIZE)
        } else {
            None
        };

        self.lines[victim_idx] = CacheLine { tag, state };
        self.policy.touch(set, victim_way);

        AccessOutcome {
            hit: false,
            writeback,
        }
    }

    /// Transitions a resident line to `state` in place, as a coherence
    /// probe's next-state command requires. Returns `false` when the line is
    /// not resident (the probe then has nothing to change here).
    pub fn set_line_state(&mut self, addr: u64, state: LineState) -> bool {
        let set = self.set_index(addr);
        let tag = self.tag(addr);
        let base = set * self.ways;
        for i in 0..self.ways {
            let idx = base + i;
            if self.lines[idx].state.is_valid() && self.lines[idx].tag == tag {
                self.lines[idx].state = state;
                return true;
            }
        }
        false
    }

    /// Invalidates the line containing `addr`, as a Bcache probe requires
    /// when another requester takes exclusive ownership.
    pub fn invalidate(&mut self, addr: u64) -> Option<u64> {
        let set = self.set_index(addr);
        let tag = self.tag(addr);
        let base = set * self.ways;
        for i in 0..self.ways {
            let idx = base + i;
            if self.lines[idx].state.is_valid() && self.lines[idx].tag == tag {
                let was_dirty = self.lines[idx].state.is_dirty();
                self.lines[idx].state = LineState::Invalid;
                return if was_dirty { Some(addr) } else { None };
            }
        }
        None
    }

    /// Invalidates every line (used for `HW_MTPR IMB`-equivalent flushes).
    pub fn flush(&mut self) {
        for line in &mut self.lines {
            line.state = LineState::Invalid;
        }
    }
}
