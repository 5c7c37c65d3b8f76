//! Load Queue (LQ) and Store Queue (SQ), 32 entries each.
//!
//! Stores don't reach the Dcache until they retire from the active list; the
//! store queue holds them until then and gives younger loads a way to
//! forward from an older, not-yet-retired store instead of stalling on it.
//! The load queue tracks resolved load addresses so that an older store
//! resolving late can catch a younger load that completed too early and
//! force it to replay.

use crate::core::pipeline::active_list::ActiveListTag;

/// Result of checking a load against the store queue for forwarding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ForwardResult {
    /// An older store fully covers the load's bytes — use its data.
    Hit(u64),
    /// No overlapping store — safe to read from the Dcache.
    Miss,
    /// Partial overlap with an older store — must wait for it to drain.
    Stall,
}

/// Lifecycle state of a store queue entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum StoreState {
    /// Allocated but address/data not yet resolved.
    #[default]
    Pending,
    /// Address and data resolved; waiting for line ownership from the Cbox.
    Ready,
    /// Ownership acquired (Dcache hit-exclusive or Cbox change-to-dirty
    /// acknowledged); the instruction may now retire.
    Complete,
    /// Retired; eligible to drain into the Dcache.
    Retired,
}

#[derive(Clone, Debug, Default)]
struct StoreEntry {
    tag: ActiveListTag,
    addr: u64,
    data: u64,
    len: u8,
    state: StoreState,
    valid: bool,
}

/// FIFO store queue: allocated in program order at dispatch, drained in
/// program order once entries retire.
pub struct StoreQueue {
    entries: Vec<StoreEntry>,
    head: usize,
    tail: usize,
    count: usize,
}

impl StoreQueue {
    /// Creates a store queue with the given capacity (32 in the 21264).
    pub fn new(capacity: usize) -> Self {
        let mut entries = Vec::with_capacity(capacity);
        entries.resize_with(capacity, StoreEntry::default);
        Self {
            entries,
            head: 0,
            tail: 0,
            count: 0,
        }
    }

    /// Returns the number of occupied entries.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Returns true if the queue holds no entries.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Returns true if the queue is full.
    pub fn is_full(&self) -> bool {
        self.count == self.entries.len()
    }

    /// Reserves a slot for a store at dispatch, before its address/data are
    /// known. Returns `false` if the queue is full.
    pub fn allocate(&mut self, tag: ActiveListTag) -> bool {
        if self.is_full() {
            return false;
        }
        self.entries[self.tail] = StoreEntry {
            tag,
            addr: 0,
            data: 0,
            len: 0,
            state: StoreState::Pending,
            valid: true,
        };
        self.tail = (self.tail + 1) % self.entries.len();
        self.count += 1;
        true
    }

    /// Resolves a previously allocated store's address and data, once the
    /// Mbox computes them.
    pub fn resolve(&mut self, tag: ActiveListTag, addr: u64, data: u64, len: u8) {
        if let Some(e) = self.find_mut(tag) {
            e.addr = addr;
            e.data = data;
            e.len = len;
            e.state = StoreState::Ready;
        }
    }

    /// Marks a store complete: the Dcache/Cbox granted write ownership of
    /// its line, so the instruction may retire.
    pub fn mark_complete(&mut self, tag: ActiveListTag) {
        if let Some(e) = self.find_mut(tag) {
            if e.state == StoreState::Ready {
                e.state = StoreState::Complete;
            }
        }
    }

    /// Returns whether a store has reached the `Complete` state.
    pub fn is_complete(&self, tag: ActiveListTag) -> bool {
        self.entries
            .iter()
            .any(|e| e.valid && e.tag == tag && e.state == StoreState::Complete)
    }

    /// Returns the resolved address and length of a store, if known.
    pub fn resolved_address(&self, tag: ActiveListTag) -> Option<(u64, u8)> {
        self.entries
            .iter()
            .find(|e| e.valid && e.tag == tag && e.state != StoreState::Pending)
            .map(|e| (e.addr, e.len))
    }

    /// Marks a store retired — the active list has committed it, so it may
    /// now drain to the Dcache.
    pub fn retire(&mut self, tag: ActiveListTag) {
        if let Some(e) = self.find_mut(tag) {
            e.state = StoreState::Retired;
        }
    }

    /// Peeks the oldest retired store without removing it.
    pub fn peek_drain(&self) -> Option<(ActiveListTag, u64, u64, u8)> {
        if self.count == 0
            || !self.entries[self.head].valid
            || self.entries[self.head].state != StoreState::Retired
        {
            return None;
        }
        let e = &self.entries[self.head];
        Some((e.tag, e.addr, e.data, e.len))
    }

    /// Drains the oldest retired store, if the head entry is retired.
    pub fn drain(&mut self) -> Option<(ActiveListTag, u64, u64, u8)> {
        let result = self.peek_drain()?;
        self.entries[self.head].valid = false;
        self.head = (self.head + 1) % self.entries.len();
        self.count -= 1;
        Some(result)
    }

    /// Removes a store that must not reach memory (a failed
    /// store-conditional); its slot is reclaimed without draining.
    pub fn cancel(&mut self, tag: ActiveListTag) {
        if let Some(e) = self.find_mut(tag) {
            e.valid = false;
            // Invalid entries between head and tail are skipped as the head
            // advances; only recompute the live count here.
        }
        self.count = self.entries.iter().filter(|e| e.valid).count();
        while self.count > 0 && !self.entries[self.head].valid && self.head != self.tail {
            self.head = (self.head + 1) % self.entries.len();
        }
        if self.count == 0 {
            self.head = self.tail;
        }
    }

    /// Squashes every store that has not yet retired (fault recovery);
    /// retired-but-undrained stores are architectural state and survive.
    pub fn flush_speculative(&mut self) {
        while self.count > 0 {
            let last = if self.tail == 0 {
                self.entries.len() - 1
            } else {
                self.tail - 1
            };
            if !self.entries[last].valid || self.entries[last].state == StoreState::Retired {
                break;
            }
            self.entries[last].valid = false;
            self.tail = last;
            self.count -= 1;
        }
    }

    /// Checks a load at `addr` for `len` bytes against every store older
    /// than `younger_than` (the load's own tag), newest-first.
    pub fn forward(&self, addr: u64, len: u8, younger_than: ActiveListTag) -> ForwardResult {
        let mut idx = if self.tail == 0 {
            self.entries.len() - 1
        } else {
            self.tail - 1
        };
        for _ in 0..self.count {
            let e = &self.entries[idx];
            if e.valid && e.tag.0 < younger_than.0 && e.state != StoreState::Pending {
                let overlap = addr < e.addr + e.len as u64 && e.addr < addr + len as u64;
                if overlap {
                    return if addr == e.addr && len == e.len {
                        ForwardResult::Hit(e.data)
                    } else {
                        ForwardResult::Stall
                    };
                }
            } else if e.valid && e.tag.0 < younger_than.0 && e.state == StoreState::Pending {
                // An older store with an unresolved address could alias;
                // conservatively stall rather than risk reading stale data.
                return ForwardResult::Stall;
            }
            idx = if idx == 0 { self.entries.len() - 1 } else { idx - 1 };
        }
        ForwardResult::Miss
    }

    /// Squashes every entry allocated after `tag` (exclusive), preserving
    /// older — including already-retired but not-yet-drained — stores.
    pub fn flush_younger(&mut self, tag: ActiveListTag) {
        while self.count > 0 {
            let last = if self.tail == 0 {
                self.entries.len() - 1
            } else {
                self.tail - 1
            };
            if !self.entries[last].valid || self.entries[last].tag.0 <= tag.0 {
                break;
            }
            self.entries[last].valid = false;
            self.tail = last;
            self.count -= 1;
        }
    }

    /// Squashes every entry — full pipeline reset.
    pub fn flush(&mut self) {
        for e in &mut self.entries {
            e.valid = false;
        }
        self.head = 0;
        self.tail = 0;
        self.count = 0;
    }

    fn find_mut(&mut self, tag: ActiveListTag) -> Option<&mut StoreEntry> {
        self.entries.iter_mut().find(|e| e.valid && e.tag == tag)
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct LoadEntry {
    tag: ActiveListTag,
    addr: u64,
    len: u8,
    completed: bool,
    valid: bool,
}

/// Load queue: tracks in-flight loads for ordering and replay. Load data
/// flows straight back to the issue queues' result bus once a load
/// completes; this queue records the resolved address so a late-resolving
/// older store can detect a younger load that read stale data.
pub struct LoadQueue {
    entries: Vec<LoadEntry>,
}

impl LoadQueue {
    /// Creates a load queue with the given capacity (32 in the 21264).
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: vec![LoadEntry::default(); capacity],
        }
    }

    /// Returns the number of occupied entries.
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| e.valid).count()
    }

    /// Returns true if the queue is full.
    pub fn is_full(&self) -> bool {
        self.entries.iter().all(|e| e.valid)
    }

    /// Allocates a slot for an in-flight load. Returns `false` if full.
    pub fn allocate(&mut self, tag: ActiveListTag) -> bool {
        let Some(slot) = self.entries.iter_mut().find(|e| !e.valid) else {
            return false;
        };
        *slot = LoadEntry {
            tag,
            addr: 0,
            len: 0,
            completed: false,
            valid: true,
        };
        true
    }

    /// Records a load's resolved virtual address once the Mbox computes it.
    pub fn set_address(&mut self, tag: ActiveListTag, addr: u64, len: u8) {
        if let Some(e) = self.find_mut(tag) {
            e.addr = addr;
            e.len = len;
        }
    }

    /// Marks a load's data as delivered.
    pub fn mark_complete(&mut self, tag: ActiveListTag) {
        if let Some(e) = self.find_mut(tag) {
            e.completed = true;
        }
    }

    /// Finds the oldest load younger than `store_tag` that already completed
    /// against an address range the store now claims — the speculative
    /// load-ordering violation that forces a replay.
    pub fn replay_candidate(
        &self,
        addr: u64,
        len: u8,
        store_tag: ActiveListTag,
    ) -> Option<ActiveListTag> {
        self.entries
            .iter()
            .filter(|e| {
                e.valid
                    && e.completed
                    && e.tag.0 > store_tag.0
                    && addr < e.addr + e.len as u64
                    && e.addr < addr + len as u64
            })
            .map(|e| e.tag)
            .min_by_key(|t| t.0)
    }

    /// Releases a load's slot once it retires.
    pub fn release(&mut self, tag: ActiveListTag) {
        if let Some(e) = self.find_mut(tag) {
            e.valid = false;
        }
    }

    /// Squashes every entry allocated after `tag` (exclusive).
    pub fn flush_younger(&mut self, tag: ActiveListTag) {
        for e in &mut self.entries {
            if e.valid && e.tag.0 > tag.0 {
                e.valid = false;
            }
        }
    }

    /// Squashes every entry.
    pub fn flush(&mut self) {
        for e in &mut self.entries {
            e.valid = false;
        }
    }

    fn find_mut(&mut self, tag: ActiveListTag) -> Option<&mut LoadEntry> {
        self.entries.iter_mut().find(|e| e.valid && e.tag == tag)
    }
}
