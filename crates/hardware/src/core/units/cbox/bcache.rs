//! Bcache: the board-level, direct-mapped second-level cache.
//!
//! 1 to 16 MB of 64-byte blocks with a data array (unlike the on-chip
//! Icache/Dcache models, which track state only, the Bcache carries real
//! block contents: victim write-backs and probe responses transport its
//! data). The index is `(PA >> 6)` masked to the block count; the tag is
//! `PA >> 20` masked to 44 bits, with the full PA retained alongside so an
//! eviction knows the victim's address without reconstructing it.

use crate::common::LINE_SIZE;

/// `status` bit: the lookup hit a valid, tag-matching block.
pub const STATUS_HIT: u32 = 1 << 0;
/// `status` bit: the hit block is dirty.
pub const STATUS_DIRTY: u32 = 1 << 1;
/// `status` bit: the hit block is shared.
pub const STATUS_SHARED: u32 = 1 << 2;
/// A missing block: no status bits set.
pub const STATUS_MISS: u32 = 0;

/// One Bcache tag entry.
#[derive(Clone, Copy, Debug, Default)]
pub struct BcacheTag {
    /// Block holds valid data.
    pub valid: bool,
    /// Block differs from memory and must be written back on eviction.
    pub dirty: bool,
    /// Another cache in the system may hold this block.
    pub shared: bool,
    /// Tag bits (`PA >> 20`, 44 bits).
    pub tag: u64,
    /// Full physical address of the resident block.
    pub pa: u64,
}

/// A victim produced by a write or eviction: the displaced dirty block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BcacheVictim {
    /// Physical address of the displaced block.
    pub pa: u64,
    /// The displaced block's contents.
    pub data: [u8; 64],
}

/// Direct-mapped Bcache with a data array.
pub struct Bcache {
    tags: Vec<BcacheTag>,
    data: Vec<[u8; 64]>,
    index_mask: u64,
}

const TAG_SHIFT: u64 = 20;
const TAG_MASK: u64 = (1 << 44) - 1;

impl Bcache {
    /// Creates a Bcache of `size_bytes` capacity (rounded down to a whole
    /// number of 64-byte blocks; at least one block).
    pub fn new(size_bytes: usize) -> Self {
        let blocks = (size_bytes / LINE_SIZE as usize).max(1).next_power_of_two();
        Self {
            tags: vec![BcacheTag::default(); blocks],
            data: vec![[0u8; 64]; blocks],
            index_mask: blocks as u64 - 1,
        }
    }

    /// Number of blocks in the array.
    pub fn blocks(&self) -> usize {
        self.tags.len()
    }

    fn index(&self, pa: u64) -> usize {
        ((pa >> 6) & self.index_mask) as usize
    }

    fn tag_of(pa: u64) -> u64 {
        (pa >> TAG_SHIFT) & TAG_MASK
    }

    /// Returns the tag entry at `pa`'s index (whether or not it matches).
    pub fn tag_at(&self, pa: u64) -> &BcacheTag {
        &self.tags[self.index(pa)]
    }

    /// True iff the block containing `pa` is resident.
    pub fn valid(&self, pa: u64) -> bool {
        let t = &self.tags[self.index(pa)];
        t.valid && t.tag == Self::tag_of(pa)
    }

    /// Returns the MISS/HIT|DIRTY|SHARED status bitmask for `pa`.
    pub fn status(&self, pa: u64) -> u32 {
        if !self.valid(pa) {
            return STATUS_MISS;
        }
        let t = &self.tags[self.index(pa)];
        let mut s = STATUS_HIT;
        if t.dirty {
            s |= STATUS_DIRTY;
        }
        if t.shared {
            s |= STATUS_SHARED;
        }
        s
    }

    /// Reads the resident block containing `pa`, with its dirty/shared bits.
    pub fn read(&self, pa: u64) -> Option<([u8; 64], bool, bool)> {
        if !self.valid(pa) {
            return None;
        }
        let idx = self.index(pa);
        let t = &self.tags[idx];
        Some((self.data[idx], t.dirty, t.shared))
    }

    /// Installs (or updates) the block containing `pa`. A tag mismatch
    /// first displaces the resident block, returning it as a victim if it
    /// was dirty.
    ///
    /// The dirty bit is set only when the slot was already valid before the
    /// write — a fresh install stays clean, and the eviction path restores
    /// dirty state on the next store to the block.
    pub fn write(&mut self, pa: u64, block: &[u8; 64]) -> Option<BcacheVictim> {
        let idx = self.index(pa);
        let tag = Self::tag_of(pa);
        let mut victim = None;

        // The dirty decision keys on slot validity before the write, not on
        // a tag match; the eviction path depends on this.
        let was_valid = self.tags[idx].valid;
        if was_valid && self.tags[idx].tag != tag {
            if self.tags[idx].dirty {
                victim = Some(BcacheVictim {
                    pa: self.tags[idx].pa,
                    data: self.data[idx],
                });
            }
            self.tags[idx].shared = false;
        }

        let same_block = was_valid && self.tags[idx].tag == tag;
        self.data[idx] = *block;
        self.tags[idx] = BcacheTag {
            valid: true,
            dirty: was_valid,
            shared: self.tags[idx].shared && same_block,
            tag,
            pa: pa & !(LINE_SIZE - 1),
        };
        victim
    }

    /// Evicts the block containing `pa` if resident; a dirty block comes
    /// back as a victim for the write-back path. The slot is always
    /// invalidated.
    pub fn evict(&mut self, pa: u64) -> Option<BcacheVictim> {
        if !self.valid(pa) {
            return None;
        }
        let idx = self.index(pa);
        let victim = self.tags[idx].dirty.then(|| BcacheVictim {
            pa: self.tags[idx].pa,
            data: self.data[idx],
        });
        self.tags[idx].valid = false;
        self.tags[idx].dirty = false;
        self.tags[idx].shared = false;
        victim
    }

    /// Evicts every resident block, returning the dirty ones as victims.
    pub fn flush(&mut self) -> Vec<BcacheVictim> {
        let mut victims = Vec::new();
        for idx in 0..self.tags.len() {
            if self.tags[idx].valid {
                if self.tags[idx].dirty {
                    victims.push(BcacheVictim {
                        pa: self.tags[idx].pa,
                        data: self.data[idx],
                    });
                }
                self.tags[idx].valid = false;
                self.tags[idx].dirty = false;
                self.tags[idx].shared = false;
            }
        }
        victims
    }

    /// Sets the shared bit, gated on residency.
    pub fn set_shared(&mut self, pa: u64) {
        if self.valid(pa) {
            let idx = self.index(pa);
            self.tags[idx].shared = true;
        }
    }

    /// Clears the shared bit, gated on residency.
    pub fn clear_shared(&mut self, pa: u64) {
        if self.valid(pa) {
            let idx = self.index(pa);
            self.tags[idx].shared = false;
        }
    }

    /// Sets the dirty bit, gated on residency.
    pub fn set_dirty(&mut self, pa: u64) {
        if self.valid(pa) {
            let idx = self.index(pa);
            self.tags[idx].dirty = true;
        }
    }

    /// Clears the dirty bit, gated on residency.
    pub fn clear_dirty(&mut self, pa: u64) {
        if self.valid(pa) {
            let idx = self.index(pa);
            self.tags[idx].dirty = false;
        }
    }

    /// Updates the stored bytes of a resident block without touching its
    /// tag state (store write-through into an already-owned block).
    pub fn update_bytes(&mut self, pa: u64, data: &[u8]) {
        if !self.valid(pa) {
            return;
        }
        let idx = self.index(pa);
        let offset = (pa & (LINE_SIZE - 1)) as usize;
        let end = (offset + data.len()).min(64);
        self.data[idx][offset..end].copy_from_slice(&data[..end - offset]);
    }
}
