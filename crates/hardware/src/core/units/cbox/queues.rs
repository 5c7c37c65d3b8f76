//! Cbox queue structures: MAF, VDB, IOWB, and PQ.
//!
//! Every queue is a ring with a head (oldest) and tail cursor. Searches
//! sweep head to tail; freeing the head advances it past entries already
//! marked invalid, so a mid-queue completion never blocks the cursor.
//! Merging policy differs per queue and is the point of the structure:
//! like-typed memory requests to the same 64-byte block share a MAF entry,
//! loads merge into stores, I/O merges only within its width-specific
//! window, and probe responses are gated on the victim buffer.

use super::sysport::{DataMovement, NextState, SysDc};

/// Miss Address File request categories.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MafType {
    /// Load miss (LDx).
    LdX,
    /// Store miss (STx).
    StX,
    /// Store-conditional miss (STx_C).
    StXC,
    /// Store hit on a clean/shared line needing a change-to-dirty.
    StXCtd,
    /// Store-conditional change-to-dirty.
    StXCCtd,
    /// Write-hint 64: take ownership without fetching.
    Wh64,
    /// Evict cache block.
    Ecb,
    /// Instruction-stream fill.
    Istream,
}

impl MafType {
    /// Whether `self` (an incoming request) may merge into an existing
    /// entry of type `existing` for the same block: like types merge, and
    /// loads merge into any store flavor.
    fn merges_into(self, existing: MafType) -> bool {
        self == existing
            || (self == MafType::LdX
                && matches!(
                    existing,
                    MafType::StX | MafType::StXC | MafType::StXCtd | MafType::StXCCtd
                ))
    }
}

/// The pipeline entity a MAF entry answers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MafRequester {
    /// A load queue entry, identified by its in-flight tag.
    Load(u32),
    /// A store queue entry, identified by its in-flight tag.
    Store(u32),
    /// The Ibox fetch front-end.
    Istream,
}

/// Maximum requesters a single MAF entry can satisfy.
pub const MAF_MAX_MERGED: usize = 8;

/// One Miss Address File entry.
#[derive(Clone, Debug)]
pub struct MafEntry {
    /// Request category.
    pub kind: MafType,
    /// Physical address: 64-byte aligned for memory space, the original
    /// byte address for I/O space.
    pub pa: u64,
    /// Valid-byte mask over the 64-byte block.
    pub mask: u64,
    /// Requesters merged into this entry.
    pub requesters: Vec<MafRequester>,
    /// The fill may arrive shared (another cache holds the line).
    pub shared_hint: bool,
    /// Request targets I/O space.
    pub io: bool,
    /// Access width for I/O requests (1, 2, 4, or 8 bytes).
    pub io_width: u8,
    /// The system command has been transmitted.
    pub processed: bool,
    /// The system responded; completion signaled to the Mbox/Ibox.
    pub complete: bool,
    /// Slot occupancy.
    pub valid: bool,
}

/// Outcome of a MAF insertion attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MafAdd {
    /// The request merged into an existing entry.
    Merged(usize),
    /// A new entry was allocated.
    New(usize),
    /// The file is full (and no merge was possible).
    Full,
}

/// The Miss Address File: outstanding requests to the system.
pub struct Maf {
    entries: Vec<Option<MafEntry>>,
    head: usize,
    tail: usize,
    count: usize,
}

impl Maf {
    /// Creates a MAF with `capacity` entries (8 architecturally).
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: (0..capacity).map(|_| None).collect(),
            head: 0,
            tail: 0,
            count: 0,
        }
    }

    /// Returns the number of live entries.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Returns true if no entries are live.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Whether an uncompleted entry for `pa`'s block exists — the
    /// at-most-one-outstanding-fill-per-line check.
    pub fn outstanding_for_line(&self, pa: u64) -> Option<usize> {
        let line = pa & !0x3F;
        self.iter_indices()
            .find(|&i| self.entries[i].as_ref().is_some_and(|e| !e.io && e.pa == line && !e.complete))
    }

    /// Inserts or merges a request per the MAF merging discipline.
    ///
    /// `quad_window64` selects the 64-byte merge window for quadword I/O
    /// (a Cbox CSR); all other I/O widths use their fixed rule.
    #[allow(clippy::too_many_arguments)]
    pub fn add(
        &mut self,
        kind: MafType,
        pa: u64,
        mask: u64,
        requester: MafRequester,
        io: bool,
        io_width: u8,
        quad_window64: bool,
    ) -> MafAdd {
        // Merge scan, head to tail (oldest first).
        for i in self.iter_indices().collect::<Vec<_>>() {
            let Some(e) = self.entries[i].as_mut() else {
                continue;
            };
            if !e.valid || e.complete || e.io != io {
                continue;
            }
            let mergeable = if io {
                kind == e.kind
                    && io_width == e.io_width
                    && io_merge_window(pa, e.pa, io_width, quad_window64)
            } else {
                kind.merges_into(e.kind) && (pa & !0x3F) == e.pa
            };
            if mergeable && e.requesters.len() < MAF_MAX_MERGED {
                e.mask |= mask;
                e.requesters.push(requester);
                return MafAdd::Merged(i);
            }
        }

        if self.count == self.entries.len() {
            return MafAdd::Full;
        }
        let idx = self.tail;
        self.entries[idx] = Some(MafEntry {
            kind,
            pa: if io { pa } else { pa & !0x3F },
            mask,
            requesters: vec![requester],
            shared_hint: false,
            io,
            io_width,
            processed: false,
            complete: false,
            valid: true,
        });
        self.tail = (self.tail + 1) % self.entries.len();
        self.count += 1;
        MafAdd::New(idx)
    }

    /// Returns the index of the oldest unprocessed entry.
    pub fn oldest_unprocessed(&self) -> Option<usize> {
        self.iter_indices().find(|&i| {
            self.entries[i]
                .as_ref()
                .is_some_and(|e| e.valid && !e.processed)
        })
    }

    /// Borrows an entry.
    pub fn get(&self, idx: usize) -> Option<&MafEntry> {
        self.entries.get(idx).and_then(|e| e.as_ref())
    }

    /// Mutably borrows an entry.
    pub fn get_mut(&mut self, idx: usize) -> Option<&mut MafEntry> {
        self.entries.get_mut(idx).and_then(|e| e.as_mut())
    }

    /// Frees a completed entry and advances the head past any invalid
    /// slots it was parked on.
    pub fn free(&mut self, idx: usize) {
        if self.entries[idx].take().is_some() {
            self.count -= 1;
        }
        while self.count > 0 && self.entries[self.head].is_none() && self.head != self.tail {
            self.head = (self.head + 1) % self.entries.len();
        }
        if self.count == 0 {
            self.head = self.tail;
        }
    }

    /// Indices of live entries, oldest first.
    pub fn iter_indices(&self) -> impl Iterator<Item = usize> + '_ {
        let len = self.entries.len().max(1);
        let head = self.head;
        (0..len)
            .map(move |i| (head + i) % len)
            .filter(|&i| self.entries[i].is_some())
    }
}

/// Whether two I/O addresses fall in the same merge window for a width:
/// byte/word never merge, longwords merge within 32 bytes, quadwords within
/// 32 or 64 bytes per the Cbox CSR.
fn io_merge_window(a: u64, b: u64, width: u8, quad_window64: bool) -> bool {
    match width {
        4 => (a & !0x1F) == (b & !0x1F),
        8 => {
            let mask = if quad_window64 { !0x3F } else { !0x1F };
            (a & mask) == (b & mask)
        }
        _ => false,
    }
}

/// Victim Data Buffer destination categories.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VdbKind {
    /// Dcache victim headed into the Bcache.
    ToBcache,
    /// Bcache victim headed to memory.
    ToMemory,
    /// Block captured for a probe response.
    ProbeResponse,
}

/// One Victim Data Buffer entry.
#[derive(Clone, Debug)]
pub struct VdbEntry {
    /// Destination category.
    pub kind: VdbKind,
    /// Physical address of the block.
    pub pa: u64,
    /// The 64-byte payload.
    pub data: [u8; 64],
    /// While set, a probe response for this PA may not issue.
    pub probe_valid: bool,
    /// The buffer's command has been transmitted.
    pub processed: bool,
    /// Slot occupancy.
    pub valid: bool,
}

/// The Victim Data Buffer: write-backs and probe responses in flight.
pub struct Vdb {
    entries: Vec<Option<VdbEntry>>,
    head: usize,
    tail: usize,
    count: usize,
}

impl Vdb {
    /// Creates a VDB with `capacity` entries (8 architecturally).
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: (0..capacity).map(|_| None).collect(),
            head: 0,
            tail: 0,
            count: 0,
        }
    }

    /// Returns the number of live entries.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Returns true if no entries are live.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Total slot count.
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    /// Allocates an entry; `None` when the buffer is full.
    pub fn push(&mut self, kind: VdbKind, pa: u64, data: [u8; 64], probe_valid: bool) -> Option<usize> {
        if self.count == self.entries.len() {
            return None;
        }
        let idx = self.tail;
        self.entries[idx] = Some(VdbEntry {
            kind,
            pa: pa & !0x3F,
            data,
            probe_valid,
            processed: false,
            valid: true,
        });
        self.tail = (self.tail + 1) % self.entries.len();
        self.count += 1;
        Some(idx)
    }

    /// Index of the oldest unprocessed write-back entry. Probe-response
    /// entries are excluded: their transmission belongs to the probe queue,
    /// gated on the probe-valid bit.
    pub fn oldest_sendable(&self) -> Option<usize> {
        self.iter_indices().find(|&i| {
            self.entries[i]
                .as_ref()
                .is_some_and(|e| !e.processed && e.kind != VdbKind::ProbeResponse)
        })
    }

    /// Whether any live entry for `pa`'s block still has its probe-valid
    /// bit set.
    pub fn probe_valid_for(&self, pa: u64) -> bool {
        let line = pa & !0x3F;
        self.iter_indices().any(|i| {
            self.entries[i]
                .as_ref()
                .is_some_and(|e| e.pa == line && e.probe_valid)
        })
    }

    /// Clears the probe-valid gate on an entry.
    pub fn clear_probe_valid(&mut self, idx: usize) {
        if let Some(e) = self.entries.get_mut(idx).and_then(|e| e.as_mut()) {
            e.probe_valid = false;
        }
    }

    /// Borrows an entry.
    pub fn get(&self, idx: usize) -> Option<&VdbEntry> {
        self.entries.get(idx).and_then(|e| e.as_ref())
    }

    /// Mutably borrows an entry.
    pub fn get_mut(&mut self, idx: usize) -> Option<&mut VdbEntry> {
        self.entries.get_mut(idx).and_then(|e| e.as_mut())
    }

    /// Frees an entry, advancing the head over invalid slots.
    pub fn free(&mut self, idx: usize) {
        if self.entries[idx].take().is_some() {
            self.count -= 1;
        }
        while self.count > 0 && self.entries[self.head].is_none() && self.head != self.tail {
            self.head = (self.head + 1) % self.entries.len();
        }
        if self.count == 0 {
            self.head = self.tail;
        }
    }

    /// Indices of live entries, oldest first.
    pub fn iter_indices(&self) -> impl Iterator<Item = usize> + '_ {
        let len = self.entries.len().max(1);
        let head = self.head;
        (0..len)
            .map(move |i| (head + i) % len)
            .filter(|&i| self.entries[i].is_some())
    }
}

/// One I/O Write Buffer entry.
#[derive(Clone, Debug)]
pub struct IowbEntry {
    /// Base physical address (window-aligned).
    pub pa: u64,
    /// Up to 64 bytes of write data, positioned by block offset.
    pub data: [u8; 64],
    /// Store width in bytes (1, 2, 4, or 8).
    pub width: u8,
    /// Valid-byte mask over `data`.
    pub mask: u64,
    /// Store queue tags merged into this buffer.
    pub stores: Vec<u32>,
    /// The write command has been transmitted.
    pub processed: bool,
    /// Slot occupancy.
    pub valid: bool,
}

/// Outcome of an IOWB insertion attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IowbAdd {
    /// Merged into an existing buffer.
    Merged(usize),
    /// Allocated a new buffer.
    New(usize),
    /// Buffer full.
    Full,
}

/// The I/O Write Buffer: a 4-entry merge buffer for device-space stores.
pub struct Iowb {
    entries: Vec<Option<IowbEntry>>,
    head: usize,
    tail: usize,
    count: usize,
}

impl Iowb {
    /// Creates an IOWB with `capacity` entries (4 architecturally).
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: (0..capacity).map(|_| None).collect(),
            head: 0,
            tail: 0,
            count: 0,
        }
    }

    /// Returns the number of live entries.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Total slot count.
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no entries are live.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Inserts a device-space store, merging only with a same-width buffer
    /// in the same merge window. A width mismatch always allocates a new
    /// entry.
    pub fn add(
        &mut self,
        pa: u64,
        bytes: &[u8],
        width: u8,
        store_tag: u32,
        quad_window64: bool,
    ) -> IowbAdd {
        let offset = (pa & 0x3F) as usize;
        let mask = ((1u64 << bytes.len()) - 1) << offset;

        for i in self.iter_indices().collect::<Vec<_>>() {
            let Some(e) = self.entries[i].as_mut() else {
                continue;
            };
            if e.processed || e.width != width {
                continue;
            }
            if io_merge_window(pa, e.pa, width, quad_window64) {
                e.data[offset..offset + bytes.len()].copy_from_slice(bytes);
                e.mask |= mask;
                e.stores.push(store_tag);
                return IowbAdd::Merged(i);
            }
        }

        if self.count == self.entries.len() {
            return IowbAdd::Full;
        }
        let idx = self.tail;
        let mut data = [0u8; 64];
        data[offset..offset + bytes.len()].copy_from_slice(bytes);
        self.entries[idx] = Some(IowbEntry {
            pa,
            data,
            width,
            mask,
            stores: vec![store_tag],
            processed: false,
            valid: true,
        });
        self.tail = (self.tail + 1) % self.entries.len();
        self.count += 1;
        IowbAdd::New(idx)
    }

    /// Index of the oldest unprocessed buffer.
    pub fn oldest_unprocessed(&self) -> Option<usize> {
        self.iter_indices().find(|&i| {
            self.entries[i]
                .as_ref()
                .is_some_and(|e| !e.processed)
        })
    }

    /// Borrows an entry.
    pub fn get(&self, idx: usize) -> Option<&IowbEntry> {
        self.entries.get(idx).and_then(|e| e.as_ref())
    }

    /// Mutably borrows an entry.
    pub fn get_mut(&mut self, idx: usize) -> Option<&mut IowbEntry> {
        self.entries.get_mut(idx).and_then(|e| e.as_mut())
    }

    /// Frees an entry, advancing the head over invalid slots.
    pub fn free(&mut self, idx: usize) {
        if self.entries[idx].take().is_some() {
            self.count -= 1;
        }
        while self.count > 0 && self.entries[self.head].is_none() && self.head != self.tail {
            self.head = (self.head + 1) % self.entries.len();
        }
        if self.count == 0 {
            self.head = self.tail;
        }
    }

    /// Indices of live entries, oldest first.
    pub fn iter_indices(&self) -> impl Iterator<Item = usize> + '_ {
        let len = self.entries.len().max(1);
        let head = self.head;
        (0..len)
            .map(move |i| (head + i) % len)
            .filter(|&i| self.entries[i].is_some())
    }
}

/// One Probe Queue entry.
#[derive(Clone, Debug)]
pub struct PqEntry {
    /// Data-movement request.
    pub dm: DataMovement,
    /// Next-state command.
    pub ns: NextState,
    /// ID echoed back in the probe response.
    pub id: u8,
    /// Probed physical address.
    pub pa: u64,
    /// `SysDc` the system attached to the probe, if any.
    pub sysdc: Option<SysDc>,
    /// VDB entry holding this probe's response data, once captured.
    pub vdb: Option<usize>,
    /// MAF entry the probe hit, if any.
    pub maf: Option<usize>,
    /// The probe's state transition has been applied.
    pub processed: bool,
    /// Slot occupancy.
    pub valid: bool,
}

/// The Probe Queue: incoming coherence probes, processed in arrival order.
pub struct ProbeQueue {
    entries: Vec<Option<PqEntry>>,
    head: usize,
    tail: usize,
    count: usize,
}

impl ProbeQueue {
    /// Creates a probe queue with `capacity` entries (8 architecturally).
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: (0..capacity).map(|_| None).collect(),
            head: 0,
            tail: 0,
            count: 0,
        }
    }

    /// Returns the number of live entries.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Returns true if no entries are live.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Enqueues a probe; `None` when the queue is full.
    pub fn push(&mut self, dm: DataMovement, ns: NextState, pa: u64, id: u8) -> Option<usize> {
        if self.count == self.entries.len() {
            return None;
        }
        let idx = self.tail;
        self.entries[idx] = Some(PqEntry {
            dm,
            ns,
            id,
            pa: pa & !0x3F,
            sysdc: None,
            vdb: None,
            maf: None,
            processed: false,
            valid: true,
        });
        self.tail = (self.tail + 1) % self.entries.len();
        self.count += 1;
        Some(idx)
    }

    /// Index of the head (oldest) probe; probes are strictly in-order.
    pub fn head_index(&self) -> Option<usize> {
        self.iter_indices().next()
    }

    /// Index of the oldest unprocessed probe, for miss-flag piggybacking.
    pub fn oldest_unprocessed(&self) -> Option<usize> {
        self.iter_indices().find(|&i| {
            self.entries[i]
                .as_ref()
                .is_some_and(|e| !e.processed)
        })
    }

    /// Borrows an entry.
    pub fn get(&self, idx: usize) -> Option<&PqEntry> {
        self.entries.get(idx).and_then(|e| e.as_ref())
    }

    /// Mutably borrows an entry.
    pub fn get_mut(&mut self, idx: usize) -> Option<&mut PqEntry> {
        self.entries.get_mut(idx).and_then(|e| e.as_mut())
    }

    /// Frees an entry, advancing the head over invalid slots.
    pub fn free(&mut self, idx: usize) {
        if self.entries[idx].take().is_some() {
            self.count -= 1;
        }
        while self.count > 0 && self.entries[self.head].is_none() && self.head != self.tail {
            self.head = (self.head + 1) % self.entries.len();
        }
        if self.count == 0 {
            self.head = self.tail;
        }
    }

    /// Indices of live entries, oldest first.
    pub fn iter_indices(&self) -> impl Iterator<Item = usize> + '_ {
        let len = self.entries.len().max(1);
        let head = self.head;
        (0..len)
            .map(move |i| (head + i) % len)
            .filter(|&i| self.entries[i].is_some())
    }
}
