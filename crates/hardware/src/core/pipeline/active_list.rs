//! Active List: the in-flight instruction window, from dispatch through
//! in-order retirement.
//!
//! Every dispatched instruction gets a slot here regardless of which issue
//! queue (IQ/FQ) or load/store queue it also occupies; the active list is
//! what makes retirement in-order even though issue and execution are not.

use crate::common::error::Trap;
use crate::core::pipeline::rename::PhysReg;
use crate::isa::instruction::Decoded;

/// Unique tag identifying an in-flight instruction, assigned at dispatch.
/// Tags increase monotonically, so comparing raw values orders instructions
/// by age.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct ActiveListTag(pub u32);

/// Lifecycle state of an active list entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum EntryState {
    /// Dispatched but not yet finished executing.
    #[default]
    Issued,
    /// Execution complete, result available, waiting to retire.
    Completed,
    /// Instruction took an exception; PALcode entry happens at retirement.
    Faulted,
}

/// A deferred internal-processor-register write, applied only at retirement
/// (mirrors `HW_MTPR`'s architectural commit point).
#[derive(Clone, Copy, Debug, Default)]
pub struct IprUpdate {
    /// IPR address (see `core::arch::ipr`).
    pub addr: u32,
    /// Value to write at retirement.
    pub new_val: u64,
}

/// A single in-flight instruction.
#[derive(Clone, Debug, Default)]
pub struct ActiveListEntry {
    /// Unique tag for this entry.
    pub tag: ActiveListTag,
    /// Program counter of the instruction.
    pub pc: u64,
    /// Raw 32-bit instruction encoding.
    pub raw: u32,
    /// Architectural destination register (Rc/Fc), or `ZERO_REG` if none.
    pub arch_dest: usize,
    /// Whether the destination is a floating-point register.
    pub dest_is_fp: bool,
    /// Newly allocated physical register backing `arch_dest`.
    pub new_phys: Option<PhysReg>,
    /// Physical register `arch_dest` previously mapped to — released to the
    /// free list once this entry retires.
    pub stale_phys: Option<PhysReg>,
    /// Computed result (ALU/FPU output or load data).
    pub result: u64,
    /// Virtual address for loads/stores.
    pub mem_addr: u64,
    /// Next PC the fetch stream continued at (the branch prediction, or
    /// sequential PC+4 for everything else).
    pub predicted_next: u64,
    /// Next PC the instruction actually produced, filled by branch/jump
    /// execution. Zero until resolved; compared at retirement.
    pub actual_next: u64,
    /// FPCR status bits raised by this instruction, merged at retirement.
    pub fpcr_flags: u64,
    /// Current lifecycle state.
    pub state: EntryState,
    /// Trap taken by this instruction, if faulted.
    pub trap: Option<Trap>,
    /// A speculative-load-ordering violation was detected against this
    /// entry; retirement restarts fetch at `pc` instead of committing.
    pub replay: bool,
    /// Deferred IPR write (`HW_MTPR`), applied at retirement.
    pub ipr_update: Option<IprUpdate>,
    /// Whether this slot is occupied.
    pub valid: bool,
}

/// Circular-buffer in-flight instruction window with in-order retirement.
pub struct ActiveList {
    entries: Vec<ActiveListEntry>,
    head: usize,
    tail: usize,
    count: usize,
    next_tag: u32,
}

impl ActiveList {
    /// Creates an active list with the given capacity (the 21264's Active
    /// List holds up to 80 entries; capacity is configurable for testing).
    pub fn new(capacity: usize) -> Self {
        let mut entries = Vec::with_capacity(capacity);
        entries.resize_with(capacity, ActiveListEntry::default);
        Self {
            entries,
            head: 0,
            tail: 0,
            count: 0,
            next_tag: 1,
        }
    }

    /// Returns the number of occupied entries.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Returns true if there are no in-flight instructions.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Returns true if the window is full.
    pub fn is_full(&self) -> bool {
        self.count == self.entries.len()
    }

    /// Dispatches a new instruction into the window. Returns `None` if full.
    #[allow(clippy::too_many_arguments)]
    pub fn dispatch(
        &mut self,
        pc: u64,
        decoded: &Decoded,
        arch_dest: usize,
        dest_is_fp: bool,
        new_phys: Option<PhysReg>,
        stale_phys: Option<PhysReg>,
        predicted_next: u64,
    ) -> Option<ActiveListTag> {
        if self.is_full() {
            return None;
        }
        let tag = ActiveListTag(self.next_tag);
        self.next_tag = self.next_tag.wrapping_add(1).max(1);

        self.entries[self.tail] = ActiveListEntry {
            tag,
            pc,
            raw: decoded.raw,
            arch_dest,
            dest_is_fp,
            new_phys,
            stale_phys,
            result: 0,
            mem_addr: 0,
            predicted_next,
            actual_next: 0,
            fpcr_flags: 0,
            state: EntryState::Issued,
            trap: None,
            replay: false,
            ipr_update: None,
            valid: true,
        };
        self.tail = (self.tail + 1) % self.entries.len();
        self.count += 1;
        Some(tag)
    }

    /// Marks an entry complete with its result.
    pub fn complete(&mut self, tag: ActiveListTag, result: u64) {
        if let Some(e) = self.find_mut(tag) {
            e.state = EntryState::Completed;
            e.result = result;
        }
    }

    /// Marks an entry as having faulted.
    pub fn fault(&mut self, tag: ActiveListTag, trap: Trap) {
        if let Some(e) = self.find_mut(tag) {
            e.state = EntryState::Faulted;
            e.trap = Some(trap);
        }
    }

    /// Records the next PC an executed branch/jump actually produced.
    pub fn set_actual_next(&mut self, tag: ActiveListTag, next_pc: u64) {
        if let Some(e) = self.find_mut(tag) {
            e.actual_next = next_pc;
        }
    }

    /// Records a load/store's resolved virtual address.
    pub fn set_mem_addr(&mut self, tag: ActiveListTag, addr: u64) {
        if let Some(e) = self.find_mut(tag) {
            e.mem_addr = addr;
        }
    }

    /// Merges FPCR status flags raised during execution into an entry.
    pub fn set_fpcr_flags(&mut self, tag: ActiveListTag, flags: u64) {
        if let Some(e) = self.find_mut(tag) {
            e.fpcr_flags |= flags;
        }
    }

    /// Flags a completed load for replay at its retirement slot.
    pub fn flag_replay(&mut self, tag: ActiveListTag) {
        if let Some(e) = self.find_mut(tag) {
            e.replay = true;
        }
    }

    /// Attaches a deferred IPR write to an entry (e.g. `HW_MTPR`).
    pub fn set_ipr_update(&mut self, tag: ActiveListTag, update: IprUpdate) {
        if let Some(e) = self.find_mut(tag) {
            e.ipr_update = Some(update);
        }
    }

    /// Returns the oldest entry without retiring it.
    pub fn peek_head(&self) -> Option<&ActiveListEntry> {
        (self.count > 0).then(|| &self.entries[self.head])
    }

    /// Retires the head entry if it has finished executing (Completed or
    /// Faulted); returns `None` if empty or the head is still `Issued`.
    pub fn retire_head(&mut self) -> Option<ActiveListEntry> {
        if self.count == 0 || self.entries[self.head].state == EntryState::Issued {
            return None;
        }
        let retired = self.entries[self.head].clone();
        self.entries[self.head].valid = false;
        self.head = (self.head + 1) % self.entries.len();
        self.count -= 1;
        Some(retired)
    }

    /// Iterates the occupied entries, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &ActiveListEntry> {
        let len = self.entries.len().max(1);
        (0..self.count)
            .map(move |i| &self.entries[(self.head + i) % len])
            .filter(|e| e.valid)
    }

    /// Squashes every entry — a fault at retirement or a PALcode-serviced
    /// exception flushes the whole speculative window.
    pub fn flush_all(&mut self) {
        for e in &mut self.entries {
            e.valid = false;
        }
        self.head = 0;
        self.tail = 0;
        self.count = 0;
    }

    /// Squashes every entry dispatched after `tag` (exclusive) — a branch
    /// misprediction recovery, keeping everything up to and including the
    /// mispredicted branch itself.
    pub fn flush_after(&mut self, tag: ActiveListTag) {
        if self.count == 0 {
            return;
        }
        let mut idx = self.head;
        let mut found = false;
        for _ in 0..self.count {
            if self.entries[idx].tag == tag {
                found = true;
                break;
            }
            idx = (idx + 1) % self.entries.len();
        }
        if !found {
            return;
        }
        let keep_until = (idx + 1) % self.entries.len();
        let mut i = keep_until;
        while i != self.tail {
            self.entries[i].valid = false;
            i = (i + 1) % self.entries.len();
        }
        self.tail = keep_until;
        self.count = 0;
        let mut i = self.head;
        while i != self.tail {
            if self.entries[i].valid {
                self.count += 1;
            }
            i = (i + 1) % self.entries.len();
        }
    }

    fn find_mut(&mut self, tag: ActiveListTag) -> Option<&mut ActiveListEntry> {
        let mut idx = self.head;
        for _ in 0..self.count {
            if self.entries[idx].valid && self.entries[idx].tag == tag {
                return Some(&mut self.entries[idx]);
            }
            idx = (idx + 1) % self.entries.len();
        }
        None
    }
}
