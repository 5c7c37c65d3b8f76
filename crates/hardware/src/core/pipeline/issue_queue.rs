//! Integer (IQ) and floating-point (FQ) issue queues.
//!
//! Unlike the active list, the issue queue is not FIFO: any entry whose
//! operands are ready may issue, and ties are broken by age (oldest first)
//! to approximate the real arbiter's priority network. Each entry carries
//! the execution-pipe request from the slotting table; the Ebox/Fbox
//! arbiters select per pipe, so one cycle can issue up to four integer and
//! three floating-point instructions.
//!
//! Pending operands name both the physical register and its bank: the
//! integer and floating-point PRFs have separate index spaces, and either
//! queue can hold operands from either bank (floating-point stores wait in
//! the IQ on an FP data register; integer-to-FP moves wait in the FQ on an
//! integer register).

use crate::core::pipeline::active_list::ActiveListTag;
use crate::core::pipeline::rename::PhysReg;
use crate::isa::instruction::Decoded;
use crate::isa::slot::Pipe;

/// A pending operand: either still waiting on a physical register, or
/// already resolved to a value (read out of the PRF, or forwarded).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operand {
    /// Waiting for an integer physical register.
    PendingInt(PhysReg),
    /// Waiting for a floating-point physical register.
    PendingFp(PhysReg),
    /// Value available now.
    Ready(u64),
}

impl Operand {
    fn is_ready(self) -> bool {
        matches!(self, Operand::Ready(_))
    }

    fn value(self) -> u64 {
        match self {
            Operand::Ready(v) => v,
            _ => 0,
        }
    }

    fn wake(&mut self, phys: PhysReg, fp: bool, value: u64) {
        let hit = match *self {
            Operand::PendingInt(p) => !fp && p == phys,
            Operand::PendingFp(p) => fp && p == phys,
            Operand::Ready(_) => false,
        };
        if hit {
            *self = Operand::Ready(value);
        }
    }
}

/// An issue-queue entry selected by an arbiter, handed to the execute pipes.
#[derive(Clone, Copy, Debug)]
pub struct IssuedOp {
    /// Active list tag of the instruction.
    pub tag: ActiveListTag,
    /// Program counter of the instruction.
    pub pc: u64,
    /// The decoded instruction.
    pub decoded: Decoded,
    /// First source value (Ra/Fa).
    pub a: u64,
    /// Second source value (Rb/Fb, or the resolved literal).
    pub b: u64,
    /// Prior destination value (conditional moves re-write it on the
    /// not-moved path).
    pub old_dest: u64,
    /// Destination physical register, if the instruction writes one.
    pub dest: Option<PhysReg>,
}

/// One entry in an issue queue.
#[derive(Clone, Copy, Debug)]
struct Entry {
    tag: ActiveListTag,
    pc: u64,
    decoded: Decoded,
    op_a: Operand,
    op_b: Operand,
    /// Prior destination mapping, read for conditional moves.
    op_c: Operand,
    dest: Option<PhysReg>,
    pipe: Pipe,
    /// Monotonic age counter; lower issues first among ready entries.
    age: u64,
}

/// Age-priority issue queue: entries aren't FIFO-ordered on issue, but the
/// oldest ready entry always wins arbitration.
pub struct IssueQueue {
    entries: Vec<Option<Entry>>,
    next_age: u64,
}

impl IssueQueue {
    /// Creates an issue queue with the given number of entries (20 for the
    /// integer IQ, 15 for the floating-point FQ).
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: (0..capacity).map(|_| None).collect(),
            next_age: 0,
        }
    }

    /// Returns the number of occupied slots.
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| e.is_some()).count()
    }

    /// Returns true if the queue holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(|e| e.is_none())
    }

    /// Returns true if every slot is occupied.
    pub fn is_full(&self) -> bool {
        self.entries.iter().all(|e| e.is_some())
    }

    /// Inserts a decoded instruction with its (possibly still-pending)
    /// source operands. Returns `false` if the queue is full.
    #[allow(clippy::too_many_arguments)]
    pub fn insert(
        &mut self,
        tag: ActiveListTag,
        pc: u64,
        decoded: Decoded,
        op_a: Operand,
        op_b: Operand,
        op_c: Operand,
        dest: Option<PhysReg>,
        pipe: Pipe,
    ) -> bool {
        let Some(slot) = self.entries.iter_mut().find(|e| e.is_none()) else {
            return false;
        };
        let age = self.next_age;
        self.next_age += 1;
        *slot = Some(Entry {
            tag,
            pc,
            decoded,
            op_a,
            op_b,
            op_c,
            dest,
            pipe,
            age,
        });
        true
    }

    /// Wakes up every entry waiting on `phys` in the named bank by
    /// substituting the now-ready value — the result-bus broadcast that
    /// follows every execute.
    pub fn wakeup(&mut self, phys: PhysReg, fp: bool, value: u64) {
        for slot in self.entries.iter_mut().flatten() {
            slot.op_a.wake(phys, fp, value);
            slot.op_b.wake(phys, fp, value);
            slot.op_c.wake(phys, fp, value);
        }
    }

    /// Selects and removes the oldest fully-ready entry whose pipe request
    /// satisfies `accept` — one arbitration winner per pipe per cycle.
    pub fn select(&mut self, accept: impl Fn(Pipe) -> bool) -> Option<IssuedOp> {
        let winner_idx = self
            .entries
            .iter()
            .enumerate()
            .filter_map(|(i, e)| e.as_ref().map(|e| (i, e)))
            .filter(|(_, e)| {
                e.op_a.is_ready() && e.op_b.is_ready() && e.op_c.is_ready() && accept(e.pipe)
            })
            .min_by_key(|(_, e)| e.age)
            .map(|(i, _)| i)?;

        let entry = self.entries[winner_idx].take()?;
        Some(IssuedOp {
            tag: entry.tag,
            pc: entry.pc,
            decoded: entry.decoded,
            a: entry.op_a.value(),
            b: entry.op_b.value(),
            old_dest: entry.op_c.value(),
            dest: entry.dest,
        })
    }

    /// Drops every entry belonging to an instruction younger than `tag` —
    /// branch misprediction recovery.
    pub fn flush_younger(&mut self, tag: ActiveListTag) {
        for slot in &mut self.entries {
            if slot.as_ref().is_some_and(|e| e.tag.0 > tag.0) {
                *slot = None;
            }
        }
    }

    /// Drops every entry — a full fault/replay flush.
    pub fn flush(&mut self) {
        for slot in &mut self.entries {
            *slot = None;
        }
    }
}
