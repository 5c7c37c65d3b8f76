//! Physical register rename: map, free list, and branch-speculation
//! checkpoints.
//!
//! The Ibox renames architectural `Ra`/`Rb`/`Rc` (and `Fa`/`Fb`/`Fc`) fields
//! to physical registers at dispatch, so independent instructions sharing an
//! architectural name don't serialize on it. `R31`/`F31` are hard-wired zero:
//! renaming them as a source always yields the fixed zero physical register,
//! and renaming them as a destination allocates nothing.

use crate::common::constants::{ARCH_REGS, FP_PHYS_REGS, INT_PHYS_REGS, ZERO_REG};

/// A physical register index into the integer or floating-point PRF.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct PhysReg(pub u16);

/// A per-register-file free list plus rename map, identical in shape for the
/// integer and floating-point PRFs.
struct RenameFile {
    /// Architectural register -> current physical register.
    map: Vec<PhysReg>,
    /// Free physical registers available for allocation, oldest-free-first.
    free: Vec<PhysReg>,
    /// Total physical register count, needed to rebuild the free list on reset.
    phys_count: usize,
    /// The hard-wired zero physical register (never allocated or freed).
    zero_phys: PhysReg,
}

impl RenameFile {
    fn new(phys_count: usize) -> Self {
        // Physical registers [0, ARCH_REGS) start mapped 1:1 to architectural
        // registers at reset (so initial state is consistent without further
        // setup); [ARCH_REGS, phys_count) start on the free list. Physical
        // register 31 backs the architectural zero register and is carved out
        // of both the map's churn and the free list permanently.
        let map: Vec<PhysReg> = (0..ARCH_REGS as u16).map(PhysReg).collect();
        let free: Vec<PhysReg> = ((ARCH_REGS as u16)..phys_count as u16)
            .map(PhysReg)
            .collect();
        Self {
            map,
            free,
            phys_count,
            zero_phys: PhysReg(ZERO_REG as u16),
        }
    }

    fn reset(&mut self) {
        self.map = (0..ARCH_REGS as u16).map(PhysReg).collect();
        self.free = ((ARCH_REGS as u16)..self.phys_count as u16)
            .map(PhysReg)
            .collect();
    }

    fn source(&self, arch_reg: usize) -> PhysReg {
        if arch_reg == ZERO_REG {
            self.zero_phys
        } else {
            self.map[arch_reg]
        }
    }

    /// Allocates a fresh physical register for `arch_reg` and updates the
    /// map. Returns `(new, old)` so the old mapping can be recycled once the
    /// active list confirms no earlier in-flight instruction still reads it,
    /// or `None` if `arch_reg` is the hard-wired zero register.
    fn dest(&mut self, arch_reg: usize) -> Option<(PhysReg, PhysReg)> {
        if arch_reg == ZERO_REG {
            return None;
        }
        let new = self.free.pop()?;
        let old = self.map[arch_reg];
        self.map[arch_reg] = new;
        Some((new, old))
    }

    fn release(&mut self, phys: PhysReg) {
        if phys != self.zero_phys {
            self.free.push(phys);
        }
    }

    fn has_free(&self) -> bool {
        !self.free.is_empty()
    }
}

/// A snapshot of the rename maps taken at a speculated branch, keyed by the
/// branch's in-flight serial. Only the maps are stored: recovery happens at
/// the retirement boundary, where every older instruction has committed, so
/// the free lists rebuild exactly as the complement of the restored maps.
#[derive(Clone)]
struct Checkpoint {
    serial: u32,
    int_map: Vec<PhysReg>,
    fp_map: Vec<PhysReg>,
}

/// Combined integer/floating-point rename unit.
pub struct RenameUnit {
    int: RenameFile,
    fp: RenameFile,
    /// Outstanding branch checkpoints in program order (oldest first).
    checkpoints: Vec<Checkpoint>,
}

impl Default for RenameUnit {
    fn default() -> Self {
        Self::new()
    }
}

impl RenameUnit {
    /// Creates a rename unit sized to the architectural PRFs (80 integer,
    /// 72 floating-point physical registers).
    pub fn new() -> Self {
        Self {
            int: RenameFile::new(INT_PHYS_REGS),
            fp: RenameFile::new(FP_PHYS_REGS),
            checkpoints: Vec::new(),
        }
    }

    /// Looks up the physical register currently backing an architectural
    /// source register.
    pub fn rename_source(&self, arch_reg: usize, is_fp: bool) -> PhysReg {
        if is_fp {
            self.fp.source(arch_reg)
        } else {
            self.int.source(arch_reg)
        }
    }

    /// Allocates a new physical register for an architectural destination,
    /// returning `(new, old)`. The caller is responsible for recording `old`
    /// in the active list entry so it can be released at commit.
    pub fn rename_dest(&mut self, arch_reg: usize, is_fp: bool) -> Option<(PhysReg, PhysReg)> {
        if is_fp {
            self.fp.dest(arch_reg)
        } else {
            self.int.dest(arch_reg)
        }
    }

    /// Reverts a just-made destination rename: the map returns to `old`
    /// and `new` goes back to the free list. Only valid immediately after
    /// the matching `rename_dest`, before any further rename of `arch_reg`.
    pub fn undo_dest(&mut self, arch_reg: usize, is_fp: bool, new: PhysReg, old: PhysReg) {
        let file = if is_fp { &mut self.fp } else { &mut self.int };
        if arch_reg != ZERO_REG && file.map[arch_reg] == new {
            file.map[arch_reg] = old;
            file.free.push(new);
        }
    }

    /// True if both PRFs have at least one free register — the Ibox's
    /// dispatch-stall condition for this instruction.
    pub fn can_allocate(&self, needs_int: bool, needs_fp: bool) -> bool {
        (!needs_int || self.int.has_free()) && (!needs_fp || self.fp.has_free())
    }

    /// Returns the number of free integer (or floating-point) physical
    /// registers, for the free-list conservation invariant checks.
    pub fn free_count(&self, is_fp: bool) -> usize {
        if is_fp {
            self.fp.free.len()
        } else {
            self.int.free.len()
        }
    }

    /// Returns a retired mapping's physical register to its free list, once
    /// the active list confirms the instruction that held it has committed
    /// and nothing in flight still reads it.
    pub fn release(&mut self, phys: PhysReg, is_fp: bool) {
        if is_fp {
            self.fp.release(phys);
        } else {
            self.int.release(phys);
        }
    }

    /// Snapshots rename state for the speculated branch with in-flight
    /// serial `serial`, taken after the branch's own destination rename so a
    /// restore lands exactly on the post-decode map.
    pub fn checkpoint(&mut self, serial: u32) {
        self.checkpoints.push(Checkpoint {
            serial,
            int_map: self.int.map.clone(),
            fp_map: self.fp.map.clone(),
        });
    }

    /// Discards the checkpoint belonging to `serial` without restoring it,
    /// once the branch it guarded resolves correctly. Branches retire in
    /// order, so this is normally the oldest outstanding checkpoint.
    pub fn commit_checkpoint(&mut self, serial: u32) {
        self.checkpoints.retain(|cp| cp.serial != serial);
    }

    /// Restores rename state to the checkpoint taken at branch `serial`,
    /// undoing every speculative rename made since, and discards all younger
    /// checkpoints — the Ibox's misprediction recovery path.
    pub fn restore_checkpoint(&mut self, serial: u32) {
        let Some(pos) = self.checkpoints.iter().position(|cp| cp.serial == serial) else {
            return;
        };
        let cp = self.checkpoints[pos].clone();
        self.int.map = cp.int_map;
        self.fp.map = cp.fp_map;
        self.int.free = Self::complement(&self.int.map, self.int.phys_count);
        self.fp.free = Self::complement(&self.fp.map, self.fp.phys_count);
        self.checkpoints.truncate(pos);
    }

    /// Every physical register not referenced by `map` (and not the zero
    /// register) is free once all older instructions have committed.
    fn complement(map: &[PhysReg], phys_count: usize) -> Vec<PhysReg> {
        let mut in_use = vec![false; phys_count];
        for p in map {
            in_use[p.0 as usize] = true;
        }
        in_use[ZERO_REG] = true;
        (0..phys_count as u16)
            .map(PhysReg)
            .filter(|p| !in_use[p.0 as usize])
            .collect()
    }

    /// Resets both rename files to the identity mapping and discards every
    /// checkpoint. Used at a full flush (exception or load replay), where
    /// every in-flight instruction is squashed and the physical registers
    /// backing the architectural map are reloaded from committed state.
    pub fn reset(&mut self) {
        self.int.reset();
        self.fp.reset();
        self.checkpoints.clear();
    }
}
