//! Ibox: fetch, branch prediction, decode, rename, dispatch, and in-order
//! retirement.
//!
//! Fetch reads up to four instruction words per cycle out of the Icache,
//! following the tournament predictor through branches and the return stack
//! through JSR/RET. Decode resolves each word against the slotting table,
//! renames its registers, and dispatches it into the active list plus the
//! appropriate issue queue. Retirement drains the active list head in
//! program order, committing results, releasing stale physical registers,
//! confirming (or recovering from) branch predictions, and dispatching
//! exceptions into PALcode.

use tracing::{debug, trace};

use crate::common::constants::{INSTRUCTION_SIZE, LINE_SIZE, ZERO_REG};
use crate::common::error::Trap;
use crate::common::{AccessType, VirtAddr};
use crate::config::Config;
use crate::core::pipeline::active_list::{ActiveList, ActiveListTag, EntryState};
use crate::core::pipeline::issue_queue::{IssueQueue, Operand};
use crate::core::pipeline::rename::{PhysReg, RenameUnit};
use crate::core::units::bru::{BranchPredictor, BranchPredictorWrapper};
use crate::core::units::cache::{CacheSim, LineState};
use crate::core::units::cbox::queues::{MafAdd, MafRequester, MafType};
use crate::isa::instruction::{Decoded, Format, decode};
use crate::isa::slot::{self, OpClass, Queue, RegUse};
use crate::isa::{function_codes::fltl, opcodes};

use super::Cpu;

/// Instructions retired per cycle at most (the 21264 sustains up to eight
/// in bursts; four matches the rename width and keeps the window moving).
const RETIRE_WIDTH: usize = 8;

/// Ibox state: the fetch front-end and the in-flight bookkeeping.
pub struct Ibox {
    /// Instruction cache (presence/state; instruction bytes come from the
    /// coherent memory image).
    pub icache: CacheSim,
    /// Tournament predictor with BTB and return address stack.
    pub bpred: BranchPredictorWrapper,
    /// Physical register rename state.
    pub rename: RenameUnit,
    /// In-flight instruction window.
    pub active: ActiveList,
    /// Integer issue queue.
    pub iq: IssueQueue,
    /// Floating-point issue queue.
    pub fq: IssueQueue,
    /// Integer physical register file values.
    pub prf_int: Vec<u64>,
    /// Integer PRF ready bits (false while a producer is in flight).
    pub prf_int_ready: Vec<bool>,
    /// Floating-point physical register file values.
    pub prf_fp: Vec<u64>,
    /// Floating-point PRF ready bits.
    pub prf_fp_ready: Vec<bool>,
    /// Line address the fetch front-end is stalled on awaiting an Istream
    /// fill, if any.
    pub fetch_stall: Option<u64>,
    /// Fetch/rename width per cycle.
    pub width: usize,
}

impl Ibox {
    /// Builds the Ibox from the configuration.
    pub fn new(config: &Config) -> Self {
        let int_regs = config.registers.int_phys_regs;
        let fp_regs = config.registers.fp_phys_regs;
        Self {
            icache: CacheSim::new(&config.cache.icache),
            bpred: BranchPredictorWrapper::new(config),
            rename: RenameUnit::new(),
            active: ActiveList::new(int_regs),
            iq: IssueQueue::new(config.queues.iq_depth),
            fq: IssueQueue::new(config.queues.fq_depth),
            prf_int: vec![0; int_regs],
            prf_int_ready: vec![true; int_regs],
            prf_fp: vec![0; fp_regs],
            prf_fp_ready: vec![true; fp_regs],
            fetch_stall: None,
            width: crate::common::constants::PIPELINE_WIDTH,
        }
    }

    /// Installs a 16-instruction block's line into the Icache, releasing a
    /// fetch stall waiting on it. The block contents live in the coherent
    /// memory image; the Icache tracks presence.
    pub fn install_icache_block(&mut self, pa: u64, _block: &[u32; 16]) {
        let line = pa & !(LINE_SIZE - 1);
        let _ = self.icache.install(line, LineState::Shared);
        if self.fetch_stall == Some(line) {
            self.fetch_stall = None;
        }
    }
}

/// What `dispatch_one` decided.
enum DispatchOutcome {
    /// Instruction entered the window; fetch continues at `next_pc`.
    Dispatched { next_pc: u64 },
    /// A structural resource is full; retry next cycle.
    Stall,
}

impl Cpu {
    /// Reads an operand through the rename map: a ready physical register
    /// yields its value, an in-flight producer yields a pending marker.
    fn read_operand(&self, arch: usize, fp: bool) -> Operand {
        let phys = self.ibox.rename.rename_source(arch, fp);
        let idx = phys.0 as usize;
        if fp {
            if self.ibox.prf_fp_ready[idx] {
                Operand::Ready(self.ibox.prf_fp[idx])
            } else {
                Operand::PendingFp(phys)
            }
        } else if self.ibox.prf_int_ready[idx] {
            Operand::Ready(self.ibox.prf_int[idx])
        } else {
            Operand::PendingInt(phys)
        }
    }

    /// Writes a physical register and broadcasts the result to both issue
    /// queues' wakeup networks.
    pub(crate) fn write_prf(&mut self, dest: Option<PhysReg>, fp: bool, value: u64) {
        let Some(phys) = dest else {
            return;
        };
        let idx = phys.0 as usize;
        if fp {
            self.ibox.prf_fp[idx] = value;
            self.ibox.prf_fp_ready[idx] = true;
        } else {
            self.ibox.prf_int[idx] = value;
            self.ibox.prf_int_ready[idx] = true;
        }
        self.ibox.iq.wakeup(phys, fp, value);
        self.ibox.fq.wakeup(phys, fp, value);
    }

    /// Fetch stage: read up to `width` words at the PC, decode, rename, and
    /// dispatch them. Stops the group at a predicted-taken branch, a line
    /// boundary, or the first structural stall.
    pub(crate) fn fetch_tick(&mut self) {
        if self.ibox.fetch_stall.is_some() {
            self.stats.stalls_mem += 1;
            return;
        }

        let tr = self.mmu.translate(
            VirtAddr::new(self.pc),
            AccessType::Fetch,
            self.pal_mode,
            self.ipr.itb_asn,
            self.ipr.spe(),
        );
        if let Some(trap) = tr.trap {
            // A front-end fault is precise: it dispatches only once every
            // older instruction has drained.
            if self.ibox.active.is_empty() {
                let pc = self.pc;
                self.pal_entry(&trap, pc);
            }
            return;
        }
        let line_pa = tr.paddr.val() & !(LINE_SIZE - 1);

        if !self.ibox.icache.access(line_pa, false) {
            self.stats.icache_misses += 1;
            match self.cbox.add_maf(
                MafType::Istream,
                line_pa,
                u64::MAX,
                MafRequester::Istream,
                false,
                0,
            ) {
                MafAdd::Full => {}
                _ => self.ibox.fetch_stall = Some(line_pa),
            }
            return;
        }
        self.stats.icache_hits += 1;

        let mut pa = tr.paddr.val();
        for _ in 0..self.ibox.width {
            let pc = self.pc;
            let mut word_bytes = [0u8; 4];
            self.cbox.read_mem(pa, &mut word_bytes);
            let decoded = decode(u32::from_le_bytes(word_bytes));
            trace!(pc, raw = decoded.raw, opcode = decoded.opcode, "fetch");

            match self.dispatch_one(pc, decoded) {
                DispatchOutcome::Stall => break,
                DispatchOutcome::Dispatched { next_pc } => {
                    self.pc = next_pc;
                    if next_pc != pc + INSTRUCTION_SIZE {
                        break; // redirected: restart the fetch group
                    }
                    pa += INSTRUCTION_SIZE;
                    if pa & (LINE_SIZE - 1) == 0 {
                        break; // crossed into the next Icache line
                    }
                }
            }
        }
    }

    /// Decodes, renames, and dispatches one instruction.
    fn dispatch_one(&mut self, pc: u64, decoded: Decoded) -> DispatchOutcome {
        let slot = slot::slot(decoded.opcode);

        if self.ibox.active.is_full() {
            return DispatchOutcome::Stall;
        }
        let queue_full = match slot.queue {
            Queue::Iq => self.ibox.iq.is_full(),
            Queue::Fq => self.ibox.fq.is_full(),
        };
        if queue_full {
            return DispatchOutcome::Stall;
        }
        match slot.class {
            OpClass::Load | OpClass::FpLoad if self.mbox.lq.is_full() => {
                return DispatchOutcome::Stall;
            }
            OpClass::Store | OpClass::FpStore if self.mbox.sq.is_full() => {
                return DispatchOutcome::Stall;
            }
            _ => {}
        }

        // Reserved opcodes and privileged ops outside PAL mode still enter
        // the window so the fault dispatches precisely, in order.
        let illegal = slot.class == OpClass::Reserved
            || (slot.class == OpClass::HwPal && !self.pal_mode);
        if illegal {
            let Some(tag) =
                self.ibox
                    .active
                    .dispatch(pc, &decoded, ZERO_REG, false, None, None, pc + 4)
            else {
                return DispatchOutcome::Stall;
            };
            self.ibox.active.fault(tag, Trap::ReservedOpcode(decoded.raw));
            return DispatchOutcome::Dispatched { next_pc: pc + 4 };
        }

        // Destination register: Rc for operate formats, Ra everywhere else.
        let (dest_use, dest_arch) = if decoded.format == Format::Operate {
            (slot.rc, decoded.rc)
        } else {
            (slot.ra, decoded.ra)
        };
        let (has_dest, dest_fp) = match dest_use {
            RegUse::DestInt => (dest_arch != ZERO_REG, false),
            RegUse::DestFp => (dest_arch != ZERO_REG, true),
            _ => (false, false),
        };
        if !self.ibox.rename.can_allocate(has_dest && !dest_fp, has_dest && dest_fp) {
            return DispatchOutcome::Stall;
        }

        let store_conditional =
            matches!(decoded.opcode, opcodes::STL_C | opcodes::STQ_C);

        // Source operands are read through the pre-rename map.
        let op_a = match slot.ra {
            RegUse::SrcInt => self.read_operand(decoded.ra, false),
            RegUse::SrcFp => self.read_operand(decoded.ra, true),
            RegUse::DestInt if store_conditional => self.read_operand(decoded.ra, false),
            _ => Operand::Ready(0),
        };
        let op_b = if decoded.literal_mode {
            Operand::Ready(u64::from(decoded.literal))
        } else {
            match slot.rb {
                RegUse::SrcInt => self.read_operand(decoded.rb, false),
                RegUse::SrcFp => self.read_operand(decoded.rb, true),
                _ => Operand::Ready(0),
            }
        };
        let op_c = if slot::reads_old_dest(decoded.opcode, decoded.function)
            && !store_conditional
        {
            self.read_operand(dest_arch, dest_fp)
        } else {
            Operand::Ready(0)
        };

        // Rename the destination after every source read.
        let (new_phys, stale_phys) = if has_dest {
            match self.ibox.rename.rename_dest(dest_arch, dest_fp) {
                Some((new, old)) => {
                    if dest_fp {
                        self.ibox.prf_fp_ready[new.0 as usize] = false;
                    } else {
                        self.ibox.prf_int_ready[new.0 as usize] = false;
                    }
                    (Some(new), Some(old))
                }
                None => (None, None),
            }
        } else {
            (None, None)
        };

        let predicted_next = self.predict_next(pc, &decoded, slot.class);

        let Some(tag) = self.ibox.active.dispatch(
            pc,
            &decoded,
            dest_arch,
            dest_fp,
            new_phys,
            stale_phys,
            predicted_next,
        ) else {
            // Window fullness was checked above; treat a refusal as a stall
            // and revert the speculative rename.
            if let (Some(new), Some(old)) = (new_phys, stale_phys) {
                self.ibox.rename.undo_dest(dest_arch, dest_fp, new, old);
            }
            return DispatchOutcome::Stall;
        };

        let is_control = matches!(
            slot.class,
            OpClass::Branch | OpClass::FpBranch | OpClass::Jump
        );
        if is_control {
            self.ibox.rename.checkpoint(tag.0);
        }

        match slot.class {
            OpClass::Load | OpClass::FpLoad => {
                let _ = self.mbox.lq.allocate(tag);
            }
            OpClass::Store | OpClass::FpStore => {
                let _ = self.mbox.sq.allocate(tag);
            }
            _ => {}
        }

        let pipe = match decoded.opcode {
            opcodes::ITFP | opcodes::FLTV | opcodes::FLTI | opcodes::FLTL => {
                slot::fp_pipe(decoded.opcode, decoded.function)
            }
            opcodes::HW_MFPR | opcodes::HW_MTPR => slot::ipr_pipe(decoded.raw & 0xFF),
            _ => slot.pipe,
        };
        let inserted = match slot.queue {
            Queue::Iq => self
                .ibox
                .iq
                .insert(tag, pc, decoded, op_a, op_b, op_c, new_phys, pipe),
            Queue::Fq => self
                .ibox
                .fq
                .insert(tag, pc, decoded, op_a, op_b, op_c, new_phys, pipe),
        };
        debug_assert!(inserted, "queue fullness checked before dispatch");

        DispatchOutcome::Dispatched {
            next_pc: predicted_next,
        }
    }

    /// Predicts the next fetch PC for a just-decoded instruction, training
    /// the return stack on calls and returns.
    fn predict_next(&mut self, pc: u64, decoded: &Decoded, class: OpClass) -> u64 {
        let sequential = pc + INSTRUCTION_SIZE;
        match class {
            OpClass::Branch | OpClass::FpBranch => {
                let target = (pc + 4).wrapping_add_signed(decoded.branch_disp);
                let taken = match decoded.opcode {
                    opcodes::BR | opcodes::BSR => true,
                    _ => self.ibox.bpred.predict_branch(pc).0,
                };
                if decoded.opcode == opcodes::BSR {
                    self.ibox.bpred.link_subroutine(pc, sequential, target);
                }
                if taken { target } else { sequential }
            }
            OpClass::Jump => {
                // The hint field distinguishes jump, subroutine call,
                // return, and coroutine linkage.
                match (decoded.raw >> 14) & 0x3 {
                    2 | 3 => {
                        let target = self.ibox.bpred.predict_return();
                        self.ibox.bpred.pop_return();
                        target.unwrap_or(sequential)
                    }
                    1 => {
                        let target =
                            self.ibox.bpred.predict_target(pc).unwrap_or(sequential);
                        self.ibox.bpred.link_subroutine(pc, sequential, target);
                        target
                    }
                    _ => self.ibox.bpred.predict_target(pc).unwrap_or(sequential),
                }
            }
            _ => sequential,
        }
    }

    /// Retirement stage: drain completed instructions from the head of the
    /// active list, in program order.
    pub(crate) fn retire_tick(&mut self) {
        // An external interrupt is delivered at the retirement boundary,
        // before the next instruction commits.
        if !self.pal_mode {
            if let Some(bits) = self.cbox.take_posted_irq() {
                self.ipr.sirr |= bits;
                let resume_pc = self
                    .ibox
                    .active
                    .peek_head()
                    .map_or(self.pc, |e| e.pc);
                debug!(irq = bits, resume_pc, "interrupt delivery");
                self.pal_entry(&Trap::Interrupt, resume_pc);
                return;
            }
        }

        for _ in 0..RETIRE_WIDTH {
            let Some(head) = self.ibox.active.peek_head() else {
                break;
            };
            if head.state == EntryState::Issued {
                break;
            }
            let Some(entry) = self.ibox.active.retire_head() else {
                break;
            };
            self.note_retirement();
            self.stats.instructions_retired += 1;

            if entry.state == EntryState::Faulted {
                // The faulting instruction commits nothing except its FPCR
                // status bits, which the trap handler reads.
                self.fpcr |= entry.fpcr_flags;
                let trap = entry.trap.clone().unwrap_or(Trap::ReservedOpcode(entry.raw));
                self.pal_entry(&trap, entry.pc);
                return;
            }

            if entry.replay {
                debug!(pc = entry.pc, "load-order replay");
                self.stats.stalls_control += 1;
                self.full_flush();
                self.pc = entry.pc;
                return;
            }

            if self.commit_entry(&entry) {
                return; // control flow redirected; younger state flushed
            }
        }
    }

    /// Commits one retired instruction's architectural effects. Returns
    /// true when retirement must stop because the pipeline was redirected.
    fn commit_entry(&mut self, entry: &crate::core::pipeline::active_list::ActiveListEntry) -> bool {
        let decoded = decode(entry.raw);
        let slot = slot::slot(decoded.opcode);

        if entry.new_phys.is_some() {
            if entry.dest_is_fp {
                self.regs.write_f(entry.arch_dest, entry.result);
            } else {
                self.regs.write(entry.arch_dest, entry.result);
            }
        }
        if let Some(stale) = entry.stale_phys {
            self.ibox.rename.release(stale, entry.dest_is_fp);
        }

        if entry.fpcr_flags != 0 {
            self.fpcr |= entry.fpcr_flags;
        }
        if decoded.opcode == opcodes::FLTL && decoded.function == fltl::MT_FPCR {
            self.fpcr = entry.result;
        }
        if let Some(update) = entry.ipr_update {
            self.apply_ipr_write(update.addr, update.new_val);
        }

        self.count_retired(slot.class);

        match slot.class {
            OpClass::Load | OpClass::FpLoad => {
                self.mbox.lq.release(entry.tag);
                false
            }
            OpClass::Store | OpClass::FpStore => {
                self.retire_store(entry, &decoded);
                false
            }
            OpClass::Branch | OpClass::FpBranch | OpClass::Jump => {
                self.retire_control(entry)
            }
            OpClass::Pal => self.retire_call_pal(entry, &decoded),
            OpClass::HwPal => {
                if decoded.opcode == opcodes::HW_RET {
                    self.pal_mode = entry.actual_next & 1 != 0;
                    let target = entry.actual_next & !0x3;
                    self.recover_to(entry.tag, target);
                    return true;
                }
                if decoded.opcode == opcodes::HW_ST {
                    let data = entry.result.to_le_bytes();
                    self.cbox.write_through(entry.mem_addr, &data);
                }
                false
            }
            _ => false,
        }
    }

    fn retire_store(&mut self, entry: &crate::core::pipeline::active_list::ActiveListEntry, decoded: &Decoded) {
        let store_conditional =
            matches!(decoded.opcode, opcodes::STL_C | opcodes::STQ_C);
        if store_conditional && entry.result == 0 {
            // Failed store-conditional: the entry never reaches memory.
            self.mbox.sq.cancel(entry.tag);
            return;
        }
        // Speculative load-ordering check: a younger load that already
        // completed against this store's bytes read stale data.
        if let Some((addr, len)) = self.mbox.sq.resolved_address(entry.tag) {
            if let Some(victim) = self.mbox.lq.replay_candidate(addr, len, entry.tag) {
                self.ibox.active.flag_replay(victim);
            }
        }
        self.mbox.sq.retire(entry.tag);
    }

    fn retire_control(&mut self, entry: &crate::core::pipeline::active_list::ActiveListEntry) -> bool {
        let actual = if entry.actual_next == 0 {
            entry.pc + INSTRUCTION_SIZE
        } else {
            entry.actual_next
        };
        let taken = actual != entry.pc + INSTRUCTION_SIZE;
        self.ibox
            .bpred
            .update_branch(entry.pc, taken, taken.then_some(actual));

        if actual == entry.predicted_next {
            self.stats.branch_predictions += 1;
            self.ibox.rename.commit_checkpoint(entry.tag.0);
            return false;
        }
        self.stats.branch_mispredictions += 1;
        debug!(
            pc = entry.pc,
            predicted = entry.predicted_next,
            actual,
            "branch mispredict"
        );
        self.ibox.rename.restore_checkpoint(entry.tag.0);
        self.recover_to(entry.tag, actual);
        true
    }

    fn retire_call_pal(
        &mut self,
        entry: &crate::core::pipeline::active_list::ActiveListEntry,
        decoded: &Decoded,
    ) -> bool {
        if decoded.pal_function == 0 {
            // CALL_PAL 0 is the console halt entry; surface the exit value.
            self.halted = Some(self.regs.read(0));
            return true;
        }
        self.enter_call_pal(entry.pc, decoded.pal_function);
        true
    }

    /// Flushes everything younger than `tag` (which has just retired) and
    /// restarts fetch at `target`. Rename state is assumed already restored
    /// (checkpoint) or about to be reset by the caller.
    pub(crate) fn recover_to(&mut self, _tag: ActiveListTag, target: u64) {
        // At the retirement boundary everything still in flight is younger
        // than the retiring instruction.
        self.ibox.active.flush_all();
        self.ibox.iq.flush();
        self.ibox.fq.flush();
        self.mbox.lq.flush();
        self.mbox.sq.flush_speculative();
        self.mbox.clear_pending();
        self.ibox.fetch_stall = None;
        self.pc = target;
    }

    /// Full pipeline flush with rename reset to committed architectural
    /// state: exceptions, replays, and PAL entries.
    pub(crate) fn full_flush(&mut self) {
        self.ibox.active.flush_all();
        self.ibox.iq.flush();
        self.ibox.fq.flush();
        self.mbox.lq.flush();
        self.mbox.sq.flush_speculative();
        self.mbox.clear_pending();
        self.ibox.fetch_stall = None;
        self.ibox.rename.reset();
        // The identity mapping backs each architectural register with the
        // physical register of the same index; reload those from committed
        // state and mark everything ready.
        for i in 0..crate::common::constants::ARCH_REGS {
            self.ibox.prf_int[i] = self.regs.read(i);
            self.ibox.prf_fp[i] = self.regs.read_f(i);
        }
        for r in &mut self.ibox.prf_int_ready {
            *r = true;
        }
        for r in &mut self.ibox.prf_fp_ready {
            *r = true;
        }
    }

    fn count_retired(&mut self, class: OpClass) {
        match class {
            OpClass::Load => self.stats.inst_load += 1,
            OpClass::Store => self.stats.inst_store += 1,
            OpClass::FpLoad => self.stats.inst_fp_load += 1,
            OpClass::FpStore => self.stats.inst_fp_store += 1,
            OpClass::Branch | OpClass::FpBranch | OpClass::Jump => {
                self.stats.inst_branch += 1;
            }
            OpClass::Pal => self.stats.inst_pal += 1,
            OpClass::FpOp => self.stats.inst_fp_arith += 1,
            _ => self.stats.inst_integer += 1,
        }
    }
}
