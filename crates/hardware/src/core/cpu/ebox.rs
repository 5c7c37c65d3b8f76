//! Ebox and Fbox: issue arbitration and execute dispatch.
//!
//! Each cycle, four integer arbiters (lower clusters L0/L1, upper clusters
//! U0/U1) and three floating-point arbiters (add, multiply, other) each
//! select the oldest ready instruction requesting their pipe. The
//! preference rules fall out of the arbitration order: a lower-cluster
//! instruction lands in L0 when both lowers are free because L0 arbitrates
//! first, and an upper-cluster instruction lands in U1 for the same reason.
//!
//! Execute handlers are dispatched by opcode class. Arithmetic results go
//! straight to the physical register file and the wakeup networks; loads
//! and stores hand off to the Mbox; branches record their resolved target
//! for retirement to confirm against the prediction.

use crate::common::error::Trap;
use crate::core::pipeline::active_list::IprUpdate;
use crate::core::pipeline::issue_queue::IssuedOp;
use crate::isa::execute::{ExecResult, execute_integer};
use crate::isa::instruction::Decoded;
use crate::isa::slot::{self, OpClass, Pipe};
use crate::isa::{fp, function_codes::fltl, opcodes};

use super::Cpu;

impl Cpu {
    /// One execute cycle: run every arbitration winner.
    pub(crate) fn execute_tick(&mut self) {
        let mut issued: Vec<IssuedOp> = Vec::with_capacity(7);

        // Integer lower clusters: L0 arbitrates before L1.
        if let Some(op) = self.ibox.iq.select(|p| matches!(p, Pipe::Lower | Pipe::Lower0)) {
            issued.push(op);
        }
        if let Some(op) = self.ibox.iq.select(|p| matches!(p, Pipe::Lower | Pipe::Lower1)) {
            issued.push(op);
        }
        // Integer upper clusters: U1 arbitrates before U0.
        if let Some(op) = self.ibox.iq.select(|p| p == Pipe::Upper) {
            issued.push(op);
        }
        if let Some(op) = self.ibox.iq.select(|p| p == Pipe::Upper) {
            issued.push(op);
        }
        // Floating-point pipes.
        if let Some(op) = self.ibox.fq.select(|p| p == Pipe::FpAdd) {
            issued.push(op);
        }
        if let Some(op) = self.ibox.fq.select(|p| p == Pipe::FpMul) {
            issued.push(op);
        }
        if let Some(op) = self.ibox.fq.select(|p| p == Pipe::FpOther) {
            issued.push(op);
        }

        for op in issued {
            self.execute_op(&op);
        }
    }

    fn execute_op(&mut self, op: &IssuedOp) {
        let class = slot::slot(op.decoded.opcode).class;
        match class {
            OpClass::IntOp => self.exec_int_operate(op),
            OpClass::FpOp => self.exec_fp_operate(op),
            OpClass::Load => self.exec_load_class(op, false),
            OpClass::FpLoad => self.exec_load_class(op, true),
            // The VAX floating stores sit outside the implemented subset.
            OpClass::FpStore
                if matches!(op.decoded.opcode, opcodes::STF | opcodes::STG) =>
            {
                self.ibox
                    .active
                    .fault(op.tag, Trap::ReservedOpcode(op.decoded.raw));
            }
            OpClass::Store | OpClass::FpStore => self.execute_store(op),
            OpClass::Branch | OpClass::FpBranch => self.exec_branch(op),
            OpClass::Jump => self.exec_jump(op),
            OpClass::Misc => self.exec_misc(op),
            OpClass::Pal => {
                // All of CALL_PAL's work happens at retirement.
                self.ibox.active.complete(op.tag, 0);
            }
            OpClass::HwPal => self.exec_hw_pal(op),
            OpClass::Reserved => {
                self.ibox
                    .active
                    .fault(op.tag, Trap::ReservedOpcode(op.decoded.raw));
            }
        }
    }

    fn exec_int_operate(&mut self, op: &IssuedOp) {
        match execute_integer(&op.decoded, op.a, op.b, op.old_dest) {
            ExecResult::Integer(v) => {
                self.write_prf(op.dest, false, v);
                self.ibox.active.complete(op.tag, v);
            }
            ExecResult::Unimplemented => {
                self.ibox
                    .active
                    .fault(op.tag, Trap::ReservedOpcode(op.decoded.raw));
            }
        }
    }

    fn exec_fp_operate(&mut self, op: &IssuedOp) {
        // The FPCR moves are handled here: they touch Fbox-global state
        // rather than computing a value from their operands.
        if op.decoded.opcode == opcodes::FLTL && op.decoded.function == fltl::MF_FPCR {
            let v = self.fpcr;
            self.write_prf(op.dest, true, v);
            self.ibox.active.complete(op.tag, v);
            return;
        }
        if op.decoded.opcode == opcodes::FLTL && op.decoded.function == fltl::MT_FPCR {
            // The write itself is applied at retirement so a squashed
            // speculative path cannot corrupt the FPCR.
            self.write_prf(op.dest, true, op.a);
            self.ibox.active.complete(op.tag, op.a);
            return;
        }

        let outcome = fp::execute(
            op.decoded.opcode,
            op.decoded.function,
            op.a,
            op.b,
            op.old_dest,
            self.fpcr,
        );
        if outcome.unimplemented {
            self.ibox
                .active
                .fault(op.tag, Trap::ReservedOpcode(op.decoded.raw));
            return;
        }
        if outcome.flags != 0 {
            self.ibox.active.set_fpcr_flags(op.tag, outcome.flags);
        }
        if let Some(trap) = outcome.trap {
            self.ibox.active.fault(op.tag, trap);
            return;
        }
        let value = outcome.bits.unwrap_or(op.old_dest);
        self.write_prf(op.dest, true, value);
        self.ibox.active.complete(op.tag, value);
    }

    fn exec_load_class(&mut self, op: &IssuedOp, fp: bool) {
        match op.decoded.opcode {
            // LDA/LDAH compute an address without touching memory.
            opcodes::LDA => {
                let v = op.b.wrapping_add_signed(op.decoded.mem_disp);
                self.write_prf(op.dest, false, v);
                self.ibox.active.complete(op.tag, v);
            }
            opcodes::LDAH => {
                let v = op.b.wrapping_add_signed(op.decoded.mem_disp << 16);
                self.write_prf(op.dest, false, v);
                self.ibox.active.complete(op.tag, v);
            }
            // The VAX floating loads are outside the implemented subset.
            opcodes::LDF | opcodes::LDG => {
                self.ibox
                    .active
                    .fault(op.tag, Trap::ReservedOpcode(op.decoded.raw));
            }
            _ => self.execute_load(op, fp),
        }
    }

    fn exec_branch(&mut self, op: &IssuedOp) {
        let taken = branch_taken(&op.decoded, op.a);
        let target = (op.pc + 4).wrapping_add_signed(op.decoded.branch_disp);
        let actual = if taken { target } else { op.pc + 4 };
        self.ibox.active.set_actual_next(op.tag, actual);

        // BR/BSR link the return address into Ra.
        let result = if matches!(op.decoded.opcode, opcodes::BR | opcodes::BSR) {
            let ret = op.pc + 4;
            self.write_prf(op.dest, false, ret);
            ret
        } else {
            0
        };
        self.ibox.active.complete(op.tag, result);
    }

    fn exec_jump(&mut self, op: &IssuedOp) {
        let target = op.b & !0x3;
        self.ibox.active.set_actual_next(op.tag, target);
        let ret = op.pc + 4;
        self.write_prf(op.dest, false, ret);
        self.ibox.active.complete(op.tag, ret);
    }

    fn exec_misc(&mut self, op: &IssuedOp) {
        // The MISC group encodes its operation in the displacement field.
        const TRAPB: u32 = 0x0000;
        const EXCB: u32 = 0x0400;
        const MB: u32 = 0x4000;
        const WMB: u32 = 0x4400;
        const FETCH: u32 = 0x8000;
        const FETCH_M: u32 = 0xA000;
        const RPCC: u32 = 0xC000;
        const ECB: u32 = 0xE800;
        const WH64: u32 = 0xF800;

        let function = op.decoded.raw & 0xFFFF;
        let mut result = 0u64;
        match function {
            RPCC => {
                result = self.ipr.cc;
                self.write_prf(op.dest, false, result);
            }
            ECB | WH64 => self.exec_cache_hint(op, function == WH64),
            TRAPB | EXCB | MB | WMB | FETCH | FETCH_M => {
                // Barriers are trivially satisfied: stores drain in order
                // and the tick model exposes no overlap to order against.
            }
            _ => {}
        }
        self.ibox.active.complete(op.tag, result);
    }

    fn exec_hw_pal(&mut self, op: &IssuedOp) {
        let ipr_index = op.decoded.raw & 0xFF;
        match op.decoded.opcode {
            opcodes::HW_MFPR => {
                let v = self.ipr.read(ipr_index);
                self.write_prf(op.dest, false, v);
                self.ibox.active.complete(op.tag, v);
            }
            opcodes::HW_MTPR => {
                self.ibox.active.set_ipr_update(
                    op.tag,
                    IprUpdate {
                        addr: ipr_index,
                        new_val: op.a,
                    },
                );
                self.ibox.active.complete(op.tag, op.a);
            }
            opcodes::HW_LD => {
                // Physical-addressed quadword load, no translation.
                let pa = op.b.wrapping_add_signed(op.decoded.mem_disp);
                let mut buf = [0u8; 8];
                self.cbox.read_mem(pa, &mut buf);
                let v = u64::from_le_bytes(buf);
                self.write_prf(op.dest, false, v);
                self.ibox.active.complete(op.tag, v);
            }
            opcodes::HW_ST => {
                // The write itself is deferred to retirement: stores become
                // visible in program order only.
                let pa = op.b.wrapping_add_signed(op.decoded.mem_disp);
                self.ibox.active.set_mem_addr(op.tag, pa);
                self.ibox.active.complete(op.tag, op.a);
            }
            opcodes::HW_RET => {
                // Bit 0 of the target is the PALmode flag to restore;
                // retirement splits it off.
                self.ibox.active.set_actual_next(op.tag, op.b);
                self.ibox.active.complete(op.tag, 0);
            }
            _ => {
                self.ibox
                    .active
                    .fault(op.tag, Trap::ReservedOpcode(op.decoded.raw));
            }
        }
    }

    /// ECB/WH64: cache-management hints on the address in Rb. Translation
    /// failures are swallowed — a hint never faults.
    fn exec_cache_hint(&mut self, op: &IssuedOp, write_hint: bool) {
        use crate::common::{AccessType, VirtAddr};
        use crate::core::units::cbox::queues::{MafRequester, MafType};

        let va = op.b;
        let tr = self.mmu.translate(
            VirtAddr::new(va),
            AccessType::Read,
            self.pal_mode,
            self.ipr.dtb_asn,
            self.ipr.spe(),
        );
        if tr.trap.is_none() {
            let kind = if write_hint { MafType::Wh64 } else { MafType::Ecb };
            let _ = self.cbox.add_maf(
                kind,
                tr.paddr.val(),
                u64::MAX,
                MafRequester::Store(op.tag.0),
                false,
                0,
            );
        }
    }
}

/// Evaluates a conditional branch's direction from its Ra/Fa value.
fn branch_taken(decoded: &Decoded, a: u64) -> bool {
    let int = a as i64;
    let f = f64::from_bits(a);
    match decoded.opcode {
        opcodes::BR | opcodes::BSR => true,
        opcodes::BEQ => a == 0,
        opcodes::BNE => a != 0,
        opcodes::BLT => int < 0,
        opcodes::BLE => int <= 0,
        opcodes::BGT => int > 0,
        opcodes::BGE => int >= 0,
        opcodes::BLBC => a & 1 == 0,
        opcodes::BLBS => a & 1 == 1,
        opcodes::FBEQ => f == 0.0,
        opcodes::FBNE => f != 0.0,
        opcodes::FBLT => f < 0.0,
        opcodes::FBLE => f <= 0.0,
        opcodes::FBGT => f > 0.0,
        opcodes::FBGE => f >= 0.0,
        _ => false,
    }
}
