//! PALcode entry and IPR write side effects.
//!
//! Exceptions dispatch at retirement: the faulting PC lands in `EXC_ADDR`,
//! the cause bits in `EXC_SUM`, the whole speculative window flushes, and
//! fetch resumes at `PAL_BASE` plus the exception's fixed vector offset
//! with the PALmode flag set. `CALL_PAL` follows the same path through its
//! own entry region, and `HW_MTPR` writes — applied only at retirement —
//! carry the translation-buffer maintenance side effects.

use tracing::debug;

use crate::common::constants::{PAGE_SHIFT, VPN_MASK};
use crate::common::error::Trap;
use crate::core::arch::ipr;

use super::Cpu;

/// `EXC_SUM` cause bits, one per exception class.
mod exc_sum {
    pub const ARITH: u64 = 1 << 0;
    pub const ILLEGAL_OPERAND: u64 = 1 << 1;
    pub const FAULT_ON_READ: u64 = 1 << 2;
    pub const FAULT_ON_WRITE: u64 = 1 << 3;
    pub const FAULT_ON_EXECUTE: u64 = 1 << 4;
    pub const TB_MISS: u64 = 1 << 5;
    pub const UNALIGNED: u64 = 1 << 6;
    pub const OPCDEC: u64 = 1 << 7;
    pub const INTERRUPT: u64 = 1 << 8;
}

/// Base offset of the `CALL_PAL` entry region within the PALcode image.
const CALL_PAL_BASE: u64 = 0x2000;

impl Cpu {
    /// Dispatches an exception into PALcode: records the cause, flushes the
    /// speculative window, and redirects fetch to the vector.
    pub(crate) fn pal_entry(&mut self, trap: &Trap, faulting_pc: u64) {
        self.stats.traps_taken += 1;
        // EXC_ADDR<0> records the interrupted context's PALmode flag, which
        // HW_RET restores on the way out.
        self.ipr.exc_addr = faulting_pc | u64::from(self.pal_mode);
        self.ipr.exc_sum = match trap {
            Trap::ArithmeticTraps => exc_sum::ARITH,
            Trap::IllegalOperand => exc_sum::ILLEGAL_OPERAND,
            Trap::FaultOnRead(_) => exc_sum::FAULT_ON_READ,
            Trap::FaultOnWrite(_) => exc_sum::FAULT_ON_WRITE,
            Trap::FaultOnExecute(_) => exc_sum::FAULT_ON_EXECUTE,
            Trap::TBMissFault(_) => exc_sum::TB_MISS,
            Trap::UnalignedAccess(_) => exc_sum::UNALIGNED,
            Trap::ReservedOpcode(_) => exc_sum::OPCDEC,
            Trap::Interrupt => exc_sum::INTERRUPT,
        };
        match trap {
            Trap::FaultOnRead(va)
            | Trap::FaultOnWrite(va)
            | Trap::FaultOnExecute(va)
            | Trap::TBMissFault(va)
            | Trap::UnalignedAccess(va) => self.ipr.va = *va,
            _ => {}
        }
        debug!(?trap, faulting_pc, "pal entry");

        self.full_flush();
        self.pc = self.ipr.pal_base + trap.pal_offset();
        self.pal_mode = true;
    }

    /// `CALL_PAL` entry: the instruction commits, the return PC lands in
    /// `EXC_ADDR`, and fetch continues at the function's entry point.
    pub(crate) fn enter_call_pal(&mut self, pc: u64, function: u32) {
        self.stats.traps_taken += 1;
        self.ipr.exc_addr = (pc + 4) | u64::from(self.pal_mode);
        self.full_flush();
        self.pc = self.ipr.pal_base + CALL_PAL_BASE + (u64::from(function & 0xFF) << 6);
        self.pal_mode = true;
        debug!(function, entry = self.pc, "call_pal");
    }

    /// Applies a retired `HW_MTPR`, including the translation-buffer
    /// maintenance behavior of the invalidate and fill pseudo-registers.
    pub(crate) fn apply_ipr_write(&mut self, addr: u32, value: u64) {
        match addr {
            ipr::ITB_IA => self.mmu.itb.flush_all(),
            ipr::DTB_IA => self.mmu.dtb.flush_all(),
            ipr::ITB_IS => {
                let vpn = (value >> PAGE_SHIFT) & VPN_MASK;
                self.mmu.itb.flush_single(vpn);
            }
            ipr::DTB_IS => {
                let vpn = (value >> PAGE_SHIFT) & VPN_MASK;
                self.mmu.dtb.flush_single(vpn);
            }
            // Writing the PTE half installs the latched tag/PTE pair, the
            // way PALcode finishes a software TB fill.
            ipr::DTB_PTE => {
                let vpn = (self.ipr.dtb_tag >> PAGE_SHIFT) & VPN_MASK;
                let pte = PteFields::from_raw(value);
                self.mmu.dtb.fill(
                    vpn,
                    pte.pfn,
                    self.ipr.dtb_asn,
                    pte.asm,
                    pte.fault_on_read,
                    pte.fault_on_write,
                    false,
                );
            }
            ipr::ITB_PTE => {
                let vpn = (self.ipr.itb_tag >> PAGE_SHIFT) & VPN_MASK;
                let pte = PteFields::from_raw(value);
                self.mmu.itb.fill(
                    vpn,
                    pte.pfn,
                    self.ipr.itb_asn,
                    pte.asm,
                    false,
                    false,
                    pte.fault_on_execute,
                );
            }
            _ => self.ipr.write(addr, value),
        }
    }
}

/// Decoded page-table-entry fields, laid out as the Alpha PTE: the page
/// frame number in the upper longword, fault and address-space-match bits
/// in the low byte.
struct PteFields {
    pfn: u64,
    asm: bool,
    fault_on_read: bool,
    fault_on_write: bool,
    fault_on_execute: bool,
}

impl PteFields {
    fn from_raw(value: u64) -> Self {
        Self {
            pfn: value >> 32,
            fault_on_read: value & (1 << 1) != 0,
            fault_on_write: value & (1 << 2) != 0,
            fault_on_execute: value & (1 << 3) != 0,
            asm: value & (1 << 4) != 0,
        }
    }
}

