//! Alpha AXP Internal Processor Registers (IPRs).
//!
//! This module implements the subset of the 21264's internal processor register
//! block exercised by the rest of the simulator. It provides:
//! 1. **Address Definitions:** Mnemonic constants for each `HW_MFPR`/`HW_MTPR` target.
//! 2. **Field Masks:** Bitmasks and shifts for the `PS` and interrupt-summary fields.
//! 3. **Register Storage:** The `Ipr` struct maintaining IPR state.
//! 4. **Access Logic:** Read/write dispatch mirroring `HW_MFPR`/`HW_MTPR` semantics.

/// Processor status (current mode, IPL, FP enable) IPR address.
pub const PS: u32 = 0x0;
/// Exception address IPR address: PC of the faulting instruction.
pub const EXC_ADDR: u32 = 0x1;
/// Exception summary IPR address: cause bits for the pending exception.
pub const EXC_SUM: u32 = 0x2;
/// Exception mask IPR address: FPCR-derived enable mask at the time of the trap.
pub const EXC_MASK: u32 = 0x3;
/// PAL base IPR address: base physical address of the PALcode image.
pub const PAL_BASE: u32 = 0x4;
/// Interrupt priority level IPR address.
pub const IPL: u32 = 0x5;
/// AST request register IPR address.
pub const ASTRR: u32 = 0x6;
/// AST enable register IPR address.
pub const ASTER: u32 = 0x7;
/// Software interrupt request register IPR address.
pub const SIRR: u32 = 0x8;
/// Integer translation buffer address-space-number IPR address.
pub const DTB_ASN: u32 = 0x9;
/// Instruction translation buffer address-space-number IPR address.
pub const ITB_ASN: u32 = 0xA;
/// Memory-management status IPR address, set on DTB miss/fault.
pub const MM_STAT: u32 = 0xB;
/// Virtual address IPR address: faulting virtual address from the last Mbox trap.
pub const VA: u32 = 0xC;
/// Cycle counter IPR address.
pub const CC: u32 = 0xD;
/// Virtual page table base register IPR address.
pub const VPTB: u32 = 0xE;
/// ITB invalidate-all IPR address (write-only; value ignored).
pub const ITB_IA: u32 = 0xF;
/// DTB invalidate-all IPR address (write-only; value ignored).
pub const DTB_IA: u32 = 0x10;
/// ITB invalidate-single (by VA) IPR address.
pub const ITB_IS: u32 = 0x11;
/// DTB invalidate-single (by VA) IPR address.
pub const DTB_IS: u32 = 0x12;
/// DTB fill tag (faulting VA) IPR address; latched until the PTE write.
pub const DTB_TAG: u32 = 0x13;
/// DTB fill PTE IPR address; writing it installs the tag/PTE pair.
pub const DTB_PTE: u32 = 0x14;
/// ITB fill tag IPR address.
pub const ITB_TAG: u32 = 0x15;
/// ITB fill PTE IPR address; writing it installs the tag/PTE pair.
pub const ITB_PTE: u32 = 0x16;
/// Mbox control IPR address; bits 3:1 hold the super-page enables (SPE).
pub const M_CTL: u32 = 0x17;

/// Current-mode field shift within `PS`.
pub const PS_CM_SHIFT: u64 = 3;
/// Current-mode field mask within `PS`.
pub const PS_CM_MASK: u64 = 0x3;
/// Interrupt priority level field mask within `PS`.
pub const PS_IPL_MASK: u64 = 0x1F;
/// PALmode flag bit: set while executing PALcode, independent of `PS<CM>`.
pub const PS_PALMODE: u64 = 1 << 2;

/// Internal processor register block.
///
/// Contains the subset of the 21264's IPRs that the Ibox, Mbox and PALcode
/// entry path reference. Unlike the architectural `RegisterFile`, IPRs are
/// privileged: ordinary integer/FP instructions never touch them directly,
/// only `HW_MFPR`/`HW_MTPR` (PALcode-only pseudo-ops) and the trap dispatcher.
#[derive(Clone, Debug, Default)]
pub struct Ipr {
    /// Processor status: current mode, IPL and PALmode flag.
    pub ps: u64,
    /// Exception address: PC of the instruction that trapped.
    pub exc_addr: u64,
    /// Exception summary: cause bits for the most recent trap.
    pub exc_sum: u64,
    /// Exception mask: enabled-trap mask captured at trap time.
    pub exc_mask: u64,
    /// Base physical address of the PALcode image.
    pub pal_base: u64,
    /// Current interrupt priority level (0-31).
    pub ipl: u64,
    /// AST request bits, one per mode.
    pub astrr: u64,
    /// AST enable bits, one per mode.
    pub aster: u64,
    /// Software interrupt request bits (IPL 1-15).
    pub sirr: u64,
    /// DTB address space number.
    pub dtb_asn: u64,
    /// ITB address space number.
    pub itb_asn: u64,
    /// Memory management status from the last Mbox fault.
    pub mm_stat: u64,
    /// Faulting virtual address from the last Mbox trap.
    pub va: u64,
    /// Free-running cycle counter.
    pub cc: u64,
    /// Virtual page table base register.
    pub vptb: u64,
    /// Latched DTB fill tag, pending the PTE write.
    pub dtb_tag: u64,
    /// Latched ITB fill tag, pending the PTE write.
    pub itb_tag: u64,
    /// Mbox control: super-page enables in bits 3:1.
    pub m_ctl: u64,
}

impl Ipr {
    /// Creates a new IPR block with architectural reset values (all zero).
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads an IPR by its `HW_MFPR` address.
    ///
    /// Returns 0 for unimplemented addresses; unlike architectural registers
    /// this is a simulator convenience, not an architectural guarantee.
    pub fn read(&self, addr: u32) -> u64 {
        match addr {
            PS => self.ps,
            EXC_ADDR => self.exc_addr,
            EXC_SUM => self.exc_sum,
            EXC_MASK => self.exc_mask,
            PAL_BASE => self.pal_base,
            IPL => self.ipl,
            ASTRR => self.astrr,
            ASTER => self.aster,
            SIRR => self.sirr,
            DTB_ASN => self.dtb_asn,
            ITB_ASN => self.itb_asn,
            MM_STAT => self.mm_stat,
            VA => self.va,
            CC => self.cc,
            VPTB => self.vptb,
            DTB_TAG => self.dtb_tag,
            ITB_TAG => self.itb_tag,
            M_CTL => self.m_ctl,
            _ => 0,
        }
    }

    /// Writes an IPR by its `HW_MTPR` address.
    pub fn write(&mut self, addr: u32, val: u64) {
        match addr {
            PS => self.ps = val,
            EXC_ADDR => self.exc_addr = val,
            EXC_SUM => self.exc_sum = val,
            EXC_MASK => self.exc_mask = val,
            PAL_BASE => self.pal_base = val,
            IPL => self.ipl = val & PS_IPL_MASK,
            ASTRR => self.astrr = val,
            ASTER => self.aster = val,
            SIRR => self.sirr = val,
            DTB_ASN => self.dtb_asn = val,
            ITB_ASN => self.itb_asn = val,
            MM_STAT => self.mm_stat = val,
            VA => self.va = val,
            CC => self.cc = val,
            VPTB => self.vptb = val,
            DTB_TAG => self.dtb_tag = val,
            ITB_TAG => self.itb_tag = val,
            M_CTL => self.m_ctl = val,
            _ => {}
        }
    }

    /// Returns the current mode encoded in `PS<CM>`.
    pub fn current_mode(&self) -> crate::core::arch::mode::PrivilegeMode {
        crate::core::arch::mode::PrivilegeMode::from_u8(
            ((self.ps >> PS_CM_SHIFT) & PS_CM_MASK) as u8,
        )
    }

    /// Returns whether the processor is currently executing PALcode.
    pub fn in_pal_mode(&self) -> bool {
        self.ps & PS_PALMODE != 0
    }

    /// Super-page enable bits (`M_CTL<3:1>`).
    pub fn spe(&self) -> u64 {
        (self.m_ctl >> 1) & 0x7
    }

    /// Returns true if any pending software interrupt bit is at or above the
    /// current IPL, i.e. an interrupt is eligible for delivery.
    pub fn interrupt_pending(&self) -> bool {
        let highest_pending = 63 - (self.sirr.max(1)).leading_zeros() as u64;
        self.sirr != 0 && highest_pending > self.ipl
    }
}
