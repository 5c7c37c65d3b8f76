//! Mbox/Ibox address translation (DTB/ITB).
//!
//! The 21264 has no hardware page-table walker. On a translation-buffer miss
//! the Ibox (for fetches) or Mbox (for loads/stores) raises a fault that
//! vectors into PALcode; PALcode walks the page tables in software and fills
//! the buffer itself via `HW_MTPR` to the tag/PTE IPR pair. This module models
//! only the buffer-lookup half of that story; the fill path is driven by
//! `Cpu` once PALcode dispatch is implemented.

/// Translation buffer (DTB/ITB) storage and lookup.
pub mod tlb;

use crate::common::constants::{PAGE_SHIFT, VPN_MASK};
use crate::common::{AccessType, PhysAddr, TranslationResult, Trap, VirtAddr};

use self::tlb::Tlb;

/// Address translation unit pairing the instruction and data translation
/// buffers, as the 21264 keeps them physically and logically separate.
pub struct Mmu {
    /// Data translation buffer, consulted by the Mbox for loads and stores.
    pub dtb: Tlb,
    /// Instruction translation buffer, consulted by the Ibox for fetches.
    pub itb: Tlb,
}

impl Mmu {
    /// Creates a new translation unit with the given entry count per buffer.
    pub fn new(tb_size: usize) -> Self {
        Self {
            dtb: Tlb::new(tb_size),
            itb: Tlb::new(tb_size),
        }
    }

    /// Translates a virtual address, consulting the DTB for data accesses and
    /// the ITB for fetches.
    ///
    /// PAL mode passes the address through unmodified, as PALcode executes
    /// with physical addressing. Outside PAL mode, super-page windows
    /// enabled by the `SPE` field bypass the translation buffers: with
    /// `SPE<2>` set, a virtual address whose bits 47:46 are `10` maps
    /// directly onto its low 44 physical address bits. A translation-buffer
    /// miss produces `Trap::TBMissFault`, which PALcode's fault handler
    /// resolves by walking the page tables and filling the buffer before
    /// retrying.
    pub fn translate(
        &mut self,
        vaddr: VirtAddr,
        access: AccessType,
        in_pal_mode: bool,
        asn: u64,
        spe: u64,
    ) -> TranslationResult {
        if in_pal_mode {
            return TranslationResult::success(PhysAddr::new(vaddr.val()), 0);
        }

        if spe & 0b100 != 0 && (vaddr.val() >> 46) & 0x3 == 0b10 {
            let pa = vaddr.val() & ((1 << 44) - 1);
            return TranslationResult::success(PhysAddr::new(pa), 0);
        }

        let vpn = (vaddr.val() >> PAGE_SHIFT) & VPN_MASK;
        let buffer = if access == AccessType::Fetch {
            &self.itb
        } else {
            &self.dtb
        };

        let Some(perm) = buffer.lookup(vpn, asn) else {
            return TranslationResult::fault(Trap::TBMissFault(vaddr.val()), 0);
        };

        let denied = match access {
            AccessType::Fetch => perm.fault_on_execute,
            AccessType::Read => perm.fault_on_read,
            AccessType::Write => perm.fault_on_write,
        };
        if denied {
            let trap = match access {
                AccessType::Fetch => Trap::FaultOnExecute(vaddr.val()),
                AccessType::Read => Trap::FaultOnRead(vaddr.val()),
                AccessType::Write => Trap::FaultOnWrite(vaddr.val()),
            };
            return TranslationResult::fault(trap, 0);
        }

        let offset = vaddr.val() & ((1 << PAGE_SHIFT) - 1);
        let paddr = (perm.ppn << PAGE_SHIFT) | offset;
        TranslationResult::success(PhysAddr::new(paddr), 0)
    }
}
