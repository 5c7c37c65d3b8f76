//! Translation buffers: ASN matching, global entries, fault bits, and the
//! PAL-visible invalidates.

use axp21264_core::common::constants::{PAGE_SHIFT, VPN_MASK};
use axp21264_core::common::{AccessType, Trap, VirtAddr};
use axp21264_core::core::units::mmu::Mmu;

fn vpn(va: u64) -> u64 {
    (va >> PAGE_SHIFT) & VPN_MASK
}

#[test]
fn pal_mode_bypasses_translation_entirely() {
    let mut mmu = Mmu::new(128);
    let r = mmu.translate(VirtAddr::new(0xDEAD_0000), AccessType::Read, true, 0, 0);
    assert!(r.trap.is_none());
    assert_eq!(r.paddr.val(), 0xDEAD_0000);
}

#[test]
fn miss_raises_the_tb_miss_fault_for_pal_to_fill() {
    let mut mmu = Mmu::new(128);
    let r = mmu.translate(VirtAddr::new(0x8000), AccessType::Read, false, 0, 0);
    assert_eq!(r.trap, Some(Trap::TBMissFault(0x8000)));
}

#[test]
fn filled_translation_composes_ppn_and_page_offset() {
    let mut mmu = Mmu::new(128);
    mmu.dtb.fill(vpn(0x8000), 0x123, 0, false, false, false, false);
    let r = mmu.translate(VirtAddr::new(0x8008), AccessType::Read, false, 0, 0);
    assert_eq!(r.paddr.val(), (0x123 << PAGE_SHIFT) | 0x8);
}

#[test]
fn asn_mismatch_misses_unless_the_entry_is_global() {
    let mut mmu = Mmu::new(128);
    mmu.dtb.fill(vpn(0x8000), 0x1, 7, false, false, false, false);
    assert!(
        mmu.translate(VirtAddr::new(0x8000), AccessType::Read, false, 8, 0)
            .trap
            .is_some()
    );

    mmu.dtb.fill(vpn(0xA000), 0x2, 7, true, false, false, false);
    assert!(
        mmu.translate(VirtAddr::new(0xA000), AccessType::Read, false, 8, 0)
            .trap
            .is_none()
    );
}

#[test]
fn fault_bits_select_by_access_type() {
    let mut mmu = Mmu::new(128);
    // fault-on-write set: reads pass, writes fault.
    mmu.dtb.fill(vpn(0x8000), 0x1, 0, false, false, true, false);
    assert!(
        mmu.translate(VirtAddr::new(0x8000), AccessType::Read, false, 0, 0)
            .trap
            .is_none()
    );
    assert_eq!(
        mmu.translate(VirtAddr::new(0x8000), AccessType::Write, false, 0, 0)
            .trap,
        Some(Trap::FaultOnWrite(0x8000))
    );
}

#[test]
fn fetches_translate_through_the_itb_not_the_dtb() {
    let mut mmu = Mmu::new(128);
    mmu.dtb.fill(vpn(0x8000), 0x1, 0, false, false, false, false);
    // Same page is absent from the ITB: fetch faults while reads pass.
    assert!(
        mmu.translate(VirtAddr::new(0x8000), AccessType::Fetch, false, 0, 0)
            .trap
            .is_some()
    );
}

#[test]
fn super_page_window_bypasses_the_buffers_when_enabled() {
    let mut mmu = Mmu::new(128);
    // VA bits 47:46 = 10 selects the window; SPE<2> enables it.
    let va = (0b10u64 << 46) | 0x1234;
    let r = mmu.translate(VirtAddr::new(va), AccessType::Read, false, 0, 0b100);
    assert!(r.trap.is_none());
    assert_eq!(r.paddr.val(), 0x1234);
    // With the enable clear, the same address takes a TB miss.
    let r = mmu.translate(VirtAddr::new(va), AccessType::Read, false, 0, 0);
    assert_eq!(r.trap, Some(Trap::TBMissFault(va)));
}

#[test]
fn single_entry_invalidate_clears_only_its_page() {
    let mut mmu = Mmu::new(128);
    mmu.dtb.fill(vpn(0x8000), 0x1, 0, false, false, false, false);
    mmu.dtb.fill(vpn(0xA000), 0x2, 0, false, false, false, false);
    mmu.dtb.flush_single(vpn(0x8000));
    assert!(mmu.dtb.lookup(vpn(0x8000), 0).is_none());
    assert!(mmu.dtb.lookup(vpn(0xA000), 0).is_some());
}
