//! IPR block: address dispatch, field masking, and interrupt eligibility.

use axp21264_core::core::arch::ipr::{self, Ipr};
use axp21264_core::core::arch::mode::PrivilegeMode;

#[test]
fn implemented_registers_round_trip() {
    let mut block = Ipr::new();
    for addr in [
        ipr::PS,
        ipr::EXC_ADDR,
        ipr::EXC_SUM,
        ipr::PAL_BASE,
        ipr::SIRR,
        ipr::VA,
        ipr::VPTB,
        ipr::DTB_TAG,
        ipr::ITB_TAG,
    ] {
        block.write(addr, 0xA5A5);
        assert_eq!(block.read(addr), 0xA5A5, "IPR {addr:#x}");
    }
}

#[test]
fn ipl_field_is_five_bits_wide() {
    let mut block = Ipr::new();
    block.write(ipr::IPL, 0xFFFF);
    assert_eq!(block.read(ipr::IPL), 0x1F);
}

#[test]
fn current_mode_decodes_from_ps() {
    let mut block = Ipr::new();
    block.ps = 0b11 << 3;
    assert_eq!(block.current_mode(), PrivilegeMode::User);
    block.ps = 0;
    assert_eq!(block.current_mode(), PrivilegeMode::Kernel);
}

#[test]
fn interrupts_pend_only_above_the_current_ipl() {
    let mut block = Ipr::new();
    block.sirr = 1 << 4;
    block.ipl = 0;
    assert!(block.interrupt_pending());
    block.ipl = 10;
    assert!(!block.interrupt_pending());
}

#[test]
fn unimplemented_addresses_read_zero_and_swallow_writes() {
    let mut block = Ipr::new();
    block.write(0xEE, 0x1234);
    assert_eq!(block.read(0xEE), 0);
}
