//! Power-up: the Cbox lifecycle promotes Cold through self-test to Run,
//! the boot image lands in the Icache, and bad images shut the CPU down.

use axp21264_core::core::cpu::{BistState, CpuState};
use axp21264_core::sim::loader;
use axp21264_core::sim::simulator::Simulator;

use crate::common::{asm, harness};

#[test]
fn boot_reaches_run_with_self_test_passed() {
    let mut program = vec![asm::NOP; 15];
    program.push(asm::halt());
    let mut ctx = harness::TestContext::boot(&program);
    assert_eq!(ctx.sim.cpu.state, CpuState::Run);
    assert_eq!(ctx.sim.cpu.cbox.bist, BistState::BistSucceeded);
    assert!(ctx.sim.cpu.pal_mode, "reset fetch starts in PAL mode");

    // The installed image actually executes from the Icache.
    ctx.run_to_halt();
}

#[test]
fn boot_image_executes_at_a_nonzero_base() {
    let program = vec![
        asm::lda(1, 21, 31), // R1 = 21
        asm::halt(),
    ];
    let mut ctx = harness::TestContext::boot_at(0x10000, &program);
    assert_eq!(ctx.sim.cpu.pc, 0x10000);
    ctx.run_to_halt();
    assert_eq!(ctx.reg(1), 21);
}

#[test]
fn empty_image_fails_initialization_and_shuts_down() {
    let mut sim = Simulator::new(&harness::small_config());
    assert!(sim.boot(0, &[]).is_err());
    assert_eq!(sim.cpu.state, CpuState::ShuttingDown);
}

#[test]
fn ragged_image_bytes_are_rejected_by_the_loader() {
    assert!(loader::image_words(&[1, 2, 3, 4, 5]).is_err());
    assert_eq!(
        loader::image_words(&[0x1F, 0x04, 0xFF, 0x47]).unwrap(),
        vec![asm::NOP]
    );
}

#[test]
fn halt_reports_the_value_in_r0() {
    let program = vec![
        asm::lda(0, 17, 31), // R0 = 17
        asm::halt(),
    ];
    let mut ctx = harness::TestContext::boot(&program);
    assert_eq!(ctx.halt_value(), 17);
}
