//! Architectural guest programs: ALU results, conditional moves, branch
//! recovery, subroutine linkage, and floating-point behavior observed
//! through committed state.

use axp21264_core::isa::fp::{FPCR_INV, FPCR_SUM};
use axp21264_core::isa::function_codes::{flti, inta, intl};
use axp21264_core::isa::opcodes;

use crate::common::{asm, harness::TestContext};

#[test]
fn addq_carries_across_the_longword_boundary() {
    let program = vec![
        asm::operate_lit(opcodes::INTA, 5, 1, inta::ADDQ, 6),
        asm::halt(),
    ];
    let mut ctx = TestContext::boot(&program);
    ctx.set_reg(5, 0x0FFFF_FFFF);
    ctx.run_to_halt();
    assert_eq!(ctx.reg(6), 0x1_0000_0000);
    assert_eq!(ctx.sim.cpu.stats.traps_taken, 0, "no exception expected");
}

#[test]
fn dependent_chain_respects_data_order() {
    let program = vec![
        asm::lda(1, 10, 31),                                  // R1 = 10
        asm::operate_lit(opcodes::INTA, 1, 5, inta::ADDQ, 2), // R2 = 15
        asm::operate(opcodes::INTA, 2, 1, inta::ADDQ, 3),     // R3 = 25
        asm::operate_lit(opcodes::INTA, 3, 1, inta::SUBQ, 4), // R4 = 24
        asm::halt(),
    ];
    let mut ctx = TestContext::boot(&program);
    ctx.run_to_halt();
    assert_eq!(ctx.reg(2), 15);
    assert_eq!(ctx.reg(3), 25);
    assert_eq!(ctx.reg(4), 24);
}

#[test]
fn writes_to_r31_commit_nothing() {
    let program = vec![
        asm::operate_lit(opcodes::INTA, 31, 7, inta::ADDQ, 31),
        asm::lda(31, 0x55, 31),
        asm::halt(),
    ];
    let mut ctx = TestContext::boot(&program);
    ctx.run_to_halt();
    assert_eq!(ctx.reg(31), 0);
}

#[test]
fn cmov_rewrites_the_old_value_on_the_false_path() {
    let program = vec![
        asm::lda(1, 1, 31), // R1 = 1: CMOVEQ condition fails
        asm::lda(2, 5, 31),
        asm::lda(3, 9, 31),
        asm::operate(opcodes::INTL, 1, 2, intl::CMOVEQ, 3), // R3 stays 9
        asm::halt(),
    ];
    let mut ctx = TestContext::boot(&program);
    ctx.run_to_halt();
    assert_eq!(ctx.reg(3), 9);
}

#[test]
fn mispredicted_branch_discards_the_wrong_path() {
    let program = vec![
        asm::lda(1, 1, 31),            // R1 = 1
        asm::branch(opcodes::BNE, 1, 1), // taken: skip the next word
        asm::lda(2, 99, 31),           // wrong path: must not commit
        asm::lda(3, 7, 31),            // branch target
        asm::halt(),
    ];
    let mut ctx = TestContext::boot(&program);
    ctx.run_to_halt();
    assert_eq!(ctx.reg(2), 0, "wrong-path write leaked");
    assert_eq!(ctx.reg(3), 7);
    assert!(ctx.sim.cpu.stats.branch_mispredictions >= 1);
}

#[test]
fn not_taken_branch_falls_through() {
    let program = vec![
        asm::branch(opcodes::BNE, 31, 1), // R31 is zero: not taken
        asm::lda(2, 4, 31),
        asm::halt(),
    ];
    let mut ctx = TestContext::boot(&program);
    ctx.run_to_halt();
    assert_eq!(ctx.reg(2), 4);
}

#[test]
fn jsr_links_and_ret_predicts_through_the_return_stack() {
    let mut program = vec![
        asm::lda(27, 0x40, 31),  // procedure address
        asm::jump(26, 27, 1),    // JSR: R26 = 8
        asm::lda(4, 5, 31),      // after return
        asm::halt(),
    ];
    program.resize(16, asm::NOP);
    program.push(asm::lda(5, 6, 31)); // word 16 = address 0x40
    program.push(asm::jump(31, 26, 2)); // RET (R26)

    let mut ctx = TestContext::boot(&program);
    ctx.run_to_halt();
    assert_eq!(ctx.reg(26), 8, "JSR links the return address");
    assert_eq!(ctx.reg(5), 6, "procedure body ran");
    assert_eq!(ctx.reg(4), 5, "execution resumed after the call");
}

#[test]
fn addt_produces_the_ieee_sum() {
    let program = vec![
        asm::fp_operate(opcodes::FLTI, 1, 2, flti::ADDT, 3),
        asm::halt(),
    ];
    let mut ctx = TestContext::boot(&program);
    ctx.set_freg(1, 1.5f64.to_bits());
    ctx.set_freg(2, 2.25f64.to_bits());
    ctx.run_to_halt();
    assert_eq!(f64::from_bits(ctx.freg(3)), 3.75);
    assert_eq!(ctx.sim.cpu.fpcr, 0, "exact result raises no status");
}

#[test]
fn signaling_nan_add_traps_and_preserves_the_destination() {
    let program = vec![
        asm::fp_operate(opcodes::FLTI, 1, 2, flti::ADDS, 3),
        asm::halt(),
    ];
    let mut ctx = TestContext::boot(&program);
    ctx.set_freg(1, 0x7FF0_0000_0000_0001); // signaling NaN
    ctx.set_freg(2, 1.0f64.to_bits());
    ctx.set_freg(3, 42.0f64.to_bits());
    // The trap vectors into an empty PAL region, whose zero words read as
    // CALL_PAL 0 and halt the machine.
    ctx.run_to_halt();

    assert!(ctx.sim.cpu.fpcr & FPCR_INV != 0);
    assert!(ctx.sim.cpu.fpcr & FPCR_SUM != 0);
    assert_eq!(ctx.freg(3), 42.0f64.to_bits(), "Fc must be unchanged");
    assert_eq!(ctx.sim.cpu.ipr.exc_sum, 1 << 1, "IllegalOperand cause bit");
}

#[test]
fn cpys_moves_sign_bits_through_the_fq() {
    use axp21264_core::isa::function_codes::fltl;
    let program = vec![
        asm::fp_operate(opcodes::FLTL, 1, 2, fltl::CPYSN, 3),
        asm::halt(),
    ];
    let mut ctx = TestContext::boot(&program);
    ctx.set_freg(1, 1.0f64.to_bits());
    ctx.set_freg(2, 2.5f64.to_bits());
    ctx.run_to_halt();
    assert_eq!(f64::from_bits(ctx.freg(3)), -2.5);
}

#[test]
fn reserved_opcode_dispatches_opcdec_precisely() {
    let program = vec![
        asm::lda(1, 3, 31),
        0x07u32 << 26, // reserved primary opcode
        asm::lda(2, 9, 31), // younger: must not commit
        asm::halt(),
    ];
    let mut ctx = TestContext::boot(&program);
    ctx.run_to_halt();
    // The older LDA committed; the younger one was flushed by the trap.
    assert_eq!(ctx.reg(1), 3);
    assert_eq!(ctx.reg(2), 0);
    assert_eq!(ctx.sim.cpu.ipr.exc_sum, 1 << 7, "OPCDEC cause bit");
    assert_eq!(ctx.sim.cpu.ipr.exc_addr, 4, "faulting PC latched");
}
