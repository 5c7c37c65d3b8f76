//! Integer operate semantics: longword sign extension, byte-lane
//! operations, and the unaligned-access building blocks.

use axp21264_core::isa::execute::{execute_integer, ExecResult};
use axp21264_core::isa::function_codes::{inta, intl, intm, ints};
use axp21264_core::isa::instruction::decode;
use axp21264_core::isa::opcodes;
use rstest::rstest;

use crate::common::asm;

fn exec(opcode: u32, function: u32, a: u64, b: u64) -> u64 {
    let d = decode(asm::operate(opcode, 1, 2, function, 3));
    match execute_integer(&d, a, b, 0) {
        ExecResult::Integer(v) => v,
        ExecResult::Unimplemented => panic!("{opcode:#x}.{function:#x} unimplemented"),
    }
}

#[test]
fn addq_wraps_at_sixty_four_bits() {
    assert_eq!(exec(opcodes::INTA, inta::ADDQ, u64::MAX, 2), 1);
}

#[test]
fn addq_crosses_the_longword_boundary_without_truncation() {
    assert_eq!(
        exec(opcodes::INTA, inta::ADDQ, 0x0FFFF_FFFF, 1),
        0x1_0000_0000
    );
}

#[rstest]
#[case(0x7FFF_FFFF, 1, 0xFFFF_FFFF_8000_0000)] // positive overflow wraps negative
#[case(0xFFFF_FFFF, 1, 0)] // -1 + 1
#[case(5, 3, 8)]
fn addl_sign_extends_the_longword_result(#[case] a: u64, #[case] b: u64, #[case] want: u64) {
    assert_eq!(exec(opcodes::INTA, inta::ADDL, a, b), want);
}

#[test]
fn scaled_adds_shift_before_adding() {
    assert_eq!(exec(opcodes::INTA, inta::S4ADDQ, 3, 1), 13);
    assert_eq!(exec(opcodes::INTA, inta::S8ADDQ, 3, 1), 25);
}

#[rstest]
#[case(inta::CMPEQ, 5, 5, 1)]
#[case(inta::CMPEQ, 5, 6, 0)]
#[case(inta::CMPLT, u64::MAX, 0, 1)] // signed: -1 < 0
#[case(inta::CMPULT, u64::MAX, 0, 0)] // unsigned: MAX > 0
#[case(inta::CMPLE, 7, 7, 1)]
fn compares_distinguish_signedness(
    #[case] function: u32,
    #[case] a: u64,
    #[case] b: u64,
    #[case] want: u64,
) {
    assert_eq!(exec(opcodes::INTA, function, a, b), want);
}

#[test]
fn cmpbge_reports_per_byte_lane_results() {
    // Every byte of a equals the corresponding byte of b: all eight bits.
    assert_eq!(exec(opcodes::INTA, inta::CMPBGE, 0x0101, 0x0101), 0xFF);
    // Byte 0 of a (0x01) < byte 0 of b (0x02): bit 0 clear.
    assert_eq!(exec(opcodes::INTA, inta::CMPBGE, 0x01, 0x02), 0xFE);
}

#[test]
fn logical_ops_cover_the_complemented_forms() {
    assert_eq!(exec(opcodes::INTL, intl::BIC, 0xFF, 0x0F), 0xF0);
    assert_eq!(exec(opcodes::INTL, intl::ORNOT, 0, 0), u64::MAX);
    assert_eq!(exec(opcodes::INTL, intl::EQV, 0xFF, 0xFF), u64::MAX);
}

#[test]
fn cmov_moves_only_when_the_condition_holds() {
    let d = decode(asm::operate(opcodes::INTL, 1, 2, intl::CMOVEQ, 3));
    assert_eq!(execute_integer(&d, 0, 0xB, 0xA), ExecResult::Integer(0xB));
    assert_eq!(execute_integer(&d, 1, 0xB, 0xA), ExecResult::Integer(0xA));
}

#[test]
fn shifts_use_only_the_low_six_bits_of_the_count() {
    assert_eq!(exec(opcodes::INTS, ints::SLL, 1, 64), 1);
    assert_eq!(exec(opcodes::INTS, ints::SRA, 0x8000_0000_0000_0000, 63), u64::MAX);
}

#[test]
fn extract_insert_mask_compose_unaligned_stores() {
    let existing = 0xFFFF_FFFF_FFFF_FFFFu64;
    let cleared = exec(opcodes::INTS, ints::MSKWL, existing, 2);
    let inserted = exec(opcodes::INTS, ints::INSWL, 0xABCD, 2);
    assert_eq!(cleared | inserted, 0xFFFF_FFFF_ABCD_FFFF);
    assert_eq!(exec(opcodes::INTS, ints::EXTWL, cleared | inserted, 2), 0xABCD);
}

#[test]
fn umulh_returns_the_high_half() {
    assert_eq!(exec(opcodes::INTM, intm::UMULH, u64::MAX, u64::MAX), u64::MAX - 1);
    assert_eq!(exec(opcodes::INTM, intm::MULQ, u64::MAX, u64::MAX), 1);
}

#[test]
fn unimplemented_function_codes_are_reported_not_panicked() {
    let d = decode(asm::operate(opcodes::INTA, 1, 2, 0x7F, 3));
    assert_eq!(execute_integer(&d, 0, 0, 0), ExecResult::Unimplemented);
}
