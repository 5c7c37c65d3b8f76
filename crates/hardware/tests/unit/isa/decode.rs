//! Instruction decode: field extraction for each format, driven through
//! the same encoders the guest-program tests use.

use axp21264_core::isa::instruction::{decode, Format};
use axp21264_core::isa::{function_codes::inta, opcodes};
use rstest::rstest;

use crate::common::asm;

#[rstest]
#[case(opcodes::INTA, Format::Operate)]
#[case(opcodes::FLTI, Format::Operate)]
#[case(opcodes::LDQ, Format::Memory)]
#[case(opcodes::STQ, Format::Memory)]
#[case(opcodes::JSR, Format::Memory)]
#[case(opcodes::BEQ, Format::Branch)]
#[case(opcodes::BR, Format::Branch)]
#[case(opcodes::CALL_PAL, Format::Pal)]
fn opcode_maps_to_its_format(#[case] opcode: u32, #[case] format: Format) {
    let raw = opcode << 26;
    assert_eq!(decode(raw).format, format);
}

#[test]
fn operate_register_form_extracts_all_three_registers() {
    let d = decode(asm::operate(opcodes::INTA, 5, 6, inta::ADDQ, 7));
    assert_eq!((d.ra, d.rb, d.rc), (5, 6, 7));
    assert!(!d.literal_mode);
    assert_eq!(d.function, inta::ADDQ);
}

#[test]
fn operate_literal_form_extracts_the_literal() {
    let d = decode(asm::operate_lit(opcodes::INTA, 5, 0xAB, inta::ADDQ, 7));
    assert!(d.literal_mode);
    assert_eq!(d.literal, 0xAB);
    assert_eq!(d.function, inta::ADDQ);
}

#[test]
fn memory_displacement_sign_extends_both_ways() {
    assert_eq!(decode(asm::ldq(1, -8, 2)).mem_disp, -8);
    assert_eq!(decode(asm::ldq(1, 0x7FFF, 2)).mem_disp, 0x7FFF);
}

#[test]
fn branch_displacement_is_scaled_to_bytes() {
    let d = decode(asm::branch(opcodes::BEQ, 1, 3));
    assert_eq!(d.branch_disp, 12);
    let d = decode(asm::branch(opcodes::BEQ, 1, -1));
    assert_eq!(d.branch_disp, -4);
}

#[test]
fn fp_operate_function_field_is_eleven_bits() {
    use axp21264_core::isa::function_codes::flti;
    let d = decode(asm::fp_operate(opcodes::FLTI, 1, 2, flti::ADDT, 3));
    assert_eq!(d.function, flti::ADDT);
    assert!(!d.literal_mode);
}

#[test]
fn call_pal_function_spans_twenty_six_bits() {
    let d = decode(asm::call_pal(0x83));
    assert_eq!(d.pal_function, 0x83);
}
