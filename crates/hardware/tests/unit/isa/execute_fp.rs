//! Floating-point execution: IEEE laws on ordinary values, directed
//! rounding correctness, and FPCR status behavior.

use axp21264_core::common::Trap;
use axp21264_core::isa::fp::{
    self, FPCR_DZE, FPCR_INE, FPCR_INV, FPCR_OVF, FPCR_SUM,
};
use axp21264_core::isa::function_codes::{flti, fltl};
use axp21264_core::isa::opcodes;
use proptest::prelude::*;
use rstest::rstest;

fn run(function: u32, fa: f64, fb: f64) -> fp::FpOutcome {
    fp::execute(opcodes::FLTI, function, fa.to_bits(), fb.to_bits(), 0, 0)
}

#[test]
fn adds_commutes_on_ordinary_values() {
    let ab = run(flti::ADDS, 1.25, 3.5);
    let ba = run(flti::ADDS, 3.5, 1.25);
    assert_eq!(ab.bits, ba.bits);
}

#[test]
fn addt_zero_is_the_identity() {
    let r = run(flti::ADDT, 7.875, 0.0);
    assert_eq!(r.bits, Some(7.875f64.to_bits()));
    assert_eq!(r.flags, 0);
}

#[test]
fn signaling_nan_raises_invalid_with_summary() {
    let snan = 0x7FF0_0000_0000_0001u64;
    let r = fp::execute(opcodes::FLTI, flti::ADDS, snan, 1.0f64.to_bits(), 0, 0);
    assert_eq!(r.trap, Some(Trap::IllegalOperand));
    assert_eq!(r.bits, None, "destination must stay unchanged");
    assert!(r.flags & FPCR_INV != 0);
    assert!(r.flags & FPCR_SUM != 0);
}

#[rstest]
#[case(f64::INFINITY, f64::NEG_INFINITY, flti::ADDT)] // inf - inf
#[case(0.0, f64::INFINITY, flti::MULT)] // 0 * inf
#[case(0.0, 0.0, flti::DIVT)] // 0 / 0
#[case(f64::INFINITY, f64::INFINITY, flti::DIVT)] // inf / inf
fn invalid_operand_pairs_trap(#[case] a: f64, #[case] b: f64, #[case] function: u32) {
    assert_eq!(run(function, a, b).trap, Some(Trap::IllegalOperand));
}

#[test]
fn division_by_zero_returns_signed_infinity_and_flags() {
    let r = run(flti::DIVT, -3.0, 0.0);
    assert_eq!(r.bits, Some(f64::NEG_INFINITY.to_bits()));
    assert!(r.flags & FPCR_DZE != 0);
    assert_eq!(r.trap, Some(Trap::ArithmeticTraps));
}

#[test]
fn overflow_flags_and_traps() {
    let r = run(flti::ADDT, f64::MAX, f64::MAX);
    assert!(r.flags & FPCR_OVF != 0);
    assert_eq!(r.trap, Some(Trap::ArithmeticTraps));
}

#[test]
fn inexact_is_flagged_but_quiet_without_the_qualifier() {
    let r = run(flti::ADDT, 1.0, 2f64.powi(-60));
    assert!(r.flags & FPCR_INE != 0);
    assert_eq!(r.trap, None);
}

#[test]
fn compares_encode_true_as_two() {
    assert_eq!(run(flti::CMPTEQ, 3.0, 3.0).bits, Some(2.0f64.to_bits()));
    assert_eq!(run(flti::CMPTLT, 3.0, 3.0).bits, Some(0));
    assert_eq!(run(flti::CMPTLE, 3.0, 3.0).bits, Some(2.0f64.to_bits()));
}

#[test]
fn sign_copy_family_splices_bit_patterns() {
    let r = fp::execute(
        opcodes::FLTL,
        fltl::CPYSN,
        1.0f64.to_bits(),
        2.5f64.to_bits(),
        0,
        0,
    );
    assert_eq!(r.bits, Some((-2.5f64).to_bits()));
}

#[test]
fn conversions_round_trip_small_integers() {
    let to_t = fp::execute(opcodes::FLTI, flti::CVTQT, 0, (-9i64) as u64, 0, 0);
    assert_eq!(to_t.bits, Some((-9.0f64).to_bits()));
    let back = fp::execute(opcodes::FLTI, flti::CVTTQ, 0, (-9.0f64).to_bits(), 0, 0);
    assert_eq!(back.bits, Some((-9i64) as u64));
}

proptest! {
    /// Chopped rounding never exceeds the exact magnitude, and
    /// minus-infinity rounding never exceeds the exact value.
    #[test]
    fn directed_rounding_respects_its_bound(a in -1.0e100f64..1.0e100, b in -1.0e100f64..1.0e100) {
        // fnc 0 (add), src T, rounding chopped / minus-infinity.
        let chopped = fp::execute(opcodes::FLTI, 0b10 << 4, a.to_bits(), b.to_bits(), 0, 0);
        let floor = fp::execute(opcodes::FLTI, (0b01 << 6) | (0b10 << 4), a.to_bits(), b.to_bits(), 0, 0);
        let exact = a + b; // f64 nearest; within half an ulp of the true sum
        if let Some(bits) = chopped.bits {
            let r = f64::from_bits(bits);
            prop_assert!(r.abs() <= exact.abs() + exact.abs() * 1e-15 + f64::MIN_POSITIVE);
        }
        if let Some(bits) = floor.bits {
            let r = f64::from_bits(bits);
            prop_assert!(r <= exact + exact.abs() * 1e-15 + f64::MIN_POSITIVE);
        }
    }

    /// ADDS is commutative across the finite singles.
    #[test]
    fn adds_commutativity_property(a in -1.0e30f32..1.0e30, b in -1.0e30f32..1.0e30) {
        let fa = f64::from(a).to_bits();
        let fb = f64::from(b).to_bits();
        let ab = fp::execute(opcodes::FLTI, flti::ADDS, fa, fb, 0, 0);
        let ba = fp::execute(opcodes::FLTI, flti::ADDS, fb, fa, 0, 0);
        prop_assert_eq!(ab.bits, ba.bits);
    }
}

#[test]
fn s_format_memory_round_trip_preserves_singles() {
    for v in [0.0f32, -1.5, 3.25e10, f32::INFINITY] {
        let reg = fp::s_mem_to_reg(v.to_bits());
        assert_eq!(fp::t_reg_to_s_mem(reg), v.to_bits());
    }
}
