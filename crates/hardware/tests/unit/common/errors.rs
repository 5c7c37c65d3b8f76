//! Trap taxonomy contract: distinct, non-empty messages and distinct PAL
//! vector offsets per exception kind.

use std::collections::HashSet;

use axp21264_core::common::error::InitError;
use axp21264_core::common::Trap;

fn all_traps() -> Vec<Trap> {
    vec![
        Trap::ArithmeticTraps,
        Trap::IllegalOperand,
        Trap::FaultOnRead(0x100),
        Trap::FaultOnWrite(0x100),
        Trap::FaultOnExecute(0x100),
        Trap::TBMissFault(0x100),
        Trap::UnalignedAccess(0x101),
        Trap::ReservedOpcode(0x3F),
        Trap::Interrupt,
    ]
}

#[test]
fn every_trap_renders_a_distinct_message() {
    let mut seen = HashSet::new();
    for trap in all_traps() {
        let msg = trap.to_string();
        assert!(!msg.is_empty());
        assert!(seen.insert(msg), "duplicate Display for {trap:?}");
    }
}

#[test]
fn every_trap_has_its_own_pal_vector() {
    let mut seen = HashSet::new();
    for trap in all_traps() {
        assert!(seen.insert(trap.pal_offset()), "shared vector for {trap:?}");
    }
}

#[test]
fn init_errors_carry_their_context() {
    let err = InitError::UnknownCsr("BcBogus".into());
    assert!(err.to_string().contains("BcBogus"));
    let err = InitError::InvalidImage("empty image".into());
    assert!(err.to_string().contains("empty image"));
}
