//! Operate-format integer execution semantics.
//!
//! Pure functions over register values: no pipeline, queue, or cache state.
//! The Ebox calls these once operands are read out of the physical register
//! file; floating-point operates live in [`crate::isa::fp`] (they carry FPCR
//! state), and memory-format address generation and PALcode dispatch live in
//! the Mbox/Ibox, since those need TB and cache access this module has no
//! business seeing.

use super::function_codes::{fpti, inta, intl, intm, ints};
use super::instruction::Decoded;

/// Outcome of executing one integer Operate-format instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecResult {
    /// A 64-bit integer result destined for `Rc`.
    Integer(u64),
    /// The function code is not implemented by this execution unit; the
    /// instruction retires with an `AXP_OPCDEC` exception.
    Unimplemented,
}

/// Executes an `INTA`/`INTL`/`INTS`/`INTM`/`FPTI` integer operate instruction.
///
/// `rb_val` is already resolved to either the register value or the
/// zero-extended 8-bit literal, per `decoded.literal_mode`. `old_dest` is the
/// prior value of `Rc`: the conditional moves re-write it through the renamed
/// destination when the condition fails, so the new physical register always
/// receives a defined value.
pub fn execute_integer(decoded: &Decoded, ra_val: u64, rb_val: u64, old_dest: u64) -> ExecResult {
    match decoded.opcode {
        super::opcodes::INTA => execute_inta(decoded.function, ra_val, rb_val),
        super::opcodes::INTL => execute_intl(decoded.function, ra_val, rb_val, old_dest),
        super::opcodes::INTS => execute_ints(decoded.function, ra_val, rb_val),
        super::opcodes::INTM => execute_intm(decoded.function, ra_val, rb_val),
        super::opcodes::FPTI => execute_fpti(decoded.function, rb_val),
        _ => ExecResult::Unimplemented,
    }
}

fn sext_long(v: u64) -> u64 {
    (v as i32 as i64) as u64
}

fn execute_inta(function: u32, a: u64, b: u64) -> ExecResult {
    let r = match function {
        inta::ADDL => sext_long(a.wrapping_add(b)),
        inta::SUBL => sext_long(a.wrapping_sub(b)),
        inta::S4ADDL => sext_long(a.wrapping_mul(4).wrapping_add(b)),
        inta::S4SUBL => sext_long(a.wrapping_mul(4).wrapping_sub(b)),
        inta::S8ADDL => sext_long(a.wrapping_mul(8).wrapping_add(b)),
        inta::S8SUBL => sext_long(a.wrapping_mul(8).wrapping_sub(b)),
        inta::ADDQ => a.wrapping_add(b),
        inta::SUBQ => a.wrapping_sub(b),
        inta::S4ADDQ => a.wrapping_mul(4).wrapping_add(b),
        inta::S4SUBQ => a.wrapping_mul(4).wrapping_sub(b),
        inta::S8ADDQ => a.wrapping_mul(8).wrapping_add(b),
        inta::S8SUBQ => a.wrapping_mul(8).wrapping_sub(b),
        inta::CMPEQ => (a == b) as u64,
        inta::CMPLT => ((a as i64) < (b as i64)) as u64,
        inta::CMPLE => ((a as i64) <= (b as i64)) as u64,
        inta::CMPULT => (a < b) as u64,
        inta::CMPULE => (a <= b) as u64,
        inta::CMPBGE => cmpbge(a, b),
        _ => return ExecResult::Unimplemented,
    };
    ExecResult::Integer(r)
}

/// Byte-lane unsigned compare: bit `i` of the result is set when byte `i` of
/// `a` is `>=` byte `i` of `b`.
fn cmpbge(a: u64, b: u64) -> u64 {
    let mut result = 0u64;
    for i in 0..8 {
        let shift = i * 8;
        let byte_a = (a >> shift) & 0xFF;
        let byte_b = (b >> shift) & 0xFF;
        if byte_a >= byte_b {
            result |= 1 << i;
        }
    }
    result
}

fn execute_intl(function: u32, a: u64, b: u64, old_dest: u64) -> ExecResult {
    let cmov = |cond: bool| if cond { b } else { old_dest };
    let r = match function {
        intl::AND => a & b,
        intl::BIC => a & !b,
        intl::BIS => a | b,
        intl::ORNOT => a | !b,
        intl::XOR => a ^ b,
        intl::EQV => !(a ^ b),
        intl::CMOVEQ => cmov(a == 0),
        intl::CMOVNE => cmov(a != 0),
        intl::CMOVLT => cmov((a as i64) < 0),
        intl::CMOVGE => cmov((a as i64) >= 0),
        intl::CMOVLE => cmov((a as i64) <= 0),
        intl::CMOVGT => cmov((a as i64) > 0),
        intl::CMOVLBS => cmov(a & 1 != 0),
        intl::CMOVLBC => cmov(a & 1 == 0),
        intl::AMASK => b,
        intl::IMPLVER => 2, // EV6/EV68 family
        _ => return ExecResult::Unimplemented,
    };
    ExecResult::Integer(r)
}

fn execute_ints(function: u32, a: u64, b: u64) -> ExecResult {
    let shift = (b & 0x3F) as u32;
    let r = match function {
        ints::SLL => a.wrapping_shl(shift),
        ints::SRL => a.wrapping_shr(shift),
        ints::SRA => ((a as i64).wrapping_shr(shift)) as u64,
        ints::ZAP => zap(a, b, false),
        ints::ZAPNOT => zap(a, b, true),
        ints::EXTBL => extract(a, b, 1),
        ints::EXTWL => extract(a, b, 2),
        ints::EXTLL => extract(a, b, 4),
        ints::EXTQL => extract(a, b, 8),
        ints::INSBL => insert(a, b, 1),
        ints::INSWL => insert(a, b, 2),
        ints::INSLL => insert(a, b, 4),
        ints::INSQL => insert(a, b, 8),
        ints::MSKBL => mask_low(a, b, 1),
        ints::MSKWL => mask_low(a, b, 2),
        ints::MSKLL => mask_low(a, b, 4),
        ints::MSKQL => mask_low(a, b, 8),
        _ => return ExecResult::Unimplemented,
    };
    ExecResult::Integer(r)
}

/// `ZAP`/`ZAPNOT`: zero out (or keep only) the byte lanes selected by the low
/// 8 bits of `mask`. `keep_selected` distinguishes `ZAPNOT` from `ZAP`.
fn zap(a: u64, mask: u64, keep_selected: bool) -> u64 {
    let mut result = 0u64;
    for i in 0..8 {
        let selected = (mask >> i) & 1 != 0;
        if selected == keep_selected {
            result |= a & (0xFFu64 << (i * 8));
        }
    }
    result
}

fn byte_lane_mask(len: u32) -> u64 {
    if len >= 8 {
        u64::MAX
    } else {
        (1u64 << (len * 8)) - 1
    }
}

/// `EXTxL`: extracts `len` bytes from `a` at the byte offset given by the low
/// 3 bits of `b`, right-justified.
fn extract(a: u64, b: u64, len: u32) -> u64 {
    let byte_shift = (b & 0x7) as u32 * 8;
    a.wrapping_shr(byte_shift) & byte_lane_mask(len)
}

/// `INSxL`: positions the low `len` bytes of `a` at the byte offset given by
/// the low 3 bits of `b` (the unaligned-store insertion half).
fn insert(a: u64, b: u64, len: u32) -> u64 {
    let byte_shift = (b & 0x7) as u32 * 8;
    (a & byte_lane_mask(len)).wrapping_shl(byte_shift)
}

/// `MSKxL`: clears the `len`-byte field at the byte offset given by the low 3
/// bits of `b` (the unaligned-store merge half).
fn mask_low(a: u64, b: u64, len: u32) -> u64 {
    let byte_shift = (b & 0x7) as u32 * 8;
    a & !(byte_lane_mask(len).wrapping_shl(byte_shift))
}

fn execute_intm(function: u32, a: u64, b: u64) -> ExecResult {
    let r = match function {
        intm::MULL => sext_long(a.wrapping_mul(b)),
        intm::MULQ => a.wrapping_mul(b),
        intm::UMULH => ((a as u128 * b as u128) >> 64) as u64,
        _ => return ExecResult::Unimplemented,
    };
    ExecResult::Integer(r)
}

/// The sign-extend and count operations take their operand in `Rb`; `Ra`
/// must be R31 architecturally.
fn execute_fpti(function: u32, b: u64) -> ExecResult {
    let r = match function {
        fpti::SEXTB => (b as i8 as i64) as u64,
        fpti::SEXTW => (b as i16 as i64) as u64,
        fpti::CTPOP => b.count_ones() as u64,
        fpti::CTLZ => b.leading_zeros() as u64,
        fpti::CTTZ => b.trailing_zeros() as u64,
        _ => return ExecResult::Unimplemented,
    };
    ExecResult::Integer(r)
}
