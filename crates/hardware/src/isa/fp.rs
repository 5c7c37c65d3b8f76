//! Fbox execution: IEEE floating-point with FPCR status semantics.
//!
//! The FP function field packs four sub-fields: the operation (bits 3:0),
//! the source type (bits 5:4), the rounding mode (bits 7:6), and the trap
//! qualifier (bits 10:8). The host FPU rounding mode is never changed;
//! directed rounding (chopped, minus-infinity) is applied as an explicit
//! one-ulp correction to the round-to-nearest result, using an exactly
//! computed residual (two-sum for add/subtract, fused multiply-add for
//! multiply and divide) to decide whether and in which direction the
//! nearest-rounded result overshot.
//!
//! Invalid-operation detection runs *before* the computation: a signaling
//! NaN or an invalid operand pair (∞−∞, 0×∞, 0/0, ∞/∞) must raise invalid
//! even though the host would quietly produce a NaN. An invalid operation
//! leaves the destination register unchanged.

use super::function_codes::{flti, fltl};
use super::opcodes;
use crate::common::error::Trap;

/// FPCR invalid-operation status bit.
pub const FPCR_INV: u64 = 1 << 52;
/// FPCR division-by-zero status bit.
pub const FPCR_DZE: u64 = 1 << 53;
/// FPCR overflow status bit.
pub const FPCR_OVF: u64 = 1 << 54;
/// FPCR underflow status bit.
pub const FPCR_UNF: u64 = 1 << 55;
/// FPCR inexact-result status bit.
pub const FPCR_INE: u64 = 1 << 56;
/// FPCR integer-overflow status bit (conversions to quadword).
pub const FPCR_IOV: u64 = 1 << 57;
/// FPCR dynamic rounding mode field shift.
pub const FPCR_DYN_SHIFT: u64 = 58;
/// FPCR dynamic rounding mode field mask (post-shift).
pub const FPCR_DYN_MASK: u64 = 0x3;
/// FPCR summary bit: the OR of all status bits.
pub const FPCR_SUM: u64 = 1 << 63;

/// Mask of every FPCR status bit that feeds the summary.
pub const FPCR_STATUS_MASK: u64 =
    FPCR_INV | FPCR_DZE | FPCR_OVF | FPCR_UNF | FPCR_INE | FPCR_IOV;

/// Rounding mode encoded in bits 7:6 of the FP function field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoundMode {
    /// Round toward zero (`/C`).
    Chopped,
    /// Round toward minus infinity (`/M`).
    MinusInf,
    /// Round to nearest, ties to even (the default).
    Normal,
    /// Use the FPCR dynamic rounding mode field (`/D`).
    Dynamic,
}

impl RoundMode {
    fn from_bits(bits: u32) -> Self {
        match bits & 0x3 {
            0 => RoundMode::Chopped,
            1 => RoundMode::MinusInf,
            2 => RoundMode::Normal,
            _ => RoundMode::Dynamic,
        }
    }

    /// Resolves `Dynamic` against the FPCR `DYN` field. The dynamic field
    /// uses the same two-bit encoding, except that 3 means plus-infinity,
    /// which this implementation folds to Normal (no operation in the
    /// supported subset selects it).
    fn resolve(self, fpcr: u64) -> Self {
        if self == RoundMode::Dynamic {
            match (fpcr >> FPCR_DYN_SHIFT) & FPCR_DYN_MASK {
                0 => RoundMode::Chopped,
                1 => RoundMode::MinusInf,
                _ => RoundMode::Normal,
            }
        } else {
            self
        }
    }
}

/// Source data type encoded in bits 5:4 of the FP function field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SrcType {
    /// IEEE single (S format, held register-expanded to T).
    S,
    /// Reserved encoding.
    Reserved,
    /// IEEE double (T format).
    T,
    /// Quadword integer (conversions only).
    Q,
}

impl SrcType {
    fn from_bits(bits: u32) -> Self {
        match bits & 0x3 {
            0 => SrcType::S,
            1 => SrcType::Reserved,
            2 => SrcType::T,
            _ => SrcType::Q,
        }
    }
}

/// Decomposed FP function field.
#[derive(Clone, Copy, Debug)]
pub struct FpFunction {
    /// Operation selector (bits 3:0).
    pub op: u32,
    /// Source data type (bits 5:4).
    pub src: SrcType,
    /// Rounding mode (bits 7:6).
    pub round: RoundMode,
    /// Raw trap qualifier (bits 10:8): bit 2 `/S`, bit 1 `/U`, bit 0 `/I`.
    pub trap_qualifier: u32,
}

/// Splits an 11-bit FP operate function field into its sub-fields.
pub fn split_function(function: u32) -> FpFunction {
    FpFunction {
        op: function & 0xF,
        src: SrcType::from_bits(function >> 4),
        round: RoundMode::from_bits(function >> 6),
        trap_qualifier: (function >> 8) & 0x7,
    }
}

/// Result of one Fbox operation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FpOutcome {
    /// New destination bit pattern, or `None` when the destination must be
    /// left unchanged (invalid operation).
    pub bits: Option<u64>,
    /// FPCR status bits raised by this operation (summary bit included).
    pub flags: u64,
    /// Architectural exception raised, dispatched at retirement.
    pub trap: Option<Trap>,
    /// The function field is not implemented by this Fbox.
    pub unimplemented: bool,
}

impl FpOutcome {
    fn value(bits: u64) -> Self {
        Self {
            bits: Some(bits),
            flags: 0,
            trap: None,
            unimplemented: false,
        }
    }

    fn unimplemented() -> Self {
        Self {
            bits: None,
            flags: 0,
            trap: None,
            unimplemented: true,
        }
    }

    fn with_flags(mut self, flags: u64) -> Self {
        if flags != 0 {
            self.flags |= flags | FPCR_SUM;
        }
        self
    }
}

/// Executes one floating-point operate instruction (`FLTI` or `FLTL`).
///
/// `fa`/`fb` are raw T-format register bit patterns; `old_fc` is the prior
/// value of the destination register, needed by the conditional moves (the
/// not-moved case re-writes the old value through the renamed register) and
/// by invalid-operation handling. `MF_FPCR`/`MT_FPCR` are not handled here:
/// they touch the FPCR itself and are dispatched by the Fbox directly.
pub fn execute(opcode: u32, function: u32, fa: u64, fb: u64, old_fc: u64, fpcr: u64) -> FpOutcome {
    match opcode {
        opcodes::FLTI => execute_ieee(function, fa, fb, fpcr),
        opcodes::FLTL => execute_fltl(function, fa, fb, old_fc),
        _ => FpOutcome::unimplemented(),
    }
}

fn execute_fltl(function: u32, fa: u64, fb: u64, old_fc: u64) -> FpOutcome {
    const SIGN: u64 = 1 << 63;
    const EXP: u64 = 0x7FF0_0000_0000_0000;
    const FRAC: u64 = 0x000F_FFFF_FFFF_FFFF;

    let a = f64::from_bits(fa);
    let bits = match function {
        fltl::CPYS => (fa & SIGN) | (fb & !SIGN),
        fltl::CPYSN => ((fa & SIGN) ^ SIGN) | (fb & !SIGN),
        fltl::CPYSE => (fa & (SIGN | EXP)) | (fb & FRAC),
        fltl::FCMOVEQ => cmov(a == 0.0, fb, old_fc),
        fltl::FCMOVNE => cmov(a != 0.0, fb, old_fc),
        fltl::FCMOVLT => cmov(a < 0.0, fb, old_fc),
        fltl::FCMOVGE => cmov(a >= 0.0, fb, old_fc),
        fltl::FCMOVLE => cmov(a <= 0.0, fb, old_fc),
        fltl::FCMOVGT => cmov(a > 0.0, fb, old_fc),
        _ => return FpOutcome::unimplemented(),
    };
    FpOutcome::value(bits)
}

fn cmov(cond: bool, fb: u64, old_fc: u64) -> u64 {
    if cond { fb } else { old_fc }
}

/// Alpha encodes floating "true" as 2.0 and "false" as +0.0.
fn bool_fp(cond: bool) -> u64 {
    if cond { 2.0f64.to_bits() } else { 0 }
}

fn is_signaling_nan(bits: u64) -> bool {
    let exp = (bits >> 52) & 0x7FF;
    let frac = bits & 0x000F_FFFF_FFFF_FFFF;
    exp == 0x7FF && frac != 0 && (bits >> 51) & 1 == 0
}

fn invalid() -> FpOutcome {
    FpOutcome {
        bits: None,
        flags: FPCR_INV | FPCR_SUM,
        trap: Some(Trap::IllegalOperand),
        unimplemented: false,
    }
}

fn execute_ieee(function: u32, fa: u64, fb: u64, fpcr: u64) -> FpOutcome {
    let f = split_function(function);
    let rm = f.round.resolve(fpcr);
    let a = f64::from_bits(fa);
    let b = f64::from_bits(fb);

    // A signaling NaN invalidates every arithmetic and compare operation,
    // regardless of what the host arithmetic would produce. Quadword-source
    // conversions carry integer bit patterns, which have no NaN encoding.
    let arith_ops = f.src != SrcType::Q && (f.op <= 0x7 || f.op >= 0xC);
    if arith_ops && (is_signaling_nan(fa) || is_signaling_nan(fb)) {
        return invalid();
    }

    match (f.src, f.op) {
        // Arithmetic, S and T domains.
        (SrcType::S | SrcType::T, 0x0..=0x3) => {
            let single = f.src == SrcType::S;
            arith(f.op, a, b, rm, single, f.trap_qualifier)
        }

        // Compares are defined only in the T domain.
        (SrcType::T, 0x4) => FpOutcome::value(bool_fp(a.is_nan() || b.is_nan())),
        (SrcType::T, 0x5) => {
            if a.is_nan() || b.is_nan() {
                // Quiet NaNs compare unordered without a trap.
                FpOutcome::value(bool_fp(false))
            } else {
                FpOutcome::value(bool_fp(a == b))
            }
        }
        (SrcType::T, 0x6 | 0x7) => {
            if a.is_nan() || b.is_nan() {
                // Ordered compares signal invalid on any NaN operand.
                invalid()
            } else if f.op == 0x6 {
                FpOutcome::value(bool_fp(a < b))
            } else {
                FpOutcome::value(bool_fp(a <= b))
            }
        }

        // Conversions: CVTTS (T→S), CVTTQ (T→Q), CVTQS (Q→S), CVTQT (Q→T).
        (SrcType::T, 0xC) => {
            let (bits32, flags) = round_to_single(b, rm);
            FpOutcome::value(f64::from(f32::from_bits(bits32)).to_bits()).with_flags(flags)
        }
        (SrcType::T, 0xF) => convert_to_quad(b, rm),
        (SrcType::Q, 0xC) => {
            let v = fb as i64 as f64;
            let (bits32, mut flags) = round_to_single(v, rm);
            if (f64::from(f32::from_bits(bits32)) as i64) != fb as i64 {
                flags |= FPCR_INE;
            }
            FpOutcome::value(f64::from(f32::from_bits(bits32)).to_bits()).with_flags(flags)
        }
        (SrcType::Q, 0xE) => {
            let v = fb as i64;
            let r = v as f64;
            let flags = if r as i64 != v { FPCR_INE } else { 0 };
            FpOutcome::value(r.to_bits()).with_flags(flags)
        }

        _ => FpOutcome::unimplemented(),
    }
}

fn arith(op: u32, a: f64, b: f64, rm: RoundMode, single: bool, trp: u32) -> FpOutcome {
    // Invalid operand pairs the host would quietly NaN.
    let pair_invalid = match op {
        0x0 => a.is_infinite() && b.is_infinite() && a.signum() != b.signum(),
        0x1 => a.is_infinite() && b.is_infinite() && a.signum() == b.signum(),
        0x2 => (a == 0.0 && b.is_infinite()) || (a.is_infinite() && b == 0.0),
        0x3 => (a == 0.0 && b == 0.0) || (a.is_infinite() && b.is_infinite()),
        _ => false,
    };
    if pair_invalid {
        return invalid();
    }
    if a.is_nan() || b.is_nan() {
        // Quiet NaN propagation; no status change.
        return FpOutcome::value(f64::NAN.to_bits());
    }

    // Division by zero with a finite, nonzero dividend.
    if op == 0x3 && b == 0.0 && a != 0.0 && a.is_finite() {
        let r = if a.signum() == b.signum() {
            f64::INFINITY
        } else {
            f64::NEG_INFINITY
        };
        return FpOutcome {
            bits: Some(r.to_bits()),
            flags: FPCR_DZE | FPCR_SUM,
            trap: Some(Trap::ArithmeticTraps),
            unimplemented: false,
        };
    }

    // Round-to-nearest result plus an exactly-representable residual
    // (exact = s + err), used to steer directed rounding.
    let (s, err) = match op {
        0x0 => two_sum(a, b),
        0x1 => two_sum(a, -b),
        0x2 => {
            let p = a * b;
            (p, a.mul_add(b, -p))
        }
        _ => {
            let q = a / b;
            let r = (-q).mul_add(b, a);
            (q, r / b)
        }
    };

    let (bits, flags) = if single {
        // S-format arithmetic: the f64 intermediate is exact for in-range
        // single operands, so all rounding happens on the f64→f32 step.
        let (bits32, flags) = round_to_single(s + err, rm);
        (f64::from(f32::from_bits(bits32)).to_bits(), flags)
    } else {
        round_double(s, err, rm)
    };

    let trap = arith_trap(flags, trp);
    FpOutcome {
        bits: Some(bits),
        flags: if flags == 0 { 0 } else { flags | FPCR_SUM },
        trap,
        unimplemented: false,
    }
}

/// Decides whether the raised status bits become an `ArithmeticTraps`
/// exception. Overflow always traps; underflow and inexact trap only when
/// the `/U` and `/I` qualifier bits request it.
fn arith_trap(flags: u64, trp: u32) -> Option<Trap> {
    let underflow_enabled = trp & 0b010 != 0;
    let inexact_enabled = trp & 0b001 != 0;
    if flags & FPCR_OVF != 0
        || (flags & FPCR_UNF != 0 && underflow_enabled)
        || (flags & FPCR_INE != 0 && inexact_enabled)
    {
        Some(Trap::ArithmeticTraps)
    } else {
        None
    }
}

/// Knuth two-sum: returns `(s, err)` with `a + b == s + err` exactly.
fn two_sum(a: f64, b: f64) -> (f64, f64) {
    let s = a + b;
    if !s.is_finite() {
        return (s, 0.0);
    }
    let bv = s - a;
    let err = (a - (s - bv)) + (b - bv);
    (s, err)
}

/// Applies the directed rounding correction to a round-to-nearest T-format
/// result, and derives the status flags.
fn round_double(s: f64, err: f64, rm: RoundMode) -> (u64, u64) {
    let mut flags = 0u64;
    if s.is_infinite() {
        // Finite operands produced an overflowed result. Directed modes
        // clamp instead of overflowing to infinity on the closed side.
        flags |= FPCR_OVF | FPCR_INE;
        let clamped = match rm {
            RoundMode::Chopped => f64::MAX.copysign(s),
            RoundMode::MinusInf if s > 0.0 => f64::MAX,
            _ => s,
        };
        return (clamped.to_bits(), flags);
    }

    let mut r = s;
    if err != 0.0 {
        flags |= FPCR_INE;
        match rm {
            RoundMode::Chopped => {
                // The nearest result overshot in magnitude; pull one ulp
                // back toward zero.
                if (s > 0.0 && err < 0.0) || (s < 0.0 && err > 0.0) {
                    r = if s > 0.0 { s.next_down() } else { s.next_up() };
                }
            }
            RoundMode::MinusInf => {
                if err < 0.0 {
                    r = s.next_down();
                }
            }
            _ => {}
        }
    }
    if r == 0.0 && err != 0.0 {
        flags |= FPCR_UNF;
    }
    (r.to_bits(), flags)
}

/// Rounds an exact f64 value to single precision under the given mode,
/// returning the f32 bit pattern and the raised flags.
fn round_to_single(v: f64, rm: RoundMode) -> (u32, u64) {
    let mut flags = 0u64;
    let nearest = v as f32;

    if nearest.is_infinite() && v.is_finite() {
        flags |= FPCR_OVF | FPCR_INE;
        let clamped = match rm {
            RoundMode::Chopped => f32::MAX.copysign(nearest),
            RoundMode::MinusInf if nearest > 0.0 => f32::MAX,
            _ => nearest,
        };
        return (clamped.to_bits(), flags);
    }

    let err = v - f64::from(nearest);
    let mut r = nearest;
    if err != 0.0 {
        flags |= FPCR_INE;
        match rm {
            RoundMode::Chopped => {
                if (nearest > 0.0 && err < 0.0) || (nearest < 0.0 && err > 0.0) {
                    r = if nearest > 0.0 {
                        nearest.next_down()
                    } else {
                        nearest.next_up()
                    };
                }
            }
            RoundMode::MinusInf => {
                if err < 0.0 {
                    r = nearest.next_down();
                }
            }
            _ => {}
        }
        if r == 0.0 {
            flags |= FPCR_UNF;
        }
    }
    (r.to_bits(), flags)
}

/// `CVTTQ`: converts a T-format value to a quadword integer bit pattern in
/// the destination, honoring the rounding mode and flagging integer
/// overflow.
fn convert_to_quad(b: f64, rm: RoundMode) -> FpOutcome {
    if b.is_nan() {
        return invalid();
    }
    let rounded = match rm {
        RoundMode::Chopped => b.trunc(),
        RoundMode::MinusInf => b.floor(),
        _ => {
            // Round half to even.
            let t = b.round();
            if (b - b.trunc()).abs() == 0.5 && t % 2.0 != 0.0 {
                t - b.signum()
            } else {
                t
            }
        }
    };
    let mut flags = if rounded == b { 0 } else { FPCR_INE };
    if rounded >= 9_223_372_036_854_775_808.0 || rounded < -9_223_372_036_854_775_808.0 {
        flags |= FPCR_IOV | FPCR_INE;
    }
    FpOutcome::value((rounded as i64) as u64).with_flags(flags)
}

/// Expands an S-format (IEEE single) memory value into its T-format
/// register representation: the 8-bit exponent maps onto the 11-bit field
/// and the fraction left-justifies, exactly as the Mbox load path does it.
pub fn s_mem_to_reg(bits: u32) -> u64 {
    let sign = u64::from(bits >> 31) << 63;
    let exp = (bits >> 23) & 0xFF;
    let frac = u64::from(bits & 0x7F_FFFF) << 29;
    let exp_t: u64 = match exp {
        0xFF => 0x7FF,
        0 => 0,
        e => u64::from(e) + 1023 - 127,
    };
    sign | (exp_t << 52) | frac
}

/// Compresses a T-format register value back into S-format memory layout
/// (the STx store path); exponents outside the single range wrap into the
/// 8-bit field the way the hardware's truncation does.
pub fn t_reg_to_s_mem(bits: u64) -> u32 {
    let sign = ((bits >> 63) as u32) << 31;
    let exp = ((bits >> 52) & 0x7FF) as u32;
    let frac = ((bits >> 29) & 0x7F_FFFF) as u32;
    let exp_s = match exp {
        0x7FF => 0xFF,
        0 => 0,
        e => (e + 127).wrapping_sub(1023) & 0xFF,
    };
    sign | (exp_s << 23) | frac
}
