//! Alpha calling-convention register name mappings.
//!
//! These are software conventions (the Tru64/OSF "standard" register usage),
//! not hardware-enforced, but PALcode entry points and the `CALL_PAL` ABI
//! rely on a few of them: `RA` holds the `CALL_PAL` return address and `PV`
//! the entry procedure value.

/// Integer zero register (R31); reads as zero, writes discarded.
pub const REG_ZERO: usize = 31;
/// Global pointer.
pub const REG_GP: usize = 29;
/// Stack pointer.
pub const REG_SP: usize = 30;
/// Argument/return value 0 (also used as the `CALL_PAL` syscall number slot).
pub const REG_A0: usize = 16;
/// Argument 1.
pub const REG_A1: usize = 17;
/// Argument 2.
pub const REG_A2: usize = 18;
/// Procedure value register (entry point address across a call).
pub const REG_PV: usize = 27;
/// Return address register, set by `JSR`/`BSR`.
pub const REG_RA: usize = 26;
/// Assembler-reserved temporary.
pub const REG_AT: usize = 28;

/// Floating-point zero register (F31); reads as zero, writes discarded.
pub const FREG_ZERO: usize = 31;
