//! Unit tests for the instruction set layer.

/// Field extraction across the four instruction formats.
pub mod decode;

/// Floating-point execution: rounding, flags, invalid operands.
pub mod execute_fp;

/// Integer operate execution semantics.
pub mod execute_int;
