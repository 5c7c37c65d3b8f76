//! Alpha AXP instruction set: formats, opcode/function tables, and the
//! per-function execute semantics the Ebox/Fbox dispatch against.
//!
//! The 21264 opcode space is one flat 6-bit table, so the module split here
//! is by concern: [`instruction`] (formats and decode), [`opcodes`]/
//! [`function_codes`] (the table itself), [`slot`] (queue and pipe
//! assignment), [`execute`]/[`fp`] (ALU and FPU semantics), [`abi`]
//! (calling-convention register names).

/// Calling-convention register name constants.
pub mod abi;

/// Operate-format integer execute semantics.
pub mod execute;

/// Floating-point execute semantics with FPCR status handling.
pub mod fp;

/// Operate-format function code tables, grouped by primary opcode.
pub mod function_codes;

/// Instruction formats and the `decode` entry point.
pub mod instruction;

/// Primary (6-bit) opcode constants.
pub mod opcodes;

/// Opcode slotting table: queue targets, pipe classes, register use.
pub mod slot;
