//! Global System Constants.
//!
//! This module defines system-wide constants used across the simulator. It includes:
//! 1. **Memory constants:** cache line size, masks, and shifts for the memory hierarchy.
//! 2. **Instruction constants:** opcode/register field masks and shifts for instruction decoding.
//! 3. **Queue sizing constants:** the architectural depths of the issue, load/store and Cbox queues.
//! 4. **Simulation constants:** thresholds and intervals for simulation control.

/// Cache line size in bytes, shared by Icache, Dcache, and Bcache.
pub const LINE_SIZE: u64 = 64;

/// Number of bits to shift to convert between bytes and 64-byte cache lines.
pub const LINE_SHIFT: u64 = 6;

/// Mask for extracting the byte offset within a 64-byte cache line.
pub const LINE_OFFSET_MASK: u64 = LINE_SIZE - 1;

/// Bit mask for extracting the opcode field (bits 31:26) from an Alpha instruction.
pub const OPCODE_MASK: u32 = 0x3F;

/// Bit position shift for the opcode field.
pub const OPCODE_SHIFT: u32 = 26;

/// Size of every Alpha instruction, in bytes (Alpha has no compressed encoding).
pub const INSTRUCTION_SIZE: u64 = 4;

/// Bit mask for extracting the Ra (bits 25:21) register field.
pub const RA_MASK: u32 = 0x1F;

/// Bit position shift for the Ra field.
pub const RA_SHIFT: u32 = 21;

/// Bit mask for extracting the Rb (bits 20:16) register field.
pub const RB_MASK: u32 = 0x1F;

/// Bit position shift for the Rb field.
pub const RB_SHIFT: u32 = 16;

/// Bit mask for extracting the Rc (bits 4:0) register field.
pub const RC_MASK: u32 = 0x1F;

/// Bit position shift for the Rc field.
pub const RC_SHIFT: u32 = 0;

/// Architectural register index that is hardwired to zero (R31 / F31).
pub const ZERO_REG: usize = 31;

/// Integer issue queue depth.
pub const IQ_DEPTH: usize = 20;

/// Floating-point issue queue depth.
pub const FQ_DEPTH: usize = 15;

/// Load queue depth.
pub const LQ_DEPTH: usize = 32;

/// Store queue depth.
pub const SQ_DEPTH: usize = 32;

/// Integer physical register file size.
pub const INT_PHYS_REGS: usize = 80;

/// Floating-point physical register file size.
pub const FP_PHYS_REGS: usize = 72;

/// Architectural register file size (R0-R31 or F0-F31).
pub const ARCH_REGS: usize = 32;

/// Miss Address File depth.
pub const MAF_DEPTH: usize = 8;

/// Victim Data Buffer depth.
pub const VDB_DEPTH: usize = 8;

/// I/O Write Buffer depth.
pub const IOWB_DEPTH: usize = 4;

/// Probe Queue depth.
pub const PQ_DEPTH: usize = 8;

/// DTB / ITB entry count.
pub const TB_ENTRIES: usize = 128;

/// Superscalar fetch/decode/rename width (four-issue).
pub const PIPELINE_WIDTH: usize = 4;

/// Maximum number of cycles the simulator will run with no retirement before
/// flagging a livelock in diagnostics. Not an architectural timeout; this is
/// host-side hang detection only.
pub const HANG_DETECTION_THRESHOLD: u64 = 50_000;

/// `CALL_PAL` opcode (0x00).
pub const OPCODE_PAL: u32 = 0x00;

/// Base page size shift: the 21264 uses 8KiB pages absent a granularity hint.
pub const PAGE_SHIFT: u64 = 13;

/// Mask for extracting the virtual page number from a virtual address, prior
/// to any granularity-hint shift.
pub const VPN_MASK: u64 = (1 << (64 - PAGE_SHIFT)) - 1;
