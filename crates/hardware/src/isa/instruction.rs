//! Decoded Alpha AXP instruction representation.
//!
//! The 21264 has four instruction formats, all 32 bits wide with a 6-bit
//! opcode in bits 31:26:
//! - **Operate:** register or literal second operand, 7-bit function code.
//! - **Memory:** 16-bit signed displacement load/store/jump.
//! - **Branch:** 21-bit signed displacement, PC-relative.
//! - **PALcode:** 26-bit function field (`CALL_PAL`).

use crate::common::constants::{OPCODE_MASK, OPCODE_SHIFT, RA_MASK, RA_SHIFT, RB_MASK, RB_SHIFT};

/// The four Alpha instruction encodings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    /// Register or literal operand, 7-bit function code, Rc destination.
    Operate,
    /// 16-bit signed displacement memory reference.
    Memory,
    /// 21-bit signed displacement PC-relative branch.
    Branch,
    /// 26-bit function field `CALL_PAL` entry.
    Pal,
}

/// A fully decoded Alpha instruction.
#[derive(Clone, Copy, Debug)]
pub struct Decoded {
    /// Raw 32-bit encoding, kept for disassembly and trap reporting.
    pub raw: u32,
    /// 6-bit primary opcode.
    pub opcode: u32,
    /// Instruction format implied by the opcode.
    pub format: Format,
    /// Ra field: source register (Operate/Memory) or branch-tested register.
    pub ra: usize,
    /// Rb field: second source register (Operate/Memory-as-index, unused in Branch).
    pub rb: usize,
    /// Rc field: destination register (Operate only).
    pub rc: usize,
    /// Operate-format function code. 7 bits (bits 11:5) for `INTA`/`INTL`/
    /// `INTS`/`INTM`/`FPTI`; 11 bits (bits 15:5) for the floating-point
    /// operate groups (`ITFP`/`FLTV`/`FLTI`/`FLTL`), which have no literal
    /// mode and so reclaim that bit for the function field.
    pub function: u32,
    /// Whether the Operate-format second operand is an 8-bit zero-extended
    /// literal (bit 12 set) rather than `Rb`.
    pub literal_mode: bool,
    /// 8-bit literal value when `literal_mode` is set.
    pub literal: u8,
    /// Sign-extended 16-bit displacement (Memory format).
    pub mem_disp: i64,
    /// Sign-extended 21-bit displacement, already shifted to a byte offset
    /// (Branch format: `disp << 2`).
    pub branch_disp: i64,
    /// 26-bit function field (PALcode format; identifies the `CALL_PAL` entry).
    pub pal_function: u32,
}

const FUNCTION_SHIFT: u32 = 5;
const FUNCTION_MASK: u32 = 0x7F;
const FP_FUNCTION_MASK: u32 = 0x7FF;
const LITERAL_BIT: u32 = 1 << 12;
const LITERAL_SHIFT: u32 = 13;
const LITERAL_MASK: u32 = 0xFF;
const MEM_DISP_MASK: u32 = 0xFFFF;
const BRANCH_DISP_MASK: u32 = 0x1F_FFFF;
const BRANCH_DISP_SIGN_BIT: u32 = 1 << 20;
const PAL_FUNCTION_MASK: u32 = 0x3FF_FFFF;

/// Classifies an opcode into its instruction format.
///
/// Opcodes 0x10-0x15 (operate group, including floating-point operates) use
/// the Operate format; 0x30-0x3F (branches) use Branch; `CALL_PAL` (0x00)
/// uses Pal; everything else (loads, stores, jumps, `HW_*` pseudo-ops) uses
/// Memory.
fn format_for_opcode(opcode: u32) -> Format {
    match opcode {
        0x00 => Format::Pal,
        0x10..=0x17 => Format::Operate,
        0x30..=0x3F => Format::Branch,
        _ => Format::Memory,
    }
}

/// Decodes a raw 32-bit Alpha instruction.
pub fn decode(raw: u32) -> Decoded {
    let opcode = (raw >> OPCODE_SHIFT) & OPCODE_MASK;
    let format = format_for_opcode(opcode);
    let ra = ((raw >> RA_SHIFT) & RA_MASK) as usize;
    let rb = ((raw >> RB_SHIFT) & RB_MASK) as usize;
    let rc = (raw & 0x1F) as usize;

    let is_fp_operate = matches!(opcode, 0x14..=0x17);
    let literal_mode = format == Format::Operate && !is_fp_operate && raw & LITERAL_BIT != 0;
    let literal = if literal_mode {
        ((raw >> LITERAL_SHIFT) & LITERAL_MASK) as u8
    } else {
        0
    };
    let function = if is_fp_operate {
        (raw >> FUNCTION_SHIFT) & FP_FUNCTION_MASK
    } else {
        (raw >> FUNCTION_SHIFT) & FUNCTION_MASK
    };

    let mem_disp_raw = raw & MEM_DISP_MASK;
    let mem_disp = sign_extend(mem_disp_raw, 16);

    let branch_disp_raw = raw & BRANCH_DISP_MASK;
    let branch_disp = sign_extend(branch_disp_raw, 21) << 2;
    let _ = BRANCH_DISP_SIGN_BIT;

    let pal_function = raw & PAL_FUNCTION_MASK;

    Decoded {
        raw,
        opcode,
        format,
        ra,
        rb,
        rc,
        function,
        literal_mode,
        literal,
        mem_disp,
        branch_disp,
        pal_function,
    }
}

/// Sign-extends the low `bits` bits of `val` to a 64-bit signed value.
fn sign_extend(val: u32, bits: u32) -> i64 {
    let shift = 32 - bits;
    (((val << shift) as i32) >> shift) as i64
}
