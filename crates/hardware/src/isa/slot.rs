//! Opcode slotting table: which queue and execution pipe each of the 64
//! primary opcodes targets.
//!
//! The Ibox consults this table once per decoded instruction to pick the
//! issue queue (IQ or FQ), the Ebox sub-cluster pair (lower for loads,
//! stores, branches and plain ALU work; upper for shifts, multiplies and
//! byte manipulation) or the Fbox functional grouping (add, multiply,
//! other), and the register-use pattern that drives renaming. Every opcode
//! slot is defined, including the reserved ones: a reserved opcode still
//! renames, slots, executes (to an `AXP_OPCDEC` outcome) and retires like
//! any other instruction, so decode never has an undefined case.

use super::instruction::Format;
use super::{function_codes::flti, opcodes};
use crate::core::arch::ipr;

/// Broad operation class, used for statistics and retirement side effects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpClass {
    /// `CALL_PAL` entry.
    Pal,
    /// Integer load (LDx family, including LDA/LDAH address forms).
    Load,
    /// Integer store (STx family).
    Store,
    /// Floating-point load (LDF/LDG/LDS/LDT).
    FpLoad,
    /// Floating-point store (STF/STG/STS/STT).
    FpStore,
    /// Conditional or unconditional PC-relative branch.
    Branch,
    /// Floating-point conditional branch.
    FpBranch,
    /// Memory-format jump (JMP/JSR/RET/JSR_COROUTINE).
    Jump,
    /// Integer operate.
    IntOp,
    /// Floating-point operate.
    FpOp,
    /// Miscellaneous memory-format op (MB/WMB/FETCH/RPCC/ECB/WH64).
    Misc,
    /// PALcode-only pseudo-op (HW_MFPR/HW_MTPR/HW_LD/HW_ST/HW_RET).
    HwPal,
    /// Reserved opcode; executes to `AXP_OPCDEC`.
    Reserved,
}

/// Which issue queue an opcode dispatches into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Queue {
    /// Integer issue queue (20 entries).
    Iq,
    /// Floating-point issue queue (15 entries).
    Fq,
}

/// Execution pipe request presented to the arbiters.
///
/// Integer instructions request a sub-cluster *pair* (both lowers or both
/// uppers); the arbiter resolves the pair to a concrete cluster, preferring
/// L0 for lower and U1 for upper when both are free. `Lower0`/`Lower1` are
/// the restricted forms used by IPR accesses whose target register is wired
/// to one cluster only.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pipe {
    /// Either lower sub-cluster (L0 or L1).
    Lower,
    /// Lower sub-cluster 0 only.
    Lower0,
    /// Lower sub-cluster 1 only.
    Lower1,
    /// Either upper sub-cluster (U0 or U1).
    Upper,
    /// Floating-point add pipe.
    FpAdd,
    /// Floating-point multiply pipe.
    FpMul,
    /// Floating-point other pipe (divide, square root, convert, move).
    FpOther,
}

/// How an instruction uses one of its three register fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegUse {
    /// Field is unused.
    None,
    /// Integer source.
    SrcInt,
    /// Floating-point source.
    SrcFp,
    /// Integer destination.
    DestInt,
    /// Floating-point destination.
    DestFp,
}

/// One entry of the 64-entry opcode slotting table.
#[derive(Clone, Copy, Debug)]
pub struct OpSlot {
    /// Instruction format.
    pub format: Format,
    /// Broad operation class.
    pub class: OpClass,
    /// Issue queue target.
    pub queue: Queue,
    /// Default execution pipe request.
    pub pipe: Pipe,
    /// Use of the Ra field.
    pub ra: RegUse,
    /// Use of the Rb field.
    pub rb: RegUse,
    /// Use of the Rc field.
    pub rc: RegUse,
}

const fn op(
    format: Format,
    class: OpClass,
    queue: Queue,
    pipe: Pipe,
    ra: RegUse,
    rb: RegUse,
    rc: RegUse,
) -> OpSlot {
    OpSlot {
        format,
        class,
        queue,
        pipe,
        ra,
        rb,
        rc,
    }
}

const RESERVED: OpSlot = op(
    Format::Memory,
    OpClass::Reserved,
    Queue::Iq,
    Pipe::Lower,
    RegUse::None,
    RegUse::None,
    RegUse::None,
);

/// Integer load: Ra is the destination, Rb the base register.
const INT_LOAD: OpSlot = op(
    Format::Memory,
    OpClass::Load,
    Queue::Iq,
    Pipe::Lower,
    RegUse::DestInt,
    RegUse::SrcInt,
    RegUse::None,
);

/// Integer store: Ra is the data source, Rb the base register.
const INT_STORE: OpSlot = op(
    Format::Memory,
    OpClass::Store,
    Queue::Iq,
    Pipe::Lower,
    RegUse::SrcInt,
    RegUse::SrcInt,
    RegUse::None,
);

const FP_LOAD: OpSlot = op(
    Format::Memory,
    OpClass::FpLoad,
    Queue::Iq,
    Pipe::Lower,
    RegUse::DestFp,
    RegUse::SrcInt,
    RegUse::None,
);

const FP_STORE: OpSlot = op(
    Format::Memory,
    OpClass::FpStore,
    Queue::Iq,
    Pipe::Lower,
    RegUse::SrcFp,
    RegUse::SrcInt,
    RegUse::None,
);

/// Conditional branch: Ra is the tested register.
const COND_BRANCH: OpSlot = op(
    Format::Branch,
    OpClass::Branch,
    Queue::Iq,
    Pipe::Lower,
    RegUse::SrcInt,
    RegUse::None,
    RegUse::None,
);

/// FP conditional branch: Fa is the tested register.
const FP_BRANCH: OpSlot = op(
    Format::Branch,
    OpClass::FpBranch,
    Queue::Fq,
    Pipe::FpAdd,
    RegUse::SrcFp,
    RegUse::None,
    RegUse::None,
);

/// Lower-cluster integer operate (arithmetic/logical).
const INT_OP_LOWER: OpSlot = op(
    Format::Operate,
    OpClass::IntOp,
    Queue::Iq,
    Pipe::Lower,
    RegUse::SrcInt,
    RegUse::SrcInt,
    RegUse::DestInt,
);

/// Upper-cluster integer operate (shift/byte/multiply).
const INT_OP_UPPER: OpSlot = op(
    Format::Operate,
    OpClass::IntOp,
    Queue::Iq,
    Pipe::Upper,
    RegUse::SrcInt,
    RegUse::SrcInt,
    RegUse::DestInt,
);

/// Floating-point operate: Fa/Fb sources, Fc destination. The concrete Fbox
/// pipe is refined per function code by [`fp_pipe`].
const FP_OP: OpSlot = op(
    Format::Operate,
    OpClass::FpOp,
    Queue::Fq,
    Pipe::FpAdd,
    RegUse::SrcFp,
    RegUse::SrcFp,
    RegUse::DestFp,
);

/// The 64-entry primary opcode slotting table, indexed by bits 31:26.
pub const OPCODE_SLOTS: [OpSlot; 64] = {
    let mut t = [RESERVED; 64];

    t[opcodes::CALL_PAL as usize] = op(
        Format::Pal,
        OpClass::Pal,
        Queue::Iq,
        Pipe::Lower,
        RegUse::None,
        RegUse::None,
        RegUse::None,
    );

    // LDA/LDAH compute an address without referencing memory, but they share
    // the memory format and the lower-cluster address adder.
    t[opcodes::LDA as usize] = INT_LOAD;
    t[opcodes::LDAH as usize] = INT_LOAD;
    t[opcodes::LDBU as usize] = INT_LOAD;
    t[opcodes::LDQ_U as usize] = INT_LOAD;
    t[opcodes::LDWU as usize] = INT_LOAD;
    t[opcodes::STW as usize] = INT_STORE;
    t[opcodes::STB as usize] = INT_STORE;
    t[opcodes::STQ_U as usize] = INT_STORE;

    t[opcodes::INTA as usize] = INT_OP_LOWER;
    t[opcodes::INTL as usize] = INT_OP_LOWER;
    t[opcodes::INTS as usize] = INT_OP_UPPER;
    t[opcodes::INTM as usize] = INT_OP_UPPER;
    t[opcodes::ITFP as usize] = op(
        Format::Operate,
        OpClass::FpOp,
        Queue::Fq,
        Pipe::FpOther,
        RegUse::SrcInt,
        RegUse::None,
        RegUse::DestFp,
    );
    t[opcodes::FLTV as usize] = FP_OP;
    t[opcodes::FLTI as usize] = FP_OP;
    t[opcodes::FLTL as usize] = FP_OP;

    // RPCC writes the cycle count into Ra; the barrier/hint forms all name
    // R31 there, which allocates nothing.
    t[opcodes::MISC as usize] = op(
        Format::Memory,
        OpClass::Misc,
        Queue::Iq,
        Pipe::Lower,
        RegUse::DestInt,
        RegUse::SrcInt,
        RegUse::None,
    );
    t[opcodes::HW_MFPR as usize] = op(
        Format::Memory,
        OpClass::HwPal,
        Queue::Iq,
        Pipe::Lower,
        RegUse::DestInt,
        RegUse::None,
        RegUse::None,
    );
    t[opcodes::JSR as usize] = op(
        Format::Memory,
        OpClass::Jump,
        Queue::Iq,
        Pipe::Lower,
        RegUse::DestInt,
        RegUse::SrcInt,
        RegUse::None,
    );
    t[opcodes::HW_LD as usize] = op(
        Format::Memory,
        OpClass::HwPal,
        Queue::Iq,
        Pipe::Lower,
        RegUse::DestInt,
        RegUse::SrcInt,
        RegUse::None,
    );
    t[opcodes::FPTI as usize] = op(
        Format::Operate,
        OpClass::IntOp,
        Queue::Iq,
        Pipe::Upper,
        RegUse::SrcInt,
        RegUse::SrcInt,
        RegUse::DestInt,
    );
    t[opcodes::HW_MTPR as usize] = op(
        Format::Memory,
        OpClass::HwPal,
        Queue::Iq,
        Pipe::Lower,
        RegUse::SrcInt,
        RegUse::None,
        RegUse::None,
    );
    t[opcodes::HW_RET as usize] = op(
        Format::Memory,
        OpClass::HwPal,
        Queue::Iq,
        Pipe::Lower,
        RegUse::None,
        RegUse::SrcInt,
        RegUse::None,
    );
    t[opcodes::HW_ST as usize] = op(
        Format::Memory,
        OpClass::HwPal,
        Queue::Iq,
        Pipe::Lower,
        RegUse::SrcInt,
        RegUse::SrcInt,
        RegUse::None,
    );

    t[opcodes::LDF as usize] = FP_LOAD;
    t[opcodes::LDG as usize] = FP_LOAD;
    t[opcodes::LDS as usize] = FP_LOAD;
    t[opcodes::LDT as usize] = FP_LOAD;
    t[opcodes::STF as usize] = FP_STORE;
    t[opcodes::STG as usize] = FP_STORE;
    t[opcodes::STS as usize] = FP_STORE;
    t[opcodes::STT as usize] = FP_STORE;

    t[opcodes::LDL as usize] = INT_LOAD;
    t[opcodes::LDQ as usize] = INT_LOAD;
    t[opcodes::LDL_L as usize] = INT_LOAD;
    t[opcodes::LDQ_L as usize] = INT_LOAD;
    t[opcodes::STL as usize] = INT_STORE;
    t[opcodes::STQ as usize] = INT_STORE;
    // Store-conditional both reads its data from Ra and writes the success
    // flag back into it; the table records the destination role, and the
    // dispatcher reads the old mapping before renaming.
    t[opcodes::STL_C as usize] = op(
        Format::Memory,
        OpClass::Store,
        Queue::Iq,
        Pipe::Lower,
        RegUse::DestInt,
        RegUse::SrcInt,
        RegUse::None,
    );
    t[opcodes::STQ_C as usize] = t[opcodes::STL_C as usize];

    // BR/BSR write the return address into Ra.
    t[opcodes::BR as usize] = op(
        Format::Branch,
        OpClass::Branch,
        Queue::Iq,
        Pipe::Lower,
        RegUse::DestInt,
        RegUse::None,
        RegUse::None,
    );
    t[opcodes::BSR as usize] = t[opcodes::BR as usize];
    t[opcodes::FBEQ as usize] = FP_BRANCH;
    t[opcodes::FBLT as usize] = FP_BRANCH;
    t[opcodes::FBLE as usize] = FP_BRANCH;
    t[opcodes::FBNE as usize] = FP_BRANCH;
    t[opcodes::FBGE as usize] = FP_BRANCH;
    t[opcodes::FBGT as usize] = FP_BRANCH;
    t[opcodes::BLBC as usize] = COND_BRANCH;
    t[opcodes::BEQ as usize] = COND_BRANCH;
    t[opcodes::BLT as usize] = COND_BRANCH;
    t[opcodes::BLE as usize] = COND_BRANCH;
    t[opcodes::BLBS as usize] = COND_BRANCH;
    t[opcodes::BNE as usize] = COND_BRANCH;
    t[opcodes::BGE as usize] = COND_BRANCH;
    t[opcodes::BGT as usize] = COND_BRANCH;

    t
};

/// Looks up the slot entry for a primary opcode.
#[inline(always)]
pub fn slot(opcode: u32) -> &'static OpSlot {
    &OPCODE_SLOTS[(opcode & 0x3F) as usize]
}

/// Refines a floating-point operate instruction to its Fbox pipe based on
/// the function sub-field: add/subtract/compare to the add pipe, multiply
/// to the multiply pipe, everything else (divide, square root, convert,
/// sign-copy, conditional move) to the other pipe.
pub fn fp_pipe(opcode: u32, function: u32) -> Pipe {
    if opcode != opcodes::FLTI && opcode != opcodes::FLTV {
        return Pipe::FpOther;
    }
    // The low four bits of the FP function field select the operation; the
    // source-type and rounding-mode bits above them do not affect slotting.
    match function & 0xF {
        f if f == (flti::ADDS & 0xF) || f == (flti::SUBS & 0xF) => Pipe::FpAdd,
        f if f == (flti::CMPTUN & 0xF)
            || f == (flti::CMPTEQ & 0xF)
            || f == (flti::CMPTLT & 0xF)
            || f == (flti::CMPTLE & 0xF) =>
        {
            Pipe::FpAdd
        }
        f if f == (flti::MULS & 0xF) => Pipe::FpMul,
        _ => Pipe::FpOther,
    }
}

/// Whether an instruction reads the prior value of its destination: the
/// integer and floating-point conditional moves re-write the old value on
/// the not-moved path, and store-conditional reads its store data from the
/// register it then overwrites with the success flag.
pub fn reads_old_dest(opcode: u32, function: u32) -> bool {
    use crate::isa::function_codes::{fltl, intl};
    match opcode {
        opcodes::INTL => matches!(
            function,
            intl::CMOVEQ
                | intl::CMOVNE
                | intl::CMOVLT
                | intl::CMOVGE
                | intl::CMOVLE
                | intl::CMOVGT
                | intl::CMOVLBS
                | intl::CMOVLBC
        ),
        opcodes::FLTL => matches!(
            function,
            fltl::FCMOVEQ
                | fltl::FCMOVNE
                | fltl::FCMOVLT
                | fltl::FCMOVGE
                | fltl::FCMOVLE
                | fltl::FCMOVGT
        ),
        opcodes::STL_C | opcodes::STQ_C => true,
        _ => false,
    }
}

/// Maps an IPR address to the lower sub-cluster its `HW_MFPR`/`HW_MTPR`
/// access must issue in. Ibox-side IPRs (processor status, exception
/// state, PAL base, interrupt state) are wired to L1; Mbox-side IPRs
/// (translation-buffer control, memory-management status) to L0.
pub fn ipr_pipe(addr: u32) -> Pipe {
    match addr {
        ipr::DTB_ASN | ipr::MM_STAT | ipr::VA | ipr::DTB_IA | ipr::DTB_IS => Pipe::Lower0,
        _ => Pipe::Lower1,
    }
}
