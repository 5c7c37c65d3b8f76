//! Trap and Translation Result definitions.
//!
//! This module defines the error handling and trap mechanisms for the simulator. It provides:
//! 1. **Trap representation:** the architectural exception taxonomy that the Ibox dispatches
//!    precisely at retirement.
//! 2. **Translation results:** reporting the outcome of DTB/ITB address translation.
//! 3. **Error handling:** integrating with `thiserror` for system-level reporting.

use thiserror::Error;

use super::addr::PhysAddr;

/// Alpha AXP 21264 architectural exception taxonomy.
///
/// Every synchronous fault and the one asynchronous interrupt class the Ibox
/// dispatches at retirement are represented here. Execute-stage handlers return
/// a `Trap` by value in the instruction descriptor rather than propagating a
/// `Result` through the hot path.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum Trap {
    /// A floating-point or integer overflow/underflow/inexact condition that the
    /// FPCR's enable bits route to a trap rather than silently flushing.
    #[error("ArithmeticTraps")]
    ArithmeticTraps,

    /// An operand value is invalid for the operation (e.g. IEEE invalid operand,
    /// signaling NaN into an arithmetic op).
    #[error("IllegalOperand")]
    IllegalOperand,

    /// A load (or Istream fetch routed through the data path) faulted on
    /// permission or translation.
    #[error("FaultOnRead({0:#x})")]
    FaultOnRead(u64),

    /// A store faulted on permission or translation.
    #[error("FaultOnWrite({0:#x})")]
    FaultOnWrite(u64),

    /// An instruction fetch faulted on permission or translation.
    #[error("FaultOnExecute({0:#x})")]
    FaultOnExecute(u64),

    /// DTB or ITB miss; handled by PAL's TB-fill handler.
    #[error("TBMissFault({0:#x})")]
    TBMissFault(u64),

    /// A memory reference's address was not naturally aligned for its width.
    #[error("UnalignedAccess({0:#x})")]
    UnalignedAccess(u64),

    /// Reserved/unimplemented opcode or function field (`AXP_OPCDEC`).
    #[error("AXP_OPCDEC({0:#06x})")]
    ReservedOpcode(u32),

    /// A pending external or software interrupt, posted by the Cbox at a
    /// retirement boundary (`AXP_INTERRUPT`).
    #[error("AXP_INTERRUPT")]
    Interrupt,
}

impl Trap {
    /// Returns the fixed PAL-base offset (in bytes) this exception dispatches to.
    ///
    /// These offsets follow the 21264 PALcode entry-point layout: each exception
    /// kind has a distinct vector so PAL code does not need to re-decode the cause.
    pub fn pal_offset(&self) -> u64 {
        match self {
            Trap::ArithmeticTraps => 0x0500,
            Trap::IllegalOperand => 0x0580,
            Trap::FaultOnRead(_) => 0x0600,
            Trap::FaultOnWrite(_) => 0x0680,
            Trap::FaultOnExecute(_) => 0x0700,
            Trap::TBMissFault(_) => 0x0780,
            Trap::UnalignedAccess(_) => 0x0800,
            Trap::ReservedOpcode(_) => 0x0880,
            Trap::Interrupt => 0x0900,
        }
    }
}

/// Result of a DTB/ITB address translation operation.
///
/// This structure encapsulates the outcome of a translation lookaside buffer
/// lookup (and, on miss, the PAL TB-fill path), including a cycle estimate and
/// any fault that occurred.
pub struct TranslationResult {
    /// The translated physical address, or zero if translation failed.
    pub paddr: PhysAddr,
    /// Number of cycles consumed by the translation operation.
    pub cycles: u64,
    /// Trap that occurred during translation, if any.
    pub trap: Option<Trap>,
}

impl TranslationResult {
    /// Creates a successful translation result.
    #[inline]
    pub fn success(paddr: PhysAddr, cycles: u64) -> Self {
        Self {
            paddr,
            cycles,
            trap: None,
        }
    }

    /// Creates a translation result indicating a fault occurred.
    #[inline]
    pub fn fault(trap: Trap, cycles: u64) -> Self {
        Self {
            paddr: PhysAddr(0),
            cycles,
            trap: Some(trap),
        }
    }
}

/// Failures surfaced during CPU/Cbox initialization: BiST, CSR load, or
/// SROM image installation. These are reported to the caller via `Result`
/// rather than the per-instruction `Trap` path, since they occur before any
/// instruction has been fetched.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum InitError {
    /// A CSR loader name/value pair referenced a Cbox CSR field that does not exist.
    #[error("unknown Cbox CSR field: {0}")]
    UnknownCsr(String),

    /// The SROM image exceeded the addressable Icache block range, or was not a
    /// whole number of 32-bit instruction words.
    #[error("invalid SROM image: {0}")]
    InvalidImage(String),

    /// Built-in self-test failed during `WaitBiST`/`WaitBiSI`.
    #[error("BiST failure in component: {0}")]
    BistFailure(&'static str),
}
