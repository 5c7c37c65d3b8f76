//! Memory Access Types.
//!
//! This module defines the classification of memory accesses used throughout the simulator.
//! These types are used for the following:
//! 1. **Permission validation:** checking the DTB/ITB's page-level access bits.
//! 2. **Fault generation:** determining `FaultOnRead` / `FaultOnWrite` / `FaultOnExecute`.
//! 3. **Statistics tracking:** categorizing memory operations for performance analysis.

/// Type of memory access operation.
///
/// Used to distinguish between instruction fetches (Ibox, via the ITB), data loads
/// (Mbox LQ, via the DTB) and data stores (Mbox SQ, via the DTB).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessType {
    /// Instruction fetch access (Istream), translated by the ITB.
    Fetch,

    /// Data read access (LDx family), translated by the DTB.
    Read,

    /// Data write access (STx family), translated by the DTB.
    Write,
}
