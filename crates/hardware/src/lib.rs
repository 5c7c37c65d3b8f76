//! Alpha AXP 21264 (EV68) processor simulator library.
//!
//! This crate implements the 21264's execution semantics at the
//! architectural-contract level: a four-issue, out-of-order pipeline with
//! register renaming and in-order retirement, organized the way the chip
//! is:
//! 1. **Ibox:** fetch, tournament branch prediction, decode/rename/slot,
//!    issue queues, and precise retirement with PALcode exception dispatch.
//! 2. **Ebox/Fbox:** four integer sub-cluster pipes and three
//!    floating-point pipes behind age-priority arbiters.
//! 3. **Mbox:** load/store queues with forwarding and replay, the DTB, and
//!    the L1 Dcache.
//! 4. **Cbox:** the Bcache, duplicate-tag coherence, the MAF/VDB/IOWB/PQ
//!    queue subsystem, and the system port.
//! 5. **Simulation:** `Simulator` (owns the CPU), boot image loading,
//!    configuration, and statistics.

/// Common types and constants (addresses, registers, traps, access types).
pub mod common;
/// Simulator configuration (defaults, enums, hierarchical config structures).
pub mod config;
/// CPU core (architectural state, the five boxes, pipeline structures).
pub mod core;
/// Instruction set (decode, slotting, execute semantics, opcode tables).
pub mod isa;
/// Simulation: `Simulator` and boot image loading.
pub mod sim;
/// System port backing store (flat DRAM buffer).
pub mod soc;
/// Simulation statistics collection and reporting.
pub mod stats;

/// Root configuration type; use `Config::default()` or deserialize from JSON.
pub use crate::config::Config;
/// Main CPU type; owns the Ibox, Mbox, Cbox, and architectural state.
pub use crate::core::Cpu;
/// Top-level simulator; drives the CPU lifecycle and cycle loop.
pub use crate::sim::simulator::Simulator;
/// Flat physical memory behind the system port.
pub use crate::soc::SystemPort;
