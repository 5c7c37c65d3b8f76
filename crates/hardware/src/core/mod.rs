//! Core processor implementation.
//!
//! This module contains the CPU proper: architectural state (registers,
//! IPRs, privilege modes), the in-flight pipeline structures (rename,
//! active list, issue queues, load/store queues), the stateful units
//! (branch prediction, caches, translation buffers, the Cbox), and the
//! orchestrating `Cpu` that advances them all once per cycle.

/// Architecture-specific components (IPRs, register files, privilege modes, traps).
pub mod arch;

/// CPU core implementation and per-cycle orchestration.
pub mod cpu;

/// In-flight pipeline structures (rename, active list, issue and load/store queues).
pub mod pipeline;

/// Stateful units (branch predictor, caches, MMU, Cbox).
pub mod units;

pub use self::cpu::Cpu;
