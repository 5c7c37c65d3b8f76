//! End-to-end tests: guest programs driven through the full simulator.

/// Power-up lifecycle and boot image installation.
pub mod boot;


/// PALcode entry, IPR access, and interrupt delivery.
pub mod pal;

/// Architectural programs: ALU, branches, floating point.
pub mod programs;
