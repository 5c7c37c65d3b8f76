//! Execution units and functional components.
//!
//! Integer and floating-point execute semantics live in `isa::execute`, next
//! to the decoder whose function-field layout they interpret. What remains
//! here are the stateful units: branch prediction, the Icache/Dcache, and
//! DTB/ITB translation.

/// Branch Resolution Unit including the tournament predictor, BTB, and RAS.
pub mod bru;

/// Cbox: Bcache, coherence queues, and the system port.
pub mod cbox;

/// Icache/Dcache implementation with MOSI coherence state and replacement policies.
pub mod cache;

/// Memory Management Unit: DTB/ITB translation buffers.
pub mod mmu;
