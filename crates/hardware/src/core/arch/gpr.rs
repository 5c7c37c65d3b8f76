//! Alpha AXP Integer Register File.
//!
//! This module implements the architectural integer register file. It performs
//! the following:
//! 1. **Storage:** Maintains 32 integer registers (R0-R31).
//! 2. **Invariant Enforcement:** Ensures that register R31 always reads as zero.
//! 3. **Debugging:** Provides utilities for dumping the complete register state.

/// Integer register file.
///
/// Contains 32 architectural integer registers. Register R31 is hardwired to
/// zero: writes to it are discarded and reads always return 0, regardless of
/// any prior write.
pub struct Gpr {
    regs: [u64; 32],
}

impl Gpr {
    /// Creates a new integer register file with all registers initialized to zero.
    pub fn new() -> Self {
        Self { regs: [0; 32] }
    }

    /// Reads an integer register value. Register R31 always returns 0.
    pub fn read(&self, idx: usize) -> u64 {
        if idx == 31 { 0 } else { self.regs[idx] }
    }

    /// Writes a value to an integer register. Writes to R31 are silently discarded.
    pub fn write(&mut self, idx: usize, val: u64) {
        if idx != 31 {
            self.regs[idx] = val;
        }
    }

    /// Dumps the contents of all integer registers to stdout.
    pub fn dump(&self) {
        for i in (0..32).step_by(2) {
            println!(
                "R{:<2}={:#018x} R{:<2}={:#018x}",
                i,
                self.regs[i],
                i + 1,
                self.regs[i + 1]
            );
        }
    }
}
