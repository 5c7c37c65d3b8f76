//! Alpha AXP architecture-specific components.
//!
//! This module contains the implementation of core Alpha AXP architectural elements.
//! It includes the following modules:
//! 1. **IPRs:** Internal Processor Register definitions and access logic.
//! 2. **FPRs:** Floating-point register file implementation.
//! 3. **GPRs:** Integer register file implementation.
//! 4. **Modes:** Privilege mode definitions and transitions.
//! 5. **Traps:** Trap dispatch utilities.

/// Internal Processor Register (IPR) definitions and access logic.
pub mod ipr;

/// Floating-point register file implementation.
pub mod fpr;

/// Integer register file implementation.
pub mod gpr;

/// Privilege mode definitions and transitions.
pub mod mode;

/// Trap dispatch utilities.
pub mod trap;
