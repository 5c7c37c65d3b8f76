//! Physical and Virtual Address types.
//!
//! This module defines strong types for physical and virtual addresses to prevent
//! accidental mixing of address spaces. It provides the following:
//! 1. **Type Safety:** Distinguishes between virtual and physical address spaces at compile time.
//! 2. **Address Manipulation:** Provides helper methods for extracting cache-line alignment and offsets.
//! 3. **DTB/ITB Integration:** Acts as the primary interface for address translation operations.

/// A virtual address in the Alpha AXP address space.
///
/// Virtual addresses are used by software and must be translated to physical addresses
/// through the DTB/ITB before accessing memory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct VirtAddr(pub u64);

/// A physical address in the Alpha AXP address space.
///
/// Physical addresses represent actual hardware memory locations and are used
/// after virtual-to-physical address translation has completed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct PhysAddr(pub u64);

impl VirtAddr {
    /// Creates a new virtual address from a raw 64-bit value.
    #[inline(always)]
    pub fn new(addr: u64) -> Self {
        Self(addr)
    }

    /// Returns the raw 64-bit address value.
    #[inline(always)]
    pub fn val(&self) -> u64 {
        self.0
    }

    /// Extracts the byte offset within the 64-byte cache line containing this address.
    pub fn line_offset(&self) -> u64 {
        self.0 & 0x3F
    }
}

impl PhysAddr {
    /// Creates a new physical address from a raw 64-bit value.
    #[inline(always)]
    pub fn new(addr: u64) -> Self {
        Self(addr)
    }

    /// Returns the raw 64-bit address value.
    #[inline(always)]
    pub fn val(&self) -> u64 {
        self.0
    }

    /// Aligns this address down to the start of its containing 64-byte cache line.
    ///
    /// Every Alpha cache block (Icache, Dcache, Bcache) is 64 bytes; this is the
    /// block-address projection used by the Cbox miss-address file, Bcache writes,
    /// and DTAG/CTAG lookups.
    #[inline(always)]
    pub fn line_base(&self) -> u64 {
        self.0 & !0x3F
    }

    /// Extracts the byte offset within the 64-byte cache line containing this address.
    #[inline(always)]
    pub fn line_offset(&self) -> u64 {
        self.0 & 0x3F
    }
}
