//! Data/Instruction Translation Buffer (DTB/ITB).
//!
//! A 128-entry, address-space-number-tagged translation buffer. Unlike a
//! hardware page-table walker, the 21264 has none: on a miss, PALcode does
//! the page-table walk in software and fills the buffer explicitly via
//! `HW_MTPR` writes to the tag/PTE IPR pair. This structure only models the
//! buffer itself; the fill path lives in `Cpu`.

/// A single DTB/ITB entry.
#[derive(Clone, Copy, Default)]
struct TbEntry {
    /// Virtual page number (tag), shifted right by the page-size granularity hint.
    vpn: u64,
    /// Physical page number.
    ppn: u64,
    /// Address space number this entry was filled under.
    asn: u64,
    /// Address-space-match: when set, this entry matches regardless of the
    /// current ASN (used for globally-shared mappings like PALcode itself).
    asm: bool,
    /// Fault-on-read permission bit.
    fault_on_read: bool,
    /// Fault-on-write permission bit.
    fault_on_write: bool,
    /// Fault-on-execute permission bit (ITB only).
    fault_on_execute: bool,
    /// Entry validity flag.
    valid: bool,
}

/// Translation buffer structure shared by the DTB and ITB.
pub struct Tlb {
    entries: Vec<TbEntry>,
    mask: usize,
}

/// Permission bits returned by a translation buffer lookup.
#[derive(Clone, Copy, Debug)]
pub struct TbPermissions {
    /// Physical page number.
    pub ppn: u64,
    /// Fault if this is a read access.
    pub fault_on_read: bool,
    /// Fault if this is a write access.
    pub fault_on_write: bool,
    /// Fault if this is an instruction fetch.
    pub fault_on_execute: bool,
}

impl Tlb {
    /// Creates a new translation buffer with the given entry count (rounded
    /// up to a power of two for direct indexing).
    pub fn new(size: usize) -> Self {
        let safe_size = if size.is_power_of_two() {
            size
        } else {
            size.next_power_of_two()
        };
        Self {
            entries: vec![TbEntry::default(); safe_size],
            mask: safe_size - 1,
        }
    }

    /// Looks up a virtual page number under the given address space number.
    ///
    /// Entries with the ASM bit set match regardless of `asn`.
    pub fn lookup(&self, vpn: u64, asn: u64) -> Option<TbPermissions> {
        let idx = (vpn as usize) & self.mask;
        let entry = &self.entries[idx];
        if entry.valid && entry.vpn == vpn && (entry.asm || entry.asn == asn) {
            Some(TbPermissions {
                ppn: entry.ppn,
                fault_on_read: entry.fault_on_read,
                fault_on_write: entry.fault_on_write,
                fault_on_execute: entry.fault_on_execute,
            })
        } else {
            None
        }
    }

    /// Fills a translation buffer entry, as PALcode does via `HW_MTPR` to the
    /// tag/PTE IPR pair after a software page-table walk.
    #[allow(clippy::too_many_arguments)]
    pub fn fill(
        &mut self,
        vpn: u64,
        ppn: u64,
        asn: u64,
        asm: bool,
        fault_on_read: bool,
        fault_on_write: bool,
        fault_on_execute: bool,
    ) {
        let idx = (vpn as usize) & self.mask;
        self.entries[idx] = TbEntry {
            vpn,
            ppn,
            asn,
            asm,
            fault_on_read,
            fault_on_write,
            fault_on_execute,
            valid: true,
        };
    }

    /// Invalidates every entry (`ITB_IA`/`DTB_IA`).
    pub fn flush_all(&mut self) {
        for e in &mut self.entries {
            e.valid = false;
        }
    }

    /// Invalidates a single entry by virtual address (`ITB_IS`/`DTB_IS`).
    pub fn flush_single(&mut self, vpn: u64) {
        let idx = (vpn as usize) & self.mask;
        self.entries[idx].valid = false;
    }

    /// Invalidates every non-ASM entry belonging to the given address space.
    ///
    /// Used when an ASN is recycled, since stale translations under a reused
    /// ASN would otherwise silently match new processes.
    pub fn flush_asn(&mut self, asn: u64) {
        for e in &mut self.entries {
            if !e.asm && e.asn == asn {
                e.valid = false;
            }
        }
    }
}
