//! Cbox control and status registers.
//!
//! The real 21264 shifts these in serially at power-up from the SROM; the
//! simulator's configuration loader writes them by name instead. Unknown
//! names fail the load, matching the all-or-nothing CSR chain: a chain with
//! one bad bit position is a broken chain.

use crate::common::error::InitError;

/// Cbox CSR block: the subset that steers the behavior modeled here.
#[derive(Clone, Debug)]
pub struct CboxCsrs {
    /// Bcache size selector: the Bcache holds `(bc_size + 1)` MB.
    pub bc_size: u64,
    /// System bus acknowledgment limit; writing it resets the outstanding
    /// acknowledgment counter.
    pub sysbus_ack_limit: u64,
    /// Enables `STCChangeToDirty` for store-conditional upgrades; when
    /// clear, `STx_C` upgrades use the plain change-to-dirty commands.
    pub stc_enable: bool,
    /// Enables `InvalToDirty` for WH64; when clear, WH64 falls back to
    /// `ReadBlkMod`.
    pub inval_to_dirty_enable: bool,
    /// Enables the `Evict` system command for ECB; when clear, ECB is a
    /// no-op on the bus.
    pub enable_evict: bool,
    /// When set, quadword I/O merges in 32-byte windows; when clear, in
    /// 64-byte windows.
    pub sysbus_format: bool,
    /// Outstanding system-bus acknowledgment counter (not a CSR; reset as a
    /// side effect of writing `sysbus_ack_limit`).
    pub ack_counter: u64,
}

impl Default for CboxCsrs {
    fn default() -> Self {
        Self {
            bc_size: 3, // 4 MB
            sysbus_ack_limit: 8,
            stc_enable: true,
            inval_to_dirty_enable: true,
            enable_evict: true,
            sysbus_format: false,
            ack_counter: 0,
        }
    }
}

impl CboxCsrs {
    /// Applies one name/value pair from the configuration source. Unknown
    /// names fail the load.
    pub fn apply(&mut self, name: &str, value: u64) -> Result<(), InitError> {
        match name {
            "BcSize" => self.bc_size = value & 0xF,
            "SysbusAckLimit" => {
                self.sysbus_ack_limit = value;
                self.ack_counter = 0;
            }
            "StcEnable" => self.stc_enable = value != 0,
            "InvalToDirtyEnable" => self.inval_to_dirty_enable = value != 0,
            "EnableEvict" => self.enable_evict = value != 0,
            "SysbusFormat" => self.sysbus_format = value != 0,
            _ => return Err(InitError::UnknownCsr(name.to_string())),
        }
        Ok(())
    }

    /// Bcache capacity in bytes implied by `bc_size`.
    pub fn bcache_bytes(&self) -> usize {
        ((self.bc_size as usize) + 1) * 1024 * 1024
    }
}
