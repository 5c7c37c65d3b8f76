//! Configuration system for the Alpha AXP 21264 simulator.
//!
//! This module defines all configuration structures and enums used to parameterize
//! the simulator. It provides:
//! 1. **Defaults:** Baseline hardware constants (Icache/Dcache/Bcache geometry, queue depths).
//! 2. **Structures:** Hierarchical config for general, system, queue, cache, and predictor settings.
//! 3. **Enums:** Cache replacement policy and branch predictor selection.
//!
//! Every queue depth and register-file size defaults to its architectural value
//! (matching the constants in `common::constants`) but can be overridden for
//! experimentation; deserializing an empty `{}` reproduces the real 21264.

use serde::Deserialize;

use crate::common::constants;

/// Default configuration constants for the simulator.
mod defaults {
    use crate::common::constants;

    /// Base physical address of the PALcode image (SROM load point).
    pub const PAL_BASE: u64 = 0x0001_0000;

    /// Base physical address of main system memory.
    pub const RAM_BASE: u64 = 0x0010_0000;

    /// Total size of simulated flat system memory (128 MiB).
    pub const RAM_SIZE: usize = 128 * 1024 * 1024;

    /// System port round-trip latency in cycles for an uncached reference.
    pub const SYSTEM_PORT_LATENCY: u64 = 80;

    /// Icache size in bytes (64 KiB, 2-way).
    pub const ICACHE_SIZE: usize = 64 * 1024;
    /// Dcache size in bytes (64 KiB, 2-way).
    pub const DCACHE_SIZE: usize = 64 * 1024;
    /// Cache associativity (2-way set-associative for Icache/Dcache).
    pub const CACHE_WAYS: usize = 2;
    /// Bcache (off-chip L2) size in bytes (4 MiB, direct-mapped).
    pub const BCACHE_SIZE: usize = 4 * 1024 * 1024;

    /// Host-side livelock detection threshold (not architectural).
    pub const HANG_DETECTION_THRESHOLD: u64 = constants::HANG_DETECTION_THRESHOLD;
}

/// Way-selection policies for the Icache/Dcache.
///
/// The Bcache is direct-mapped and has no way to choose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReplacementPolicy {
    /// Least recently used.
    #[default]
    Lru,
    /// The `set_0_1` rotating fill selector the 21264's two-way caches
    /// actually implement.
    RoundRobin,
}

/// Root configuration structure containing all simulator settings.
///
/// # Examples
///
/// ```
/// use axp21264_core::config::Config;
///
/// let config = Config::default();
/// assert_eq!(config.queues.iq_depth, 20);
/// assert_eq!(config.registers.int_phys_regs, 80);
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// General simulation settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// System memory map and system-port parameters.
    #[serde(default)]
    pub system: SystemConfig,
    /// Issue/load/store/Cbox queue depths.
    #[serde(default)]
    pub queues: QueueConfig,
    /// Physical and architectural register file sizes.
    #[serde(default)]
    pub registers: RegisterConfig,
    /// Cache hierarchy configuration.
    #[serde(default)]
    pub cache: CacheHierarchyConfig,
    /// Branch predictor configuration.
    #[serde(default)]
    pub predictor: PredictorConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            system: SystemConfig::default(),
            queues: QueueConfig::default(),
            registers: RegisterConfig::default(),
            cache: CacheHierarchyConfig::default(),
            predictor: PredictorConfig::default(),
        }
    }
}

/// General simulation settings and options.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    /// Enable per-component `tracing` spans (`ibox.tick`, `ebox.tick`, etc.).
    #[serde(default)]
    pub trace_instructions: bool,

    /// Base physical address PALcode is loaded at and the Ibox resets to.
    #[serde(default = "GeneralConfig::default_pal_base")]
    pub pal_base: u64,

    /// Host-side cycles with no retirement before the diagnostics layer
    /// flags a livelock. Not an architectural timeout.
    #[serde(default = "GeneralConfig::default_hang_threshold")]
    pub hang_detection_threshold: u64,
}

impl GeneralConfig {
    fn default_pal_base() -> u64 {
        defaults::PAL_BASE
    }

    fn default_hang_threshold() -> u64 {
        defaults::HANG_DETECTION_THRESHOLD
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            trace_instructions: false,
            pal_base: defaults::PAL_BASE,
            hang_detection_threshold: defaults::HANG_DETECTION_THRESHOLD,
        }
    }
}

/// System memory map and system-port configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SystemConfig {
    /// Base physical address of flat system memory.
    #[serde(default = "SystemConfig::default_ram_base")]
    pub ram_base: u64,

    /// Size of flat system memory in bytes.
    #[serde(default = "SystemConfig::default_ram_size")]
    pub ram_size: usize,

    /// Fixed round-trip latency, in cycles, for an uncached system-port reference.
    #[serde(default = "SystemConfig::default_latency")]
    pub system_port_latency: u64,
}

impl SystemConfig {
    fn default_ram_base() -> u64 {
        defaults::RAM_BASE
    }

    fn default_ram_size() -> usize {
        defaults::RAM_SIZE
    }

    fn default_latency() -> u64 {
        defaults::SYSTEM_PORT_LATENCY
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            ram_base: defaults::RAM_BASE,
            ram_size: defaults::RAM_SIZE,
            system_port_latency: defaults::SYSTEM_PORT_LATENCY,
        }
    }
}

/// Issue queue, load/store queue, and Cbox queue depths.
///
/// Every field defaults to the architectural depth named in
/// `common::constants`; override only to explore non-21264 configurations.
#[derive(Debug, Clone, Deserialize)]
pub struct QueueConfig {
    /// Integer issue queue depth.
    #[serde(default = "QueueConfig::default_iq")]
    pub iq_depth: usize,
    /// Floating-point issue queue depth.
    #[serde(default = "QueueConfig::default_fq")]
    pub fq_depth: usize,
    /// Load queue depth.
    #[serde(default = "QueueConfig::default_lq")]
    pub lq_depth: usize,
    /// Store queue depth.
    #[serde(default = "QueueConfig::default_sq")]
    pub sq_depth: usize,
    /// Miss Address File depth.
    #[serde(default = "QueueConfig::default_maf")]
    pub maf_depth: usize,
    /// Victim Data Buffer depth.
    #[serde(default = "QueueConfig::default_vdb")]
    pub vdb_depth: usize,
    /// I/O Write Buffer depth.
    #[serde(default = "QueueConfig::default_iowb")]
    pub iowb_depth: usize,
    /// Probe Queue depth.
    #[serde(default = "QueueConfig::default_pq")]
    pub pq_depth: usize,
}

impl QueueConfig {
    fn default_iq() -> usize {
        constants::IQ_DEPTH
    }
    fn default_fq() -> usize {
        constants::FQ_DEPTH
    }
    fn default_lq() -> usize {
        constants::LQ_DEPTH
    }
    fn default_sq() -> usize {
        constants::SQ_DEPTH
    }
    fn default_maf() -> usize {
        constants::MAF_DEPTH
    }
    fn default_vdb() -> usize {
        constants::VDB_DEPTH
    }
    fn default_iowb() -> usize {
        constants::IOWB_DEPTH
    }
    fn default_pq() -> usize {
        constants::PQ_DEPTH
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            iq_depth: constants::IQ_DEPTH,
            fq_depth: constants::FQ_DEPTH,
            lq_depth: constants::LQ_DEPTH,
            sq_depth: constants::SQ_DEPTH,
            maf_depth: constants::MAF_DEPTH,
            vdb_depth: constants::VDB_DEPTH,
            iowb_depth: constants::IOWB_DEPTH,
            pq_depth: constants::PQ_DEPTH,
        }
    }
}

/// Physical and architectural register file sizes.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterConfig {
    /// Integer physical register file size.
    #[serde(default = "RegisterConfig::default_int_phys")]
    pub int_phys_regs: usize,
    /// Floating-point physical register file size.
    #[serde(default = "RegisterConfig::default_fp_phys")]
    pub fp_phys_regs: usize,
}

impl RegisterConfig {
    fn default_int_phys() -> usize {
        constants::INT_PHYS_REGS
    }
    fn default_fp_phys() -> usize {
        constants::FP_PHYS_REGS
    }
}

impl Default for RegisterConfig {
    fn default() -> Self {
        Self {
            int_phys_regs: constants::INT_PHYS_REGS,
            fp_phys_regs: constants::FP_PHYS_REGS,
        }
    }
}

/// Cache hierarchy configuration: Icache, Dcache, and Bcache.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheHierarchyConfig {
    /// Icache configuration.
    #[serde(default = "CacheHierarchyConfig::default_icache")]
    pub icache: CacheConfig,
    /// Dcache configuration.
    #[serde(default = "CacheHierarchyConfig::default_dcache")]
    pub dcache: CacheConfig,
    /// Bcache (off-chip, board-level L2) configuration.
    #[serde(default = "CacheHierarchyConfig::default_bcache")]
    pub bcache: BcacheConfig,
}

impl CacheHierarchyConfig {
    fn default_icache() -> CacheConfig {
        CacheConfig {
            size_bytes: defaults::ICACHE_SIZE,
            ways: defaults::CACHE_WAYS,
            policy: ReplacementPolicy::default(),
        }
    }

    fn default_dcache() -> CacheConfig {
        CacheConfig {
            size_bytes: defaults::DCACHE_SIZE,
            ways: defaults::CACHE_WAYS,
            policy: ReplacementPolicy::default(),
        }
    }

    fn default_bcache() -> BcacheConfig {
        BcacheConfig {
            size_bytes: defaults::BCACHE_SIZE,
        }
    }
}

impl Default for CacheHierarchyConfig {
    fn default() -> Self {
        Self {
            icache: Self::default_icache(),
            dcache: Self::default_dcache(),
            bcache: Self::default_bcache(),
        }
    }
}

/// On-chip cache (Icache/Dcache) geometry. Line size is fixed at 64 bytes
/// architecturally, so it is not configurable.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// Total cache size in bytes.
    #[serde(default = "CacheConfig::default_size")]
    pub size_bytes: usize,
    /// Associativity (number of ways).
    #[serde(default = "CacheConfig::default_ways")]
    pub ways: usize,
    /// Replacement policy.
    #[serde(default)]
    pub policy: ReplacementPolicy,
}

impl CacheConfig {
    fn default_size() -> usize {
        defaults::ICACHE_SIZE
    }
    fn default_ways() -> usize {
        defaults::CACHE_WAYS
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            size_bytes: defaults::ICACHE_SIZE,
            ways: defaults::CACHE_WAYS,
            policy: ReplacementPolicy::default(),
        }
    }
}

/// Bcache (board-level, direct-mapped) geometry; size ranges from 1 to 16 MiB.
#[derive(Debug, Clone, Deserialize)]
pub struct BcacheConfig {
    /// Total Bcache size in bytes.
    #[serde(default = "BcacheConfig::default_size")]
    pub size_bytes: usize,
}

impl BcacheConfig {
    fn default_size() -> usize {
        defaults::BCACHE_SIZE
    }
}

impl Default for BcacheConfig {
    fn default() -> Self {
        Self {
            size_bytes: defaults::BCACHE_SIZE,
        }
    }
}

/// Two-level local/global tournament branch predictor configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PredictorConfig {
    /// Local history register width, in bits (indexes the local prediction table).
    #[serde(default = "PredictorConfig::default_local_hist_bits")]
    pub local_hist_bits: usize,
    /// Local prediction table size, log2 entries.
    #[serde(default = "PredictorConfig::default_local_pred_bits")]
    pub local_pred_bits: usize,
    /// Global history register width, in bits.
    #[serde(default = "PredictorConfig::default_global_hist_bits")]
    pub global_hist_bits: usize,
    /// Return address stack depth.
    #[serde(default = "PredictorConfig::default_ras_size")]
    pub ras_size: usize,
    /// Branch target buffer entry count.
    #[serde(default = "PredictorConfig::default_btb_size")]
    pub btb_size: usize,
}

impl PredictorConfig {
    fn default_local_hist_bits() -> usize {
        10
    }
    fn default_local_pred_bits() -> usize {
        10
    }
    fn default_global_hist_bits() -> usize {
        12
    }
    fn default_ras_size() -> usize {
        32
    }
    fn default_btb_size() -> usize {
        1024
    }
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            local_hist_bits: Self::default_local_hist_bits(),
            local_pred_bits: Self::default_local_pred_bits(),
            global_hist_bits: Self::default_global_hist_bits(),
            ras_size: Self::default_ras_size(),
            btb_size: Self::default_btb_size(),
        }
    }
}
