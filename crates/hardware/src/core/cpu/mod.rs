//! CPU core definition and per-cycle orchestration.
//!
//! One `Cpu` owns the whole machine, partitioned by component: the Ibox
//! (fetch, rename, issue queues, retirement), the Mbox (load/store queues,
//! Dcache, DTB), and the Cbox (Bcache, coherence queues, system port), plus
//! the shared architectural state they all observe (register file, PC, IPR
//! block, FPCR). A single `tick()` advances every component once per
//! simulated cycle in dependency order — Cbox, Mbox, Ebox/Fbox, Ibox — so
//! mutual exclusion of component state is structural rather than mutex-based
//! and the wake order is deterministic.

/// Ebox/Fbox issue arbiters and execute dispatch.
pub mod ebox;

/// Ibox: fetch, decode, rename, dispatch, and retirement.
pub mod ibox;

/// Mbox: load/store execution, Dcache, and Cbox completion handling.
pub mod mbox;

/// PALcode entry and IPR side effects.
pub mod trap;

use tracing::{debug, info};

use crate::common::RegisterFile;
use crate::common::error::InitError;
use crate::config::Config;
use crate::core::arch::ipr::{self, Ipr};
use crate::core::units::cbox::Cbox;
use crate::core::units::mmu::Mmu;
use crate::stats::SimStats;

use self::ibox::Ibox;
use self::mbox::Mbox;

/// Coarse CPU lifecycle, driven by the Cbox main loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CpuState {
    /// Power-on state; nothing initialized.
    Cold,
    /// Waiting on the built-in self-test.
    WaitBiST,
    /// Waiting on the built-in self-initialization (post-fault re-init).
    WaitBiSI,
    /// Normal operation.
    Run,
    /// A fault forced re-initialization.
    FaultReset,
    /// Quiesced.
    Sleep,
    /// Orderly exit; every component stops at its next iteration.
    ShuttingDown,
}

/// Built-in self-test sub-state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BistState {
    /// Reset asserted.
    SystemReset,
    /// Self-test in progress.
    BistRunning,
    /// Self-test passed.
    BistSucceeded,
    /// Self-test failed; the CPU shuts down.
    BistFailed,
}

/// The CPU: architectural state plus the three stateful boxes.
pub struct Cpu {
    /// Committed architectural register file (R0-R31, F0-F31).
    pub regs: RegisterFile,
    /// Architectural program counter of the fetch front-end.
    pub pc: u64,
    /// Executing PALcode: physical addressing, privileged ops legal.
    pub pal_mode: bool,
    /// Internal processor register block.
    pub ipr: Ipr,
    /// Floating-point control register.
    pub fpcr: u64,
    /// Instruction and data translation buffers.
    pub mmu: Mmu,
    /// Fetch/rename/issue/retire state.
    pub ibox: Ibox,
    /// Load/store queues and Dcache.
    pub mbox: Mbox,
    /// Bcache, coherence queues, system port.
    pub cbox: Cbox,
    /// Performance statistics.
    pub stats: SimStats,
    /// Lifecycle, mirrored from the Cbox each tick.
    pub state: CpuState,
    /// Lock flag line address for LDx_L/STx_C.
    pub lock_line: Option<u64>,
    /// Set when the guest requested a halt (`CALL_PAL 0`); carries the exit
    /// value from R0.
    pub halted: Option<u64>,
    /// Cycle of the most recent retirement, for livelock diagnostics.
    last_retire_cycle: u64,
    /// Livelock warning threshold in cycles (host diagnostics only).
    hang_threshold: u64,
    hang_reported: bool,
}

impl Cpu {
    /// Builds a cold CPU from the configuration.
    pub fn new(config: &Config) -> Self {
        Self {
            regs: RegisterFile::new(),
            pc: 0,
            pal_mode: false,
            ipr: Ipr::new(),
            fpcr: 0,
            mmu: Mmu::new(crate::common::constants::TB_ENTRIES),
            ibox: Ibox::new(config),
            mbox: Mbox::new(config),
            cbox: Cbox::new(config),
            stats: SimStats::default(),
            state: CpuState::Cold,
            lock_line: None,
            halted: None,
            last_retire_cycle: 0,
            hang_threshold: config.general.hang_detection_threshold,
            hang_reported: false,
        }
    }

    /// Installs a boot image (raw 32-bit instruction words) at `pa`, primes
    /// the Icache with its blocks, and points the reset PC at it in PAL
    /// mode — the in-scope half of the SROM load sequence.
    pub fn boot(&mut self, pa: u64, words: &[u32]) -> Result<(), InitError> {
        let blocks = match self.cbox.boot_image(pa, words) {
            Ok(b) => b,
            Err(e) => {
                // An SROM failure is fatal: the lifecycle goes straight to
                // ShuttingDown rather than limping into Run.
                self.cbox.shut_down();
                self.state = CpuState::ShuttingDown;
                return Err(e);
            }
        };
        for (block_pa, block) in blocks {
            self.ibox.install_icache_block(block_pa, &block);
        }
        self.ipr.write(ipr::PAL_BASE, pa);
        self.pc = pa;
        self.pal_mode = true;
        info!(pa, words = words.len(), "boot image installed");
        Ok(())
    }

    /// Loads raw data bytes into physical memory (test fixtures, data
    /// segments).
    pub fn load_memory(&mut self, pa: u64, data: &[u8]) {
        self.cbox.load_memory(pa, data);
    }

    /// Advances the machine by one cycle.
    pub fn tick(&mut self) {
        match self.cbox.state {
            CpuState::Run => {}
            CpuState::ShuttingDown | CpuState::Sleep => {
                self.state = self.cbox.state;
                return;
            }
            _ => {
                // Cold / WaitBiST / WaitBiSI / FaultReset: the Cbox drives
                // the lifecycle forward; nothing else runs yet.
                self.cbox.tick(&mut self.stats);
                self.state = self.cbox.state;
                return;
            }
        }
        self.state = CpuState::Run;
        if self.halted.is_some() {
            return;
        }

        self.stats.cycles += 1;
        self.ipr.cc = self.ipr.cc.wrapping_add(1);
        if self.pal_mode {
            self.stats.cycles_pal += 1;
        } else if self.ipr.current_mode() == crate::core::arch::mode::PrivilegeMode::User {
            self.stats.cycles_user += 1;
        } else {
            self.stats.cycles_kernel += 1;
        }

        self.cbox.tick(&mut self.stats);
        self.mbox_tick();
        self.execute_tick();
        self.retire_tick();
        self.fetch_tick();

        self.check_livelock();
    }

    /// Runs until halt, shutdown, or `max_cycles` elapse. Returns the halt
    /// value if the guest halted.
    pub fn run(&mut self, max_cycles: u64) -> Option<u64> {
        for _ in 0..max_cycles {
            self.tick();
            if self.halted.is_some() || self.state == CpuState::ShuttingDown {
                break;
            }
        }
        self.halted
    }

    /// Notes a retirement for livelock diagnostics.
    pub(crate) fn note_retirement(&mut self) {
        self.last_retire_cycle = self.stats.cycles;
        self.hang_reported = false;
    }

    fn check_livelock(&mut self) {
        if !self.hang_reported
            && !self.ibox.active.is_empty()
            && self.stats.cycles - self.last_retire_cycle > self.hang_threshold
        {
            debug!(
                pc = self.pc,
                cycles = self.stats.cycles,
                "no retirement in {} cycles",
                self.hang_threshold
            );
            self.hang_reported = true;
        }
    }

    /// Dumps the architectural state to stdout.
    pub fn dump_state(&self) {
        println!("PC = {:#018x}  PAL = {}", self.pc, self.pal_mode);
        self.regs.dump();
    }
}
