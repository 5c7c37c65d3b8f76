//! Test harness: boots a simulator with a small, fast configuration and
//! runs guest programs to completion.

use std::sync::Once;

use axp21264_core::config::Config;
use axp21264_core::core::cpu::CpuState;
use axp21264_core::sim::simulator::Simulator;

static TRACING: Once = Once::new();

/// Installs a `RUST_LOG`-steered tracing subscriber once per test binary,
/// so a failing scenario can be re-run with component-level spans visible.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Cycle budget for harness-driven programs; generous enough for every
/// miss path, small enough to fail fast on livelock.
pub const RUN_BUDGET: u64 = 200_000;

/// A booted simulator plus convenience accessors for guest state.
pub struct TestContext {
    /// The simulator under test.
    pub sim: Simulator,
}

/// A small machine: memory based at zero so PAL-mode physical addressing
/// reaches everything, caches shrunk for fast conflict construction.
pub fn small_config() -> Config {
    let mut config = Config::default();
    config.system.ram_base = 0;
    config.system.ram_size = 8 * 1024 * 1024;
    config.cache.icache.size_bytes = 8 * 1024;
    config.cache.dcache.size_bytes = 8 * 1024;
    config.cache.bcache.size_bytes = 1024 * 1024;
    config
}

impl TestContext {
    /// Boots `program` at physical address zero.
    pub fn boot(program: &[u32]) -> Self {
        Self::boot_at(0, program)
    }

    /// Boots `program` at the given base physical address.
    pub fn boot_at(base: u64, program: &[u32]) -> Self {
        init_tracing();
        let mut sim = Simulator::new(&small_config());
        sim.max_cycles = RUN_BUDGET;
        sim.boot(base, program).expect("boot image installs");
        assert_eq!(sim.cpu.state, CpuState::Run);
        Self { sim }
    }

    /// Presets an architectural integer register (and its identity-mapped
    /// physical register, so in-flight readers observe it too).
    pub fn set_reg(&mut self, r: usize, value: u64) {
        self.sim.cpu.regs.write(r, value);
        self.sim.cpu.ibox.prf_int[r] = value;
    }

    /// Presets an architectural floating-point register.
    pub fn set_freg(&mut self, r: usize, bits: u64) {
        self.sim.cpu.regs.write_f(r, bits);
        self.sim.cpu.ibox.prf_fp[r] = bits;
    }

    /// Runs until the guest halts; panics if the budget expires first.
    pub fn run_to_halt(&mut self) {
        let _ = self.halt_value();
    }

    /// Runs until the guest halts and returns the halt value (guest R0);
    /// panics if the budget expires first.
    pub fn halt_value(&mut self) -> u64 {
        match self.sim.run() {
            Some(code) => code,
            None => panic!(
                "guest did not halt within {RUN_BUDGET} cycles (pc = {:#x})",
                self.sim.cpu.pc
            ),
        }
    }

    /// Runs until the guest halts, tolerating a non-halting program.
    pub fn run(&mut self) -> Option<u64> {
        self.sim.run()
    }

    /// Reads a committed integer register.
    pub fn reg(&self, r: usize) -> u64 {
        self.sim.cpu.regs.read(r)
    }

    /// Reads a committed floating-point register's bit pattern.
    pub fn freg(&self, r: usize) -> u64 {
        self.sim.cpu.regs.read_f(r)
    }
}
