//! Simulator: owns the CPU and drives its lifecycle to completion.

use crate::common::error::InitError;
use crate::config::Config;
use crate::core::Cpu;
use crate::core::cpu::CpuState;

/// Top-level simulator wrapping one CPU.
pub struct Simulator {
    /// The simulated processor.
    pub cpu: Cpu,
    /// Cycle budget for `run`; zero means unbounded.
    pub max_cycles: u64,
}

impl Simulator {
    /// Creates a cold simulator from the configuration.
    pub fn new(config: &Config) -> Self {
        Self {
            cpu: Cpu::new(config),
            max_cycles: 0,
        }
    }

    /// Installs a boot image and brings the CPU through its power-up
    /// lifecycle until it reaches `Run`.
    pub fn boot(&mut self, pa: u64, words: &[u32]) -> Result<(), InitError> {
        self.cpu.boot(pa, words)?;
        // Cold -> WaitBiST -> Run: the Cbox promotes the lifecycle one
        // state per tick.
        let mut guard = 0;
        while self.cpu.state != CpuState::Run {
            self.cpu.tick();
            guard += 1;
            if guard > 8 || self.cpu.state == CpuState::ShuttingDown {
                return Err(InitError::BistFailure("cbox"));
            }
        }
        Ok(())
    }

    /// Advances the simulation by one cycle.
    pub fn tick(&mut self) {
        self.cpu.tick();
    }

    /// Runs to a halt or the cycle budget; returns the guest's exit value
    /// if it halted.
    pub fn run(&mut self) -> Option<u64> {
        let budget = if self.max_cycles == 0 {
            u64::MAX
        } else {
            self.max_cycles
        };
        self.cpu.run(budget)
    }
}
