//! Branch prediction unit (BRU).
//!
//! The 21264 Ibox uses a two-level local/global tournament predictor, a
//! jump target array for register-sourced `JMP`/`JSR` targets, and a
//! return stack maintained by the linkage instructions. There is exactly
//! one predictor algorithm to wire up, so `BranchPredictorWrapper` is a
//! thin newtype rather than a dispatch enum over several algorithms.

pub use self::branch_predictor::BranchPredictor;

/// Fetch-time prediction interface.
pub mod branch_predictor;

/// Jump target array for register-sourced targets.
pub mod btb;

/// Predicted-return stack maintained by `BSR`/`JSR`/`RET`.
pub mod ras;

/// Tournament branch predictor (combines local and global predictors).
pub mod tournament;

use self::tournament::TournamentPredictor;
use crate::config::Config;

/// The Ibox branch predictor: a tournament predictor plus the target array
/// and return stack.
pub struct BranchPredictorWrapper(TournamentPredictor);

impl BranchPredictorWrapper {
    /// Builds the predictor from the configured table sizes.
    pub fn new(config: &Config) -> Self {
        Self(TournamentPredictor::new(&config.predictor))
    }
}

impl BranchPredictor for BranchPredictorWrapper {
    #[inline(always)]
    fn predict_branch(&self, pc: u64) -> (bool, Option<u64>) {
        self.0.predict_branch(pc)
    }

    #[inline(always)]
    fn update_branch(&mut self, pc: u64, taken: bool, target: Option<u64>) {
        self.0.update_branch(pc, taken, target)
    }

    #[inline(always)]
    fn predict_target(&self, pc: u64) -> Option<u64> {
        self.0.predict_target(pc)
    }

    #[inline(always)]
    fn link_subroutine(&mut self, pc: u64, return_pc: u64, target: u64) {
        self.0.link_subroutine(pc, return_pc, target)
    }

    #[inline(always)]
    fn predict_return(&self) -> Option<u64> {
        self.0.predict_return()
    }

    #[inline(always)]
    fn pop_return(&mut self) {
        self.0.pop_return()
    }
}
