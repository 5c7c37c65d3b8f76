//! Front-end prediction interface.
//!
//! The Ibox consults one predictor for three distinct questions at fetch
//! time: which way a conditional branch goes (its target is computable from
//! the displacement), where a memory-format jump lands (`JMP`/`JSR` take
//! their target from `Rb`, unknown until issue), and where a return goes
//! (`RET`/`JSR_COROUTINE`, steered by the return stack the linkage
//! instructions maintain). The jump hint field (displacement bits 15:14)
//! tells fetch which question to ask.

/// Fetch-time prediction over conditional branches, jumps, and returns.
pub trait BranchPredictor {
    /// Predicts a conditional branch's direction, plus a target when the
    /// target array happens to know one.
    ///
    /// # Arguments
    ///
    /// * `pc` - Program counter of the branch instruction.
    fn predict_branch(&self, pc: u64) -> (bool, Option<u64>);

    /// Trains the predictor with a resolved branch or jump outcome, at
    /// retirement.
    ///
    /// # Arguments
    ///
    /// * `pc` - Program counter of the branch or jump.
    /// * `taken` - Whether control actually left the sequential path.
    /// * `target` - The resolved target when taken.
    fn update_branch(&mut self, pc: u64, taken: bool, target: Option<u64>);

    /// Predicts the register-sourced target of a `JMP`/`JSR`, if the target
    /// array remembers one from a prior resolution.
    ///
    /// # Arguments
    ///
    /// * `pc` - Program counter of the jump instruction.
    fn predict_target(&self, pc: u64) -> Option<u64>;

    /// Records a subroutine linkage (`BSR`, or `JSR` per its hint bits):
    /// the return PC goes onto the return stack and the call target into
    /// the target array.
    ///
    /// # Arguments
    ///
    /// * `pc` - Program counter of the linking instruction.
    /// * `return_pc` - The PC the matching `RET` will resume at.
    /// * `target` - Predicted or known entry point of the subroutine.
    fn link_subroutine(&mut self, pc: u64, return_pc: u64, target: u64);

    /// Predicts the target of a `RET`/`JSR_COROUTINE` from the top of the
    /// return stack.
    fn predict_return(&self) -> Option<u64>;

    /// Consumes the return-stack top once fetch follows a predicted
    /// return.
    fn pop_return(&mut self);
}
