//! Tournament predictor training: repeated outcomes converge, the BTB
//! remembers targets, and the return stack nests.

use axp21264_core::Config;
use axp21264_core::core::units::bru::{BranchPredictor, BranchPredictorWrapper};

fn predictor() -> BranchPredictorWrapper {
    BranchPredictorWrapper::new(&Config::default())
}

#[test]
fn repeated_taken_branches_train_toward_taken() {
    let mut bp = predictor();
    let pc = 0x1000;
    for _ in 0..16 {
        bp.update_branch(pc, true, Some(0x2000));
    }
    let (taken, _) = bp.predict_branch(pc);
    assert!(taken);
}

#[test]
fn repeated_not_taken_branches_train_toward_not_taken() {
    let mut bp = predictor();
    let pc = 0x1040;
    for _ in 0..16 {
        bp.update_branch(pc, false, None);
    }
    let (taken, _) = bp.predict_branch(pc);
    assert!(!taken);
}

#[test]
fn target_array_remembers_resolved_targets() {
    let mut bp = predictor();
    for _ in 0..4 {
        bp.update_branch(0x3000, true, Some(0x4444));
    }
    assert_eq!(bp.predict_target(0x3000), Some(0x4444));
}

#[test]
fn return_stack_nests_subroutine_linkage() {
    let mut bp = predictor();
    bp.link_subroutine(0x100, 0x104, 0x1000);
    bp.link_subroutine(0x1000, 0x1004, 0x2000);
    assert_eq!(bp.predict_return(), Some(0x1004));
    bp.pop_return();
    assert_eq!(bp.predict_return(), Some(0x104));
    bp.pop_return();
    assert_eq!(bp.predict_return(), None);
}

#[test]
fn alternating_pattern_is_learned_by_local_history() {
    let mut bp = predictor();
    let pc = 0x5000;
    // Train an alternating taken/not-taken pattern long enough for the
    // local history tables to lock onto it.
    let mut outcome = false;
    for _ in 0..64 {
        bp.update_branch(pc, outcome, outcome.then_some(0x6000));
        outcome = !outcome;
    }
    // After training, the prediction should follow the alternation for at
    // least a clear majority of the next window.
    let mut correct = 0;
    for _ in 0..16 {
        let (predicted, _) = bp.predict_branch(pc);
        if predicted == outcome {
            correct += 1;
        }
        bp.update_branch(pc, outcome, outcome.then_some(0x6000));
        outcome = !outcome;
    }
    assert!(correct >= 12, "only {correct}/16 correct after training");
}
