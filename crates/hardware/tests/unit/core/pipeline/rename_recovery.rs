//! Rename checkpoint semantics: a mispredicted branch restores the map
//! exactly to its state after the branch's own decode-time rename.

use axp21264_core::core::pipeline::rename::{PhysReg, RenameUnit};
use pretty_assertions::assert_eq;

fn map_snapshot(unit: &RenameUnit) -> Vec<PhysReg> {
    (0..32).map(|r| unit.rename_source(r, false)).collect()
}

#[test]
fn restore_lands_exactly_on_the_checkpointed_map() {
    let mut unit = RenameUnit::new();

    // Pre-branch renames.
    let _ = unit.rename_dest(1, false).unwrap();
    let _ = unit.rename_dest(2, false).unwrap();

    // The branch itself (serial 10) renames its own destination first, so
    // the checkpoint captures the post-decode state.
    let _ = unit.rename_dest(3, false).unwrap();
    unit.checkpoint(10);
    let at_branch = map_snapshot(&unit);

    // Wrong-path renames.
    for r in [1, 2, 4, 5, 6] {
        let _ = unit.rename_dest(r, false).unwrap();
    }
    assert_ne!(map_snapshot(&unit), at_branch);

    unit.restore_checkpoint(10);
    assert_eq!(map_snapshot(&unit), at_branch);
}

#[test]
fn nested_speculation_restores_to_the_older_branch() {
    let mut unit = RenameUnit::new();
    unit.checkpoint(1);
    let snapshot_outer = map_snapshot(&unit);
    let _ = unit.rename_dest(4, false).unwrap();
    unit.checkpoint(2);
    let _ = unit.rename_dest(5, false).unwrap();

    unit.restore_checkpoint(1);
    assert_eq!(map_snapshot(&unit), snapshot_outer);
    // The inner checkpoint died with the outer restore.
    let before = map_snapshot(&unit);
    unit.restore_checkpoint(2);
    assert_eq!(map_snapshot(&unit), before);
}

#[test]
fn restore_rebuilds_a_consistent_free_list() {
    let mut unit = RenameUnit::new();
    unit.checkpoint(1);
    let free_at_checkpoint = unit.free_count(false);
    for r in 1..10 {
        let _ = unit.rename_dest(r, false).unwrap();
    }
    unit.restore_checkpoint(1);
    assert_eq!(unit.free_count(false), free_at_checkpoint);
}
