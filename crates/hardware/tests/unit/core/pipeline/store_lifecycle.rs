//! Store queue lifecycle at the scenario level: forwarding visibility
//! across the resolve/complete/retire progression, and recovery flushes.

use axp21264_core::core::pipeline::active_list::ActiveListTag;
use axp21264_core::core::pipeline::lsq::{ForwardResult, LoadQueue, StoreQueue};

#[test]
fn forwarding_becomes_visible_at_resolve_not_at_completion() {
    let mut sq = StoreQueue::new(8);
    assert!(sq.allocate(ActiveListTag(1)));
    // Unresolved: a younger load must conservatively stall.
    assert_eq!(sq.forward(0x100, 8, ActiveListTag(2)), ForwardResult::Stall);

    sq.resolve(ActiveListTag(1), 0x100, 0x77, 8);
    assert_eq!(sq.forward(0x100, 8, ActiveListTag(2)), ForwardResult::Hit(0x77));

    // Completion and retirement don't change what forwards.
    sq.mark_complete(ActiveListTag(1));
    sq.retire(ActiveListTag(1));
    assert_eq!(sq.forward(0x100, 8, ActiveListTag(2)), ForwardResult::Hit(0x77));
}

#[test]
fn only_older_stores_forward() {
    let mut sq = StoreQueue::new(8);
    assert!(sq.allocate(ActiveListTag(5)));
    sq.resolve(ActiveListTag(5), 0x100, 0x77, 8);
    // A load older than the store sees memory, not the store.
    assert_eq!(sq.forward(0x100, 8, ActiveListTag(3)), ForwardResult::Miss);
}

#[test]
fn speculative_flush_spares_retired_stores() {
    let mut sq = StoreQueue::new(8);
    for t in 1..=3 {
        assert!(sq.allocate(ActiveListTag(t)));
        sq.resolve(ActiveListTag(t), 0x100 * u64::from(t), t.into(), 8);
    }
    sq.mark_complete(ActiveListTag(1));
    sq.retire(ActiveListTag(1));

    sq.flush_speculative();
    assert_eq!(sq.len(), 1);
    assert_eq!(sq.drain(), Some((ActiveListTag(1), 0x100, 1, 8)));
}

#[test]
fn replay_candidates_require_completion_and_overlap() {
    let mut lq = LoadQueue::new(8);
    assert!(lq.allocate(ActiveListTag(10)));
    lq.set_address(ActiveListTag(10), 0x200, 8);
    assert!(lq.allocate(ActiveListTag(12)));
    lq.set_address(ActiveListTag(12), 0x200, 8);
    lq.mark_complete(ActiveListTag(12));

    // Only the completed younger load replays; the oldest wins when
    // several qualify.
    assert_eq!(lq.replay_candidate(0x200, 8, ActiveListTag(5)), Some(ActiveListTag(12)));
    lq.mark_complete(ActiveListTag(10));
    assert_eq!(lq.replay_candidate(0x200, 8, ActiveListTag(5)), Some(ActiveListTag(10)));
}

#[test]
fn cancelled_store_never_drains() {
    let mut sq = StoreQueue::new(4);
    assert!(sq.allocate(ActiveListTag(1)));
    sq.resolve(ActiveListTag(1), 0x40, 0x9, 8);
    sq.cancel(ActiveListTag(1));
    assert!(sq.is_empty());
    sq.retire(ActiveListTag(1));
    assert!(sq.drain().is_none());
}
