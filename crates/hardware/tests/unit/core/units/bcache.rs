//! Bcache laws: tag consistency, the dirty-on-rewrite rule, and the
//! eviction/victim contract.

use axp21264_core::core::units::cbox::bcache::{
    Bcache, STATUS_DIRTY, STATUS_HIT, STATUS_MISS, STATUS_SHARED,
};

fn filled(b: u8) -> [u8; 64] {
    [b; 64]
}

#[test]
fn write_then_read_returns_the_block_with_state() {
    let mut bc = Bcache::new(1024 * 1024);
    let _ = bc.write(0xAB00, &filled(0x42));
    let (data, dirty, shared) = bc.read(0xAB00).unwrap();
    assert_eq!(data, filled(0x42));
    assert!(!dirty && !shared);
}

#[test]
fn resident_blocks_satisfy_the_tag_invariant() {
    let mut bc = Bcache::new(1024 * 1024);
    for pa in [0x0u64, 0xAB00, 0x12340040, 0xFFFC0] {
        let _ = bc.write(pa, &filled(1));
        let t = bc.tag_at(pa);
        assert!(t.valid);
        assert_eq!(t.tag, (t.pa >> 20) & ((1 << 44) - 1));
    }
}

#[test]
fn status_composes_hit_dirty_shared() {
    let mut bc = Bcache::new(1024 * 1024);
    assert_eq!(bc.status(0x40), STATUS_MISS);
    let _ = bc.write(0x40, &filled(0));
    assert_eq!(bc.status(0x40), STATUS_HIT);
    bc.set_dirty(0x40);
    bc.set_shared(0x40);
    assert_eq!(bc.status(0x40), STATUS_HIT | STATUS_DIRTY | STATUS_SHARED);
}

#[test]
fn evicting_a_dirty_block_yields_exactly_its_bytes() {
    let mut bc = Bcache::new(1024 * 1024);
    let _ = bc.write(0xAB00, &filled(0x77));
    bc.set_dirty(0xAB00);
    let victim = bc.evict(0xAB00).unwrap();
    assert_eq!(victim.pa, 0xAB00 & !0x3F);
    assert_eq!(victim.data, filled(0x77));
    assert!(bc.evict(0xAB00).is_none(), "second evict finds nothing");
}

#[test]
fn clean_eviction_yields_no_victim_but_clears_the_slot() {
    let mut bc = Bcache::new(1024 * 1024);
    let _ = bc.write(0xAB00, &filled(0x77));
    assert!(bc.evict(0xAB00).is_none());
    assert!(!bc.valid(0xAB00));
}

#[test]
fn dirty_follows_slot_validity_not_tag_identity() {
    // One-megabyte array: addresses one megabyte apart share an index.
    let mut bc = Bcache::new(1024 * 1024);
    let _ = bc.write(0xAB00, &filled(1));
    assert_eq!(bc.status(0xAB00) & STATUS_DIRTY, 0, "fresh install is clean");
    let conflicting = 0xAB00 + (1 << 20);
    let _ = bc.write(conflicting, &filled(2));
    assert_ne!(
        bc.status(conflicting) & STATUS_DIRTY,
        0,
        "install over a previously valid slot is dirty"
    );
}

#[test]
fn flush_returns_only_the_dirty_victims() {
    let mut bc = Bcache::new(64 * 64);
    let _ = bc.write(0x000, &filled(1));
    let _ = bc.write(0x040, &filled(2));
    let _ = bc.write(0x080, &filled(3));
    bc.set_dirty(0x040);
    let victims = bc.flush();
    assert_eq!(victims.len(), 1);
    assert_eq!(victims[0].pa, 0x040);
    for pa in [0x000u64, 0x040, 0x080] {
        assert!(!bc.valid(pa));
    }
}
