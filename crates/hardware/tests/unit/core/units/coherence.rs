//! Coherence behavior: probe processing against the tag mirrors, the
//! probe-valid gate on victim buffers, and next-state transitions.

use axp21264_core::Config;
use axp21264_core::core::units::cache::LineState;
use axp21264_core::core::units::cbox::bcache::STATUS_SHARED;
use axp21264_core::core::units::cbox::sysport::{DataMovement, NextState, SysCmd, SysDc, SysRsp};
use axp21264_core::core::units::cbox::Cbox;
use axp21264_core::stats::SimStats;

use crate::common::mocks::bus::{count_cmd, CommandLog, MockSystemBus, RecordingBus};

fn cbox_with_log() -> (Cbox, CommandLog, SimStats) {
    let mut config = Config::default();
    config.system.ram_base = 0;
    config.system.ram_size = 4 * 1024 * 1024;
    config.cache.bcache.size_bytes = 1024 * 1024;
    let mut cbox = Cbox::new(&config);
    let (bus, log) = RecordingBus::new(4 * 1024 * 1024);
    cbox.set_bus(Box::new(bus));
    let mut stats = SimStats::default();
    cbox.tick(&mut stats);
    cbox.tick(&mut stats);
    (cbox, log, stats)
}

/// Seeds a shared line in the Bcache and the CTAG mirror.
fn seed_shared_line(cbox: &mut Cbox, pa: u64, fill: u8) {
    cbox.load_memory(pa, &[fill; 64]);
    let _ = cbox.bcache.write(pa, &[fill; 64]);
    cbox.bcache.set_shared(pa);
    cbox.note_dcache_fill(pa, LineState::Shared);
}

#[test]
fn invalidating_probe_clears_every_tag_mirror() {
    let (mut cbox, _log, mut stats) = cbox_with_log();
    seed_shared_line(&mut cbox, 0x5000, 0x33);

    assert!(cbox.probe(DataMovement::ReadHit, NextState::Invalid, 0x5000, 1));
    cbox.tick(&mut stats);

    assert!(!cbox.bcache.valid(0x5000));
    let t = cbox.take_dcache_transition().unwrap();
    assert_eq!(t.pa, 0x5000);
    assert_eq!(t.ns, NextState::Invalid);
}

#[test]
fn probe_response_waits_for_the_probe_valid_gate() {
    let (mut cbox, log, mut stats) = cbox_with_log();
    seed_shared_line(&mut cbox, 0x5000, 0x33);
    let _ = cbox.probe(DataMovement::ReadHit, NextState::Invalid, 0x5000, 1);

    cbox.tick(&mut stats); // capture data, apply next-state
    cbox.tick(&mut stats); // still gated
    assert_eq!(count_cmd(&log, SysCmd::ProbeResponse), 0);

    cbox.release_victims(0x5000);
    cbox.tick(&mut stats);
    assert_eq!(count_cmd(&log, SysCmd::ProbeResponse), 1);

    // No re-emission on later ticks.
    cbox.tick(&mut stats);
    assert_eq!(count_cmd(&log, SysCmd::ProbeResponse), 1);
    assert_eq!(cbox.pq.len(), 0);
    assert_eq!(cbox.vdb.len(), 0);
}

#[test]
fn read_dirty_probe_moves_no_clean_data() {
    let (mut cbox, log, mut stats) = cbox_with_log();
    seed_shared_line(&mut cbox, 0x6000, 0x11); // clean

    let _ = cbox.probe(DataMovement::ReadDirty, NextState::Nop, 0x6000, 2);
    cbox.tick(&mut stats); // process: no data capture needed
    cbox.tick(&mut stats); // respond immediately (nothing gated)
    assert_eq!(count_cmd(&log, SysCmd::ProbeResponse), 1);
    assert_eq!(cbox.vdb.len(), 0, "no victim buffer was consumed");
}

#[test]
fn clean_shared_transition_downgrades_without_invalidating() {
    let (mut cbox, _log, mut stats) = cbox_with_log();
    cbox.load_memory(0x7000, &[0x44; 64]);
    let _ = cbox.bcache.write(0x7000, &[0x44; 64]);
    let _ = cbox.bcache.write(0x7000, &[0x45; 64]); // rewrite marks dirty
    cbox.note_dcache_fill(0x7000, LineState::Modified);

    let _ = cbox.probe(DataMovement::Nop, NextState::CleanShared, 0x7000, 3);
    cbox.tick(&mut stats);

    assert!(cbox.bcache.valid(0x7000));
    assert_ne!(cbox.bcache.status(0x7000) & STATUS_SHARED, 0);
    let t = cbox.take_dcache_transition().unwrap();
    assert_eq!(t.ns, NextState::CleanShared);
}

#[test]
fn probe_on_a_miss_answers_without_data() {
    let (mut cbox, log, mut stats) = cbox_with_log();
    let _ = cbox.probe(DataMovement::ReadHit, NextState::Invalid, 0xF000, 4);
    cbox.tick(&mut stats);
    cbox.tick(&mut stats);
    assert_eq!(count_cmd(&log, SysCmd::ProbeResponse), 1);
    assert!(cbox.take_dcache_transition().is_none());
}

#[test]
fn mocked_bus_sees_exactly_one_victim_write_back() {
    use axp21264_core::core::units::cbox::queues::{MafRequester, MafType};

    let mut config = Config::default();
    config.system.ram_base = 0;
    config.system.ram_size = 4 * 1024 * 1024;
    config.cache.bcache.size_bytes = 1024 * 1024;
    let mut cbox = Cbox::new(&config);

    let mut bus = MockSystemBus::new();
    let _ = bus.expect_read_raw().returning(|_, buf| buf.fill(0));
    let _ = bus.expect_write_raw().returning(|_, _| ());
    let _ = bus
        .expect_request()
        .withf(|req| req.cmd == SysCmd::ReadBlk)
        .times(1)
        .returning(|req| SysRsp {
            dc: SysDc::ReadData(0),
            data: Some([0u8; 64]),
            id: req.id,
        });
    let _ = bus
        .expect_request()
        .withf(|req| req.cmd == SysCmd::WrVictimBlk && req.pa == 0xAB00)
        .times(1)
        .returning(|req| SysRsp {
            dc: SysDc::WriteData(0),
            data: None,
            id: req.id,
        });
    cbox.set_bus(Box::new(bus));

    let mut stats = SimStats::default();
    cbox.tick(&mut stats);
    cbox.tick(&mut stats);

    let _ = cbox.bcache.write(0xAB00, &[0x99; 64]);
    cbox.bcache.set_dirty(0xAB00);
    let _ = cbox.add_maf(
        MafType::LdX,
        0xAB00 + (1 << 20),
        u64::MAX,
        MafRequester::Load(1),
        false,
        0,
    );
    cbox.tick(&mut stats);
}
