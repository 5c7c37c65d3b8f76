//! Miss handling through the Cbox: command selection per MAF category,
//! CSR gating, and the dirty-victim write-back path.

use axp21264_core::Config;
use axp21264_core::core::units::cbox::queues::{MafAdd, MafRequester, MafType};
use axp21264_core::core::units::cbox::sysport::SysCmd;
use axp21264_core::core::units::cbox::{Cbox, CboxCompletion};
use axp21264_core::stats::SimStats;

use crate::common::mocks::bus::{count_cmd, pas_for_cmd, CommandLog, RecordingBus};

fn cbox_with_log() -> (Cbox, CommandLog, SimStats) {
    let mut config = Config::default();
    config.system.ram_base = 0;
    config.system.ram_size = 8 * 1024 * 1024;
    config.cache.bcache.size_bytes = 1024 * 1024;
    let mut cbox = Cbox::new(&config);
    let (bus, log) = RecordingBus::new(8 * 1024 * 1024);
    cbox.set_bus(Box::new(bus));
    let mut stats = SimStats::default();
    cbox.tick(&mut stats); // Cold -> WaitBiST
    cbox.tick(&mut stats); // WaitBiST -> Run
    (cbox, log, stats)
}

#[test]
fn load_miss_issues_read_blk_for_the_line() {
    let (mut cbox, log, mut stats) = cbox_with_log();
    let r = cbox.add_maf(
        MafType::LdX,
        0x12340048,
        0xFF << 8,
        MafRequester::Load(1),
        false,
        0,
    );
    assert!(matches!(r, MafAdd::New(_)));
    cbox.tick(&mut stats);
    assert_eq!(pas_for_cmd(&log, SysCmd::ReadBlk), vec![0x12340040]);
    assert!(matches!(
        cbox.take_completion(),
        Some(CboxCompletion::LoadFill { tag: 1, .. })
    ));
}

#[test]
fn istream_requests_use_the_instruction_variant() {
    let (mut cbox, log, mut stats) = cbox_with_log();
    let _ = cbox.add_maf(MafType::Istream, 0x4000, u64::MAX, MafRequester::Istream, false, 0);
    cbox.tick(&mut stats);
    assert_eq!(count_cmd(&log, SysCmd::ReadBlkI), 1);
    assert!(matches!(
        cbox.take_completion(),
        Some(CboxCompletion::Istream { pa: 0x4000, .. })
    ));
}

#[test]
fn store_miss_requests_the_block_for_modification() {
    let (mut cbox, log, mut stats) = cbox_with_log();
    let _ = cbox.add_maf(MafType::StX, 0x5000, u64::MAX, MafRequester::Store(9), false, 8);
    cbox.tick(&mut stats);
    assert_eq!(count_cmd(&log, SysCmd::ReadBlkMod), 1);
    assert!(matches!(
        cbox.take_completion(),
        Some(CboxCompletion::StoreAck { tag: 9, .. })
    ));
}

#[test]
fn change_to_dirty_selects_clean_or_shared_form() {
    let (mut cbox, log, mut stats) = cbox_with_log();
    let MafAdd::New(idx) =
        cbox.add_maf(MafType::StXCtd, 0x6000, u64::MAX, MafRequester::Store(2), false, 8)
    else {
        panic!("expected a fresh entry");
    };
    cbox.maf.get_mut(idx).unwrap().shared_hint = true;
    cbox.tick(&mut stats);
    assert_eq!(count_cmd(&log, SysCmd::SharedToDirty), 1);

    let _ = cbox.add_maf(MafType::StXCtd, 0x7000, u64::MAX, MafRequester::Store(3), false, 8);
    cbox.tick(&mut stats);
    assert_eq!(count_cmd(&log, SysCmd::CleanToDirty), 1);
}

#[test]
fn store_conditional_upgrade_honors_the_stc_enable_csr() {
    let (mut cbox, log, mut stats) = cbox_with_log();
    let _ = cbox.add_maf(MafType::StXCCtd, 0x8000, u64::MAX, MafRequester::Store(4), false, 8);
    cbox.tick(&mut stats);
    assert_eq!(count_cmd(&log, SysCmd::StcChangeToDirty), 1);

    cbox.apply_csr("StcEnable", 0).unwrap();
    let _ = cbox.add_maf(MafType::StXCCtd, 0x9000, u64::MAX, MafRequester::Store(5), false, 8);
    cbox.tick(&mut stats);
    assert_eq!(count_cmd(&log, SysCmd::StcChangeToDirty), 1);
    assert_eq!(count_cmd(&log, SysCmd::CleanToDirty), 1);
}

#[test]
fn wh64_degrades_to_read_blk_mod_when_disabled() {
    let (mut cbox, log, mut stats) = cbox_with_log();
    let _ = cbox.add_maf(MafType::Wh64, 0xA000, u64::MAX, MafRequester::Store(6), false, 8);
    cbox.tick(&mut stats);
    assert_eq!(count_cmd(&log, SysCmd::InvalToDirty), 1);

    cbox.apply_csr("InvalToDirtyEnable", 0).unwrap();
    let _ = cbox.add_maf(MafType::Wh64, 0xB000, u64::MAX, MafRequester::Store(7), false, 8);
    cbox.tick(&mut stats);
    assert_eq!(count_cmd(&log, SysCmd::ReadBlkMod), 1);
}

#[test]
fn ecb_evicts_only_resident_lines_with_the_csr_enabled() {
    let (mut cbox, log, mut stats) = cbox_with_log();
    // Not resident: no bus command at all.
    let _ = cbox.add_maf(MafType::Ecb, 0xC000, u64::MAX, MafRequester::Store(8), false, 8);
    cbox.tick(&mut stats);
    assert_eq!(count_cmd(&log, SysCmd::Evict), 0);

    let _ = cbox.bcache.write(0xC000, &[0u8; 64]);
    let _ = cbox.add_maf(MafType::Ecb, 0xC000, u64::MAX, MafRequester::Store(8), false, 8);
    cbox.tick(&mut stats);
    assert_eq!(count_cmd(&log, SysCmd::Evict), 1);
    assert!(!cbox.bcache.valid(0xC000));
}

#[test]
fn io_loads_size_their_read_command() {
    let (mut cbox, log, mut stats) = cbox_with_log();
    let io_pa = 1u64 << 43;
    let _ = cbox.add_maf(MafType::LdX, io_pa, 0xF, MafRequester::Load(1), true, 4);
    cbox.tick(&mut stats);
    assert_eq!(count_cmd(&log, SysCmd::ReadLWs), 1);
    let _ = cbox.add_maf(MafType::LdX, io_pa + 0x100, 0x1, MafRequester::Load(2), true, 1);
    cbox.tick(&mut stats);
    assert_eq!(count_cmd(&log, SysCmd::ReadBytes), 1);
}

#[test]
fn conflicting_fill_writes_back_exactly_one_dirty_victim() {
    let (mut cbox, log, mut stats) = cbox_with_log();
    // A dirty line at 0xAB00 whose contents differ from memory.
    let _ = cbox.bcache.write(0xAB00, &[0x77u8; 64]);
    cbox.bcache.set_dirty(0xAB00);

    // A fill one megabyte away lands on the same direct-mapped index.
    let conflicting = 0xAB00 + (1 << 20);
    let _ = cbox.add_maf(MafType::LdX, conflicting, u64::MAX, MafRequester::Load(3), false, 0);
    cbox.tick(&mut stats);

    assert_eq!(pas_for_cmd(&log, SysCmd::WrVictimBlk), vec![0xAB00]);
    // The write-back carried the dirty bytes into memory.
    let mut buf = [0u8; 4];
    cbox.read_mem(0xAB00, &mut buf);
    assert_eq!(buf, [0x77; 4]);
}

#[test]
fn iowb_drain_uses_the_width_matched_write_command() {
    let (mut cbox, log, mut stats) = cbox_with_log();
    let io_pa = 1u64 << 43;
    let _ = cbox.add_iowb(io_pa, &[1, 2, 3, 4], 4, 21);
    cbox.tick(&mut stats);
    assert_eq!(count_cmd(&log, SysCmd::WrLWs), 1);
    match cbox.take_completion() {
        Some(CboxCompletion::IoWriteDone { tags }) => assert_eq!(tags, vec![21]),
        other => panic!("expected IoWriteDone, got {other:?}"),
    }
}
