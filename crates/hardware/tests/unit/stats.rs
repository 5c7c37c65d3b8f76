//! Statistics collection: occupancy high-water marks and divide-by-zero
//! robustness of the report printer.

use axp21264_core::stats::{SimStats, STATS_SECTIONS};

#[test]
fn zero_cycle_report_never_divides_by_zero() {
    let stats = SimStats::default();
    stats.print();
    stats.print_sections(&["summary".to_string()]);
}

#[test]
fn high_water_marks_only_rise() {
    let mut stats = SimStats::default();
    stats.record_occupancy("vdb", 4);
    stats.record_occupancy("vdb", 2);
    assert_eq!(stats.vdb_high_water, 4);
    stats.record_occupancy("vdb", 7);
    assert_eq!(stats.vdb_high_water, 7);
}

#[test]
fn every_documented_section_is_printable() {
    let mut stats = SimStats::default();
    stats.cycles = 100;
    stats.instructions_retired = 42;
    stats.icache_hits = 10;
    stats.branch_predictions = 5;
    stats.branch_mispredictions = 1;
    for section in STATS_SECTIONS {
        stats.print_sections(&[(*section).to_string()]);
    }
}

#[test]
fn queue_names_route_to_their_counters() {
    let mut stats = SimStats::default();
    stats.record_occupancy("maf", 1);
    stats.record_occupancy("iowb", 2);
    stats.record_occupancy("pq", 3);
    assert_eq!(
        (stats.maf_high_water, stats.iowb_high_water, stats.pq_high_water),
        (1, 2, 3)
    );
}
