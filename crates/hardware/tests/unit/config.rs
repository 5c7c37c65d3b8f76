//! Configuration surface: architectural defaults and partial-override
//! deserialization.

use axp21264_core::Config;
use pretty_assertions::assert_eq;

#[test]
fn defaults_reproduce_the_architectural_machine() {
    let cfg = Config::default();
    assert_eq!(cfg.queues.iq_depth, 20);
    assert_eq!(cfg.queues.fq_depth, 15);
    assert_eq!(cfg.queues.lq_depth, 32);
    assert_eq!(cfg.queues.sq_depth, 32);
    assert_eq!(cfg.queues.maf_depth, 8);
    assert_eq!(cfg.queues.vdb_depth, 8);
    assert_eq!(cfg.queues.iowb_depth, 4);
    assert_eq!(cfg.queues.pq_depth, 8);
    assert_eq!(cfg.registers.int_phys_regs, 80);
    assert_eq!(cfg.registers.fp_phys_regs, 72);
    assert_eq!(cfg.cache.icache.ways, 2);
    assert_eq!(cfg.cache.dcache.ways, 2);
}

#[test]
fn empty_json_equals_defaults() {
    let cfg: Config = serde_json::from_str("{}").unwrap();
    assert_eq!(cfg.queues.maf_depth, Config::default().queues.maf_depth);
    assert_eq!(
        cfg.cache.bcache.size_bytes,
        Config::default().cache.bcache.size_bytes
    );
}

#[test]
fn partial_override_touches_only_named_fields() {
    let json = r#"{
        "cache": { "bcache": { "size_bytes": 2097152 } },
        "queues": { "iowb_depth": 2 }
    }"#;
    let cfg: Config = serde_json::from_str(json).unwrap();
    assert_eq!(cfg.cache.bcache.size_bytes, 2 * 1024 * 1024);
    assert_eq!(cfg.queues.iowb_depth, 2);
    assert_eq!(cfg.queues.maf_depth, 8);
    assert_eq!(cfg.cache.icache.ways, 2);
}

#[test]
fn round_robin_way_selection_deserializes_by_name() {
    use axp21264_core::config::ReplacementPolicy;
    let json = r#"{"cache": {"dcache": {"policy": "ROUNDROBIN"}}}"#;
    let cfg: Config = serde_json::from_str(json).unwrap();
    assert_eq!(cfg.cache.dcache.policy, ReplacementPolicy::RoundRobin);
    assert_eq!(cfg.cache.icache.policy, ReplacementPolicy::Lru);
}

#[test]
fn predictor_defaults_match_the_tournament_geometry() {
    let cfg = Config::default();
    assert_eq!(cfg.predictor.local_hist_bits, 10);
    assert_eq!(cfg.predictor.global_hist_bits, 12);
}
