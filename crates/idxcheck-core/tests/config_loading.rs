use idxcheck_core::{
    CheckerConfig, DEFAULT_BUCKET_COUNT, IdxCheckError, IndexConsistency, IndexDescriptor,
    MemoryRecordStore,
};

#[test]
fn loads_full_toml_config() {
    let config: CheckerConfig = toml::from_str(
        r#"
        bucket_count = 4096
        report_size_cap_bytes = 65536
        large_keys_disallowed = true
        yield_iterations = 250
        yield_period_ms = 5
        "#,
    )
    .expect("parse toml");
    config.validate().expect("valid");
    assert_eq!(config.bucket_count, 4096);
    assert_eq!(config.report_size_cap_bytes, 65_536);
    assert!(config.large_keys_disallowed);
    assert_eq!(config.yield_iterations, 250);
    assert_eq!(config.yield_period_ms, 5);
}

#[test]
fn empty_toml_uses_defaults() {
    let config: CheckerConfig = toml::from_str("").expect("parse toml");
    assert_eq!(config, CheckerConfig::default());
    assert_eq!(config.bucket_count, DEFAULT_BUCKET_COUNT);
}

#[test]
fn toml_round_trip_preserves_values() {
    let config = CheckerConfig::default()
        .with_bucket_count(256)
        .with_large_keys_disallowed(true);
    let encoded = toml::to_string(&config).expect("encode");
    let decoded: CheckerConfig = toml::from_str(&encoded).expect("decode");
    assert_eq!(decoded, config);
}

#[test]
fn invalid_loaded_config_is_rejected_at_construction() {
    let config: CheckerConfig = toml::from_str("bucket_count = 1000").expect("parse toml");
    let store = MemoryRecordStore::new();
    let err = IndexConsistency::new(
        &store,
        "cfg.coll",
        [IndexDescriptor::new("a_1", ["a"])],
        config,
    )
    .expect_err("1000 is not a power of two");
    assert!(matches!(
        err,
        IdxCheckError::InvalidConfig {
            field: "bucket_count",
            ..
        }
    ));
}

#[test]
fn compatibility_flag_reaches_the_caller() {
    let config: CheckerConfig =
        toml::from_str("large_keys_disallowed = true").expect("parse toml");
    let store = MemoryRecordStore::new();
    let checker = IndexConsistency::new(&store, "cfg.coll", Vec::<IndexDescriptor>::new(), config)
        .expect("checker");
    assert!(checker.large_keys_disallowed());
    assert!(checker.registry().is_empty());
}
