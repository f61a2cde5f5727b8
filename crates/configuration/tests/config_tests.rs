//! Loading and validation of `config.toml` documents.

use configuration::error::ConfigError;
use configuration::{load_config, load_config_from_str, Config, StoreBackend};
use core_types::IndicatorFamily;
use rust_decimal_macros::dec;

#[test]
fn empty_document_yields_validated_defaults() {
    let config = load_config_from_str("").unwrap();

    assert_eq!(config.database.backend, StoreBackend::Postgres);
    assert_eq!(config.sync.inter_source_delay_secs, 5);
    assert_eq!(config.sync.daily_at.to_string(), "02:00:00");
    assert_eq!(config.risk.countries.len(), 10);
    assert_eq!(config.sources.world_bank.request_interval_ms, 1_000);
    assert_eq!(config.sources.imf.request_interval_ms, 2_000);

    let gdp = config.risk.thresholds.bands(IndicatorFamily::GdpGrowth);
    assert_eq!(gdp.critical, dec!(-3.0));
    assert_eq!(config.alerts.thresholds.cutoff(IndicatorFamily::DebtToGdp), Some(dec!(100)));
}

#[test]
fn partial_sections_keep_remaining_defaults() {
    let config = load_config_from_str(
        r#"
        [database]
        backend = "memory"

        [sync]
        daily_at = "04:30:00"
        countries = ["USA", "MEX"]

        [risk.thresholds.inflation]
        critical = 15.0
        high = 9.0
        medium = 5.0

        [alerts.thresholds]
        inflation = 12
        "#,
    )
    .unwrap();

    assert_eq!(config.database.backend, StoreBackend::Memory);
    assert_eq!(config.sync.daily_at.to_string(), "04:30:00");
    assert_eq!(config.sync.countries, vec!["USA".to_string(), "MEX".to_string()]);
    assert_eq!(config.sync.inter_source_delay_secs, 5);
    assert_eq!(config.risk.thresholds.inflation.critical, dec!(15));
    assert_eq!(config.risk.thresholds.unemployment.critical, dec!(12));
    assert_eq!(config.alerts.thresholds.inflation, Some(dec!(12)));
    assert_eq!(config.alerts.thresholds.unemployment, Some(dec!(10)));
}

#[test]
fn bands_out_of_order_for_polarity_are_rejected() {
    // GDP growth gets worse downwards, so critical must be the lowest cutoff.
    let result = load_config_from_str(
        r#"
        [risk.thresholds.gdp_growth]
        critical = 1.0
        high = -1.5
        medium = 0.5
        "#,
    );
    assert!(matches!(result, Err(ConfigError::ValidationError(_))));

    let result = load_config_from_str(
        r#"
        [risk.thresholds.debt_to_gdp]
        critical = 60.0
        high = 90.0
        medium = 70.0
        "#,
    );
    assert!(matches!(result, Err(ConfigError::ValidationError(_))));
}

#[test]
fn invalid_country_codes_are_rejected() {
    let result = load_config_from_str(
        r#"
        [risk]
        countries = ["USA", "de"]
        "#,
    );
    assert!(matches!(result, Err(ConfigError::ValidationError(msg)) if msg.contains("'de'")));

    let result = load_config_from_str("[sync]\ncountries = []\n");
    assert!(matches!(result, Err(ConfigError::ValidationError(_))));
}

#[test]
fn missing_file_falls_back_to_defaults() {
    let path = format!("/tmp/econwatch-missing-config-{}.toml", std::process::id());
    let config = load_config(&path).unwrap();
    let defaults = Config::default();
    assert_eq!(config.risk.thresholds, defaults.risk.thresholds);
    assert_eq!(config.server.bind_address, defaults.server.bind_address);
}
