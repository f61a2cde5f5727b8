use chrono::NaiveTime;
use core_types::{IndicatorFamily, Polarity};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub server: ServerConfig,
    pub sync: SyncConfig,
    pub sources: SourcesConfig,
    pub risk: RiskConfig,
    pub alerts: AlertConfig,
}

/// Which indicator store implementation backs the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Postgres,
    /// Non-persistent store, for local experiments.
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub backend: StoreBackend,
    /// Falls back to the `DATABASE_URL` environment variable when absent.
    pub url: Option<String>,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Postgres,
            url: None,
            max_connections: 10,
            acquire_timeout_secs: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`.
    pub level: String,
    /// When set, logs are also written to a daily rolling file in this directory.
    pub directory: Option<PathBuf>,
    pub file_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
            file_prefix: "econwatch.log".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 8080)),
        }
    }
}

/// Contains parameters for the periodic synchronization job.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Time of day (UTC) at which the daily sync runs.
    pub daily_at: NaiveTime,
    /// Minimum spacing between two source adapters within a run.
    pub inter_source_delay_secs: u64,
    /// Timeout applied by the HTTP client to every upstream request.
    pub request_timeout_secs: u64,
    /// Countries requested from every source.
    pub countries: Vec<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            daily_at: NaiveTime::from_hms_opt(2, 0, 0).unwrap_or_default(),
            inter_source_delay_secs: 5,
            request_timeout_secs: 30,
            countries: ["USA", "CHN", "JPN", "DEU", "GBR", "FRA", "IND", "BRA"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub world_bank: WorldBankConfig,
    pub imf: ImfConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorldBankConfig {
    pub enabled: bool,
    pub base_url: String,
    /// Indicator codes synchronized on every run.
    pub indicators: Vec<String>,
    /// The `date` query parameter, e.g. "2010:2025".
    pub date_range: String,
    pub request_interval_ms: u64,
}

impl Default for WorldBankConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://api.worldbank.org/v2".to_string(),
            indicators: [
                "NY.GDP.MKTP.CD",
                "NY.GDP.PCAP.CD",
                "NY.GDP.MKTP.KD.ZG",
                "SL.UEM.TOTL.ZS",
                "FP.CPI.TOTL.ZG",
                "NE.TRD.GNFS.ZS",
                "GC.DOD.TOTL.GD.ZS",
                "SP.POP.TOTL",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            date_range: "2010:2025".to_string(),
            request_interval_ms: 1_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ImfConfig {
    pub enabled: bool,
    pub base_url: String,
    pub indicators: Vec<String>,
    pub request_interval_ms: u64,
}

impl Default for ImfConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://www.imf.org/external/datamapper/api/v1".to_string(),
            indicators: [
                "NGDP_RPCH",
                "NGDPD",
                "NGDPDPC",
                "LUR",
                "PCPIPCH",
                "GGR_NGDP",
                "GGX_NGDP",
                "GGXCNL_NGDP",
                "GGXWDG_NGDP",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            request_interval_ms: 2_000,
        }
    }
}

/// Cutoffs separating the severity bands of one indicator family.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Bands {
    pub critical: Decimal,
    pub high: Decimal,
    pub medium: Decimal,
}

/// The risk-scoring threshold table, one set of bands per tracked family.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RiskThresholds {
    pub gdp_growth: Bands,
    pub unemployment: Bands,
    pub inflation: Bands,
    pub debt_to_gdp: Bands,
}

impl RiskThresholds {
    pub fn bands(&self, family: IndicatorFamily) -> &Bands {
        match family {
            IndicatorFamily::GdpGrowth => &self.gdp_growth,
            IndicatorFamily::Unemployment => &self.unemployment,
            IndicatorFamily::Inflation => &self.inflation,
            IndicatorFamily::DebtToGdp => &self.debt_to_gdp,
        }
    }
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            gdp_growth: Bands { critical: dec!(-3.0), high: dec!(-1.5), medium: dec!(0.5) },
            unemployment: Bands { critical: dec!(12.0), high: dec!(8.0), medium: dec!(6.0) },
            inflation: Bands { critical: dec!(10.0), high: dec!(6.0), medium: dec!(4.0) },
            debt_to_gdp: Bands { critical: dec!(120.0), high: dec!(90.0), medium: dec!(70.0) },
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    pub thresholds: RiskThresholds,
    /// Countries covered by the global risk report.
    pub countries: Vec<String>,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            thresholds: RiskThresholds::default(),
            countries: ["USA", "CHN", "JPN", "DEU", "GBR", "FRA", "IND", "BRA", "RUS", "CAN"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

/// Single-cutoff table used by the threshold alert engine.
///
/// A family without a cutoff never raises alerts.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AlertThresholds {
    pub gdp_growth: Option<Decimal>,
    pub unemployment: Option<Decimal>,
    pub inflation: Option<Decimal>,
    pub debt_to_gdp: Option<Decimal>,
}

impl AlertThresholds {
    pub fn cutoff(&self, family: IndicatorFamily) -> Option<Decimal> {
        match family {
            IndicatorFamily::GdpGrowth => self.gdp_growth,
            IndicatorFamily::Unemployment => self.unemployment,
            IndicatorFamily::Inflation => self.inflation,
            IndicatorFamily::DebtToGdp => self.debt_to_gdp,
        }
    }
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            gdp_growth: Some(dec!(-2)),
            unemployment: Some(dec!(10)),
            inflation: Some(dec!(8)),
            debt_to_gdp: Some(dec!(100)),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    pub thresholds: AlertThresholds,
}

impl Config {
    /// Checks the invariants serde cannot express.
    pub fn validate(&self) -> Result<(), String> {
        for family in IndicatorFamily::ALL {
            let b = self.risk.thresholds.bands(family);
            let ordered = match family.polarity() {
                Polarity::HigherIsWorse => b.critical >= b.high && b.high >= b.medium,
                Polarity::LowerIsWorse => b.critical <= b.high && b.high <= b.medium,
            };
            if !ordered {
                return Err(format!(
                    "risk bands for {} are out of order for its polarity: {:?}",
                    family, b
                ));
            }
        }

        let country_lists = [
            ("sync.countries", &self.sync.countries),
            ("risk.countries", &self.risk.countries),
        ];
        for (name, list) in country_lists {
            if list.is_empty() {
                return Err(format!("{} must not be empty", name));
            }
            if let Some(bad) = list
                .iter()
                .find(|c| c.len() != 3 || !c.chars().all(|ch| ch.is_ascii_uppercase()))
            {
                return Err(format!("{} contains an invalid country code '{}'", name, bad));
            }
        }

        if self.sync.request_timeout_secs == 0 {
            return Err("sync.request_timeout_secs must be greater than 0".to_string());
        }
        Ok(())
    }
}
