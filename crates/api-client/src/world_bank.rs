use crate::error::ApiError;
use crate::responses::{WorldBankErrorEnvelope, WorldBankMeta, WorldBankRow};
use crate::throttle::Throttle;
use crate::SourceAdapter;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use configuration::WorldBankConfig;
use core_types::{Category, Confidence, IndicatorFamily, RawObservation, SourceOrganization};
use serde_json::Value;
use std::time::Duration;

/// Static metadata for an indicator code we know about.
struct CatalogEntry {
    code: &'static str,
    name: &'static str,
    unit: &'static str,
    family: Option<IndicatorFamily>,
}

const CATALOG: &[CatalogEntry] = &[
    CatalogEntry {
        code: "NY.GDP.MKTP.CD",
        name: "GDP (current US$)",
        unit: "current US$",
        family: None,
    },
    CatalogEntry {
        code: "NY.GDP.PCAP.CD",
        name: "GDP per capita (current US$)",
        unit: "current US$",
        family: None,
    },
    CatalogEntry {
        code: "NY.GDP.MKTP.KD.ZG",
        name: "GDP growth (annual %)",
        unit: "%",
        family: Some(IndicatorFamily::GdpGrowth),
    },
    CatalogEntry {
        code: "SL.UEM.TOTL.ZS",
        name: "Unemployment, total (% of total labor force)",
        unit: "%",
        family: Some(IndicatorFamily::Unemployment),
    },
    CatalogEntry {
        code: "FP.CPI.TOTL.ZG",
        name: "Inflation, consumer prices (annual %)",
        unit: "%",
        family: Some(IndicatorFamily::Inflation),
    },
    CatalogEntry {
        code: "NE.TRD.GNFS.ZS",
        name: "Trade (% of GDP)",
        unit: "% of GDP",
        family: None,
    },
    CatalogEntry {
        code: "GC.DOD.TOTL.GD.ZS",
        name: "Central government debt, total (% of GDP)",
        unit: "% of GDP",
        family: Some(IndicatorFamily::DebtToGdp),
    },
    CatalogEntry { code: "SP.POP.TOTL", name: "Population, total", unit: "people", family: None },
];

// Longest prefixes first so "NE.TRD" is not shadowed by a shorter match.
const CATEGORY_PREFIXES: &[(&str, Category)] = &[
    ("NY.GDP", Category::Gdp),
    ("SL.UEM", Category::Employment),
    ("SL.", Category::Employment),
    ("FP.CPI", Category::Inflation),
    ("NE.TRD", Category::Trade),
    ("NE.EXP", Category::Trade),
    ("NE.IMP", Category::Trade),
    ("BX.", Category::Financial),
    ("BN.", Category::Trade),
    ("TX.", Category::Trade),
    ("TM.", Category::Trade),
    ("GC.DOD", Category::Government),
    ("GC.", Category::Government),
    ("SP.POP", Category::Social),
    ("SP.DYN", Category::Social),
    ("SE.", Category::Social),
    ("SH.", Category::Social),
    ("SI.", Category::Social),
    ("FR.", Category::Financial),
    ("FM.", Category::Financial),
    ("FS.", Category::Financial),
    ("EN.", Category::Environmental),
    ("EG.", Category::Environmental),
    ("AG.", Category::Environmental),
];

/// Maps a World Bank indicator code to a category by its topic prefix.
/// Codes outside every known topic are filed under `Financial`.
pub fn categorize_indicator(indicator_code: &str) -> Category {
    CATEGORY_PREFIXES
        .iter()
        .find(|(prefix, _)| indicator_code.starts_with(prefix))
        .map(|(_, category)| *category)
        .unwrap_or(Category::Financial)
}

fn catalog_entry(indicator_code: &str) -> Option<&'static CatalogEntry> {
    CATALOG.iter().find(|e| e.code.eq_ignore_ascii_case(indicator_code))
}

/// A source adapter for the World Bank Indicators API (v2).
#[derive(Clone)]
pub struct WorldBankClient {
    client: reqwest::Client,
    base_url: String,
    indicators: Vec<String>,
    date_range: String,
    request_interval: Duration,
}

impl WorldBankClient {
    pub fn new(config: &WorldBankConfig, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("econwatch/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            indicators: config.indicators.clone(),
            date_range: config.date_range.clone(),
            request_interval: Duration::from_millis(config.request_interval_ms),
        })
    }

    async fn fetch_page(
        &self,
        indicator_code: &str,
        countries: &[String],
        page: u32,
    ) -> Result<(WorldBankMeta, Vec<WorldBankRow>), ApiError> {
        let url = format!(
            "{}/country/{}/indicator/{}",
            self.base_url,
            country_segment(countries),
            indicator_code
        );

        let response = self
            .client
            .get(&url)
            .query(&[
                ("format", "json"),
                ("per_page", "1000"),
                ("date", self.date_range.as_str()),
                ("page", &page.to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(ApiError::Upstream(format!("HTTP {} from {}: {}", status, url, text)));
        }

        parse_page(&text)
    }
}

/// The `;`-joined country list of the request path; `all` when none are given.
fn country_segment(countries: &[String]) -> String {
    if countries.is_empty() {
        "all".to_string()
    } else {
        countries.join(";")
    }
}

/// Splits a `[meta, rows]` payload. A `null` rows element means "no data".
pub fn parse_page(text: &str) -> Result<(WorldBankMeta, Vec<WorldBankRow>), ApiError> {
    let parts: Vec<Value> =
        serde_json::from_str(text).map_err(|e| ApiError::Deserialization(e.to_string()))?;

    let mut parts = parts.into_iter();
    let head = parts
        .next()
        .ok_or_else(|| ApiError::InvalidData("empty World Bank response".to_string()))?;

    if let Ok(envelope) = serde_json::from_value::<WorldBankErrorEnvelope>(head.clone()) {
        let detail = envelope
            .message
            .iter()
            .map(|m| format!("{} {}: {}", m.id, m.key, m.value))
            .collect::<Vec<_>>()
            .join("; ");
        return Err(ApiError::Upstream(detail));
    }

    let meta: WorldBankMeta =
        serde_json::from_value(head).map_err(|e| ApiError::Deserialization(e.to_string()))?;
    let rows = match parts.next() {
        None | Some(Value::Null) => Vec::new(),
        Some(rows) => serde_json::from_value::<Vec<WorldBankRow>>(rows)
            .map_err(|e| ApiError::Deserialization(e.to_string()))?,
    };
    Ok((meta, rows))
}

/// Maps World Bank rows onto raw observations.
///
/// Rows whose `date` is not a plain year are dropped here; null values are kept so the
/// reconciliation step can count them.
pub fn map_rows(rows: Vec<WorldBankRow>, fetched_at: DateTime<Utc>) -> Vec<RawObservation> {
    rows.into_iter()
        .filter_map(|row| {
            let year = match row.date.trim().parse::<i32>() {
                Ok(year) => year,
                Err(_) => {
                    tracing::debug!(
                        date = %row.date,
                        indicator = %row.indicator.id,
                        "Skipping non-annual World Bank row."
                    );
                    return None;
                }
            };
            let entry = catalog_entry(&row.indicator.id);
            let indicator_name = if row.indicator.value.is_empty() {
                entry.map(|e| e.name.to_string()).unwrap_or_else(|| row.indicator.id.clone())
            } else {
                row.indicator.value.clone()
            };
            let unit = if row.unit.is_empty() {
                entry.map(|e| e.unit.to_string()).unwrap_or_default()
            } else {
                row.unit.clone()
            };
            // Older payloads omit the ISO3 code; fall back to the two-letter id.
            let country_code = if row.countryiso3code.is_empty() {
                row.country.id.clone()
            } else {
                row.countryiso3code.clone()
            };

            Some(RawObservation {
                country_code,
                category: categorize_indicator(&row.indicator.id),
                family: entry.and_then(|e| e.family),
                indicator_code: row.indicator.id,
                indicator_name,
                year,
                value: row.value,
                unit,
                source: SourceOrganization::WorldBank,
                is_projected: false,
                confidence: Confidence::High,
                fetched_at,
            })
        })
        .collect()
}

#[async_trait]
impl SourceAdapter for WorldBankClient {
    fn organization(&self) -> SourceOrganization {
        SourceOrganization::WorldBank
    }

    fn indicator_codes(&self) -> &[String] {
        &self.indicators
    }

    fn min_request_interval(&self) -> Duration {
        self.request_interval
    }

    fn indicator_name(&self, indicator_code: &str) -> String {
        catalog_entry(indicator_code)
            .map(|e| e.name.to_string())
            .unwrap_or_else(|| indicator_code.to_string())
    }

    fn unit(&self, indicator_code: &str) -> String {
        catalog_entry(indicator_code).map(|e| e.unit.to_string()).unwrap_or_default()
    }

    fn category(&self, indicator_code: &str) -> Category {
        categorize_indicator(indicator_code)
    }

    fn family(&self, indicator_code: &str) -> Option<IndicatorFamily> {
        catalog_entry(indicator_code).and_then(|e| e.family)
    }

    async fn fetch_indicator_data(
        &self,
        indicator_code: &str,
        countries: &[String],
        throttle: &Throttle,
    ) -> Result<Vec<RawObservation>, ApiError> {
        let mut rows = Vec::new();
        let mut page = 1;
        loop {
            throttle.acquire().await;
            let (meta, mut batch) = self.fetch_page(indicator_code, countries, page).await?;
            rows.append(&mut batch);
            if meta.page() >= meta.pages() {
                break;
            }
            page += 1;
        }

        tracing::debug!(
            indicator = indicator_code,
            rows = rows.len(),
            pages = page,
            "World Bank fetch complete."
        );
        Ok(map_rows(rows, Utc::now()))
    }
}
