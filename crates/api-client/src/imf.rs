use crate::error::ApiError;
use crate::responses::ImfResponse;
use crate::throttle::Throttle;
use crate::SourceAdapter;
use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use configuration::ImfConfig;
use core_types::{Category, Confidence, IndicatorFamily, RawObservation, SourceOrganization};
use std::time::Duration;

struct CatalogEntry {
    code: &'static str,
    name: &'static str,
    unit: &'static str,
    family: Option<IndicatorFamily>,
}

const CATALOG: &[CatalogEntry] = &[
    CatalogEntry {
        code: "NGDP_RPCH",
        name: "Real GDP growth",
        unit: "Percent change",
        family: Some(IndicatorFamily::GdpGrowth),
    },
    CatalogEntry {
        code: "NGDPD",
        name: "Nominal GDP (USD billions)",
        unit: "USD billions",
        family: None,
    },
    CatalogEntry { code: "NGDPDPC", name: "GDP per capita (USD)", unit: "USD", family: None },
    CatalogEntry {
        code: "LUR",
        name: "Unemployment rate",
        unit: "Percent",
        family: Some(IndicatorFamily::Unemployment),
    },
    CatalogEntry {
        code: "PCPIPCH",
        name: "Inflation rate",
        unit: "Percent change",
        family: Some(IndicatorFamily::Inflation),
    },
    CatalogEntry {
        code: "GGR_NGDP",
        name: "General government revenue (% of GDP)",
        unit: "Percent of GDP",
        family: None,
    },
    CatalogEntry {
        code: "GGX_NGDP",
        name: "General government expenditure (% of GDP)",
        unit: "Percent of GDP",
        family: None,
    },
    CatalogEntry {
        code: "GGXCNL_NGDP",
        name: "General government net lending/borrowing (% of GDP)",
        unit: "Percent of GDP",
        family: None,
    },
    CatalogEntry {
        code: "GGXWDG_NGDP",
        name: "General government gross debt (% of GDP)",
        unit: "Percent of GDP",
        family: Some(IndicatorFamily::DebtToGdp),
    },
];

const CATEGORY_PREFIXES: &[(&str, Category)] = &[
    ("NGDP", Category::Gdp),
    ("LUR", Category::Employment),
    ("PCPI", Category::Inflation),
    ("GG", Category::Government),
    ("BCA", Category::Trade),
    ("CA", Category::Trade),
];

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

/// A source adapter for the IMF DataMapper API.
#[derive(Clone)]
pub struct ImfClient {
    client: reqwest::Client,
    base_url: String,
    indicators: Vec<String>,
    request_interval: Duration,
}

impl ImfClient {
    pub fn new(config: &ImfConfig, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("econwatch/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            indicators: config.indicators.clone(),
            request_interval: Duration::from_millis(config.request_interval_ms),
        })
    }
}

/// Flattens a DataMapper payload into raw observations.
///
/// Years after the year of `fetched_at` are WEO projections: flagged and given `Medium`
/// confidence. Year keys that are not integers are dropped. Null values are kept.
pub fn map_response(
    indicator_code: &str,
    response: ImfResponse,
    fetched_at: DateTime<Utc>,
) -> Vec<RawObservation> {
    let Some(values) = response.values else {
        return Vec::new();
    };

    let entry = catalog_entry(indicator_code);
    let indicator_name = entry
        .map(|e| e.name.to_string())
        .unwrap_or_else(|| indicator_code.to_string());
    let unit = entry.map(|e| e.unit.to_string()).unwrap_or_default();
    let family = entry.and_then(|e| e.family);
    let category = categorize_indicator(indicator_code);
    let current_year = fetched_at.year();

    let mut observations = Vec::new();
    for (_, by_country) in values {
        for (country_code, by_year) in by_country {
            for (year, value) in by_year {
                let Ok(year) = year.trim().parse::<i32>() else {
                    tracing::debug!(
                        year = %year,
                        indicator = indicator_code,
                        "Skipping non-annual IMF entry."
                    );
                    continue;
                };
                let is_projected = year > current_year;
                observations.push(RawObservation {
                    country_code: country_code.clone(),
                    indicator_code: indicator_code.to_string(),
                    indicator_name: indicator_name.clone(),
                    year,
                    value,
                    unit: unit.clone(),
                    source: SourceOrganization::Imf,
                    category,
                    family,
                    is_projected,
                    confidence: if is_projected { Confidence::Medium } else { Confidence::High },
                    fetched_at,
                });
            }
        }
    }
    observations
}

#[async_trait]
impl SourceAdapter for ImfClient {
    fn organization(&self) -> SourceOrganization {
        SourceOrganization::Imf
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
        let mut url = format!("{}/{}", self.base_url, indicator_code);
        if !countries.is_empty() {
            url.push('/');
            url.push_str(&countries.join("/"));
        }

        throttle.acquire().await;
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(ApiError::Upstream(format!("HTTP {} from {}: {}", status, url, text)));
        }

        let parsed: ImfResponse =
            serde_json::from_str(&text).map_err(|e| ApiError::Deserialization(e.to_string()))?;
        let observations = map_response(indicator_code, parsed, Utc::now());
        tracing::debug!(
            indicator = indicator_code,
            observations = observations.len(),
            "IMF fetch complete."
        );
        Ok(observations)
    }
}
