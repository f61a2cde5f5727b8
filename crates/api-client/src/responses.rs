use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

// Wire formats of the upstream agencies. Only the fields we map are declared.

/// The paging header that opens every World Bank v2 response (`[meta, rows]`).
///
/// `page`/`pages` arrive as numbers on most endpoints and as strings on a few.
#[derive(Debug, Clone, Deserialize)]
pub struct WorldBankMeta {
    #[serde(default)]
    pub page: Value,
    #[serde(default)]
    pub pages: Value,
}

impl WorldBankMeta {
    pub fn page(&self) -> u32 {
        number_field(&self.page).unwrap_or(1)
    }

    pub fn pages(&self) -> u32 {
        number_field(&self.pages).unwrap_or(1)
    }
}

fn number_field(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// The error envelope: `[{"message": [{"id": "120", "key": "Invalid value", "value": "..."}]}]`.
#[derive(Debug, Clone, Deserialize)]
pub struct WorldBankErrorEnvelope {
    pub message: Vec<WorldBankErrorMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorldBankErrorMessage {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorldBankRef {
    pub id: String,
    #[serde(default)]
    pub value: String,
}

/// One (country, indicator, year) data point.
#[derive(Debug, Clone, Deserialize)]
pub struct WorldBankRow {
    pub indicator: WorldBankRef,
    pub country: WorldBankRef,
    #[serde(default)]
    pub countryiso3code: String,
    pub date: String,
    pub value: Option<f64>,
    #[serde(default)]
    pub unit: String,
}

/// The IMF DataMapper response: `{"values": {indicator: {country: {year: value}}}}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImfResponse {
    #[serde(default)]
    pub values: Option<BTreeMap<String, BTreeMap<String, BTreeMap<String, Option<f64>>>>>,
}
