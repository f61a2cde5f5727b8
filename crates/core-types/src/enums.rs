use crate::error::CoreError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The statistical agency an indicator value was obtained from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceOrganization {
    #[serde(rename = "World Bank")]
    WorldBank,
    #[serde(rename = "IMF")]
    Imf,
    #[serde(rename = "OECD")]
    Oecd,
    #[serde(rename = "FRED")]
    Fred,
    #[serde(rename = "Trading Economics")]
    TradingEconomics,
    Other,
}

impl SourceOrganization {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceOrganization::WorldBank => "World Bank",
            SourceOrganization::Imf => "IMF",
            SourceOrganization::Oecd => "OECD",
            SourceOrganization::Fred => "FRED",
            SourceOrganization::TradingEconomics => "Trading Economics",
            SourceOrganization::Other => "Other",
        }
    }
}

impl FromStr for SourceOrganization {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "World Bank" => Ok(SourceOrganization::WorldBank),
            "IMF" => Ok(SourceOrganization::Imf),
            "OECD" => Ok(SourceOrganization::Oecd),
            "FRED" => Ok(SourceOrganization::Fred),
            "Trading Economics" => Ok(SourceOrganization::TradingEconomics),
            "Other" => Ok(SourceOrganization::Other),
            other => Err(CoreError::UnknownVariant("source organization", other.to_string())),
        }
    }
}

impl fmt::Display for SourceOrganization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The thematic category an indicator belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "GDP")]
    Gdp,
    Employment,
    Inflation,
    Trade,
    Government,
    Social,
    Financial,
    Environmental,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Gdp => "GDP",
            Category::Employment => "Employment",
            Category::Inflation => "Inflation",
            Category::Trade => "Trade",
            Category::Government => "Government",
            Category::Social => "Social",
            Category::Financial => "Financial",
            Category::Environmental => "Environmental",
        }
    }
}

impl FromStr for Category {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GDP" => Ok(Category::Gdp),
            "Employment" => Ok(Category::Employment),
            "Inflation" => Ok(Category::Inflation),
            "Trade" => Ok(Category::Trade),
            "Government" => Ok(Category::Government),
            "Social" => Ok(Category::Social),
            "Financial" => Ok(Category::Financial),
            "Environmental" => Ok(Category::Environmental),
            other => Err(CoreError::UnknownVariant("category", other.to_string())),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Confidence {
    #[default]
    High,
    Medium,
    Low,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::High => "High",
            Confidence::Medium => "Medium",
            Confidence::Low => "Low",
        }
    }
}

impl FromStr for Confidence {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "High" => Ok(Confidence::High),
            "Medium" => Ok(Confidence::Medium),
            "Low" => Ok(Confidence::Low),
            other => Err(CoreError::UnknownVariant("confidence", other.to_string())),
        }
    }
}

/// Which side of a cutoff is the dangerous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    /// A value at or above the cutoff is a breach (unemployment, inflation, debt).
    HigherIsWorse,
    /// A value at or below the cutoff is a breach (GDP growth).
    LowerIsWorse,
}

impl Polarity {
    /// Returns `true` when `value` is on the bad side of `cutoff`, boundary included.
    pub fn breaches(&self, value: Decimal, cutoff: Decimal) -> bool {
        match self {
            Polarity::HigherIsWorse => value >= cutoff,
            Polarity::LowerIsWorse => value <= cutoff,
        }
    }
}

/// The canonical macro indicator families tracked by risk scoring and threshold alerts.
///
/// Source adapters declare the family of each indicator code they ingest, so the
/// scoring layer never has to infer it from the code text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IndicatorFamily {
    #[serde(rename = "gdpGrowth", alias = "gdp_growth")]
    GdpGrowth,
    #[serde(rename = "unemployment")]
    Unemployment,
    #[serde(rename = "inflation")]
    Inflation,
    #[serde(rename = "debtToGDP", alias = "debt_to_gdp")]
    DebtToGdp,
}

impl IndicatorFamily {
    /// All families, in the fixed order used for reports and recommendations.
    pub const ALL: [IndicatorFamily; 4] = [
        IndicatorFamily::GdpGrowth,
        IndicatorFamily::Unemployment,
        IndicatorFamily::Inflation,
        IndicatorFamily::DebtToGdp,
    ];

    /// The key used in assessments and the JSON API.
    pub fn key(&self) -> &'static str {
        match self {
            IndicatorFamily::GdpGrowth => "gdpGrowth",
            IndicatorFamily::Unemployment => "unemployment",
            IndicatorFamily::Inflation => "inflation",
            IndicatorFamily::DebtToGdp => "debtToGDP",
        }
    }

    pub fn polarity(&self) -> Polarity {
        match self {
            IndicatorFamily::GdpGrowth => Polarity::LowerIsWorse,
            IndicatorFamily::Unemployment
            | IndicatorFamily::Inflation
            | IndicatorFamily::DebtToGdp => Polarity::HigherIsWorse,
        }
    }
}

impl FromStr for IndicatorFamily {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gdpGrowth" | "gdp_growth" => Ok(IndicatorFamily::GdpGrowth),
            "unemployment" => Ok(IndicatorFamily::Unemployment),
            "inflation" => Ok(IndicatorFamily::Inflation),
            "debtToGDP" | "debt_to_gdp" => Ok(IndicatorFamily::DebtToGdp),
            other => Err(CoreError::UnknownVariant("indicator family", other.to_string())),
        }
    }
}

impl fmt::Display for IndicatorFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AlertSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Low => "Low",
            AlertSeverity::Medium => "Medium",
            AlertSeverity::High => "High",
            AlertSeverity::Critical => "Critical",
        }
    }
}

impl FromStr for AlertSeverity {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Low" => Ok(AlertSeverity::Low),
            "Medium" => Ok(AlertSeverity::Medium),
            "High" => Ok(AlertSeverity::High),
            "Critical" => Ok(AlertSeverity::Critical),
            other => Err(CoreError::UnknownVariant("alert severity", other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertCategory {
    Economic,
    Social,
    Crisis,
    System,
}

impl AlertCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertCategory::Economic => "Economic",
            AlertCategory::Social => "Social",
            AlertCategory::Crisis => "Crisis",
            AlertCategory::System => "System",
        }
    }
}

impl FromStr for AlertCategory {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Economic" => Ok(AlertCategory::Economic),
            "Social" => Ok(AlertCategory::Social),
            "Crisis" => Ok(AlertCategory::Crisis),
            "System" => Ok(AlertCategory::System),
            other => Err(CoreError::UnknownVariant("alert category", other.to_string())),
        }
    }
}
