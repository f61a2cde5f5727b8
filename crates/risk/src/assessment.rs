use core_types::IndicatorFamily;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Severity band of a single indicator or of a whole country.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn score(&self) -> u8 {
        match self {
            RiskLevel::Low => 1,
            RiskLevel::Medium => 2,
            RiskLevel::High => 3,
            RiskLevel::Critical => 4,
        }
    }

    /// Level of a country from its exact mean factor score.
    pub fn from_mean_score(score: Decimal) -> Self {
        if score >= dec!(3.5) {
            RiskLevel::Critical
        } else if score >= dec!(2.5) {
            RiskLevel::High
        } else if score >= dec!(1.5) {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Band of the average country score in a global report. Its cutoffs are lower
/// than the per-country ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum GlobalRiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl GlobalRiskLevel {
    pub fn from_average(score: Decimal) -> Self {
        if score >= dec!(3.0) {
            GlobalRiskLevel::Critical
        } else if score >= dec!(2.0) {
            GlobalRiskLevel::High
        } else if score >= dec!(1.5) {
            GlobalRiskLevel::Medium
        } else {
            GlobalRiskLevel::Low
        }
    }
}

impl fmt::Display for GlobalRiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GlobalRiskLevel::Low => "Low",
            GlobalRiskLevel::Medium => "Medium",
            GlobalRiskLevel::High => "High",
            GlobalRiskLevel::Critical => "Critical",
        };
        f.write_str(s)
    }
}

/// Traffic-light summary of a country's overall risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AlertLevel {
    Green,
    Yellow,
    Orange,
    Red,
}

impl From<RiskLevel> for AlertLevel {
    fn from(level: RiskLevel) -> Self {
        match level {
            RiskLevel::Critical => AlertLevel::Red,
            RiskLevel::High => AlertLevel::Orange,
            RiskLevel::Medium => AlertLevel::Yellow,
            RiskLevel::Low => AlertLevel::Green,
        }
    }
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AlertLevel::Green => "Green",
            AlertLevel::Yellow => "Yellow",
            AlertLevel::Orange => "Orange",
            AlertLevel::Red => "Red",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskFactor {
    pub level: RiskLevel,
    pub score: u8,
    pub value: Decimal,
    /// The record the value was taken from.
    pub indicator_code: String,
    pub year: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallRisk {
    pub level: RiskLevel,
    /// Mean of the present factor scores, rounded to two decimals.
    pub score: Decimal,
}

/// The derived risk picture of one country for a three-year window ending at `year`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    pub country_code: String,
    pub year: i32,
    /// Only families with data appear; keys serialize as `gdpGrowth`, `unemployment`, ...
    pub risk_factors: BTreeMap<IndicatorFamily, RiskFactor>,
    pub overall_risk: OverallRisk,
    pub recommendations: Vec<String>,
    pub alert_level: AlertLevel,
}

impl RiskAssessment {
    pub fn has_factors(&self) -> bool {
        !self.risk_factors.is_empty()
    }
}

/// How many countries fall in each overall level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LevelDistribution {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl LevelDistribution {
    pub fn add(&mut self, level: RiskLevel) {
        match level {
            RiskLevel::Critical => self.critical += 1,
            RiskLevel::High => self.high += 1,
            RiskLevel::Medium => self.medium += 1,
            RiskLevel::Low => self.low += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryFailure {
    pub country_code: String,
    pub error: String,
}

/// Risk assessments across a set of countries, riskiest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalRiskReport {
    pub year: i32,
    pub assessments: Vec<RiskAssessment>,
    pub average_score: Decimal,
    pub global_level: GlobalRiskLevel,
    pub distribution: LevelDistribution,
    pub highest_risk: Option<String>,
    pub lowest_risk: Option<String>,
    /// Countries that could not be assessed, with the reason.
    pub failures: Vec<CountryFailure>,
}
