use crate::assessment::{
    AlertLevel, CountryFailure, GlobalRiskLevel, GlobalRiskReport, LevelDistribution, OverallRisk,
    RiskAssessment, RiskFactor, RiskLevel,
};
use crate::error::RiskError;
use crate::recommendations::recommendation;
use chrono::Utc;
use configuration::RiskThresholds;
use core_types::{max_year, IndicatorFamily, IndicatorRecord, MIN_YEAR};
use database::IndicatorStore;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Years before the target year that are still considered current.
const WINDOW_YEARS: i32 = 2;

/// Classifies stored indicators into risk bands and aggregates them per country.
///
/// Stateless apart from the immutable threshold table; safe to share across tasks.
#[derive(Debug, Clone)]
pub struct RiskEngine {
    thresholds: RiskThresholds,
}

impl RiskEngine {
    pub fn new(thresholds: RiskThresholds) -> Self {
        Self { thresholds }
    }

    /// Places `value` in the bands of `family`. Boundaries belong to the worse band.
    pub fn classify(&self, family: IndicatorFamily, value: Decimal) -> RiskLevel {
        let bands = self.thresholds.bands(family);
        let polarity = family.polarity();
        if polarity.breaches(value, bands.critical) {
            RiskLevel::Critical
        } else if polarity.breaches(value, bands.high) {
            RiskLevel::High
        } else if polarity.breaches(value, bands.medium) {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    /// Builds the assessment of `country_code` from the records of its window.
    ///
    /// Pure: the same records always give the same assessment, whatever their order.
    pub fn assess(
        &self,
        country_code: &str,
        year: i32,
        records: &[IndicatorRecord],
    ) -> RiskAssessment {
        let mut risk_factors = BTreeMap::new();
        for (family, record, value) in select_per_family(records) {
            let level = self.classify(family, value);
            risk_factors.insert(
                family,
                RiskFactor {
                    level,
                    score: level.score(),
                    value,
                    indicator_code: record.indicator_code.clone(),
                    year: record.year,
                },
            );
        }

        let overall_risk = aggregate(&risk_factors);
        let recommendations = recommendations_for(&risk_factors);

        RiskAssessment {
            country_code: country_code.to_string(),
            year,
            alert_level: AlertLevel::from(overall_risk.level),
            risk_factors,
            overall_risk,
            recommendations,
        }
    }

    /// Reads the `[year-2, year]` window of `country_code` from the store and assesses it.
    pub async fn analyze_country_risk(
        &self,
        store: &dyn IndicatorStore,
        country_code: &str,
        year: i32,
    ) -> Result<RiskAssessment, RiskError> {
        let country_code = normalize_country(country_code)?;
        let latest = max_year(Utc::now());
        if !(MIN_YEAR..=latest).contains(&year) {
            return Err(RiskError::YearOutOfRange(year, MIN_YEAR, latest));
        }

        let records = store.find(&country_code, None, (year - WINDOW_YEARS)..=year).await?;
        let assessment = self.assess(&country_code, year, &records);
        tracing::debug!(
            country = %country_code,
            year,
            factors = assessment.risk_factors.len(),
            level = %assessment.overall_risk.level,
            "Country risk assessed."
        );
        Ok(assessment)
    }

    /// Assesses every country in `countries`. A country that fails is logged and listed
    /// in `failures`; the rest of the batch still runs.
    pub async fn detect_global_risks(
        &self,
        store: &dyn IndicatorStore,
        countries: &[String],
        year: i32,
    ) -> GlobalRiskReport {
        let mut assessments = Vec::with_capacity(countries.len());
        let mut failures = Vec::new();

        for country_code in countries {
            match self.analyze_country_risk(store, country_code, year).await {
                Ok(assessment) => assessments.push(assessment),
                Err(e) => {
                    tracing::warn!(
                        country = %country_code,
                        error = %e,
                        "Skipping country in global risk report."
                    );
                    failures.push(CountryFailure {
                        country_code: country_code.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        // Stable: equal scores keep the order they were requested in.
        assessments.sort_by(|a, b| b.overall_risk.score.cmp(&a.overall_risk.score));

        let mut distribution = LevelDistribution::default();
        for assessment in &assessments {
            distribution.add(assessment.overall_risk.level);
        }

        let average_score = if assessments.is_empty() {
            Decimal::ZERO
        } else {
            let total: Decimal = assessments.iter().map(|a| a.overall_risk.score).sum();
            (total / Decimal::from(assessments.len())).round_dp(2)
        };

        tracing::info!(
            assessed = assessments.len(),
            failed = failures.len(),
            average = %average_score,
            "Global risk analysis completed."
        );

        GlobalRiskReport {
            year,
            highest_risk: assessments.first().map(|a| a.country_code.clone()),
            lowest_risk: assessments.last().map(|a| a.country_code.clone()),
            global_level: GlobalRiskLevel::from_average(average_score),
            average_score,
            distribution,
            assessments,
            failures,
        }
    }
}

fn normalize_country(country_code: &str) -> Result<String, RiskError> {
    let code = country_code.trim().to_ascii_uppercase();
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) {
        Ok(code)
    } else {
        Err(RiskError::InvalidCountry(country_code.to_string()))
    }
}

/// Picks one record per family: the most recent year, then the latest fetch, then the
/// greatest indicator code. Records without a family or a value are ignored.
fn select_per_family(
    records: &[IndicatorRecord],
) -> Vec<(IndicatorFamily, &IndicatorRecord, Decimal)> {
    let mut chosen: BTreeMap<IndicatorFamily, &IndicatorRecord> = BTreeMap::new();
    for record in records {
        let (Some(family), Some(_)) = (record.family, record.value) else {
            continue;
        };
        chosen
            .entry(family)
            .and_modify(|current| {
                if precedence(record) > precedence(*current) {
                    *current = record;
                }
            })
            .or_insert(record);
    }

    chosen
        .into_iter()
        .filter_map(|(family, record)| record.value.map(|value| (family, record, value)))
        .collect()
}

fn precedence(record: &IndicatorRecord) -> (i32, chrono::DateTime<Utc>, &str) {
    (record.year, record.fetched_at, record.indicator_code.as_str())
}

fn aggregate(factors: &BTreeMap<IndicatorFamily, RiskFactor>) -> OverallRisk {
    if factors.is_empty() {
        return OverallRisk { level: RiskLevel::Low, score: Decimal::ZERO };
    }
    let total: Decimal = factors.values().map(|f| Decimal::from(f.score)).sum();
    let mean = total / Decimal::from(factors.len());
    OverallRisk {
        level: RiskLevel::from_mean_score(mean),
        score: mean.round_dp(2),
    }
}

/// Critical-tier advice first, each tier in the fixed family order.
fn recommendations_for(factors: &BTreeMap<IndicatorFamily, RiskFactor>) -> Vec<String> {
    [RiskLevel::Critical, RiskLevel::High]
        .into_iter()
        .flat_map(|tier| {
            factors
                .iter()
                .filter(move |(_, factor)| factor.level == tier)
                .filter_map(move |(family, _)| recommendation(*family, tier))
        })
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use core_types::{Category, Confidence, SourceOrganization};
    use rust_decimal_macros::dec;

    fn engine() -> RiskEngine {
        RiskEngine::new(RiskThresholds::default())
    }

    fn record(code: &str, family: IndicatorFamily, year: i32, value: Decimal) -> IndicatorRecord {
        let fetched_at = Utc.with_ymd_and_hms(2024, 6, 1, 2, 0, 0).unwrap();
        IndicatorRecord {
            country_code: "ARG".into(),
            indicator_code: code.into(),
            indicator_name: code.into(),
            year,
            value: Some(value),
            unit: "%".into(),
            source: SourceOrganization::Imf,
            category: Category::Gdp,
            family: Some(family),
            is_projected: false,
            confidence: Confidence::High,
            fetched_at,
            last_updated: fetched_at,
        }
    }

    #[test]
    fn gdp_growth_is_lower_is_worse() {
        let e = engine();
        assert_eq!(e.classify(IndicatorFamily::GdpGrowth, dec!(-4)), RiskLevel::Critical);
        assert_eq!(e.classify(IndicatorFamily::GdpGrowth, dec!(-3)), RiskLevel::Critical);
        assert_eq!(e.classify(IndicatorFamily::GdpGrowth, dec!(-2)), RiskLevel::High);
        assert_eq!(e.classify(IndicatorFamily::GdpGrowth, dec!(0.5)), RiskLevel::Medium);
        assert_eq!(e.classify(IndicatorFamily::GdpGrowth, dec!(6)), RiskLevel::Low);
    }

    #[test]
    fn unemployment_is_higher_is_worse() {
        let e = engine();
        assert_eq!(e.classify(IndicatorFamily::Unemployment, dec!(15)), RiskLevel::Critical);
        assert_eq!(e.classify(IndicatorFamily::Unemployment, dec!(8)), RiskLevel::High);
        assert_eq!(e.classify(IndicatorFamily::Unemployment, dec!(7)), RiskLevel::Medium);
        assert_eq!(e.classify(IndicatorFamily::Unemployment, dec!(3)), RiskLevel::Low);
        assert_eq!(RiskLevel::Critical.score(), 4);
        assert_eq!(RiskLevel::Low.score(), 1);
    }

    #[test]
    fn mean_of_two_point_five_is_high() {
        // Scores 1, 4, 3, 2.
        let records = vec![
            record("NGDP_RPCH", IndicatorFamily::GdpGrowth, 2024, dec!(3)),
            record("LUR", IndicatorFamily::Unemployment, 2024, dec!(13)),
            record("PCPIPCH", IndicatorFamily::Inflation, 2024, dec!(7)),
            record("GGXWDG_NGDP", IndicatorFamily::DebtToGdp, 2024, dec!(75)),
        ];
        let a = engine().assess("ARG", 2024, &records);
        assert_eq!(a.overall_risk.score, dec!(2.5));
        assert_eq!(a.overall_risk.level, RiskLevel::High);
        assert_eq!(a.alert_level, AlertLevel::Orange);
        // One critical (unemployment) then one high (inflation).
        assert_eq!(a.recommendations.len(), 2);
        assert_eq!(
            a.recommendations[0],
            recommendation(IndicatorFamily::Unemployment, RiskLevel::Critical).unwrap()
        );
        assert_eq!(
            a.recommendations[1],
            recommendation(IndicatorFamily::Inflation, RiskLevel::High).unwrap()
        );
    }

    #[test]
    fn missing_families_are_left_out_of_the_mean() {
        let records = vec![
            record("NGDP_RPCH", IndicatorFamily::GdpGrowth, 2024, dec!(-4)),
            record("LUR", IndicatorFamily::Unemployment, 2024, dec!(3)),
        ];
        let a = engine().assess("ARG", 2024, &records);
        assert_eq!(a.risk_factors.len(), 2);
        assert_eq!(a.overall_risk.score, dec!(2.5));
        assert!(!a.risk_factors.contains_key(&IndicatorFamily::Inflation));
    }

    #[test]
    fn rounding_does_not_change_the_level() {
        // Scores 4, 4, 3 average 3.666..., reported as 3.67.
        let records = vec![
            record("NGDP_RPCH", IndicatorFamily::GdpGrowth, 2024, dec!(-5)),
            record("LUR", IndicatorFamily::Unemployment, 2024, dec!(20)),
            record("PCPIPCH", IndicatorFamily::Inflation, 2024, dec!(7)),
        ];
        let a = engine().assess("ARG", 2024, &records);
        assert_eq!(a.overall_risk.score, dec!(3.67));
        assert_eq!(a.overall_risk.level, RiskLevel::Critical);
        assert_eq!(a.alert_level, AlertLevel::Red);
    }

    #[test]
    fn no_data_is_low_with_zero_score() {
        let a = engine().assess("ARG", 2024, &[]);
        assert!(!a.has_factors());
        assert_eq!(a.overall_risk.score, Decimal::ZERO);
        assert_eq!(a.overall_risk.level, RiskLevel::Low);
        assert_eq!(a.alert_level, AlertLevel::Green);
        assert!(a.recommendations.is_empty());
    }

    #[test]
    fn most_recent_year_wins_regardless_of_order() {
        let old = record("LUR", IndicatorFamily::Unemployment, 2022, dec!(15));
        let new = record("LUR", IndicatorFamily::Unemployment, 2024, dec!(5));
        let forward = engine().assess("ARG", 2024, &[old.clone(), new.clone()]);
        let backward = engine().assess("ARG", 2024, &[new, old]);
        assert_eq!(forward, backward);

        let factor = &forward.risk_factors[&IndicatorFamily::Unemployment];
        assert_eq!(factor.year, 2024);
        assert_eq!(factor.level, RiskLevel::Low);
    }

    #[test]
    fn same_year_ties_break_on_fetch_time_then_code() {
        let mut imf = record("LUR", IndicatorFamily::Unemployment, 2024, dec!(5));
        let wb = record("SL.UEM.TOTL.ZS", IndicatorFamily::Unemployment, 2024, dec!(9));
        imf.fetched_at = wb.fetched_at + Duration::minutes(1);

        let a = engine().assess("ARG", 2024, &[wb.clone(), imf.clone()]);
        assert_eq!(a.risk_factors[&IndicatorFamily::Unemployment].indicator_code, "LUR");

        imf.fetched_at = wb.fetched_at;
        let a = engine().assess("ARG", 2024, &[imf, wb]);
        assert_eq!(a.risk_factors[&IndicatorFamily::Unemployment].indicator_code, "SL.UEM.TOTL.ZS");
    }

    #[test]
    fn medium_and_low_factors_get_no_advice() {
        let records = vec![
            record("LUR", IndicatorFamily::Unemployment, 2024, dec!(7)),
            record("PCPIPCH", IndicatorFamily::Inflation, 2024, dec!(2)),
        ];
        assert!(engine().assess("ARG", 2024, &records).recommendations.is_empty());
    }

    #[test]
    fn country_codes_are_normalized() {
        assert_eq!(normalize_country(" deu ").unwrap(), "DEU");
        assert!(matches!(normalize_country("DE"), Err(RiskError::InvalidCountry(_))));
    }
}
