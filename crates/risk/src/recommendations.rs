use crate::assessment::RiskLevel;
use core_types::IndicatorFamily;

/// Fixed advice for a family at a given level. Only `High` and `Critical` carry any.
pub fn recommendation(family: IndicatorFamily, level: RiskLevel) -> Option<&'static str> {
    let text = match (family, level) {
        (IndicatorFamily::GdpGrowth, RiskLevel::Critical) => {
            "Output is contracting sharply: prepare counter-cyclical fiscal support and stress-test bank liquidity."
        }
        (IndicatorFamily::GdpGrowth, RiskLevel::High) => {
            "Growth is stalling: monitor leading indicators closely and plan targeted support for exposed sectors."
        }
        (IndicatorFamily::Unemployment, RiskLevel::Critical) => {
            "Unemployment is at crisis levels: extend income support and launch emergency job programmes."
        }
        (IndicatorFamily::Unemployment, RiskLevel::High) => {
            "Unemployment is elevated: scale up active labour market policies and retraining."
        }
        (IndicatorFamily::Inflation, RiskLevel::Critical) => {
            "Inflation is out of control: tighten monetary policy decisively and shield vulnerable households."
        }
        (IndicatorFamily::Inflation, RiskLevel::High) => {
            "Inflation is running high: consider monetary tightening and watch for wage-price spirals."
        }
        (IndicatorFamily::DebtToGdp, RiskLevel::Critical) => {
            "Public debt is at distress levels: commit to a credible consolidation path and review debt sustainability."
        }
        (IndicatorFamily::DebtToGdp, RiskLevel::High) => {
            "Public debt is high: restrain new borrowing and lengthen the maturity profile."
        }
        (_, RiskLevel::Medium | RiskLevel::Low) => return None,
    };
    Some(text)
}
