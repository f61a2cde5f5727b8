//! Country risk scoring over the canonical indicator store.
//!
//! `RiskEngine` projects a country's recent records onto the four tracked indicator
//! families, classifies each against the configured bands and aggregates the result
//! into an overall level, a traffic-light alert level and a list of recommendations.

pub mod assessment;
pub mod engine;
pub mod error;
pub mod recommendations;

pub use assessment::{
    AlertLevel, CountryFailure, GlobalRiskLevel, GlobalRiskReport, LevelDistribution,
    OverallRisk, RiskAssessment, RiskFactor, RiskLevel,
};
pub use engine::RiskEngine;
pub use error::RiskError;
