use crate::{error::AppError, AppState};
use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{Datelike, Utc};
use core_types::{max_year, Alert, MIN_YEAR};
use engine::{DataSourceStatus, SyncReport};
use risk::{GlobalRiskReport, RiskAssessment};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct YearQuery {
    pub year: Option<i32>,
}

impl YearQuery {
    fn year_or_current(&self) -> i32 {
        self.year.unwrap_or_else(|| Utc::now().year())
    }
}

#[derive(Debug, Deserialize)]
pub struct AlertFilter {
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcknowledgeRequest {
    pub acknowledged_by: Option<String>,
}

/// Recorded as the acknowledger when the request names nobody.
const DEFAULT_ACTOR: &str = "api";

/// # GET /api/risk/country/:code
/// A country with no stored data at all is a 404; a country with data outside the
/// window gets an assessment without factors.
pub async fn get_country_risk(
    Path(code): Path<String>,
    Query(query): Query<YearQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<RiskAssessment>, AppError> {
    let year = query.year_or_current();
    let assessment = state.risk.analyze_country_risk(state.store.as_ref(), &code, year).await?;

    if !assessment.has_factors() {
        let any = state
            .store
            .find(&assessment.country_code, None, MIN_YEAR..=max_year(Utc::now()))
            .await?;
        if any.is_empty() {
            return Err(AppError::NotFound(format!(
                "No indicator data for country '{}'",
                assessment.country_code
            )));
        }
    }
    Ok(Json(assessment))
}

/// # GET /api/risk/global
pub async fn get_global_risk(
    Query(query): Query<YearQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<GlobalRiskReport>, AppError> {
    let year = query.year_or_current();
    let report = state
        .risk
        .detect_global_risks(state.store.as_ref(), &state.risk_countries, year)
        .await;
    Ok(Json(report))
}

/// # GET /api/alerts
pub async fn list_alerts(
    Query(filter): Query<AlertFilter>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Alert>>, AppError> {
    let alerts = state.alerts.list(filter.is_active).await?;
    Ok(Json(alerts))
}

/// # PUT /api/alerts/:id/acknowledge
pub async fn acknowledge_alert(
    Path(id): Path<Uuid>,
    State(state): State<Arc<AppState>>,
    body: Option<Json<AcknowledgeRequest>>,
) -> Result<Json<Alert>, AppError> {
    let actor = body
        .and_then(|Json(req)| req.acknowledged_by)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_ACTOR.to_string());

    let alert = state.alerts.acknowledge(id, &actor, Utc::now()).await?;
    tracing::info!(alert_id = %id, actor = %actor, "Alert acknowledged.");
    Ok(Json(alert))
}

/// # POST /api/sync
/// Runs a full sync and answers once it has finished.
pub async fn trigger_sync(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SyncReport>, AppError> {
    let scheduler = state.scheduler.as_ref().ok_or(AppError::SyncUnavailable)?;
    tracing::info!("Manual sync requested over HTTP.");
    Ok(Json(scheduler.run_sync().await))
}

/// # GET /api/status
pub async fn get_status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DataSourceStatus>, AppError> {
    let status = engine::data_source_status(state.store.as_ref()).await?;
    Ok(Json(status))
}
