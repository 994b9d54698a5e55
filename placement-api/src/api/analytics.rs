//! API endpoints for the analytics reports.
//!
//! Each handler runs its report's statement batch over the connection pool
//! and derives the response. A failed batch is logged in full and answered
//! with a generic 500.

use chrono::Utc;
use rocket::Route;
use rocket::serde::json::Json;

use super::{ApiError, internal_error};
use crate::analytics::insights::{self, AiInsightsReport};
use crate::analytics::post_analysis::{self, PostAnalysisReport};
use crate::analytics::pre_analysis::{self, PreAnalysisReport};
use crate::analytics::{PooledSource, ReportWindow};
use crate::session_guards::AnalyticsViewer;

fn window() -> ReportWindow {
    ReportWindow::new(Utc::now().naive_utc())
}

/// Post-Analysis endpoint.
///
/// - **URL:** `/api/1/analytics/post-analysis`
/// - **Method:** `GET`
/// - **Purpose:** Placement outcomes: success rates by district and
///   qualification, company, industry and country breakdowns, salary ranges
///   and the 12-month placement series
/// - **Authentication:** Required, `view_analytics`
///
/// `overview` passes raw counts through in snake_case; the derived
/// `summary` block is camelCase.
#[get("/1/analytics/post-analysis")]
pub async fn post_analysis_report(
    viewer: AnalyticsViewer,
    source: PooledSource<'_>,
) -> Result<Json<PostAnalysisReport>, ApiError> {
    info!("Post-analysis requested by {}", viewer.user.email);
    post_analysis::generate(&source, &window())
        .await
        .map(Json)
        .map_err(|e| internal_error("Post-analysis failed", e))
}

/// Pre-Analysis endpoint.
///
/// - **URL:** `/api/1/analytics/pre-analysis`
/// - **Method:** `GET`
/// - **Purpose:** Registration volume and the make-up of the student body
/// - **Authentication:** Required, `view_analytics`
#[get("/1/analytics/pre-analysis")]
pub async fn pre_analysis_report(
    viewer: AnalyticsViewer,
    source: PooledSource<'_>,
) -> Result<Json<PreAnalysisReport>, ApiError> {
    info!("Pre-analysis requested by {}", viewer.user.email);
    pre_analysis::generate(&source, &window())
        .await
        .map(Json)
        .map_err(|e| internal_error("Pre-analysis failed", e))
}

/// AI Insights endpoint.
///
/// - **URL:** `/api/1/analytics/ai-insights`
/// - **Method:** `GET`
/// - **Purpose:** Six-month trend insights and heuristic predictions
/// - **Authentication:** Required, `view_analytics`
///
/// Prediction values include random jitter and differ between calls; each
/// jittered value is accompanied by its `jitterBound`.
#[get("/1/analytics/ai-insights")]
pub async fn ai_insights_report(
    viewer: AnalyticsViewer,
    source: PooledSource<'_>,
) -> Result<Json<AiInsightsReport>, ApiError> {
    info!("AI insights requested by {}", viewer.user.email);
    insights::generate(&source, &window())
        .await
        .map(Json)
        .map_err(|e| internal_error("AI insights failed", e))
}

pub fn routes() -> Vec<Route> {
    routes![post_analysis_report, pre_analysis_report, ai_insights_report]
}
