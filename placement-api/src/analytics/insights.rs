//! "AI insights": trend read-outs over the last six months plus heuristic
//! predictions. The insights are deterministic; the predictions carry
//! bounded random jitter drawn from an injected RNG.

use chrono::NaiveDateTime;
use rand::Rng;
use serde::Serialize;
use ts_rs::TS;

use super::metrics::{
    self, Impact, RiskLevel, Trend, WindowTrend, fill_months, finite, rate, risk_level, round2,
};
use super::projection::{
    Jitter, JitterBound, confidence, industry_multiplier, project, province_multiplier,
    seasonal_multiplier,
};
use super::queries::{self, GroupOutcomeRow, LabelHistoryRow, MonthCountRow, StatusOverviewRow};
use super::{AnalyticsError, ConnectionSource, ReportWindow};

/// Months of history behind every insight and prediction.
pub const HISTORY_MONTHS: u32 = 6;

/// Additive noise on the predicted registration count.
pub const REGISTRATION_JITTER: Jitter = Jitter::symmetric(2.0);
/// Additive noise, in percentage points, on growth rates.
pub const GROWTH_JITTER: Jitter = Jitter::symmetric(3.0);

#[derive(Debug, Clone)]
pub struct InsightRows {
    pub registrations: Vec<MonthCountRow>,
    pub placements: Vec<MonthCountRow>,
    pub status: StatusOverviewRow,
    pub provinces: Vec<LabelHistoryRow>,
    pub industries: Vec<LabelHistoryRow>,
    pub districts: Vec<GroupOutcomeRow>,
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AiInsightsReport {
    pub insights: Vec<Insight>,
    pub predictions: Predictions,
    #[ts(type = "string")]
    pub generated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "kebab-case")]
#[ts(export)]
pub enum InsightId {
    EnrollmentTrend,
    PlacementTrend,
    SuccessRate,
    TopIndustry,
    DistrictRisk,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum InsightCategory {
    Enrollment,
    Placement,
    Performance,
    Industry,
    Risk,
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Insight {
    pub id: InsightId,
    pub category: InsightCategory,
    pub title: String,
    pub description: String,
    pub trend: Option<Trend>,
    pub change_percentage: Option<f64>,
    pub value: Option<f64>,
    pub impact: Impact,
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Predictions {
    pub next_month_registrations: RegistrationForecast,
    pub province_forecasts: Vec<ProvinceForecast>,
    pub industry_demand: Vec<IndustryDemand>,
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RegistrationForecast {
    /// Calendar month being forecast, 1-based.
    pub month: u32,
    pub historical_average: f64,
    pub seasonal_factor: f64,
    pub predicted: f64,
    pub jitter_bound: JitterBound,
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProvinceForecast {
    pub province: String,
    pub monthly_average: f64,
    pub multiplier: f64,
    pub predicted_registrations: f64,
    pub growth_rate: f64,
    pub jitter_bound: JitterBound,
    pub confidence: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum DemandLevel {
    High,
    Moderate,
    Low,
}

pub fn demand_level(multiplier: f64) -> DemandLevel {
    if multiplier >= 1.2 {
        DemandLevel::High
    } else if multiplier >= 1.0 {
        DemandLevel::Moderate
    } else {
        DemandLevel::Low
    }
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct IndustryDemand {
    pub industry: String,
    pub monthly_average: f64,
    pub multiplier: f64,
    pub projected_placements: f64,
    pub demand_level: DemandLevel,
    pub growth_rate: f64,
    pub jitter_bound: JitterBound,
    pub confidence: f64,
}

/// Runs the insights batch.
pub async fn fetch<S: ConnectionSource>(
    source: &S,
    window: &ReportWindow,
) -> Result<InsightRows, AnalyticsError> {
    let since = window.month_start_timestamp(HISTORY_MONTHS - 1);
    let since_date = window.month_start(HISTORY_MONTHS - 1);

    let (registrations, placements, status, provinces, industries, districts) = tokio::try_join!(
        source.run_statement("monthly_registrations", move |c| {
            queries::monthly_registrations(c, since)
        }),
        source.run_statement("monthly_placements", move |c| {
            queries::monthly_placements(c, since_date)
        }),
        source.run_statement("status_overview", queries::status_overview),
        source.run_statement("province_registrations", move |c| {
            queries::province_registrations(c, since)
        }),
        source.run_statement("industry_placements", move |c| {
            queries::industry_placements(c, since_date)
        }),
        source.run_statement("district_performance", queries::district_performance),
    )?;

    Ok(InsightRows {
        registrations,
        placements,
        status,
        provinces,
        industries,
        districts,
    })
}

/// Fetches and derives the report, jittering predictions with the thread
/// RNG.
pub async fn generate<S: ConnectionSource>(
    source: &S,
    window: &ReportWindow,
) -> Result<AiInsightsReport, AnalyticsError> {
    let rows = fetch(source, window).await?;
    Ok(build(rows, window, &mut rand::rng()))
}

fn active_months(series: &[i64]) -> usize {
    series.iter().filter(|c| **c > 0).count()
}

fn trend_insight(
    id: InsightId,
    category: InsightCategory,
    subject: &str,
    trend: WindowTrend,
    confidence: f64,
) -> Insight {
    Insight {
        id,
        category,
        title: format!("{} are {}", subject, trend.trend.as_str()),
        description: format!(
            "{} averaged {:.1} per month over the last three months against {:.1} in the three months before.",
            subject, trend.recent_average, trend.earlier_average
        ),
        trend: Some(trend.trend),
        change_percentage: finite(trend.change),
        value: Some(round2(trend.recent_average)),
        impact: metrics::impact(trend.change),
        confidence,
    }
}

fn success_rate_insight(status: &StatusOverviewRow, history_rows: usize) -> Insight {
    let success_rate = rate(status.employed_students, status.total_students);
    let risk = risk_level(success_rate);
    Insight {
        id: InsightId::SuccessRate,
        category: InsightCategory::Performance,
        title: format!("Overall placement success rate is {}%", success_rate),
        description: format!(
            "{} of {} registered students are employed ({}).",
            status.employed_students,
            status.total_students,
            risk.as_str()
        ),
        trend: None,
        change_percentage: None,
        value: Some(success_rate),
        impact: match risk {
            RiskLevel::High => Impact::High,
            RiskLevel::Medium => Impact::Medium,
            RiskLevel::Low => Impact::Low,
        },
        confidence: confidence(history_rows),
    }
}

fn top_industry_insight(industries: &[LabelHistoryRow]) -> Option<Insight> {
    let top = industries.first()?;
    let total: i64 = industries.iter().map(|i| i.total).sum();
    let multiplier = industry_multiplier(&top.label);
    Some(Insight {
        id: InsightId::TopIndustry,
        category: InsightCategory::Industry,
        title: format!("{} leads placements", top.label),
        description: format!(
            "{} of {} placements in the last six months were in {}.",
            top.total, total, top.label
        ),
        trend: None,
        change_percentage: None,
        value: Some(rate(top.total, total)),
        impact: metrics::impact((multiplier - 1.0) * 100.0),
        confidence: confidence(top.active_months.max(0) as usize),
    })
}

fn district_risk_insight(districts: &[GroupOutcomeRow]) -> Insight {
    let at_risk: Vec<&str> = districts
        .iter()
        .filter(|d| risk_level(rate(d.employed_students, d.total_students)) == RiskLevel::High)
        .map(|d| d.label.as_str())
        .collect();
    let (title, description) = if at_risk.is_empty() {
        (
            "No districts at high risk".to_string(),
            "Every district places at least 30% of its students.".to_string(),
        )
    } else {
        (
            format!("{} district(s) at high risk", at_risk.len()),
            format!("Districts below a 30% success rate: {}.", at_risk.join(", ")),
        )
    };
    Insight {
        id: InsightId::DistrictRisk,
        category: InsightCategory::Risk,
        title,
        description,
        trend: None,
        change_percentage: None,
        value: Some(at_risk.len() as f64),
        impact: if at_risk.is_empty() {
            Impact::Low
        } else {
            Impact::High
        },
        confidence: confidence(districts.len()),
    }
}

/// Derives the report. Everything except the jittered prediction fields is
/// a pure function of `rows` and `window`.
pub fn build<R: Rng + ?Sized>(
    rows: InsightRows,
    window: &ReportWindow,
    rng: &mut R,
) -> AiInsightsReport {
    let keys = window.month_keys(HISTORY_MONTHS);
    let registrations = metrics::counts(&fill_months(&keys, &rows.registrations));
    let placements = metrics::counts(&fill_months(&keys, &rows.placements));

    let mut insights = Vec::new();
    if let Some(trend) = metrics::window_trend(&registrations) {
        insights.push(trend_insight(
            InsightId::EnrollmentTrend,
            InsightCategory::Enrollment,
            "Student registrations",
            trend,
            confidence(active_months(&registrations)),
        ));
    }
    if let Some(trend) = metrics::window_trend(&placements) {
        insights.push(trend_insight(
            InsightId::PlacementTrend,
            InsightCategory::Placement,
            "Placements",
            trend,
            confidence(active_months(&placements)),
        ));
    }
    insights.push(success_rate_insight(&rows.status, rows.districts.len()));
    if let Some(insight) = top_industry_insight(&rows.industries) {
        insights.push(insight);
    }
    insights.push(district_risk_insight(&rows.districts));

    let months = HISTORY_MONTHS as f64;
    let next_month = window.next_month();
    let seasonal = seasonal_multiplier(next_month);

    let historical_average = metrics::average(&registrations);
    let next_month_registrations = RegistrationForecast {
        month: next_month,
        historical_average: round2(historical_average),
        seasonal_factor: seasonal,
        predicted: round2(
            (project(historical_average, seasonal) + REGISTRATION_JITTER.sample(rng)).max(0.0),
        ),
        jitter_bound: REGISTRATION_JITTER.bound(),
        confidence: confidence(active_months(&registrations)),
    };

    let province_forecasts = rows
        .provinces
        .iter()
        .map(|row| {
            let monthly_average = row.total as f64 / months;
            let multiplier = province_multiplier(&row.label);
            ProvinceForecast {
                province: row.label.clone(),
                monthly_average: round2(monthly_average),
                multiplier,
                predicted_registrations: round2(project(monthly_average, multiplier * seasonal)),
                growth_rate: round2((multiplier - 1.0) * 100.0 + GROWTH_JITTER.sample(rng)),
                jitter_bound: GROWTH_JITTER.bound(),
                confidence: confidence(row.active_months.max(0) as usize),
            }
        })
        .collect();

    let industry_demand = rows
        .industries
        .iter()
        .map(|row| {
            let monthly_average = row.total as f64 / months;
            let multiplier = industry_multiplier(&row.label);
            IndustryDemand {
                industry: row.label.clone(),
                monthly_average: round2(monthly_average),
                multiplier,
                projected_placements: round2(project(monthly_average, multiplier * seasonal)),
                demand_level: demand_level(multiplier),
                growth_rate: round2((multiplier - 1.0) * 100.0 + GROWTH_JITTER.sample(rng)),
                jitter_bound: GROWTH_JITTER.bound(),
                confidence: confidence(row.active_months.max(0) as usize),
            }
        })
        .collect();

    AiInsightsReport {
        insights,
        predictions: Predictions {
            next_month_registrations,
            province_forecasts,
            industry_demand,
        },
        generated_at: window.now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn window() -> ReportWindow {
        // Six-month history: 2025-01 .. 2025-06, forecasting July
        ReportWindow::new(
            NaiveDate::from_ymd_opt(2025, 6, 15)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap(),
        )
    }

    fn series(counts: [i64; 6]) -> Vec<MonthCountRow> {
        ["2025-01", "2025-02", "2025-03", "2025-04", "2025-05", "2025-06"]
            .iter()
            .zip(counts)
            .map(|(month, count)| MonthCountRow {
                month: Some(month.to_string()),
                count,
            })
            .collect()
    }

    fn rows() -> InsightRows {
        InsightRows {
            registrations: series([8, 9, 10, 10, 12, 15]),
            placements: series([0, 0, 0, 1, 1, 1]),
            status: StatusOverviewRow {
                total_students: 64,
                employed_students: 16,
                active_students: 0,
                pending_students: 48,
                inactive_students: 0,
            },
            provinces: vec![
                LabelHistoryRow {
                    label: "Western".to_string(),
                    total: 60,
                    active_months: 6,
                },
                LabelHistoryRow {
                    label: "Uva".to_string(),
                    total: 4,
                    active_months: 2,
                },
            ],
            industries: vec![LabelHistoryRow {
                label: "Healthcare".to_string(),
                total: 3,
                active_months: 3,
            }],
            districts: vec![
                GroupOutcomeRow {
                    label: "Colombo".to_string(),
                    total_students: 40,
                    employed_students: 14,
                },
                GroupOutcomeRow {
                    label: "Badulla".to_string(),
                    total_students: 24,
                    employed_students: 2,
                },
            ],
        }
    }

    fn insight(report: &AiInsightsReport, id: InsightId) -> &Insight {
        report
            .insights
            .iter()
            .find(|i| i.id == id)
            .expect("insight present")
    }

    #[test]
    fn test_enrollment_trend_increasing() {
        let report = build(rows(), &window(), &mut StdRng::seed_from_u64(3));

        let enrollment = insight(&report, InsightId::EnrollmentTrend);
        assert_eq!(enrollment.trend, Some(Trend::Increasing));
        assert_eq!(enrollment.change_percentage, Some(37.04));
        assert_eq!(enrollment.impact, Impact::High);
        assert_eq!(enrollment.confidence, 70.0);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["insights"][0]["id"], "enrollment-trend");
        assert_eq!(json["insights"][0]["trend"], "increasing");
        assert!(json["generatedAt"].is_string());
    }

    #[test]
    fn test_placement_trend_from_empty_window_is_null() {
        let report = build(rows(), &window(), &mut StdRng::seed_from_u64(3));

        let placement = insight(&report, InsightId::PlacementTrend);
        assert_eq!(placement.change_percentage, None);
        assert_eq!(placement.trend, Some(Trend::Increasing));

        let json = serde_json::to_value(placement).unwrap();
        assert!(json["changePercentage"].is_null());
    }

    #[test]
    fn test_success_and_risk_insights() {
        let report = build(rows(), &window(), &mut StdRng::seed_from_u64(3));

        let success = insight(&report, InsightId::SuccessRate);
        assert_eq!(success.value, Some(25.0));
        assert_eq!(success.impact, Impact::High);

        let risk = insight(&report, InsightId::DistrictRisk);
        assert_eq!(risk.value, Some(1.0));
        assert!(risk.description.contains("Badulla"));
        assert!(!risk.description.contains("Colombo"));

        let top = insight(&report, InsightId::TopIndustry);
        assert_eq!(top.value, Some(100.0));
        assert_eq!(top.impact, Impact::High);
    }

    #[test]
    fn test_no_placements_skips_top_industry() {
        let mut rows = rows();
        rows.industries.clear();
        let report = build(rows, &window(), &mut StdRng::seed_from_u64(3));

        assert!(report.insights.iter().all(|i| i.id != InsightId::TopIndustry));
        assert!(report.predictions.industry_demand.is_empty());
    }

    #[test]
    fn test_predictions_stay_within_jitter_bound() {
        for seed in 0..50 {
            let report = build(rows(), &window(), &mut StdRng::seed_from_u64(seed));
            let forecast = &report.predictions.next_month_registrations;

            // July seasonal factor 1.05 over a 64 / 6 average
            assert_eq!(forecast.month, 7);
            assert_eq!(forecast.seasonal_factor, 1.05);
            let base = 64.0 / 6.0 * 1.05;
            assert!(forecast.predicted >= round2(base + REGISTRATION_JITTER.lower()) - 0.01);
            assert!(forecast.predicted <= round2(base + REGISTRATION_JITTER.upper()) + 0.01);

            let western = &report.predictions.province_forecasts[0];
            assert_eq!(western.multiplier, 1.2);
            assert!(western.growth_rate >= 20.0 - 3.0 - 0.01);
            assert!(western.growth_rate <= 20.0 + 3.0 + 0.01);
            assert_eq!(western.confidence, 70.0);

            let healthcare = &report.predictions.industry_demand[0];
            assert_eq!(healthcare.demand_level, DemandLevel::High);
            assert!(healthcare.growth_rate >= 27.0 - 0.01 && healthcare.growth_rate <= 33.01);
        }
    }

    #[test]
    fn test_same_seed_same_report() {
        let first =
            serde_json::to_string(&build(rows(), &window(), &mut StdRng::seed_from_u64(9))).unwrap();
        let second =
            serde_json::to_string(&build(rows(), &window(), &mut StdRng::seed_from_u64(9))).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_insights_ignore_the_rng() {
        let a = build(rows(), &window(), &mut StdRng::seed_from_u64(1));
        let b = build(rows(), &window(), &mut StdRng::seed_from_u64(2));
        assert_eq!(
            serde_json::to_string(&a.insights).unwrap(),
            serde_json::to_string(&b.insights).unwrap()
        );
    }

    #[test]
    fn test_demand_levels() {
        assert_eq!(demand_level(1.3), DemandLevel::High);
        assert_eq!(demand_level(1.2), DemandLevel::High);
        assert_eq!(demand_level(1.1), DemandLevel::Moderate);
        assert_eq!(demand_level(0.95), DemandLevel::Low);
    }
}
