//! Post-analysis: how students fared once registered. Success rates by
//! district and qualification, placement volume by company, industry and
//! country, and the placement trend.

use serde::Serialize;
use ts_rs::TS;

use super::metrics::{
    self, MonthlyCount, RiskLevel, Trend, fill_months, finite, rate, risk_level, round2,
};
use super::queries::{
    self, CompanyPerformanceRow, GroupOutcomeRow, LabelCountRow, MonthCountRow,
    PlacementGroupRow, PlacementSummaryRow, StatusOverviewRow,
};
use super::{AnalyticsError, ConnectionSource, ReportWindow};

/// Months covered by the placement series.
pub const SERIES_MONTHS: u32 = 12;

const SALARY_RANGE_ORDER: [&str; 5] = [
    "below_100k",
    "100k_200k",
    "200k_300k",
    "300k_plus",
    "unspecified",
];

const QUALIFICATION_ORDER: [&str; 4] = ["ol_and_al", "ol_only", "al_only", "none"];

/// Row sets of the post-analysis batch, in statement order.
#[derive(Debug, Clone)]
pub struct PostAnalysisRows {
    pub status: StatusOverviewRow,
    pub placements: PlacementSummaryRow,
    pub districts: Vec<GroupOutcomeRow>,
    pub companies: Vec<CompanyPerformanceRow>,
    pub industries: Vec<PlacementGroupRow>,
    pub countries: Vec<PlacementGroupRow>,
    pub monthly_placements: Vec<MonthCountRow>,
    pub qualifications: Vec<GroupOutcomeRow>,
    pub salary_ranges: Vec<LabelCountRow>,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct PostAnalysisReport {
    pub overview: PostAnalysisOverview,
    pub district_performance: Vec<DistrictPerformance>,
    pub company_performance: Vec<CompanyPerformance>,
    pub industry_breakdown: Vec<PlacementShare>,
    pub country_distribution: Vec<PlacementShare>,
    pub monthly_placements: Vec<MonthlyCount>,
    pub qualification_outcomes: Vec<QualificationOutcome>,
    pub salary_ranges: Vec<SalaryRange>,
    pub summary: PostAnalysisSummary,
}

/// Raw counts as the database returned them, plus the overall success rate.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct PostAnalysisOverview {
    pub total_students: i64,
    pub employed_students: i64,
    pub active_students: i64,
    pub pending_students: i64,
    pub inactive_students: i64,
    pub total_placements: i64,
    pub placed_students: i64,
    pub average_salary: Option<f64>,
    pub overall_success_rate: f64,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct DistrictPerformance {
    pub district: String,
    pub total_students: i64,
    pub employed_students: i64,
    pub success_rate: f64,
    pub risk_level: RiskLevel,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct CompanyPerformance {
    pub company_id: i32,
    pub company_name: String,
    pub country: String,
    pub industry: Option<String>,
    pub total_placements: i64,
    pub average_salary: Option<f64>,
}

/// Placements under one label and their share of all placements.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct PlacementShare {
    pub name: String,
    pub placements: i64,
    pub average_salary: Option<f64>,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct QualificationOutcome {
    pub qualification: String,
    pub total_students: i64,
    pub employed_students: i64,
    pub success_rate: f64,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct SalaryRange {
    pub range: String,
    pub count: i64,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PostAnalysisSummary {
    /// Change of the last three months' placements over the three before.
    /// `null` when the earlier window had none.
    pub placement_growth_rate: Option<f64>,
    pub placement_trend: Trend,
    pub best_district: Option<String>,
    pub weakest_district: Option<String>,
    pub high_risk_districts: Vec<String>,
}

/// Runs the post-analysis batch.
pub async fn fetch<S: ConnectionSource>(
    source: &S,
    window: &ReportWindow,
) -> Result<PostAnalysisRows, AnalyticsError> {
    let since = window.month_start(SERIES_MONTHS - 1);

    let (
        status,
        placements,
        districts,
        companies,
        industries,
        countries,
        monthly_placements,
        qualifications,
        salary_ranges,
    ) = tokio::try_join!(
        source.run_statement("status_overview", queries::status_overview),
        source.run_statement("placement_summary", queries::placement_summary),
        source.run_statement("district_performance", queries::district_performance),
        source.run_statement("company_performance", queries::company_performance),
        source.run_statement("industry_breakdown", queries::industry_breakdown),
        source.run_statement("country_distribution", queries::country_distribution),
        source.run_statement("monthly_placements", move |c| {
            queries::monthly_placements(c, since)
        }),
        source.run_statement("qualification_outcomes", queries::qualification_outcomes),
        source.run_statement("salary_ranges", queries::salary_ranges),
    )?;

    Ok(PostAnalysisRows {
        status,
        placements,
        districts,
        companies,
        industries,
        countries,
        monthly_placements,
        qualifications,
        salary_ranges,
    })
}

/// Fetches and derives the report.
pub async fn generate<S: ConnectionSource>(
    source: &S,
    window: &ReportWindow,
) -> Result<PostAnalysisReport, AnalyticsError> {
    let rows = fetch(source, window).await?;
    Ok(build(rows, window))
}

fn shares(rows: Vec<PlacementGroupRow>) -> Vec<PlacementShare> {
    let total: i64 = rows.iter().map(|r| r.placements).sum();
    rows.into_iter()
        .map(|row| PlacementShare {
            percentage: rate(row.placements, total),
            average_salary: row.average_salary.map(round2),
            placements: row.placements,
            name: row.label,
        })
        .collect()
}

fn rank(order: &[&str], label: &str) -> usize {
    order.iter().position(|l| *l == label).unwrap_or(order.len())
}

/// Derives the report from fetched rows. Pure.
pub fn build(rows: PostAnalysisRows, window: &ReportWindow) -> PostAnalysisReport {
    let status = rows.status;
    let overview = PostAnalysisOverview {
        total_students: status.total_students,
        employed_students: status.employed_students,
        active_students: status.active_students,
        pending_students: status.pending_students,
        inactive_students: status.inactive_students,
        total_placements: rows.placements.total_placements,
        placed_students: rows.placements.placed_students,
        average_salary: rows.placements.average_salary.map(round2),
        overall_success_rate: rate(status.employed_students, status.total_students),
    };

    let district_performance: Vec<DistrictPerformance> = rows
        .districts
        .into_iter()
        .map(|row| {
            let success_rate = rate(row.employed_students, row.total_students);
            DistrictPerformance {
                district: row.label,
                total_students: row.total_students,
                employed_students: row.employed_students,
                success_rate,
                risk_level: risk_level(success_rate),
            }
        })
        .collect();

    let company_performance = rows
        .companies
        .into_iter()
        .map(|row| CompanyPerformance {
            company_id: row.company_id,
            company_name: row.company_name,
            country: row.country,
            industry: row.industry,
            total_placements: row.total_placements,
            average_salary: row.average_salary.map(round2),
        })
        .collect();

    let mut qualifications = rows.qualifications;
    qualifications.sort_by_key(|row| rank(&QUALIFICATION_ORDER, &row.label));
    let qualification_outcomes = qualifications
        .into_iter()
        .map(|row| QualificationOutcome {
            success_rate: rate(row.employed_students, row.total_students),
            qualification: row.label,
            total_students: row.total_students,
            employed_students: row.employed_students,
        })
        .collect();

    let mut salaries = rows.salary_ranges;
    metrics::sort_by_label_order(&mut salaries, &SALARY_RANGE_ORDER);
    let salary_total: i64 = salaries.iter().map(|r| r.count).sum();
    let salary_ranges = salaries
        .into_iter()
        .map(|row| SalaryRange {
            percentage: rate(row.count, salary_total),
            range: row.label,
            count: row.count,
        })
        .collect();

    let monthly_placements = fill_months(
        &window.month_keys(SERIES_MONTHS),
        &rows.monthly_placements,
    );
    let summary = summarize(&district_performance, &monthly_placements);

    PostAnalysisReport {
        overview,
        district_performance,
        company_performance,
        industry_breakdown: shares(rows.industries),
        country_distribution: shares(rows.countries),
        monthly_placements,
        qualification_outcomes,
        salary_ranges,
        summary,
    }
}

fn summarize(districts: &[DistrictPerformance], monthly: &[MonthlyCount]) -> PostAnalysisSummary {
    let trend = metrics::window_trend(&metrics::counts(monthly));

    // First of equals wins; districts arrive largest first.
    let best = districts.iter().fold(None::<&DistrictPerformance>, |best, d| match best {
        Some(b) if b.success_rate >= d.success_rate => Some(b),
        _ => Some(d),
    });
    let weakest = districts.iter().fold(None::<&DistrictPerformance>, |worst, d| match worst {
        Some(w) if w.success_rate <= d.success_rate => Some(w),
        _ => Some(d),
    });

    PostAnalysisSummary {
        placement_growth_rate: trend.and_then(|t| finite(t.change)),
        placement_trend: trend.map(|t| t.trend).unwrap_or(Trend::Stable),
        best_district: best.map(|d| d.district.clone()),
        weakest_district: weakest.map(|d| d.district.clone()),
        high_risk_districts: districts
            .iter()
            .filter(|d| d.risk_level == RiskLevel::High)
            .map(|d| d.district.clone())
            .collect(),
    }
}
