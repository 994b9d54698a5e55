//! Pre-analysis: who is registering. Registration volume over time and the
//! make-up of the student body.

use serde::Serialize;
use ts_rs::TS;

use super::metrics::{
    LabelShare, MonthlyCount, fill_months, finite, label_shares, percentage_change, rate,
    sort_by_label_order,
};
use super::queries::{
    self, CountRow, DistrictRow, LabelCountRow, MonthCountRow, QualificationRow,
    RegistrationOverviewRow,
};
use super::{AnalyticsError, ConnectionSource, ReportWindow};

pub const SERIES_MONTHS: u32 = 12;

const AGE_GROUP_ORDER: [&str; 6] = ["under_18", "18_22", "23_27", "28_32", "33_plus", "unknown"];

#[derive(Debug, Clone)]
pub struct PreAnalysisRows {
    pub overview: RegistrationOverviewRow,
    pub monthly_registrations: Vec<MonthCountRow>,
    pub statuses: Vec<LabelCountRow>,
    pub employed_by_status: CountRow,
    pub employed_by_placements: CountRow,
    pub districts: Vec<DistrictRow>,
    pub provinces: Vec<LabelCountRow>,
    pub qualifications: QualificationRow,
    pub sex: Vec<LabelCountRow>,
    pub marital_status: Vec<LabelCountRow>,
    pub age_groups: Vec<LabelCountRow>,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct PreAnalysisReport {
    pub registration_overview: RegistrationOverview,
    pub monthly_registrations: Vec<MonthlyCount>,
    pub status_distribution: Vec<LabelShare>,
    pub employment_signals: EmploymentSignals,
    pub district_distribution: Vec<DistrictDistribution>,
    pub province_distribution: Vec<LabelShare>,
    pub qualifications: Qualifications,
    pub demographics: Demographics,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct RegistrationOverview {
    pub total_students: i64,
    pub new_this_month: i64,
    pub new_last_month: i64,
    /// `null` when last month had no registrations.
    pub month_over_month_change: Option<f64>,
}

/// The two independent ways employment is recorded. They are reported side
/// by side and may disagree.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct EmploymentSignals {
    pub employed_by_status: i64,
    pub employed_by_placements: i64,
    /// `employed_by_status - employed_by_placements`.
    pub discrepancy: i64,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct DistrictDistribution {
    pub district: String,
    pub province: String,
    pub students: i64,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct Qualifications {
    pub total_students: i64,
    pub with_ol: i64,
    pub with_al: i64,
    pub with_both: i64,
    pub with_neither: i64,
    pub ol_rate: f64,
    pub al_rate: f64,
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct Demographics {
    pub sex: Vec<LabelShare>,
    pub marital_status: Vec<LabelShare>,
    pub age_groups: Vec<LabelShare>,
}

/// Runs the pre-analysis batch.
pub async fn fetch<S: ConnectionSource>(
    source: &S,
    window: &ReportWindow,
) -> Result<PreAnalysisRows, AnalyticsError> {
    let this_month = window.month_start_timestamp(0);
    let last_month = window.month_start_timestamp(1);
    let since = window.month_start_timestamp(SERIES_MONTHS - 1);
    let today = window.today();

    let (
        overview,
        monthly_registrations,
        statuses,
        employed_by_status,
        employed_by_placements,
        districts,
        provinces,
        qualifications,
        sex,
        marital_status,
        age_groups,
    ) = tokio::try_join!(
        source.run_statement("registration_overview", move |c| {
            queries::registration_overview(c, this_month, last_month)
        }),
        source.run_statement("monthly_registrations", move |c| {
            queries::monthly_registrations(c, since)
        }),
        source.run_statement("status_distribution", queries::status_distribution),
        source.run_statement("employed_by_status", queries::employed_by_status),
        source.run_statement("employed_by_placements", queries::employed_by_placements),
        source.run_statement("district_distribution", queries::district_distribution),
        source.run_statement("province_distribution", queries::province_distribution),
        source.run_statement("qualifications", queries::qualifications),
        source.run_statement("sex_distribution", queries::sex_distribution),
        source.run_statement("marital_status_distribution", queries::marital_status_distribution),
        source.run_statement("age_groups", move |c| queries::age_groups(c, today)),
    )?;

    Ok(PreAnalysisRows {
        overview,
        monthly_registrations,
        statuses,
        employed_by_status,
        employed_by_placements,
        districts,
        provinces,
        qualifications,
        sex,
        marital_status,
        age_groups,
    })
}

pub async fn generate<S: ConnectionSource>(
    source: &S,
    window: &ReportWindow,
) -> Result<PreAnalysisReport, AnalyticsError> {
    let rows = fetch(source, window).await?;
    Ok(build(rows, window))
}

/// Derives the report from fetched rows. Pure.
pub fn build(rows: PreAnalysisRows, window: &ReportWindow) -> PreAnalysisReport {
    let overview = rows.overview;
    let registration_overview = RegistrationOverview {
        total_students: overview.total_students,
        new_this_month: overview.new_this_month,
        new_last_month: overview.new_last_month,
        month_over_month_change: finite(percentage_change(
            overview.new_last_month as f64,
            overview.new_this_month as f64,
        )),
    };

    let employed_by_status = rows.employed_by_status.count;
    let employed_by_placements = rows.employed_by_placements.count;

    let district_total: i64 = rows.districts.iter().map(|d| d.students).sum();
    let district_distribution = rows
        .districts
        .into_iter()
        .map(|row| DistrictDistribution {
            percentage: rate(row.students, district_total),
            district: row.district,
            province: row.province,
            students: row.students,
        })
        .collect();

    let q = rows.qualifications;
    let qualifications = Qualifications {
        ol_rate: rate(q.with_ol, q.total_students),
        al_rate: rate(q.with_al, q.total_students),
        total_students: q.total_students,
        with_ol: q.with_ol,
        with_al: q.with_al,
        with_both: q.with_both,
        with_neither: q.with_neither,
    };

    let mut age_groups = rows.age_groups;
    sort_by_label_order(&mut age_groups, &AGE_GROUP_ORDER);

    PreAnalysisReport {
        registration_overview,
        monthly_registrations: fill_months(
            &window.month_keys(SERIES_MONTHS),
            &rows.monthly_registrations,
        ),
        status_distribution: label_shares(rows.statuses),
        employment_signals: EmploymentSignals {
            employed_by_status,
            employed_by_placements,
            discrepancy: employed_by_status - employed_by_placements,
        },
        district_distribution,
        province_distribution: label_shares(rows.provinces),
        qualifications,
        demographics: Demographics {
            sex: label_shares(rows.sex),
            marital_status: label_shares(rows.marital_status),
            age_groups: label_shares(age_groups),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StudentStatus;
    use crate::orm::company::insert_company;
    use crate::orm::placement::create_placement;
    use crate::orm::student::{insert_student, set_student_status};
    use crate::orm::testing::{
        sample_company, sample_placement, sample_student, setup_test_db, setup_test_dbconn,
    };
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    fn label(name: &str, count: i64) -> LabelCountRow {
        LabelCountRow {
            label: name.to_string(),
            count,
        }
    }

    fn rows(new_this_month: i64, new_last_month: i64) -> PreAnalysisRows {
        PreAnalysisRows {
            overview: RegistrationOverviewRow {
                total_students: 20,
                new_this_month,
                new_last_month,
            },
            monthly_registrations: vec![],
            statuses: vec![label("pending", 15), label("employed", 5)],
            employed_by_status: CountRow { count: 5 },
            employed_by_placements: CountRow { count: 3 },
            districts: vec![DistrictRow {
                district: "Kandy".to_string(),
                province: "Central".to_string(),
                students: 20,
            }],
            provinces: vec![label("Central", 20)],
            qualifications: QualificationRow {
                total_students: 20,
                with_ol: 18,
                with_al: 7,
                with_both: 6,
                with_neither: 1,
            },
            sex: vec![label("female", 12), label("male", 8)],
            marital_status: vec![label("single", 20)],
            age_groups: vec![label("unknown", 2), label("23_27", 10), label("18_22", 8)],
        }
    }

    fn window() -> ReportWindow {
        ReportWindow::new(at(2025, 6, 15))
    }

    #[test]
    fn test_month_over_month_change() {
        let report = build(rows(6, 4), &window());
        assert_eq!(report.registration_overview.month_over_month_change, Some(50.0));

        let report = build(rows(3, 4), &window());
        assert_eq!(report.registration_overview.month_over_month_change, Some(-25.0));
    }

    #[test]
    fn test_month_over_month_change_from_empty_month_is_null() {
        let report = build(rows(3, 0), &window());
        assert_eq!(report.registration_overview.month_over_month_change, None);

        let json = serde_json::to_value(&report).unwrap();
        assert!(json["registration_overview"]["month_over_month_change"].is_null());

        let report = build(rows(0, 0), &window());
        assert_eq!(report.registration_overview.month_over_month_change, None);
    }

    #[test]
    fn test_build_shares_and_signals() {
        let report = build(rows(1, 1), &window());

        assert_eq!(report.employment_signals.employed_by_status, 5);
        assert_eq!(report.employment_signals.employed_by_placements, 3);
        assert_eq!(report.employment_signals.discrepancy, 2);

        assert_eq!(report.status_distribution[0].percentage, 75.0);
        assert_eq!(report.district_distribution[0].percentage, 100.0);
        assert_eq!(report.qualifications.ol_rate, 90.0);
        assert_eq!(report.qualifications.al_rate, 35.0);
        assert_eq!(report.demographics.sex[1].percentage, 40.0);

        let ages: Vec<&str> = report
            .demographics
            .age_groups
            .iter()
            .map(|a| a.name.as_str())
            .collect();
        assert_eq!(ages, vec!["18_22", "23_27", "unknown"]);
        assert_eq!(report.monthly_registrations.len(), 12);
        assert!(report.monthly_registrations.iter().all(|m| m.count == 0));
    }

    #[test]
    fn test_build_is_idempotent() {
        let first = serde_json::to_string(&build(rows(2, 5), &window())).unwrap();
        let second = serde_json::to_string(&build(rows(2, 5), &window())).unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_generate_against_database() {
        let mut conn = setup_test_db();
        insert_student(&mut conn, sample_student("A", "Kandy"), at(2025, 5, 3)).unwrap();
        insert_student(&mut conn, sample_student("B", "Kandy"), at(2025, 6, 1)).unwrap();
        let c = insert_student(&mut conn, sample_student("C", "Matale"), at(2025, 6, 2)).unwrap();
        let d = insert_student(&mut conn, sample_student("D", "Matale"), at(2025, 6, 3)).unwrap();
        let company = insert_company(&mut conn, sample_company("Busan Ship", "Korea")).unwrap();
        create_placement(&mut conn, sample_placement(c.id, company.id), at(2025, 6, 4)).unwrap();
        set_student_status(&mut conn, d.id, StudentStatus::Employed, at(2025, 6, 4)).unwrap();

        let db = setup_test_dbconn(&mut conn);
        let report = generate(&db, &window()).await.unwrap();

        assert_eq!(report.registration_overview.total_students, 4);
        assert_eq!(report.registration_overview.new_this_month, 3);
        assert_eq!(report.registration_overview.new_last_month, 1);
        assert_eq!(report.registration_overview.month_over_month_change, Some(200.0));
        assert_eq!(report.employment_signals.employed_by_status, 2);
        assert_eq!(report.employment_signals.employed_by_placements, 1);
        assert_eq!(report.employment_signals.discrepancy, 1);
        assert_eq!(report.monthly_registrations[10].month, "2025-05");
        assert_eq!(report.monthly_registrations[10].count, 1);
        assert_eq!(report.monthly_registrations[11].count, 3);
        assert_eq!(report.province_distribution[0].name, "Central");
        assert_eq!(report.demographics.sex[0].name, "female");
    }
}
