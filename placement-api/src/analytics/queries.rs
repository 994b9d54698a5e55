//! The fixed aggregate statements behind the analytics reports.
//!
//! Every statement is a plain function over a connection so the batch
//! executor can ship it to whichever connection it checks out. Window
//! boundaries are bound as parameters, never formatted into the SQL.

use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Date, Double, Integer, Nullable, Text, Timestamp};

const EMPLOYED: &str = "SUM(CASE WHEN status = 'employed' THEN 1 ELSE 0 END)";

/// Student counts per lifecycle status.
#[derive(Debug, Clone, PartialEq, Eq, QueryableByName)]
pub struct StatusOverviewRow {
    #[diesel(sql_type = BigInt)]
    pub total_students: i64,
    #[diesel(sql_type = BigInt)]
    pub employed_students: i64,
    #[diesel(sql_type = BigInt)]
    pub active_students: i64,
    #[diesel(sql_type = BigInt)]
    pub pending_students: i64,
    #[diesel(sql_type = BigInt)]
    pub inactive_students: i64,
}

#[derive(Debug, Clone, PartialEq, QueryableByName)]
pub struct PlacementSummaryRow {
    #[diesel(sql_type = BigInt)]
    pub total_placements: i64,
    #[diesel(sql_type = BigInt)]
    pub placed_students: i64,
    #[diesel(sql_type = Nullable<Double>)]
    pub average_salary: Option<f64>,
}

/// Students and employed students for one group (district, qualification).
#[derive(Debug, Clone, PartialEq, Eq, QueryableByName)]
pub struct GroupOutcomeRow {
    #[diesel(sql_type = Text)]
    pub label: String,
    #[diesel(sql_type = BigInt)]
    pub total_students: i64,
    #[diesel(sql_type = BigInt)]
    pub employed_students: i64,
}

#[derive(Debug, Clone, PartialEq, QueryableByName)]
pub struct CompanyPerformanceRow {
    #[diesel(sql_type = Integer)]
    pub company_id: i32,
    #[diesel(sql_type = Text)]
    pub company_name: String,
    #[diesel(sql_type = Text)]
    pub country: String,
    #[diesel(sql_type = Nullable<Text>)]
    pub industry: Option<String>,
    #[diesel(sql_type = BigInt)]
    pub total_placements: i64,
    #[diesel(sql_type = Nullable<Double>)]
    pub average_salary: Option<f64>,
}

/// Placement count and mean salary for one label (industry, country).
#[derive(Debug, Clone, PartialEq, QueryableByName)]
pub struct PlacementGroupRow {
    #[diesel(sql_type = Text)]
    pub label: String,
    #[diesel(sql_type = BigInt)]
    pub placements: i64,
    #[diesel(sql_type = Nullable<Double>)]
    pub average_salary: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, QueryableByName)]
pub struct LabelCountRow {
    #[diesel(sql_type = Text)]
    pub label: String,
    #[diesel(sql_type = BigInt)]
    pub count: i64,
}

/// Count for one `YYYY-MM` bucket. Months with no rows are absent.
#[derive(Debug, Clone, PartialEq, Eq, QueryableByName)]
pub struct MonthCountRow {
    #[diesel(sql_type = Nullable<Text>)]
    pub month: Option<String>,
    #[diesel(sql_type = BigInt)]
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, QueryableByName)]
pub struct CountRow {
    #[diesel(sql_type = BigInt)]
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, QueryableByName)]
pub struct RegistrationOverviewRow {
    #[diesel(sql_type = BigInt)]
    pub total_students: i64,
    #[diesel(sql_type = BigInt)]
    pub new_this_month: i64,
    #[diesel(sql_type = BigInt)]
    pub new_last_month: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, QueryableByName)]
pub struct DistrictRow {
    #[diesel(sql_type = Text)]
    pub district: String,
    #[diesel(sql_type = Text)]
    pub province: String,
    #[diesel(sql_type = BigInt)]
    pub students: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, QueryableByName)]
pub struct QualificationRow {
    #[diesel(sql_type = BigInt)]
    pub total_students: i64,
    #[diesel(sql_type = BigInt)]
    pub with_ol: i64,
    #[diesel(sql_type = BigInt)]
    pub with_al: i64,
    #[diesel(sql_type = BigInt)]
    pub with_both: i64,
    #[diesel(sql_type = BigInt)]
    pub with_neither: i64,
}

/// A label with its total over a window and the number of distinct months
/// that contributed rows.
#[derive(Debug, Clone, PartialEq, Eq, QueryableByName)]
pub struct LabelHistoryRow {
    #[diesel(sql_type = Text)]
    pub label: String,
    #[diesel(sql_type = BigInt)]
    pub total: i64,
    #[diesel(sql_type = BigInt)]
    pub active_months: i64,
}

pub fn status_overview(conn: &mut SqliteConnection) -> QueryResult<StatusOverviewRow> {
    diesel::sql_query(format!(
        "SELECT COUNT(*) AS total_students, \
                COALESCE({EMPLOYED}, 0) AS employed_students, \
                COALESCE(SUM(CASE WHEN status = 'active' THEN 1 ELSE 0 END), 0) AS active_students, \
                COALESCE(SUM(CASE WHEN status = 'pending' THEN 1 ELSE 0 END), 0) AS pending_students, \
                COALESCE(SUM(CASE WHEN status = 'inactive' THEN 1 ELSE 0 END), 0) AS inactive_students \
         FROM students"
    ))
    .get_result(conn)
}

pub fn placement_summary(conn: &mut SqliteConnection) -> QueryResult<PlacementSummaryRow> {
    diesel::sql_query(
        "SELECT COUNT(*) AS total_placements, \
                COUNT(DISTINCT student_id) AS placed_students, \
                AVG(salary) AS average_salary \
         FROM placements",
    )
    .get_result(conn)
}

/// Students and employed students per district, largest districts first.
pub fn district_performance(conn: &mut SqliteConnection) -> QueryResult<Vec<GroupOutcomeRow>> {
    diesel::sql_query(format!(
        "SELECT district AS label, COUNT(*) AS total_students, \
                COALESCE({EMPLOYED}, 0) AS employed_students \
         FROM students \
         GROUP BY district \
         ORDER BY total_students DESC, district ASC"
    ))
    .load(conn)
}

/// Every company with its placement count, including companies with none.
pub fn company_performance(conn: &mut SqliteConnection) -> QueryResult<Vec<CompanyPerformanceRow>> {
    diesel::sql_query(
        "SELECT c.id AS company_id, c.name AS company_name, c.country AS country, \
                c.industry AS industry, COUNT(p.id) AS total_placements, \
                AVG(p.salary) AS average_salary \
         FROM companies c \
         LEFT JOIN placements p ON p.company_id = c.id \
         GROUP BY c.id \
         ORDER BY total_placements DESC, c.name ASC",
    )
    .load(conn)
}

pub fn industry_breakdown(conn: &mut SqliteConnection) -> QueryResult<Vec<PlacementGroupRow>> {
    diesel::sql_query(
        "SELECT COALESCE(c.industry, 'Unspecified') AS label, COUNT(*) AS placements, \
                AVG(p.salary) AS average_salary \
         FROM placements p \
         JOIN companies c ON c.id = p.company_id \
         GROUP BY COALESCE(c.industry, 'Unspecified') \
         ORDER BY placements DESC, label ASC",
    )
    .load(conn)
}

pub fn country_distribution(conn: &mut SqliteConnection) -> QueryResult<Vec<PlacementGroupRow>> {
    diesel::sql_query(
        "SELECT c.country AS label, COUNT(*) AS placements, AVG(p.salary) AS average_salary \
         FROM placements p \
         JOIN companies c ON c.id = p.company_id \
         GROUP BY c.country \
         ORDER BY placements DESC, label ASC",
    )
    .load(conn)
}

/// Placements per start month, from `since` onwards.
pub fn monthly_placements(
    conn: &mut SqliteConnection,
    since: NaiveDate,
) -> QueryResult<Vec<MonthCountRow>> {
    diesel::sql_query(
        "SELECT strftime('%Y-%m', start_date) AS month, COUNT(*) AS count \
         FROM placements \
         WHERE start_date >= ? \
         GROUP BY month \
         ORDER BY month",
    )
    .bind::<Date, _>(since)
    .load(conn)
}

/// Outcomes grouped by school qualification: `ol_and_al`, `ol_only`,
/// `al_only`, `none`.
pub fn qualification_outcomes(conn: &mut SqliteConnection) -> QueryResult<Vec<GroupOutcomeRow>> {
    diesel::sql_query(format!(
        "SELECT CASE \
                    WHEN has_ol AND has_al THEN 'ol_and_al' \
                    WHEN has_ol THEN 'ol_only' \
                    WHEN has_al THEN 'al_only' \
                    ELSE 'none' \
                END AS label, \
                COUNT(*) AS total_students, \
                COALESCE({EMPLOYED}, 0) AS employed_students \
         FROM students \
         GROUP BY label"
    ))
    .load(conn)
}

pub fn salary_ranges(conn: &mut SqliteConnection) -> QueryResult<Vec<LabelCountRow>> {
    diesel::sql_query(
        "SELECT CASE \
                    WHEN salary IS NULL THEN 'unspecified' \
                    WHEN salary < 100000 THEN 'below_100k' \
                    WHEN salary < 200000 THEN '100k_200k' \
                    WHEN salary < 300000 THEN '200k_300k' \
                    ELSE '300k_plus' \
                END AS label, \
                COUNT(*) AS count \
         FROM placements \
         GROUP BY label",
    )
    .load(conn)
}

/// Totals plus registrations in the current and the previous month.
pub fn registration_overview(
    conn: &mut SqliteConnection,
    this_month: NaiveDateTime,
    last_month: NaiveDateTime,
) -> QueryResult<RegistrationOverviewRow> {
    diesel::sql_query(
        "SELECT COUNT(*) AS total_students, \
                COALESCE(SUM(CASE WHEN created_at >= ? THEN 1 ELSE 0 END), 0) AS new_this_month, \
                COALESCE(SUM(CASE WHEN created_at >= ? AND created_at < ? THEN 1 ELSE 0 END), 0) \
                    AS new_last_month \
         FROM students",
    )
    .bind::<Timestamp, _>(this_month)
    .bind::<Timestamp, _>(last_month)
    .bind::<Timestamp, _>(this_month)
    .get_result(conn)
}

/// Registrations per month, from `since` onwards.
pub fn monthly_registrations(
    conn: &mut SqliteConnection,
    since: NaiveDateTime,
) -> QueryResult<Vec<MonthCountRow>> {
    diesel::sql_query(
        "SELECT strftime('%Y-%m', created_at) AS month, COUNT(*) AS count \
         FROM students \
         WHERE created_at >= ? \
         GROUP BY month \
         ORDER BY month",
    )
    .bind::<Timestamp, _>(since)
    .load(conn)
}

pub fn status_distribution(conn: &mut SqliteConnection) -> QueryResult<Vec<LabelCountRow>> {
    diesel::sql_query(
        "SELECT status AS label, COUNT(*) AS count \
         FROM students \
         GROUP BY status \
         ORDER BY count DESC, label ASC",
    )
    .load(conn)
}

/// Employment as recorded on the student row.
pub fn employed_by_status(conn: &mut SqliteConnection) -> QueryResult<CountRow> {
    diesel::sql_query("SELECT COUNT(*) AS count FROM students WHERE status = 'employed'")
        .get_result(conn)
}

/// Employment as evidenced by placement rows.
pub fn employed_by_placements(conn: &mut SqliteConnection) -> QueryResult<CountRow> {
    diesel::sql_query("SELECT COUNT(DISTINCT student_id) AS count FROM placements")
        .get_result(conn)
}

pub fn district_distribution(conn: &mut SqliteConnection) -> QueryResult<Vec<DistrictRow>> {
    diesel::sql_query(
        "SELECT district, province, COUNT(*) AS students \
         FROM students \
         GROUP BY district, province \
         ORDER BY students DESC, district ASC",
    )
    .load(conn)
}

pub fn province_distribution(conn: &mut SqliteConnection) -> QueryResult<Vec<LabelCountRow>> {
    diesel::sql_query(
        "SELECT province AS label, COUNT(*) AS count \
         FROM students \
         GROUP BY province \
         ORDER BY count DESC, label ASC",
    )
    .load(conn)
}

pub fn qualifications(conn: &mut SqliteConnection) -> QueryResult<QualificationRow> {
    diesel::sql_query(
        "SELECT COUNT(*) AS total_students, \
                COALESCE(SUM(CASE WHEN has_ol THEN 1 ELSE 0 END), 0) AS with_ol, \
                COALESCE(SUM(CASE WHEN has_al THEN 1 ELSE 0 END), 0) AS with_al, \
                COALESCE(SUM(CASE WHEN has_ol AND has_al THEN 1 ELSE 0 END), 0) AS with_both, \
                COALESCE(SUM(CASE WHEN NOT has_ol AND NOT has_al THEN 1 ELSE 0 END), 0) \
                    AS with_neither \
         FROM students",
    )
    .get_result(conn)
}

pub fn sex_distribution(conn: &mut SqliteConnection) -> QueryResult<Vec<LabelCountRow>> {
    diesel::sql_query(
        "SELECT LOWER(sex) AS label, COUNT(*) AS count \
         FROM students \
         GROUP BY LOWER(sex) \
         ORDER BY count DESC, label ASC",
    )
    .load(conn)
}

pub fn marital_status_distribution(conn: &mut SqliteConnection) -> QueryResult<Vec<LabelCountRow>> {
    diesel::sql_query(
        "SELECT LOWER(marital_status) AS label, COUNT(*) AS count \
         FROM students \
         GROUP BY LOWER(marital_status) \
         ORDER BY count DESC, label ASC",
    )
    .load(conn)
}

/// Students per age bracket as of `today`. Missing birth dates land in
/// `unknown`.
pub fn age_groups(conn: &mut SqliteConnection, today: NaiveDate) -> QueryResult<Vec<LabelCountRow>> {
    diesel::sql_query(
        "SELECT CASE \
                    WHEN age IS NULL THEN 'unknown' \
                    WHEN age < 18 THEN 'under_18' \
                    WHEN age < 23 THEN '18_22' \
                    WHEN age < 28 THEN '23_27' \
                    WHEN age < 33 THEN '28_32' \
                    ELSE '33_plus' \
                END AS label, \
                COUNT(*) AS count \
         FROM (SELECT (julianday(?) - julianday(date_of_birth)) / 365.25 AS age FROM students) \
         GROUP BY label",
    )
    .bind::<Date, _>(today)
    .load(conn)
}

/// Registrations per province since `since`.
pub fn province_registrations(
    conn: &mut SqliteConnection,
    since: NaiveDateTime,
) -> QueryResult<Vec<LabelHistoryRow>> {
    diesel::sql_query(
        "SELECT province AS label, COUNT(*) AS total, \
                COUNT(DISTINCT strftime('%Y-%m', created_at)) AS active_months \
         FROM students \
         WHERE created_at >= ? \
         GROUP BY province \
         ORDER BY total DESC, label ASC",
    )
    .bind::<Timestamp, _>(since)
    .load(conn)
}

/// Placements per company industry since `since`, by start date.
pub fn industry_placements(
    conn: &mut SqliteConnection,
    since: NaiveDate,
) -> QueryResult<Vec<LabelHistoryRow>> {
    diesel::sql_query(
        "SELECT COALESCE(c.industry, 'Unspecified') AS label, COUNT(*) AS total, \
                COUNT(DISTINCT strftime('%Y-%m', p.start_date)) AS active_months \
         FROM placements p \
         JOIN companies c ON c.id = p.company_id \
         WHERE p.start_date >= ? \
         GROUP BY COALESCE(c.industry, 'Unspecified') \
         ORDER BY total DESC, label ASC",
    )
    .bind::<Date, _>(since)
    .load(conn)
}
