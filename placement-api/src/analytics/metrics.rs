//! Metric derivation: pure arithmetic over aggregate rows.
//!
//! Rates are guarded against empty denominators. The trend and
//! month-over-month deltas are not: a zero earlier value gives a non-finite
//! delta, which is reported as `null` through [`finite`].

use serde::Serialize;
use ts_rs::TS;

use super::queries::{LabelCountRow, MonthCountRow};

/// Rounds to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `subset / total * 100`, rounded, or 0 when `total` is 0.
pub fn rate(subset: i64, total: i64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round2(subset as f64 / total as f64 * 100.0)
}

/// Relative change from `earlier` to `recent`, in percent. Unguarded.
pub fn percentage_change(earlier: f64, recent: f64) -> f64 {
    (recent - earlier) / earlier * 100.0
}

/// Rounded value, or `None` for NaN and infinities.
pub fn finite(value: f64) -> Option<f64> {
    value.is_finite().then(|| round2(value))
}

pub fn average(values: &[i64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<i64>() as f64 / values.len() as f64
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Increasing => "increasing",
            Trend::Decreasing => "decreasing",
            Trend::Stable => "stable",
        }
    }
}

/// Strict thresholds at ±5. NaN compares false both ways and is stable.
pub fn classify_trend(change: f64) -> Trend {
    if change > 5.0 {
        Trend::Increasing
    } else if change < -5.0 {
        Trend::Decreasing
    } else {
        Trend::Stable
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub enum RiskLevel {
    #[serde(rename = "High Risk")]
    High,
    #[serde(rename = "Medium Risk")]
    Medium,
    #[serde(rename = "Low Risk")]
    Low,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::High => "High Risk",
            RiskLevel::Medium => "Medium Risk",
            RiskLevel::Low => "Low Risk",
        }
    }
}

pub fn risk_level(success_rate: f64) -> RiskLevel {
    if success_rate < 30.0 {
        RiskLevel::High
    } else if success_rate < 60.0 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Impact {
    High,
    Medium,
    Low,
}

pub fn impact(change: f64) -> Impact {
    let magnitude = change.abs();
    if magnitude > 15.0 {
        Impact::High
    } else if magnitude > 5.0 {
        Impact::Medium
    } else {
        Impact::Low
    }
}

/// Comparison of the three most recent months against the three before.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowTrend {
    pub earlier_average: f64,
    pub recent_average: f64,
    pub change: f64,
    pub trend: Trend,
}

/// Trend over a contiguous, oldest-first monthly series. Needs at least six
/// months; only the last six are used.
///
/// The series ends with the current month, which is still filling up, so
/// early in a month the recent window reads low and the trend leans towards
/// `decreasing`.
pub fn window_trend(series: &[i64]) -> Option<WindowTrend> {
    if series.len() < 6 {
        return None;
    }
    let tail = &series[series.len() - 6..];
    let earlier_average = average(&tail[..3]);
    let recent_average = average(&tail[3..]);
    let change = percentage_change(earlier_average, recent_average);
    Some(WindowTrend {
        earlier_average,
        recent_average,
        change,
        trend: classify_trend(change),
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
pub struct MonthlyCount {
    pub month: String,
    pub count: i64,
}

/// Lays sparse month rows over the full list of month keys, inserting zero
/// counts for months with no rows. Rows outside the keys are dropped.
pub fn fill_months(keys: &[String], rows: &[MonthCountRow]) -> Vec<MonthlyCount> {
    keys.iter()
        .map(|key| MonthlyCount {
            month: key.clone(),
            count: rows
                .iter()
                .filter(|row| row.month.as_deref() == Some(key.as_str()))
                .map(|row| row.count)
                .sum(),
        })
        .collect()
}

pub fn counts(series: &[MonthlyCount]) -> Vec<i64> {
    series.iter().map(|m| m.count).collect()
}

/// A count and its share of the group total.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct LabelShare {
    pub name: String,
    pub count: i64,
    pub percentage: f64,
}

/// Shares of the summed counts, keeping row order.
pub fn label_shares(rows: Vec<LabelCountRow>) -> Vec<LabelShare> {
    let total: i64 = rows.iter().map(|r| r.count).sum();
    rows.into_iter()
        .map(|row| LabelShare {
            percentage: rate(row.count, total),
            name: row.label,
            count: row.count,
        })
        .collect()
}

/// Sorts rows by the position of their label in `order`; unknown labels go
/// last in their original order.
pub fn sort_by_label_order(rows: &mut [LabelCountRow], order: &[&str]) {
    rows.sort_by_key(|row| {
        order
            .iter()
            .position(|l| *l == row.label)
            .unwrap_or(order.len())
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_guards_empty_total() {
        assert_eq!(rate(0, 0), 0.0);
        assert_eq!(rate(5, 0), 0.0);
        assert_eq!(rate(6, 10), 60.0);
        assert_eq!(rate(1, 3), 33.33);
        assert_eq!(rate(2, 3), 66.67);
    }

    #[test]
    fn test_unguarded_change_from_zero_is_not_finite() {
        assert!(percentage_change(0.0, 4.0).is_infinite());
        assert!(percentage_change(0.0, 0.0).is_nan());
        assert_eq!(finite(percentage_change(0.0, 4.0)), None);
        assert_eq!(finite(percentage_change(0.0, 0.0)), None);
        assert_eq!(finite(percentage_change(4.0, 5.0)), Some(25.0));
    }

    #[test]
    fn test_window_trend_from_zero_earlier_window() {
        let trend = window_trend(&[0, 0, 0, 1, 2, 3]).unwrap();
        assert!(trend.change.is_infinite());
        assert_eq!(trend.trend, Trend::Increasing);
        assert_eq!(finite(trend.change), None);

        let flat = window_trend(&[0, 0, 0, 0, 0, 0]).unwrap();
        assert!(flat.change.is_nan());
        assert_eq!(flat.trend, Trend::Stable);
    }

    #[test]
    fn test_trend_boundaries() {
        assert_eq!(classify_trend(5.0), Trend::Stable);
        assert_eq!(classify_trend(5.01), Trend::Increasing);
        assert_eq!(classify_trend(-5.0), Trend::Stable);
        assert_eq!(classify_trend(-5.01), Trend::Decreasing);
    }

    #[test]
    fn test_risk_boundaries() {
        assert_eq!(risk_level(29.99), RiskLevel::High);
        assert_eq!(risk_level(30.0), RiskLevel::Medium);
        assert_eq!(risk_level(59.99), RiskLevel::Medium);
        assert_eq!(risk_level(60.0), RiskLevel::Low);
    }

    #[test]
    fn test_impact_uses_magnitude() {
        assert_eq!(impact(15.01), Impact::High);
        assert_eq!(impact(-20.0), Impact::High);
        assert_eq!(impact(15.0), Impact::Medium);
        assert_eq!(impact(-5.5), Impact::Medium);
        assert_eq!(impact(5.0), Impact::Low);
        assert_eq!(impact(f64::NAN), Impact::Low);
    }

    #[test]
    fn test_window_trend_increasing() {
        let trend = window_trend(&[8, 9, 10, 10, 12, 15]).unwrap();
        assert_eq!(trend.earlier_average, 9.0);
        assert_eq!(round2(trend.recent_average), 12.33);
        assert_eq!(finite(trend.change), Some(37.04));
        assert_eq!(trend.trend, Trend::Increasing);
        assert!(window_trend(&[1, 2, 3]).is_none());
    }

    #[test]
    fn test_fill_months_inserts_zeroes() {
        let keys: Vec<String> = ["2025-01", "2025-02", "2025-03"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let rows = vec![
            MonthCountRow { month: Some("2024-12".to_string()), count: 9 },
            MonthCountRow { month: Some("2025-02".to_string()), count: 4 },
            MonthCountRow { month: None, count: 1 },
        ];

        let filled = fill_months(&keys, &rows);
        assert_eq!(counts(&filled), vec![0, 4, 0]);
        assert_eq!(filled[2].month, "2025-03");
    }

    #[test]
    fn test_label_shares_and_ordering() {
        let mut rows = vec![
            LabelCountRow { label: "unknown".to_string(), count: 1 },
            LabelCountRow { label: "18_22".to_string(), count: 3 },
        ];
        sort_by_label_order(&mut rows, &["18_22", "unknown"]);

        let shares = label_shares(rows);
        assert_eq!(shares[0].name, "18_22");
        assert_eq!(shares[0].percentage, 75.0);
        assert_eq!(shares[1].percentage, 25.0);
        assert!(label_shares(vec![]).is_empty());
    }
}
