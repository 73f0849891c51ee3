//! Spend / revenue / profit reduction and daily series.

use std::collections::HashMap;

use campaign_core::{AggregateMetrics, Record};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::window::DateRange;

/// Sum a record set. ROI and ROAS are undefined when spend is zero.
pub fn aggregate<'a, I>(records: I) -> AggregateMetrics
where
    I: IntoIterator<Item = &'a Record>,
{
    records.into_iter().sum()
}

/// One calendar day of totals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub profit: f64,
    pub spend: f64,
    pub revenue: f64,
}

impl DailyPoint {
    fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            profit: 0.0,
            spend: 0.0,
            revenue: 0.0,
        }
    }
}

/// One point per day of `range`, chronological. Days without records are
/// zero-filled; records outside the range are ignored.
pub fn daily_series<'a, I>(records: I, range: DateRange) -> Vec<DailyPoint>
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut by_day: HashMap<NaiveDate, DailyPoint> = HashMap::new();
    for record in records {
        if !range.contains(record.date) {
            continue;
        }
        let point = by_day
            .entry(record.date)
            .or_insert_with(|| DailyPoint::empty(record.date));
        point.profit += record.profit;
        point.spend += record.spend;
        point.revenue += record.revenue;
    }

    range
        .dates()
        .map(|date| by_day.remove(&date).unwrap_or_else(|| DailyPoint::empty(date)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(day: u32, spend: f64, revenue: f64) -> Record {
        Record {
            date: NaiveDate::from_ymd_opt(2025, 2, day).unwrap(),
            buyer: "kim".into(),
            network: "N".into(),
            offer: "O".into(),
            account: "A1".into(),
            spend,
            revenue,
            profit: revenue - spend,
        }
    }

    #[test]
    fn test_aggregate_sums_and_ratios() {
        let records = vec![rec(1, 100.0, 150.0), rec(2, 300.0, 250.0)];
        let m = aggregate(&records);
        assert!((m.spend - 400.0).abs() < f64::EPSILON);
        assert!((m.revenue - 400.0).abs() < f64::EPSILON);
        assert!((m.profit - 0.0).abs() < f64::EPSILON);
        assert_eq!(m.roi, Some(0.0));
        assert_eq!(m.roas, Some(1.0));
    }

    #[test]
    fn test_empty_aggregate_is_zero_with_undefined_ratios() {
        let records: Vec<Record> = Vec::new();
        let m = aggregate(&records);
        assert_eq!(m.spend, 0.0);
        assert_eq!(m.profit, 0.0);
        assert!(m.roi.is_none());
        assert!(m.roas.is_none());
        assert!(m.is_idle());
    }

    #[test]
    fn test_aggregate_is_additive_over_disjoint_sets() {
        let a = vec![rec(1, 10.25, 20.5), rec(2, 33.0, 12.0)];
        let b = vec![rec(3, 7.75, 0.0), rec(4, 0.0, 9.0), rec(5, 120.0, 300.0)];
        let union: Vec<Record> = a.iter().chain(b.iter()).cloned().collect();

        let whole = aggregate(&union);
        let parts = aggregate(&a) + aggregate(&b);
        assert!((whole.spend - parts.spend).abs() < 1e-9);
        assert!((whole.revenue - parts.revenue).abs() < 1e-9);
        assert!((whole.profit - parts.profit).abs() < 1e-9);
        assert!((whole.roi.unwrap() - parts.roi.unwrap()).abs() < 1e-9);
    }

    #[test]
    fn test_daily_series_zero_fills_and_orders() {
        let records = vec![
            rec(5, 10.0, 30.0),
            rec(3, 5.0, 5.0),
            rec(5, 1.0, 0.0),
            rec(9, 99.0, 0.0),
        ];
        let range = DateRange::new(
            NaiveDate::from_ymd_opt(2025, 2, 2).unwrap(),
            NaiveDate::from_ymd_opt(2025, 2, 8).unwrap(),
        );
        let series = daily_series(&records, range);
        assert_eq!(series.len(), 7);
        assert_eq!(series[0].date, range.start);
        assert_eq!(series[0].profit, 0.0);
        assert_eq!(series[1].spend, 5.0);
        assert_eq!(series[3].spend, 11.0);
        assert_eq!(series[3].profit, 19.0);
        assert_eq!(series[6].date, range.end);
        assert_eq!(series.iter().map(|p| p.spend).sum::<f64>(), 16.0);
    }
}
