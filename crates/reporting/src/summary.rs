//! Window performance summaries: totals and per-group current vs previous
//! period comparisons.

use campaign_core::{AggregateMetrics, Cap};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::aggregate::{aggregate, daily_series, DailyPoint};
use crate::highlight::week_range;
use crate::index::{filter, group_by, CompositeKey, GroupBy, RecordIndex};
use crate::trend::{classify, classify_tiered, delta, Delta, TieredTrend, Trend};
use crate::window::{DateRange, DateWindow};

#[derive(Debug, Clone, Serialize)]
pub struct GroupSummary {
    pub key: CompositeKey,
    pub current: AggregateMetrics,
    pub previous: AggregateMetrics,
    pub profit_delta: Delta,
    pub trend: Trend,
    pub tiered_trend: TieredTrend,
    /// Trailing seven days ending at the anchor, independent of the window.
    pub week_series: Vec<DailyPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cap: Option<Cap>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WindowSummary {
    pub window: String,
    pub group_by: GroupBy,
    pub anchor: Option<NaiveDate>,
    pub range: Option<DateRange>,
    pub previous_range: Option<DateRange>,
    pub totals: AggregateMetrics,
    pub previous_totals: AggregateMetrics,
    pub trend: Trend,
    pub groups: Vec<GroupSummary>,
}

impl WindowSummary {
    fn empty(window: DateWindow, view: GroupBy) -> Self {
        Self {
            window: window.to_string(),
            group_by: view,
            anchor: None,
            range: None,
            previous_range: None,
            totals: AggregateMetrics::zero(),
            previous_totals: AggregateMetrics::zero(),
            trend: classify(0.0, 0.0),
            groups: Vec::new(),
        }
    }

    /// Attach display caps to groups that carry a network and offer.
    pub fn attach_caps<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<Cap>,
    {
        for group in &mut self.groups {
            group.cap = group.key.cap_key().and_then(|key| lookup(&key));
        }
    }
}

/// Summarize `window` at the batch anchor, grouped by `view`.
///
/// Groups with records in either the current or previous period are listed,
/// highest current profit first.
pub fn summarize(index: &RecordIndex, window: DateWindow, view: GroupBy) -> WindowSummary {
    let Some(anchor) = index.anchor() else {
        return WindowSummary::empty(window, view);
    };

    let current = window.resolve(anchor);
    let previous = current.previous();
    let week = week_range(anchor);

    let current_records = index.in_range(current);
    let previous_records = index.in_range(previous);
    let totals = aggregate(current_records.iter().copied());
    let previous_totals = aggregate(previous_records.iter().copied());

    let span_start = previous.start.min(week.start);
    let span = index.in_range(DateRange::new(span_start, anchor));

    let mut groups: Vec<GroupSummary> = group_by(span, |r| view.key(r))
        .into_iter()
        .filter_map(|(key, records)| {
            let cur = filter(records.iter().copied(), |r| current.contains(r.date));
            let prev = filter(records.iter().copied(), |r| previous.contains(r.date));
            if cur.is_empty() && prev.is_empty() {
                return None;
            }
            let cur_agg = aggregate(cur);
            let prev_agg = aggregate(prev);
            Some(GroupSummary {
                key,
                current: cur_agg,
                previous: prev_agg,
                profit_delta: delta(cur_agg.profit, prev_agg.profit),
                trend: classify(cur_agg.profit, prev_agg.profit),
                tiered_trend: classify_tiered(cur_agg.profit, prev_agg.profit),
                week_series: daily_series(records.iter().copied(), week),
                cap: None,
            })
        })
        .collect();

    groups.sort_by(|a, b| {
        b.current
            .profit
            .total_cmp(&a.current.profit)
            .then_with(|| a.key.cmp(&b.key))
    });

    debug!(
        window = %window,
        view = ?view,
        groups = groups.len(),
        "Window summary computed"
    );

    WindowSummary {
        window: window.to_string(),
        group_by: view,
        anchor: Some(anchor),
        range: Some(current),
        previous_range: Some(previous),
        totals,
        previous_totals,
        trend: classify(totals.profit, previous_totals.profit),
        groups,
    }
}
