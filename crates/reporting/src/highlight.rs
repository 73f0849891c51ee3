//! Daily highlights: classify each group's anchor-day performance against
//! its trailing week into one actionable bucket.

use campaign_core::types::{format_currency, format_multiple, format_percent};
use campaign_core::AggregateMetrics;
use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::aggregate::{aggregate, daily_series, DailyPoint};
use crate::index::{filter, CompositeKey, GroupBy, RecordIndex};
use crate::trend::{classify as classify_trend, Trend};
use crate::window::{DateRange, DateWindow};

/// Days in the comparison week, anchor included.
pub const WEEK_DAYS: f64 = 7.0;

// ─── Types ──────────────────────────────────────────────────────────────────

/// Highlight buckets in priority order. A group lands in the first one whose
/// rule matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum HighlightCategory {
    Performing,
    Potential,
    DecliningProfitable,
    DecliningCritical,
    Inconsistent,
}

impl HighlightCategory {
    pub const ALL: [HighlightCategory; 5] = [
        Self::Performing,
        Self::Potential,
        Self::DecliningProfitable,
        Self::DecliningCritical,
        Self::Inconsistent,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Performing => "Performing",
            Self::Potential => "Potential",
            Self::DecliningProfitable => "Declining (Profitable)",
            Self::DecliningCritical => "Declining (Critical)",
            Self::Inconsistent => "Inconsistent",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Self::Performing => "🏆",
            Self::Potential => "📈",
            Self::DecliningProfitable => "📉",
            Self::DecliningCritical => "🚨",
            Self::Inconsistent => "〰️",
        }
    }
}

/// Derived figures the highlight rules are evaluated on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HighlightInputs {
    pub target_profit: f64,
    pub target_spend: f64,
    pub avg_daily_profit: f64,
    /// Target-day ROI, 0 when the target day had no spend.
    pub target_roi: f64,
    /// Week ROI, 0 when the week had no spend.
    pub avg_roi: f64,
    pub profit_change: f64,
}

impl HighlightInputs {
    pub fn new(week: &AggregateMetrics, target: &AggregateMetrics) -> Self {
        let avg_daily_profit = week.profit / WEEK_DAYS;
        Self {
            target_profit: target.profit,
            target_spend: target.spend,
            avg_daily_profit,
            target_roi: target.roi_or_zero(),
            avg_roi: week.roi_or_zero(),
            profit_change: target.profit - avg_daily_profit,
        }
    }
}

/// First matching highlight rule, or `None` for a group with no target-day
/// spend that matched nothing.
pub fn classify(inputs: &HighlightInputs) -> Option<HighlightCategory> {
    let i = inputs;
    if i.target_profit > 1000.0 && i.avg_daily_profit > 800.0 && i.target_roi > 30.0 {
        Some(HighlightCategory::Performing)
    } else if i.profit_change > 200.0 && i.target_profit > 500.0 && i.target_roi > 20.0 {
        Some(HighlightCategory::Potential)
    } else if i.target_profit > 300.0 && i.profit_change < -200.0 {
        Some(HighlightCategory::DecliningProfitable)
    } else if i.target_profit < 0.0 || (i.target_spend > 500.0 && i.target_roi < 0.0) {
        Some(HighlightCategory::DecliningCritical)
    } else if i.target_spend > 0.0 {
        Some(HighlightCategory::Inconsistent)
    } else {
        None
    }
}

/// Population standard deviation of `values` about `mean`.
pub fn population_std_dev(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HighlightMetric {
    pub label: &'static str,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend: Option<Trend>,
}

/// Aggregates and derived figures behind a highlight.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HighlightSnapshot {
    pub target: AggregateMetrics,
    pub week: AggregateMetrics,
    #[serde(flatten)]
    pub inputs: HighlightInputs,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HighlightItem {
    pub category: HighlightCategory,
    pub icon: &'static str,
    pub subject_key: CompositeKey,
    pub title: String,
    pub description: String,
    pub metrics: Vec<HighlightMetric>,
    pub snapshot: HighlightSnapshot,
    /// Seven chronological points ending at the anchor.
    pub week_series: Vec<DailyPoint>,
    /// Daily profit standard deviation, for inconsistent groups.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volatility: Option<f64>,
}

// ─── Engine ─────────────────────────────────────────────────────────────────

/// Highlights for every group of `view` at the index's anchor date. Empty for
/// an empty batch.
pub fn highlights(index: &RecordIndex, view: GroupBy) -> Vec<HighlightItem> {
    match index.anchor() {
        Some(anchor) => highlights_at(index, view, anchor),
        None => Vec::new(),
    }
}

/// Highlights for every group of `view` with `anchor` as the target day.
pub fn highlights_at(index: &RecordIndex, view: GroupBy, anchor: NaiveDate) -> Vec<HighlightItem> {
    let week = week_range(anchor);
    let groups = index.group_in_range(view, week);

    let mut items: Vec<HighlightItem> = groups
        .into_iter()
        .filter_map(|(key, records)| {
            let week_agg = aggregate(records.iter().copied());
            let target_agg = aggregate(filter(records.iter().copied(), |r| r.date == anchor));
            if week_agg.is_idle() && target_agg.is_idle() {
                return None;
            }

            let inputs = HighlightInputs::new(&week_agg, &target_agg);
            let category = classify(&inputs)?;
            let week_series = daily_series(records.iter().copied(), week);
            Some(build_item(key, category, week_agg, target_agg, inputs, week_series))
        })
        .collect();

    items.sort_by(|a, b| {
        a.category
            .cmp(&b.category)
            .then_with(|| {
                let a_profit = a.snapshot.inputs.target_profit;
                b.snapshot.inputs.target_profit.total_cmp(&a_profit)
            })
            .then_with(|| a.subject_key.cmp(&b.subject_key))
    });

    debug!(
        view = ?view,
        anchor = %anchor,
        items = items.len(),
        "Highlights computed"
    );

    items
}

/// One category's highlights with its presentation pair.
#[derive(Debug, Clone, Serialize)]
pub struct CategorySection {
    pub category: HighlightCategory,
    pub label: &'static str,
    pub icon: &'static str,
    pub items: Vec<HighlightItem>,
}

/// Highlights for one view, sectioned by category in priority order. Every
/// category has a section, possibly empty.
#[derive(Debug, Clone, Serialize)]
pub struct HighlightReport {
    pub anchor: Option<NaiveDate>,
    pub group_by: GroupBy,
    pub sections: Vec<CategorySection>,
}

impl HighlightReport {
    pub fn build(index: &RecordIndex, view: GroupBy) -> Self {
        let mut items = highlights(index, view);
        let sections = HighlightCategory::ALL
            .iter()
            .map(|category| {
                let (members, rest): (Vec<_>, Vec<_>) =
                    items.drain(..).partition(|i| i.category == *category);
                items = rest;
                CategorySection {
                    category: *category,
                    label: category.label(),
                    icon: category.icon(),
                    items: members,
                }
            })
            .collect();

        Self {
            anchor: index.anchor(),
            group_by: view,
            sections,
        }
    }

    pub fn item_count(&self) -> usize {
        self.sections.iter().map(|s| s.items.len()).sum()
    }
}

fn build_item(
    key: CompositeKey,
    category: HighlightCategory,
    week: AggregateMetrics,
    target: AggregateMetrics,
    inputs: HighlightInputs,
    week_series: Vec<DailyPoint>,
) -> HighlightItem {
    let volatility = match category {
        HighlightCategory::Inconsistent => {
            let profits: Vec<f64> = week_series.iter().map(|p| p.profit).collect();
            Some(population_std_dev(&profits, inputs.avg_daily_profit))
        }
        _ => None,
    };

    let subject = key.to_string();
    let (title, description) = describe(&subject, category, &target, &inputs, volatility);

    let mut metrics = vec![
        HighlightMetric {
            label: "Profit",
            value: format_currency(target.profit),
            trend: Some(classify_trend(inputs.target_profit, inputs.avg_daily_profit)),
        },
        HighlightMetric {
            label: "ROI",
            value: format_percent(target.roi),
            trend: Some(classify_trend(inputs.target_roi, inputs.avg_roi)),
        },
        HighlightMetric {
            label: "ROAS",
            value: format_multiple(target.roas),
            trend: None,
        },
        HighlightMetric {
            label: "Spend",
            value: format_currency(target.spend),
            trend: None,
        },
        HighlightMetric {
            label: "7d Avg Profit",
            value: format_currency(inputs.avg_daily_profit),
            trend: None,
        },
    ];
    if let Some(std_dev) = volatility {
        metrics.push(HighlightMetric {
            label: "Volatility",
            value: format!("±{}", format_currency(std_dev)),
            trend: None,
        });
    }

    HighlightItem {
        category,
        icon: category.icon(),
        subject_key: key,
        title,
        description,
        metrics,
        snapshot: HighlightSnapshot {
            target,
            week,
            inputs,
        },
        week_series,
        volatility,
    }
}

fn describe(
    subject: &str,
    category: HighlightCategory,
    target: &AggregateMetrics,
    inputs: &HighlightInputs,
    volatility: Option<f64>,
) -> (String, String) {
    let profit = format_currency(inputs.target_profit);
    let avg = format_currency(inputs.avg_daily_profit);
    let roi = format_percent(target.roi);

    match category {
        HighlightCategory::Performing => (
            format!("{subject} is performing"),
            format!("{profit} profit at {roi} ROI, averaging {avg}/day this week"),
        ),
        HighlightCategory::Potential => (
            format!("{subject} is gaining momentum"),
            format!(
                "Profit up {} over its {avg}/day average ({profit} at {roi} ROI)",
                format_currency(inputs.profit_change)
            ),
        ),
        HighlightCategory::DecliningProfitable => (
            format!("{subject} is slipping"),
            format!(
                "Still profitable at {profit}, but {} below its {avg}/day average",
                format_currency(inputs.profit_change.abs())
            ),
        ),
        HighlightCategory::DecliningCritical => {
            let description = if inputs.target_profit < 0.0 {
                format!(
                    "Lost {} on {} spend",
                    format_currency(inputs.target_profit.abs()),
                    format_currency(inputs.target_spend)
                )
            } else {
                format!(
                    "{roi} ROI on {} spend",
                    format_currency(inputs.target_spend)
                )
            };
            (format!("{subject} needs attention"), description)
        }
        HighlightCategory::Inconsistent => (
            format!("{subject} is inconsistent"),
            format!(
                "Daily profit swings ±{} around a {avg}/day average",
                format_currency(volatility.unwrap_or(0.0))
            ),
        ),
    }
}

/// Week range used for highlights at `anchor`.
pub fn week_range(anchor: NaiveDate) -> DateRange {
    DateWindow::Last7.resolve(anchor)
}
