use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::iter::Sum;
use std::ops::{Add, AddAssign};

use crate::error::{CampaignError, CampaignResult};

/// Date format used by the source sheet and by exports.
pub const SHEET_DATE_FORMAT: &str = "%m/%d/%Y";

/// Parse a sheet date such as `01/15/2025`. Single-digit month and day are
/// accepted.
pub fn parse_sheet_date(raw: &str) -> CampaignResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), SHEET_DATE_FORMAT)
        .map_err(|_| CampaignError::InvalidDate(raw.to_string()))
}

/// One day of performance for a buyer/network/offer/account combination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub date: NaiveDate,
    pub buyer: String,
    pub network: String,
    pub offer: String,
    pub account: String,
    pub spend: f64,
    pub revenue: f64,
    pub profit: f64,
}

/// Summed money totals with derived ratios.
///
/// `roi` and `roas` are `None` when spend is zero. That is a distinct state
/// from a real 0% and renders as "N/A".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AggregateMetrics {
    pub spend: f64,
    pub revenue: f64,
    pub profit: f64,
    /// `profit / spend * 100`.
    pub roi: Option<f64>,
    /// `revenue / spend`.
    pub roas: Option<f64>,
}

impl AggregateMetrics {
    pub fn from_totals(spend: f64, revenue: f64, profit: f64) -> Self {
        let (roi, roas) = if spend > 0.0 {
            (Some(profit / spend * 100.0), Some(revenue / spend))
        } else {
            (None, None)
        };
        Self {
            spend,
            revenue,
            profit,
            roi,
            roas,
        }
    }

    pub fn zero() -> Self {
        Self::from_totals(0.0, 0.0, 0.0)
    }

    /// True when every money total is zero.
    pub fn is_idle(&self) -> bool {
        self.spend == 0.0 && self.revenue == 0.0 && self.profit == 0.0
    }

    /// ROI with the zero-spend case collapsed to 0, for threshold rules.
    pub fn roi_or_zero(&self) -> f64 {
        self.roi.unwrap_or(0.0)
    }
}

impl Default for AggregateMetrics {
    fn default() -> Self {
        Self::zero()
    }
}

impl Add for AggregateMetrics {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::from_totals(
            self.spend + rhs.spend,
            self.revenue + rhs.revenue,
            self.profit + rhs.profit,
        )
    }
}

impl AddAssign for AggregateMetrics {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sum for AggregateMetrics {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Record> for AggregateMetrics {
    fn sum<I: Iterator<Item = &'a Record>>(iter: I) -> Self {
        let (spend, revenue, profit) = iter.fold((0.0, 0.0, 0.0), |(s, r, p), rec| {
            (s + rec.spend, r + rec.revenue, p + rec.profit)
        });
        Self::from_totals(spend, revenue, profit)
    }
}

/// Display-only offer cap from the cap sheet.
///
/// The sheet encodes state with literal sentinels: 0 is paused and 100000 is
/// uncapped. Any other value is a plain limit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "limit", rename_all = "lowercase")]
pub enum Cap {
    Paused,
    Uncapped,
    Limit(f64),
}

impl Cap {
    pub const PAUSED_SENTINEL: f64 = 0.0;
    pub const UNCAPPED_SENTINEL: f64 = 100_000.0;

    pub fn from_raw(value: f64) -> Self {
        if value == Self::PAUSED_SENTINEL {
            Self::Paused
        } else if value == Self::UNCAPPED_SENTINEL {
            Self::Uncapped
        } else {
            Self::Limit(value)
        }
    }
}

impl std::fmt::Display for Cap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Paused => f.write_str("Paused"),
            Self::Uncapped => f.write_str("Uncapped"),
            Self::Limit(limit) => write!(f, "{}", limit),
        }
    }
}

/// Formats an optional percentage, `"N/A"` when undefined.
pub fn format_percent(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.1}%", v),
        None => "N/A".to_string(),
    }
}

/// Formats an optional multiplier such as ROAS, `"N/A"` when undefined.
pub fn format_multiple(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.2}x", v),
        None => "N/A".to_string(),
    }
}

/// Formats a dollar amount with thousands separators and two decimals.
pub fn format_currency(value: f64) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    let cents = (value.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{}${}.{:02}", sign, grouped, cents % 100)
}
