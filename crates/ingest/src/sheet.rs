//! Row parsing for the performance sheet.
//!
//! Rows that cannot become a valid [`Record`] are dropped and counted. A bad
//! row never fails the batch; only I/O errors do.

use std::collections::BTreeMap;
use std::io;

use campaign_core::types::parse_sheet_date;
use campaign_core::{CampaignError, CampaignResult, Record};
use csv::StringRecord;
use thiserror::Error;
use tracing::{debug, info};

/// Column positions for one sheet layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnLayout {
    pub date: usize,
    pub buyer: usize,
    pub offer: usize,
    pub network: usize,
    pub account: usize,
    pub revenue: usize,
    pub spend: usize,
    pub profit: usize,
}

impl ColumnLayout {
    /// Source sheet: date, buyer, offer, network, account, revenue, spend,
    /// profit.
    pub const SHEET: Self = Self {
        date: 0,
        buyer: 1,
        offer: 2,
        network: 3,
        account: 4,
        revenue: 5,
        spend: 6,
        profit: 7,
    };

    /// Export layout: Date, Media Buyer, Ad Account, Offer, Network, Spend,
    /// Revenue, Profit.
    pub const EXPORT: Self = Self {
        date: 0,
        buyer: 1,
        account: 2,
        offer: 3,
        network: 4,
        spend: 5,
        revenue: 6,
        profit: 7,
    };

    pub fn min_columns(&self) -> usize {
        [
            self.date,
            self.buyer,
            self.offer,
            self.network,
            self.account,
            self.revenue,
            self.spend,
            self.profit,
        ]
        .into_iter()
        .max()
        .unwrap_or(0)
            + 1
    }

    /// Recognize a header row. Returns the layout it announces, or `None`
    /// when the row is data.
    pub fn from_header(row: &StringRecord) -> Option<Self> {
        let first = row.get(0)?.trim();
        if !first.eq_ignore_ascii_case("date") {
            return None;
        }
        let second = row.get(1).map(str::trim).unwrap_or_default();
        let third = row.get(2).map(str::trim).unwrap_or_default();
        if second.eq_ignore_ascii_case("media buyer") && third.eq_ignore_ascii_case("ad account") {
            Some(Self::EXPORT)
        } else {
            Some(Self::SHEET)
        }
    }
}

/// Why a row was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Error)]
pub enum DropReason {
    #[error("unreadable row")]
    Unreadable,
    #[error("too few columns")]
    TooFewColumns,
    #[error("invalid date")]
    InvalidDate,
    #[error("missing buyer")]
    MissingBuyer,
    #[error("missing network")]
    MissingNetwork,
    #[error("non-numeric {0}")]
    NonNumeric(&'static str),
    #[error("negative {0}")]
    Negative(&'static str),
}

/// Parse a money cell. Accepts `$`, thousands separators, and accounting
/// style `(12.50)` negatives.
pub fn parse_money(raw: &str) -> Option<f64> {
    let mut cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | ' '))
        .collect();
    if cleaned.starts_with('(') && cleaned.ends_with(')') && cleaned.len() > 2 {
        cleaned = format!("-{}", &cleaned[1..cleaned.len() - 1]);
    }
    let value: f64 = cleaned.parse().ok()?;
    value.is_finite().then_some(value)
}

fn money_field(row: &StringRecord, index: usize, name: &'static str) -> Result<f64, DropReason> {
    row.get(index)
        .and_then(parse_money)
        .ok_or(DropReason::NonNumeric(name))
}

fn text_field(row: &StringRecord, index: usize) -> String {
    row.get(index).map(str::trim).unwrap_or_default().to_string()
}

/// Parse one data row under `layout`.
pub fn parse_row(row: &StringRecord, layout: &ColumnLayout) -> Result<Record, DropReason> {
    if row.len() < layout.min_columns() {
        return Err(DropReason::TooFewColumns);
    }

    let date = row
        .get(layout.date)
        .and_then(|raw| parse_sheet_date(raw).ok())
        .ok_or(DropReason::InvalidDate)?;

    let buyer = text_field(row, layout.buyer);
    if buyer.is_empty() {
        return Err(DropReason::MissingBuyer);
    }
    let network = text_field(row, layout.network);
    if network.is_empty() {
        return Err(DropReason::MissingNetwork);
    }

    let revenue = money_field(row, layout.revenue, "revenue")?;
    let spend = money_field(row, layout.spend, "spend")?;
    let profit = money_field(row, layout.profit, "profit")?;
    if spend < 0.0 {
        return Err(DropReason::Negative("spend"));
    }
    if revenue < 0.0 {
        return Err(DropReason::Negative("revenue"));
    }

    Ok(Record {
        date,
        buyer,
        network,
        offer: text_field(row, layout.offer),
        account: text_field(row, layout.account),
        spend,
        revenue,
        profit,
    })
}

/// Outcome counts for one ingestion pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub rows: usize,
    pub accepted: usize,
    pub dropped: BTreeMap<DropReason, usize>,
    /// Rows whose date parsed, whether or not they were accepted.
    pub dated_rows: usize,
}

impl IngestReport {
    pub fn dropped_total(&self) -> usize {
        self.dropped.values().sum()
    }
}

/// Read a whole sheet. A leading header row selects the layout; without one
/// the source sheet layout is assumed.
///
/// Fails with [`CampaignError::NoValidDates`] when data rows exist but none
/// has a usable date, since such a batch has no anchor.
pub fn read_batch<R: io::Read>(reader: R) -> CampaignResult<(Vec<Record>, IngestReport)> {
    let mut csv = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut layout = ColumnLayout::SHEET;
    let mut report = IngestReport::default();
    let mut records = Vec::new();
    let mut first = true;

    for (line, result) in csv.records().enumerate() {
        let row = match result {
            Ok(row) => row,
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => {
                debug!(line = line + 1, error = %e, "Unreadable row dropped");
                report.rows += 1;
                *report.dropped.entry(DropReason::Unreadable).or_default() += 1;
                continue;
            }
        };
        if row.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        if std::mem::take(&mut first) {
            if let Some(header) = ColumnLayout::from_header(&row) {
                layout = header;
                continue;
            }
        }

        report.rows += 1;
        if row.get(layout.date).is_some_and(|raw| parse_sheet_date(raw).is_ok()) {
            report.dated_rows += 1;
        }
        match parse_row(&row, &layout) {
            Ok(record) => {
                report.accepted += 1;
                records.push(record);
            }
            Err(reason) => {
                debug!(line = line + 1, reason = %reason, "Row dropped");
                *report.dropped.entry(reason).or_default() += 1;
            }
        }
    }

    if report.rows > 0 && report.dated_rows == 0 {
        return Err(CampaignError::NoValidDates { rows: report.rows });
    }

    info!(
        rows = report.rows,
        accepted = report.accepted,
        dropped = report.dropped_total(),
        "Sheet ingested"
    );

    Ok((records, report))
}
