//! Record-level CSV export.

use std::io;

use campaign_core::{CampaignError, CampaignResult, Record};

use crate::window::SHEET_DATE_FORMAT;

/// Export column order.
pub const EXPORT_HEADERS: [&str; 8] = [
    "Date",
    "Media Buyer",
    "Ad Account",
    "Offer",
    "Network",
    "Spend",
    "Revenue",
    "Profit",
];

fn money(value: f64) -> String {
    format!("{:.2}", value)
}

/// Write `records` as CSV with a header row. Returns the number of data rows.
pub fn write_csv<'a, I, W>(records: I, writer: W) -> CampaignResult<usize>
where
    I: IntoIterator<Item = &'a Record>,
    W: io::Write,
{
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(EXPORT_HEADERS)?;

    let mut rows = 0usize;
    for record in records {
        out.write_record([
            record.date.format(SHEET_DATE_FORMAT).to_string(),
            record.buyer.clone(),
            record.account.clone(),
            record.offer.clone(),
            record.network.clone(),
            money(record.spend),
            money(record.revenue),
            money(record.profit),
        ])?;
        rows += 1;
    }

    out.flush()?;
    Ok(rows)
}

/// Export `records` to an in-memory CSV document.
pub fn to_csv_string<'a, I>(records: I) -> CampaignResult<String>
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut buffer = Vec::new();
    write_csv(records, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| CampaignError::Internal(anyhow::Error::from(e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record() -> Record {
        Record {
            date: NaiveDate::from_ymd_opt(2025, 1, 5).unwrap(),
            buyer: "Sam, Jr".into(),
            network: "ACA".into(),
            offer: "ACA".into(),
            account: "acct-9".into(),
            spend: 1234.5,
            revenue: 2000.0,
            profit: 765.499,
        }
    }

    #[test]
    fn test_header_and_column_order() {
        let csv = to_csv_string(&[record()]).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Date,Media Buyer,Ad Account,Offer,Network,Spend,Revenue,Profit"
        );
        assert_eq!(
            lines.next().unwrap(),
            "01/05/2025,\"Sam, Jr\",acct-9,ACA,ACA,1234.50,2000.00,765.50"
        );
        assert!(lines.next().is_none());
    }

    #[test]
    fn test_empty_export_has_header_only() {
        let records: Vec<Record> = Vec::new();
        let mut out = Vec::new();
        assert_eq!(write_csv(&records, &mut out).unwrap(), 0);
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 1);
    }
}
