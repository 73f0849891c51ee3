//! Record filtering and grouping over a normalized batch.
//!
//! Every grouping path runs records through [`normalize`] before a key is
//! built, so independently computed views agree on their totals.

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::str::FromStr;

use campaign_core::{CampaignError, Record};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::window::DateRange;

const SUITED_NETWORK: &str = "Suited";
const ACA: &str = "ACA";

/// Canonical network for a network/offer pair. `Suited` running the `ACA`
/// offer reports as the `ACA` network.
pub fn canonical_network<'a>(network: &'a str, offer: &str) -> &'a str {
    if network == SUITED_NETWORK && offer == ACA {
        ACA
    } else {
        network
    }
}

/// Rewrite a record to its canonical grouping form. Borrowed when nothing
/// changes.
pub fn normalize(record: &Record) -> Cow<'_, Record> {
    let network = canonical_network(&record.network, &record.offer);
    if network == record.network {
        Cow::Borrowed(record)
    } else {
        let mut owned = record.clone();
        owned.network = network.to_string();
        Cow::Owned(owned)
    }
}

/// Order-preserving subsequence of `records` matching `predicate`.
pub fn filter<'a, I, P>(records: I, mut predicate: P) -> Vec<&'a Record>
where
    I: IntoIterator<Item = &'a Record>,
    P: FnMut(&Record) -> bool,
{
    records.into_iter().filter(|r| predicate(*r)).collect()
}

/// Group records by key, groups in first-appearance order and records in
/// input order. `key_fn` always sees the normalized record.
pub fn group_by<'a, I, K, F>(records: I, key_fn: F) -> Vec<(K, Vec<&'a Record>)>
where
    I: IntoIterator<Item = &'a Record>,
    K: Eq + Hash + Clone,
    F: Fn(&Record) -> K,
{
    let mut slots: HashMap<K, usize> = HashMap::new();
    let mut groups: Vec<(K, Vec<&'a Record>)> = Vec::new();

    for record in records {
        let key = key_fn(normalize(record).as_ref());
        match slots.get(&key) {
            Some(&slot) => groups[slot].1.push(record),
            None => {
                slots.insert(key.clone(), groups.len());
                groups.push((key, vec![record]));
            }
        }
    }

    groups
}

/// Standard reporting views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum GroupBy {
    Buyer,
    Network,
    Offer,
    Account,
    NetworkOffer,
    BuyerNetworkOffer,
}

impl GroupBy {
    /// Composite key for a record under this view.
    pub fn key(&self, record: &Record) -> CompositeKey {
        let network = canonical_network(&record.network, &record.offer);
        let mut key = CompositeKey::default();
        match self {
            Self::Buyer => key.buyer = Some(record.buyer.clone()),
            Self::Network => key.network = Some(network.to_string()),
            Self::Offer => key.offer = Some(record.offer.clone()),
            Self::Account => key.account = Some(record.account.clone()),
            Self::NetworkOffer => {
                key.network = Some(network.to_string());
                key.offer = Some(record.offer.clone());
            }
            Self::BuyerNetworkOffer => {
                key.buyer = Some(record.buyer.clone());
                key.network = Some(network.to_string());
                key.offer = Some(record.offer.clone());
            }
        }
        key
    }
}

impl FromStr for GroupBy {
    type Err = CampaignError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buyer" => Ok(Self::Buyer),
            "network" => Ok(Self::Network),
            "offer" => Ok(Self::Offer),
            "account" => Ok(Self::Account),
            "network-offer" => Ok(Self::NetworkOffer),
            "buyer-network-offer" => Ok(Self::BuyerNetworkOffer),
            other => Err(CampaignError::InvalidGroupBy(other.to_string())),
        }
    }
}

/// Normalized reporting group identity. Unused dimensions are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CompositeKey {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buyer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
}

impl CompositeKey {
    /// `network-offer` lookup key for cap tables, when both are present.
    pub fn cap_key(&self) -> Option<String> {
        match (&self.network, &self.offer) {
            (Some(network), Some(offer)) => Some(format!("{network}-{offer}")),
            _ => None,
        }
    }
}

impl fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<&str> = [&self.buyer, &self.network, &self.offer, &self.account]
            .into_iter()
            .filter_map(|part| part.as_deref())
            .collect();
        f.write_str(&parts.join("-"))
    }
}

/// An immutable, normalized record batch and its anchor date.
#[derive(Debug, Clone, Default)]
pub struct RecordIndex {
    records: Vec<Record>,
    anchor: Option<NaiveDate>,
}

impl RecordIndex {
    pub fn new(records: Vec<Record>) -> Self {
        let mut rewritten = 0usize;
        let records: Vec<Record> = records
            .into_iter()
            .map(|record| {
                if let Cow::Owned(owned) = normalize(&record) {
                    rewritten += 1;
                    return owned;
                }
                record
            })
            .collect();
        let anchor = records.iter().map(|r| r.date).max();

        debug!(
            rows = records.len(),
            rewritten,
            anchor = ?anchor,
            "Record index built"
        );

        Self { records, anchor }
    }

    /// Latest date in the batch, `None` when the batch is empty.
    pub fn anchor(&self) -> Option<NaiveDate> {
        self.anchor
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn in_range(&self, range: DateRange) -> Vec<&Record> {
        filter(&self.records, |r| range.contains(r.date))
    }

    pub fn group_by(&self, view: GroupBy) -> Vec<(CompositeKey, Vec<&Record>)> {
        group_by(&self.records, |r| view.key(r))
    }

    pub fn group_in_range(
        &self,
        view: GroupBy,
        range: DateRange,
    ) -> Vec<(CompositeKey, Vec<&Record>)> {
        group_by(self.in_range(range), |r| view.key(r))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(day: u32, buyer: &str, network: &str, offer: &str, profit: f64) -> Record {
        Record {
            date: NaiveDate::from_ymd_opt(2025, 1, day).unwrap(),
            buyer: buyer.into(),
            network: network.into(),
            offer: offer.into(),
            account: format!("{buyer}-acct"),
            spend: 100.0,
            revenue: 100.0 + profit,
            profit,
        }
    }

    #[test]
    fn test_normalize_rewrites_suited_aca() {
        let r = rec(1, "ana", "Suited", "ACA", 10.0);
        let n = normalize(&r);
        assert_eq!(n.network, "ACA");
        assert_eq!(n.offer, "ACA");
        assert!(matches!(n, Cow::Owned(_)));
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let r = rec(1, "ana", "Suited", "ACA", 10.0);
        let once = normalize(&r).into_owned();
        let twice = normalize(&once).into_owned();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_normalize_passes_others_through() {
        let pairs = [
            ("Suited", "Medicare"),
            ("ACA", "ACA"),
            ("suited", "ACA"),
            ("Other", "ACA"),
        ];
        for (network, offer) in pairs {
            let r = rec(1, "ana", network, offer, 10.0);
            assert!(matches!(normalize(&r), Cow::Borrowed(_)));
        }
    }

    #[test]
    fn test_filter_preserves_order() {
        let records = vec![
            rec(3, "a", "N", "O", 1.0),
            rec(1, "b", "N", "O", 2.0),
            rec(2, "c", "N", "O", 3.0),
        ];
        let kept = filter(&records, |r| r.profit > 1.0);
        let buyers: Vec<_> = kept.iter().map(|r| r.buyer.as_str()).collect();
        assert_eq!(buyers, vec!["b", "c"]);
    }

    #[test]
    fn test_group_by_first_appearance_order() {
        let records = vec![
            rec(1, "zed", "N", "O", 1.0),
            rec(1, "amy", "N", "O", 2.0),
            rec(2, "zed", "N", "O", 3.0),
        ];
        let groups = group_by(&records, |r| r.buyer.clone());
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, "zed");
        assert_eq!(groups[0].1.len(), 2);
        assert_eq!(groups[1].0, "amy");
    }

    #[test]
    fn test_group_by_key_fn_sees_normalized_record() {
        let records = vec![rec(1, "a", "Suited", "ACA", 1.0), rec(1, "b", "ACA", "ACA", 2.0)];
        let groups = group_by(&records, |r| r.network.clone());
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].0, "ACA");
    }

    #[test]
    fn test_views_agree_after_normalization() {
        let records = vec![
            rec(1, "a", "Suited", "ACA", 10.0),
            rec(1, "b", "ACA", "ACA", 20.0),
            rec(2, "a", "Suited", "Medicare", 30.0),
        ];
        let index = RecordIndex::new(records);
        let by_network = index.group_by(GroupBy::Network);
        let by_pair = index.group_by(GroupBy::NetworkOffer);

        let aca_network: f64 = by_network
            .iter()
            .filter(|(k, _)| k.network.as_deref() == Some("ACA"))
            .flat_map(|(_, rs)| rs.iter().map(|r| r.profit))
            .sum();
        let aca_pair: f64 = by_pair
            .iter()
            .filter(|(k, _)| k.network.as_deref() == Some("ACA"))
            .flat_map(|(_, rs)| rs.iter().map(|r| r.profit))
            .sum();
        assert_eq!(aca_network, 30.0);
        assert_eq!(aca_network, aca_pair);
        assert_eq!(by_pair.len(), 2);
    }

    #[test]
    fn test_composite_key_display_and_cap_key() {
        let r = rec(1, "ana", "Suited", "ACA", 1.0);
        let key = GroupBy::BuyerNetworkOffer.key(&r);
        assert_eq!(key.to_string(), "ana-ACA-ACA");
        assert_eq!(key.cap_key().as_deref(), Some("ACA-ACA"));
        assert!(GroupBy::Buyer.key(&r).cap_key().is_none());
    }

    #[test]
    fn test_index_anchor_and_range() {
        let index = RecordIndex::new(vec![
            rec(3, "a", "N", "O", 1.0),
            rec(9, "a", "N", "O", 1.0),
            rec(5, "a", "N", "O", 1.0),
        ]);
        let anchor = index.anchor().unwrap();
        assert_eq!(anchor, NaiveDate::from_ymd_opt(2025, 1, 9).unwrap());
        let range = DateRange::new(NaiveDate::from_ymd_opt(2025, 1, 4).unwrap(), anchor);
        assert_eq!(index.in_range(range).len(), 2);
        assert!(RecordIndex::new(Vec::new()).anchor().is_none());
    }

    #[test]
    fn test_group_by_parse() {
        assert_eq!("network-offer".parse::<GroupBy>().unwrap(), GroupBy::NetworkOffer);
        assert!(matches!(
            "Campaign".parse::<GroupBy>(),
            Err(CampaignError::InvalidGroupBy(g)) if g == "campaign"
        ));
    }
}
