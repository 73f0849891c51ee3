//! Period-over-period trend classification.
//!
//! Two granularities share [`delta`]: a coarse four-rule classifier used for
//! metric badges, and a tiered classifier used for group summaries.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Positive,
    Negative,
    Neutral,
}

/// Absolute and relative change between two period values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Delta {
    pub change: f64,
    /// `change / |previous| * 100`, `None` when previous is zero.
    pub percent: Option<f64>,
}

pub fn delta(current: f64, previous: f64) -> Delta {
    let change = current - previous;
    let percent = if previous == 0.0 {
        None
    } else {
        Some(change / previous.abs() * 100.0)
    };
    Delta { change, percent }
}

/// Coarse trend badge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Trend {
    pub direction: TrendDirection,
    pub label: &'static str,
}

impl Trend {
    const fn new(direction: TrendDirection, label: &'static str) -> Self {
        Self { direction, label }
    }
}

/// Changes smaller than this are reported as stable.
const STABLE_EPSILON: f64 = 0.01;

/// Coarse classification, rules checked in priority order.
pub fn classify(current: f64, previous: f64) -> Trend {
    if previous == 0.0 {
        return if current == 0.0 {
            Trend::new(TrendDirection::Neutral, "No Change")
        } else if current > 0.0 {
            Trend::new(TrendDirection::Positive, "Positive Signs")
        } else {
            Trend::new(TrendDirection::Negative, "Negative Signs")
        };
    }

    let d = delta(current, previous);
    if d.change.abs() < STABLE_EPSILON {
        Trend::new(TrendDirection::Neutral, "Stable")
    } else if current > previous {
        Trend::new(TrendDirection::Positive, "Improving")
    } else {
        Trend::new(TrendDirection::Negative, "Declining")
    }
}

/// Tiers of the fine-grained classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrendTier {
    New,
    Surging,
    Consistent,
    Growing,
    Variable,
    Declining,
    Critical,
    Stable,
}

impl TrendTier {
    pub fn direction(&self) -> TrendDirection {
        match self {
            Self::Surging | Self::Consistent | Self::Growing => TrendDirection::Positive,
            Self::Declining | Self::Critical => TrendDirection::Negative,
            Self::New | Self::Variable | Self::Stable => TrendDirection::Neutral,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::New => "New",
            Self::Surging | Self::Growing => "Growing",
            Self::Consistent => "Consistent",
            Self::Variable => "Variable",
            Self::Declining => "Declining",
            Self::Critical => "Critical",
            Self::Stable => "Stable",
        }
    }

    pub fn icon(&self) -> Option<&'static str> {
        match self {
            Self::New => None,
            Self::Surging => Some("🚀"),
            Self::Consistent => Some("⭐"),
            Self::Growing => Some("📈"),
            Self::Variable => Some("📊"),
            Self::Declining => Some("⚠️"),
            Self::Critical => Some("💀"),
            Self::Stable => Some("➡️"),
        }
    }
}

/// Fine-grained trend with its presentation pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TieredTrend {
    pub tier: TrendTier,
    pub direction: TrendDirection,
    pub label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<&'static str>,
    pub percent: Option<f64>,
}

impl From<(TrendTier, Option<f64>)> for TieredTrend {
    fn from((tier, percent): (TrendTier, Option<f64>)) -> Self {
        Self {
            tier,
            direction: tier.direction(),
            label: tier.label(),
            icon: tier.icon(),
            percent,
        }
    }
}

pub fn classify_tiered(current: f64, previous: f64) -> TieredTrend {
    let Some(pct) = delta(current, previous).percent else {
        return (TrendTier::New, None).into();
    };

    let tier = if pct >= 50.0 && current > 1000.0 {
        TrendTier::Surging
    } else if (0.0..10.0).contains(&pct) && current > 3000.0 {
        TrendTier::Consistent
    } else if (10.0..50.0).contains(&pct) {
        TrendTier::Growing
    } else if pct > -20.0 && pct < 0.0 && current > 0.0 {
        TrendTier::Variable
    } else if pct <= -20.0 && current > 0.0 {
        TrendTier::Declining
    } else if current < 0.0 || pct <= -50.0 {
        TrendTier::Critical
    } else {
        TrendTier::Stable
    };

    (tier, Some(pct)).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delta_guards_zero_previous() {
        assert_eq!(delta(10.0, 0.0).percent, None);
        let d = delta(50.0, -100.0);
        assert_eq!(d.change, 150.0);
        assert_eq!(d.percent, Some(150.0));
    }

    #[test]
    fn test_coarse_no_change() {
        let t = classify(0.0, 0.0);
        assert_eq!(t.direction, TrendDirection::Neutral);
        assert_eq!(t.label, "No Change");
    }

    #[test]
    fn test_coarse_from_zero() {
        assert_eq!(classify(5.0, 0.0).label, "Positive Signs");
        assert_eq!(classify(5.0, 0.0).direction, TrendDirection::Positive);
        assert_eq!(classify(-5.0, 0.0).label, "Negative Signs");
        assert_eq!(classify(-5.0, 0.0).direction, TrendDirection::Negative);
    }

    #[test]
    fn test_coarse_stable_band() {
        assert_eq!(classify(100.005, 100.0).label, "Stable");
        assert_eq!(classify(99.995, 100.0).label, "Stable");
    }

    #[test]
    fn test_coarse_improving_and_declining() {
        assert_eq!(classify(120.0, 100.0).label, "Improving");
        assert_eq!(classify(80.0, 100.0).label, "Declining");
        assert_eq!(classify(-80.0, -100.0).direction, TrendDirection::Positive);
    }

    #[test]
    fn test_tiered_new() {
        let t = classify_tiered(5000.0, 0.0);
        assert_eq!(t.tier, TrendTier::New);
        assert_eq!(t.direction, TrendDirection::Neutral);
        assert!(t.icon.is_none());
    }

    #[test]
    fn test_tiered_rules_in_order() {
        assert_eq!(classify_tiered(1600.0, 1000.0).tier, TrendTier::Surging);
        assert_eq!(classify_tiered(1600.0, 1000.0).label, "Growing");
        assert_eq!(classify_tiered(3200.0, 3000.0).tier, TrendTier::Consistent);
        assert_eq!(classify_tiered(120.0, 100.0).tier, TrendTier::Growing);
        assert_eq!(classify_tiered(90.0, 100.0).tier, TrendTier::Variable);
        assert_eq!(classify_tiered(70.0, 100.0).tier, TrendTier::Declining);
        assert_eq!(classify_tiered(-10.0, 100.0).tier, TrendTier::Critical);
        assert_eq!(classify_tiered(0.0, 100.0).tier, TrendTier::Critical);
    }

    #[test]
    fn test_tiered_falls_through_to_stable() {
        // Large jump on a small base is not "surging".
        assert_eq!(classify_tiered(600.0, 300.0).tier, TrendTier::Stable);
        // Flat but below the consistency floor.
        assert_eq!(classify_tiered(2000.0, 2000.0).tier, TrendTier::Stable);
    }

    #[test]
    fn test_tiered_icons_and_directions() {
        let t = classify_tiered(70.0, 100.0);
        assert_eq!(t.icon, Some("⚠️"));
        assert_eq!(t.direction, TrendDirection::Negative);
        let t = classify_tiered(3100.0, 3000.0);
        assert_eq!(t.icon, Some("⭐"));
        assert_eq!(t.direction, TrendDirection::Positive);
    }
}
