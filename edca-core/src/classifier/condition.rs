//! Rule predicates over an `IndicatorSnapshot`.
//!
//! Conditions are plain data so rule tables can be loaded from config.
//! Any comparison that reads an undefined value evaluates to false.

use crate::engine::IndicatorSnapshot;
use crate::structure::StructureTrend;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A predicate over the latest snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Condition {
    /// Always true. Used for the catch-all rule.
    Always,
    /// close < lower Bollinger band.
    PriceBelowLowerBand,
    /// close > upper Bollinger band.
    PriceAboveUpperBand,
    /// close > long SMA.
    PriceAboveSma200,
    /// close < long SMA.
    PriceBelowSma200,
    RsiBelow { threshold: f64 },
    RsiAbove { threshold: f64 },
    MacdHistBelow { threshold: f64 },
    MacdHistAbove { threshold: f64 },
    TrendIs { trend: StructureTrend },
    /// Every sub-condition holds (true when empty).
    All { conditions: Vec<Condition> },
    /// At least one sub-condition holds (false when empty).
    Any { conditions: Vec<Condition> },
    Not { condition: Box<Condition> },
}

fn lt(a: f64, b: Option<f64>) -> bool {
    b.is_some_and(|b| a < b)
}

fn gt(a: f64, b: Option<f64>) -> bool {
    b.is_some_and(|b| a > b)
}

impl Condition {
    pub fn all(conditions: Vec<Condition>) -> Self {
        Condition::All { conditions }
    }

    pub fn any(conditions: Vec<Condition>) -> Self {
        Condition::Any { conditions }
    }

    pub fn rsi_below(threshold: f64) -> Self {
        Condition::RsiBelow { threshold }
    }

    pub fn rsi_above(threshold: f64) -> Self {
        Condition::RsiAbove { threshold }
    }

    pub fn trend_is(trend: StructureTrend) -> Self {
        Condition::TrendIs { trend }
    }

    /// Evaluate against a snapshot.
    pub fn holds(&self, snap: &IndicatorSnapshot) -> bool {
        let price = snap.close;
        match self {
            Condition::Always => true,
            Condition::PriceBelowLowerBand => lt(price, snap.lower_band),
            Condition::PriceAboveUpperBand => gt(price, snap.upper_band),
            Condition::PriceAboveSma200 => gt(price, snap.sma200),
            Condition::PriceBelowSma200 => lt(price, snap.sma200),
            Condition::RsiBelow { threshold } => snap.rsi.is_some_and(|rsi| rsi < *threshold),
            Condition::RsiAbove { threshold } => snap.rsi.is_some_and(|rsi| rsi > *threshold),
            Condition::MacdHistBelow { threshold } => {
                snap.macd_hist.is_some_and(|h| h < *threshold)
            }
            Condition::MacdHistAbove { threshold } => {
                snap.macd_hist.is_some_and(|h| h > *threshold)
            }
            Condition::TrendIs { trend } => snap.structure_trend == *trend,
            Condition::All { conditions } => conditions.iter().all(|c| c.holds(snap)),
            Condition::Any { conditions } => conditions.iter().any(|c| c.holds(snap)),
            Condition::Not { condition } => !condition.holds(snap),
        }
    }

    /// True for a condition that matches every snapshot by construction.
    pub fn is_catch_all(&self) -> bool {
        match self {
            Condition::Always => true,
            Condition::All { conditions } => conditions.iter().all(Condition::is_catch_all),
            _ => false,
        }
    }

    /// Every threshold inside this condition is finite.
    pub fn thresholds_finite(&self) -> bool {
        match self {
            Condition::RsiBelow { threshold }
            | Condition::RsiAbove { threshold }
            | Condition::MacdHistBelow { threshold }
            | Condition::MacdHistAbove { threshold } => threshold.is_finite(),
            Condition::All { conditions } | Condition::Any { conditions } => {
                conditions.iter().all(Condition::thresholds_finite)
            }
            Condition::Not { condition } => condition.thresholds_finite(),
            _ => true,
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Always => write!(f, "always"),
            Condition::PriceBelowLowerBand => write!(f, "price < lower band"),
            Condition::PriceAboveUpperBand => write!(f, "price > upper band"),
            Condition::PriceAboveSma200 => write!(f, "price > SMA200"),
            Condition::PriceBelowSma200 => write!(f, "price < SMA200"),
            Condition::RsiBelow { threshold } => write!(f, "RSI < {threshold}"),
            Condition::RsiAbove { threshold } => write!(f, "RSI > {threshold}"),
            Condition::MacdHistBelow { threshold } => write!(f, "MACD hist < {threshold}"),
            Condition::MacdHistAbove { threshold } => write!(f, "MACD hist > {threshold}"),
            Condition::TrendIs { trend } => write!(f, "trend = {trend}"),
            Condition::All { conditions } => join(f, conditions, " AND "),
            Condition::Any { conditions } => join(f, conditions, " OR "),
            Condition::Not { condition } => write!(f, "NOT ({condition})"),
        }
    }
}

fn join(f: &mut fmt::Formatter<'_>, conditions: &[Condition], sep: &str) -> fmt::Result {
    for (i, c) in conditions.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        match c {
            Condition::All { .. } | Condition::Any { .. } => write!(f, "({c})")?,
            _ => write!(f, "{c}")?,
        }
    }
    Ok(())
}
