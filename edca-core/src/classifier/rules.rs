//! Ordered rule tables.
//!
//! A `RuleTable` is evaluated top to bottom and the first rule whose
//! condition holds decides the status, multiplier and note. Overlapping
//! conditions are resolved purely by order. Every table ends with a
//! catch-all rule, so evaluation always produces a match.

use super::condition::Condition;
use crate::engine::IndicatorSnapshot;
use crate::structure::StructureTrend;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ─── SignalStatus ───────────────────────────────────────────────────

/// Discrete signal category reported for an instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalStatus {
    SuperDiscount,
    Oversold,
    TrendPullback,
    Overbought,
    Downtrend,
    Fair,
}

impl SignalStatus {
    pub fn label(self) -> &'static str {
        match self {
            SignalStatus::SuperDiscount => "Super Discount",
            SignalStatus::Oversold => "Oversold",
            SignalStatus::TrendPullback => "Uptrend Pullback",
            SignalStatus::Overbought => "Overbought",
            SignalStatus::Downtrend => "Downtrend",
            SignalStatus::Fair => "Fair Price",
        }
    }

    /// Marker shown in front of the label in push messages.
    pub fn icon(self) -> &'static str {
        match self {
            SignalStatus::SuperDiscount => "🔥",
            SignalStatus::Oversold => "💎",
            SignalStatus::TrendPullback => "🎯",
            SignalStatus::Overbought => "⚠️",
            SignalStatus::Downtrend => "🐻",
            SignalStatus::Fair => "✅",
        }
    }
}

impl fmt::Display for SignalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ─── Rule ───────────────────────────────────────────────────────────

/// One row of a rule table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub status: SignalStatus,
    pub multiplier: f64,
    #[serde(default)]
    pub note: String,
    pub condition: Condition,
}

impl Rule {
    pub fn new(status: SignalStatus, multiplier: f64, note: impl Into<String>, condition: Condition) -> Self {
        Self {
            status,
            multiplier,
            note: note.into(),
            condition,
        }
    }

    /// The standard final row: multiplier 1.0, fair price.
    pub fn fair() -> Self {
        Self::new(SignalStatus::Fair, 1.0, "(Normal price)", Condition::Always)
    }
}

// ─── RuleTable ──────────────────────────────────────────────────────

/// Errors from rule table construction.
#[derive(Debug, Error, PartialEq)]
pub enum RuleTableError {
    #[error("rule table is empty")]
    Empty,
    #[error("last rule must be a catch-all (condition `always`)")]
    MissingCatchAll,
    #[error("rule {index} follows a catch-all and can never match")]
    UnreachableRule { index: usize },
    #[error("rule {index} has invalid multiplier {multiplier} (must be finite and >= 0)")]
    InvalidMultiplier { index: usize, multiplier: f64 },
    #[error("rule {index} has a non-finite threshold")]
    InvalidThreshold { index: usize },
    #[error("rule set 'custom' needs rules from the configuration")]
    CustomRequiresRules,
    #[error("unknown rule set '{0}' (valid: structural, sniper, bollinger, rsi, custom)")]
    UnknownRuleSet(String),
}

/// Ordered, validated list of rules.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleTable {
    rules: Vec<Rule>,
}

impl RuleTable {
    /// Validate and build a table.
    pub fn new(rules: Vec<Rule>) -> Result<Self, RuleTableError> {
        if rules.is_empty() {
            return Err(RuleTableError::Empty);
        }
        for (index, rule) in rules.iter().enumerate() {
            if !rule.multiplier.is_finite() || rule.multiplier < 0.0 {
                return Err(RuleTableError::InvalidMultiplier {
                    index,
                    multiplier: rule.multiplier,
                });
            }
            if !rule.condition.thresholds_finite() {
                return Err(RuleTableError::InvalidThreshold { index });
            }
        }
        if let Some(pos) = rules.iter().position(|r| r.condition.is_catch_all()) {
            if pos + 1 < rules.len() {
                return Err(RuleTableError::UnreachableRule { index: pos + 1 });
            }
        } else {
            return Err(RuleTableError::MissingCatchAll);
        }
        Ok(Self { rules })
    }

    /// Table for a named preset.
    pub fn preset(set: RuleSet) -> Result<Self, RuleTableError> {
        let rules = match set {
            RuleSet::Structural => structural_rules(),
            RuleSet::Sniper => sniper_rules(),
            RuleSet::Bollinger => bollinger_rules(),
            RuleSet::Rsi => rsi_rules(),
            RuleSet::Custom => return Err(RuleTableError::CustomRequiresRules),
        };
        Self::new(rules)
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// First rule whose condition holds, with its position.
    pub fn first_match(&self, snap: &IndicatorSnapshot) -> (usize, &Rule) {
        self.rules
            .iter()
            .enumerate()
            .find(|(_, rule)| rule.condition.holds(snap))
            .expect("validated rule table ends with a catch-all")
    }
}

impl Default for RuleTable {
    fn default() -> Self {
        Self {
            rules: structural_rules(),
        }
    }
}

// ─── Presets ────────────────────────────────────────────────────────

/// Named rule table presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleSet {
    /// Bollinger + RSI + SMA200 + market structure (default).
    #[default]
    Structural,
    /// Bollinger + RSI + SMA200 + MACD, no structure.
    Sniper,
    /// Lower band only.
    Bollinger,
    /// RSI extremes only.
    Rsi,
    /// Rules supplied by configuration.
    Custom,
}

impl RuleSet {
    pub const ALL: [RuleSet; 5] = [
        RuleSet::Structural,
        RuleSet::Sniper,
        RuleSet::Bollinger,
        RuleSet::Rsi,
        RuleSet::Custom,
    ];

    pub fn name(self) -> &'static str {
        match self {
            RuleSet::Structural => "structural",
            RuleSet::Sniper => "sniper",
            RuleSet::Bollinger => "bollinger",
            RuleSet::Rsi => "rsi",
            RuleSet::Custom => "custom",
        }
    }
}

impl FromStr for RuleSet {
    type Err = RuleTableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RuleSet::ALL
            .into_iter()
            .find(|set| set.name() == s.trim().to_ascii_lowercase())
            .ok_or_else(|| RuleTableError::UnknownRuleSet(s.to_string()))
    }
}

impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn structural_rules() -> Vec<Rule> {
    vec![
        Rule::new(
            SignalStatus::SuperDiscount,
            2.0,
            "(Structural buy: below lower band in a bullish structure)",
            Condition::all(vec![
                Condition::PriceBelowLowerBand,
                Condition::trend_is(StructureTrend::Bullish),
            ]),
        ),
        Rule::new(
            SignalStatus::Oversold,
            1.5,
            "(Panic selling, very cheap)",
            Condition::rsi_below(30.0),
        ),
        Rule::new(
            SignalStatus::TrendPullback,
            1.2,
            "(Pullback in an uptrend, accumulate)",
            Condition::all(vec![
                Condition::PriceAboveSma200,
                Condition::rsi_below(45.0),
                Condition::trend_is(StructureTrend::Bullish),
            ]),
        ),
        Rule::new(
            SignalStatus::Overbought,
            0.5,
            "(Stretched, reduce the amount)",
            Condition::rsi_above(70.0),
        ),
        Rule::new(
            SignalStatus::Downtrend,
            0.8,
            "(Bearish structure, buy less)",
            Condition::all(vec![
                Condition::trend_is(StructureTrend::Bearish),
                Condition::PriceBelowSma200,
            ]),
        ),
        Rule::fair(),
    ]
}

fn sniper_rules() -> Vec<Rule> {
    vec![
        Rule::new(
            SignalStatus::SuperDiscount,
            1.5,
            "(Panic buy! Very cheap)",
            Condition::any(vec![Condition::rsi_below(30.0), Condition::PriceBelowLowerBand]),
        ),
        Rule::new(
            SignalStatus::TrendPullback,
            1.2,
            "(Pullback in an uptrend, accumulate)",
            Condition::all(vec![Condition::PriceAboveSma200, Condition::rsi_below(45.0)]),
        ),
        Rule::new(
            SignalStatus::Overbought,
            0.6,
            "(Beware of the top, reduce the amount)",
            Condition::rsi_above(70.0),
        ),
        Rule::new(
            SignalStatus::Downtrend,
            0.8,
            "(Downtrend, buy less)",
            Condition::all(vec![
                Condition::PriceBelowSma200,
                Condition::MacdHistBelow { threshold: 0.0 },
            ]),
        ),
        Rule::fair(),
    ]
}

fn bollinger_rules() -> Vec<Rule> {
    vec![
        Rule::new(
            SignalStatus::SuperDiscount,
            1.5,
            "(Below the lower band)",
            Condition::PriceBelowLowerBand,
        ),
        Rule::fair(),
    ]
}

fn rsi_rules() -> Vec<Rule> {
    vec![
        Rule::new(
            SignalStatus::Oversold,
            1.5,
            "(RSI oversold)",
            Condition::rsi_below(30.0),
        ),
        Rule::new(
            SignalStatus::Overbought,
            0.5,
            "(RSI overbought)",
            Condition::rsi_above(70.0),
        ),
        Rule::fair(),
    ]
}
