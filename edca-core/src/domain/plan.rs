//! FundPlan: one recurring DCA contribution target.

use serde::{Deserialize, Serialize};

/// A single instrument in the DCA plan with its base contribution.
///
/// `base_budget` is a currency amount and must be positive; the runner's
/// config layer validates this before any evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundPlan {
    /// Ticker passed to the data provider (e.g. "SPY").
    pub symbol: String,
    /// Name shown in reports (e.g. "S&P 500 (SPY)").
    pub display_name: String,
    pub base_budget: f64,
}

impl FundPlan {
    pub fn new(symbol: impl Into<String>, display_name: impl Into<String>, base_budget: f64) -> Self {
        Self {
            symbol: symbol.into(),
            display_name: display_name.into(),
            base_budget,
        }
    }

    /// True when the budget is a finite, strictly positive amount.
    pub fn has_valid_budget(&self) -> bool {
        self.base_budget.is_finite() && self.base_budget > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_validation() {
        assert!(FundPlan::new("SPY", "S&P 500", 1000.0).has_valid_budget());
        assert!(!FundPlan::new("SPY", "S&P 500", 0.0).has_valid_budget());
        assert!(!FundPlan::new("SPY", "S&P 500", -5.0).has_valid_budget());
        assert!(!FundPlan::new("SPY", "S&P 500", f64::NAN).has_valid_budget());
    }
}
