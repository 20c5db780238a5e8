//! Application configuration: TOML file plus credentials from the environment.
//!
//! Every field has a default, so an empty file (or no file at all) yields the
//! two-fund SPY/QQQM plan with the structural rule table and Yahoo data.

use std::env;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use edca_core::classifier::{Rule, RuleSet, RuleTable, RuleTableError};
use edca_core::domain::FundPlan;
use edca_core::engine::{EngineError, EngineParams};

/// Environment variable holding the LINE channel access token.
pub const LINE_TOKEN_VAR: &str = "LINE_ACCESS_TOKEN";
/// Environment variable holding the LINE recipient user ID.
pub const LINE_USER_VAR: &str = "LINE_USER_ID";

/// Upper bound on `lookback_days`, roughly a century of calendar days.
pub const MAX_LOOKBACK_DAYS: u32 = 36_500;

/// Errors from loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(String),
    #[error("invalid config: {0}")]
    Invalid(String),
    #[error("missing credential: environment variable {0} is not set")]
    MissingCredential(&'static str),
    #[error("invalid rule table: {0}")]
    Rules(#[from] RuleTableError),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Where bars come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    #[default]
    Yahoo,
    Csv,
    Synthetic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    /// Directory of `<SYMBOL>.csv` files for `kind = "csv"`.
    pub csv_dir: PathBuf,
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::Yahoo,
            csv_dir: PathBuf::from("data"),
            timeout_secs: 30,
        }
    }
}

/// Where the report goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifyKind {
    #[default]
    Line,
    Stdout,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    pub kind: NotifyKind,
    pub title: String,
    /// Optional second header line.
    pub subtitle: Option<String>,
    pub timeout_secs: u64,
    /// Include the structure trend in each plan block.
    pub show_trend: bool,
    /// List plans that could not be evaluated.
    pub show_failures: bool,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            kind: NotifyKind::Line,
            title: "[Jarvis Sniper Port]".to_string(),
            subtitle: Some("Focus: Growth (SPY/QQQM)".to_string()),
            timeout_secs: 15,
            show_trend: true,
            show_failures: true,
        }
    }
}

/// Top-level configuration, built once at startup and passed by reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub currency: String,
    /// Calendar days of history requested per plan.
    pub lookback_days: u32,
    /// Evaluate plans on the rayon pool.
    pub parallel: bool,
    pub rule_set: RuleSet,
    pub engine: EngineParams,
    pub provider: ProviderConfig,
    pub notify: NotifyConfig,
    pub plans: Vec<FundPlan>,
    /// Only read when `rule_set = "custom"`.
    pub rules: Vec<Rule>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            currency: "THB".to_string(),
            lookback_days: 365,
            parallel: true,
            rule_set: RuleSet::Structural,
            engine: EngineParams::default(),
            provider: ProviderConfig::default(),
            notify: NotifyConfig::default(),
            plans: vec![
                FundPlan::new("SPY", "S&P 500 (SPY)", 1000.0),
                FundPlan::new("QQQM", "Nasdaq 100 (QQQM)", 1000.0),
            ],
            rules: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Load and validate a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.plans.is_empty() {
            return Err(ConfigError::Invalid("at least one [[plans]] entry is required".into()));
        }
        for plan in &self.plans {
            if plan.symbol.trim().is_empty() {
                return Err(ConfigError::Invalid("plan with empty symbol".into()));
            }
            if !plan.has_valid_budget() {
                return Err(ConfigError::Invalid(format!(
                    "plan '{}': base_budget must be a positive number, got {}",
                    plan.symbol, plan.base_budget
                )));
            }
        }
        if self.lookback_days == 0 || self.lookback_days > MAX_LOOKBACK_DAYS {
            return Err(ConfigError::Invalid(format!(
                "lookback_days must be in 1..={MAX_LOOKBACK_DAYS}, got {}",
                self.lookback_days
            )));
        }
        self.engine.validate()?;
        self.rule_table()?;
        Ok(())
    }

    /// The rule table this configuration selects.
    pub fn rule_table(&self) -> Result<RuleTable, ConfigError> {
        let table = match self.rule_set {
            RuleSet::Custom => RuleTable::new(self.rules.clone())?,
            preset => RuleTable::preset(preset)?,
        };
        Ok(table)
    }

    /// Short deterministic identifier of this configuration on `as_of`.
    ///
    /// Two runs with identical settings on the same day share the id, which
    /// makes repeated sends easy to spot in logs.
    pub fn run_id(&self, as_of: NaiveDate) -> String {
        let mut hasher = blake3::Hasher::new();
        // Serializing plain data structs cannot fail
        let json = serde_json::to_string(self).unwrap_or_default();
        hasher.update(json.as_bytes());
        hasher.update(as_of.to_string().as_bytes());
        hasher.finalize().to_hex()[..12].to_string()
    }
}

/// LINE Messaging API credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct LineCredentials {
    pub access_token: String,
    pub user_id: String,
}

impl std::fmt::Debug for LineCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineCredentials")
            .field("access_token", &"<redacted>")
            .field("user_id", &self.user_id)
            .finish()
    }
}

fn env_nonempty(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

impl LineCredentials {
    /// Read both credentials from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_nonempty)
    }

    /// Read credentials through an arbitrary lookup (tests use a map).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let access_token = lookup(LINE_TOKEN_VAR).ok_or(ConfigError::MissingCredential(LINE_TOKEN_VAR))?;
        let user_id = lookup(LINE_USER_VAR).ok_or(ConfigError::MissingCredential(LINE_USER_VAR))?;
        Ok(Self { access_token, user_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edca_core::classifier::SignalStatus;
    use edca_core::structure::SwingMode;
    use std::collections::HashMap;

    const FULL: &str = r#"
currency = "USD"
lookback_days = 400
parallel = false
rule_set = "custom"

[engine]
swing_window = 3
swing_mode = "confirmed"

[provider]
kind = "csv"
csv_dir = "fixtures"

[notify]
kind = "stdout"
title = "[Test]"

[[plans]]
symbol = "SPY"
display_name = "S&P 500 (SPY)"
base_budget = 1500.0

[[rules]]
status = "oversold"
multiplier = 1.5
note = "Panic buy"
condition = { kind = "rsi_below", threshold = 30.0 }

[[rules]]
status = "fair"
multiplier = 1.0
condition = { kind = "always" }
"#;

    #[test]
    fn empty_file_gives_defaults() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.plans.len(), 2);
        assert_eq!(config.rule_table().unwrap(), RuleTable::default());
    }

    #[test]
    fn parses_full_file() {
        let config = AppConfig::from_toml(FULL).unwrap();
        assert_eq!(config.currency, "USD");
        assert_eq!(config.lookback_days, 400);
        assert!(!config.parallel);
        assert_eq!(config.engine.swing_window, 3);
        assert_eq!(config.engine.swing_mode, SwingMode::Confirmed);
        assert_eq!(config.engine.rsi_period, 14);
        assert_eq!(config.provider.kind, ProviderKind::Csv);
        assert_eq!(config.provider.csv_dir, PathBuf::from("fixtures"));
        assert_eq!(config.notify.kind, NotifyKind::Stdout);
        assert_eq!(config.plans[0].base_budget, 1500.0);

        let table = config.rule_table().unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.rules()[0].status, SignalStatus::Oversold);
    }

    #[test]
    fn custom_without_rules_is_rejected() {
        let err = AppConfig::from_toml("rule_set = \"custom\"").unwrap_err();
        assert!(matches!(err, ConfigError::Rules(RuleTableError::Empty)));
    }

    #[test]
    fn rejects_non_positive_budget() {
        let toml = r#"
[[plans]]
symbol = "SPY"
display_name = "SPY"
base_budget = 0.0
"#;
        assert!(matches!(AppConfig::from_toml(toml), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn rejects_empty_plans_and_zero_lookback() {
        let mut config = AppConfig::default();
        config.plans.clear();
        assert!(config.validate().is_err());

        let config = AppConfig {
            lookback_days: 0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn parse_error_is_reported() {
        assert!(matches!(AppConfig::from_toml("lookback_days = \"x\""), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn huge_lookback_is_rejected() {
        let err = AppConfig::from_toml("lookback_days = 200000000\nparallel = false").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("lookback_days")));

        let config = AppConfig::from_toml(&format!("lookback_days = {MAX_LOOKBACK_DAYS}")).unwrap();
        assert_eq!(config.lookback_days, MAX_LOOKBACK_DAYS);
    }

    #[test]
    fn zero_engine_period_is_an_engine_error() {
        let err = AppConfig::from_toml("[engine]\nrsi_period = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Engine(EngineError::InvalidParams(_))));
    }

    #[test]
    fn report_sections_can_be_hidden() {
        let config = AppConfig::from_toml("[notify]\nshow_trend = false\nshow_failures = false").unwrap();
        assert!(!config.notify.show_trend);
        assert!(!config.notify.show_failures);
        assert!(AppConfig::default().notify.show_trend);
        assert!(AppConfig::default().notify.show_failures);
    }

    #[test]
    fn run_id_deterministic_and_sensitive() {
        let as_of = NaiveDate::from_ymd_opt(2024, 6, 28).unwrap();
        let config = AppConfig::default();
        assert_eq!(config.run_id(as_of), config.run_id(as_of));
        assert_eq!(config.run_id(as_of).len(), 12);

        let other = AppConfig {
            rule_set: RuleSet::Sniper,
            ..AppConfig::default()
        };
        assert_ne!(config.run_id(as_of), other.run_id(as_of));
        assert_ne!(config.run_id(as_of), config.run_id(as_of.succ_opt().unwrap()));
    }

    #[test]
    fn credentials_from_lookup() {
        let vars: HashMap<&str, &str> = [(LINE_TOKEN_VAR, "tok"), (LINE_USER_VAR, "U123")].into();
        let creds = LineCredentials::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(creds.user_id, "U123");
        assert!(!format!("{creds:?}").contains("tok"));

        let err = LineCredentials::from_lookup(|k| (k == LINE_TOKEN_VAR).then(|| "tok".to_string())).unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredential(LINE_USER_VAR)));
    }
}
