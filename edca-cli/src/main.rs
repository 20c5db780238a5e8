//! EDCA CLI: daily signal batch, single-symbol inspection and rule tables.
//!
//! Commands:
//! - `run` evaluates every configured plan and sends the report
//! - `signal` evaluates one symbol and prints its snapshot
//! - `rules` prints a rule table in priority order
//! - `check-config` loads and validates a config file
//!
//! Exit codes: 0 success, 1 fatal error, 2 no plan produced a signal,
//! 3 the notification could not be delivered.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use edca_core::classifier::{RuleSet, RuleTable, SignalClassifier};
use edca_core::domain::FundPlan;
use edca_core::engine::{IndicatorEngine, IndicatorSnapshot};
use edca_runner::{
    deliver, gateway_for, provider_for, run_batch, AppConfig, Evaluator, ProviderConfig,
    ProviderKind, ReportStyle,
};

const EXIT_FATAL: u8 = 1;

const DEFAULT_CONFIG: &str = "edca.toml";

#[derive(Parser)]
#[command(name = "edca", about = "EDCA: enhanced dollar-cost averaging signals", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate every plan and deliver the report.
    Run {
        /// TOML config file. Built-in defaults are used if it does not exist.
        #[arg(long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,

        /// Print the report instead of sending it.
        #[arg(long, default_value_t = false)]
        dry_run: bool,

        /// Evaluation date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        as_of: Option<String>,

        /// Also write the run report as JSON.
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// Evaluate a single symbol and print its indicator snapshot.
    Signal {
        symbol: String,

        /// Base budget for the invest amount.
        #[arg(long, default_value_t = 1000.0)]
        budget: f64,

        /// Rule table: structural, sniper, bollinger, rsi.
        #[arg(long, default_value = "structural")]
        rule_set: RuleSet,

        #[arg(long, value_enum, default_value_t = ProviderArg::Yahoo)]
        provider: ProviderArg,

        /// Directory of <SYMBOL>.csv files for `--provider csv`.
        #[arg(long, default_value = "data")]
        csv_dir: PathBuf,

        /// Evaluation date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        as_of: Option<String>,
    },
    /// Print a rule table in priority order.
    Rules {
        #[arg(long, default_value = "structural")]
        rule_set: RuleSet,
    },
    /// Load and validate a config file, then list its plans.
    CheckConfig {
        #[arg(long, default_value = DEFAULT_CONFIG)]
        config: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ProviderArg {
    Yahoo,
    Csv,
    Synthetic,
}

impl From<ProviderArg> for ProviderKind {
    fn from(arg: ProviderArg) -> Self {
        match arg {
            ProviderArg::Yahoo => ProviderKind::Yahoo,
            ProviderArg::Csv => ProviderKind::Csv,
            ProviderArg::Synthetic => ProviderKind::Synthetic,
        }
    }
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let outcome = match cli.command {
        Commands::Run {
            config,
            dry_run,
            as_of,
            json,
        } => run_cmd(&config, dry_run, as_of.as_deref(), json.as_deref()),
        Commands::Signal {
            symbol,
            budget,
            rule_set,
            provider,
            csv_dir,
            as_of,
        } => signal_cmd(&symbol, budget, rule_set, provider, csv_dir, as_of.as_deref()),
        Commands::Rules { rule_set } => rules_cmd(rule_set),
        Commands::CheckConfig { config } => check_config_cmd(&config),
    };

    match outcome {
        Ok(code) => code,
        Err(err) => {
            error!("{err:#}");
            ExitCode::from(EXIT_FATAL)
        }
    }
}

fn parse_as_of(as_of: Option<&str>) -> Result<NaiveDate> {
    match as_of {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .with_context(|| format!("invalid --as-of '{s}', expected YYYY-MM-DD")),
        None => Ok(chrono::Local::now().date_naive()),
    }
}

fn load_config(path: &Path) -> Result<AppConfig> {
    if path.exists() {
        let config = AppConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?;
        info!(path = %path.display(), plans = config.plans.len(), "config loaded");
        Ok(config)
    } else {
        warn!(path = %path.display(), "config file not found, using built-in defaults");
        Ok(AppConfig::default())
    }
}

fn run_cmd(config_path: &Path, dry_run: bool, as_of: Option<&str>, json: Option<&Path>) -> Result<ExitCode> {
    let as_of = parse_as_of(as_of)?;
    let config = load_config(config_path)?;

    // Credentials are checked before any data is fetched
    let gateway = gateway_for(&config.notify, dry_run)?;
    let provider = provider_for(&config.provider)?;
    if !provider.is_available() {
        warn!(provider = provider.name(), "provider reports unavailable, trying anyway");
    }

    let report = run_batch(&config, provider.as_ref(), as_of)?;

    if let Some(path) = json {
        let body = serde_json::to_string_pretty(&report)?;
        std::fs::write(path, body).with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), "report written");
    }

    let style = ReportStyle::from_config(&config.notify, &config.currency);
    let outcome = deliver(&report, &style, gateway.as_ref());
    Ok(ExitCode::from(outcome.exit_code()))
}

fn signal_cmd(
    symbol: &str,
    budget: f64,
    rule_set: RuleSet,
    provider: ProviderArg,
    csv_dir: PathBuf,
    as_of: Option<&str>,
) -> Result<ExitCode> {
    if rule_set == RuleSet::Custom {
        bail!("custom rule tables come from a config file; use `edca run --config`");
    }
    let plan = FundPlan::new(symbol, symbol, budget);
    if !plan.has_valid_budget() {
        bail!("--budget must be a positive number, got {budget}");
    }
    let as_of = parse_as_of(as_of)?;

    let defaults = AppConfig::default();
    let provider = provider_for(&ProviderConfig {
        kind: provider.into(),
        csv_dir,
        ..ProviderConfig::default()
    })?;
    let evaluator = Evaluator::new(
        IndicatorEngine::new(defaults.engine.clone())?,
        SignalClassifier::new(RuleTable::preset(rule_set)?),
        defaults.lookback_days,
    );

    let eval = evaluator.evaluate(provider.as_ref(), &plan, as_of)?;
    print_snapshot(&eval.snapshot);

    let r = &eval.result;
    println!();
    println!("--- Signal ({rule_set}, rule #{}) ---", eval.rule_index + 1);
    println!("Source:         {:?} ({} bars)", eval.source, eval.bar_count);
    println!("Status:         {} {}", r.status.icon(), r.status);
    if !r.note.is_empty() {
        println!("Note:           {}", r.note);
    }
    println!("Multiplier:     {:.2}x", r.multiplier);
    println!("Invest:         {:.2} (base {:.2})", r.invest_amount, r.base_budget);
    Ok(ExitCode::SUCCESS)
}

fn opt(value: Option<f64>, decimals: usize) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.decimals$}"))
}

fn print_snapshot(s: &IndicatorSnapshot) {
    println!("=== {} ===", s.date);
    println!("Close:          {:.2}", s.close);
    println!("RSI(14):        {}", opt(s.rsi, 1));
    println!("SMA20:          {}", opt(s.sma20, 2));
    println!("Bands:          {} / {}", opt(s.lower_band, 2), opt(s.upper_band, 2));
    println!("MACD:           {} (signal {}, hist {})", opt(s.macd_line, 3), opt(s.signal_line, 3), opt(s.macd_hist, 3));
    println!("SMA200:         {}", opt(s.sma200, 2));
    println!("Swing high:     {}", opt(s.swing_high, 2));
    println!("Swing low:      {}", opt(s.swing_low, 2));
    println!("Structure:      {}", s.structure_trend);
}

fn print_table(table: &RuleTable) {
    println!("{:<3} {:<18} {:>6}  Condition", "#", "Status", "Mult");
    println!("{}", "-".repeat(60));
    for (i, rule) in table.rules().iter().enumerate() {
        println!(
            "{:<3} {:<18} {:>5.2}x  {}",
            i + 1,
            rule.status.label(),
            rule.multiplier,
            rule.condition
        );
    }
}

fn rules_cmd(rule_set: RuleSet) -> Result<ExitCode> {
    if rule_set == RuleSet::Custom {
        bail!("custom rule tables come from a config file; use `edca check-config`");
    }
    println!("Rule set: {rule_set}");
    print_table(&RuleTable::preset(rule_set)?);
    Ok(ExitCode::SUCCESS)
}

fn check_config_cmd(path: &Path) -> Result<ExitCode> {
    if !path.exists() {
        bail!("config file not found: {}", path.display());
    }
    let config = AppConfig::from_file(path).with_context(|| format!("loading {}", path.display()))?;

    println!("Config OK: {}", path.display());
    println!("Provider:       {:?}", config.provider.kind);
    println!("Notify:         {:?}", config.notify.kind);
    println!("Lookback:       {} days", config.lookback_days);
    println!("Rule set:       {}", config.rule_set);
    println!();
    println!("{:<8} {:<28} {:>12}", "Symbol", "Name", "Budget");
    println!("{}", "-".repeat(50));
    for plan in &config.plans {
        println!(
            "{:<8} {:<28} {:>12}",
            plan.symbol,
            plan.display_name,
            format!("{} {}", edca_runner::format_thousands(plan.base_budget), config.currency)
        );
    }
    println!();
    print_table(&config.rule_table()?);
    Ok(ExitCode::SUCCESS)
}
