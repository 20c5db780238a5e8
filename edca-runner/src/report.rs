//! Push-message rendering.
//!
//! Layout (one block per result):
//!
//! ```text
//! 🚀 [Jarvis Sniper Port]
//! Focus: Growth (SPY/QQQM)
//!
//! 📌 S&P 500 (SPY)
//! Stat: 🔥 Super Discount (Bullish)
//! Note: (Panic buy! Very cheap)
//! Price: $512.34 (RSI: 28)
//! 💰 Invest: 1,500 THB
//!
//! ━━━━━━━━━━
//! 💸 Total Today: 2,700 THB
//! ```
//!
//! Amounts are rounded only here, for display.

use std::fmt::Write;

use crate::config::NotifyConfig;
use crate::runner::RunReport;

const SEPARATOR: &str = "━━━━━━━━━━";

/// Presentation settings for `format_report`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportStyle {
    pub title: String,
    pub subtitle: Option<String>,
    pub currency: String,
    /// Append the structure trend to the status line.
    pub show_trend: bool,
    /// List skipped plans under the results.
    pub show_failures: bool,
}

impl ReportStyle {
    pub fn from_config(notify: &NotifyConfig, currency: &str) -> Self {
        Self {
            title: notify.title.clone(),
            subtitle: notify.subtitle.clone(),
            currency: currency.to_string(),
            show_trend: notify.show_trend,
            show_failures: notify.show_failures,
        }
    }
}

impl Default for ReportStyle {
    fn default() -> Self {
        Self::from_config(&NotifyConfig::default(), "THB")
    }
}

/// Format `value` with no decimals and comma thousands separators.
pub fn format_thousands(value: f64) -> String {
    let rounded = format!("{value:.0}");
    let (sign, digits) = match rounded.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", rounded.as_str()),
    };
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if out == "0" {
        // `-0` after rounding a small negative
        return out;
    }
    format!("{sign}{out}")
}

/// Render the report as a plain-text push message.
pub fn format_report(report: &RunReport, style: &ReportStyle) -> String {
    let mut msg = String::new();
    // Writing into a String cannot fail
    let _ = writeln!(msg, "🚀 {}", style.title);
    if let Some(subtitle) = &style.subtitle {
        let _ = writeln!(msg, "{subtitle}");
    }

    for r in &report.results {
        let _ = writeln!(msg);
        let _ = writeln!(msg, "📌 {}", r.display_name);
        if style.show_trend {
            let _ = writeln!(msg, "Stat: {} {} ({})", r.status.icon(), r.status, r.structure_trend);
        } else {
            let _ = writeln!(msg, "Stat: {} {}", r.status.icon(), r.status);
        }
        if !r.note.is_empty() {
            let _ = writeln!(msg, "Note: {}", r.note);
        }
        let rsi = r.rsi.map_or_else(|| "n/a".to_string(), |v| format!("{v:.0}"));
        let _ = writeln!(msg, "Price: ${:.2} (RSI: {rsi})", r.price);
        let _ = writeln!(msg, "💰 Invest: {} {}", format_thousands(r.invest_amount), style.currency);
    }

    if style.show_failures && !report.failures.is_empty() {
        let _ = writeln!(msg);
        for f in &report.failures {
            let _ = writeln!(msg, "❌ {}: {}", f.display_name, f.message);
        }
    }

    let _ = writeln!(msg);
    let _ = writeln!(msg, "{SEPARATOR}");
    let _ = write!(
        msg,
        "💸 Total Today: {} {}",
        format_thousands(report.total_invest()),
        style.currency
    );
    msg
}
