//! Console formatting shared by the commands.

use std::path::Path;

use anyhow::{Context, Result};
use owo_colors::OwoColorize;

const RULE_WIDTH: usize = 60;

pub fn rule_line() -> String {
    "=".repeat(RULE_WIDTH)
}

pub fn rule() {
    println!("{}", rule_line());
}

pub fn banner(title: &str) {
    rule();
    println!("{}", title.bold());
    rule();
}

pub fn step(message: &str) {
    println!("{} {message}", "→".bright_blue());
}

pub fn done(message: &str) {
    println!("   {} {message}", "✓".bright_green());
}

/// File size in MiB.
#[allow(clippy::cast_precision_loss)]
pub fn file_size_mb(path: &Path) -> Result<f64> {
    let bytes = std::fs::metadata(path)
        .with_context(|| format!("cannot stat {}", path.display()))?
        .len();
    Ok(bytes as f64 / 1024.0 / 1024.0)
}

/// `1234567` as `1,234,567`.
pub fn thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
