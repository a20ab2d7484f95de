//! Report formatting, file output and shell completion.

use std::fmt::Write as _;
use std::io;
use std::time::Duration;

use clap::Command;
use clap_complete::{generate, Shell};

use crate::workload::{RunReport, StrategyReport};

/// Format a duration for display.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 0.001 {
        format!("{:.2}µs", secs * 1_000_000.0)
    } else if secs < 1.0 {
        format!("{:.2}ms", secs * 1000.0)
    } else if secs < 60.0 {
        format!("{secs:.3}s")
    } else {
        let mins = (secs / 60.0).floor() as u64;
        let remaining = secs - (mins as f64 * 60.0);
        format!("{mins}m{remaining:.1}s")
    }
}

/// Format a byte count with a binary unit.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_bytes(bytes: usize) -> String {
    const UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}

/// Format a number with thousand separators.
#[must_use]
pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

fn render_strategy(out: &mut String, report: &StrategyReport) {
    let _ = writeln!(out, "{}:", report.strategy.name());
    let _ = writeln!(out, "  time          {}", format_duration(report.elapsed));
    let _ = writeln!(out, "  CG steps      {}", format_number(report.total_steps as u64));
    let _ = writeln!(out, "  max residual  {:.3e}", report.max_residual);
    let _ = writeln!(out, "  allocations   {}", format_number(report.allocations));
    let _ = writeln!(out, "  peak memory   {}", format_bytes(report.peak_memory));
    if let Some(pool) = &report.pool {
        let _ = writeln!(
            out,
            "  pool          {} entries ({} in use), {}",
            pool.entries,
            pool.in_use,
            format_bytes(pool.bytes)
        );
        let _ = writeln!(
            out,
            "  reuse         {} hits, {} constructed ({:.1}% hit rate)",
            format_number(pool.stats.reused),
            format_number(pool.stats.constructed),
            pool.stats.reuse_ratio() * 100.0
        );
    }
}

/// Render a run report as human-readable text.
#[must_use]
pub fn render_report(report: &RunReport) -> String {
    let workload = &report.workload;
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} solves of size {} on {} thread(s){}",
        workload.solves,
        workload.size,
        workload.threads,
        if workload.nested { ", nested" } else { "" }
    );
    for strategy in &report.strategies {
        render_strategy(&mut out, strategy);
    }
    if let [direct, pooled] = report.strategies.as_slice() {
        let pooled_secs = pooled.elapsed.as_secs_f64().max(f64::EPSILON);
        let ratio = direct.elapsed.as_secs_f64() / pooled_secs;
        let _ = writeln!(out, "pooled speedup: {ratio:.2}x");
    }
    if let Some(trimmed) = report.trimmed {
        let _ = writeln!(out, "trimmed {trimmed} unused pooled vector(s)");
    }
    out
}

/// Render a run report as pretty-printed JSON.
pub fn render_json(report: &RunReport) -> serde_json::Result<String> {
    let mut json = serde_json::to_string_pretty(report)?;
    json.push('\n');
    Ok(json)
}

/// Write a rendered report to a file.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be created or written.
pub fn write_to_file(path: &str, contents: &str) -> io::Result<()> {
    std::fs::write(path, contents)
}

/// Generate shell completion script.
pub fn generate_completion(cmd: &mut Command, shell: Shell, out: &mut dyn io::Write) {
    generate(shell, cmd, "vecpool", out);
}
