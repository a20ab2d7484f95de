//! Application entry point and dispatch.

use anyhow::{Context, Result};

use crate::config::AppConfig;
use crate::output::{generate_completion, render_json, render_report, write_to_file};
use crate::workload::run_all;

/// Run the application.
pub fn run(config: &AppConfig) -> Result<()> {
    // Handle shell completion
    if let Some(shell) = config.completion {
        let mut cmd = <AppConfig as clap::CommandFactory>::command();
        generate_completion(&mut cmd, shell, &mut std::io::stdout());
        return Ok(());
    }

    let report = run_all(config)?;
    let rendered = if config.json {
        render_json(&report)?
    } else {
        render_report(&report)
    };

    if !config.quiet {
        print!("{rendered}");
    }

    // Write to file if requested
    if let Some(ref path) = config.output {
        write_to_file(path, &rendered).with_context(|| format!("failed to write {path}"))?;
    }

    Ok(())
}
