//! Subcommand handlers.

use crate::ConfigAction;
use crate::RunArgs;
use citeharvest_core::config::WORKSPACE_CONFIG_FILE;
use citeharvest_core::{
    HarvestConfig, HarvestReport, Harvester, IdentifierOutcome, WriteOutcome, config_exists,
    load_config,
};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Run a harvest and print the end-of-run summary.
pub async fn handle_run(
    args: RunArgs,
    workspace: &Path,
    config_path: Option<&Path>,
    quiet: bool,
) -> anyhow::Result<()> {
    let mut config = load_config(Some(workspace), config_path)
        .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;
    apply_run_overrides(&mut config, &args);

    let identifiers = config.validate(workspace).map_err(|e| {
        if config_path.is_none() && !config_exists(Some(workspace)) {
            anyhow::anyhow!(
                "Configuration error: {} (no config file found; run `citeharvest config init`)",
                e
            )
        } else {
            anyhow::anyhow!("Configuration error: {}", e)
        }
    })?;
    let harvester = Harvester::from_config(&config)?;

    if !quiet {
        println!("Processing {} identifier(s)", identifiers.len());
    }

    let report = harvester.run(&identifiers).await;

    let output = resolve(workspace, &config.run.output);
    let outcome = report.table.write_to_path(&output)?;

    if let Some(summary_path) = &config.run.summary {
        let summary_path = resolve(workspace, summary_path);
        if let Err(e) = report.summary.write_json(&summary_path) {
            tracing::warn!(path = %summary_path.display(), error = %e, "Failed to write run summary");
        }
    }

    print!("{}", render_summary(&report, &outcome));
    Ok(())
}

/// Handle `config` subcommands.
pub fn handle_config(
    action: ConfigAction,
    workspace: &Path,
    config_path: Option<&Path>,
) -> anyhow::Result<()> {
    match action {
        ConfigAction::Init => {
            let path = workspace.join(WORKSPACE_CONFIG_FILE);
            if path.exists() {
                println!("Configuration file already exists at: {}", path.display());
                return Ok(());
            }
            let toml_str = toml::to_string_pretty(&HarvestConfig::default())?;
            std::fs::write(&path, &toml_str)?;
            println!("Created default configuration at: {}", path.display());
            Ok(())
        }
        ConfigAction::Show => {
            let config = load_config(Some(workspace), config_path)
                .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
            let toml_str = toml::to_string_pretty(&config.redacted())?;
            println!("{}", toml_str);
            Ok(())
        }
    }
}

fn apply_run_overrides(config: &mut HarvestConfig, args: &RunArgs) {
    if !args.identifiers.is_empty() {
        config.run.identifiers = args.identifiers.clone();
        config.run.identifiers_file = None;
    }
    if let Some(output) = &args.output {
        config.run.output = output.clone();
    }
    if let Some(max) = args.max_results {
        config.search.max_results = Some(max);
    }
    if let Some(summary) = &args.summary {
        config.run.summary = Some(summary.clone());
    }
}

fn resolve(workspace: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        workspace.join(path)
    }
}

/// Human-readable end-of-run report.
fn render_summary(report: &HarvestReport, outcome: &WriteOutcome) -> String {
    let mut out = String::new();
    match outcome {
        WriteOutcome::Written { path, rows } => {
            let _ = writeln!(out, "\nSUCCESS!");
            let _ = writeln!(
                out,
                "{} total citing articles written to {}",
                rows,
                path.display()
            );
            let _ = writeln!(out, "\nSummary by DOI:");
            for count in &report.summary.counts {
                let _ = writeln!(
                    out,
                    "   {}: {} citing articles",
                    count.identifier, count.count
                );
            }
        }
        WriteOutcome::SkippedEmpty => {
            let _ = writeln!(out, "\nNo citing articles found for any DOIs.");
        }
    }

    let skipped: Vec<_> = report.summary.skipped().collect();
    if !skipped.is_empty() {
        let _ = writeln!(out, "\nSkipped ({}):", skipped.len());
        for entry in skipped {
            if let IdentifierOutcome::Skipped { stage, reason } = &entry.outcome {
                let _ = writeln!(out, "   {} [{}]: {}", entry.identifier, stage, reason);
            }
        }
    }
    out
}
