mod cli;

use dashladder::config::{self, RunConfig};
use dashladder::driver::{self, RunReport};
use dashladder::logging;
use dashladder_av::{ToolPaths, ToolRegistry};

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    logging::init(cli.verbose, cli.debug);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("ERROR: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = config::load_config_or_default(cli.config.as_deref())?;

    if cli.check_tools {
        return check_tools(&config.tools);
    }

    let run_config = RunConfig::resolve(&config, cli.overrides())?;

    let rt = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    let report = rt.block_on(async {
        let cancel = CancellationToken::new();
        let interrupt = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted, stopping encoders");
                interrupt.cancel();
            }
        });

        driver::run(&run_config, cancel).await
    })?;

    if run_config.dry_run {
        return print_plan(&report, cli.json);
    }

    for rung in report.failures().skip(1) {
        if let Some(ref error) = rung.error {
            tracing::error!("rung {}: {}", rung.index, error);
        }
    }
    if let Some(message) = report.error_message() {
        anyhow::bail!(message);
    }

    if cli.verbose {
        for rung in &report.rungs {
            println!(
                "{} ({} @ {}kbps)",
                rung.output.display(),
                rung.resolution,
                rung.bitrate_kbps as u32
            );
        }
    }

    Ok(())
}

fn print_plan(report: &RunReport, json: bool) -> Result<()> {
    if json {
        let json_str = serde_json::to_string_pretty(report)?;
        println!("{}", json_str);
        return Ok(());
    }

    println!("Source: {}", report.source.display());
    println!("Resolution: {}", report.source_resolution);
    if let Some(fps) = report.frame_rate {
        println!("Frame rate: {:.3} fps", fps);
    }
    println!("Segment size: {} frames", report.segment_size_frames);
    println!("Audio bitrate: {}kbps", report.audio_bitrate_kbps);
    println!();
    for rung in &report.rungs {
        println!(
            "  [{}] {:>8.1}kbps  {:>9}  bpp {:.4}  -> {}",
            rung.index,
            rung.bitrate_kbps,
            rung.resolution.to_string(),
            rung.bits_per_pixel,
            rung.output.display()
        );
    }
    println!("\n[DRY RUN] Would encode {} rungs", report.rungs.len());

    Ok(())
}

fn check_tools(paths: &ToolPaths) -> Result<()> {
    println!("Checking external tools...\n");

    let tools = ToolRegistry::discover(paths).check_all();
    let mut all_ok = true;

    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version);
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
        Ok(())
    } else {
        anyhow::bail!("Some tools are missing");
    }
}
