mod cli;

use hlsaux::{
    config,
    pipeline::{self, CaptionJob, CaptionSource, RunReport},
};
use hlsaux_av::{PacketProbe, ToolRegistry};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "hlsaux=trace,hlsaux_av=trace,hlsaux_media=trace".to_string()
        } else {
            "hlsaux=debug,hlsaux_av=debug,hlsaux_media=debug".to_string()
        }
    });

    // Logs go to stderr so `--json` output stays parseable.
    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Iframes { playlist, json } => {
            let config = config::load_config_or_default(cli.config.as_deref())?;
            let rt = tokio::runtime::Runtime::new()?;
            let report = rt.block_on(run_iframes(&playlist, &config))?;
            finish(&report, json)
        }
        Commands::Captions {
            input,
            name,
            output_dir,
            segment_duration,
            grace_ms,
            json,
        } => {
            let mut config = config::load_config_or_default(cli.config.as_deref())?;
            if let Some(secs) = segment_duration {
                config.captions.segment_duration_secs = secs;
            }
            if let Some(ms) = grace_ms {
                config.captions.grace_ms = ms;
            }
            config.check()?;

            let job = CaptionJob {
                name,
                source: CaptionSource::from_arg(&input),
                output_dir,
            };
            let rt = tokio::runtime::Runtime::new()?;
            let report = rt.block_on(run_captions(vec![job], &config));
            // A blocking stdin read cannot be interrupted; don't wait for it.
            rt.shutdown_background();
            finish(&report, json)
        }
        Commands::Run {
            playlist,
            captions,
            json,
        } => {
            let config = config::load_config_or_default(cli.config.as_deref())?;
            let output_dir = match playlist.parent() {
                Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
                _ => PathBuf::from("."),
            };
            let jobs = captions
                .into_iter()
                .map(|(name, file)| CaptionJob {
                    name,
                    source: CaptionSource::from_arg(&file),
                    output_dir: output_dir.clone(),
                })
                .collect();

            let rt = tokio::runtime::Runtime::new()?;
            let report = rt.block_on(run_all(&playlist, jobs, &config));
            rt.shutdown_background();
            finish(&report?, json)
        }
        Commands::CheckTools => check_tools(cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("hlsaux {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Root cancellation token, cancelled on Ctrl-C.
fn shutdown_token() -> CancellationToken {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    tracing::warn!("Failed to listen for Ctrl-C: {}", e);
                    return;
                }
                tracing::warn!("Received Ctrl-C, cancelling run");
                token.cancel();
            }
            _ = token.cancelled() => {}
        }
    });
    cancel
}

fn packet_probe(config: &config::Config) -> Result<PacketProbe> {
    let registry = ToolRegistry::discover(&config.tools);
    PacketProbe::from_registry(&registry).context("I-frame playlists need ffprobe")
}

async fn run_iframes(playlist: &Path, config: &config::Config) -> Result<RunReport> {
    let probe = packet_probe(config)?;
    let cancel = shutdown_token();
    let units = pipeline::generate_iframe_playlists(playlist, config, probe, cancel.clone())
        .await
        .with_context(|| format!("Failed to process playlist: {:?}", playlist))?;
    cancel.cancel();

    let mut report = RunReport::default();
    report.extend(units);
    Ok(report)
}

async fn run_captions(jobs: Vec<CaptionJob>, config: &config::Config) -> RunReport {
    let cancel = shutdown_token();
    let units = pipeline::segment_caption_streams(
        jobs,
        &config.captions,
        config.max_parallel_units,
        cancel.clone(),
    )
    .await;
    cancel.cancel();

    let mut report = RunReport::default();
    report.extend(units);
    report
}

async fn run_all(
    playlist: &Path,
    jobs: Vec<CaptionJob>,
    config: &config::Config,
) -> Result<RunReport> {
    let probe = packet_probe(config)?;
    let cancel = shutdown_token();
    let report = pipeline::run_all(playlist, jobs, config, probe, cancel.clone()).await;
    cancel.cancel();
    Ok(report)
}

/// Print the report and turn unit failures into a non-zero exit.
fn finish(report: &RunReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        println!("{}", report);
    }

    let failed = report.units.iter().filter(|u| u.is_failed()).count();
    if failed > 0 {
        anyhow::bail!("{} of {} units failed", failed, report.units.len());
    }
    Ok(())
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    println!("Checking external tools...\n");

    let config = config::load_config_or_default(config_path)?;
    let tools = ToolRegistry::discover(&config.tools).check_all();
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
            print!(" ({})", version.lines().next().unwrap_or(""));
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Install them to generate I-frame playlists.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            config
        }
        None => {
            println!("No config file specified, using defaults");
            config::Config::default()
        }
    };

    println!("  Max parallel units: {}", config.max_parallel_units);
    println!(
        "  I-frames: padding {} bytes, suffix {:?}",
        config.iframes.packet_padding, config.iframes.playlist_suffix
    );
    println!(
        "  Captions: {}s windows, {}ms grace, .{} segments",
        config.captions.segment_duration_secs,
        config.captions.grace_ms,
        config.captions.segment_extension
    );

    let warnings = config.validate();
    if !warnings.is_empty() {
        println!("  Warnings:");
        for warning in &warnings {
            println!("    - {}", warning);
        }
    }

    Ok(())
}
