use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, Write};
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

use sweep::cli::{exit_code, Cli};
use sweep::scan::{CancelToken, ConsoleReporter, ScanEngine};

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let engine = ScanEngine::default();
    if cli.list {
        let mut stdout = io::stdout().lock();
        for algorithm in engine.registry().algorithms() {
            writeln!(stdout, "{:<10} {} bits", algorithm.name(), algorithm.output_bits())?;
        }
        return Ok(ExitCode::SUCCESS);
    }

    let file_config = cli.load_file_config()?;
    let config = cli.to_scan_config(file_config);

    // Set up interrupt handling
    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    ctrlc::set_handler(move || {
        eprintln!("\nInterrupt received, shutting down...");
        handler_token.cancel();
    })
    .context("Failed to set signal handler")?;

    let mut reporter = ConsoleReporter::stdio()
        .with_full_paths(cli.full_paths)
        .with_records(!cli.json);
    let report = engine
        .scan(&config, &mut reporter, &cancel)
        .context("Scan failed")?;

    if cli.json {
        let mut stdout = io::stdout().lock();
        serde_json::to_writer_pretty(&mut stdout, &report).context("Failed to write JSON report")?;
        writeln!(stdout)?;
    }

    info!(
        hashed = report.stats.files_hashed,
        failed = report.stats.files_failed,
        size = %humansize::format_size(report.stats.bytes_hashed, humansize::BINARY),
        elapsed_secs = report.stats.duration.as_secs_f64(),
        "done"
    );

    Ok(ExitCode::from(exit_code(&report, cli.strict)))
}

fn setup_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("sweep=debug,warn")
    } else {
        EnvFilter::new("sweep=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}
