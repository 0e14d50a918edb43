//! polyfill-catalog - parallel polyfill catalog builder
//!
//! Entry point for the CLI application.

use anyhow::{Context, Result};
use clap::Parser;
use polyfill_catalog::config::{BuildConfig, CliArgs};
use polyfill_catalog::progress::{print_header, print_summary, ProgressReporter};
use polyfill_catalog::BuildCoordinator;
use std::process::ExitCode;
use std::sync::atomic::Ordering;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    // Parse CLI arguments
    let args = CliArgs::parse();

    // Setup logging
    setup_logging(args.verbose)?;

    // Validate and create config
    let config = BuildConfig::from_args(args).context("Invalid configuration")?;

    // Print header
    if config.show_progress {
        print_header(&config.source_root, config.worker_count, &config.output_root);
    }

    let show_progress = config.show_progress;
    let coordinator = BuildCoordinator::new(config);

    // Setup signal handler for graceful shutdown
    let cancel_flag = coordinator.cancel_flag();
    ctrlc::set_handler(move || {
        eprintln!("\nInterrupt received, stopping workers...");
        cancel_flag.store(true, Ordering::SeqCst);
    })
    .context("Failed to set signal handler")?;

    // Create progress reporter
    let progress = show_progress.then(ProgressReporter::new);

    if let Some(ref p) = progress {
        p.set_status("Discovering modules...");
    }

    // Run the build
    let reporter = progress.clone();
    let result = coordinator.run_with_progress(move |update| {
        if let Some(ref p) = reporter {
            p.update(update);
        }
    });

    let result = match result {
        Ok(result) => result,
        Err(e) => {
            if let Some(ref p) = progress {
                p.finish("Build failed");
            }
            return Err(e).context("Catalog build failed");
        }
    };

    // Finish progress
    if let Some(ref p) = progress {
        p.finish_and_clear();
        print_summary(&result);
    }

    info!(
        modules = result.modules.len(),
        output = %result.output_root.display(),
        "Catalog written"
    );

    Ok(())
}

fn setup_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("polyfill_catalog=debug,warn")
    } else {
        EnvFilter::new("polyfill_catalog=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    Ok(())
}
