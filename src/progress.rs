//! Progress reporting for the catalog build
//!
//! Provides real-time progress display using indicatif progress bars.

use crate::build::{BuildProgress, BuildResult};
use console::style;
use humansize::{format_size, BINARY};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::time::Duration;

/// Progress reporter that displays build status
#[derive(Clone)]
pub struct ProgressReporter {
    /// Progress bar
    bar: ProgressBar,
}

impl ProgressReporter {
    /// Create a new progress reporter
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner();

        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .expect("Invalid progress template")
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );

        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Update the progress display
    pub fn update(&self, progress: &BuildProgress) {
        let msg = format!(
            "Modules: {}/{} | Built: {} | Inert: {} | Failed: {} | Rate: {:.0}/s",
            format_number(progress.completed as u64),
            format_number(progress.total as u64),
            format_number(progress.built as u64),
            format_number(progress.inert as u64),
            format_number(progress.failed as u64),
            progress.rate(),
        );

        self.bar.set_message(msg);
    }

    /// Set a status message
    pub fn set_status(&self, status: &str) {
        self.bar.set_message(status.to_string());
    }

    /// Finish the progress display with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }

    /// Finish and clear the progress display
    pub fn finish_and_clear(&self) {
        self.bar.finish_and_clear();
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Format a number with thousands separators
fn format_number(n: u64) -> String {
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

/// Print a summary of the build results
pub fn print_summary(result: &BuildResult) {
    let duration_secs = result.duration.as_secs_f64();

    println!();
    println!("{}", style("Catalog Complete").green().bold());
    println!("{}", style("─".repeat(50)).dim());
    println!(
        "  {} {}",
        style("Modules:").bold(),
        format_number(result.modules.len() as u64)
    );
    if result.inert > 0 {
        println!(
            "  {} {} (no config)",
            style("Skipped:").bold(),
            format_number(result.inert as u64)
        );
    }
    println!(
        "  {} {}",
        style("Aliases:").bold(),
        format_number(result.aliases.len() as u64)
    );
    println!(
        "  {} {}",
        style("Minified:").bold(),
        format_size(result.total_size(), BINARY)
    );
    println!("  {} {:.2}s", style("Duration:").bold(), duration_secs);
    println!(
        "  {} {}",
        style("Output:").bold(),
        result.output_root.display()
    );
    println!();
}

/// Print a header at the start of the build
pub fn print_header(source: &Path, workers: usize, output: &Path) {
    println!();
    println!(
        "{} {}",
        style("polyfill-catalog").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!("{}", style("─".repeat(50)).dim());
    println!("  {} {}", style("Source:").bold(), source.display());
    println!("  {} {}", style("Workers:").bold(), workers);
    println!("  {} {}", style("Output:").bold(), output.display());
    println!();
}
