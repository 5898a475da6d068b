//! Shared progress bar styling.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

const TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} rows ({percent}%) {msg}";

/// Row-count progress bar for loading one table
pub fn table_bar(table: &str, rows: u64) -> ProgressBar {
    let pb = ProgressBar::new(rows);
    if let Ok(style) = ProgressStyle::with_template(TEMPLATE) {
        pb.set_style(
            style
                .progress_chars("█▓▒░  ")
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(format!("Loading {}...", table));
    pb
}
