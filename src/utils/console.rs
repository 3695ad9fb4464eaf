// src/utils/console.rs

//! User-facing console output.
//!
//! Diagnostics go through the `log` facade and `env_logger`. This module
//! prints what a CLI user asked for (pitch listings, summaries) on stdout,
//! gated by the same [`LevelFilter`] vocabulary as the logger. Errors and
//! warnings go to stderr; `--quiet` keeps only errors.

use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::Local;
use log::{Level, LevelFilter};

static FILTER: AtomicUsize = AtomicUsize::new(LevelFilter::Info as usize);

/// Parse a configured level name; unknown names mean `Info`.
pub fn parse_filter(level: &str) -> LevelFilter {
    level.trim().parse().unwrap_or(LevelFilter::Info)
}

/// Set the console level. `quiet` lowers it to errors only.
pub fn init(level: &str, quiet: bool) {
    let filter = if quiet {
        LevelFilter::Error
    } else {
        parse_filter(level)
    };
    FILTER.store(filter as usize, Ordering::Relaxed);
}

fn enabled(level: Level) -> bool {
    (level as usize) <= FILTER.load(Ordering::Relaxed)
}

fn stamp(marker: &str, message: &str) -> String {
    format!("{} {} {}", Local::now().format("%H:%M:%S"), marker, message)
}

pub fn info(message: &str) {
    if enabled(Level::Info) {
        println!("{}", stamp("·", message));
    }
}

pub fn warn(message: &str) {
    if enabled(Level::Warn) {
        eprintln!("{}", stamp("!", message));
    }
}

pub fn error(message: &str) {
    if enabled(Level::Error) {
        eprintln!("{}", stamp("✗", message));
    }
}

pub fn success(message: &str) {
    if enabled(Level::Info) {
        println!("{}", stamp("✓", message));
    }
}

/// Title between two rules.
pub fn header(title: &str) {
    if enabled(Level::Info) {
        let rule = "═".repeat(60);
        println!("{rule}\n  {title}\n{rule}");
    }
}

/// Indented detail line; printed without a timestamp.
pub fn sub_item(message: &str) {
    if enabled(Level::Info) {
        println!("    {message}");
    }
}

pub fn separator() {
    if enabled(Level::Info) {
        println!("{}", "─".repeat(60));
    }
}

/// Key/value block with aligned keys.
pub fn summary(title: &str, items: &[(&str, String)]) {
    if enabled(Level::Info) {
        println!("\n{}", summary_block(title, items));
    }
}

fn summary_block(title: &str, items: &[(&str, String)]) -> String {
    let width = items.iter().map(|(k, _)| k.chars().count()).max().unwrap_or(0);
    let mut out = format!("[{title}]");
    for (key, value) in items {
        out.push_str(&format!("\n    {key:<width$}  {value}"));
    }
    out
}
