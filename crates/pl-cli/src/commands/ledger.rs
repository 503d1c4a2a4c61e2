//! Offline inspection of exported product histories.
//!
//! A history file is the JSON array returned by a `history` request.

use anyhow::{Context, Result};
use chrono::DateTime;
use clap::{Args, Subcommand};
use colored::Colorize;
use pl_store::{history_digest, verify_events, Event, EventKind};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Args)]
pub struct HistoryArgs {
    #[command(subcommand)]
    pub command: HistoryCommand,
}

#[derive(Debug, Subcommand)]
pub enum HistoryCommand {
    /// Display a product history in human-readable format
    Log {
        /// Path to the exported history (JSON array of events)
        file: PathBuf,
    },
    /// Check the chain-of-custody invariant of an exported history
    Verify {
        /// Path to the exported history (JSON array of events)
        file: PathBuf,
    },
}

/// Load an exported history, oldest event first.
pub fn load_history(path: &Path) -> Result<Vec<Event>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read history from {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse history JSON in {}", path.display()))
}

fn render_timestamp(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| millis.to_string())
}

/// First 20 characters of a signature, with an ellipsis when cut.
fn signature_preview(signature: &str) -> String {
    const PREVIEW_CHARS: usize = 20;
    if signature.chars().count() > PREVIEW_CHARS {
        let head: String = signature.chars().take(PREVIEW_CHARS).collect();
        format!("{head}...")
    } else {
        signature.to_string()
    }
}

/// Handle `pl history log`.
pub fn cmd_log(file: PathBuf) -> Result<()> {
    let events = load_history(&file)?;

    if events.is_empty() {
        println!("{}", "History is empty".yellow());
        return Ok(());
    }

    println!("{}", "Product History".bold().underline());
    println!("{}: {}", "File".bold(), file.display());
    println!("{}: {}", "Product".bold(), events[0].product_id);
    println!("{}: {}", "Events".bold(), events.len());
    println!("{}: {}", "Digest".bold(), history_digest(&events));
    println!();

    for (idx, event) in events.iter().enumerate() {
        let kind = match event.kind {
            EventKind::Manufacture => event.kind.to_string().cyan(),
            EventKind::Transfer => event.kind.to_string().green(),
            EventKind::Repair => event.kind.to_string().magenta(),
        };
        println!("{} {} {}", "Event".bold(), idx + 1, kind);
        println!("  {}: {}", "Timestamp".bold(), render_timestamp(event.timestamp));
        if let Some(prev) = &event.previous_owner {
            println!("  {}: {}", "From".bold(), prev);
        }
        println!("  {}: {}", "Owner".bold(), event.owner);
        if let Some(metadata) = &event.metadata {
            println!("  {}: \"{}\"", "Metadata".bold(), metadata);
        }
        println!(
            "  {}: {} ({:?})",
            "Signature".bold(),
            signature_preview(&event.signature),
            event.anchor
        );
        println!();
    }

    Ok(())
}

/// Handle `pl history verify`.
pub fn cmd_verify(file: PathBuf) -> Result<()> {
    let events = load_history(&file)?;

    verify_events(&events).context("chain-of-custody verification failed")?;
    println!("{} Chain of custody valid", "✓".green().bold());

    let anchored = events
        .iter()
        .filter(|e| e.anchor == pl_anchor::AnchorOrigin::Anchored)
        .count();

    println!();
    println!("{}", "Summary:".bold().underline());
    println!("  {}: {}", "Events".bold(), events.len());
    if let Some(last) = events.last() {
        println!("  {}: {}", "Current Owner".bold(), last.owner);
    }
    println!(
        "  {}: {}/{}",
        "Externally Anchored".bold(),
        anchored,
        events.len()
    );
    println!("  {}: {}", "Digest".bold(), history_digest(&events));
    println!("  {}: {}", "Status".bold(), "VALID".green().bold());

    Ok(())
}
