//! `festsync` command line
//!
//! Argument definitions plus the command bodies, which only talk to a
//! [`SyncHandle`] and return the text to print.

use crate::model::RemoteEvent;
use crate::status::ImportSummary;
use crate::worker::SyncHandle;
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Command-line arguments for festsync
#[derive(Parser, Debug)]
#[command(name = "festsync")]
#[command(about = "Synchronize festival listings into a local store")]
#[command(version)]
pub struct Cli {
    /// Root folder holding the listing database
    #[arg(long, global = true, value_name = "DIR")]
    pub root_folder: Option<PathBuf>,

    /// Config file to use instead of the platform default
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Reconcile a JSON snapshot of remote events and commit it
    Import {
        /// JSON array of events with nested venue and performances
        snapshot: PathBuf,

        /// Reconcile and report, then discard instead of committing
        #[arg(long)]
        dry_run: bool,
    },

    /// Mark an event as a favourite
    Favourite {
        event_code: String,

        /// Remove the favourite mark instead
        #[arg(long)]
        unset: bool,
    },

    /// List local events and their performances
    List {
        /// Only favourite events
        #[arg(long)]
        favourites: bool,
    },
}

/// Decode a snapshot file; nested performances take their event's code
pub fn read_snapshot(path: &Path) -> Result<Vec<RemoteEvent>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
    let events: Vec<RemoteEvent> = serde_json::from_str(&text)
        .with_context(|| format!("Invalid snapshot {}", path.display()))?;
    Ok(events.into_iter().map(RemoteEvent::adopt_performances).collect())
}

/// Run one command against the worker and return its report
pub async fn execute(command: Command, handle: &SyncHandle) -> Result<String> {
    match command {
        Command::Import { snapshot, dry_run } => import(&snapshot, dry_run, handle).await,
        Command::Favourite { event_code, unset } => favourite(&event_code, !unset, handle).await,
        Command::List { favourites } => list(favourites, handle).await,
    }
}

async fn import(snapshot: &Path, dry_run: bool, handle: &SyncHandle) -> Result<String> {
    let events = read_snapshot(snapshot)?;
    let count = events.len();

    let statuses = match handle.import_snapshot(events).await {
        Ok(statuses) => statuses,
        Err(e) => {
            warn!("Import failed, discarding staged changes: {}", e);
            handle.discard().await?;
            return Err(e).context("Import failed");
        }
    };

    if dry_run {
        handle.discard().await?;
    } else {
        handle.commit().await.context("Failed to save import")?;
    }

    let summary = ImportSummary::from_statuses(&statuses);
    let mut report = format!("{} events: {}", count, summary);
    if dry_run {
        report.push_str(" (dry run, nothing saved)");
    }
    Ok(report)
}

async fn favourite(event_code: &str, favourite: bool, handle: &SyncHandle) -> Result<String> {
    if !handle.set_favourite(event_code, favourite).await? {
        bail!("No event with code {}", event_code);
    }
    handle.commit().await.context("Failed to save favourite")?;

    Ok(if favourite {
        format!("Marked {} as favourite", event_code)
    } else {
        format!("Removed {} from favourites", event_code)
    })
}

async fn list(favourites_only: bool, handle: &SyncHandle) -> Result<String> {
    let events = if favourites_only {
        handle.favourite_events().await?
    } else {
        handle.events().await?
    };

    let mut out = String::new();
    for event in &events {
        let star = if event.is_favourite { " *" } else { "" };
        writeln!(out, "{}  {}{}", event.code, event.title, star)?;

        for performance in handle.performances_for_event(event.code.as_str()).await? {
            let lifecycle = if performance.is_active() {
                String::new()
            } else {
                format!(" [{}]", performance.lifecycle)
            };
            writeln!(
                out,
                "    {}  {}{}",
                performance.starts_at.format("%Y-%m-%d %H:%M"),
                performance.listing_status,
                lifecycle
            )?;
        }
    }

    if events.is_empty() {
        out.push_str("No events\n");
    }
    Ok(out.trim_end().to_string())
}
