//! Diagnostics delivered while archiving and extracting
//!
//! Walker, writer and extractor never print. Anything worth reporting is
//! handed to an [`EventSink`] supplied by the caller, so a CLI can render it
//! and a test can assert on it.

use std::path::PathBuf;
use tracing::{debug, warn};

/// Something that happened to a single node or entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A regular file was written to the archive
    FileArchived { entry_path: String, size: u64 },
    /// An explicit directory entry was written to the archive
    DirectoryArchived { entry_path: String },
    /// A source node was left out of the archive
    Skipped { path: PathBuf, reason: String },
    /// An archive entry was materialized on disk
    Extracted { path: PathBuf },
    /// An archive entry was refused because of its path
    Rejected { entry_path: PathBuf, reason: String },
    /// An archive entry was read but deliberately not written
    Ignored { entry_path: PathBuf, reason: String },
}

/// Receiver for [`Event`]s
pub trait EventSink {
    /// Record a single event
    fn emit(&mut self, event: Event);
}

/// Forwards events to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&mut self, event: Event) {
        match event {
            Event::FileArchived { entry_path, size } => {
                debug!(entry = %entry_path, size, "Added file");
            }
            Event::DirectoryArchived { entry_path } => {
                debug!(entry = %entry_path, "Added directory");
            }
            Event::Skipped { path, reason } => {
                warn!(path = ?path, "Skipping node: {}", reason);
            }
            Event::Extracted { path } => {
                debug!(path = ?path, "Extracted");
            }
            Event::Rejected { entry_path, reason } => {
                warn!(entry = ?entry_path, "Rejected entry: {}", reason);
            }
            Event::Ignored { entry_path, reason } => {
                debug!(entry = ?entry_path, "Ignored entry: {}", reason);
            }
        }
    }
}

/// Keeps every event in memory
#[derive(Debug, Default, Clone)]
pub struct CollectingSink {
    pub events: Vec<Event>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Paths of every skipped source node
    pub fn skipped(&self) -> Vec<&PathBuf> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Skipped { path, .. } => Some(path),
                _ => None,
            })
            .collect()
    }

    /// Entry paths of every rejected archive entry
    pub fn rejected(&self) -> Vec<&PathBuf> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Rejected { entry_path, .. } => Some(entry_path),
                _ => None,
            })
            .collect()
    }

    /// Entry paths of every archived file, in archive order
    pub fn archived_files(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::FileArchived { entry_path, .. } => Some(entry_path.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for CollectingSink {
    fn emit(&mut self, event: Event) {
        self.events.push(event);
    }
}
