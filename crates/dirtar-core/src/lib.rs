//! dirtar - pack a directory tree into a tar archive and unpack it again
//!
//! The library maps a filesystem subtree onto a flat, ordered sequence of tar
//! entries and reverses that mapping on extraction. The tar codec itself is
//! provided by the `tar` crate and gzip framing by `flate2`; this crate owns
//! traversal order, path normalization, format dispatch and the bounded
//! streaming discipline.

pub mod archive;
pub mod compression;
pub mod config;
pub mod error;
pub mod events;

pub use error::{Error, Result};

// Re-export commonly used types
pub use archive::{
    create_directory_tar, create_directory_tar_gz, extract_files, list_entries, ArchiveFormat,
    EntryInfo, EntryKind, ExtractOptions, PackOptions, UnsafeEntryPolicy,
};
pub use compression::gzip_tar_file;
pub use config::Config;
pub use events::{CollectingSink, Event, EventSink, TracingSink};

/// Size of the buffer used for every content copy, in bytes.
pub const BUFFER_SIZE: usize = 1024;
