//! dirtar-cli - Command-line interface for dirtar
//!
//! Wraps the `dirtar-core` operations:
//! - packing a directory into a `.tar` or `.tar.gz` archive
//! - extracting an archive into a directory
//! - gzip-compressing an existing `.tar`
//! - listing archive entries

use anyhow::Result;
use clap::{Parser, Subcommand};
use dirtar_core::archive::{
    create_directory_tar_gz_with, create_directory_tar_with, extract_files_with,
};
use dirtar_core::compression::gzip_tar_file_with_level;
use dirtar_core::{list_entries, ArchiveFormat, Config, EntryKind, UnsafeEntryPolicy};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod progress;

use progress::SpinnerSink;

/// dirtar - pack a directory into a tar archive and unpack it again
#[derive(Parser)]
#[command(name = "dirtar")]
#[command(author, version, about = "Pack directories into tar and tar.gz archives", long_about = None)]
struct Cli {
    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Configuration file to use instead of the default location
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pack a directory into a .tar or .tar.gz archive
    Pack {
        /// Directory to pack
        input: PathBuf,

        /// Output archive; the extension selects tar or tar.gz
        #[arg(short, long)]
        output: PathBuf,

        /// Store entries in file-name order
        #[arg(long)]
        sort: bool,

        /// Store directory entries so empty directories are kept
        #[arg(long)]
        dir_entries: bool,

        /// Skip symlinks instead of archiving what they point to
        #[arg(long)]
        no_follow: bool,

        /// Gzip level for .tar.gz output (0-9)
        #[arg(long, value_parser = clap::value_parser!(u32).range(0..=9))]
        level: Option<u32>,
    },

    /// Extract a .tar or .tar.gz archive
    Extract {
        /// Archive file to extract
        archive: PathBuf,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Leave files that already exist untouched
        #[arg(long)]
        keep_existing: bool,

        /// Fail on the first entry that would escape the output directory
        #[arg(long)]
        strict: bool,
    },

    /// Compress an existing .tar file into a .tar.gz file
    Gzip {
        /// Tar file to compress
        input: PathBuf,

        /// Output file (defaults to the input name with .gz appended)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Gzip level (0-9)
        #[arg(long, value_parser = clap::value_parser!(u32).range(0..=9))]
        level: Option<u32>,
    },

    /// List the entries of an archive
    List {
        /// Archive file to list
        archive: PathBuf,

        /// Output format as JSON
        #[arg(long)]
        json: bool,
    },

    /// Inspect or create the configuration file
    ///
    /// Without a flag, reports which file is used and whether it is valid.
    Config {
        /// Show the effective configuration
        #[arg(long, conflicts_with_all = ["path", "init"])]
        show: bool,

        /// Show the configuration file path
        #[arg(long, conflicts_with_all = ["show", "init"])]
        path: bool,

        /// Write a commented default configuration file
        #[arg(long, conflicts_with_all = ["show", "path"])]
        init: bool,
    },
}

fn setup_logging(verbose: bool, quiet: bool) {
    if quiet {
        return;
    }

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    let quiet = cli.quiet;

    match run(cli) {
        Ok(_) => process::exit(0),
        Err(e) => {
            if quiet {
                eprintln!("dirtar: {:#}", e);
            } else {
                error!("Error: {:#}", e);
            }

            let exit_code = map_error_to_exit_code(&e);
            process::exit(exit_code);
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    Ok(config)
}

fn run(cli: Cli) -> Result<()> {
    setup_logging(cli.verbose, cli.quiet);
    let show_progress = !cli.quiet;

    match cli.command {
        Commands::Pack {
            input,
            output,
            sort,
            dir_entries,
            no_follow,
            level,
        } => {
            let config = load_config(cli.config.as_deref())?;
            let mut options = config.pack;
            options.sort_entries |= sort;
            options.directory_entries |= dir_entries;
            if no_follow {
                options.follow_symlinks = false;
            }

            let mut sink = SpinnerSink::new(show_progress, "Packing");
            let summary = match ArchiveFormat::detect(&output)? {
                ArchiveFormat::Tar => {
                    if level.is_some() {
                        warn!("--level has no effect on a plain .tar archive");
                    }
                    create_directory_tar_with(&input, &output, &options, &mut sink)?
                }
                ArchiveFormat::TarGz => {
                    let level = level.unwrap_or(config.compression.level);
                    create_directory_tar_gz_with(&input, &output, &options, level, &mut sink)?
                }
            };
            sink.finish();

            info!(
                "Packed {} files ({} bytes) into {:?}",
                summary.files, summary.bytes, output
            );
            if summary.skipped > 0 {
                warn!("{} nodes were skipped", summary.skipped);
            }
        }

        Commands::Extract {
            archive,
            output,
            keep_existing,
            strict,
        } => {
            let config = load_config(cli.config.as_deref())?;
            let mut options = config.extract;
            if keep_existing {
                options.overwrite = false;
            }
            if strict {
                options.unsafe_entries = UnsafeEntryPolicy::Abort;
            }

            let output_dir = output.unwrap_or_else(|| PathBuf::from("."));

            let mut sink = SpinnerSink::new(show_progress, "Extracting");
            let summary = extract_files_with(&archive, &output_dir, &options, &mut sink)?;
            sink.finish();

            info!(
                "Extracted {} files ({} bytes) into {:?}",
                summary.files, summary.bytes, output_dir
            );
            if summary.rejected > 0 {
                warn!(
                    "{} entries were rejected for leaving the output directory",
                    summary.rejected
                );
            }
        }

        Commands::Gzip {
            input,
            output,
            level,
        } => {
            let config = load_config(cli.config.as_deref())?;
            let output = output.unwrap_or_else(|| default_gzip_output(&input));
            let level = level.unwrap_or(config.compression.level);

            gzip_tar_file_with_level(&input, &output, level)?;
            info!("Compressed {:?} into {:?}", input, output);
        }

        Commands::List { archive, json } => {
            let entries = list_entries(&archive)?;

            if json {
                let json_output = serde_json::to_string_pretty(&entries)?;
                println!("{}", json_output);
            } else {
                for entry in &entries {
                    let marker = match entry.kind {
                        EntryKind::Directory => 'd',
                        EntryKind::File => '-',
                        EntryKind::Other => '?',
                    };
                    println!("{} {:>12}  {}", marker, entry.size, entry.path.display());
                }
            }
        }

        Commands::Config { show, path, init } => {
            if show {
                let config = load_config(cli.config.as_deref())?;
                print!("{}", config.to_toml()?);
            } else if path {
                println!("{}", Config::config_path()?.display());
            } else if init {
                let written = Config::init()?;
                println!("Created configuration file: {}", written.display());
            } else {
                let file = match cli.config {
                    Some(file) => file,
                    None => Config::config_path()?,
                };
                if file.is_file() {
                    load_config(Some(file.as_path()))?;
                    println!("Configuration file: {}", file.display());
                } else {
                    println!(
                        "Configuration file: {} (absent, using defaults)",
                        file.display()
                    );
                }
                println!("Use --show to print the effective settings, --init to create the file");
            }
        }
    }

    Ok(())
}

/// `archive.tar` becomes `archive.tar.gz`
fn default_gzip_output(input: &Path) -> PathBuf {
    let mut name = OsString::from(input.as_os_str());
    name.push(".gz");
    PathBuf::from(name)
}

/// Map errors to exit codes:
/// - 0: Success
/// - 1: General error
/// - 2: IO error or missing input
/// - 3: Invalid input
/// - 4: Malformed archive
fn map_error_to_exit_code(err: &anyhow::Error) -> i32 {
    if let Some(core_err) = err.downcast_ref::<dirtar_core::Error>() {
        match core_err {
            dirtar_core::Error::Io(_) => 2,
            dirtar_core::Error::NotFound(_) => 2,
            dirtar_core::Error::InvalidPath(_) => 3,
            dirtar_core::Error::InvalidExtension { .. } => 3,
            dirtar_core::Error::UnsupportedFormat(_) => 3,
            dirtar_core::Error::NotADirectory(_) => 3,
            dirtar_core::Error::NotAFile(_) => 3,
            dirtar_core::Error::FileExists(_) => 3,
            dirtar_core::Error::UnsafeEntry { .. } => 3,
            dirtar_core::Error::Archive(_) => 4,
            dirtar_core::Error::Config(_) => 1,
        }
    } else if err.is::<std::io::Error>() {
        2
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_gzip_output() {
        assert_eq!(
            default_gzip_output(Path::new("dir/backup.tar")),
            PathBuf::from("dir/backup.tar.gz")
        );
    }

    #[test]
    fn test_exit_codes() {
        let code = |e: dirtar_core::Error| map_error_to_exit_code(&anyhow::Error::new(e));

        assert_eq!(code(dirtar_core::Error::NotFound(PathBuf::from("x"))), 2);
        assert_eq!(
            code(dirtar_core::Error::UnsupportedFormat("x.zip".into())),
            3
        );
        assert_eq!(code(dirtar_core::Error::Archive("bad".into())), 4);
        assert_eq!(code(dirtar_core::Error::Config("bad".into())), 1);
        assert_eq!(map_error_to_exit_code(&anyhow::anyhow!("other")), 1);
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
