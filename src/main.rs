//! Main entry point for the treeport CLI application.
//!
//! Opens a project container or a legacy export from a local path or an
//! HTTP URL, then lists, prints or re-saves it.

use anyhow::Result;
use clap::Parser;
use log::info;
use std::path::Path;

use treeport::io::read_all;
use treeport::model::ProjectBundle;
use treeport::sniff::{self, Format};
use treeport::zip::{WriterOptions, ZipFileEntry, list_entries};
use treeport::{Cli, HttpReader, LocalFileReader, logging, project};

/// Application entry point.
///
/// Loads the whole input into memory, from the network with a single GET
/// or from disk, and hands the bytes to [`process_input`].
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.effective_log_level())?;

    let bytes = if cli.is_http_url() {
        let reader = HttpReader::fetch(&cli.file).await?;
        let bytes = read_all(&reader).await?;

        if !cli.is_quiet() {
            eprintln!(
                "Total bytes transferred: {}",
                format_size(reader.transferred_bytes())
            );
        }
        bytes
    } else {
        let reader = LocalFileReader::new(Path::new(&cli.file))?;
        read_all(&reader).await?
    };

    process_input(&bytes, &cli).await
}

/// Dispatch on CLI options.
///
/// - List mode (`-l` or `-v`): display container entries
/// - Otherwise: open the project, then save (`-o`), print JSON (`--json`)
///   or print a summary
async fn process_input(bytes: &[u8], cli: &Cli) -> Result<()> {
    if cli.list || cli.verbose {
        return list_files(bytes, cli.verbose);
    }

    let format = sniff::detect(bytes);
    let bundle = sniff::open_bytes(bytes)?;

    if let Some(ref output) = cli.output {
        let saved = project::save(&bundle, &WriterOptions::default())?;
        tokio::fs::write(output, &saved).await?;
        info!("event=cli_save path={} bytes={}", output, saved.len());
        if !cli.is_quiet() {
            println!("  saved: {} ({})", output, format_size(saved.len() as u64));
        }
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&bundle)?);
    } else if !cli.is_quiet() {
        print_summary(&bundle, format);
    }

    Ok(())
}

fn print_summary(bundle: &ProjectBundle, format: Format) {
    let kind = match format {
        Format::Container => "project container",
        Format::Legacy => "legacy export",
    };
    println!("{kind}");
    println!("{:>8}  individuals", bundle.individuals.len());
    println!("{:>8}  families", bundle.families.len());
    println!("{:>8}  sources", bundle.sources.len());
}

/// List entries of a project container.
///
/// Supports two output formats:
/// - Simple format (`-l`): Just entry names, one per line
/// - Verbose format (`-v`): Detailed table with size, compression ratio, and timestamps
fn list_files(bytes: &[u8], verbose: bool) -> Result<()> {
    let entries = list_entries(bytes)?;

    if verbose {
        println!(
            "{:>10}  {:>10}  {:>5}  {:>10}  {:>5}  Name",
            "Length", "Size", "Cmpr", "Date", "Time"
        );
        println!("{}", "-".repeat(70));
    }

    let mut total_uncompressed = 0u64;
    let mut total_compressed = 0u64;
    let mut file_count = 0usize;

    for entry in &entries {
        if !verbose {
            println!("{}", entry.file_name);
            continue;
        }

        println!("{}", verbose_line(entry));
        if !entry.is_directory {
            total_uncompressed += entry.uncompressed_size;
            total_compressed += entry.compressed_size;
            file_count += 1;
        }
    }

    if verbose {
        println!("{}", "-".repeat(70));
        println!(
            "{:>10}  {:>10}  {}  {:>21}  {} files",
            total_uncompressed,
            total_compressed,
            ratio(total_compressed, total_uncompressed),
            "",
            file_count
        );
    }

    Ok(())
}

fn verbose_line(entry: &ZipFileEntry) -> String {
    let (year, month, day) = entry.mod_date();
    let (hour, minute, _second) = entry.mod_time();
    format!(
        "{:>10}  {:>10}  {}  {:04}-{:02}-{:02}  {:02}:{:02}  {}",
        entry.uncompressed_size,
        entry.compressed_size,
        ratio(entry.compressed_size, entry.uncompressed_size),
        year,
        month,
        day,
        hour,
        minute,
        entry.file_name
    )
}

/// Space saved by compression, as a right-aligned percentage.
///
/// Stored entries can be slightly larger than their content; that shows as 0%.
fn ratio(compressed: u64, uncompressed: u64) -> String {
    if uncompressed == 0 {
        return "   0%".to_string();
    }
    let kept = (compressed * 100 / uncompressed).min(100);
    format!("{:>4}%", 100 - kept)
}

/// Format a byte size into a human-readable string.
///
/// ```ignore
/// assert_eq!(format_size(500), "500 bytes");
/// assert_eq!(format_size(1536), "1.50 KB");
/// ```
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}
