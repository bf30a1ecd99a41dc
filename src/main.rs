//! Main entry point for the rvol CLI application.
//!
//! This binary lists and extracts 3-Space engine archives, including archives
//! nested inside other archives, and inspects the bitmaps stored in them.

use anyhow::{Context, Result, bail};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::io::AsyncWriteExt;
use tokio::task::JoinSet;

use rvol::{
    Bitmap, Cli, ContentEntry, FileInfo, ResourceExplorer, decode_bitmap,
    default_resource_explorer, flatten_files,
};

/// Upper bound on entries being read from the archive at the same time.
const MAX_IN_FLIGHT: usize = 8;

/// Application entry point.
///
/// Builds the default explorer over `--root` and dispatches to bitmap
/// inspection, listing or extraction.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let explorer = Arc::new(default_resource_explorer(&cli.root));

    if cli.bitmap {
        return show_bitmap(&explorer, &cli);
    }

    process_archive(explorer, &cli).await
}

/// Process an archive based on CLI options.
///
/// This function handles both listing and extraction modes:
/// - List mode (`-l` or `-v`): Display archive contents
/// - Extract mode: Extract files matching the specified filters
///
/// # Arguments
///
/// * `explorer` - Explorer shared with the extraction workers
/// * `cli` - Parsed command-line arguments
///
/// # Returns
///
/// Returns `Ok(())` on success, or an error if processing fails.
async fn process_archive(explorer: Arc<ResourceExplorer>, cli: &Cli) -> Result<()> {
    let listing = explorer
        .list(&cli.file)
        .with_context(|| format!("cannot read {}", cli.file.display()))?;
    let archive_path = explorer.search_path().join(&cli.file);

    if cli.list || cli.verbose {
        list_files(&listing, &archive_path, cli.verbose);
        return Ok(());
    }

    let files_to_extract: Vec<_> = flatten_files(&listing)
        .into_iter()
        .filter(|info| {
            let name = entry_name(info, &archive_path);

            // Positional arguments select entries by pattern, path or basename
            if !cli.files.is_empty() {
                let matches = cli.files.iter().any(|f| {
                    if has_glob_chars(f) {
                        glob_match(f, &name)
                    } else {
                        name == *f || info.name() == *f
                    }
                });
                if !matches {
                    return false;
                }
            }

            !cli
                .exclude
                .iter()
                .any(|x| name.contains(x.as_str()) || glob_match(x, &name))
        })
        .collect();

    if files_to_extract.is_empty() {
        if !cli.is_very_quiet() {
            eprintln!("No matching files in {}", cli.file.display());
        }
        return Ok(());
    }

    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.store(true, Ordering::SeqCst);
            }
        });
    }

    if cli.pipe {
        pipe_files(explorer, files_to_extract, &archive_path, &cancel).await?;
    } else {
        extract_files(explorer, files_to_extract, &archive_path, cli, &cancel).await?;
    }

    if cancel.load(Ordering::SeqCst) && !cli.is_very_quiet() {
        eprintln!("Extraction cancelled");
    }

    Ok(())
}

/// List the entries of an archive or folder.
///
/// Supports two output formats:
/// - Simple format (`-l`): Entry paths, one per line, folders ending in `/`
/// - Verbose format (`-v`): Table with size and data offset of every file
fn list_files(listing: &[ContentEntry], archive_path: &Path, verbose: bool) {
    if verbose {
        println!("{:>10}  {:>10}  Name", "Size", "Offset");
        println!("{}", "-".repeat(50));
    }

    let mut total_size = 0u64;
    let mut file_count = 0usize;
    print_entries(listing, archive_path, verbose, &mut total_size, &mut file_count);

    if verbose {
        println!("{}", "-".repeat(50));
        println!(
            "{:>10}  {:>10}  {} files ({})",
            total_size,
            "",
            file_count,
            format_size(total_size)
        );
    }
}

fn print_entries(
    entries: &[ContentEntry],
    archive_path: &Path,
    verbose: bool,
    total_size: &mut u64,
    file_count: &mut usize,
) {
    for entry in entries {
        match entry {
            ContentEntry::File(info) => {
                let name = entry_name(info, archive_path);
                if verbose {
                    println!("{:>10}  {:#010x}  {}", info.size, info.offset, name);
                    *total_size += info.size;
                    *file_count += 1;
                } else {
                    println!("{name}");
                }
            }
            ContentEntry::Folder(folder) => {
                let name = relative_name(&folder.full_path, archive_path);
                if verbose {
                    println!("{:>10}  {:>10}  {}/", "", "", name);
                } else {
                    println!("{name}/");
                }
                print_entries(&folder.children, archive_path, verbose, total_size, file_count);
            }
        }
    }
}

/// Extract entries into the output directory.
///
/// Entries are read on the blocking pool, each worker opening its own
/// handle through the shared explorer, and written with tokio's file API.
/// The cancel flag is checked before each entry starts.
async fn extract_files(
    explorer: Arc<ResourceExplorer>,
    files: Vec<FileInfo>,
    archive_path: &Path,
    cli: &Cli,
    cancel: &Arc<AtomicBool>,
) -> Result<()> {
    let mut tasks: JoinSet<Result<()>> = JoinSet::new();
    let mut failures = 0usize;

    for info in files {
        if cancel.load(Ordering::SeqCst) {
            break;
        }

        let name = entry_name(&info, archive_path);
        let destination = output_path(&info, &name, cli);

        // Handle existing files based on overwrite options
        if destination.exists() {
            if cli.never_overwrite {
                if !cli.is_quiet() {
                    eprintln!("Skipping: {name} (file exists)");
                }
                continue;
            }
            if !cli.overwrite {
                if !cli.is_quiet() {
                    eprintln!("Skipping: {name} (use -o to overwrite)");
                }
                continue;
            }
        }

        if !cli.is_quiet() {
            println!("  extracting: {name}");
        }

        if tasks.len() >= MAX_IN_FLIGHT {
            failures += join_one(&mut tasks, cli).await;
        }

        let explorer = explorer.clone();
        let cancel = cancel.clone();
        tasks.spawn(async move {
            if cancel.load(Ordering::SeqCst) {
                return Ok::<(), anyhow::Error>(());
            }
            let data = tokio::task::spawn_blocking(move || explorer.extract_to_vec(&info))
                .await?
                .with_context(|| format!("cannot extract {name}"))?;

            if let Some(parent) = destination.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&destination, data)
                .await
                .with_context(|| format!("cannot write {}", destination.display()))?;
            Ok(())
        });
    }

    while !tasks.is_empty() {
        failures += join_one(&mut tasks, cli).await;
    }

    if failures > 0 {
        bail!("{failures} file(s) could not be extracted");
    }
    Ok(())
}

/// Wait for one extraction task, returning 1 if it failed.
async fn join_one(tasks: &mut JoinSet<Result<()>>, cli: &Cli) -> usize {
    let outcome = match tasks.join_next().await {
        Some(Ok(result)) => result,
        Some(Err(join_error)) => Err(join_error.into()),
        None => Ok(()),
    };
    match outcome {
        Ok(()) => 0,
        Err(err) => {
            if !cli.is_very_quiet() {
                eprintln!("error: {err:#}");
            }
            1
        }
    }
}

/// Write entries to stdout in listing order.
///
/// With more than one entry each is preceded by a `--- name ---` marker.
async fn pipe_files(
    explorer: Arc<ResourceExplorer>,
    files: Vec<FileInfo>,
    archive_path: &Path,
    cancel: &AtomicBool,
) -> Result<()> {
    let show_filename = files.len() > 1;
    let mut stdout = tokio::io::stdout();

    for info in files {
        if cancel.load(Ordering::SeqCst) {
            break;
        }

        let name = entry_name(&info, archive_path);
        if show_filename {
            stdout.write_all(format!("--- {name} ---\n").as_bytes()).await?;
        }

        let explorer = explorer.clone();
        let data = tokio::task::spawn_blocking(move || explorer.extract_to_vec(&info))
            .await?
            .with_context(|| format!("cannot extract {name}"))?;
        stdout.write_all(&data).await?;
    }

    stdout.flush().await?;
    Ok(())
}

/// Print a bitmap's header fields and palette.
fn show_bitmap(explorer: &ResourceExplorer, cli: &Cli) -> Result<()> {
    let mut stream = explorer
        .open(&cli.file)
        .with_context(|| format!("cannot open {}", cli.file.display()))?;
    let bitmap = decode_bitmap(&mut *stream)
        .with_context(|| format!("cannot decode {}", cli.file.display()))?;

    let (width, height, bit_depth) = bitmap.dimensions();
    let kind = match bitmap {
        Bitmap::Windows(_) => "Windows BMP",
        Bitmap::Pbmp(_) => "PBMP",
    };
    println!("{}: {kind}", cli.file.display());
    println!("  dimensions:    {width}x{height}, {bit_depth} bits per pixel");
    println!("  pixel data:    {}", format_size(bitmap.pixels().len() as u64));

    if let Bitmap::Pbmp(pbmp) = &bitmap {
        if let Some(levels) = pbmp.detail_levels {
            println!("  detail levels: {levels}");
        }
        if let Some(index) = pbmp.palette_index {
            println!("  palette index: {index}");
        }
    }

    let palette = bitmap.palette();
    if !palette.is_empty() {
        println!("  palette:       {} colours", palette.len());
        if !cli.is_quiet() {
            for (index, colour) in palette.iter().enumerate() {
                println!("    {index:>3}  {}", colour.to_hex());
            }
        }
    }

    Ok(())
}

/// Destination of an extracted entry, honouring `-d` and `-j`.
fn output_path(info: &FileInfo, name: &str, cli: &Cli) -> PathBuf {
    let file_name = if cli.junk_paths {
        info.name()
    } else {
        name.to_string()
    };
    match cli.extract_dir {
        Some(ref dir) => dir.join(file_name),
        None => PathBuf::from(file_name),
    }
}

/// Path of an entry relative to the archive being listed, `/` separated.
fn entry_name(info: &FileInfo, archive_path: &Path) -> String {
    relative_name(&info.filename, archive_path)
}

fn relative_name(path: &Path, archive_path: &Path) -> String {
    let relative = path.strip_prefix(archive_path).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Check if a pattern contains glob wildcard characters.
fn has_glob_chars(pattern: &str) -> bool {
    pattern.contains('*') || pattern.contains('?')
}

/// Simple glob pattern matching supporting `*` and `?` wildcards.
///
/// - `*` matches zero or more characters
/// - `?` matches exactly one character
///
/// # Examples
///
/// ```ignore
/// assert!(glob_match("*.PBA", "SKY.PBA"));
/// assert!(glob_match("MAP?.DAT", "MAP1.DAT"));
/// assert!(!glob_match("*.PBA", "SKY.BMP"));
/// ```
fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern_chars: Vec<char> = pattern.chars().collect();
    let text_chars: Vec<char> = text.chars().collect();

    fn do_match(pattern: &[char], text: &[char]) -> bool {
        match (pattern.first(), text.first()) {
            (None, None) => true,
            // Either skip the star or let it swallow one more character
            (Some('*'), _) => {
                do_match(&pattern[1..], text) || (!text.is_empty() && do_match(pattern, &text[1..]))
            }
            (Some('?'), Some(_)) => do_match(&pattern[1..], &text[1..]),
            (Some(p), Some(t)) if *p == *t => do_match(&pattern[1..], &text[1..]),
            _ => false,
        }
    }

    do_match(&pattern_chars, &text_chars)
}

/// Format a byte size into a human-readable string.
///
/// # Examples
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
