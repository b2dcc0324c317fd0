use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use comfy_table::Table;
use serde::Deserialize;
use serpmerge_core::{
    bundle_archive, transform, OutputTable, TableInput, TransformOptions, ARCHIVE_NAME,
    COMBINED_CSV, FULL_SEGMENT_CSV, PARTIAL_SEGMENT_CSV,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Merge ranking reports and roll traffic up by URL segment", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Merge report CSVs and write the combined and segment analyses
    Run(RunArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Ranking report CSV files to merge, in order
    #[arg(value_name = "FILE")]
    files: Vec<PathBuf>,

    /// Directory to scan for additional *.csv reports
    #[arg(long)]
    dir: Option<PathBuf>,

    /// Keep rows ranked at or above this position (1-100)
    #[arg(long)]
    max_position: Option<u32>,

    /// Comma-separated branded terms, e.g. "acme,acme inc"
    #[arg(long)]
    branded_terms: Option<String>,

    /// Carry the URL segment column into the combined output
    #[arg(long)]
    include_segments: bool,

    /// TOML profile supplying defaults for the run parameters
    #[arg(long)]
    profile: Option<PathBuf>,

    /// Directory the three CSV outputs are written to
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Also write the zip bundle containing all three CSVs
    #[arg(long)]
    archive: bool,

    /// Rows to preview per output table (0 disables the preview)
    #[arg(long, default_value_t = 5)]
    sample: usize,

    /// Per-file size limit in MiB (0 disables the check)
    #[arg(long, default_value_t = 200)]
    max_input_mb: u64,
}

/// Optional run defaults loaded from a TOML profile. Command-line flags
/// win over profile values.
#[derive(Debug, Default, Deserialize)]
struct RunProfile {
    max_position: Option<u32>,
    branded_terms: Option<Vec<String>>,
    include_segments: Option<bool>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Run(args) => handle_run(args),
    }
}

fn handle_run(args: RunArgs) -> Result<()> {
    let profile = load_profile(args.profile.as_deref())?;
    let options = resolve_options(&args, &profile);

    let paths = collect_input_paths(&args)?;
    if paths.is_empty() {
        bail!("no input files; pass report CSVs or --dir");
    }

    let inputs = read_inputs(&paths, args.max_input_mb)?;
    info!(inputs = inputs.len(), max_position = options.max_position, "starting transform");

    let output = transform(&inputs, &options)?;
    println!("Total rows processed: {}", output.combined.len());

    let combined = output.combined_table()?;
    let full = output.full_segment_table()?;
    let partial = output.partial_segment_table()?;

    if args.sample > 0 {
        print_sample("Combined output", &combined, args.sample);
        print_sample("Full segment analysis", &full, args.sample);
        if partial.rows.is_empty() {
            println!("\nPartial segment analysis: no segments in the 6-50 occurrence band");
        } else {
            print_sample("Partial segment analysis", &partial, args.sample);
        }
    }

    fs::create_dir_all(&args.output_dir).with_context(|| {
        format!(
            "failed to create output directory {}",
            args.output_dir.display()
        )
    })?;
    write_table(&args.output_dir.join(COMBINED_CSV), &combined)?;
    write_table(&args.output_dir.join(FULL_SEGMENT_CSV), &full)?;
    write_table(&args.output_dir.join(PARTIAL_SEGMENT_CSV), &partial)?;

    if args.archive {
        let bytes = bundle_archive(&output)?;
        let path = args.output_dir.join(ARCHIVE_NAME);
        fs::write(&path, bytes)
            .with_context(|| format!("failed to write {}", path.display()))?;
        println!("  wrote {}", path.display());
    }

    Ok(())
}

fn load_profile(path: Option<&Path>) -> Result<RunProfile> {
    let Some(path) = path else {
        return Ok(RunProfile::default());
    };
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read profile {}", path.display()))?;
    toml::from_str(&contents)
        .with_context(|| format!("failed to parse profile {}", path.display()))
}

fn resolve_options(args: &RunArgs, profile: &RunProfile) -> TransformOptions {
    let defaults = TransformOptions::default();

    let branded_terms = match (&args.branded_terms, &profile.branded_terms) {
        (Some(flag), _) => split_terms(flag),
        (None, Some(listed)) => listed
            .iter()
            .map(|term| term.trim().to_lowercase())
            .filter(|term| !term.is_empty())
            .collect(),
        (None, None) => Vec::new(),
    };

    TransformOptions {
        max_position: args
            .max_position
            .or(profile.max_position)
            .unwrap_or(defaults.max_position),
        branded_terms,
        include_segments: args.include_segments || profile.include_segments.unwrap_or(false),
    }
}

fn split_terms(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|term| term.trim().to_lowercase())
        .filter(|term| !term.is_empty())
        .collect()
}

fn collect_input_paths(args: &RunArgs) -> Result<Vec<PathBuf>> {
    let mut paths = args.files.clone();

    if let Some(dir) = &args.dir {
        let pattern = dir.join("*.csv");
        let pattern = pattern
            .to_str()
            .context("input directory path is not valid UTF-8")?;
        for entry in glob::glob(pattern)? {
            match entry {
                Ok(path) if path.is_file() => paths.push(path),
                Ok(_) => {}
                Err(err) => warn!("skipping unreadable path under --dir: {err}"),
            }
        }
    }

    Ok(paths)
}

fn read_inputs(paths: &[PathBuf], max_input_mb: u64) -> Result<Vec<TableInput>> {
    let limit_bytes = max_input_mb.saturating_mul(1024 * 1024);

    let mut inputs = Vec::with_capacity(paths.len());
    for path in paths {
        let metadata = fs::metadata(path)
            .with_context(|| format!("failed to stat {}", path.display()))?;
        if max_input_mb > 0 && metadata.len() > limit_bytes {
            bail!(
                "{} is {:.1} MiB, over the {} MiB limit (raise with --max-input-mb)",
                path.display(),
                metadata.len() as f64 / (1024.0 * 1024.0),
                max_input_mb
            );
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        inputs.push(TableInput::new(name, contents));
    }

    Ok(inputs)
}

fn print_sample(title: &str, table: &OutputTable, limit: usize) {
    println!("\n{title} ({} rows)", table.rows.len());

    let mut rendered = Table::new();
    rendered.set_header(table.columns.clone());
    for row in table.rows.iter().take(limit) {
        rendered.add_row(row.clone());
    }
    println!("{rendered}");
}

fn write_table(path: &Path, table: &OutputTable) -> Result<()> {
    let csv = table.to_csv()?;
    fs::write(path, csv).with_context(|| format!("failed to write {}", path.display()))?;
    println!("  wrote {}", path.display());
    Ok(())
}
