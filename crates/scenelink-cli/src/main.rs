//! Scenelink CLI
//!
//! Annotates 3D scene-export documents with `parent_id` links derived from
//! the host/object relationship schedule:
//!
//! ```text
//! scenelink a.json b.json --schedule EXP_ObjectID_HostID.csv --out-dir output
//! ```
//!
//! The schedule is loaded once and shared read-only. Documents are
//! processed independently and sequentially; a failing document is
//! reported and the remaining documents still run. Exit status is non-zero
//! if any document failed.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::Colorize;

use scenelink_ingest_schedule::{load_schedule, DEFAULT_SCHEDULE_FILE};
use scenelink_model::SceneDocument;
use scenelink_resolve::{resolve_parents, HostIndex, MatchPolicy};

#[derive(Parser)]
#[command(name = "scenelink")]
#[command(
    author,
    version,
    about = "Annotate scene exports with parent ids from the host/object schedule"
)]
struct Cli {
    /// Input scene documents (JSON with an `ops_3d` collection)
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Relationship schedule (UTF-16, tab-separated)
    #[arg(long, default_value = DEFAULT_SCHEDULE_FILE)]
    schedule: PathBuf,

    /// Explicit output path, once per input
    #[arg(short, long)]
    out: Vec<PathBuf>,

    /// Directory for derived output paths (`<out-dir>/<input-stem>.json`)
    /// when `--out` is not given
    #[arg(long, default_value = "output")]
    out_dir: PathBuf,

    /// Reproduce the historical last-match-wins overwrite order instead of
    /// failing on ambiguous parents
    #[arg(long)]
    legacy_order: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(0) => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("{} {err:#}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}

/// Returns the number of failed documents; `Err` only for setup failures
/// (bad arguments, unreadable schedule) that sink the whole run.
fn run(cli: &Cli) -> Result<usize> {
    let outputs = output_paths(cli)?;

    let rows = load_schedule(&cli.schedule)
        .with_context(|| format!("loading schedule `{}`", cli.schedule.display()))?;
    let index = HostIndex::new(rows)?;
    let policy = if cli.legacy_order {
        MatchPolicy::LastMatchWins
    } else {
        MatchPolicy::Unique
    };

    let mut failures = 0usize;
    for (input, output) in cli.inputs.iter().zip(&outputs) {
        match process_document(&index, policy, input, output) {
            Ok(linked) => {
                println!(
                    "{} {} -> {} ({linked} linked)",
                    "ok".green().bold(),
                    input.display(),
                    output.display()
                );
            }
            Err(err) => {
                failures += 1;
                println!("{} {}: {err:#}", "FAILED".red().bold(), input.display());
            }
        }
    }
    if failures > 0 {
        println!("{failures} of {} documents failed", cli.inputs.len());
    }
    Ok(failures)
}

fn output_paths(cli: &Cli) -> Result<Vec<PathBuf>> {
    if !cli.out.is_empty() {
        if cli.out.len() != cli.inputs.len() {
            bail!(
                "--out given {} times for {} inputs",
                cli.out.len(),
                cli.inputs.len()
            );
        }
        return Ok(cli.out.clone());
    }

    std::fs::create_dir_all(&cli.out_dir)
        .with_context(|| format!("creating output directory `{}`", cli.out_dir.display()))?;
    cli.inputs
        .iter()
        .map(|input| {
            let stem = input
                .file_stem()
                .with_context(|| format!("input `{}` has no file name", input.display()))?;
            let mut name = stem.to_os_string();
            name.push(".json");
            Ok(cli.out_dir.join(name))
        })
        .collect()
}

fn process_document(
    index: &HostIndex,
    policy: MatchPolicy,
    input: &Path,
    output: &Path,
) -> Result<usize> {
    let mut document = SceneDocument::load(input)
        .with_context(|| format!("loading document `{}`", input.display()))?;
    let parents = resolve_parents(index, document.objects(), policy)?;
    let linked = parents.iter().filter(|p| p.is_some()).count();
    document.apply_parents(&parents);
    document
        .save(output)
        .with_context(|| format!("writing `{}`", output.display()))?;
    Ok(linked)
}
