use anyhow::{bail, Context, Result};
use chrono::DateTime;
use clap::{Parser, Subcommand};
use revmark_core::package::{load_document, save_document};
use revmark_core::{
    compare_with_stats, consolidate, extract_revisions, plan_consolidation, Color, CompareSettings, RevisedCopy,
};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "revmark")]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_HASH"), ")"))]
#[command(about = "Structural comparison of Word documents", long_about = None)]
struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace). RUST_LOG wins when set.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mark the differences between two documents as tracked changes
    Compare {
        original: PathBuf,
        revised: PathBuf,

        #[arg(short, long)]
        output: PathBuf,

        /// Author written on every revision
        #[arg(long)]
        author: Option<String>,

        /// RFC 3339 timestamp written on every revision
        #[arg(long)]
        date: Option<String>,

        /// JSON file with comparison settings
        #[arg(long)]
        settings: Option<PathBuf>,

        /// Print alignment statistics as JSON
        #[arg(long)]
        stats: bool,
    },
    /// List the tracked changes of a document
    Revisions {
        document: PathBuf,

        #[arg(long)]
        json: bool,
    },
    /// Merge several reviewed copies of one original
    Consolidate {
        original: PathBuf,

        /// Reviewed copy as <path>:<author>:<RRGGBB>
        #[arg(short, long = "copy", required = true)]
        copies: Vec<String>,

        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(long)]
        settings: Option<PathBuf>,

        /// Print the merged revision plan as JSON instead of writing a document
        #[arg(long)]
        plan: bool,
    },
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Compare {
            original,
            revised,
            output,
            author,
            date,
            settings,
            stats,
        } => {
            let mut settings = load_settings(settings.as_deref())?;
            if let Some(author) = author {
                settings = settings.with_author(author);
            }
            if let Some(date) = date {
                DateTime::parse_from_rfc3339(&date).with_context(|| format!("--date '{}' is not RFC 3339", date))?;
                settings = settings.with_date_time(date);
            }
            cmd_compare(&original, &revised, &output, &settings, stats)
        }
        Commands::Revisions { document, json } => cmd_revisions(&document, json),
        Commands::Consolidate {
            original,
            copies,
            output,
            settings,
            plan,
        } => {
            let settings = load_settings(settings.as_deref())?;
            cmd_consolidate(&original, &copies, output.as_deref(), &settings, plan)
        }
    }
}

fn load_settings(path: Option<&Path>) -> Result<CompareSettings> {
    let Some(path) = path else {
        return Ok(CompareSettings::default());
    };
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing settings {}", path.display()))
}

fn read_docx(path: &Path) -> Result<(revmark_core::DocumentTree, revmark_core::package::OoxmlPackage)> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    load_document(&bytes).with_context(|| format!("loading {}", path.display()))
}

fn cmd_compare(original: &Path, revised: &Path, output: &Path, settings: &CompareSettings, stats: bool) -> Result<()> {
    let (original_tree, package) = read_docx(original)?;
    let (revised_tree, _) = read_docx(revised)?;

    let (result, alignment) = compare_with_stats(&original_tree, &revised_tree, settings)
        .with_context(|| format!("comparing {} with {}", original.display(), revised.display()))?;
    let bytes = save_document(&result, &package)?;
    fs::write(output, bytes).with_context(|| format!("writing {}", output.display()))?;
    info!(output = %output.display(), "wrote comparison");

    if stats {
        let summary = serde_json::json!({
            "lcs_invocations": alignment.lcs_invocations,
            "fingerprint_short_circuits": alignment.fingerprint_short_circuits,
            "cells_expanded": alignment.cells_expanded,
            "groups_expanded": alignment
                .groups_expanded
                .iter()
                .map(|(kind, n)| (kind.to_string(), *n))
                .collect::<std::collections::BTreeMap<_, _>>(),
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }
    Ok(())
}

fn cmd_revisions(document: &Path, json: bool) -> Result<()> {
    let (tree, _) = read_docx(document)?;
    let revisions = extract_revisions(&tree, &CompareSettings::default())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&revisions)?);
        return Ok(());
    }
    for revision in &revisions {
        println!(
            "{:<8} {:<20} {:<25} {:?}",
            revision.kind.to_string(),
            revision.author,
            revision.date,
            revision.text
        );
    }
    println!("{} revision(s)", revisions.len());
    Ok(())
}

/// Splits `<path>:<author>:<RRGGBB>` from the right so paths may contain `:`.
fn parse_copy_arg(arg: &str) -> Result<(PathBuf, String, Color)> {
    let mut parts = arg.rsplitn(3, ':');
    let (Some(color), Some(author), Some(path)) = (parts.next(), parts.next(), parts.next()) else {
        bail!("copy '{}' is not <path>:<author>:<RRGGBB>", arg);
    };
    if author.is_empty() {
        bail!("copy '{}' has an empty author", arg);
    }
    let color: Color = color.parse().map_err(|e: String| anyhow::anyhow!(e))?;
    Ok((PathBuf::from(path), author.to_string(), color))
}

fn cmd_consolidate(
    original: &Path,
    copy_args: &[String],
    output: Option<&Path>,
    settings: &CompareSettings,
    plan: bool,
) -> Result<()> {
    let (original_tree, package) = read_docx(original)?;
    let mut copies = Vec::with_capacity(copy_args.len());
    for arg in copy_args {
        let (path, author, color) = parse_copy_arg(arg)?;
        let (tree, _) = read_docx(&path)?;
        copies.push(RevisedCopy::new(tree, author, color));
    }

    if plan {
        let entries = plan_consolidation(&original_tree, &copies, settings)?;
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    let Some(output) = output else {
        bail!("--output is required unless --plan is given");
    };
    let result = consolidate(&original_tree, &copies, settings).context("consolidating copies")?;
    let bytes = save_document(&result, &package)?;
    fs::write(output, bytes).with_context(|| format!("writing {}", output.display()))?;
    info!(output = %output.display(), copies = copies.len(), "wrote consolidation");
    Ok(())
}
