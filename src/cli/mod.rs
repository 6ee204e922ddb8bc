//! CLI argument parsing and command implementations for the biograph binary.

use crate::pipeline::{process_file, process_directory, RunContext};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;

/// Biography graph synthesis from multi-tool annotation bundles
#[derive(Parser)]
#[command(name = "biograph")]
#[command(
    author,
    version,
    about = "Biography graph synthesis from multi-tool annotation bundles",
    long_about = r#"
biograph - fuse disagreeing annotation layers into one biography graph

WHAT IT DOES:
  • Merges NER, relation, semantic-role, entity-linking, temporal and
    coreference layers into one span-keyed record per mention
  • Unifies mentions into entities via coreference, with a surface-form
    fallback for everything the resolver missed
  • Types entities (person / place / group / cultural-object) and mints
    stable identifiers (encyclopedia slug when linked, counter otherwise)
  • Synthesizes relation and date-anchored events with shared role and
    event-kind vocabularies

EXAMPLES:
  biograph convert albrecht_duerer.nlp.json
  biograph convert albrecht_duerer.nlp.json -o duerer.graph.json --subject duerer
  biograph batch data/art_nouveau --group art_nouveau --merge
"#
)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// Convert one annotation bundle into a biography graph
    #[command(visible_alias = "c")]
    Convert(ConvertArgs),

    /// Process a directory of bundles, one graph per document
    #[command(visible_alias = "b")]
    Batch(BatchArgs),
}

/// Arguments for `biograph convert`.
#[derive(Parser, Debug)]
pub struct ConvertArgs {
    /// Annotation bundle to convert
    pub input: PathBuf,

    /// Output path (defaults to `<stem>.graph.json` next to the input)
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Subject namespace for identifiers (defaults to the filename's last
    /// underscore-separated segment)
    #[arg(long, value_name = "ID")]
    pub subject: Option<String>,
}

/// Arguments for `biograph batch`.
#[derive(Parser, Debug)]
pub struct BatchArgs {
    /// Directory of annotation bundles
    pub dir: PathBuf,

    /// Group or movement label
    #[arg(short, long, value_name = "LABEL")]
    pub group: String,

    /// Output directory (defaults to the input directory)
    #[arg(long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// Additionally write a merged group-level graph
    #[arg(long)]
    pub merge: bool,
}

/// Run a parsed CLI invocation.
pub fn run(cli: Cli) -> Result<(), String> {
    match cli.command {
        Commands::Convert(args) => cmd_convert(args),
        Commands::Batch(args) => cmd_batch(args),
    }
}

fn cmd_convert(args: ConvertArgs) -> Result<(), String> {
    let graph = match &args.subject {
        Some(subject) => {
            let raw = fs::read_to_string(&args.input)
                .map_err(|e| format!("{}: {e}", args.input.display()))?;
            let bundle = serde_json::from_str(&raw)
                .map_err(|e| format!("{}: {e}", args.input.display()))?;
            crate::pipeline::process_bundle(&bundle, &RunContext::new(subject))
        }
        None => process_file(&args.input),
    }
    .map_err(|e| e.to_string())?;

    let output = args.output.unwrap_or_else(|| {
        let stem = args
            .input
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("document")
            .split('.')
            .next()
            .unwrap_or("document")
            .to_string();
        args.input.with_file_name(format!("{stem}.graph.json"))
    });
    let json = graph.to_json().map_err(|e| e.to_string())?;
    fs::write(&output, json).map_err(|e| format!("{}: {e}", output.display()))?;
    println!(
        "{}: {} entities, {} events",
        output.display(),
        graph.entity_count(),
        graph.event_count()
    );
    Ok(())
}

fn cmd_batch(args: BatchArgs) -> Result<(), String> {
    let out_dir = args.out_dir.clone().unwrap_or_else(|| args.dir.clone());
    let summary = process_directory(&args.dir, &args.group, &out_dir, args.merge)
        .map_err(|e| e.to_string())?;
    println!(
        "processed {} document(s), {} failed",
        summary.processed.len(),
        summary.failed.len()
    );
    for id in &summary.failed {
        eprintln!("failed: {id}");
    }
    if let Some(path) = &summary.merged_path {
        println!("merged group graph: {}", path.display());
    }
    Ok(())
}
