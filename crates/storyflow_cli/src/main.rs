//! Storyflow CLI
//!
//! Authoring tool for branching quiz stories: validate, preview every path,
//! play through with scripted answers, export the schema, pack bundles.

mod lint;
mod load;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use storyflow_core::api::{encode_bundle, story_schema, validate_story};
use storyflow_core::story::PathEnd;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "storyflow")]
#[command(about = "Validate, preview and play branching quiz stories", long_about = None)]
struct Cli {
    /// Log level when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a story and list authoring warnings
    Validate {
        /// Story records file (.json, .yaml, .yml)
        #[arg(long)]
        r#in: PathBuf,

        /// Print the validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Preview every path through a story
    Paths {
        #[arg(long)]
        r#in: PathBuf,

        /// Traversal limits JSON file
        #[arg(long)]
        limits: Option<PathBuf>,
    },

    /// Play a story with scripted answers
    Play {
        #[arg(long)]
        r#in: PathBuf,

        /// Answers file: part id → list of answer sets, used in visit order
        #[arg(long)]
        answers: PathBuf,

        #[arg(long)]
        limits: Option<PathBuf>,
    },

    /// Print the JSON schema of story records
    Schema,

    /// Write a MessagePack bundle of story records
    Pack {
        #[arg(long)]
        r#in: PathBuf,

        #[arg(long)]
        out: PathBuf,
    },
}

fn init_tracing(log_level: &str) {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("storyflow={},storyflow_core={}", log_level, log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let mut out = io::stdout().lock();
    match cli.command {
        Commands::Validate { r#in, json } => run_validate(&r#in, json, &mut out),
        Commands::Paths { r#in, limits } => run_paths(&r#in, limits.as_deref(), &mut out),
        Commands::Play { r#in, answers, limits } => {
            run_play(&r#in, &answers, limits.as_deref(), &mut out)
        }
        Commands::Schema => {
            let schema = serde_json::to_string_pretty(&story_schema())?;
            writeln!(out, "{}", schema)?;
            Ok(())
        }
        Commands::Pack { r#in, out: target } => run_pack(&r#in, &target),
    }
}

fn run_validate(path: &Path, json: bool, out: &mut impl Write) -> Result<()> {
    let records = load::load_records(path)?;
    let (parts, tables) = records.clone().assemble().context("Malformed story records")?;

    let mut lints = lint::lint_parts(&parts);
    lints.extend(lint::lint_tables(&tables));
    if let Ok(graph) = records.clone().build_graph() {
        lints.extend(lint::lint_graph(&graph));
    }

    let report = validate_story(records)?;
    debug!(errors = report.errors.len(), lints = lints.len(), "validation finished");

    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
    } else {
        writeln!(out, "Story: {}", report.story_id.as_deref().unwrap_or("<unnamed>"))?;
        for issue in &report.errors {
            writeln!(out, "  error   [{}] {}", issue.kind, issue.message)?;
        }
        for lint in &lints {
            writeln!(out, "  warning {}", lint)?;
        }
        if report.valid {
            writeln!(
                out,
                "OK: {} reachable part(s) from {}",
                report.reachable_part_ids.len(),
                report.initial_part_id.as_deref().unwrap_or("?")
            )?;
        }
    }

    if !report.valid {
        bail!("story failed validation with {} error(s)", report.errors.len());
    }
    Ok(())
}

fn run_paths(path: &Path, limits: Option<&Path>, out: &mut impl Write) -> Result<()> {
    let limits = load::load_limits(limits)?;
    let graph = load::load_records(path)?.build_graph().context("Story is not valid")?;

    let enumeration = graph.enumerate_paths(&limits);
    for (i, preview) in enumeration.paths.iter().enumerate() {
        let end = match &preview.end {
            PathEnd::Terminal => "end".to_string(),
            PathEnd::Cycle { back_to } => format!("loops back to {}", back_to),
            PathEnd::DepthLimit => "depth limit".to_string(),
        };
        writeln!(out, "{:>3}. {} ({})", i + 1, preview.part_ids.join(" -> "), end)?;
    }
    if enumeration.truncated {
        writeln!(out, "... truncated after {} path(s)", limits.max_paths)?;
    }
    Ok(())
}

fn run_play(
    path: &Path,
    answers: &Path,
    limits: Option<&Path>,
    out: &mut impl Write,
) -> Result<()> {
    let limits = load::load_limits(limits)?;
    let graph = load::load_records(path)?.build_graph().context("Story is not valid")?;
    let mut script = load::AnswerScript::load(answers)?;

    let playthrough = graph.resolve_sequence(&mut script, &limits)?;
    info!(steps = playthrough.steps.len(), end = ?playthrough.end, "playthrough finished");

    writeln!(out, "{}", playthrough.part_ids[0])?;
    for (step, part_id) in playthrough.steps.iter().zip(playthrough.part_ids.iter().skip(1)) {
        let reason = serde_json::to_value(step.reason)?;
        writeln!(out, "  -> {} ({})", part_id, reason.as_str().unwrap_or(""))?;
    }
    if script.remaining() > 0 {
        writeln!(out, "note: {} scripted answer set(s) were not used", script.remaining())?;
    }
    Ok(())
}

fn run_pack(path: &Path, out: &Path) -> Result<()> {
    let records = load::load_records(path)?;
    let bytes = encode_bundle(&records)?;
    fs::write(out, &bytes).with_context(|| format!("Failed to write {}", out.display()))?;
    info!(bytes = bytes.len(), out = %out.display(), "bundle written");
    Ok(())
}
