use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use kql_compiler::{CompilerConfig, ParsingError, QueryCompiler, StaticSchema};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::level_filters::LevelFilter;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "kqlc")]
#[command(about = "Compile KQL queries into a structured search query tree", long_about = None)]
struct Args {
    /// JSON file mapping field names to keyword, text, numeric or date
    #[arg(long, env = "KQLC_SCHEMA")]
    schema: Option<PathBuf>,

    /// JSON file with compiler settings
    #[arg(long, env = "KQLC_CONFIG")]
    config: Option<PathBuf>,

    /// Print compact JSON instead of pretty JSON
    #[arg(long)]
    compact: bool,

    /// Query to compile; starts an interactive prompt when omitted
    query: Option<String>,
}

fn main() -> Result<()> {
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(directives.as_deref()))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let schema = match &args.schema {
        Some(path) => StaticSchema::from_json_file(path)
            .with_context(|| format!("failed to load schema {}", path.display()))?,
        None => StaticSchema::new(),
    };
    let config = match &args.config {
        Some(path) => CompilerConfig::from_json_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => CompilerConfig::default(),
    };
    info!(
        "kqlc v{} with {} schema field(s)",
        kql_compiler::VERSION,
        schema.len()
    );
    debug!(?config, "compiler settings");

    let compiler = QueryCompiler::with_config(&schema, config);

    match &args.query {
        Some(query) => {
            let tree = compiler
                .compile(query)
                .map_err(|e| anyhow::anyhow!("{}", render_error(query, &e)))?;
            println!("{}", to_json(&tree, args.compact)?);
            Ok(())
        }
        None => run_repl(&compiler, args.compact),
    }
}

/// `RUST_LOG`-style directives, falling back to `warn` when none are given.
fn log_filter(directives: Option<&str>) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .parse_lossy(directives.unwrap_or_default())
}

fn run_repl(compiler: &QueryCompiler<&StaticSchema>, compact: bool) -> Result<()> {
    let mut editor = DefaultEditor::new()?;
    println!("kqlc v{}, Ctrl-D to exit", kql_compiler::VERSION);

    loop {
        match editor.readline("kql> ") {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                editor.add_history_entry(line.as_str())?;

                match compiler.compile(&line) {
                    Ok(tree) => println!("{}", to_json(&tree, compact)?),
                    Err(e) => eprintln!("{}", render_error(&line, &e)),
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}

fn to_json(tree: &kql_compiler::QueryNode, compact: bool) -> Result<String> {
    let json = if compact {
        serde_json::to_string(tree)?
    } else {
        serde_json::to_string_pretty(tree)?
    };
    Ok(json)
}

/// The error message, followed by the offending line with a caret under the column.
fn render_error(input: &str, error: &ParsingError) -> String {
    let line = input.lines().nth(error.line.saturating_sub(1)).unwrap_or("");
    let caret = " ".repeat(error.column.saturating_sub(1));
    format!("error: {error}\n  {line}\n  {caret}^")
}
