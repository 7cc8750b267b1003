//! envref CLI - resolve environment-variable references from the command line

use clap::{Parser, Subcommand};
use colored::Colorize;
use envref_core::{
    enumerate_roots, Config, EnvResolver, EnvVarDefinition, Location, ProximityScorer,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "envref")]
#[command(about = "Resolve $VAR references to their NAME=VALUE definitions", long_about = None)]
struct Cli {
    /// Project root to scan (repeatable; defaults to the current directory)
    #[arg(long = "root", global = true)]
    roots: Vec<PathBuf>,

    /// Config file (defaults to .envref.toml in the first root)
    #[arg(long, global = true, env = "ENVREF_CONFIG")]
    config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Log scan progress to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default .envref.toml into the first root
    Init,

    /// Scan definition files and show index stats
    Index,

    /// List every definition of a variable in index order
    Lookup {
        /// Variable name, e.g. DATABASE_URL
        name: String,
    },

    /// List definitions of a variable, nearest to --from first
    Resolve {
        name: String,

        /// File the reference appears in
        #[arg(long)]
        from: Option<PathBuf>,
    },

    /// List the references found in a file
    Refs { file: PathBuf },

    /// Go to the definition of the reference at a position
    Definition {
        file: PathBuf,
        /// Byte offset, or LINE:COLUMN (1-based)
        position: Position,
    },

    /// List all definitions of the reference at a position
    References { file: PathBuf, position: Position },

    /// Show the hover text for the reference at a position
    Hover { file: PathBuf, position: Position },

    /// Show the inline value of every resolvable reference in a file
    Annotate { file: PathBuf },
}

/// A cursor position inside a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    Offset(usize),
    LineColumn(usize, usize),
}

impl FromStr for Position {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || format!("expected a byte offset or LINE:COLUMN, got '{s}'");
        match s.split_once(':') {
            Some((line, column)) => {
                let line: usize = line.parse().map_err(|_| invalid())?;
                let column: usize = column.parse().map_err(|_| invalid())?;
                if line == 0 || column == 0 {
                    return Err(invalid());
                }
                Ok(Self::LineColumn(line, column))
            }
            None => s.parse().map(Self::Offset).map_err(|_| invalid()),
        }
    }
}

impl Position {
    /// Byte offset into `text`, or None when the position is outside it
    fn to_offset(self, text: &str) -> Option<usize> {
        match self {
            Self::Offset(offset) => (offset <= text.len()).then_some(offset),
            Self::LineColumn(line, column) => {
                let mut start = 0usize;
                for (index, content) in text.split('\n').enumerate() {
                    if index + 1 == line {
                        return (column - 1 <= content.len()).then_some(start + column - 1);
                    }
                    start += content.len() + 1;
                }
                None
            }
        }
    }
}

/// 1-based line and column of a byte offset
fn line_column(text: &str, offset: usize) -> (usize, usize) {
    let before = &text[..offset];
    let line = before.matches('\n').count() + 1;
    let column = offset - before.rfind('\n').map(|i| i + 1).unwrap_or(0) + 1;
    (line, column)
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = run(&cli);

    if let Err(e) = result {
        if cli.json {
            let error_json = serde_json::json!({
                "code": if e.is_configuration() { "config_error" } else { "error" },
                "message": e.to_string(),
            });
            eprintln!("{error_json}");
        } else {
            eprintln!("Error: {}", e);
        }
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "envref_cli=debug,envref_core=debug"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> envref_core::Result<()> {
    let roots = if cli.roots.is_empty() {
        vec![std::env::current_dir()?]
    } else {
        cli.roots.clone()
    };

    if let Commands::Init = cli.command {
        return cmd_init(&roots[0]);
    }
    if let Commands::Refs { file } = &cli.command {
        return cmd_refs(file, cli.json);
    }

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default(&roots[0])?,
    };
    let resolver = EnvResolver::new(config)?;
    let project_roots = enumerate_roots(&roots)?;
    let stats = resolver.rebuild(&project_roots).stats;
    tracing::debug!(?stats, "index ready");

    match &cli.command {
        Commands::Init | Commands::Refs { .. } => Ok(()),
        Commands::Index => {
            if cli.json {
                return print_json(&stats);
            }
            println!(
                "{}: {} definitions of {} names",
                "Indexed".green(),
                stats.definitions,
                stats.names
            );
            println!(
                "{}: {} files ({} unreadable) in {} roots ({} excluded)",
                "Scanned".blue(),
                stats.files_scanned,
                stats.files_skipped,
                stats.roots_scanned,
                stats.roots_excluded
            );
            println!("{}: {} ms", "Took".blue(), stats.duration_ms);
            Ok(())
        }
        Commands::Lookup { name } => {
            let definitions = resolver.lookup_definitions(name);
            print_definitions(&definitions, None, cli.json)
        }
        Commands::Resolve { name, from } => {
            let origin = from.as_deref().map(absolute).transpose()?;
            let definitions = resolver.resolve(name, origin.as_deref());
            print_definitions(&definitions, origin.as_deref(), cli.json)
        }
        Commands::Definition { file, position } => {
            let (origin, text) = read_origin(file)?;
            let location = position
                .to_offset(&text)
                .and_then(|offset| resolver.definition_at(&text, offset, Some(&origin)));
            if cli.json {
                return print_json(&location);
            }
            match location {
                Some(location) => println!("{}", location),
                None => println!("{}", "no definition".yellow()),
            }
            Ok(())
        }
        Commands::References { file, position } => {
            let (origin, text) = read_origin(file)?;
            let locations = position
                .to_offset(&text)
                .map(|offset| resolver.references_at(&text, offset, Some(&origin)))
                .unwrap_or_default();
            if cli.json {
                return print_json(&locations);
            }
            if locations.is_empty() {
                println!("{}", "no definitions".yellow());
            }
            for location in &locations {
                println!("{}", location);
            }
            Ok(())
        }
        Commands::Hover { file, position } => {
            let (origin, text) = read_origin(file)?;
            let hover = position
                .to_offset(&text)
                .and_then(|offset| resolver.hover(&text, offset, Some(&origin)));
            if cli.json {
                return print_json(&hover);
            }
            match hover {
                Some(hover) => {
                    println!("{}", hover.markdown);
                    println!("{} {}", "from".dimmed(), hover.source);
                }
                None => println!("{}", "nothing to show".yellow()),
            }
            Ok(())
        }
        Commands::Annotate { file } => {
            let (origin, text) = read_origin(file)?;
            let annotations = resolver.annotate(&text, Some(&origin));
            if cli.json {
                return print_json(&annotations);
            }
            for annotation in &annotations {
                let (line, column) = line_column(&text, annotation.range.start);
                println!(
                    "{}:{}:{} {} {} {}",
                    file.display(),
                    line,
                    column,
                    text[annotation.range.clone()].cyan(),
                    "=>".dimmed(),
                    annotation.text
                );
            }
            Ok(())
        }
    }
}

fn absolute(path: &Path) -> envref_core::Result<PathBuf> {
    Ok(std::path::absolute(path)?)
}

/// Absolute origin path plus the file text
fn read_origin(file: &Path) -> envref_core::Result<(PathBuf, String)> {
    let text = std::fs::read_to_string(file)?;
    Ok((absolute(file)?, text))
}

fn print_json<T: Serialize>(value: &T) -> envref_core::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn cmd_init(root: &Path) -> envref_core::Result<()> {
    let path = Config::init(root)?;
    println!("{} {}", "Created".green(), path.display());
    Ok(())
}

fn cmd_refs(file: &Path, json: bool) -> envref_core::Result<()> {
    let text = std::fs::read_to_string(file)?;
    let references: Vec<_> = envref_core::extract_references(&text).collect();
    if json {
        return print_json(&references);
    }
    for reference in &references {
        let (line, column) = line_column(&text, reference.range.start);
        println!(
            "{}:{}:{} {} {} {}",
            file.display(),
            line,
            column,
            text[reference.range.clone()].cyan(),
            reference.name,
            reference.syntax.as_str().dimmed()
        );
    }
    Ok(())
}

#[derive(Serialize)]
struct RankedDefinition<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    score: Option<u32>,
    #[serde(flatten)]
    definition: &'a EnvVarDefinition,
}

fn print_definitions(
    definitions: &[EnvVarDefinition],
    origin: Option<&Path>,
    json: bool,
) -> envref_core::Result<()> {
    let scorer = origin.map(ProximityScorer::new);
    let ranked: Vec<RankedDefinition<'_>> = definitions
        .iter()
        .map(|definition| RankedDefinition {
            score: scorer.as_ref().map(|s| s.score(definition)),
            definition,
        })
        .collect();

    if json {
        return print_json(&ranked);
    }
    if ranked.is_empty() {
        println!("{}", "no definitions".yellow());
    }
    for entry in &ranked {
        let location: &Location = entry.definition.location();
        let score = entry
            .score
            .map(|s| format!("[{}] ", s).dimmed().to_string())
            .unwrap_or_default();
        println!(
            "{}{}={} {}",
            score,
            entry.definition.name().green(),
            entry.definition.value(),
            location.to_string().cyan()
        );
    }
    Ok(())
}
