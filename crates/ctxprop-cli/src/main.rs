//! ctxprop command-line interface.
//!
//! Provides the `ctxprop` binary. `check` loads a JSON-serialized value graph,
//! runs the marker-propagation analysis over it and prints the findings.
//! `config` prints the default configuration, which is a convenient
//! starting point for a custom one.
//!
//! Configuration is read from `--config`, else from the file named by the
//! `CTXPROP_CONFIG` environment variable, else the built-in zerolog defaults.

mod error;

use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use ctxprop_check::{analyze_with, AnalysisOptions, CheckerConfig, DirectiveIndex, Finding, NoSuppression, Report, RoleClassifier};
use ctxprop_core::{NodeId, Position, ValueGraph};

use error::CliError;

const CONFIG_ENV: &str = "CTXPROP_CONFIG";

/// Checks that request context is propagated into logging call chains.
#[derive(Parser)]
#[command(name = "ctxprop", about = "Checks that request context is propagated into logging call chains")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a serialized value graph.
    Check {
        /// Path to the value graph JSON file.
        graph: PathBuf,

        /// Configuration file (default: $CTXPROP_CONFIG, else built-in).
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format.
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Ignore suppression directives in source files.
        #[arg(long)]
        no_directives: bool,

        /// Directory that source paths in node positions are relative to.
        #[arg(long)]
        source_root: Option<PathBuf>,

        /// Leave procedures declared in `_test.go` files unchecked.
        #[arg(long)]
        skip_tests: bool,

        /// Leave procedures declared in this source file unchecked (repeatable).
        #[arg(long, value_name = "FILE")]
        exclude: Vec<String>,
    },

    /// Print the default configuration as JSON.
    Config,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// File skipping requested on the command line, added to the config's.
struct FileSkips {
    tests: bool,
    exclude: Vec<String>,
}

fn main() {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check {
            graph,
            config,
            format,
            no_directives,
            source_root,
            skip_tests,
            exclude,
        } => {
            let skip = FileSkips { tests: skip_tests, exclude };
            run_check(&graph, config, format, no_directives, source_root.as_deref(), skip)
        }
        Commands::Config => print_default_config(),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(e.exit_code());
        }
    }
}

/// Execute the check subcommand.
///
/// Returns exit code: 0 = no findings, 1 = findings reported.
fn run_check(
    graph_path: &Path,
    config_path: Option<PathBuf>,
    format: OutputFormat,
    no_directives: bool,
    source_root: Option<&Path>,
    skip: FileSkips,
) -> Result<i32, CliError> {
    let mut config = load_config(config_path)?;
    config.skip_test_files |= skip.tests;
    config.exclude_files.extend(skip.exclude);

    let data = std::fs::read_to_string(graph_path).map_err(|source| CliError::Io {
        path: graph_path.to_path_buf(),
        source,
    })?;
    let graph: ValueGraph = serde_json::from_str(&data).map_err(|source| CliError::Decode {
        path: graph_path.to_path_buf(),
        source,
    })?;
    tracing::info!(
        nodes = graph.node_count(),
        procedures = graph.procedure_count(),
        "loaded value graph"
    );

    let table = config.role_table();
    let options = config.analysis_options();
    let report = if no_directives {
        analyze_with(&graph, &table, &mut NoSuppression, &options)
    } else {
        let mut index = load_directives(&graph, &config.directive, source_root, &options)?;
        analyze_with(&graph, &table, &mut index, &options)
    };

    match format {
        OutputFormat::Text => print_text(&report, table.setter_name()),
        OutputFormat::Json => print_json(&report, table.setter_name())?,
    }

    Ok(if report.is_clean() { 0 } else { 1 })
}

fn load_config(path: Option<PathBuf>) -> Result<CheckerConfig, CliError> {
    let Some(path) = path.or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from)) else {
        return Ok(CheckerConfig::default());
    };
    let json = std::fs::read_to_string(&path).map_err(|source| CliError::ConfigRead {
        path: path.clone(),
        source,
    })?;
    CheckerConfig::from_json(&json).map_err(|source| CliError::Config { path, source })
}

/// Parses directives from every checked source file a node position refers to.
fn load_directives(
    graph: &ValueGraph,
    directive: &str,
    root: Option<&Path>,
    options: &AnalysisOptions,
) -> Result<DirectiveIndex, CliError> {
    let values = graph.values();
    let files: BTreeSet<&str> = values
        .node_indices()
        .filter_map(|idx| values.node_weight(idx))
        .filter_map(|node| node.pos.as_ref())
        .map(|pos| pos.file.as_str())
        .filter(|file| !options.skips_file(file))
        .collect();

    let mut index = DirectiveIndex::new();
    for file in files {
        let path = match root {
            Some(root) => root.join(file),
            None => PathBuf::from(file),
        };
        match std::fs::read_to_string(&path) {
            Ok(source) => index.add_source(file, &source, directive),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::warn!("source file {} not found; directives there are ignored", path.display());
            }
            Err(source) => return Err(CliError::Io { path, source }),
        }
    }
    Ok(index)
}

fn print_text(report: &Report, setter: &str) {
    for finding in report.findings() {
        let location = match (&finding.position, finding.node) {
            (Some(pos), _) => pos.to_string(),
            (None, Some(node)) => format!("<unknown> (node {})", node),
            (None, None) => "<unknown>".to_string(),
        };
        println!("{}: {}", location, finding.message(setter));
    }
    if !report.is_clean() {
        eprintln!("{} finding(s)", report.len());
    }
}

/// One finding in machine-readable output.
#[derive(Serialize)]
struct JsonFinding<'a> {
    kind: &'a ctxprop_check::FindingKind,
    node: Option<NodeId>,
    position: Option<&'a Position>,
    marker: &'a str,
    message: String,
}

impl<'a> JsonFinding<'a> {
    fn new(finding: &'a Finding, setter: &str) -> Self {
        JsonFinding {
            kind: &finding.kind,
            node: finding.node,
            position: finding.position.as_ref(),
            marker: &finding.marker,
            message: finding.message(setter),
        }
    }
}

fn print_json(report: &Report, setter: &str) -> Result<(), CliError> {
    let findings: Vec<JsonFinding<'_>> = report
        .findings()
        .iter()
        .map(|f| JsonFinding::new(f, setter))
        .collect();
    println!("{}", serde_json::to_string_pretty(&findings)?);
    Ok(())
}

fn print_default_config() -> Result<i32, CliError> {
    let json = CheckerConfig::default()
        .to_json_pretty()
        .map_err(|source| CliError::Config {
            path: PathBuf::from("<default>"),
            source,
        })?;
    println!("{}", json);
    Ok(0)
}
