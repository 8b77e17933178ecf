mod analysis;

use analysis::Module;
use clap::Parser;
use reqeval_core::config::{CliOverrides, EvaluatorConfig};
use reqeval_core::di::Container;
use reqeval_core::diagnostics::{CollectingDiagnosticHandler, Diagnostic, DiagnosticHandler};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG: &str = "reqeval.yaml";

/// reqeval - evaluate declaration graphs with a demand-driven request evaluator
#[derive(Parser, Debug, Clone)]
#[command(name = "reqeval")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Graph files to analyze (.yaml, .yml or .json)
    #[arg(value_name = "FILE")]
    files: Vec<PathBuf>,

    /// Path to reqeval.yaml configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Record and print the request dependency tree of every file
    #[arg(long)]
    record_dependencies: bool,

    /// Write the request dependency graph in Graphviz format
    #[arg(long, value_name = "FILE")]
    graphviz: Option<PathBuf>,

    /// Print per-request-kind statistics
    #[arg(long)]
    stats: bool,

    /// Log every detected cycle with its full chain
    #[arg(long)]
    debug_cycles: bool,

    /// Plain diagnostics without terminal styling
    #[arg(long)]
    no_pretty: bool,

    /// Write a default configuration and a sample graph
    #[arg(long)]
    init: bool,
}

fn main() -> anyhow::Result<()> {
    // RUST_LOG=debug shows cache hits, RUST_LOG=trace every request
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if cli.init {
        init_project()?;
        return Ok(());
    }

    let config = load_config(&cli)?;

    if cli.files.is_empty() {
        eprintln!("Error: No input files specified. Use --help for usage information.");
        std::process::exit(1);
    }

    info!("Analyzing {} file(s)", cli.files.len());
    run(&cli, config)
}

/// Write a default configuration and a sample graph into the current directory
fn init_project() -> anyhow::Result<()> {
    println!("Initializing new reqeval project...");

    EvaluatorConfig::init_file(Path::new(DEFAULT_CONFIG))?;
    println!("Created {}", DEFAULT_CONFIG);

    let sample = r#"# Each declaration has a weight and the declarations it depends on.
declarations:
  - name: main
    weight: 1
    dependsOn: [parse, check]
  - name: parse
    weight: 3
    dependsOn: [lex]
  - name: check
    weight: 5
    dependsOn: [parse]
  - name: lex
    weight: 2
"#;
    std::fs::write("graph.yaml", sample)?;
    println!("Created graph.yaml");

    println!("\nRun 'reqeval graph.yaml' to analyze the sample graph.");
    Ok(())
}

/// Configuration file (explicit or found in the current directory) with
/// command line flags applied on top
fn load_config(cli: &Cli) -> anyhow::Result<EvaluatorConfig> {
    let mut config = if let Some(ref path) = cli.config {
        EvaluatorConfig::from_file(path)
            .map_err(|e| anyhow::anyhow!("Failed to load config file: {}", e))?
    } else {
        let default_path = PathBuf::from(DEFAULT_CONFIG);
        if default_path.exists() {
            EvaluatorConfig::from_file(&default_path)
                .map_err(|e| anyhow::anyhow!("Failed to load {}: {}", DEFAULT_CONFIG, e))?
        } else {
            EvaluatorConfig::default()
        }
    };

    let mut overrides = CliOverrides::default();
    if cli.record_dependencies || cli.graphviz.is_some() {
        overrides.record_dependencies = Some(true);
    }
    if cli.stats {
        overrides.collect_statistics = Some(true);
    }
    if cli.debug_cycles {
        overrides.debug_cycles = Some(true);
    }
    if cli.no_pretty {
        overrides.pretty = Some(false);
    }
    config.merge_with_cli(&overrides);

    Ok(config)
}

/// What analyzing one file produced, ready to be reported in file order
struct FileOutput {
    path: PathBuf,
    result: anyhow::Result<Analysis>,
}

struct Analysis {
    lines: Vec<String>,
    diagnostics: Vec<Diagnostic>,
    dependency_tree: Option<String>,
    graphviz: Option<String>,
}

/// Analyze one file with its own evaluator.
///
/// Evaluators are single-threaded, so each worker builds its own and keeps
/// its diagnostics apart until the results are reported.
fn analyze_file(container: &Container, path: &Path) -> anyhow::Result<Analysis> {
    let module = Module::load(path)?;
    let diagnostics = Arc::new(CollectingDiagnosticHandler::new());
    let mut evaluator = container.evaluator_reporting_to(diagnostics.clone());

    let lines = analysis::analyze(&mut evaluator, &module);
    let metrics = evaluator.metrics();
    debug!(
        file = %path.display(),
        computations = metrics.computations,
        cache_hits = metrics.cache_hits,
        external_cache_hits = metrics.external_cache_hits,
        cycles = metrics.cycles_detected,
        "analyzed"
    );

    Ok(Analysis {
        lines,
        diagnostics: diagnostics.get_diagnostics(),
        dependency_tree: evaluator.dependencies().map(|deps| deps.print_all()),
        graphviz: evaluator.dump_dependencies_graphviz(),
    })
}

fn run(cli: &Cli, config: EvaluatorConfig) -> anyhow::Result<()> {
    use rayon::prelude::*;

    let container = Container::new(config);

    let results: Vec<FileOutput> = cli
        .files
        .par_iter()
        .map(|path| FileOutput {
            path: path.clone(),
            result: analyze_file(&container, path),
        })
        .collect();

    // Trees go to stdout unless the graph was only requested as a file
    let print_trees = container.config().evaluator_options.record_dependencies
        && (cli.record_dependencies || cli.graphviz.is_none());
    let show_headers = results.len() > 1;

    let mut had_errors = false;
    let mut graphviz = String::new();

    for output in results {
        let file_name = output.path.display().to_string();
        match output.result {
            Ok(analysis) => {
                if show_headers {
                    println!("{}:", file_name);
                }
                for line in &analysis.lines {
                    println!("{}", line);
                }
                if print_trees {
                    if let Some(tree) = &analysis.dependency_tree {
                        print!("{}", tree);
                    }
                }

                for diagnostic in analysis.diagnostics {
                    let message = format!("{}: {}", file_name, diagnostic.message);
                    container.diagnostic_handler().report(Diagnostic {
                        message,
                        ..diagnostic
                    });
                }

                if let Some(dot) = analysis.graphviz {
                    graphviz.push_str(&dot);
                }
            }
            Err(error) => {
                had_errors = true;
                eprintln!("Error analyzing {}: {:#}", file_name, error);
            }
        }
    }

    if let Some(ref path) = cli.graphviz {
        std::fs::write(path, &graphviz)?;
        info!("Wrote dependency graph to {}", path.display());
    }

    if let Some(stats) = container.stats() {
        eprint!("{}", stats.summary());
    }

    if had_errors || container.has_errors() {
        std::process::exit(1);
    }

    Ok(())
}
