// Command-line entry point for VarFlow.

use anyhow::{bail, Context, Result};
use clap::Parser;
use varflow::application::{DynamicFlowUsecase, StaticFlowUsecase};
use varflow::domain::index::FunctionIndex;
use varflow::domain::trace::FlowTracer;
use varflow::infrastructure::concurrency::init_thread_pool;
use varflow::infrastructure::{JsonExporter, ProjectLoader, SynOccurrenceScanner, TraceLogReplayer};
use varflow::ports::flowchart_exporter::FlowchartExporter;
use varflow::ports::GraphExporter;
use std::fs;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input source file path (can specify multiple)
    #[arg(short, long, required = false)]
    input: Vec<String>,

    /// Input source folder(s)
    #[arg(short = 'd', long, required = false)]
    folder: Vec<String>,

    /// Workspace Cargo.toml
    #[arg(long, required = false)]
    workspace: Option<String>,

    /// Variable to trace
    #[arg(short, long)]
    variable: Option<String>,

    /// Current line (the click point); colors the flow around it
    #[arg(short, long)]
    line: Option<usize>,

    /// Recorded trace event log; switches from static to dynamic mode
    #[arg(short, long)]
    trace: Option<String>,

    /// Suppress dynamic activations until the variable first binds
    #[arg(long)]
    gated: bool,

    /// Output file path
    #[arg(short, long, required = false)]
    output: Option<String>,

    /// Output format (dot, json)
    #[arg(short = 'f', long, default_value = "dot")]
    format: String,

    /// Serve the line-protocol API on this port instead of a one-shot run
    #[arg(long)]
    serve: Option<u16>,
}

fn collect_sources(cli: &Cli) -> Result<Vec<(String, String)>> {
    let mut sources: Vec<(String, String)> = vec![];

    for input_file in &cli.input {
        if let Ok(code) = fs::read_to_string(input_file) {
            sources.push((input_file.clone(), code));
        } else {
            eprintln!("[VarFlow] WARN: cannot read input file: {}", input_file);
        }
    }

    for folder in &cli.folder {
        sources.extend(ProjectLoader::load_folder(folder)?);
    }

    if let Some(manifest) = &cli.workspace {
        let ws_sources = ProjectLoader::load_workspace(manifest)?;
        println!("[VarFlow] Workspace collected {} source files", ws_sources.len());
        sources.extend(ws_sources);
    }

    Ok(sources)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(port) = cli.serve {
        return varflow::api::server::start_server(port);
    }

    init_thread_pool()?;

    let sources = collect_sources(&cli)?;
    if sources.is_empty() {
        bail!("Please provide at least one --input <file> or --folder <dir> or --workspace <Cargo.toml>");
    }

    let variable = cli
        .variable
        .as_deref()
        .context("--variable is required unless serving")?;
    let output = cli
        .output
        .as_deref()
        .context("--output is required unless serving")?;

    let exporter: &dyn GraphExporter = match cli.format.as_str() {
        "dot" => &FlowchartExporter,
        "json" => &JsonExporter,
        other => bail!("Unknown output format: {}", other),
    };

    let graph = if let Some(log) = &cli.trace {
        SynOccurrenceScanner::validate_identifier(variable)?;
        let declared = FunctionIndex::build(&sources).declared_names();
        let tracer = if cli.gated {
            FlowTracer::gated(variable, declared)
        } else {
            FlowTracer::new(variable, declared)
        };
        let outcome = TraceLogReplayer::replay_file(log, tracer)?;
        if let Some(error) = &outcome.error {
            eprintln!("[VarFlow] WARN: {}; rendering the partial flow", error);
        }
        let usecase = DynamicFlowUsecase { exporter };
        usecase.run(&outcome.steps, cli.line, output)?
    } else {
        let usecase = StaticFlowUsecase {
            scanner: &SynOccurrenceScanner,
            exporter,
        };
        usecase.run(&sources, variable, cli.line, output)?
    };

    println!(
        "Flow for '{}': {} nodes, {} edges written to {} (format: {})",
        variable,
        graph.nodes.len(),
        graph.edges.len(),
        output,
        cli.format
    );

    Ok(())
}
