use std::collections::BTreeMap;
use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::json;

use crate::api::dto::GraphDto;
use crate::domain::flowgraph::FlowGraph;
use crate::domain::index::{FunctionIndex, VariableIndex};
use crate::domain::locate;
use crate::domain::trace::FlowTracer;
use crate::infrastructure::{SynOccurrenceScanner, TraceLogReplayer};
use crate::ports::OccurrenceSource;

#[derive(Debug, Deserialize)]
struct CommandReq {
    command: String,
    params: Option<serde_json::Value>,
}

pub fn start_server(port: u16) -> Result<()> {
    let address = format!("127.0.0.1:{}", port);
    let listener = TcpListener::bind(&address)
        .with_context(|| format!("Failed to bind to {}", address))?;

    println!("[VarFlow] API Server listening on {}", address);

    for stream in listener.incoming() {
        match stream {
            Ok(stream) => {
                thread::spawn(move || {
                    if let Err(e) = handle_connection(stream) {
                        eprintln!("[API] Connection error: {}", e);
                    }
                });
            }
            Err(e) => eprintln!("[API] Accept error: {}", e),
        }
    }

    Ok(())
}

fn handle_connection(mut stream: TcpStream) -> Result<()> {
    let mut reader = BufReader::new(stream.try_clone()?);
    let mut line = String::new();

    loop {
        line.clear();
        let bytes_read = reader.read_line(&mut line)?;
        if bytes_read == 0 {
            break; // Connection closed
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let response = match process_command(trimmed) {
            Ok(data) => json!({
                "status": "success",
                "data": data
            }),
            Err(e) => json!({
                "status": "error",
                "message": e.to_string()
            }),
        };

        let response_str = serde_json::to_string(&response)?;
        stream.write_all(response_str.as_bytes())?;
        stream.write_all(b"\n")?;

        if let Ok(req) = serde_json::from_str::<CommandReq>(trimmed) {
            if req.command == "SHUTDOWN" {
                println!("[API] Shutdown requested.");
                std::process::exit(0);
            }
        }
    }
    Ok(())
}

fn process_command(json_str: &str) -> Result<serde_json::Value> {
    let req: CommandReq = serde_json::from_str(json_str).context("Invalid JSON format")?;

    match req.command.as_str() {
        "PING" => Ok(json!("PONG")),
        "ANALYZE" => handle_analyze(req.params),
        "TRACE" => handle_trace(req.params),
        "VARIABLES" => handle_variables(req.params),
        "SHUTDOWN" => Ok(json!("Shutting down...")),
        _ => anyhow::bail!("Unknown command: {}", req.command),
    }
}

fn str_param<'a>(params: &'a serde_json::Value, key: &str) -> Result<&'a str> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| anyhow::anyhow!("Missing '{}' param", key))
}

fn line_param(params: &serde_json::Value) -> Option<usize> {
    params.get("line").and_then(|v| v.as_u64()).map(|v| v as usize)
}

/// Static flow for one source file:
/// `{"command":"ANALYZE","params":{"path":"...","variable":"value","line":12}}`
fn handle_analyze(params: Option<serde_json::Value>) -> Result<serde_json::Value> {
    let params = params.ok_or_else(|| anyhow::anyhow!("Missing params for ANALYZE"))?;
    let path = str_param(&params, "path")?;
    let variable = str_param(&params, "variable")?;

    println!("[API] Analyzing '{}' in: {}", variable, path);

    let code = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read source file: {}", path))?;
    let sources = vec![(path.to_string(), code)];

    let occurrences = SynOccurrenceScanner.scan(&sources, variable)?;
    let current = line_param(&params)
        .and_then(|line| locate::closest_occurrence_node_id(&occurrences, line));
    let graph = FlowGraph::from_occurrences(&occurrences, current.as_deref());

    Ok(serde_json::to_value(GraphDto::from(&graph))?)
}

/// Dynamic flow from a recorded event log:
/// `{"command":"TRACE","params":{"path":"...","log":"...","variable":"value","line":12,"gated":false}}`
fn handle_trace(params: Option<serde_json::Value>) -> Result<serde_json::Value> {
    let params = params.ok_or_else(|| anyhow::anyhow!("Missing params for TRACE"))?;
    let path = str_param(&params, "path")?;
    let log = str_param(&params, "log")?;
    let variable = str_param(&params, "variable")?;
    let gated = params
        .get("gated")
        .and_then(|v| v.as_bool())
        .unwrap_or(false);

    SynOccurrenceScanner::validate_identifier(variable)?;
    println!("[API] Tracing '{}' over log: {}", variable, log);

    let code = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read source file: {}", path))?;
    let sources = vec![(path.to_string(), code)];
    let declared = FunctionIndex::build(&sources).declared_names();

    let tracer = if gated {
        FlowTracer::gated(variable, declared)
    } else {
        FlowTracer::new(variable, declared)
    };
    let outcome = TraceLogReplayer::replay_file(log, tracer)?;

    let current = line_param(&params).and_then(|line| locate::closest_node_id(&outcome.steps, line));
    let graph = FlowGraph::from_trace(&outcome.steps, current.as_deref());

    // A traced-program failure still yields the partial graph; the error
    // rides along for the caller to report.
    Ok(json!({
        "graph": GraphDto::from(&graph),
        "traced_error": outcome.error.map(|e| e.to_string()),
    }))
}

/// Selectable identifiers and declared functions for a source file:
/// `{"command":"VARIABLES","params":{"path":"..."}}`
fn handle_variables(params: Option<serde_json::Value>) -> Result<serde_json::Value> {
    let params = params.ok_or_else(|| anyhow::anyhow!("Missing params for VARIABLES"))?;
    let path = str_param(&params, "path")?;

    let code = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read source file: {}", path))?;
    let sources = vec![(path.to_string(), code)];

    let mut functions: Vec<_> = FunctionIndex::build(&sources)
        .functions
        .iter()
        .map(|r| r.value().clone())
        .collect();
    functions.sort_by_key(|record| record.start_line);

    // Sorted map keeps the payload deterministic for the caller.
    let variables: BTreeMap<String, Vec<(String, usize)>> = VariableIndex::build(&sources)
        .locations
        .iter()
        .map(|r| (r.key().clone(), r.value().clone()))
        .collect();

    Ok(json!({
        "functions": functions,
        "variables": variables,
    }))
}
