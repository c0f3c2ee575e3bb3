//! Trace Log Ingestor
//!
//! Replays a recorded instrumentation event log through the tracer hook.
//! The log is JSON lines, one event per line, as emitted by a host
//! runtime's debugger/step hooks:
//!
//! ```text
//! {"event":"call","function":"initialize","line":2,"locals":{}}
//! {"event":"line","function":"initialize","line":3,"locals":{"value":10}}
//! {"event":"error","message":"division by zero"}
//! ```
//!
//! An `error` record marks the point where the traced program raised; the
//! flow collected up to it is preserved and the error is surfaced.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;

use crate::common::FlowError;
use crate::domain::trace::{FlowTracer, FrameSnapshot, TraceHook, TraceOutcome};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum EventKind {
    Call,
    Line,
    Error,
}

#[derive(Debug, Deserialize)]
struct EventRecord {
    event: EventKind,
    #[serde(default)]
    function: String,
    #[serde(default)]
    line: usize,
    #[serde(default)]
    locals: HashMap<String, Value>,
    #[serde(default)]
    message: Option<String>,
}

impl EventRecord {
    fn into_frame(self) -> FrameSnapshot {
        FrameSnapshot {
            function: self.function,
            line: self.line,
            locals: self.locals,
        }
    }
}

pub struct TraceLogReplayer;

impl TraceLogReplayer {
    /// Replay a log file through the tracer.
    pub fn replay_file(path: &str, tracer: FlowTracer) -> Result<TraceOutcome> {
        println!("[Trace] Replaying event log: {}", path);
        let file = File::open(path).with_context(|| format!("Cannot open trace log: {}", path))?;
        Self::replay_reader(BufReader::new(file), tracer)
    }

    /// Replay an in-memory log (tests, API payloads).
    pub fn replay_str(log: &str, tracer: FlowTracer) -> Result<TraceOutcome> {
        Self::replay_reader(BufReader::new(log.as_bytes()), tracer)
    }

    pub fn replay_reader<R: BufRead>(reader: R, tracer: FlowTracer) -> Result<TraceOutcome> {
        let mut tracer = tracer;
        let mut error = None;

        for (number, line) in reader.lines().enumerate() {
            let line =
                line.with_context(|| format!("Failed reading trace log line {}", number + 1))?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let record: EventRecord = serde_json::from_str(trimmed)
                .with_context(|| format!("Malformed trace event on line {}", number + 1))?;
            match record.event {
                EventKind::Call => tracer.on_call(&record.into_frame()),
                EventKind::Line => tracer.on_line(&record.into_frame()),
                EventKind::Error => {
                    // The traced program died here; nothing follows.
                    error = Some(FlowError::TracedExecution(
                        record
                            .message
                            .unwrap_or_else(|| "unspecified failure".to_string()),
                    ));
                    break;
                }
            }
        }

        Ok(TraceOutcome {
            steps: tracer.finish(),
            error,
        })
    }
}
