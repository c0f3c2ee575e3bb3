// Infrastructure implementations for VarFlow.

pub mod classifier;
pub mod concurrency;
pub mod project_loader;
pub mod syn_walker;
pub mod trace_ingest;

pub use classifier::SynOccurrenceScanner;
pub use project_loader::ProjectLoader;
pub use syn_walker::SynSyntaxWalker;
pub use trace_ingest::TraceLogReplayer;

use crate::api::dto::GraphDto;
use crate::domain::flowgraph::FlowGraph;
use crate::ports::GraphExporter;

/// Writes the graph as the JSON render contract.
pub struct JsonExporter;

impl GraphExporter for JsonExporter {
    fn export(&self, graph: &FlowGraph, path: &str) -> std::io::Result<()> {
        let dto = GraphDto::from(graph);
        let content = serde_json::to_string_pretty(&dto)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        std::fs::write(path, content)
    }
}
