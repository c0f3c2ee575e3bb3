use crate::common::FlowError;
use crate::domain::flowgraph::FlowGraph;
use crate::domain::occurrence::Occurrence;

pub mod flowchart_exporter;

/// Static side of the pipeline: classify every occurrence of a variable
/// across a set of `(file_path, source)` pairs.
pub trait OccurrenceSource {
    fn scan(
        &self,
        sources: &[(String, String)],
        variable: &str,
    ) -> Result<Vec<Occurrence>, FlowError>;
}

/// Rendering handoff: persist the node/edge/color/style contract.
pub trait GraphExporter {
    fn export(&self, graph: &FlowGraph, path: &str) -> std::io::Result<()>;
}
