use anyhow::Result;

use crate::domain::flowgraph::FlowGraph;
use crate::domain::locate;
use crate::domain::trace::TraceStep;
use crate::ports::{GraphExporter, OccurrenceSource};

/// Static path: classify occurrences, build the graph, export.
pub struct StaticFlowUsecase<'a> {
    pub scanner: &'a dyn OccurrenceSource,
    pub exporter: &'a dyn GraphExporter,
}

impl StaticFlowUsecase<'_> {
    pub fn run(
        &self,
        sources: &[(String, String)],
        variable: &str,
        current_line: Option<usize>,
        export_path: &str,
    ) -> Result<FlowGraph> {
        let occurrences = self.scanner.scan(sources, variable)?;
        let current = current_line.and_then(|line| {
            locate::closest_occurrence_node_id(&occurrences, line)
        });
        let graph = FlowGraph::from_occurrences(&occurrences, current.as_deref());
        self.exporter.export(&graph, export_path)?;
        Ok(graph)
    }
}

/// Dynamic path: designate the current node from the click line, build
/// the graph from the replayed trace, export.
pub struct DynamicFlowUsecase<'a> {
    pub exporter: &'a dyn GraphExporter,
}

impl DynamicFlowUsecase<'_> {
    pub fn run(
        &self,
        steps: &[TraceStep],
        current_line: Option<usize>,
        export_path: &str,
    ) -> Result<FlowGraph> {
        let current = current_line.and_then(|line| locate::closest_node_id(steps, line));
        let graph = FlowGraph::from_trace(steps, current.as_deref());
        self.exporter.export(&graph, export_path)?;
        Ok(graph)
    }
}
