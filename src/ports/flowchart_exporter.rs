//! Flowchart DOT Exporter
//!
//! Exports a FlowGraph as Graphviz DOT with flowchart styling: three
//! distinguishable node colors (past, current, future) and two edge
//! styles (sequential solid, conditional dashed). Layout stays the
//! renderer's concern.

use crate::domain::flowgraph::{EdgeStyle, FlowGraph, NodeColor};
use crate::ports::GraphExporter;
use std::io::Result;

pub struct FlowchartExporter;

impl GraphExporter for FlowchartExporter {
    fn export(&self, flow: &FlowGraph, path: &str) -> Result<()> {
        let content = Self::to_dot(flow);
        std::fs::write(path, content)
    }
}

impl FlowchartExporter {
    /// Convert a FlowGraph to a DOT string.
    pub fn to_dot(flow: &FlowGraph) -> String {
        let mut lines = Vec::new();

        lines.push("digraph VariableFlow {".to_string());
        lines.push("    rankdir=TB;".to_string());
        lines.push("    splines=ortho;".to_string());
        lines.push("    nodesep=0.8;".to_string());
        lines.push("    ranksep=1.0;".to_string());
        lines.push("    node [fontname=\"Helvetica\", fontsize=12, shape=box];".to_string());
        lines.push("    edge [fontname=\"Helvetica\", fontsize=10];".to_string());
        lines.push("".to_string());

        for node in &flow.nodes {
            let (fill, border) = Self::node_colors(&node.color);
            let label = Self::escape_label(&node.label);
            lines.push(format!(
                "    \"{}\" [label=\"{}\", style=\"filled\", fillcolor=\"{}\", color=\"{}\"];",
                node.id, label, fill, border
            ));
        }

        lines.push("".to_string());

        for edge in &flow.edges {
            lines.push(format!(
                "    \"{}\" -> \"{}\" [label=\"{}\", style={}];",
                edge.from,
                edge.to,
                edge.sequence,
                Self::edge_style(&edge.style)
            ));
        }

        lines.push("}".to_string());

        lines.join("\n")
    }

    fn node_colors(color: &NodeColor) -> (&'static str, &'static str) {
        match color {
            NodeColor::Past => ("#a6adc8", "#5c5f77"),    // Gray
            NodeColor::Current => ("#a6e3a1", "#40a02b"), // Green
            NodeColor::Future => ("#89b4fa", "#1e66f5"),  // Blue
        }
    }

    fn edge_style(style: &EdgeStyle) -> &'static str {
        match style {
            EdgeStyle::Sequential => "solid",
            EdgeStyle::Conditional => "dashed",
        }
    }

    fn escape_label(label: &str) -> String {
        label
            .replace('\\', "\\\\")
            .replace('"', "\\\"")
            .replace('\n', "\\n")
    }
}
