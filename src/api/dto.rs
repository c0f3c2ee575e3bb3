use serde::{Deserialize, Serialize};

use crate::domain::flowgraph::{EdgeStyle, FlowGraph, NodeColor};

/// The node/edge/color/style contract handed to a rendering collaborator.
#[derive(Debug, Serialize, Deserialize)]
pub struct GraphDto {
    pub nodes: Vec<NodeDto>,
    pub edges: Vec<EdgeDto>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NodeDto {
    pub id: String,
    pub label: String,
    pub function: String,
    pub lines: Vec<usize>,
    pub rank: usize,
    /// One of "past", "current", "future".
    pub color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EdgeDto {
    pub from: String,
    pub to: String,
    /// One of "sequential", "conditional".
    pub style: String,
    pub sequence: usize,
}

fn color_name(color: &NodeColor) -> &'static str {
    match color {
        NodeColor::Past => "past",
        NodeColor::Current => "current",
        NodeColor::Future => "future",
    }
}

fn style_name(style: &EdgeStyle) -> &'static str {
    match style {
        EdgeStyle::Sequential => "sequential",
        EdgeStyle::Conditional => "conditional",
    }
}

impl From<&FlowGraph> for GraphDto {
    fn from(graph: &FlowGraph) -> Self {
        let nodes = graph
            .nodes
            .iter()
            .map(|n| NodeDto {
                id: n.id.clone(),
                label: n.label.clone(),
                function: n.function.clone(),
                lines: n.lines.clone(),
                rank: n.rank,
                color: color_name(&n.color).to_string(),
                value: n.value.clone(),
            })
            .collect();

        let edges = graph
            .edges
            .iter()
            .map(|e| EdgeDto {
                from: e.from.clone(),
                to: e.to.clone(),
                style: style_name(&e.style).to_string(),
                sequence: e.sequence,
            })
            .collect();

        GraphDto { nodes, edges }
    }
}
