//! FlowGraph Data Structure
//!
//! The deduplicated graph built from static occurrences or dynamic trace
//! steps. One node per distinct `(function, line group)` identity, edges
//! between causally adjacent emissions, presentation metadata (relative
//! coloring, conditional vs. sequential edge style) attached for the
//! rendering collaborator.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::occurrence::Occurrence;
use crate::domain::trace::TraceStep;

/// Coloring class relative to the designated current node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeColor {
    /// Emitted strictly before the current node.
    Past,
    /// The user's point of interest.
    Current,
    /// Emitted strictly after the current node (the default when no
    /// current node is designated).
    Future,
}

/// Rendering style of a flow transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeStyle {
    Sequential,
    Conditional,
}

/// A node in the flow graph.
#[derive(Debug, Clone)]
pub struct FlowNode {
    /// Unique identifier derived from the node's identity.
    pub id: String,
    /// Display label: function name, line-range text, value snapshot.
    pub label: String,
    /// Function this node belongs to.
    pub function: String,
    /// The identity line group (first-visit order). Empty for potential-
    /// path nodes.
    pub lines: Vec<usize>,
    /// Position among the emission sequence.
    pub rank: usize,
    /// Relative-order coloring.
    pub color: NodeColor,
    /// Last observed value for dynamic nodes.
    pub value: Option<Value>,
}

/// A directed edge between two causally adjacent nodes.
#[derive(Debug, Clone)]
pub struct FlowEdge {
    pub from: String,
    pub to: String,
    pub style: EdgeStyle,
    /// Emission sequence number of the transition.
    pub sequence: usize,
}

/// The flow graph handed to rendering. Immutable once constructed.
#[derive(Debug, Clone, Default)]
pub struct FlowGraph {
    pub nodes: Vec<FlowNode>,
    pub edges: Vec<FlowEdge>,
}

/// Node identity key: function name plus the frozen line group.
pub fn node_id(function: &str, lines: &[usize]) -> String {
    let joined = lines
        .iter()
        .map(|l| l.to_string())
        .collect::<Vec<_>>()
        .join(".");
    format!("{}@{}", function, joined)
}

fn range_text(lines: &[usize]) -> String {
    match (lines.iter().min(), lines.iter().max()) {
        (Some(lo), Some(hi)) if lo == hi => format!("line {}", lo),
        (Some(lo), Some(hi)) => format!("lines {}-{}", lo, hi),
        _ => "no lines".to_string(),
    }
}

fn node_label(function: &str, lines: &[usize], value: Option<&Value>) -> String {
    match value {
        Some(v) => format!("{} [{}] = {}", function, range_text(lines), v),
        None => format!("{} [{}]", function, range_text(lines)),
    }
}

/// One unit of the emission sequence fed to the builder.
struct Emission {
    function: String,
    lines: Vec<usize>,
    conditional: bool,
    value: Option<Value>,
}

impl FlowGraph {
    /// Build the flow graph from a static occurrence sequence.
    pub fn from_occurrences(occurrences: &[Occurrence], current: Option<&str>) -> Self {
        let emissions = occurrences
            .iter()
            .map(|occ| Emission {
                function: occ.function.clone(),
                lines: vec![occ.line],
                conditional: occ.kind.is_conditional(),
                value: None,
            })
            .collect::<Vec<_>>();
        Self::build(emissions, current)
    }

    /// Build the flow graph from a dynamic trace sequence.
    pub fn from_trace(steps: &[TraceStep], current: Option<&str>) -> Self {
        let emissions = steps
            .iter()
            .map(|step| Emission {
                function: step.function.clone(),
                lines: step.lines.clone(),
                conditional: false,
                value: step.value.clone(),
            })
            .collect::<Vec<_>>();
        Self::build(emissions, current)
    }

    fn build(emissions: Vec<Emission>, current: Option<&str>) -> Self {
        let mut nodes: Vec<FlowNode> = Vec::new();
        let mut conditional_flags: Vec<bool> = Vec::new();
        let mut edges: Vec<FlowEdge> = Vec::new();
        // Identity map: (function, frozen line group) -> node index.
        let mut seen: HashMap<(String, Vec<usize>), usize> = HashMap::new();
        let mut prev: Option<usize> = None;
        let mut sequence = 0;

        for emission in emissions {
            let key = (emission.function.clone(), emission.lines.clone());
            let index = match seen.get(&key) {
                Some(&index) => {
                    conditional_flags[index] |= emission.conditional;
                    // Repeated emissions may refine the snapshot.
                    if emission.value.is_some() {
                        nodes[index].value = emission.value;
                    }
                    index
                }
                None => {
                    let index = nodes.len();
                    seen.insert(key, index);
                    conditional_flags.push(emission.conditional);
                    nodes.push(FlowNode {
                        id: node_id(&emission.function, &emission.lines),
                        label: node_label(
                            &emission.function,
                            &emission.lines,
                            emission.value.as_ref(),
                        ),
                        function: emission.function,
                        lines: emission.lines,
                        rank: index,
                        color: NodeColor::Future,
                        value: emission.value,
                    });
                    index
                }
            };

            // An edge only when consecutive emitted nodes differ.
            if let Some(prev_index) = prev {
                if prev_index != index {
                    sequence += 1;
                    let style = if conditional_flags[prev_index] || conditional_flags[index] {
                        EdgeStyle::Conditional
                    } else {
                        EdgeStyle::Sequential
                    };
                    edges.push(FlowEdge {
                        from: nodes[prev_index].id.clone(),
                        to: nodes[index].id.clone(),
                        style,
                        sequence,
                    });
                }
            }
            prev = Some(index);
        }

        let mut graph = FlowGraph { nodes, edges };
        graph.apply_coloring(current);
        graph
    }

    /// Partition nodes into past / current / future relative to the
    /// designated node. Without a designation every node stays future.
    fn apply_coloring(&mut self, current: Option<&str>) {
        let current_rank = current.and_then(|id| {
            self.nodes
                .iter()
                .find(|node| node.id == id)
                .map(|node| node.rank)
        });
        if let Some(pivot) = current_rank {
            for node in &mut self.nodes {
                node.color = match node.rank.cmp(&pivot) {
                    std::cmp::Ordering::Less => NodeColor::Past,
                    std::cmp::Ordering::Equal => NodeColor::Current,
                    std::cmp::Ordering::Greater => NodeColor::Future,
                };
            }
        }
    }

    /// Append branch-only functions as untaken alternatives: one node per
    /// name, reached over a conditional edge from the last real node.
    pub fn with_potential_paths(mut self, branch_only: &[String]) -> Self {
        let anchor = self.nodes.last().map(|node| node.id.clone());
        for function in branch_only {
            let rank = self.nodes.len();
            let id = format!("{}@potential", function);
            self.nodes.push(FlowNode {
                id: id.clone(),
                label: format!("{} (potential)", function),
                function: function.clone(),
                lines: Vec::new(),
                rank,
                color: NodeColor::Future,
                value: None,
            });
            if let Some(from) = &anchor {
                let sequence = self.edges.len() + 1;
                self.edges.push(FlowEdge {
                    from: from.clone(),
                    to: id,
                    style: EdgeStyle::Conditional,
                    sequence,
                });
            }
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
