//! Closest-Node Locator
//!
//! Maps an arbitrary source line (a click point from the selection
//! surface) to the trace step whose line group lies nearest, so the
//! matching flow node can be designated as current before rendering.

use crate::domain::flowgraph::node_id;
use crate::domain::occurrence::Occurrence;
use crate::domain::trace::TraceStep;

/// Index of the step whose line group has minimum absolute distance from
/// the query line. Ties favor the earliest-emitted step. `None` when the
/// trace is empty.
pub fn closest_step_index(steps: &[TraceStep], query: usize) -> Option<usize> {
    let mut best: Option<(usize, usize)> = None; // (distance, index)
    for (index, step) in steps.iter().enumerate() {
        for &line in &step.lines {
            let distance = line.abs_diff(query);
            match best {
                Some((best_distance, _)) if best_distance <= distance => {}
                _ => best = Some((distance, index)),
            }
        }
    }
    best.map(|(_, index)| index)
}

/// Identity of the flow node the query line falls closest to.
pub fn closest_node_id(steps: &[TraceStep], query: usize) -> Option<String> {
    closest_step_index(steps, query).map(|index| {
        let step = &steps[index];
        node_id(&step.function, &step.lines)
    })
}

/// Same query against the static occurrence sequence, where every group
/// is the occurrence's single line.
pub fn closest_occurrence_node_id(occurrences: &[Occurrence], query: usize) -> Option<String> {
    let mut best: Option<(usize, usize)> = None;
    for (index, occ) in occurrences.iter().enumerate() {
        let distance = occ.line.abs_diff(query);
        match best {
            Some((best_distance, _)) if best_distance <= distance => {}
            _ => best = Some((distance, index)),
        }
    }
    best.map(|(_, index)| {
        let occ = &occurrences[index];
        node_id(&occ.function, &[occ.line])
    })
}
