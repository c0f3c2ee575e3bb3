// Static occurrence records for VarFlow.
// One Occurrence per syntactic mention of the traced variable, in
// pre-order traversal order.

use serde::{Deserialize, Serialize};

/// Function name used for occurrences outside any function definition.
pub const GLOBAL_SCOPE: &str = "global scope";

/// Syntactic role of one variable mention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OccurrenceKind {
    /// Single-target assignment to the variable.
    Assignment,
    /// The variable passed as a positional call argument.
    CallArgument,
    /// Comparison test of an `if` referencing the variable.
    ConditionalIf,
    /// Same, for an `else if` link in a chain.
    ConditionalElif,
    /// The `else` arm of a classified conditional.
    ConditionalElse,
    /// A recognized mention outside the roles above (bare `return`).
    Plain,
}

impl OccurrenceKind {
    /// Whether this occurrence sits on a conditional transition.
    pub fn is_conditional(&self) -> bool {
        matches!(
            self,
            OccurrenceKind::ConditionalIf
                | OccurrenceKind::ConditionalElif
                | OccurrenceKind::ConditionalElse
        )
    }
}

/// A single static mention of the traced variable.
///
/// `sequence` is monotonically increasing in traversal order and is the
/// sole ordering key. Line numbers repeat and go non-monotonic across
/// branches, so they must never be used for ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Occurrence {
    /// Enclosing function, or [`GLOBAL_SCOPE`].
    pub function: String,
    /// 1-based source line of the mention.
    pub line: usize,
    /// Position in the emission sequence.
    pub sequence: usize,
    /// Syntactic role.
    pub kind: OccurrenceKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conditional_kinds_are_conditional() {
        assert!(OccurrenceKind::ConditionalIf.is_conditional());
        assert!(OccurrenceKind::ConditionalElif.is_conditional());
        assert!(OccurrenceKind::ConditionalElse.is_conditional());
        assert!(!OccurrenceKind::Assignment.is_conditional());
        assert!(!OccurrenceKind::CallArgument.is_conditional());
        assert!(!OccurrenceKind::Plain.is_conditional());
    }
}
