// Shared error taxonomy for VarFlow.
// Every failure here is scoped to a single analysis or trace request;
// nothing in the core is fatal to the hosting process.

use thiserror::Error;

/// Failures the flow reconstruction core can report.
#[derive(Debug, Error)]
pub enum FlowError {
    /// Source text does not parse. Static analysis aborts and dynamic
    /// tracing is not attempted.
    #[error("source does not parse: {0}")]
    Parse(String),

    /// The selected text is not a syntactically valid variable name.
    /// Classification and tracing are skipped, no graph is produced.
    #[error("invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    /// The instrumented program raised during tracing. The flow collected
    /// up to the failure point is preserved alongside this error.
    #[error("traced program raised: {0}")]
    TracedExecution(String),
}
