//! Syntax Walker
//!
//! Parses program source into a syntax tree and answers the structural
//! queries the rest of the pipeline needs: the declared-function set and
//! which function encloses a given line.

use std::collections::HashSet;

use crate::common::FlowError;
use crate::domain::index::{collect_function_spans, FunctionSpan};
use crate::domain::occurrence::GLOBAL_SCOPE;

pub struct SynSyntaxWalker;

impl SynSyntaxWalker {
    /// Parse source text, reporting a [`FlowError::Parse`] when it is not
    /// syntactically valid.
    pub fn parse(source: &str) -> Result<syn::File, FlowError> {
        syn::parse_file(source).map_err(|e| FlowError::Parse(e.to_string()))
    }

    /// Names of every function definition in the tree, top-level and
    /// nested alike.
    pub fn declared_functions(file: &syn::File) -> HashSet<String> {
        collect_function_spans(file)
            .into_iter()
            .map(|span| span.name)
            .collect()
    }

    /// The innermost function definition whose declared range contains
    /// `line`, or [`GLOBAL_SCOPE`]. Ranges are well-nested; should two
    /// ranges tie exactly, the most recently visited definition wins.
    pub fn function_containing(file: &syn::File, line: usize) -> String {
        let mut best: Option<FunctionSpan> = None;
        for span in collect_function_spans(file) {
            if !span.contains(line) {
                continue;
            }
            let tighter = match &best {
                None => true,
                Some(current) => span.len_lines() <= current.len_lines(),
            };
            if tighter {
                best = Some(span);
            }
        }
        best.map(|span| span.name)
            .unwrap_or_else(|| GLOBAL_SCOPE.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = r#"
fn outer() {
    let x = 1;
    fn inner() {
        let y = 2;
    }
    inner();
}

fn later() {
    outer();
}
"#;

    #[test]
    fn parse_rejects_invalid_source() {
        let err = SynSyntaxWalker::parse("fn broken( {").err().unwrap();
        assert!(matches!(err, FlowError::Parse(_)));
    }

    #[test]
    fn declared_functions_include_nested() {
        let file = SynSyntaxWalker::parse(SOURCE).unwrap();
        let names = SynSyntaxWalker::declared_functions(&file);
        assert_eq!(names.len(), 3);
        assert!(names.contains("inner"));
    }

    #[test]
    fn containing_function_prefers_the_innermost() {
        let file = SynSyntaxWalker::parse(SOURCE).unwrap();
        assert_eq!(SynSyntaxWalker::function_containing(&file, 3), "outer");
        assert_eq!(SynSyntaxWalker::function_containing(&file, 5), "inner");
        assert_eq!(SynSyntaxWalker::function_containing(&file, 11), "later");
    }

    #[test]
    fn lines_outside_any_function_are_global_scope() {
        let file = SynSyntaxWalker::parse(SOURCE).unwrap();
        assert_eq!(SynSyntaxWalker::function_containing(&file, 1), GLOBAL_SCOPE);
        assert_eq!(
            SynSyntaxWalker::function_containing(&file, 9),
            GLOBAL_SCOPE
        );
    }
}
