//! Occurrence Classifier
//!
//! Pre-order pass over the parsed tree that emits one [`Occurrence`] per
//! syntactic mention of the target variable, classified by role. A
//! current-function context is pushed on entering a definition and popped
//! on leaving it, so nested definitions shadow the enclosing one for
//! their own body only. Both arms of every conditional are visited; this
//! is a static approximation, not an execution.

use syn::spanned::Spanned;
use syn::visit::{self, Visit};

use crate::common::FlowError;
use crate::domain::index::single_ident;
use crate::domain::occurrence::{Occurrence, OccurrenceKind, GLOBAL_SCOPE};
use crate::infrastructure::syn_walker::SynSyntaxWalker;
use crate::ports::OccurrenceSource;

pub struct SynOccurrenceScanner;

impl SynOccurrenceScanner {
    /// The selected text must itself parse as a plain identifier before
    /// any classification happens.
    pub fn validate_identifier(text: &str) -> Result<(), FlowError> {
        syn::parse_str::<syn::Ident>(text)
            .map(|_| ())
            .map_err(|_| FlowError::InvalidIdentifier(text.to_string()))
    }

    /// Classify every occurrence of `variable` in a single source text.
    pub fn scan_source(source: &str, variable: &str) -> Result<Vec<Occurrence>, FlowError> {
        Self::validate_identifier(variable)?;
        let file = SynSyntaxWalker::parse(source)?;
        let mut visitor = ClassifierVisitor {
            variable,
            stack: Vec::new(),
            sequence: 0,
            occurrences: Vec::new(),
        };
        visitor.visit_file(&file);
        Ok(visitor.occurrences)
    }
}

impl OccurrenceSource for SynOccurrenceScanner {
    fn scan(
        &self,
        sources: &[(String, String)],
        variable: &str,
    ) -> Result<Vec<Occurrence>, FlowError> {
        SynOccurrenceScanner::validate_identifier(variable)?;
        let mut occurrences = Vec::new();
        for (_, code) in sources {
            let mut batch = SynOccurrenceScanner::scan_source(code, variable)?;
            // Sequence numbers stay monotonic across files.
            let offset = occurrences.len();
            for occ in &mut batch {
                occ.sequence += offset;
            }
            occurrences.append(&mut batch);
        }
        Ok(occurrences)
    }
}

struct ClassifierVisitor<'a> {
    variable: &'a str,
    stack: Vec<String>,
    sequence: usize,
    occurrences: Vec<Occurrence>,
}

impl ClassifierVisitor<'_> {
    fn current_function(&self) -> String {
        self.stack
            .last()
            .cloned()
            .unwrap_or_else(|| GLOBAL_SCOPE.to_string())
    }

    fn emit(&mut self, line: usize, kind: OccurrenceKind) {
        self.occurrences.push(Occurrence {
            function: self.current_function(),
            line,
            sequence: self.sequence,
            kind,
        });
        self.sequence += 1;
    }

    fn is_variable(&self, expr: &syn::Expr) -> bool {
        match expr {
            syn::Expr::Path(path) => path.path.is_ident(self.variable),
            _ => false,
        }
    }

    /// Classify an `if`/`else if`/`else` chain. The chained links are
    /// walked here rather than through the generic visitor so each link
    /// can be tagged as `elif` instead of a fresh `if`.
    fn classify_conditional(&mut self, node: &syn::ExprIf, chained: bool) {
        let classified = test_references(&node.cond, self.variable);
        if classified {
            let kind = if chained {
                OccurrenceKind::ConditionalElif
            } else {
                OccurrenceKind::ConditionalIf
            };
            self.emit(node.if_token.span.start().line, kind);
        }
        self.visit_expr(&node.cond);
        self.visit_block(&node.then_branch);
        if let Some((else_token, else_expr)) = &node.else_branch {
            match &**else_expr {
                syn::Expr::If(inner) => self.classify_conditional(inner, true),
                other => {
                    if classified {
                        self.emit(else_token.span.start().line, OccurrenceKind::ConditionalElse);
                    }
                    self.visit_expr(other);
                }
            }
        }
    }
}

impl<'ast> Visit<'ast> for ClassifierVisitor<'_> {
    fn visit_item_fn(&mut self, node: &'ast syn::ItemFn) {
        self.stack.push(node.sig.ident.to_string());
        visit::visit_item_fn(self, node);
        self.stack.pop();
    }

    fn visit_impl_item_fn(&mut self, node: &'ast syn::ImplItemFn) {
        self.stack.push(node.sig.ident.to_string());
        visit::visit_impl_item_fn(self, node);
        self.stack.pop();
    }

    fn visit_trait_item_fn(&mut self, node: &'ast syn::TraitItemFn) {
        self.stack.push(node.sig.ident.to_string());
        visit::visit_trait_item_fn(self, node);
        self.stack.pop();
    }

    fn visit_local(&mut self, node: &'ast syn::Local) {
        if let Some(ident) = single_ident(&node.pat) {
            if ident == self.variable {
                self.emit(node.span().start().line, OccurrenceKind::Assignment);
            }
        }
        visit::visit_local(self, node);
    }

    fn visit_expr_assign(&mut self, node: &'ast syn::ExprAssign) {
        if self.is_variable(&node.left) {
            self.emit(node.span().start().line, OccurrenceKind::Assignment);
        }
        visit::visit_expr_assign(self, node);
    }

    fn visit_expr_call(&mut self, node: &'ast syn::ExprCall) {
        if node.args.iter().any(|arg| self.is_variable(arg)) {
            self.emit(node.span().start().line, OccurrenceKind::CallArgument);
        }
        visit::visit_expr_call(self, node);
    }

    fn visit_expr_method_call(&mut self, node: &'ast syn::ExprMethodCall) {
        if node.args.iter().any(|arg| self.is_variable(arg)) {
            self.emit(node.span().start().line, OccurrenceKind::CallArgument);
        }
        visit::visit_expr_method_call(self, node);
    }

    fn visit_expr_if(&mut self, node: &'ast syn::ExprIf) {
        self.classify_conditional(node, false);
    }

    fn visit_expr_return(&mut self, node: &'ast syn::ExprReturn) {
        if let Some(expr) = &node.expr {
            if self.is_variable(expr) {
                self.emit(node.span().start().line, OccurrenceKind::Plain);
            }
        }
        visit::visit_expr_return(self, node);
    }
}

/// A test counts only as a simple two-operand comparison with the
/// variable mentioned inside either operand. Boolean combinations are
/// deliberately left unclassified.
fn test_references(cond: &syn::Expr, variable: &str) -> bool {
    if let syn::Expr::Binary(binary) = cond {
        if is_comparison(&binary.op) {
            return mentions(&binary.left, variable) || mentions(&binary.right, variable);
        }
    }
    false
}

fn is_comparison(op: &syn::BinOp) -> bool {
    matches!(
        op,
        syn::BinOp::Eq(_)
            | syn::BinOp::Ne(_)
            | syn::BinOp::Lt(_)
            | syn::BinOp::Le(_)
            | syn::BinOp::Gt(_)
            | syn::BinOp::Ge(_)
    )
}

fn mentions(expr: &syn::Expr, variable: &str) -> bool {
    struct PathMention<'a> {
        variable: &'a str,
        found: bool,
    }
    impl<'ast> Visit<'ast> for PathMention<'_> {
        fn visit_expr_path(&mut self, node: &'ast syn::ExprPath) {
            if node.path.is_ident(self.variable) {
                self.found = true;
            }
        }
    }
    let mut visitor = PathMention {
        variable,
        found: false,
    };
    visitor.visit_expr(expr);
    visitor.found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_assignment_classifies_once() {
        let source = r#"
fn initialize() -> i64 {
    let value = 10;
    value
}
"#;
        let occurrences = SynOccurrenceScanner::scan_source(source, "value").unwrap();
        let assignments: Vec<_> = occurrences
            .iter()
            .filter(|o| o.kind == OccurrenceKind::Assignment)
            .collect();
        assert_eq!(assignments.len(), 1);
        assert_eq!(assignments[0].line, 3);
        assert_eq!(assignments[0].function, "initialize");
    }

    #[test]
    fn call_arguments_classify_at_the_call_line() {
        let source = r#"
fn main() {
    let value = 10;
    display(value);
}
"#;
        let occurrences = SynOccurrenceScanner::scan_source(source, "value").unwrap();
        let kinds: Vec<OccurrenceKind> = occurrences.iter().map(|o| o.kind).collect();
        assert_eq!(
            kinds,
            vec![OccurrenceKind::Assignment, OccurrenceKind::CallArgument]
        );
        assert_eq!(occurrences[1].line, 4);
    }

    #[test]
    fn elif_chains_tag_each_link() {
        let source = r#"
fn route(amount: i64) {
    if amount > 100 {
        large(amount);
    } else if amount > 10 {
        medium(amount);
    } else {
        small(amount);
    }
}
"#;
        let occurrences = SynOccurrenceScanner::scan_source(source, "amount").unwrap();
        let kinds: Vec<OccurrenceKind> = occurrences.iter().map(|o| o.kind).collect();
        assert_eq!(
            kinds,
            vec![
                OccurrenceKind::ConditionalIf,
                OccurrenceKind::CallArgument,
                OccurrenceKind::ConditionalElif,
                OccurrenceKind::CallArgument,
                OccurrenceKind::ConditionalElse,
                OccurrenceKind::CallArgument,
            ]
        );
    }

    #[test]
    fn boolean_conditions_stay_unclassified() {
        let source = r#"
fn gate(flag: bool, value: i64) {
    if flag && value > 0 {
        consume(value);
    }
}
"#;
        let occurrences = SynOccurrenceScanner::scan_source(source, "value").unwrap();
        assert!(occurrences.iter().all(|o| !o.kind.is_conditional()));
    }

    #[test]
    fn nested_definitions_shadow_the_context() {
        let source = r#"
fn outer() {
    let value = 1;
    fn inner() {
        let value = 2;
    }
}
"#;
        let occurrences = SynOccurrenceScanner::scan_source(source, "value").unwrap();
        assert_eq!(occurrences[0].function, "outer");
        assert_eq!(occurrences[1].function, "inner");
    }

    #[test]
    fn invalid_identifier_is_rejected_before_classification() {
        let err = SynOccurrenceScanner::scan_source("fn f() {}", "pay load!").unwrap_err();
        assert!(matches!(err, FlowError::InvalidIdentifier(_)));
    }

    #[test]
    fn sequence_is_the_ordering_key_across_branches() {
        let source = r#"
fn check(value: i64) {
    if value == 0 {
        reset(value);
    } else {
        keep(value);
    }
    finish(value);
}
"#;
        let occurrences = SynOccurrenceScanner::scan_source(source, "value").unwrap();
        let sequences: Vec<usize> = occurrences.iter().map(|o| o.sequence).collect();
        assert!(sequences.windows(2).all(|w| w[0] < w[1]));
        // Lines go non-monotonic across arms; sequence must not.
        let lines: Vec<usize> = occurrences.iter().map(|o| o.line).collect();
        assert!(lines.contains(&6), "else arm is visited too");
    }
}
