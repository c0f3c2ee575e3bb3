use std::collections::HashSet;

use dashmap::DashMap;
use proc_macro2::Span;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use syn::spanned::Spanned;
use syn::visit::{self, Visit};

/// A function definition's declared line range within one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSpan {
    pub name: String,
    pub start_line: usize,
    pub end_line: usize,
}

impl FunctionSpan {
    pub fn contains(&self, line: usize) -> bool {
        self.start_line <= line && line <= self.end_line
    }

    pub fn len_lines(&self) -> usize {
        self.end_line - self.start_line
    }
}

fn line_range(span: Span) -> (usize, usize) {
    (span.start().line, span.end().line)
}

/// Collect every function definition (top-level, nested, impl and trait
/// methods with bodies) in pre-order, with line spans.
pub fn collect_function_spans(file: &syn::File) -> Vec<FunctionSpan> {
    let mut collector = SpanCollector { spans: Vec::new() };
    collector.visit_file(file);
    collector.spans
}

struct SpanCollector {
    spans: Vec<FunctionSpan>,
}

impl SpanCollector {
    fn record(&mut self, name: String, span: Span) {
        let (start_line, end_line) = line_range(span);
        self.spans.push(FunctionSpan {
            name,
            start_line,
            end_line,
        });
    }
}

impl<'ast> Visit<'ast> for SpanCollector {
    fn visit_item_fn(&mut self, node: &'ast syn::ItemFn) {
        self.record(node.sig.ident.to_string(), node.span());
        // Recurse for definitions nested inside the body.
        visit::visit_item_fn(self, node);
    }

    fn visit_impl_item_fn(&mut self, node: &'ast syn::ImplItemFn) {
        self.record(node.sig.ident.to_string(), node.span());
        visit::visit_impl_item_fn(self, node);
    }

    fn visit_trait_item_fn(&mut self, node: &'ast syn::TraitItemFn) {
        if node.default.is_some() {
            self.record(node.sig.ident.to_string(), node.span());
        }
        visit::visit_trait_item_fn(self, node);
    }
}

/// A declared function's location across the analyzed file set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionRecord {
    pub name: String,
    pub file: String,
    pub start_line: usize,
    pub end_line: usize,
}

/// Thread-safe declared-function index built in parallel over all input
/// files. Feeds the tracer's declared set and cross-file lookups.
#[derive(Default)]
pub struct FunctionIndex {
    pub functions: DashMap<String, FunctionRecord>,
}

impl FunctionIndex {
    /// Build the index from `(file_path, source)` pairs. Files that fail
    /// to parse are skipped with a warning, matching the per-file
    /// tolerance of multi-file scans.
    pub fn build(sources: &[(String, String)]) -> Self {
        let index = FunctionIndex::default();

        sources.par_iter().for_each(|(file_path, code)| {
            match syn::parse_file(code) {
                Ok(ast) => {
                    for span in collect_function_spans(&ast) {
                        index.functions.insert(
                            span.name.clone(),
                            FunctionRecord {
                                name: span.name,
                                file: file_path.clone(),
                                start_line: span.start_line,
                                end_line: span.end_line,
                            },
                        );
                    }
                }
                Err(e) => {
                    eprintln!("[VarFlow] WARN: failed to parse {}: {}", file_path, e);
                }
            }
        });

        index
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<FunctionRecord> {
        self.functions.get(name).map(|r| r.clone())
    }

    /// The declared-function set handed to the execution tracer.
    pub fn declared_names(&self) -> HashSet<String> {
        self.functions.iter().map(|r| r.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

/// Assignment sites of every variable across the analyzed files:
/// `variable -> [(file, line)]`. The selection surface uses this to know
/// which identifiers are selectable at all.
#[derive(Default)]
pub struct VariableIndex {
    pub locations: DashMap<String, Vec<(String, usize)>>,
}

impl VariableIndex {
    pub fn build(sources: &[(String, String)]) -> Self {
        let index = VariableIndex::default();

        sources.par_iter().for_each(|(file_path, code)| {
            match syn::parse_file(code) {
                Ok(ast) => {
                    let mut collector = AssignmentCollector {
                        file: file_path,
                        index: &index,
                    };
                    collector.visit_file(&ast);
                }
                Err(e) => {
                    eprintln!("[VarFlow] WARN: failed to parse {}: {}", file_path, e);
                }
            }
        });

        index
    }

    pub fn locations_of(&self, variable: &str) -> Vec<(String, usize)> {
        self.locations
            .get(variable)
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub fn variables(&self) -> Vec<String> {
        self.locations.iter().map(|r| r.key().clone()).collect()
    }
}

struct AssignmentCollector<'a> {
    file: &'a str,
    index: &'a VariableIndex,
}

impl AssignmentCollector<'_> {
    fn record(&self, name: String, line: usize) {
        self.index
            .locations
            .entry(name)
            .or_default()
            .push((self.file.to_string(), line));
    }
}

/// Unwrap `let x: T = ...` type ascription down to the bound identifier.
pub(crate) fn single_ident(pat: &syn::Pat) -> Option<&syn::Ident> {
    match pat {
        syn::Pat::Ident(p) => Some(&p.ident),
        syn::Pat::Type(p) => single_ident(&p.pat),
        _ => None,
    }
}

impl<'ast> Visit<'ast> for AssignmentCollector<'_> {
    fn visit_local(&mut self, node: &'ast syn::Local) {
        if let Some(ident) = single_ident(&node.pat) {
            self.record(ident.to_string(), node.span().start().line);
        }
        visit::visit_local(self, node);
    }

    fn visit_expr_assign(&mut self, node: &'ast syn::ExprAssign) {
        if let syn::Expr::Path(path) = &*node.left {
            if let Some(ident) = path.path.get_ident() {
                self.record(ident.to_string(), node.span().start().line);
            }
        }
        visit::visit_expr_assign(self, node);
    }
}
