use std::collections::{HashMap, HashSet};

use crate::ast::{Expr, Pipeline, Rule, Statement, ValueType};
use crate::error::{ParseError, ParseErrorKind};
use crate::tree::{NodeId, ParseTree};

/// Per-parse mutable state shared by the analysis passes.
///
/// Results are keyed by [`NodeId`] so the passes never touch the tree
/// itself. A context lives for exactly one parse call.
pub struct AnalysisContext<'t> {
    tree: &'t ParseTree,
    /// Expression built for a node, waiting to be taken by its parent.
    exprs: HashMap<NodeId, Expr>,
    named_args: HashMap<NodeId, Vec<(String, Expr)>>,
    positional_args: HashMap<NodeId, Vec<Expr>>,
    /// Static type recorded for every node that produced an expression.
    node_types: HashMap<NodeId, ValueType>,
    /// Pass-through productions, left out of debug traces.
    inner_nodes: HashSet<NodeId>,
    /// Diagnostics in insertion order; `seen` holds the same set.
    errors: Vec<ParseError>,
    seen: HashSet<ParseError>,
    variables: HashMap<String, Expr>,
    variable_order: Vec<String>,
    statements: Vec<Statement>,
    pub(crate) rules: Vec<Rule>,
    pub(crate) pipelines: Vec<Pipeline>,
}

/// Everything a finished analysis hands to the assembler.
pub struct AnalysisOutcome {
    pub rules: Vec<Rule>,
    pub pipelines: Vec<Pipeline>,
    /// Error-severity diagnostics, ordered by position.
    pub errors: Vec<ParseError>,
    pub warnings: Vec<ParseError>,
}

impl<'t> AnalysisContext<'t> {
    pub fn new(tree: &'t ParseTree) -> Self {
        Self {
            tree,
            exprs: HashMap::new(),
            named_args: HashMap::new(),
            positional_args: HashMap::new(),
            node_types: HashMap::new(),
            inner_nodes: HashSet::new(),
            errors: Vec::new(),
            seen: HashSet::new(),
            variables: HashMap::new(),
            variable_order: Vec::new(),
            statements: Vec::new(),
            rules: Vec::new(),
            pipelines: Vec::new(),
        }
    }

    pub fn tree(&self) -> &'t ParseTree {
        self.tree
    }

    // -- diagnostics --------------------------------------------------------

    /// Record a diagnostic; an identical one is only kept once.
    pub fn add_error(&mut self, error: ParseError) {
        if self.seen.insert(error.clone()) {
            self.errors.push(error);
        }
    }

    pub fn error_at(&mut self, node: NodeId, kind: ParseErrorKind) {
        let pos = self.tree.pos(node);
        self.add_error(ParseError::error(pos, Some(node), kind));
    }

    pub fn warning_at(&mut self, node: NodeId, kind: ParseErrorKind) {
        let pos = self.tree.pos(node);
        self.add_error(ParseError::warning(pos, Some(node), kind));
    }

    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    pub fn has_errors(&self) -> bool {
        self.errors.iter().any(ParseError::is_error)
    }

    // -- node annotations ---------------------------------------------------

    pub fn set_expr(&mut self, node: NodeId, expr: Expr) {
        self.node_types.insert(node, expr.value_type());
        self.exprs.insert(node, expr);
    }

    pub fn take_expr(&mut self, node: NodeId) -> Option<Expr> {
        self.exprs.remove(&node)
    }

    pub fn node_type(&self, node: NodeId) -> Option<ValueType> {
        self.node_types.get(&node).copied()
    }

    pub(crate) fn set_node_type(&mut self, node: NodeId, ty: ValueType) {
        self.node_types.insert(node, ty);
    }

    pub fn set_named_args(&mut self, node: NodeId, args: Vec<(String, Expr)>) {
        self.named_args.insert(node, args);
    }

    pub fn take_named_args(&mut self, node: NodeId) -> Option<Vec<(String, Expr)>> {
        self.named_args.remove(&node)
    }

    pub fn set_positional_args(&mut self, node: NodeId, args: Vec<Expr>) {
        self.positional_args.insert(node, args);
    }

    pub fn take_positional_args(&mut self, node: NodeId) -> Option<Vec<Expr>> {
        self.positional_args.remove(&node)
    }

    pub fn mark_inner(&mut self, node: NodeId) {
        self.inner_nodes.insert(node);
    }

    pub fn is_inner(&self, node: NodeId) -> bool {
        self.inner_nodes.contains(&node)
    }

    // -- variables ----------------------------------------------------------

    /// Declare `name`. The first declaration wins; returns `false` if the
    /// name was already declared.
    pub fn declare_var(&mut self, name: &str, expr: Expr) -> bool {
        if self.variables.contains_key(name) {
            return false;
        }
        self.variables.insert(name.to_string(), expr);
        self.variable_order.push(name.to_string());
        true
    }

    pub fn var(&self, name: &str) -> Option<&Expr> {
        self.variables.get(name)
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    /// Declared names in declaration order.
    pub fn var_names(&self) -> &[String] {
        &self.variable_order
    }

    pub(crate) fn var_mut(&mut self, name: &str) -> Option<&mut Expr> {
        self.variables.get_mut(name)
    }

    // -- accumulators -------------------------------------------------------

    pub fn push_statement(&mut self, stmt: Statement) {
        self.statements.push(stmt);
    }

    pub fn take_statements(&mut self) -> Vec<Statement> {
        std::mem::take(&mut self.statements)
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn pipelines(&self) -> &[Pipeline] {
        &self.pipelines
    }

    /// Consume the context, splitting diagnostics by severity.
    pub fn finish(self) -> AnalysisOutcome {
        let (mut errors, mut warnings): (Vec<_>, Vec<_>) =
            self.errors.into_iter().partition(ParseError::is_error);
        errors.sort_by_key(|e| (e.pos, e.node));
        warnings.sort_by_key(|e| (e.pos, e.node));
        AnalysisOutcome {
            rules: self.rules,
            pipelines: self.pipelines,
            errors,
            warnings,
        }
    }
}
