//! Bottom-up construction of expressions, statements, rules and pipelines
//! from the parse tree.

use crate::analysis::binder::{CallArgs, bind_args, bind_unchecked};
use crate::analysis::context::AnalysisContext;
use crate::ast::{
    CmpOp, Expr, ExprKind, FunctionExpr, LogicalExpr, Pipeline, Rule, Stage, Statement, ValueType,
};
use crate::error::ParseErrorKind;
use crate::functions::FunctionRegistry;
use crate::parser::ParserOptions;
use crate::tree::{NodeId, NodeKind};

/// Name given to a stage rule reference whose name is missing.
pub const ILLEGAL_REFERENCE: &str = "__illegal_reference";

pub(crate) struct AstBuilder<'c, 't> {
    ctx: &'c mut AnalysisContext<'t>,
    registry: &'c FunctionRegistry,
    options: ParserOptions,
}

impl<'c, 't> AstBuilder<'c, 't> {
    pub fn new(
        ctx: &'c mut AnalysisContext<'t>,
        registry: &'c FunctionRegistry,
        options: ParserOptions,
    ) -> Self {
        Self {
            ctx,
            registry,
            options,
        }
    }

    /// Visit every node children-first.
    pub fn build(mut self) {
        let tree = self.ctx.tree();
        for node in tree.post_order() {
            self.exit(node);
        }
    }

    fn exit(&mut self, node: NodeId) {
        let tree = self.ctx.tree();
        match tree.kind(node) {
            NodeKind::Integer => self.integer(node),
            NodeKind::Float => self.float(node),
            NodeKind::Str => {
                let value = self.text(node).to_string();
                self.set(node, ExprKind::Str(value));
            }
            NodeKind::Bool => {
                let value = self.text(node) == "true";
                self.set(node, ExprKind::Bool(value));
            }
            NodeKind::Parenthesized | NodeKind::Subscript => self.pass_through(node),
            NodeKind::Identifier => self.identifier(node),
            NodeKind::FieldAccess => {
                let (Some(object), Some(field)) = (self.child(node, 0), self.child(node, 1)) else {
                    return;
                };
                self.set(
                    node,
                    ExprKind::FieldAccess {
                        object: Box::new(object),
                        field: Box::new(field),
                    },
                );
            }
            NodeKind::MessageRef => {
                if let Some(field) = self.child(node, 0) {
                    self.set(node, ExprKind::MessageRef(Box::new(field)));
                }
            }
            NodeKind::ArrayLit => {
                let items = self.all_children(node);
                self.set(node, ExprKind::Array(items));
            }
            NodeKind::MapLit => self.map_literal(node),
            NodeKind::Not => {
                if let Some(inner) = self.child(node, 0) {
                    self.set(node, ExprKind::Not(Box::new(as_condition(inner))));
                }
            }
            NodeKind::And | NodeKind::Or => {
                let (Some(left), Some(right)) = (self.child(node, 0), self.child(node, 1)) else {
                    return;
                };
                let (left, right) = (Box::new(as_condition(left)), Box::new(as_condition(right)));
                let kind = if tree.kind(node) == NodeKind::And {
                    ExprKind::And(left, right)
                } else {
                    ExprKind::Or(left, right)
                };
                self.set(node, kind);
            }
            NodeKind::Equality => {
                let (Some(left), Some(right)) = (self.child(node, 0), self.child(node, 1)) else {
                    return;
                };
                let equal = self.text(node) == "==";
                self.set(
                    node,
                    ExprKind::Equality {
                        equal,
                        left: Box::new(left),
                        right: Box::new(right),
                    },
                );
            }
            NodeKind::Comparison => self.comparison(node),
            NodeKind::NamedArgs => {
                let args = tree
                    .children(node)
                    .iter()
                    .filter_map(|arg| {
                        let name = tree.text(*arg)?.to_string();
                        let value = self.child(*arg, 0)?;
                        Some((name, value))
                    })
                    .collect();
                self.ctx.set_named_args(node, args);
            }
            NodeKind::PositionalArgs => {
                let args = self.all_children(node);
                self.ctx.set_positional_args(node, args);
            }
            NodeKind::FuncCall => self.function_call(node),
            NodeKind::FuncStmt => {
                if let Some(call) = self.child(node, 0) {
                    self.ctx.push_statement(Statement::Function(call));
                }
            }
            NodeKind::LetStmt => self.let_statement(node),
            NodeKind::RuleDecl => self.rule(node),
            NodeKind::PipelineDecl => self.pipeline(node),
            // Tokens and containers read by their parents.
            NodeKind::PipelineList
            | NodeKind::Stage
            | NodeKind::RuleRef
            | NodeKind::Name
            | NodeKind::StageNumber
            | NodeKind::MatchMode
            | NodeKind::MapEntry
            | NodeKind::NamedArg => {}
        }
    }

    // -- helpers ------------------------------------------------------------

    fn text(&self, node: NodeId) -> &'t str {
        self.ctx.tree().text(node).unwrap_or_default()
    }

    fn set(&mut self, node: NodeId, kind: ExprKind) {
        let pos = self.ctx.tree().pos(node);
        self.ctx.set_expr(node, Expr::new(node, pos, kind));
    }

    /// Take the expression built for the `index`-th child of `node`.
    fn child(&mut self, node: NodeId, index: usize) -> Option<Expr> {
        let child = *self.ctx.tree().children(node).get(index)?;
        let expr = self.ctx.take_expr(child);
        if expr.is_none() {
            pl_debug!(ast, node = %child, kind = self.ctx.tree().kind(child).label(), "no expression for child");
        }
        expr
    }

    fn all_children(&mut self, node: NodeId) -> Vec<Expr> {
        let tree = self.ctx.tree();
        tree.children(node)
            .iter()
            .filter_map(|c| self.ctx.take_expr(*c))
            .collect()
    }

    // -- expressions --------------------------------------------------------

    fn integer(&mut self, node: NodeId) {
        let text = self.text(node);
        match text.parse::<i64>() {
            Ok(value) => self.set(node, ExprKind::Long(value)),
            Err(_) => {
                self.ctx.error_at(
                    node,
                    ParseErrorKind::SyntaxError {
                        message: format!("integer literal `{text}` out of range"),
                    },
                );
                self.set(node, ExprKind::Long(0));
            }
        }
    }

    fn float(&mut self, node: NodeId) {
        let text = self.text(node);
        match text.parse::<f64>() {
            Ok(value) => self.set(node, ExprKind::Double(value)),
            Err(_) => {
                self.ctx.error_at(
                    node,
                    ParseErrorKind::SyntaxError {
                        message: format!("invalid number `{text}`"),
                    },
                );
                self.set(node, ExprKind::Double(0.0));
            }
        }
    }

    fn pass_through(&mut self, node: NodeId) {
        self.ctx.mark_inner(node);
        if let Some(inner) = self.child(node, 0) {
            self.ctx.set_expr(node, inner);
        }
    }

    /// A field name under `$message` or after `.` is a field reference;
    /// anything else names a variable.
    fn identifier(&mut self, node: NodeId) {
        let tree = self.ctx.tree();
        let name = self.text(node).to_string();
        let is_field = match tree.parent(node) {
            Some(parent) => match tree.kind(parent) {
                NodeKind::MessageRef => true,
                NodeKind::FieldAccess => tree.child_index(node) == Some(1),
                _ => false,
            },
            None => false,
        };
        if is_field {
            self.set(node, ExprKind::FieldRef(name));
            return;
        }
        if !self.ctx.is_declared(&name) {
            pl_debug!(ast, variable = %name, pos = %tree.pos(node), "undeclared variable");
            self.ctx
                .error_at(node, ParseErrorKind::UndeclaredVariable { name: name.clone() });
        }
        self.set(
            node,
            ExprKind::VarRef {
                name,
                ty: ValueType::Any,
            },
        );
    }

    fn map_literal(&mut self, node: NodeId) {
        let tree = self.ctx.tree();
        let mut entries = Vec::new();
        for entry in tree.children(node) {
            let key = self.text(*entry).to_string();
            if let Some(value) = self.child(*entry, 0) {
                entries.push((key, value));
            }
        }
        self.set(node, ExprKind::Map(entries));
    }

    fn comparison(&mut self, node: NodeId) {
        let op_text = self.text(node);
        let Some(op) = CmpOp::from_symbol(op_text) else {
            self.ctx.error_at(
                node,
                ParseErrorKind::SyntaxError {
                    message: format!("unknown comparison operator `{op_text}`"),
                },
            );
            return;
        };
        let (Some(left), Some(right)) = (self.child(node, 0), self.child(node, 1)) else {
            return;
        };
        self.set(
            node,
            ExprKind::Comparison {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
        );
    }

    fn function_call(&mut self, node: NodeId) {
        let tree = self.ctx.tree();
        let name = self.text(node);
        let args = match tree.children(node).first() {
            Some(args_node) => match tree.kind(*args_node) {
                NodeKind::NamedArgs => {
                    CallArgs::Named(self.ctx.take_named_args(*args_node).unwrap_or_default())
                }
                _ => CallArgs::Positional(
                    self.ctx.take_positional_args(*args_node).unwrap_or_default(),
                ),
            },
            None => CallArgs::Positional(Vec::new()),
        };

        let call = match self.registry.resolve(name) {
            Some(function) => {
                let (bound, problems) = bind_args(function.descriptor(), args);
                for problem in problems {
                    self.ctx.error_at(node, problem);
                }
                FunctionExpr::new(function, bound)
            }
            None => {
                pl_debug!(ast, function = name, pos = %tree.pos(node), "unresolved function");
                self.ctx.error_at(
                    node,
                    ParseErrorKind::UndeclaredFunction {
                        name: name.to_string(),
                    },
                );
                FunctionExpr::new(self.registry.resolve_or_error(name), bind_unchecked(args))
            }
        };
        self.set(node, ExprKind::FunctionCall(call));
    }

    // -- statements and declarations ---------------------------------------

    fn let_statement(&mut self, node: NodeId) {
        let name = self.text(node).to_string();
        let Some(value) = self.child(node, 0) else {
            return;
        };
        if !self.ctx.declare_var(&name, value.clone()) {
            pl_debug!(ast, variable = %name, "variable reassigned; first declaration kept");
        }
        self.ctx.push_statement(Statement::VarAssign { name, expr: value });
    }

    fn rule(&mut self, node: NodeId) {
        let tree = self.ctx.tree();
        let name = tree
            .first_child_of_kind(node, NodeKind::Name)
            .map(|n| self.text(n).to_string())
            .unwrap_or_default();
        let condition = self.child(node, 1);
        let when = match condition {
            Some(condition) => self.rule_condition(condition),
            None => LogicalExpr::always_false(node, tree.pos(node)),
        };
        let then = self.ctx.take_statements();
        pl_debug!(ast, rule = %name, statements = then.len(), "rule built");
        self.ctx.rules.push(Rule { name, when, then });
    }

    /// Normalize a rule condition: boolean calls are wrapped, anything
    /// non-boolean never matches.
    fn rule_condition(&mut self, condition: Expr) -> LogicalExpr {
        match LogicalExpr::new(as_condition(condition)) {
            Ok(when) => when,
            Err(other) => {
                let actual = other.value_type();
                pl_warn!(ast, pos = %other.pos, %actual, "non-boolean rule condition replaced by false");
                let kind = ParseErrorKind::NonBooleanCondition { actual };
                if self.options.strict_conditions {
                    self.ctx.error_at(other.node, kind);
                } else {
                    self.ctx.warning_at(other.node, kind);
                }
                LogicalExpr::always_false(other.node, other.pos)
            }
        }
    }

    fn pipeline(&mut self, node: NodeId) {
        let tree = self.ctx.tree();
        let name = tree
            .first_child_of_kind(node, NodeKind::Name)
            .map(|n| self.text(n).to_string())
            .unwrap_or_default();
        let mut pipeline = Pipeline::new(name.clone());

        for stage_node in tree.children_of_kind(node, NodeKind::Stage) {
            let Some(stage) = self.stage(stage_node) else {
                pl_debug!(ast, pipeline = %name, "malformed stage; pipeline skipped");
                return;
            };
            let number = stage.number;
            if !pipeline.add_stage(stage) {
                pl_warn!(ast, pipeline = %name, stage = number, "duplicate stage number; first declaration kept");
            }
        }

        pl_debug!(ast, pipeline = %name, stages = pipeline.stage_count(), "pipeline built");
        self.ctx.pipelines.push(pipeline);
    }

    fn stage(&mut self, node: NodeId) -> Option<Stage> {
        let tree = self.ctx.tree();
        let number = match tree.first_child_of_kind(node, NodeKind::StageNumber) {
            Some(n) => {
                let text = self.text(n);
                match text.parse::<i64>() {
                    Ok(number) => Some(number),
                    Err(_) => {
                        self.syntax_error(n, format!("stage number `{text}` out of range"));
                        None
                    }
                }
            }
            None => {
                self.syntax_error(node, "stage number missing".to_string());
                None
            }
        };
        let mode = match tree.first_child_of_kind(node, NodeKind::MatchMode) {
            Some(m) => Some(self.text(m) == "all"),
            None => {
                self.syntax_error(node, "stage match mode missing".to_string());
                None
            }
        };
        let (number, match_all) = (number?, mode?);

        let mut rule_references = Vec::new();
        for reference in tree.children_of_kind(node, NodeKind::RuleRef) {
            let name = match tree.first_child_of_kind(reference, NodeKind::Name) {
                Some(n) => self.text(n).to_string(),
                None => {
                    self.syntax_error(reference, "rule reference without a name".to_string());
                    ILLEGAL_REFERENCE.to_string()
                }
            };
            rule_references.push(name);
        }

        Some(Stage {
            number,
            match_all,
            rule_references,
        })
    }

    fn syntax_error(&mut self, node: NodeId, message: String) {
        self.ctx
            .error_at(node, ParseErrorKind::SyntaxError { message });
    }
}

/// Wrap a boolean-typed, non-logical expression (a call or variable) so it
/// can stand where a condition is required.
pub(crate) fn as_condition(expr: Expr) -> Expr {
    if !expr.is_logical() && expr.value_type() == ValueType::Boolean {
        let (node, pos) = (expr.node, expr.pos);
        Expr::new(node, pos, ExprKind::BooleanFunction(Box::new(expr)))
    } else {
        expr
    }
}
