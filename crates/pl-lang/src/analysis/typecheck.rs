use std::fmt::Write as _;

use crate::analysis::context::AnalysisContext;
use crate::ast::{Expr, ExprKind, ValueType};
use crate::error::{ParseError, ParseErrorKind};
use crate::tree::NodeId;

/// Validate operand, argument and message-field types of every built rule.
/// The AST is not modified; problems are recorded in `ctx`.
pub(crate) fn check_types(ctx: &mut AnalysisContext<'_>) {
    let mut found = Vec::new();
    for rule in ctx.rules() {
        check_expr(rule.when.expr(), &mut found);
        for stmt in &rule.then {
            check_expr(stmt.expr(), &mut found);
        }
    }
    for error in found {
        ctx.add_error(error);
    }

    if tracing::enabled!(tracing::Level::TRACE) {
        let trace = tree_trace(ctx);
        pl_trace!(check, tree = %trace, "annotated parse tree");
    }
}

fn check_expr(expr: &Expr, found: &mut Vec<ParseError>) {
    expr.walk(&mut |e: &Expr| match &e.kind {
        ExprKind::And(left, right) => check_operands(e, "&&", left, right, found),
        ExprKind::Or(left, right) => check_operands(e, "||", left, right, found),
        ExprKind::Comparison { op, left, right } => {
            check_operands(e, op.symbol(), left, right, found)
        }
        ExprKind::FunctionCall(call) => {
            let descriptor = call.function.descriptor();
            for param in &descriptor.params {
                let Some(arg) = call.args.get(&param.name) else {
                    continue;
                };
                let actual = arg.value_type();
                if !param.ty.is_assignable_from(actual) {
                    found.push(ParseError::error(
                        arg.pos,
                        Some(arg.node),
                        ParseErrorKind::IncompatibleArgumentType {
                            function: descriptor.name.clone(),
                            param: param.name.clone(),
                            expected: param.ty,
                            actual,
                        },
                    ));
                }
            }
        }
        ExprKind::MessageRef(field) => {
            let actual = field.value_type();
            if actual != ValueType::String {
                found.push(ParseError::error(
                    field.pos,
                    Some(field.node),
                    ParseErrorKind::IncompatibleType {
                        expected: ValueType::String,
                        actual,
                    },
                ));
            }
        }
        _ => {}
    });
}

fn check_operands(
    expr: &Expr,
    op: &str,
    left: &Expr,
    right: &Expr,
    found: &mut Vec<ParseError>,
) {
    let (lt, rt) = (left.value_type(), right.value_type());
    if lt != rt {
        found.push(ParseError::error(
            expr.pos,
            Some(expr.node),
            ParseErrorKind::IncompatibleTypes {
                op: op.to_string(),
                left: lt,
                right: rt,
            },
        ));
    }
}

/// Parenthesized rendering of the parse tree with the static type of each
/// node that produced an expression. Inner nodes are skipped.
pub(crate) fn tree_trace(ctx: &AnalysisContext<'_>) -> String {
    let mut out = String::new();
    render(ctx, ctx.tree().root(), &mut out);
    out
}

fn render(ctx: &AnalysisContext<'_>, node: NodeId, out: &mut String) {
    let tree = ctx.tree();
    if ctx.is_inner(node) {
        for child in tree.children(node) {
            render(ctx, *child, out);
        }
        return;
    }
    if !out.is_empty() && !out.ends_with('(') {
        out.push(' ');
    }
    out.push('(');
    out.push_str(tree.kind(node).label());
    if let Some(ty) = ctx.node_type(node) {
        let _ = write!(out, ":{ty}");
    }
    if let Some(text) = tree.text(node) {
        let _ = write!(out, " {text:?}");
    }
    for child in tree.children(node) {
        render(ctx, *child, out);
    }
    out.push(')');
}
