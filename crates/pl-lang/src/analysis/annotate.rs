use std::collections::HashMap;

use crate::analysis::context::AnalysisContext;
use crate::ast::{Expr, ExprKind, ValueType};
use crate::tree::NodeId;

/// Copy each variable's static type onto every reference to it.
///
/// Variables are resolved in declaration order, so a definition may use
/// any variable declared before it. A reference with no definition was
/// already reported by the builder and is left as `Any`.
pub(crate) fn annotate_types(ctx: &mut AnalysisContext<'_>) {
    let mut known: HashMap<String, ValueType> = HashMap::new();
    let mut resolved: Vec<(NodeId, ValueType)> = Vec::new();

    for name in ctx.var_names().to_vec() {
        if let Some(definition) = ctx.var_mut(&name) {
            resolve_var_refs(definition, &known, &mut resolved);
            known.insert(name, definition.value_type());
        }
    }

    for rule in &mut ctx.rules {
        resolve_var_refs(rule.when.expr_mut(), &known, &mut resolved);
        for stmt in &mut rule.then {
            resolve_var_refs(stmt.expr_mut(), &known, &mut resolved);
        }
    }

    for (node, ty) in resolved {
        ctx.set_node_type(node, ty);
    }
}

fn resolve_var_refs(
    expr: &mut Expr,
    known: &HashMap<String, ValueType>,
    resolved: &mut Vec<(NodeId, ValueType)>,
) {
    expr.walk_mut(&mut |e: &mut Expr| {
        let node = e.node;
        if let ExprKind::VarRef { name, ty } = &mut e.kind {
            match known.get(name.as_str()) {
                Some(defined) => {
                    *ty = *defined;
                    resolved.push((node, *defined));
                }
                None => {
                    pl_debug!(check, variable = %name, node = %node, "no definition for variable reference");
                }
            }
        }
    });
}
