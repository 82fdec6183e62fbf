use std::cmp::Ordering;
use std::collections::BTreeMap;

use super::expr::{CmpOp, Expr, ExprKind, LogicalExpr, ValueType};
use super::value::{EvalContext, EvalError, Value};

impl Expr {
    /// Evaluate against `ctx`. Missing fields and unbound variables yield
    /// [`Value::Null`].
    pub fn evaluate(&self, ctx: &mut EvalContext) -> Result<Value, EvalError> {
        match &self.kind {
            ExprKind::And(left, right) => {
                if !left.evaluate_bool(ctx)? {
                    return Ok(Value::Bool(false));
                }
                Ok(Value::Bool(right.evaluate_bool(ctx)?))
            }
            ExprKind::Or(left, right) => {
                if left.evaluate_bool(ctx)? {
                    return Ok(Value::Bool(true));
                }
                Ok(Value::Bool(right.evaluate_bool(ctx)?))
            }
            ExprKind::Not(inner) => Ok(Value::Bool(!inner.evaluate_bool(ctx)?)),
            ExprKind::Bool(b) => Ok(Value::Bool(*b)),
            ExprKind::BooleanFunction(call) => match call.evaluate(ctx)? {
                Value::Bool(b) => Ok(Value::Bool(b)),
                _ => Ok(Value::Bool(false)),
            },
            ExprKind::Equality { equal, left, right } => {
                let lv = left.evaluate(ctx)?;
                let rv = right.evaluate(ctx)?;
                Ok(Value::Bool(lv.loosely_equals(&rv) == *equal))
            }
            ExprKind::Comparison { op, left, right } => {
                let lv = left.evaluate(ctx)?;
                let rv = right.evaluate(ctx)?;
                compare(*op, &lv, &rv).map(Value::Bool)
            }
            ExprKind::Long(n) => Ok(Value::Long(*n)),
            ExprKind::Double(n) => Ok(Value::Double(*n)),
            ExprKind::Str(s) => Ok(Value::Str(s.clone())),
            ExprKind::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(item.evaluate(ctx)?);
                }
                Ok(Value::Array(out))
            }
            ExprKind::Map(entries) => {
                let mut out = BTreeMap::new();
                for (key, value) in entries {
                    out.insert(key.clone(), value.evaluate(ctx)?);
                }
                Ok(Value::Map(out))
            }
            ExprKind::VarRef { name, .. } => Ok(ctx.vars.get(name).cloned().unwrap_or(Value::Null)),
            ExprKind::FieldRef(name) => Ok(Value::Str(name.clone())),
            ExprKind::FieldAccess { object, field } => {
                let target = object.evaluate(ctx)?;
                let key = field.evaluate(ctx)?;
                Ok(match (target, key) {
                    (Value::Map(mut entries), Value::Str(key)) => {
                        entries.remove(&key).unwrap_or(Value::Null)
                    }
                    _ => Value::Null,
                })
            }
            ExprKind::MessageRef(field) => match field.evaluate(ctx)? {
                Value::Null => Ok(Value::Null),
                name => {
                    let name = name.to_string();
                    Ok(ctx.message.field(&name).cloned().unwrap_or(Value::Null))
                }
            },
            ExprKind::FunctionCall(call) => call.function.evaluate(&call.args, ctx),
        }
    }

    /// Evaluate and require a boolean result.
    pub fn evaluate_bool(&self, ctx: &mut EvalContext) -> Result<bool, EvalError> {
        match self.evaluate(ctx)? {
            Value::Bool(b) => Ok(b),
            other => Err(EvalError::TypeMismatch {
                expected: ValueType::Boolean,
                actual: other.value_type(),
            }),
        }
    }
}

impl LogicalExpr {
    pub fn evaluate(&self, ctx: &mut EvalContext) -> Result<bool, EvalError> {
        self.expr().evaluate_bool(ctx)
    }
}

fn compare(op: CmpOp, left: &Value, right: &Value) -> Result<bool, EvalError> {
    let ordering = match (left, right) {
        (Value::Long(a), Value::Long(b)) => Some(a.cmp(b)),
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
        _ => match (left.as_f64(), right.as_f64()) {
            (Some(a), Some(b)) => a.partial_cmp(&b),
            _ => None,
        },
    };
    let Some(ordering) = ordering else {
        return Err(EvalError::Incomparable {
            op: op.symbol(),
            left: left.value_type(),
            right: right.value_type(),
        });
    };
    Ok(match op {
        CmpOp::Lt => ordering == Ordering::Less,
        CmpOp::Le => ordering != Ordering::Greater,
        CmpOp::Gt => ordering == Ordering::Greater,
        CmpOp::Ge => ordering != Ordering::Less,
    })
}
