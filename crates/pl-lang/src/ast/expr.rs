use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::functions::{Function, FunctionArgs};
use crate::tree::{NodeId, SourcePos};

// ---------------------------------------------------------------------------
// Static types
// ---------------------------------------------------------------------------

/// Static result type of an expression or a function parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Long,
    Double,
    String,
    Boolean,
    Array,
    Map,
    /// Unknown until runtime (message fields, untyped variables).
    Any,
}

impl ValueType {
    pub fn name(self) -> &'static str {
        match self {
            ValueType::Long => "long",
            ValueType::Double => "double",
            ValueType::String => "string",
            ValueType::Boolean => "boolean",
            ValueType::Array => "array",
            ValueType::Map => "map",
            ValueType::Any => "any",
        }
    }

    /// Whether a value of static type `actual` may be bound to a slot of
    /// this type. `Any` accepts everything; otherwise types must match.
    pub fn is_assignable_from(self, actual: ValueType) -> bool {
        self == ValueType::Any || self == actual
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ValueType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "long" => Ok(ValueType::Long),
            "double" => Ok(ValueType::Double),
            "string" => Ok(ValueType::String),
            "boolean" | "bool" => Ok(ValueType::Boolean),
            "array" => Ok(ValueType::Array),
            "map" => Ok(ValueType::Map),
            "any" => Ok(ValueType::Any),
            other => Err(format!("unknown value type `{other}`")),
        }
    }
}

// ---------------------------------------------------------------------------
// Operators
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
        }
    }

    pub fn from_symbol(s: &str) -> Option<Self> {
        match s {
            "<" => Some(CmpOp::Lt),
            "<=" => Some(CmpOp::Le),
            ">" => Some(CmpOp::Gt),
            ">=" => Some(CmpOp::Ge),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

/// A typed expression together with the parse-tree node it was built from.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub node: NodeId,
    pub pos: SourcePos,
    pub kind: ExprKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    // -- logical --
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    Bool(bool),
    /// A boolean-returning call used where a condition is required.
    BooleanFunction(Box<Expr>),

    // -- comparison --
    /// `==` when `equal`, `!=` otherwise.
    Equality {
        equal: bool,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Comparison {
        op: CmpOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    // -- literals --
    Long(i64),
    Double(f64),
    Str(String),

    // -- structural --
    Array(Vec<Expr>),
    Map(Vec<(String, Expr)>),

    // -- references --
    /// Variable declared by `let`; `ty` is filled in by type annotation.
    VarRef { name: String, ty: ValueType },
    /// Bare field name inside a field access or message reference.
    FieldRef(String),
    FieldAccess { object: Box<Expr>, field: Box<Expr> },
    /// `$message.field` / `$message[expr]`
    MessageRef(Box<Expr>),

    // -- calls --
    FunctionCall(FunctionExpr),
}

impl Expr {
    pub fn new(node: NodeId, pos: SourcePos, kind: ExprKind) -> Self {
        Self { node, pos, kind }
    }

    pub fn value_type(&self) -> ValueType {
        match &self.kind {
            ExprKind::And(..)
            | ExprKind::Or(..)
            | ExprKind::Not(_)
            | ExprKind::Bool(_)
            | ExprKind::BooleanFunction(_)
            | ExprKind::Equality { .. }
            | ExprKind::Comparison { .. } => ValueType::Boolean,
            ExprKind::Long(_) => ValueType::Long,
            ExprKind::Double(_) => ValueType::Double,
            ExprKind::Str(_) | ExprKind::FieldRef(_) => ValueType::String,
            ExprKind::Array(_) => ValueType::Array,
            ExprKind::Map(_) => ValueType::Map,
            ExprKind::VarRef { ty, .. } => *ty,
            ExprKind::FieldAccess { .. } | ExprKind::MessageRef(_) => ValueType::Any,
            ExprKind::FunctionCall(call) => call.return_type(),
        }
    }

    /// Logical expressions may be used directly as a rule condition.
    pub fn is_logical(&self) -> bool {
        matches!(
            self.kind,
            ExprKind::And(..)
                | ExprKind::Or(..)
                | ExprKind::Not(_)
                | ExprKind::Bool(_)
                | ExprKind::BooleanFunction(_)
                | ExprKind::Equality { .. }
                | ExprKind::Comparison { .. }
        )
    }

    /// Direct sub-expressions, left to right.
    pub fn children(&self) -> Vec<&Expr> {
        match &self.kind {
            ExprKind::And(l, r) | ExprKind::Or(l, r) => vec![&**l, &**r],
            ExprKind::Equality { left, right, .. } | ExprKind::Comparison { left, right, .. } => {
                vec![&**left, &**right]
            }
            ExprKind::Not(inner) | ExprKind::BooleanFunction(inner) | ExprKind::MessageRef(inner) => {
                vec![&**inner]
            }
            ExprKind::FieldAccess { object, field } => vec![&**object, &**field],
            ExprKind::Array(items) => items.iter().collect(),
            ExprKind::Map(entries) => entries.iter().map(|(_, v)| v).collect(),
            ExprKind::FunctionCall(call) => call.args.exprs().collect(),
            ExprKind::Bool(_)
            | ExprKind::Long(_)
            | ExprKind::Double(_)
            | ExprKind::Str(_)
            | ExprKind::VarRef { .. }
            | ExprKind::FieldRef(_) => Vec::new(),
        }
    }

    /// Visit this expression and all descendants, children first.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a Expr)) {
        for child in self.children() {
            child.walk(f);
        }
        f(self);
    }

    /// Mutable visit, children first.
    pub fn walk_mut(&mut self, f: &mut impl FnMut(&mut Expr)) {
        match &mut self.kind {
            ExprKind::And(l, r) | ExprKind::Or(l, r) => {
                l.walk_mut(f);
                r.walk_mut(f);
            }
            ExprKind::Equality { left, right, .. } | ExprKind::Comparison { left, right, .. } => {
                left.walk_mut(f);
                right.walk_mut(f);
            }
            ExprKind::Not(inner) | ExprKind::BooleanFunction(inner) | ExprKind::MessageRef(inner) => {
                inner.walk_mut(f)
            }
            ExprKind::FieldAccess { object, field } => {
                object.walk_mut(f);
                field.walk_mut(f);
            }
            ExprKind::Array(items) => {
                for item in items {
                    item.walk_mut(f);
                }
            }
            ExprKind::Map(entries) => {
                for (_, value) in entries {
                    value.walk_mut(f);
                }
            }
            ExprKind::FunctionCall(call) => {
                for arg in call.args.exprs_mut() {
                    arg.walk_mut(f);
                }
            }
            ExprKind::Bool(_)
            | ExprKind::Long(_)
            | ExprKind::Double(_)
            | ExprKind::Str(_)
            | ExprKind::VarRef { .. }
            | ExprKind::FieldRef(_) => {}
        }
        f(self);
    }
}

// ---------------------------------------------------------------------------
// Function call
// ---------------------------------------------------------------------------

/// Resolved call site: the callee plus its bound arguments.
#[derive(Clone)]
pub struct FunctionExpr {
    pub function: Arc<dyn Function>,
    pub args: FunctionArgs,
}

impl FunctionExpr {
    pub fn new(function: Arc<dyn Function>, args: FunctionArgs) -> Self {
        Self { function, args }
    }

    pub fn name(&self) -> &str {
        &self.function.descriptor().name
    }

    pub fn return_type(&self) -> ValueType {
        self.function.descriptor().return_type
    }
}

impl fmt::Debug for FunctionExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionExpr")
            .field("function", &self.name())
            .field("args", &self.args)
            .finish()
    }
}

impl PartialEq for FunctionExpr {
    fn eq(&self, other: &Self) -> bool {
        self.function.descriptor() == other.function.descriptor() && self.args == other.args
    }
}

// ---------------------------------------------------------------------------
// Logical expression (rule condition)
// ---------------------------------------------------------------------------

/// An expression statically known to be a condition.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalExpr(Expr);

impl LogicalExpr {
    /// Accept `expr` if it is logical; hand it back otherwise.
    pub fn new(expr: Expr) -> Result<Self, Expr> {
        if expr.is_logical() {
            Ok(Self(expr))
        } else {
            Err(expr)
        }
    }

    /// Constant `false`, anchored at `node`.
    pub fn always_false(node: NodeId, pos: SourcePos) -> Self {
        Self(Expr::new(node, pos, ExprKind::Bool(false)))
    }

    pub fn expr(&self) -> &Expr {
        &self.0
    }

    pub fn expr_mut(&mut self) -> &mut Expr {
        &mut self.0
    }

    pub fn into_inner(self) -> Expr {
        self.0
    }
}
