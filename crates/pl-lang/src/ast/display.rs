use std::fmt;

use super::expr::{Expr, ExprKind, FunctionExpr, LogicalExpr};
use super::rule::{Pipeline, Rule, Stage, Statement};

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExprKind::And(l, r) => write!(f, "({l} && {r})"),
            ExprKind::Or(l, r) => write!(f, "({l} || {r})"),
            ExprKind::Not(inner) => write!(f, "!{inner}"),
            ExprKind::Bool(b) => write!(f, "{b}"),
            ExprKind::BooleanFunction(call) => write!(f, "{call}"),
            ExprKind::Equality { equal, left, right } => {
                let op = if *equal { "==" } else { "!=" };
                write!(f, "{left} {op} {right}")
            }
            ExprKind::Comparison { op, left, right } => {
                write!(f, "{left} {} {right}", op.symbol())
            }
            ExprKind::Long(n) => write!(f, "{n}"),
            ExprKind::Double(n) => write!(f, "{n:?}"),
            ExprKind::Str(s) => write!(f, "{}", quote(s)),
            ExprKind::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            ExprKind::Map(entries) => {
                f.write_str("{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {value}", quote(key))?;
                }
                f.write_str("}")
            }
            ExprKind::VarRef { name, .. } | ExprKind::FieldRef(name) => f.write_str(name),
            ExprKind::FieldAccess { object, field } => write!(f, "{object}.{field}"),
            ExprKind::MessageRef(field) => match &field.kind {
                ExprKind::FieldRef(name) => write!(f, "$message.{name}"),
                _ => write!(f, "$message[{field}]"),
            },
            ExprKind::FunctionCall(call) => write!(f, "{call}"),
        }
    }
}

impl fmt::Display for FunctionExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name())?;
        for (i, (name, expr)) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}: {expr}")?;
        }
        f.write_str(")")
    }
}

impl fmt::Display for LogicalExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expr())
    }
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

// ---------------------------------------------------------------------------
// Rules & pipelines
// ---------------------------------------------------------------------------

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Function(expr) => write!(f, "{expr};"),
            Statement::VarAssign { name, expr } => write!(f, "let {name} = {expr};"),
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "rule {}", quote(&self.name))?;
        writeln!(f, "when")?;
        writeln!(f, "  {}", self.when)?;
        writeln!(f, "then")?;
        for stmt in &self.then {
            writeln!(f, "  {stmt}")?;
        }
        write!(f, "end")
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = if self.match_all { "all" } else { "either" };
        write!(f, "stage {} match {mode}", self.number)?;
        for rule in &self.rule_references {
            write!(f, "\n  rule {};", quote(rule))?;
        }
        Ok(())
    }
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "pipeline {}", quote(&self.name))?;
        for stage in self.stages() {
            writeln!(f, "{stage}")?;
        }
        write!(f, "end")
    }
}
