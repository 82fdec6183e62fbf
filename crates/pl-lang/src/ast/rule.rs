use std::collections::BTreeMap;

use super::expr::{Expr, LogicalExpr};
use super::value::{EvalContext, EvalError};

// ---------------------------------------------------------------------------
// Statements
// ---------------------------------------------------------------------------

/// One action of a rule's `then` block.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `call(args);`
    Function(Expr),
    /// `let name = expr;`
    VarAssign { name: String, expr: Expr },
}

impl Statement {
    pub fn expr(&self) -> &Expr {
        match self {
            Statement::Function(expr) | Statement::VarAssign { expr, .. } => expr,
        }
    }

    pub fn expr_mut(&mut self) -> &mut Expr {
        match self {
            Statement::Function(expr) | Statement::VarAssign { expr, .. } => expr,
        }
    }

    /// Run the statement: evaluate the call, or bind the variable.
    pub fn execute(&self, ctx: &mut EvalContext) -> Result<(), EvalError> {
        match self {
            Statement::Function(expr) => {
                expr.evaluate(ctx)?;
            }
            Statement::VarAssign { name, expr } => {
                let value = expr.evaluate(ctx)?;
                ctx.define(name.clone(), value);
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Rule
// ---------------------------------------------------------------------------

/// `rule "name" when <condition> then <statements> end`
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub name: String,
    pub when: LogicalExpr,
    pub then: Vec<Statement>,
}

impl Rule {
    /// Evaluate the condition and, if it holds, run every action in order.
    /// Returns whether the rule matched.
    pub fn apply(&self, ctx: &mut EvalContext) -> Result<bool, EvalError> {
        if !self.when.evaluate(ctx)? {
            return Ok(false);
        }
        for stmt in &self.then {
            stmt.execute(ctx)?;
        }
        Ok(true)
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// `stage N match all|either` followed by rule references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    pub number: i64,
    pub match_all: bool,
    pub rule_references: Vec<String>,
}

/// A named set of stages ordered by stage number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    pub name: String,
    stages: BTreeMap<i64, Stage>,
}

impl Pipeline {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stages: BTreeMap::new(),
        }
    }

    /// Insert `stage` unless one with the same number already exists.
    /// Returns `false` when the stage was dropped as a duplicate.
    pub fn add_stage(&mut self, stage: Stage) -> bool {
        if self.stages.contains_key(&stage.number) {
            return false;
        }
        self.stages.insert(stage.number, stage);
        true
    }

    /// Stages in ascending stage-number order.
    pub fn stages(&self) -> impl Iterator<Item = &Stage> {
        self.stages.values()
    }

    pub fn stage(&self, number: i64) -> Option<&Stage> {
        self.stages.get(&number)
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }
}
