use std::fmt;

use crate::ast::ValueType;
use crate::tree::{NodeId, SourcePos};

/// Severity level for analysis diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Error,
    Warning,
}

/// What went wrong. Every kind is recoverable: analysis records it and
/// keeps going.
#[derive(Debug, Clone, PartialEq, Eq, Hash, thiserror::Error)]
pub enum ParseErrorKind {
    #[error("syntax error: {message}")]
    SyntaxError { message: String },
    #[error("unknown function `{name}`")]
    UndeclaredFunction { name: String },
    #[error("undeclared variable `{name}`")]
    UndeclaredVariable { name: String },
    #[error("`{function}()` expects {expected} argument(s), got {actual}")]
    WrongNumberOfArgs {
        function: String,
        expected: usize,
        actual: usize,
    },
    #[error("`{function}()` is missing required parameter `{param}`")]
    MissingRequiredParam { function: String, param: String },
    #[error("`{function}()` declares optional parameters before required ones; use named arguments")]
    OptionalParametersMustBeNamed { function: String },
    #[error("incompatible operand types for `{op}`: {left} and {right}")]
    IncompatibleTypes {
        op: String,
        left: ValueType,
        right: ValueType,
    },
    #[error("expected type {expected}, found {actual}")]
    IncompatibleType {
        expected: ValueType,
        actual: ValueType,
    },
    #[error("`{function}()` parameter `{param}` expects {expected}, found {actual}")]
    IncompatibleArgumentType {
        function: String,
        param: String,
        expected: ValueType,
        actual: ValueType,
    },
    #[error("rule condition of type {actual} is not a boolean; it will never match")]
    NonBooleanCondition { actual: ValueType },
}

/// A located diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParseError {
    pub severity: Severity,
    pub pos: SourcePos,
    /// Originating parse-tree node; absent for grammar-level failures.
    pub node: Option<NodeId>,
    pub kind: ParseErrorKind,
}

impl ParseError {
    pub fn error(pos: SourcePos, node: Option<NodeId>, kind: ParseErrorKind) -> Self {
        Self {
            severity: Severity::Error,
            pos,
            node,
            kind,
        }
    }

    pub fn warning(pos: SourcePos, node: Option<NodeId>, kind: ParseErrorKind) -> Self {
        Self {
            severity: Severity::Warning,
            pos,
            node,
            kind,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn line(&self) -> usize {
        self.pos.line
    }

    pub fn column(&self) -> usize {
        self.pos.column
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{prefix}: {}: {}", self.pos, self.kind)
    }
}

impl std::error::Error for ParseError {}

/// Failure of a parse call: every error found, ordered by position.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{} error(s) while parsing{}", .errors.len(), render(.errors))]
pub struct ParseFailure {
    pub errors: Vec<ParseError>,
}

impl ParseFailure {
    pub fn new(errors: Vec<ParseError>) -> Self {
        Self { errors }
    }

    pub fn kinds(&self) -> impl Iterator<Item = &ParseErrorKind> {
        self.errors.iter().map(|e| &e.kind)
    }
}

fn render(errors: &[ParseError]) -> String {
    errors.iter().map(|e| format!("\n  {e}")).collect()
}
