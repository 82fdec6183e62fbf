#[macro_use]
mod log_macros;

pub mod analysis;
pub mod ast;
pub mod error;
pub mod functions;
pub mod grammar;
pub mod parse_utils;
mod parser;
pub mod tree;

pub use ast::{
    EvalContext, EvalError, Expr, ExprKind, LogicalExpr, Message, Pipeline, Rule, Stage,
    Statement, Value, ValueType,
};
pub use error::{ParseError, ParseErrorKind, ParseFailure, Severity};
pub use functions::{
    DeclaredFunction, ErrorFunction, Function, FunctionArgs, FunctionDescriptor,
    FunctionRegistry, ParameterDescriptor,
};
pub use parser::{Parsed, ParserOptions, PipelineRuleParser};
