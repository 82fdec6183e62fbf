mod rules;
mod types;

use std::sync::Arc;

use crate::analysis::{AnalysisContext, analyze};
use crate::ast::{EvalContext, EvalError, Expr, ExprKind, FunctionExpr, Rule, Statement, Value, ValueType};
use crate::error::{ParseError, ParseErrorKind};
use crate::functions::{
    Function, FunctionArgs, FunctionDescriptor, FunctionRegistry, ParameterDescriptor,
};
use crate::grammar;
use crate::parser::{ParserOptions, PipelineRuleParser};
use crate::tree::ParseTree;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

type Body = dyn Fn(&FunctionArgs, &mut EvalContext) -> Result<Value, EvalError> + Send + Sync;

struct TestFunction {
    descriptor: FunctionDescriptor,
    body: Box<Body>,
}

impl Function for TestFunction {
    fn descriptor(&self) -> &FunctionDescriptor {
        &self.descriptor
    }

    fn evaluate(&self, args: &FunctionArgs, ctx: &mut EvalContext) -> Result<Value, EvalError> {
        (self.body)(args, ctx)
    }
}

fn function(
    descriptor: FunctionDescriptor,
    body: impl Fn(&FunctionArgs, &mut EvalContext) -> Result<Value, EvalError> + Send + Sync + 'static,
) -> Arc<dyn Function> {
    Arc::new(TestFunction {
        descriptor,
        body: Box::new(body),
    })
}

fn no_op(_: &FunctionArgs, _: &mut EvalContext) -> Result<Value, EvalError> {
    Ok(Value::Null)
}

fn req(name: &str, ty: ValueType) -> ParameterDescriptor {
    ParameterDescriptor::required(name, ty)
}

fn opt(name: &str, ty: ValueType) -> ParameterDescriptor {
    ParameterDescriptor::optional(name, ty)
}

/// Registry shared by the analysis tests.
///
/// - `to_long(value: any, default: long?) -> long`
/// - `to_string(value: any) -> string`
/// - `has_field(field: string) -> boolean`
/// - `set_field(field: string, value: any) -> any`
/// - `concat(first: string, second: string) -> string`
/// - `pos_opt(a: long, b: string?) -> any`
/// - `opt_first(a: long?, b: string) -> any`
/// - `route(stream: string, target: string, priority: long?) -> any`
fn test_registry() -> FunctionRegistry {
    let mut registry = FunctionRegistry::new();
    registry.register(function(
        FunctionDescriptor::new("to_long", ValueType::Long)
            .param(req("value", ValueType::Any))
            .param(opt("default", ValueType::Long)),
        |args, ctx| {
            let fallback = match args.evaluate("default", ctx)? {
                Value::Long(n) => n,
                _ => 0,
            };
            Ok(Value::Long(match args.evaluate("value", ctx)? {
                Value::Long(n) => n,
                Value::Double(n) => n as i64,
                Value::Str(s) => s.trim().parse().unwrap_or(fallback),
                _ => fallback,
            }))
        },
    ));
    registry.register(function(
        FunctionDescriptor::new("to_string", ValueType::String).param(req("value", ValueType::Any)),
        |args, ctx| Ok(Value::Str(args.evaluate("value", ctx)?.to_string())),
    ));
    registry.register(function(
        FunctionDescriptor::new("has_field", ValueType::Boolean)
            .param(req("field", ValueType::String)),
        |args, ctx| {
            let field = args.evaluate("field", ctx)?.to_string();
            Ok(Value::Bool(ctx.message.field(&field).is_some()))
        },
    ));
    registry.register(function(
        FunctionDescriptor::new("set_field", ValueType::Any)
            .param(req("field", ValueType::String))
            .param(req("value", ValueType::Any)),
        |args, ctx| {
            let field = args.evaluate("field", ctx)?.to_string();
            let value = args.evaluate("value", ctx)?;
            ctx.message.set_field(field, value);
            Ok(Value::Null)
        },
    ));
    registry.register(function(
        FunctionDescriptor::new("concat", ValueType::String)
            .param(req("first", ValueType::String))
            .param(req("second", ValueType::String)),
        |args, ctx| {
            let first = args.evaluate("first", ctx)?;
            let second = args.evaluate("second", ctx)?;
            Ok(Value::Str(format!("{first}{second}")))
        },
    ));
    registry.register(function(
        FunctionDescriptor::new("pos_opt", ValueType::Any)
            .param(req("a", ValueType::Long))
            .param(opt("b", ValueType::String)),
        no_op,
    ));
    registry.register(function(
        FunctionDescriptor::new("opt_first", ValueType::Any)
            .param(opt("a", ValueType::Long))
            .param(req("b", ValueType::String)),
        no_op,
    ));
    registry.register(function(
        FunctionDescriptor::new("route", ValueType::Any)
            .param(req("stream", ValueType::String))
            .param(req("target", ValueType::String))
            .param(opt("priority", ValueType::Long)),
        no_op,
    ));
    registry
}

fn parser() -> PipelineRuleParser {
    PipelineRuleParser::new(Arc::new(test_registry()))
}

/// Rule source with the given condition and `then` block.
fn rule_src(when: &str, then: &str) -> String {
    format!("rule \"test\"\nwhen {when}\nthen\n{then}\nend")
}

fn parse_ok(src: &str) -> Rule {
    match parser().parse_rule(src) {
        Ok(rule) => rule,
        Err(failure) => panic!("expected rule to parse, got: {failure}"),
    }
}

fn error_kinds(src: &str) -> Vec<ParseErrorKind> {
    match parser().parse_rule(src) {
        Ok(rule) => panic!("expected errors, parsed: {rule}"),
        Err(failure) => failure.kinds().cloned().collect(),
    }
}

/// Run analysis without failing on errors, for inspecting the best-effort
/// AST.
fn analyze_rule(tree: &ParseTree) -> AnalysisContext<'_> {
    analyze(tree, &test_registry(), ParserOptions::default())
}

fn rule_tree(src: &str) -> ParseTree {
    grammar::parse_rule_tree(src).unwrap()
}

fn call_of(stmt: &Statement) -> &FunctionExpr {
    match &stmt.expr().kind {
        ExprKind::FunctionCall(call) => call,
        other => panic!("expected function call, got {other:?}"),
    }
}

fn only_errors(errors: &[ParseError]) -> Vec<&ParseErrorKind> {
    errors.iter().filter(|e| e.is_error()).map(|e| &e.kind).collect()
}

fn is_long(expr: &Expr, n: i64) -> bool {
    expr.kind == ExprKind::Long(n)
}
