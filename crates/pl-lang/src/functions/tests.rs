use std::sync::Arc;

use super::*;
use crate::ast::{Expr, ExprKind, Message};
use crate::tree::{NodeId, SourcePos};

fn long(n: i64) -> Expr {
    Expr::new(NodeId(0), SourcePos::default(), ExprKind::Long(n))
}

/// Returns its `value` argument unchanged.
struct Identity {
    descriptor: FunctionDescriptor,
}

impl Identity {
    fn new() -> Self {
        Self {
            descriptor: FunctionDescriptor::new("identity", ValueType::Any)
                .param(ParameterDescriptor::required("value", ValueType::Any)),
        }
    }
}

impl Function for Identity {
    fn descriptor(&self) -> &FunctionDescriptor {
        &self.descriptor
    }

    fn evaluate(&self, args: &FunctionArgs, ctx: &mut EvalContext) -> Result<Value, EvalError> {
        args.evaluate("value", ctx)
    }
}

#[test]
fn descriptor_parameter_helpers() {
    let d = FunctionDescriptor::new("f", ValueType::String)
        .param(ParameterDescriptor::required("a", ValueType::Long))
        .param(ParameterDescriptor::optional("b", ValueType::String));
    assert!(d.has_optional());
    assert_eq!(d.required_count(), 1);
    assert!(!d.optional_before_required());
    assert_eq!(d.find_param("b").map(|p| p.ty), Some(ValueType::String));
    assert!(d.find_param("c").is_none());

    let ambiguous = FunctionDescriptor::new("g", ValueType::Any)
        .param(ParameterDescriptor::optional("a", ValueType::Long))
        .param(ParameterDescriptor::required("b", ValueType::String));
    assert!(ambiguous.optional_before_required());
}

#[test]
fn args_keep_first_binding() {
    let mut args = FunctionArgs::new();
    args.bind("a", long(1));
    args.bind("a", long(2));
    args.bind("b", long(3));
    assert_eq!(args.len(), 2);
    assert_eq!(args.get("a"), Some(&long(1)));
    assert!(args.contains("b"));
    assert!(args.get("c").is_none());
    let names: Vec<&str> = args.iter().map(|(n, _)| n).collect();
    assert_eq!(names, vec!["a", "b"]);
}

#[test]
fn unbound_argument_evaluates_to_null() {
    let args = FunctionArgs::new();
    let mut ctx = EvalContext::new(Message::new());
    assert_eq!(args.evaluate("missing", &mut ctx), Ok(Value::Null));
}

#[test]
fn registry_resolves_registered_functions() {
    let mut registry = FunctionRegistry::new();
    assert!(registry.is_empty());
    assert!(registry.register(Arc::new(Identity::new())).is_none());
    assert!(registry.register(Arc::new(Identity::new())).is_some());
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.names(), vec!["identity"]);

    let f = registry.resolve("identity").unwrap();
    let mut args = FunctionArgs::new();
    args.bind("value", long(7));
    let mut ctx = EvalContext::default();
    assert_eq!(f.evaluate(&args, &mut ctx), Ok(Value::Long(7)));
}

#[test]
fn unknown_function_resolves_to_error_placeholder() {
    let registry = FunctionRegistry::new();
    assert!(registry.resolve("nope").is_none());
    let f = registry.resolve_or_error("nope");
    assert_eq!(f.descriptor().name, "nope");
    assert_eq!(f.descriptor().return_type, ValueType::Any);
    assert!(f.descriptor().params.is_empty());
    let mut ctx = EvalContext::default();
    assert_eq!(
        f.evaluate(&FunctionArgs::new(), &mut ctx),
        Err(EvalError::UnresolvedFunction("nope".into()))
    );
}

#[test]
fn declared_function_has_no_implementation() {
    let f = DeclaredFunction::new(FunctionDescriptor::new("later", ValueType::Boolean));
    let mut ctx = EvalContext::default();
    assert_eq!(
        f.evaluate(&FunctionArgs::new(), &mut ctx),
        Err(EvalError::NotImplemented("later".into()))
    );
}
