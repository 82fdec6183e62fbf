//! Function descriptors, call arguments and the registry consulted while
//! building call expressions.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::ast::{EvalContext, EvalError, Expr, Value, ValueType};

#[cfg(test)]
mod tests;

// ---------------------------------------------------------------------------
// Descriptors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterDescriptor {
    pub name: String,
    pub ty: ValueType,
    pub optional: bool,
}

impl ParameterDescriptor {
    pub fn required(name: impl Into<String>, ty: ValueType) -> Self {
        Self {
            name: name.into(),
            ty,
            optional: false,
        }
    }

    pub fn optional(name: impl Into<String>, ty: ValueType) -> Self {
        Self {
            name: name.into(),
            ty,
            optional: true,
        }
    }
}

/// Signature of a callable function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDescriptor {
    pub name: String,
    pub return_type: ValueType,
    pub params: Vec<ParameterDescriptor>,
}

impl FunctionDescriptor {
    pub fn new(name: impl Into<String>, return_type: ValueType) -> Self {
        Self {
            name: name.into(),
            return_type,
            params: Vec::new(),
        }
    }

    pub fn param(mut self, param: ParameterDescriptor) -> Self {
        self.params.push(param);
        self
    }

    pub fn has_optional(&self) -> bool {
        self.params.iter().any(|p| p.optional)
    }

    pub fn required_count(&self) -> usize {
        self.params.iter().filter(|p| !p.optional).count()
    }

    pub fn find_param(&self, name: &str) -> Option<&ParameterDescriptor> {
        self.params.iter().find(|p| p.name == name)
    }

    /// True when some optional parameter precedes a required one, which
    /// makes positional binding ambiguous.
    pub fn optional_before_required(&self) -> bool {
        let mut seen_optional = false;
        for p in &self.params {
            if p.optional {
                seen_optional = true;
            } else if seen_optional {
                return true;
            }
        }
        false
    }
}

// ---------------------------------------------------------------------------
// Bound arguments
// ---------------------------------------------------------------------------

/// Arguments of one call site, keyed by parameter name in binding order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FunctionArgs {
    by_name: Vec<(String, Expr)>,
}

impl FunctionArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name`; an existing binding for the same name is kept.
    pub fn bind(&mut self, name: impl Into<String>, expr: Expr) {
        let name = name.into();
        if self.get(&name).is_none() {
            self.by_name.push((name, expr));
        }
    }

    pub fn get(&self, name: &str) -> Option<&Expr> {
        self.by_name.iter().find(|(n, _)| n == name).map(|(_, e)| e)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Expr)> {
        self.by_name.iter().map(|(n, e)| (n.as_str(), e))
    }

    pub fn exprs(&self) -> impl Iterator<Item = &Expr> {
        self.by_name.iter().map(|(_, e)| e)
    }

    pub fn exprs_mut(&mut self) -> impl Iterator<Item = &mut Expr> {
        self.by_name.iter_mut().map(|(_, e)| e)
    }

    /// Evaluate the argument bound to `name`; unbound yields `Null`.
    pub fn evaluate(&self, name: &str, ctx: &mut EvalContext) -> Result<Value, EvalError> {
        match self.get(name) {
            Some(expr) => expr.evaluate(ctx),
            None => Ok(Value::Null),
        }
    }
}

// ---------------------------------------------------------------------------
// Function trait
// ---------------------------------------------------------------------------

pub trait Function: Send + Sync {
    fn descriptor(&self) -> &FunctionDescriptor;

    fn evaluate(&self, args: &FunctionArgs, ctx: &mut EvalContext) -> Result<Value, EvalError>;
}

/// Placeholder callee for names the registry does not know.
pub struct ErrorFunction {
    descriptor: FunctionDescriptor,
}

impl ErrorFunction {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            descriptor: FunctionDescriptor::new(name, ValueType::Any),
        }
    }
}

impl Function for ErrorFunction {
    fn descriptor(&self) -> &FunctionDescriptor {
        &self.descriptor
    }

    fn evaluate(&self, _args: &FunctionArgs, _ctx: &mut EvalContext) -> Result<Value, EvalError> {
        Err(EvalError::UnresolvedFunction(self.descriptor.name.clone()))
    }
}

/// Signature-only function, used to check sources against a catalog of
/// declared functions.
pub struct DeclaredFunction {
    descriptor: FunctionDescriptor,
}

impl DeclaredFunction {
    pub fn new(descriptor: FunctionDescriptor) -> Self {
        Self { descriptor }
    }
}

impl Function for DeclaredFunction {
    fn descriptor(&self) -> &FunctionDescriptor {
        &self.descriptor
    }

    fn evaluate(&self, _args: &FunctionArgs, _ctx: &mut EvalContext) -> Result<Value, EvalError> {
        Err(EvalError::NotImplemented(self.descriptor.name.clone()))
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Name → function table. Populate it first, then share it read-only
/// (e.g. behind an `Arc`) between parsers.
#[derive(Default, Clone)]
pub struct FunctionRegistry {
    functions: HashMap<String, Arc<dyn Function>>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `function` under its descriptor name, replacing any
    /// previous registration.
    pub fn register(&mut self, function: Arc<dyn Function>) -> Option<Arc<dyn Function>> {
        let name = function.descriptor().name.clone();
        self.functions.insert(name, function)
    }

    pub fn resolve(&self, name: &str) -> Option<Arc<dyn Function>> {
        self.functions.get(name).cloned()
    }

    /// Like [`resolve`](Self::resolve) but never absent: unknown names map
    /// to an [`ErrorFunction`].
    pub fn resolve_or_error(&self, name: &str) -> Arc<dyn Function> {
        self.resolve(name)
            .unwrap_or_else(|| Arc::new(ErrorFunction::new(name)) as Arc<dyn Function>)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("functions", &self.names())
            .finish()
    }
}
