//! Binding of call-site arguments to declared parameters.

use crate::ast::Expr;
use crate::error::ParseErrorKind;
use crate::functions::{FunctionArgs, FunctionDescriptor};

/// Arguments as written at the call site.
pub(crate) enum CallArgs {
    Named(Vec<(String, Expr)>),
    Positional(Vec<Expr>),
}

/// Bind `args` against `descriptor`, returning the bound arguments and the
/// binding problems found. Named arguments that match no parameter are
/// kept; the type checker ignores them. A repeated name keeps its first
/// value and counts once.
pub(crate) fn bind_args(
    descriptor: &FunctionDescriptor,
    args: CallArgs,
) -> (FunctionArgs, Vec<ParseErrorKind>) {
    let mut problems = Vec::new();
    let mut bound = FunctionArgs::new();

    match args {
        CallArgs::Named(named) => {
            for (name, expr) in named {
                bound.bind(name, expr);
            }
            let expected = descriptor.params.len();
            if !descriptor.has_optional() && bound.len() != expected {
                problems.push(wrong_count(descriptor, expected, bound.len()));
            } else {
                for param in descriptor.params.iter().filter(|p| !p.optional) {
                    if !bound.contains(&param.name) {
                        problems.push(ParseErrorKind::MissingRequiredParam {
                            function: descriptor.name.clone(),
                            param: param.name.clone(),
                        });
                    }
                }
            }
        }
        CallArgs::Positional(positional) => {
            if descriptor.optional_before_required() {
                problems.push(ParseErrorKind::OptionalParametersMustBeNamed {
                    function: descriptor.name.clone(),
                });
                return (bound, problems);
            }
            let actual = positional.len();
            let required = descriptor.required_count();
            let total = descriptor.params.len();
            if actual < required {
                problems.push(wrong_count(descriptor, required, actual));
            } else if actual > total {
                problems.push(wrong_count(descriptor, total, actual));
            }
            for (param, expr) in descriptor.params.iter().zip(positional) {
                bound.bind(param.name.clone(), expr);
            }
        }
    }

    (bound, problems)
}

/// Keep the arguments of a call to an unknown function so nested
/// expressions still reach the later passes. Positional arguments are
/// named `arg0`, `arg1`, ...
pub(crate) fn bind_unchecked(args: CallArgs) -> FunctionArgs {
    let mut bound = FunctionArgs::new();
    match args {
        CallArgs::Named(named) => {
            for (name, expr) in named {
                bound.bind(name, expr);
            }
        }
        CallArgs::Positional(positional) => {
            for (i, expr) in positional.into_iter().enumerate() {
                bound.bind(format!("arg{i}"), expr);
            }
        }
    }
    bound
}

fn wrong_count(descriptor: &FunctionDescriptor, expected: usize, actual: usize) -> ParseErrorKind {
    ParseErrorKind::WrongNumberOfArgs {
        function: descriptor.name.clone(),
        expected,
        actual,
    }
}
