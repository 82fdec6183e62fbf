//! Semantic analysis over a [`ParseTree`]: AST construction, type
//! annotation and type checking.
//!
//! Every pass records problems in the shared [`AnalysisContext`] and keeps
//! going, so one parse reports every error it can find.

mod annotate;
mod binder;
mod builder;
mod context;
mod typecheck;

pub use builder::ILLEGAL_REFERENCE;
pub use context::{AnalysisContext, AnalysisOutcome};

use crate::functions::FunctionRegistry;
use crate::parser::ParserOptions;
use crate::tree::ParseTree;

#[cfg(test)]
mod tests;

/// Run the builder, annotator and checker over `tree`.
pub fn analyze<'t>(
    tree: &'t ParseTree,
    registry: &FunctionRegistry,
    options: ParserOptions,
) -> AnalysisContext<'t> {
    let mut ctx = AnalysisContext::new(tree);
    builder::AstBuilder::new(&mut ctx, registry, options).build();
    annotate::annotate_types(&mut ctx);
    typecheck::check_types(&mut ctx);
    pl_debug!(
        check,
        nodes = tree.len(),
        rules = ctx.rules().len(),
        pipelines = ctx.pipelines().len(),
        diagnostics = ctx.errors().len(),
        "analysis finished"
    );
    ctx
}

/// Debug rendering of the annotated parse tree.
pub fn trace(ctx: &AnalysisContext<'_>) -> String {
    typecheck::tree_trace(ctx)
}
