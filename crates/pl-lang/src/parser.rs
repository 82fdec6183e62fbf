use std::sync::Arc;

use crate::analysis::{self, AnalysisOutcome};
use crate::ast::{Pipeline, Rule};
use crate::error::{ParseError, ParseErrorKind, ParseFailure};
use crate::functions::FunctionRegistry;
use crate::grammar;
use crate::tree::{ParseTree, SourcePos};

/// Knobs for semantic analysis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParserOptions {
    /// Report a rule condition that is neither logical nor boolean as an
    /// error instead of a warning.
    pub strict_conditions: bool,
}

/// A successful parse together with the warnings it produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed<T> {
    pub value: T,
    pub warnings: Vec<ParseError>,
}

/// Parses rule and pipeline sources against a shared function registry.
///
/// Each call runs independently: the grammar builds a parse tree, then the
/// analysis passes build and check the AST. Callers get either the finished
/// object or every error found.
#[derive(Debug, Clone)]
pub struct PipelineRuleParser {
    registry: Arc<FunctionRegistry>,
    options: ParserOptions,
}

impl PipelineRuleParser {
    pub fn new(registry: Arc<FunctionRegistry>) -> Self {
        Self {
            registry,
            options: ParserOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ParserOptions) -> Self {
        self.options = options;
        self
    }

    pub fn registry(&self) -> &FunctionRegistry {
        &self.registry
    }

    pub fn options(&self) -> ParserOptions {
        self.options
    }

    /// Parse a single rule declaration.
    pub fn parse_rule(&self, source: &str) -> Result<Rule, ParseFailure> {
        self.parse_rule_with_warnings(source).map(|parsed| parsed.value)
    }

    /// Parse a single rule declaration, keeping non-fatal diagnostics.
    pub fn parse_rule_with_warnings(&self, source: &str) -> Result<Parsed<Rule>, ParseFailure> {
        let tree = grammar::parse_rule_tree(source).map_err(fatal)?;
        let outcome = self.analyze(&tree)?;
        let warnings = outcome.warnings;
        let rule = outcome
            .rules
            .into_iter()
            .next()
            .ok_or_else(|| missing("rule declaration"))?;
        pl_debug!(ast, rule = %rule.name, warnings = warnings.len(), "rule parsed");
        Ok(Parsed {
            value: rule,
            warnings,
        })
    }

    /// Parse a single pipeline declaration.
    pub fn parse_pipeline(&self, source: &str) -> Result<Pipeline, ParseFailure> {
        let tree = grammar::parse_pipeline_tree(source).map_err(fatal)?;
        let outcome = self.analyze(&tree)?;
        let pipeline = outcome
            .pipelines
            .into_iter()
            .next()
            .ok_or_else(|| missing("pipeline declaration"))?;
        pl_debug!(ast, pipeline = %pipeline.name, stages = pipeline.stage_count(), "pipeline parsed");
        Ok(pipeline)
    }

    /// Parse zero or more pipeline declarations, in source order.
    pub fn parse_pipelines(&self, source: &str) -> Result<Vec<Pipeline>, ParseFailure> {
        let tree = grammar::parse_pipelines_tree(source).map_err(fatal)?;
        let outcome = self.analyze(&tree)?;
        pl_debug!(ast, pipelines = outcome.pipelines.len(), "pipelines parsed");
        Ok(outcome.pipelines)
    }

    fn analyze(&self, tree: &ParseTree) -> Result<AnalysisOutcome, ParseFailure> {
        let outcome = analysis::analyze(tree, &self.registry, self.options).finish();
        if outcome.errors.is_empty() {
            Ok(outcome)
        } else {
            pl_debug!(ast, errors = outcome.errors.len(), "parse failed");
            Err(ParseFailure::new(outcome.errors))
        }
    }
}

fn fatal(error: ParseError) -> ParseFailure {
    ParseFailure::new(vec![error])
}

fn missing(what: &str) -> ParseFailure {
    fatal(ParseError::error(
        SourcePos::new(1, 1),
        None,
        ParseErrorKind::SyntaxError {
            message: format!("no {what} found"),
        },
    ))
}
