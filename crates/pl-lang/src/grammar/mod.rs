//! Grammar for rule and pipeline sources.
//!
//! Produces a [`ParseTree`] only; semantic analysis happens in
//! [`crate::analysis`]. A stage without a number or match mode and a rule
//! reference without a name are accepted here so the AST builder can report
//! them with precise positions.

use winnow::combinator::{alt, cut_err, opt, repeat};
use winnow::error::{ContextError, ErrMode, StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::token::literal;

mod expr;

use crate::error::{ParseError, ParseErrorKind};
use crate::parse_utils::{NumberToken, kw, name_ident, number_token, quoted_string, ws_skip};
use crate::tree::{NodeKind, ParseTree, SourcePos, SyntaxNode};


// ---------------------------------------------------------------------------
// Public entry points
// ---------------------------------------------------------------------------

/// Parse a single `rule ... end` declaration.
pub fn parse_rule_tree(src: &str) -> Result<ParseTree, ParseError> {
    run(src, rule_file)
}

/// Parse a single `pipeline ... end` declaration.
pub fn parse_pipeline_tree(src: &str) -> Result<ParseTree, ParseError> {
    run(src, pipeline_file)
}

/// Parse zero or more pipeline declarations.
pub fn parse_pipelines_tree(src: &str) -> Result<ParseTree, ParseError> {
    run(src, pipelines_file)
}

fn run(
    src: &str,
    mut grammar: impl FnMut(&mut &str) -> ModalResult<SyntaxNode>,
) -> Result<ParseTree, ParseError> {
    match grammar.parse(src) {
        Ok(root) => Ok(ParseTree::from_syntax(src, root)),
        Err(e) => {
            let pos = SourcePos::from_offset(src, e.offset());
            let rendered = e.inner().to_string();
            let message = if rendered.is_empty() {
                "unexpected input".to_string()
            } else {
                rendered
            };
            pl_debug!(parse, %pos, %message, "grammar rejected source");
            Err(ParseError::error(
                pos,
                None,
                ParseErrorKind::SyntaxError { message },
            ))
        }
    }
}

// ---------------------------------------------------------------------------
// Top-level grammar
// ---------------------------------------------------------------------------

fn rule_file(input: &mut &str) -> ModalResult<SyntaxNode> {
    let rule = rule_decl.parse_next(input)?;
    ws_skip.parse_next(input)?;
    Ok(rule)
}

fn pipeline_file(input: &mut &str) -> ModalResult<SyntaxNode> {
    let pipeline = pipeline_decl.parse_next(input)?;
    ws_skip.parse_next(input)?;
    Ok(pipeline)
}

fn pipelines_file(input: &mut &str) -> ModalResult<SyntaxNode> {
    let at = input.len();
    let pipelines: Vec<SyntaxNode> = repeat(0.., pipeline_decl).parse_next(input)?;
    ws_skip.parse_next(input)?;
    Ok(SyntaxNode::new(NodeKind::PipelineList, at).with_children(pipelines))
}

// ---------------------------------------------------------------------------
// rule declaration
// ---------------------------------------------------------------------------

fn rule_decl(input: &mut &str) -> ModalResult<SyntaxNode> {
    ws_skip.parse_next(input)?;
    let at = input.len();
    kw("rule").parse_next(input)?;
    ws_skip.parse_next(input)?;

    let name = cut_err(name_literal)
        .context(StrContext::Expected(StrContextValue::Description(
            "rule name",
        )))
        .parse_next(input)?;

    ws_skip.parse_next(input)?;
    cut_err(kw("when"))
        .context(StrContext::Expected(StrContextValue::Description("'when'")))
        .parse_next(input)?;
    ws_skip.parse_next(input)?;
    let condition = cut_err(expr::parse_expr)
        .context(StrContext::Expected(StrContextValue::Description(
            "rule condition",
        )))
        .parse_next(input)?;

    ws_skip.parse_next(input)?;
    cut_err(kw("then"))
        .context(StrContext::Expected(StrContextValue::Description("'then'")))
        .parse_next(input)?;

    let mut statements = Vec::new();
    loop {
        ws_skip.parse_next(input)?;
        if opt(kw("end")).parse_next(input)?.is_some() {
            break;
        }
        let stmt = cut_err(statement)
            .context(StrContext::Expected(StrContextValue::Description(
                "statement or 'end'",
            )))
            .parse_next(input)?;
        statements.push(stmt);
    }

    Ok(SyntaxNode::new(NodeKind::RuleDecl, at)
        .with_child(name)
        .with_child(condition)
        .with_children(statements))
}

/// `let IDENT = expr ;` or `call ;`
fn statement(input: &mut &str) -> ModalResult<SyntaxNode> {
    let at = input.len();
    let node = if opt(kw("let")).parse_next(input)?.is_some() {
        ws_skip.parse_next(input)?;
        let name = cut_err(name_ident)
            .context(StrContext::Expected(StrContextValue::Description(
                "variable name",
            )))
            .parse_next(input)?;
        ws_skip.parse_next(input)?;
        cut_err(literal("=")).parse_next(input)?;
        ws_skip.parse_next(input)?;
        let value = cut_err(expr::parse_expr).parse_next(input)?;
        SyntaxNode::new(NodeKind::LetStmt, at)
            .with_text(name)
            .with_child(value)
    } else {
        let call = expr::call_expr.parse_next(input)?;
        SyntaxNode::new(NodeKind::FuncStmt, at).with_child(call)
    };
    ws_skip.parse_next(input)?;
    cut_err(literal(";"))
        .context(StrContext::Expected(StrContextValue::Description("';'")))
        .parse_next(input)?;
    Ok(node)
}

// ---------------------------------------------------------------------------
// pipeline declaration
// ---------------------------------------------------------------------------

fn pipeline_decl(input: &mut &str) -> ModalResult<SyntaxNode> {
    ws_skip.parse_next(input)?;
    let at = input.len();
    kw("pipeline").parse_next(input)?;
    ws_skip.parse_next(input)?;

    let name = cut_err(name_literal)
        .context(StrContext::Expected(StrContextValue::Description(
            "pipeline name",
        )))
        .parse_next(input)?;

    let stages: Vec<SyntaxNode> = repeat(0.., stage).parse_next(input)?;

    ws_skip.parse_next(input)?;
    cut_err(kw("end"))
        .context(StrContext::Expected(StrContextValue::Description(
            "'stage' or 'end'",
        )))
        .parse_next(input)?;

    Ok(SyntaxNode::new(NodeKind::PipelineDecl, at)
        .with_child(name)
        .with_children(stages))
}

/// `stage INTEGER? (match (all|either))? rule_ref*`
fn stage(input: &mut &str) -> ModalResult<SyntaxNode> {
    ws_skip.parse_next(input)?;
    let at = input.len();
    kw("stage").parse_next(input)?;
    let mut node = SyntaxNode::new(NodeKind::Stage, at);

    ws_skip.parse_next(input)?;
    let number_at = input.len();
    if let Some(number) = opt(stage_number).parse_next(input)? {
        node = node.with_child(SyntaxNode::new(NodeKind::StageNumber, number_at).with_text(number));
    }

    ws_skip.parse_next(input)?;
    if opt(kw("match")).parse_next(input)?.is_some() {
        ws_skip.parse_next(input)?;
        let mode_at = input.len();
        let mode = opt(alt((kw("all").value("all"), kw("either").value("either"))))
            .parse_next(input)?;
        if let Some(mode) = mode {
            node = node.with_child(SyntaxNode::new(NodeKind::MatchMode, mode_at).with_text(mode));
        }
    }

    let refs: Vec<SyntaxNode> = repeat(0.., rule_ref).parse_next(input)?;
    Ok(node.with_children(refs))
}

fn stage_number<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    let saved = *input;
    match number_token.parse_next(input)? {
        NumberToken::Integer(text) => Ok(text),
        NumberToken::Float(_) => {
            *input = saved;
            Err(ErrMode::Backtrack(ContextError::new()))
        }
    }
}

/// `rule STRING? ";"?`
fn rule_ref(input: &mut &str) -> ModalResult<SyntaxNode> {
    ws_skip.parse_next(input)?;
    let at = input.len();
    kw("rule").parse_next(input)?;
    ws_skip.parse_next(input)?;
    let mut node = SyntaxNode::new(NodeKind::RuleRef, at);
    if let Some(name) = opt(name_literal).parse_next(input)? {
        node = node.with_child(name);
    }
    ws_skip.parse_next(input)?;
    let _ = opt(literal(";")).parse_next(input)?;
    Ok(node)
}

fn name_literal(input: &mut &str) -> ModalResult<SyntaxNode> {
    let at = input.len();
    let name = quoted_string.parse_next(input)?;
    Ok(SyntaxNode::new(NodeKind::Name, at).with_text(name))
}
