use winnow::combinator::{alt, cut_err, opt, peek, separated};
use winnow::error::{StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::token::literal;

use crate::parse_utils::{NumberToken, kw, name_ident, number_token, quoted_string, ws_skip};
use crate::tree::{NodeKind, SyntaxNode};

// ---------------------------------------------------------------------------
// Public entry: full expression
// ---------------------------------------------------------------------------

pub(crate) fn parse_expr(input: &mut &str) -> ModalResult<SyntaxNode> {
    or_expr.parse_next(input)
}

/// `call = IDENT "(" args? ")"`, used for function statements.
pub(crate) fn call_expr(input: &mut &str) -> ModalResult<SyntaxNode> {
    let at = input.len();
    let name = name_ident.parse_next(input)?;
    ws_skip.parse_next(input)?;
    literal("(").parse_next(input)?;
    call_args(name, at, input)
}

// ---------------------------------------------------------------------------
// Precedence levels (lowest to highest)
// ---------------------------------------------------------------------------

/// `or_expr = and_expr { ("||" | "or") and_expr }`
fn or_expr(input: &mut &str) -> ModalResult<SyntaxNode> {
    let at = input.len();
    let mut left = and_expr.parse_next(input)?;
    loop {
        ws_skip.parse_next(input)?;
        if opt(alt((literal("||").void(), kw("or"))))
            .parse_next(input)?
            .is_some()
        {
            ws_skip.parse_next(input)?;
            let right = cut_err(and_expr).parse_next(input)?;
            left = SyntaxNode::new(NodeKind::Or, at)
                .with_child(left)
                .with_child(right);
        } else {
            break;
        }
    }
    Ok(left)
}

/// `and_expr = not_expr { ("&&" | "and") not_expr }`
fn and_expr(input: &mut &str) -> ModalResult<SyntaxNode> {
    let at = input.len();
    let mut left = not_expr.parse_next(input)?;
    loop {
        ws_skip.parse_next(input)?;
        if opt(alt((literal("&&").void(), kw("and"))))
            .parse_next(input)?
            .is_some()
        {
            ws_skip.parse_next(input)?;
            let right = cut_err(not_expr).parse_next(input)?;
            left = SyntaxNode::new(NodeKind::And, at)
                .with_child(left)
                .with_child(right);
        } else {
            break;
        }
    }
    Ok(left)
}

/// `not_expr = ("!" | "not") not_expr | cmp_expr`
fn not_expr(input: &mut &str) -> ModalResult<SyntaxNode> {
    let at = input.len();
    if opt(alt((literal("!").void(), kw("not"))))
        .parse_next(input)?
        .is_some()
    {
        ws_skip.parse_next(input)?;
        let inner = cut_err(not_expr).parse_next(input)?;
        return Ok(SyntaxNode::new(NodeKind::Not, at).with_child(inner));
    }
    cmp_expr.parse_next(input)
}

/// `cmp_expr = postfix [cmp_op postfix]`
fn cmp_expr(input: &mut &str) -> ModalResult<SyntaxNode> {
    let at = input.len();
    let left = postfix_expr.parse_next(input)?;
    ws_skip.parse_next(input)?;

    if let Some(op) = opt(cmp_op).parse_next(input)? {
        ws_skip.parse_next(input)?;
        let right = cut_err(postfix_expr)
            .context(StrContext::Expected(StrContextValue::Description(
                "right-hand operand",
            )))
            .parse_next(input)?;
        let kind = if op == "==" || op == "!=" {
            NodeKind::Equality
        } else {
            NodeKind::Comparison
        };
        return Ok(SyntaxNode::new(kind, at)
            .with_text(op)
            .with_child(left)
            .with_child(right));
    }

    Ok(left)
}

fn cmp_op<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    alt((
        literal("=="),
        literal("!="),
        literal("<="),
        literal(">="),
        literal("<"),
        literal(">"),
    ))
    .parse_next(input)
}

/// `postfix = primary { "." IDENT }`
fn postfix_expr(input: &mut &str) -> ModalResult<SyntaxNode> {
    let at = input.len();
    let mut object = primary.parse_next(input)?;
    loop {
        ws_skip.parse_next(input)?;
        if opt(literal(".")).parse_next(input)?.is_none() {
            break;
        }
        ws_skip.parse_next(input)?;
        let field_at = input.len();
        let field = cut_err(name_ident)
            .context(StrContext::Expected(StrContextValue::Description(
                "field name",
            )))
            .parse_next(input)?;
        object = SyntaxNode::new(NodeKind::FieldAccess, at)
            .with_child(object)
            .with_child(SyntaxNode::new(NodeKind::Identifier, field_at).with_text(field));
    }
    Ok(object)
}

// ---------------------------------------------------------------------------
// Primary
// ---------------------------------------------------------------------------

fn primary(input: &mut &str) -> ModalResult<SyntaxNode> {
    alt((
        number,
        string_lit,
        bool_lit,
        array_lit,
        map_lit,
        paren_expr,
        message_ref,
        ident_primary,
    ))
    .context(StrContext::Expected(StrContextValue::Description(
        "expression",
    )))
    .parse_next(input)
}

fn number(input: &mut &str) -> ModalResult<SyntaxNode> {
    let at = input.len();
    Ok(match number_token.parse_next(input)? {
        NumberToken::Integer(text) => SyntaxNode::new(NodeKind::Integer, at).with_text(text),
        NumberToken::Float(text) => SyntaxNode::new(NodeKind::Float, at).with_text(text),
    })
}

fn string_lit(input: &mut &str) -> ModalResult<SyntaxNode> {
    let at = input.len();
    let value = quoted_string.parse_next(input)?;
    Ok(SyntaxNode::new(NodeKind::Str, at).with_text(value))
}

fn bool_lit(input: &mut &str) -> ModalResult<SyntaxNode> {
    let at = input.len();
    let value = alt((kw("true").value("true"), kw("false").value("false"))).parse_next(input)?;
    Ok(SyntaxNode::new(NodeKind::Bool, at).with_text(value))
}

fn array_lit(input: &mut &str) -> ModalResult<SyntaxNode> {
    let at = input.len();
    literal("[").parse_next(input)?;
    ws_skip.parse_next(input)?;
    let node = SyntaxNode::new(NodeKind::ArrayLit, at);
    if opt(literal("]")).parse_next(input)?.is_some() {
        return Ok(node);
    }
    let items: Vec<SyntaxNode> =
        separated(1.., (ws_skip, parse_expr).map(|(_, e)| e), literal(",")).parse_next(input)?;
    ws_skip.parse_next(input)?;
    cut_err(literal("]"))
        .context(StrContext::Expected(StrContextValue::Description("']'")))
        .parse_next(input)?;
    Ok(node.with_children(items))
}

fn map_lit(input: &mut &str) -> ModalResult<SyntaxNode> {
    let at = input.len();
    literal("{").parse_next(input)?;
    ws_skip.parse_next(input)?;
    let node = SyntaxNode::new(NodeKind::MapLit, at);
    if opt(literal("}")).parse_next(input)?.is_some() {
        return Ok(node);
    }
    let entries: Vec<SyntaxNode> = separated(1.., map_entry, literal(",")).parse_next(input)?;
    ws_skip.parse_next(input)?;
    cut_err(literal("}"))
        .context(StrContext::Expected(StrContextValue::Description("'}'")))
        .parse_next(input)?;
    Ok(node.with_children(entries))
}

fn map_entry(input: &mut &str) -> ModalResult<SyntaxNode> {
    ws_skip.parse_next(input)?;
    let at = input.len();
    let key = alt((quoted_string, name_ident)).parse_next(input)?;
    ws_skip.parse_next(input)?;
    cut_err(literal(":")).parse_next(input)?;
    ws_skip.parse_next(input)?;
    let value = cut_err(parse_expr).parse_next(input)?;
    Ok(SyntaxNode::new(NodeKind::MapEntry, at)
        .with_text(key)
        .with_child(value))
}

fn paren_expr(input: &mut &str) -> ModalResult<SyntaxNode> {
    let at = input.len();
    literal("(").parse_next(input)?;
    ws_skip.parse_next(input)?;
    let inner = cut_err(parse_expr).parse_next(input)?;
    ws_skip.parse_next(input)?;
    cut_err(literal(")"))
        .context(StrContext::Expected(StrContextValue::Description("')'")))
        .parse_next(input)?;
    Ok(SyntaxNode::new(NodeKind::Parenthesized, at).with_child(inner))
}

/// `$message.field` or `$message[expr]`
fn message_ref(input: &mut &str) -> ModalResult<SyntaxNode> {
    let at = input.len();
    kw("$message").parse_next(input)?;
    ws_skip.parse_next(input)?;
    let node = SyntaxNode::new(NodeKind::MessageRef, at);

    if opt(literal(".")).parse_next(input)?.is_some() {
        ws_skip.parse_next(input)?;
        let field_at = input.len();
        let field = cut_err(name_ident)
            .context(StrContext::Expected(StrContextValue::Description(
                "message field name",
            )))
            .parse_next(input)?;
        return Ok(node.with_child(SyntaxNode::new(NodeKind::Identifier, field_at).with_text(field)));
    }

    let sub_at = input.len();
    cut_err(literal("["))
        .context(StrContext::Expected(StrContextValue::Description(
            "'.' or '[' after $message",
        )))
        .parse_next(input)?;
    ws_skip.parse_next(input)?;
    let field = cut_err(parse_expr).parse_next(input)?;
    ws_skip.parse_next(input)?;
    cut_err(literal("]"))
        .context(StrContext::Expected(StrContextValue::Description("']'")))
        .parse_next(input)?;
    Ok(node.with_child(SyntaxNode::new(NodeKind::Subscript, sub_at).with_child(field)))
}

/// Function call or plain identifier.
fn ident_primary(input: &mut &str) -> ModalResult<SyntaxNode> {
    let at = input.len();
    let name = name_ident.parse_next(input)?;
    let after_name = *input;
    ws_skip.parse_next(input)?;
    if opt(literal("(")).parse_next(input)?.is_some() {
        return call_args(name, at, input);
    }
    *input = after_name;
    Ok(SyntaxNode::new(NodeKind::Identifier, at).with_text(name))
}

// ---------------------------------------------------------------------------
// Call arguments
// ---------------------------------------------------------------------------

/// Arguments after the opening `(`: either all named (`a: 1, b: 2`) or all
/// positional (`1, 2`).
fn call_args(name: String, at: usize, input: &mut &str) -> ModalResult<SyntaxNode> {
    ws_skip.parse_next(input)?;
    let args_at = input.len();
    let call = SyntaxNode::new(NodeKind::FuncCall, at).with_text(name);

    if opt(literal(")")).parse_next(input)?.is_some() {
        return Ok(call.with_child(SyntaxNode::new(NodeKind::PositionalArgs, args_at)));
    }

    let named = opt(peek((name_ident, ws_skip, literal(":"))))
        .parse_next(input)?
        .is_some();
    let args = if named {
        let items: Vec<SyntaxNode> =
            separated(1.., named_arg, (ws_skip, literal(","))).parse_next(input)?;
        SyntaxNode::new(NodeKind::NamedArgs, args_at).with_children(items)
    } else {
        let items: Vec<SyntaxNode> =
            separated(1.., (ws_skip, parse_expr).map(|(_, e)| e), literal(",")).parse_next(input)?;
        SyntaxNode::new(NodeKind::PositionalArgs, args_at).with_children(items)
    };

    ws_skip.parse_next(input)?;
    cut_err(literal(")"))
        .context(StrContext::Expected(StrContextValue::Description(
            "')' after arguments",
        )))
        .parse_next(input)?;
    Ok(call.with_child(args))
}

fn named_arg(input: &mut &str) -> ModalResult<SyntaxNode> {
    ws_skip.parse_next(input)?;
    let at = input.len();
    let name = name_ident.parse_next(input)?;
    ws_skip.parse_next(input)?;
    cut_err(literal(":")).parse_next(input)?;
    ws_skip.parse_next(input)?;
    let value = cut_err(parse_expr)
        .context(StrContext::Expected(StrContextValue::Description(
            "argument value",
        )))
        .parse_next(input)?;
    Ok(SyntaxNode::new(NodeKind::NamedArg, at)
        .with_text(name)
        .with_child(value))
}
