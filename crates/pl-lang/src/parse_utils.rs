use winnow::ascii::multispace0;
use winnow::combinator::{cut_err, opt};
use winnow::error::{ContextError, ErrMode, StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::token::{any, literal, take_until, take_while};

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Reserved words that can never be plain identifiers.
const KEYWORDS: &[&str] = &[
    "rule", "when", "then", "end", "let", "pipeline", "stage", "match", "and", "or", "not",
    "true", "false",
];

pub fn ident<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    // First character must be alphabetic or underscore (not digit).
    if !input.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
        return Err(ErrMode::Backtrack(ContextError::new()));
    }
    let saved = *input;
    let word = take_while(1.., |c: char| c.is_ascii_alphanumeric() || c == '_').parse_next(input)?;
    if KEYWORDS.contains(&word) {
        *input = saved;
        return Err(ErrMode::Backtrack(ContextError::new()));
    }
    Ok(word)
}

/// Plain identifier or a back-quoted name such as `` `src ip` ``.
pub fn name_ident(input: &mut &str) -> ModalResult<String> {
    if opt(literal("`")).parse_next(input)?.is_some() {
        let content = take_while(0.., |c: char| c != '`').parse_next(input)?;
        cut_err(literal("`"))
            .context(StrContext::Expected(StrContextValue::Description(
                "closing backquote",
            )))
            .parse_next(input)?;
        return Ok(content.to_string());
    }
    ident.map(|s: &str| s.to_string()).parse_next(input)
}

// ---------------------------------------------------------------------------
// Strings
// ---------------------------------------------------------------------------

/// Double-quoted string literal with backslash escapes; returns the
/// unescaped content.
pub fn quoted_string(input: &mut &str) -> ModalResult<String> {
    literal("\"").parse_next(input)?;
    let mut out = String::new();
    loop {
        let chunk = take_while(0.., |c: char| c != '"' && c != '\\').parse_next(input)?;
        out.push_str(chunk);
        if opt(literal("\\")).parse_next(input)?.is_some() {
            let escaped = cut_err(any)
                .context(StrContext::Expected(StrContextValue::Description(
                    "escape sequence",
                )))
                .parse_next(input)?;
            out.push(match escaped {
                'n' => '\n',
                'r' => '\r',
                't' => '\t',
                other => other,
            });
            continue;
        }
        cut_err(literal("\""))
            .context(StrContext::Expected(StrContextValue::Description(
                "closing quote",
            )))
            .parse_next(input)?;
        return Ok(out);
    }
}

// ---------------------------------------------------------------------------
// Whitespace & comments
// ---------------------------------------------------------------------------

/// Skip whitespace, `// ...` line comments and `/* ... */` block comments.
pub fn ws_skip(input: &mut &str) -> ModalResult<()> {
    loop {
        let _ = multispace0.parse_next(input)?;
        if opt(literal("//")).parse_next(input)?.is_some() {
            let _ = take_while(0.., |c: char| c != '\n').parse_next(input)?;
        } else if opt(literal("/*")).parse_next(input)?.is_some() {
            cut_err((take_until(0.., "*/"), literal("*/")))
                .context(StrContext::Expected(StrContextValue::Description(
                    "end of block comment",
                )))
                .parse_next(input)?;
        } else {
            break;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Keyword matching with word boundary
// ---------------------------------------------------------------------------

/// Match an exact keyword string, ensuring it's not a prefix of a longer
/// identifier (i.e. the next character is not alphanumeric or `_`).
pub fn kw<'a>(keyword: &'static str) -> impl FnMut(&mut &'a str) -> ModalResult<()> {
    move |input: &mut &'a str| {
        let saved = *input;
        literal(keyword).parse_next(input)?;
        if input.starts_with(|c: char| c.is_ascii_alphanumeric() || c == '_') {
            *input = saved;
            return Err(ErrMode::Backtrack(ContextError::new()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Number literals
// ---------------------------------------------------------------------------

/// A numeric token as written in the source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumberToken<'a> {
    Integer(&'a str),
    Float(&'a str),
}

/// Parse an optionally signed integer or float literal, keeping its text.
pub fn number_token<'a>(input: &mut &'a str) -> ModalResult<NumberToken<'a>> {
    let start = *input;
    let _ = opt(literal("-")).parse_next(input)?;
    if !input.starts_with(|c: char| c.is_ascii_digit()) {
        *input = start;
        return Err(ErrMode::Backtrack(ContextError::new()));
    }
    let _ = take_while(1.., |c: char| c.is_ascii_digit()).parse_next(input)?;
    let is_float = input.starts_with('.')
        && input
            .get(1..)
            .is_some_and(|rest| rest.starts_with(|c: char| c.is_ascii_digit()));
    if is_float {
        literal(".").parse_next(input)?;
        let _ = take_while(1.., |c: char| c.is_ascii_digit()).parse_next(input)?;
    }
    let text = &start[..start.len() - input.len()];
    Ok(if is_float {
        NumberToken::Float(text)
    } else {
        NumberToken::Integer(text)
    })
}
