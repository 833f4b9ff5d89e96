//! Filter expression parser using nom.
//!
//! Grammar (operator precedence: `!` > `&&` > `||`):
//! ```text
//! filter  = expr
//! expr    = term ("||" term)*
//! term    = factor ("&&" factor)*
//! factor  = "!" factor | "(" expr ")" | primary
//! primary = WORD "(" expr ")" | WORD "=" WORD | WORD
//! WORD    = [A-Za-z0-9_.:/-]+
//! ```

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while1},
    character::complete::{char, multispace0},
    combinator::{all_consuming, map},
    error::{Error as NomError, ErrorKind},
    multi::many_m_n,
    sequence::{delimited, pair, preceded, separated_pair},
    IResult,
};

use super::ast::Filter;
use crate::error::FilterError;

/// Deepest filter tree the parser will build.
pub const MAX_DEPTH: usize = 256;

/// Parse a complete filter expression.
pub fn parse_filter(input: &str) -> Result<Filter, FilterError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(FilterError::EmptyFilter);
    }

    match all_consuming(preceded(multispace0, |i| expr(i, 0)))(input) {
        Ok((_, expr)) => Ok(expr),
        Err(nom::Err::Failure(e)) if e.code == ErrorKind::TooLarge => Err(
            FilterError::parse_error(format!("filter nested deeper than {MAX_DEPTH} levels")),
        ),
        Err(e) => Err(FilterError::parse_error(format!("{e}"))),
    }
}

// =============================================================================
// Expression Parsers (handle operator precedence)
//
// `depth` counts the tree levels above the node being parsed. Every descent
// adds one, and every folded chain is checked against what is left, so the
// finished tree is never deeper than MAX_DEPTH.
// =============================================================================

fn too_deep(input: &str) -> nom::Err<NomError<&str>> {
    nom::Err::Failure(NomError::new(input, ErrorKind::TooLarge))
}

fn within_depth(input: &str, depth: usize, filter: Filter) -> IResult<&str, Filter> {
    if depth + filter.height() > MAX_DEPTH {
        Err(too_deep(input))
    } else {
        Ok((input, filter))
    }
}

/// Parse an expression (OR level - lowest precedence).
fn expr(input: &str, depth: usize) -> IResult<&str, Filter> {
    let (input, first) = term(input, depth)?;
    let (input, rest) =
        many_m_n(0, MAX_DEPTH, preceded(ws(tag("||")), |i| term(i, depth)))(input)?;

    within_depth(input, depth, rest.into_iter().fold(first, Filter::or))
}

/// Parse a term (AND level).
fn term(input: &str, depth: usize) -> IResult<&str, Filter> {
    let (input, first) = factor(input, depth)?;
    let (input, rest) =
        many_m_n(0, MAX_DEPTH, preceded(ws(tag("&&")), |i| factor(i, depth)))(input)?;

    within_depth(input, depth, rest.into_iter().fold(first, Filter::and))
}

/// Parse a factor (NOT and parentheses).
fn factor(input: &str, depth: usize) -> IResult<&str, Filter> {
    if depth >= MAX_DEPTH {
        return Err(too_deep(input));
    }
    let (input, _) = multispace0(input)?;
    alt((
        |i| not_expr(i, depth),
        |i| paren_expr(i, depth),
        |i| primary(i, depth),
    ))(input)
}

/// Parse NOT expression.
fn not_expr(input: &str, depth: usize) -> IResult<&str, Filter> {
    map(preceded(char('!'), |i| factor(i, depth + 1)), Filter::not)(input)
}

/// Parse parenthesized expression.
fn paren_expr(input: &str, depth: usize) -> IResult<&str, Filter> {
    delimited(
        pair(char('('), multispace0),
        |i| expr(i, depth + 1),
        pair(multispace0, char(')')),
    )(input)
}

/// Parse a word-led primary: `proto(expr)`, `field=value` or `proto`.
fn primary(input: &str, depth: usize) -> IResult<&str, Filter> {
    alt((
        |i| proto_with(i, depth),
        field_cmp,
        map(word, Filter::proto),
    ))(input)
}

fn proto_with(input: &str, depth: usize) -> IResult<&str, Filter> {
    let (input, name) = word(input)?;
    let (input, child) = preceded(multispace0, |i| paren_expr(i, depth))(input)?;
    Ok((input, Filter::proto_with(name, child)))
}

fn field_cmp(input: &str) -> IResult<&str, Filter> {
    map(
        separated_pair(word, ws(char('=')), word),
        |(field, value)| Filter::field(field, value),
    )(input)
}

fn word(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | ':' | '/' | '-'))(
        input,
    )
}

/// Surround a parser with optional whitespace.
fn ws<'a, O, F>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}
