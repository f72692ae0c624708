//! # Symbol Matchers
//!
//! Braces delimit rule and type bodies; the directive prefix (default `@`)
//! introduces a top-level directive such as `@clean` or `@import`.

use nom::{
    bytes::complete::{tag, take_while1},
    character::complete::{char, multispace0},
    combinator::map,
    error::context,
    sequence::{preceded, terminated},
};

use super::token::ParserResult;

/// `{` together with any whitespace that follows it.
#[tracing::instrument(level = "trace", skip(input))]
pub fn parse_open_brace(input: &str) -> ParserResult<String> {
    context(
        "open brace",
        map(terminated(tag("{"), multispace0), str::to_string),
    )(input)
}

#[tracing::instrument(level = "trace", skip(input))]
pub fn parse_close_brace(input: &str) -> ParserResult<String> {
    context("close brace", map(tag("}"), str::to_string))(input)
}

/// A directive name following `prefix`; the returned value excludes the prefix.
#[tracing::instrument(level = "trace", skip(input))]
pub fn parse_directive(prefix: char, input: &str) -> ParserResult<String> {
    context(
        "directive",
        map(
            preceded(
                char(prefix),
                take_while1(|c: char| c.is_alphanumeric() || c == '_' || c == '-'),
            ),
            str::to_string,
        ),
    )(input)
}
