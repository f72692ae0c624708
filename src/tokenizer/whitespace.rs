//! # Whitespace Matchers
//!
//! Three flavours of whitespace matter to the model DSL:
//!
//! * [`parse_whitespace`]: spaces and tabs only, so a matcher never runs past the end of a line
//! * [`parse_newline`]: a run of `\n` / `\r` characters
//! * [`parse_anyspace`]: any whitespace, newlines included
//!
//! Line-oriented constructs (directive values, validator spec lines, trailing
//! messages) rely on [`parse_whitespace`] stopping at the newline.

use nom::{bytes::complete::take_while1, combinator::map, error::context};

use super::token::ParserResult;

/// Parses spaces and tabs (but not newlines).
///
/// ```
/// # use modelang::tokenizer::whitespace::parse_whitespace;
/// let (rest, ws) = parse_whitespace(" \t hello").unwrap();
/// assert_eq!(ws, " \t ");
/// assert_eq!(rest, "hello");
/// ```
#[tracing::instrument(level = "trace", skip(input))]
pub fn parse_whitespace(input: &str) -> ParserResult<String> {
    context(
        "whitespace expected",
        map(
            take_while1(|c: char| c.is_whitespace() && c != '\n' && c != '\r'),
            str::to_string,
        ),
    )(input)
}

/// Parses a run of newline characters, `\r\n` included.
#[tracing::instrument(level = "trace", skip(input))]
pub fn parse_newline(input: &str) -> ParserResult<String> {
    context(
        "newline expected",
        map(take_while1(|c| c == '\n' || c == '\r'), str::to_string),
    )(input)
}

/// Parses any whitespace, newlines included.
#[tracing::instrument(level = "trace", skip(input))]
pub fn parse_anyspace(input: &str) -> ParserResult<String> {
    context(
        "whitespace expected",
        map(take_while1(char::is_whitespace), str::to_string),
    )(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitespace_stops_at_newline() {
        let (rest, ws) = parse_whitespace("  \t\nnext").unwrap();
        assert_eq!(ws, "  \t");
        assert_eq!(rest, "\nnext");
    }

    #[test]
    fn test_newline_run() {
        let (rest, nl) = parse_newline("\r\n\n\nx").unwrap();
        assert_eq!(nl, "\r\n\n\n");
        assert_eq!(rest, "x");
    }

    #[test]
    fn test_anyspace() {
        let (rest, ws) = parse_anyspace(" \n\t x").unwrap();
        assert_eq!(ws, " \n\t ");
        assert_eq!(rest, "x");
    }

    #[test]
    fn test_error() {
        assert!(parse_whitespace("hello").is_err());
        assert!(parse_newline(" hello").is_err());
        assert!(parse_anyspace("hello").is_err());
    }
}
