use nom::{
    branch::alt,
    bytes::complete::{tag, take_till, take_until},
    combinator::{cut, map},
    error::context,
    sequence::{preceded, terminated},
};

use super::token::ParserResult;

/// `// ...` up to, not including, the end of the line.
#[tracing::instrument(level = "trace", skip(input))]
pub fn parse_line_comment(input: &str) -> ParserResult<String> {
    context(
        "line comment",
        map(
            preceded(tag("//"), take_till(|c| c == '\n' || c == '\r')),
            |content: &str| content.trim().to_string(),
        ),
    )(input)
}

/// `/* ... */`, possibly spanning lines. Once `/*` is seen, a missing `*/` is a failure.
#[tracing::instrument(level = "trace", skip(input))]
pub fn parse_block_comment(input: &str) -> ParserResult<String> {
    context(
        "block comment",
        map(
            preceded(tag("/*"), cut(terminated(take_until("*/"), tag("*/")))),
            str::to_string,
        ),
    )(input)
}

#[tracing::instrument(level = "trace", skip(input))]
pub fn parse_comment(input: &str) -> ParserResult<String> {
    context("comment", alt((parse_block_comment, parse_line_comment)))(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_comment() {
        let input = "// This is a line comment\ncode";
        let (rest, content) = parse_comment(input).unwrap();
        assert_eq!(content, "This is a line comment");
        assert_eq!(rest, "\ncode");
    }

    #[test]
    fn test_line_comment_at_end_of_input() {
        let (rest, content) = parse_comment("//").unwrap();
        assert_eq!(content, "");
        assert_eq!(rest, "");
    }

    #[test]
    fn test_block_comment() {
        let input = "/* This is a\n block comment */code";
        let (rest, content) = parse_comment(input).unwrap();
        assert_eq!(content, " This is a\n block comment ");
        assert_eq!(rest, "code");
    }

    #[test]
    fn test_nested_looking_comment() {
        let input = "/* outer /* not nested */ */";
        let (rest, content) = parse_comment(input).unwrap();
        assert_eq!(content, " outer /* not nested ");
        assert_eq!(rest, " */");
    }

    #[test]
    fn test_unterminated_block_comment_is_failure() {
        let result = parse_comment("/* open");
        assert!(matches!(result, Err(nom::Err::Failure(_))));
    }

    #[test]
    fn test_not_a_comment() {
        assert!(matches!(parse_comment("/abc/"), Err(nom::Err::Error(_))));
    }
}
