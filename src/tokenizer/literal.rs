//! # Literal Matchers
//!
//! Quoted strings, regular expression literals, bare words and raw
//! non-whitespace runs.
//!
//! Strings and regex literals are the only constructs with an opening and a
//! closing delimiter; once the opening delimiter has been consumed a missing
//! terminator is reported as a `nom::Err::Failure`, which the
//! [`Lexer`](super::token::Lexer) turns into a
//! [`LexError::Unterminated`](super::token::LexError::Unterminated).

use nom::{
    branch::alt,
    bytes::complete::take_while1,
    character::complete::{char, one_of},
    combinator::{map, opt, recognize},
    error::{context, ErrorKind, ParseError, VerboseError},
    sequence::{pair, preceded, terminated},
};

use super::token::ParserResult;

fn unescape(c: char) -> char {
    match c {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        other => other,
    }
}

fn quoted_body(quote: char) -> impl FnMut(&str) -> ParserResult<String> {
    move |input: &str| {
        let mut value = String::new();
        let mut chars = input.char_indices();
        while let Some((idx, c)) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    Some((_, escaped)) => value.push(unescape(escaped)),
                    None => break,
                },
                c if c == quote => return Ok((&input[idx..], value)),
                c => value.push(c),
            }
        }
        Err(nom::Err::Failure(VerboseError::from_error_kind(
            input,
            ErrorKind::Char,
        )))
    }
}

fn quoted(quote: char) -> impl FnMut(&str) -> ParserResult<String> {
    move |input: &str| preceded(char(quote), terminated(quoted_body(quote), char(quote)))(input)
}

/// A single- or double-quoted string; the returned value has escapes resolved.
#[tracing::instrument(level = "trace", skip(input))]
pub fn parse_string(input: &str) -> ParserResult<String> {
    context("string literal", alt((quoted('"'), quoted('\''))))(input)
}

/// A `/pattern/` literal. The closing `/` must be unescaped and followed by
/// whitespace or the end of input; `\/` inside the pattern yields a plain `/`.
#[tracing::instrument(level = "trace", skip(input))]
pub fn parse_regex(input: &str) -> ParserResult<String> {
    let body = match input.strip_prefix('/') {
        Some(body) if !body.starts_with('/') && !body.starts_with('*') => body,
        _ => {
            return Err(nom::Err::Error(VerboseError::from_error_kind(
                input,
                ErrorKind::Char,
            )))
        }
    };

    let mut pattern = String::new();
    let mut chars = body.char_indices().peekable();
    while let Some((idx, c)) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some((_, '/')) => pattern.push('/'),
                Some((_, escaped)) => {
                    pattern.push('\\');
                    pattern.push(escaped);
                }
                None => break,
            },
            '/' => {
                let terminates = match chars.peek() {
                    None => true,
                    Some((_, next)) => next.is_whitespace(),
                };
                if terminates {
                    return Ok((&body[idx + 1..], pattern));
                }
                pattern.push('/');
            }
            c => pattern.push(c),
        }
    }
    Err(nom::Err::Failure(VerboseError::from_error_kind(
        input,
        ErrorKind::Char,
    )))
}

/// A bare word: an optional sign followed by letters, digits, `_` and `.`.
///
/// Words double as dotted paths (`user.address.zip`), numbers (`-1.5`) and
/// date-math expressions (`+1h`).
#[tracing::instrument(level = "trace", skip(input))]
pub fn parse_word(input: &str) -> ParserResult<String> {
    context(
        "word",
        map(
            recognize(pair(
                opt(one_of("+-")),
                take_while1(|c: char| c.is_alphanumeric() || c == '_' || c == '.'),
            )),
            str::to_string,
        ),
    )(input)
}

/// Any run of non-whitespace characters.
#[tracing::instrument(level = "trace", skip(input))]
pub fn parse_nonwhitespace(input: &str) -> ParserResult<String> {
    context(
        "non-whitespace",
        map(take_while1(|c: char| !c.is_whitespace()), str::to_string),
    )(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_double_quoted_string() {
        let (rest, value) = parse_string("\"hello world\" tail").unwrap();
        assert_eq!(value, "hello world");
        assert_eq!(rest, " tail");
    }

    #[test]
    fn test_single_quoted_string_with_escapes() {
        let (rest, value) = parse_string(r#"'it\'s a "test"\n'"#).unwrap();
        assert_eq!(value, "it's a \"test\"\n");
        assert_eq!(rest, "");
    }

    #[test]
    fn test_empty_string() {
        let (rest, value) = parse_string("\"\"").unwrap();
        assert_eq!(value, "");
        assert_eq!(rest, "");
    }

    #[test]
    fn test_unterminated_string_is_failure() {
        assert!(matches!(parse_string("\"abc"), Err(nom::Err::Failure(_))));
        assert!(matches!(parse_string("abc"), Err(nom::Err::Error(_))));
    }

    #[test]
    fn test_regex() {
        let (rest, value) = parse_regex("/^ba[rz]$/ 'msg'").unwrap();
        assert_eq!(value, "^ba[rz]$");
        assert_eq!(rest, " 'msg'");
    }

    #[test]
    fn test_regex_inner_slash_and_escape() {
        let (_, value) = parse_regex(r"/a/b\/c\d/").unwrap();
        assert_eq!(value, r"a/b/c\d");
    }

    #[test]
    fn test_regex_rejects_comments() {
        assert!(matches!(parse_regex("// x"), Err(nom::Err::Error(_))));
        assert!(matches!(parse_regex("/* x */"), Err(nom::Err::Error(_))));
    }

    #[test]
    fn test_unterminated_regex_is_failure() {
        assert!(matches!(parse_regex("/abc/def"), Err(nom::Err::Failure(_))));
    }

    #[test]
    fn test_words() {
        let cases = [
            ("String x", "String", " x"),
            ("foo.bazz.quxx {", "foo.bazz.quxx", " {"),
            ("+1h", "+1h", ""),
            ("-2.5\n", "-2.5", "\n"),
        ];
        for (input, word, rest) in cases {
            assert_eq!(parse_word(input).unwrap(), (rest, word.to_string()));
        }
        assert!(parse_word("{").is_err());
        assert!(parse_word("+").is_err());
    }

    #[test]
    fn test_nonwhitespace() {
        let (rest, value) = parse_nonwhitespace("./shared/user.model // c").unwrap();
        assert_eq!(value, "./shared/user.model");
        assert_eq!(rest, " // c");
    }
}
