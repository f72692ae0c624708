use std::path::Path;

use crate::ast::{
    Argument, Directive, Import, ModelTree, Rule, TypeDefinition, ValidatorSpec, IMPORT_DIRECTIVE,
};
use crate::error::Location;
use crate::tokenizer::{LexError, LexResult, Lexer, Position, Token};

use super::core::{ParseError, ParseResult};

pub const TYPE_DECLARATION: &str = "def";

/// A brace-less declaration whose deeper-indented lines are its specs.
#[derive(Debug, Clone)]
enum IndentTarget {
    Rule(String),
    Type(String),
}

/// Recursive-descent parser producing a [`ModelTree`] from one DSL source.
///
/// The parser pulls tokens from the [`Lexer`] on demand because the meaning
/// of a character depends on where it appears: `/` opens a regex literal in
/// argument position but belongs to the path in `@import ./a/b.model`.
pub struct Parser<'a> {
    source: &'a str,
    origin: Option<&'a Path>,
    lexer: Lexer<'a>,
    tree: ModelTree,
    indented: Option<(IndentTarget, usize)>,
    baseline: Option<usize>,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            origin: None,
            lexer: Lexer::new(source),
            tree: ModelTree::default(),
            indented: None,
            baseline: None,
        }
    }

    pub fn with_directive_prefix(mut self, prefix: char) -> Self {
        self.lexer = self.lexer.with_directive_prefix(prefix);
        self
    }

    /// File name reported in error locations.
    pub fn with_origin(mut self, origin: Option<&'a Path>) -> Self {
        self.origin = origin;
        self
    }

    #[tracing::instrument(level = "debug", skip(self), fields(origin = ?self.origin))]
    pub fn parse(mut self) -> ParseResult<ModelTree> {
        loop {
            self.lex(Lexer::skip_trivia)?;
            if self.lexer.is_empty() {
                break;
            }
            let position = self.lexer.position();

            if let Some((target, column)) = self.indented.clone() {
                if position.column > column {
                    let spec = self.parse_spec()?;
                    self.attach(&target, spec);
                    continue;
                }
                self.indented = None;
            } else if matches!(self.baseline, Some(column) if position.column > column) {
                return Err(self.syntax("found property without parent rule", position));
            }

            self.parse_declaration(position)?;
        }
        tracing::debug!(
            rules = self.tree.rules.len(),
            types = self.tree.types.len(),
            imports = self.tree.imports.len(),
            "parsed model"
        );
        Ok(self.tree)
    }

    fn parse_declaration(&mut self, position: Position) -> ParseResult<()> {
        self.baseline = Some(position.column);

        if let Some(directive) = self.lex(Lexer::directive)? {
            return self.parse_directive(directive);
        }
        if let Some(word) = self.lex(Lexer::word)? {
            if word.value == TYPE_DECLARATION {
                return self.parse_type_declaration(word);
            }
            return self.parse_rule(word);
        }

        let found = self
            .lex(Lexer::nonwhitespace)?
            .map(|token| token.value)
            .unwrap_or_default();
        Err(self.syntax(&format!("unrecognized token `{}`", found), position))
    }

    fn parse_directive(&mut self, directive: Token) -> ParseResult<()> {
        self.lex(Lexer::whitespace)?;
        let value = if self.at_comment() {
            None
        } else if let Some(string) = self.lex(Lexer::string)? {
            Some(string.value)
        } else {
            self.lex(Lexer::nonwhitespace)?.map(|token| token.value)
        };
        self.expect_end_of_line("directive")?;

        if directive.value == IMPORT_DIRECTIVE {
            let path = value.ok_or_else(|| {
                self.syntax("import directive needs a path", directive.position())
            })?;
            self.tree.imports.push(Import {
                path,
                line: directive.line,
            });
        } else {
            self.tree.directives.push(Directive {
                name: directive.value,
                value,
                line: directive.line,
            });
        }
        Ok(())
    }

    fn parse_type_declaration(&mut self, keyword: Token) -> ParseResult<()> {
        self.lex(Lexer::whitespace)?;
        let name = self.lex(Lexer::word)?.ok_or_else(|| {
            self.syntax(
                "type definition has no name",
                self.line_end_position(keyword.position()),
            )
        })?;
        let mut def = TypeDefinition::new(&name.value, keyword.position());

        if self.open_block()? {
            while let Some(spec) = self.next_in_block(&keyword)? {
                def.validators.push(spec);
            }
            self.tree.insert_type(def);
        } else {
            self.expect_end_of_line("type definition")?;
            self.tree.insert_type(def);
            self.indented = Some((IndentTarget::Type(name.value), keyword.column));
        }
        Ok(())
    }

    fn parse_rule(&mut self, declared_type: Token) -> ParseResult<()> {
        self.lex(Lexer::whitespace)?;
        let path = self.lex(Lexer::word)?.ok_or_else(|| {
            self.syntax(
                "rule has type but no property path or name",
                self.line_end_position(declared_type.position()),
            )
        })?;
        let mut rule = Rule::new(&declared_type.value, &path.value, declared_type.position());

        self.lex(Lexer::whitespace)?;
        rule.message = self.lex(Lexer::string)?.map(|token| token.value);

        if self.open_block()? {
            while let Some(spec) = self.next_in_block(&declared_type)? {
                rule.push(spec);
            }
            self.tree.insert_rule(rule);
        } else {
            self.expect_end_of_line("rule")?;
            self.tree.insert_rule(rule);
            self.indented = Some((IndentTarget::Rule(path.value), declared_type.column));
        }
        Ok(())
    }

    /// Consumes `{` if it follows, possibly after comments or on the next line.
    fn open_block(&mut self) -> ParseResult<bool> {
        let saved = self.lexer.clone();
        self.lex(Lexer::skip_trivia)?;
        if self.lex(Lexer::open)?.is_some() {
            return Ok(true);
        }
        self.lexer = saved;
        Ok(false)
    }

    /// The next spec of a `{ ... }` body, or `None` once `}` is consumed.
    fn next_in_block(&mut self, opener: &Token) -> ParseResult<Option<ValidatorSpec>> {
        self.lex(Lexer::skip_trivia)?;
        if self.lex(Lexer::close)?.is_some() {
            return Ok(None);
        }
        if self.lexer.is_empty() {
            return Err(self.syntax(
                &format!("missing closing brace for `{}`", opener.value),
                opener.position(),
            ));
        }
        self.parse_spec().map(Some)
    }

    /// `operator [argument] [message]` on a single line.
    fn parse_spec(&mut self) -> ParseResult<ValidatorSpec> {
        let position = self.lexer.position();
        let operator = self
            .lex(Lexer::word)?
            .ok_or_else(|| self.syntax("expected property or type", position))?;
        self.lex(Lexer::whitespace)?;

        let argument = if let Some(token) = self.lex(Lexer::string)? {
            Argument::String(token.value)
        } else if let Some(token) = self.lex(Lexer::regex)? {
            Argument::Regex(token.value)
        } else if let Some(token) = self.lex(Lexer::word)? {
            Argument::Word(token.value)
        } else {
            Argument::Word("true".to_string())
        };

        self.lex(Lexer::whitespace)?;
        let message = self.lex(Lexer::string)?.map(|token| token.value);
        self.expect_end_of_line("validator")?;

        Ok(ValidatorSpec::new(operator.value, argument, operator.line).with_message(message))
    }

    /// Allows trailing whitespace and a comment; then a newline, `}` or the end of input must follow.
    fn expect_end_of_line(&mut self, what: &str) -> ParseResult<()> {
        self.lex(Lexer::whitespace)?;
        if self.at_comment() {
            self.lex(Lexer::comment)?;
            self.lex(Lexer::whitespace)?;
        }
        match self.lexer.peek() {
            None | Some('\n') | Some('\r') | Some('}') => Ok(()),
            Some(_) => {
                let position = self.lexer.position();
                let found = self
                    .lex(Lexer::nonwhitespace)?
                    .map(|token| token.value)
                    .unwrap_or_default();
                Err(self.syntax(&format!("unexpected `{}` after {}", found, what), position))
            }
        }
    }

    fn at_comment(&self) -> bool {
        let rest = self.lexer.remaining();
        rest.starts_with("//") || rest.starts_with("/*")
    }

    fn attach(&mut self, target: &IndentTarget, spec: ValidatorSpec) {
        match target {
            IndentTarget::Rule(path) => {
                if let Some(rule) = self.tree.rules.get_mut(path) {
                    rule.push(spec);
                }
            }
            IndentTarget::Type(name) => {
                if let Some(def) = self.tree.types.get_mut(name) {
                    def.validators.push(spec);
                }
            }
        }
    }

    fn line_end_position(&self, fallback: Position) -> Position {
        let current = self.lexer.position();
        if current.line == fallback.line {
            current
        } else {
            fallback
        }
    }

    fn lex<T>(&mut self, matcher: impl FnOnce(&mut Lexer<'a>) -> LexResult<T>) -> ParseResult<T> {
        let result = matcher(&mut self.lexer);
        result.map_err(|error| self.lexical(error))
    }

    fn lexical(&self, error: LexError) -> ParseError {
        ParseError::Lexical {
            location: self.location(Position {
                line: error.line(),
                column: error.column(),
            }),
            source: error,
        }
    }

    fn syntax(&self, message: &str, position: Position) -> ParseError {
        ParseError::Syntax {
            message: message.to_string(),
            location: self.location(position),
        }
    }

    fn location(&self, position: Position) -> Location {
        Location::new(self.source, position.line, position.column).in_file(self.origin)
    }
}

/// Parses `source` with the default `@` directive prefix.
pub fn parse(source: &str) -> ParseResult<ModelTree> {
    Parser::new(source).parse()
}
