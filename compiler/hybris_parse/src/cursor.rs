//! Token cursor for navigating the token stream.

use hybris_ir::Span;
use hybris_lexer::{SpannedToken, Token};

use crate::ParseError;

/// Cursor over a tokenized source file.
pub(crate) struct Cursor {
    tokens: Vec<SpannedToken>,
    pos: usize,
    /// Span reported for errors at end of input.
    eof: Span,
}

impl Cursor {
    pub(crate) fn new(tokens: Vec<SpannedToken>, eof: Span) -> Self {
        Cursor {
            tokens,
            pos: 0,
            eof,
        }
    }

    // Token access

    pub(crate) fn current(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|t| &t.token)
    }

    pub(crate) fn peek(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset).map(|t| &t.token)
    }

    pub(crate) fn current_span(&self) -> Span {
        self.tokens.get(self.pos).map_or(self.eof, |t| t.span)
    }

    pub(crate) fn previous_span(&self) -> Span {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map_or(Span::DUMMY, |t| t.span)
    }

    /// Span from `start` to the end of the last consumed token.
    pub(crate) fn span_from(&self, start: Span) -> Span {
        start.merge(self.previous_span())
    }

    pub(crate) fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    // Lookahead

    pub(crate) fn check(&self, token: &Token) -> bool {
        self.current() == Some(token)
    }

    pub(crate) fn check_ident(&self) -> bool {
        matches!(self.current(), Some(Token::Ident(_)))
    }

    // Consumption

    pub(crate) fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|t| t.token.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Consume the current token if it equals `token`.
    pub(crate) fn eat(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    pub(crate) fn expect(&mut self, token: &Token) -> Result<(), ParseError> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.unexpected(&format!("`{token}`")))
        }
    }

    pub(crate) fn expect_ident(&mut self) -> Result<String, ParseError> {
        match self.current() {
            Some(Token::Ident(name)) => {
                let name = name.clone();
                self.pos += 1;
                Ok(name)
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    /// Build an error describing the current token against what was expected.
    #[cold]
    pub(crate) fn unexpected(&self, expected: &str) -> ParseError {
        match self.tokens.get(self.pos) {
            Some(t) => ParseError::UnexpectedToken {
                expected: expected.to_string(),
                found: t.token.describe(),
                span: t.span,
            },
            None => ParseError::UnexpectedEof {
                expected: expected.to_string(),
                span: self.eof,
            },
        }
    }
}
