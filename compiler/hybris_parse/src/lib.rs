//! Recursive descent parser for Hybris.
//!
//! The parser is streaming: [`Parser::parse_statement`] yields one top-level
//! statement at a time so the driver can evaluate each statement before the
//! next one is parsed. [`parse_program`] collects them all.

mod cursor;
mod grammar;

use hybris_ir::{NodeRef, Span};
use hybris_lexer::{tokenize, LexError};

use cursor::Cursor;

/// Parse errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error("expected {expected}, found {found} at {span}")]
    UnexpectedToken {
        expected: String,
        found: String,
        span: Span,
    },

    #[error("expected {expected}, found end of input")]
    UnexpectedEof { expected: String, span: Span },

    #[error("{message} at {span}")]
    Invalid { message: String, span: Span },
}

impl ParseError {
    pub fn span(&self) -> Span {
        match self {
            ParseError::Lex(e) => e.span(),
            ParseError::UnexpectedToken { span, .. }
            | ParseError::UnexpectedEof { span, .. }
            | ParseError::Invalid { span, .. } => *span,
        }
    }

    #[cold]
    pub(crate) fn invalid(message: impl Into<String>, span: Span) -> Self {
        ParseError::Invalid {
            message: message.into(),
            span,
        }
    }
}

/// Parser state.
pub struct Parser {
    cursor: Cursor,
    failed: bool,
}

impl Parser {
    /// Tokenize `source` and create a parser positioned at its first statement.
    pub fn new(source: &str) -> Result<Self, ParseError> {
        let tokens = tokenize(source)?;
        let end = u32::try_from(source.len()).unwrap_or(u32::MAX);
        Ok(Parser {
            cursor: Cursor::new(tokens, Span::new(end, end)),
            failed: false,
        })
    }

    /// Parse the next top-level statement, or `None` at end of input.
    pub fn parse_statement(&mut self) -> Result<Option<NodeRef>, ParseError> {
        loop {
            if self.cursor.is_at_end() {
                return Ok(None);
            }
            // Stray semicolons between statements are empty statements.
            if self.cursor.eat(&hybris_lexer::Token::Semicolon) {
                continue;
            }
            break;
        }
        let node = self.statement()?;
        tracing::trace!(kind = node.label(), span = %node.span, "parsed statement");
        Ok(Some(node))
    }
}

impl Iterator for Parser {
    type Item = Result<NodeRef, ParseError>;

    /// Yields statements until end of input; after the first error the
    /// iterator is exhausted.
    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.parse_statement() {
            Ok(node) => node.map(Ok),
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

/// Parse a whole program into its list of top-level statements.
pub fn parse_program(source: &str) -> Result<Vec<NodeRef>, ParseError> {
    Parser::new(source)?.collect()
}
