//! Hybris lexer.
//!
//! Converts source text into a flat list of spanned tokens using `logos`.
//! Whitespace and comments (`// ...`, `/* ... */` and `# ...`) are skipped.

mod token;

use hybris_ir::Span;
use logos::Logos;

pub use token::Token;

/// A token together with its source span.
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    pub span: Span,
}

/// Errors produced while tokenizing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LexError {
    #[error("unexpected character {text:?} at {span}")]
    UnexpectedCharacter { text: String, span: Span },
    #[error("malformed literal {text:?} at {span}")]
    MalformedLiteral { text: String, span: Span },
    #[error("unterminated block comment at {span}")]
    UnterminatedComment { span: Span },
}

impl LexError {
    pub fn span(&self) -> Span {
        match self {
            LexError::UnexpectedCharacter { span, .. }
            | LexError::MalformedLiteral { span, .. }
            | LexError::UnterminatedComment { span } => *span,
        }
    }
}

/// Tokenize a whole source file.
///
/// Stops at the first invalid token.
pub fn tokenize(source: &str) -> Result<Vec<SpannedToken>, LexError> {
    let mut tokens = Vec::new();
    let mut lexer = Token::lexer(source);

    while let Some(result) = lexer.next() {
        let span = Span::from_range(lexer.span());
        match result {
            Ok(token) => tokens.push(SpannedToken { token, span }),
            Err(()) => {
                let text = lexer.slice().to_string();
                if text.starts_with("/*") {
                    return Err(LexError::UnterminatedComment { span });
                }
                // A literal start character means the literal itself was bad
                // (unterminated string, out-of-range integer, bad escape).
                let literal = text.starts_with(['"', '\''])
                    || text.starts_with(|c: char| c.is_ascii_digit());
                let error = if literal {
                    LexError::MalformedLiteral { text, span }
                } else {
                    LexError::UnexpectedCharacter { text, span }
                };
                return Err(error);
            }
        }
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests;
