//! The `lex` and `parse` commands: dump the front end's view of a script.

use std::path::Path;

use hybris_lexer::tokenize;
use hybris_parse::Parser;

use super::report;
use crate::{read_source, RunError};

/// Print every token of `path` with its line and column.
pub fn lex_file(path: &Path) -> i32 {
    let source = match read_source(path) {
        Ok(source) => source,
        Err(err) => return report(&err, path, None),
    };
    match tokenize(&source) {
        Ok(tokens) => {
            for spanned in &tokens {
                let (line, col) = spanned.span.line_col(&source);
                println!("{line}:{col}\t{:?}", spanned.token);
            }
            0
        }
        Err(err) => report(&RunError::Parse(err.into()), path, Some(&source)),
    }
}

/// Print the syntax tree of every top-level statement of `path`.
pub fn parse_file(path: &Path) -> i32 {
    let source = match read_source(path) {
        Ok(source) => source,
        Err(err) => return report(&err, path, None),
    };
    let parsed = Parser::new(&source).and_then(|mut parser| {
        while let Some(statement) = parser.parse_statement()? {
            println!("{statement:#?}");
        }
        Ok(())
    });
    match parsed {
        Ok(()) => 0,
        Err(err) => report(&RunError::Parse(err), path, Some(&source)),
    }
}
