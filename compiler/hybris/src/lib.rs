#![allow(
    clippy::result_large_err,
    reason = "RunError wraps EvalError, which carries span, backtrace and notes"
)]
//! Hybris - a dynamically typed scripting language.
//!
//! This crate is the driver: it reads a script, tokenizes all of it, then
//! parses it one top-level statement at a time and hands each statement to
//! the engine before the next one is parsed. Functions and types declared by
//! earlier statements are therefore visible to later ones, and a parse error
//! further down the file does not prevent the statements before it from
//! running. A lexical error (an invalid character, a malformed literal or an
//! unterminated comment) anywhere in the file is reported before anything
//! runs.
//!
//! ```text
//! source -> hybris_lexer -> hybris_parse -> hybris_eval
//! ```

pub mod commands;
pub mod config;
mod tracing_setup;

use std::path::{Path, PathBuf};

use hybris_eval::{stdout_handler, Completion, EvalError, InterpreterBuilder, SharedPrintHandler};
use hybris_parse::{ParseError, Parser};

pub use config::{parse_run_options, Config, RunOptions, UsageError};
pub use tracing_setup::{init_tracing, LOG_ENV};

/// Failure of a whole script run.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("cannot read '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("{0}")]
    Eval(#[from] EvalError),
}

impl RunError {
    /// Source offset of the failure, if known.
    pub fn span(&self) -> Option<hybris_ir::Span> {
        match self {
            RunError::Io { .. } => None,
            RunError::Parse(e) => Some(e.span()),
            RunError::Eval(e) => e.span,
        }
    }
}

/// Run `source` to completion.
///
/// Stops at the first top-level `return` or at `pthread_exit()`, then waits
/// for script threads nobody joined. `argv` becomes the script's `argv`
/// global.
#[tracing::instrument(level = "debug", skip_all)]
pub fn run_source(
    source: &str,
    config: &Config,
    argv: &[String],
    print: SharedPrintHandler,
) -> Result<Completion, RunError> {
    let mut interpreter = InterpreterBuilder::new()
        .config(config.runtime())
        .print_handler(print)
        .build();
    interpreter.set_script_args(argv)?;

    let mut parser = Parser::new(source)?;
    let mut completion = Completion::Value(interpreter.null());
    while let Some(statement) = parser.parse_statement()? {
        if config.print_ast {
            eprintln!("{statement:#?}");
        }
        completion = interpreter.execute(&statement)?;
        if !matches!(completion, Completion::Value(_)) {
            break;
        }
    }

    interpreter.join_threads()?;
    tracing::debug!(live = interpreter.heap().live(), "script finished");
    Ok(completion)
}

/// Read and run a script file, printing to stdout.
pub fn run_file(path: &Path, config: &Config, argv: &[String]) -> Result<Completion, RunError> {
    let source = read_source(path)?;
    run_source(&source, config, argv, stdout_handler())
}

pub fn read_source(path: &Path) -> Result<String, RunError> {
    std::fs::read_to_string(path).map_err(|source| RunError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests;
