//! Command implementations for the `hybris` binary.
//!
//! Each command returns the process exit code; failures are reported on
//! stderr in the format built by [`render_error`].

mod inspect;
mod run;

use std::fmt::Write as _;
use std::path::Path;

use hybris_eval::{EvalErrorKind, EvalNote};

use crate::RunError;

pub use inspect::{lex_file, parse_file};
pub use run::{run_command, RUN_USAGE};

/// Render a run failure with its location, notes and script call stack.
///
/// ```text
/// error: division by zero
///   --> main.hy:3:9
///   = note: ...
/// stack trace:
///   0: divide at 20..25
/// ```
pub fn render_error(err: &RunError, path: &Path, source: Option<&str>) -> String {
    // Engine errors already lead with their category.
    let mut out = match err {
        RunError::Eval(_) => format!("{err}\n"),
        _ => format!("error: {err}\n"),
    };
    if let (Some(span), Some(source)) = (err.span(), source) {
        let (line, col) = span.line_col(source);
        let _ = writeln!(out, "  --> {}:{line}:{col}", path.display());
    }
    if let RunError::Eval(eval) = err {
        for note in eval.notes.iter().chain(&hints(&eval.kind)) {
            let _ = writeln!(out, "  = note: {}", note.message);
        }
        if let Some(backtrace) = &eval.backtrace {
            out.push_str(&backtrace.to_string());
        }
    }
    out
}

fn hints(kind: &EvalErrorKind) -> Vec<EvalNote> {
    match kind {
        EvalErrorKind::RecursionLimit { .. } => {
            vec![EvalNote::new("raise the limit with --max-depth=N")]
        }
        _ => Vec::new(),
    }
}

fn report(err: &RunError, path: &Path, source: Option<&str>) -> i32 {
    eprint!("{}", render_error(err, path, source));
    1
}

#[cfg(test)]
mod tests;
