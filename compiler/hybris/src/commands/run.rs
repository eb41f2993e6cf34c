//! The `run` command: execute a Hybris script.

use hybris_eval::{stdout_handler, Completion};

use super::report;
use crate::{parse_run_options, read_source, run_source};

pub const RUN_USAGE: &str =
    "hybris run <file> [--gc-threshold=N] [--max-depth=N] [--trace] [--print-ast] [-- args]";

/// Run `hybris run` with the arguments that follow the command name.
pub fn run_command(args: &[String]) -> i32 {
    let options = match parse_run_options(args) {
        Ok(options) => options,
        Err(err) => {
            eprintln!("error: {err}");
            eprintln!("Usage: {RUN_USAGE}");
            return 1;
        }
    };

    let source = match read_source(&options.path) {
        Ok(source) => source,
        Err(err) => return report(&err, &options.path, None),
    };

    match run_source(&source, &options.config, &options.argv(), stdout_handler()) {
        Ok(Completion::Return(value)) => {
            tracing::debug!(value = %value.read(), "script returned");
            0
        }
        Ok(_) => 0,
        Err(err) => report(&err, &options.path, Some(&source)),
    }
}
