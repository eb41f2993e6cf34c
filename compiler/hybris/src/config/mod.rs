//! Driver configuration and command-line options.

use std::path::PathBuf;

use hybris_eval::RuntimeConfig;

/// Settings of one script run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Allocations between two collector runs.
    pub gc_threshold: usize,
    /// Deepest allowed nesting of script calls.
    pub max_recursion_depth: usize,
    /// Print the script call stack with fatal errors.
    pub stack_trace: bool,
    /// Dump every parsed statement to stderr before running it.
    pub print_ast: bool,
}

impl Default for Config {
    fn default() -> Self {
        let runtime = RuntimeConfig::default();
        Self {
            gc_threshold: runtime.gc_threshold,
            max_recursion_depth: runtime.max_recursion_depth,
            stack_trace: runtime.stack_trace,
            print_ast: false,
        }
    }
}

impl Config {
    pub fn runtime(&self) -> RuntimeConfig {
        RuntimeConfig {
            gc_threshold: self.gc_threshold,
            max_recursion_depth: self.max_recursion_depth,
            stack_trace: self.stack_trace,
        }
    }
}

/// Malformed command line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UsageError {
    #[error("missing file path")]
    MissingPath,

    #[error("unknown option '{0}'")]
    UnknownOption(String),

    #[error("invalid value '{value}' for {flag}")]
    InvalidValue { flag: &'static str, value: String },
}

/// Parsed arguments of `hybris run`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunOptions {
    pub path: PathBuf,
    pub config: Config,
    /// Arguments passed on to the script as `argv`, after the script path.
    pub script_args: Vec<String>,
}

impl RunOptions {
    /// The script's `argv`: its own path followed by its arguments.
    pub fn argv(&self) -> Vec<String> {
        std::iter::once(self.path.display().to_string())
            .chain(self.script_args.iter().cloned())
            .collect()
    }
}

/// Parse `<file> [options] [args] [-- args]`.
///
/// Options are only recognized before `--`; anything after the script path
/// that is not an option is passed to the script.
pub fn parse_run_options(args: &[String]) -> Result<RunOptions, UsageError> {
    let mut config = Config::default();
    let mut path = None;
    let mut script_args = Vec::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--" {
            script_args.extend(iter.by_ref().cloned());
            break;
        }
        if let Some(value) = arg.strip_prefix("--gc-threshold=") {
            config.gc_threshold = number("--gc-threshold", value)?;
        } else if let Some(value) = arg.strip_prefix("--max-depth=") {
            config.max_recursion_depth = number("--max-depth", value)?;
        } else if arg == "--trace" || arg == "-t" {
            config.stack_trace = true;
        } else if arg == "--print-ast" {
            config.print_ast = true;
        } else if arg.starts_with('-') && arg.len() > 1 {
            return Err(UsageError::UnknownOption(arg.clone()));
        } else if path.is_none() {
            path = Some(PathBuf::from(arg));
        } else {
            script_args.push(arg.clone());
        }
    }

    let path = path.ok_or(UsageError::MissingPath)?;
    Ok(RunOptions {
        path,
        config,
        script_args,
    })
}

fn number(flag: &'static str, value: &str) -> Result<usize, UsageError> {
    value.parse().map_err(|_| UsageError::InvalidValue {
        flag,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests;
