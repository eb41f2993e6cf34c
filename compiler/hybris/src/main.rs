//! Hybris interpreter CLI.

use std::path::Path;

use hybris::commands::{lex_file, parse_file, run_command, RUN_USAGE};
use hybris::init_tracing;

fn main() {
    init_tracing();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    let command = &args[1];

    let code = match command.as_str() {
        "run" => run_command(&args[2..]),
        "parse" | "lex" => {
            let Some(path) = args.get(2) else {
                eprintln!("Usage: hybris {command} <file>");
                std::process::exit(1);
            };
            if command == "parse" {
                parse_file(Path::new(path))
            } else {
                lex_file(Path::new(path))
            }
        }
        "help" | "--help" | "-h" => {
            print_usage();
            0
        }
        "version" | "--version" | "-V" => {
            println!("hybris {}", hybris_eval::VERSION);
            0
        }
        // `hybris <file> ...` is `hybris run <file> ...`.
        _ if !command.starts_with('-') => run_command(&args[1..]),
        _ => {
            eprintln!("error: unknown option '{command}'");
            print_usage();
            1
        }
    };

    std::process::exit(code);
}

fn print_usage() {
    println!("Hybris scripting language");
    println!();
    println!("Usage: hybris <command> [options]");
    println!();
    println!("Commands:");
    println!("  run <file>     Run a script (also: hybris <file>)");
    println!("  parse <file>   Print the syntax tree of a script");
    println!("  lex <file>     Print the tokens of a script");
    println!("  help           Show this message");
    println!("  version        Show the version");
    println!();
    println!("Run options:");
    println!("  --gc-threshold=N   Allocations between collector runs");
    println!("  --max-depth=N      Maximum script call depth");
    println!("  --trace            Print the script call stack with errors");
    println!("  --print-ast        Print each statement before running it");
    println!("  -- <args>          Pass the remaining arguments to the script");
    println!();
    println!("Full form: {RUN_USAGE}");
    println!("Set {}=<filter> for debug tracing on stderr.", hybris::LOG_ENV);
}
