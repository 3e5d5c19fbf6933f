mod repl;

use std::{env, fs, process};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const USAGE: &str = "usage: sprig [FILE]

Starts an interactive session when no FILE is given, otherwise evaluates
FILE one line at a time.

options:
    -h, --help       print this message
    -V, --version    print the version";

/// Log to stderr, only when `RUST_LOG` is set (e.g. `RUST_LOG=sprig_interpreter=debug`).
fn init_tracing() {
    if env::var("RUST_LOG").is_ok() {
        let filter = EnvFilter::from_default_env();
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_level(true),
            )
            .with(filter)
            .init();
    }
}

fn main() {
    init_tracing();

    let args: Vec<String> = env::args().skip(1).collect();

    let code = match args.as_slice() {
        [] => {
            repl::repl();
            0
        }
        [flag] if flag == "-h" || flag == "--help" => {
            println!("{}", USAGE);
            0
        }
        [flag] if flag == "-V" || flag == "--version" => {
            println!("sprig {}", repl::VERSION);
            0
        }
        [flag] if flag.starts_with('-') => {
            eprintln!("error: unknown option '{}'\n\n{}", flag, USAGE);
            2
        }
        [path] => match fs::read_to_string(path) {
            Ok(source) => {
                if repl::run_source(&source) {
                    1
                } else {
                    0
                }
            }
            Err(err) => {
                eprintln!("error: could not read '{}': {}", path, err);
                2
            }
        },
        _ => {
            eprintln!("error: expected at most one file\n\n{}", USAGE);
            2
        }
    };

    process::exit(code);
}
