use std::io::{self, Write};

use rustyline::error::ReadlineError;
use rustyline::Editor;
use tracing::debug;

use sprig_interpreter::{Diagnostic, Evaluator};
use sprig_parser::token::Token;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn repl() {
    println!("sprig v{}", VERSION);

    let mut evaluator = Evaluator::new();

    // `()` can be used when no completer is required
    let mut rl = Editor::<()>::new();
    loop {
        let readline = rl.readline(">> ");
        match readline {
            Ok(line) => {
                if line.trim() == "exit" || line.trim() == "quit" {
                    break;
                }
                // Skip empty lines
                else if line.trim().is_empty() {
                    continue;
                }

                rl.add_history_entry(line.as_str());

                let result = evaluator.eval_line(&line);
                print_diagnostics(evaluator.take_diagnostics());
                print_result(&result);
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("error: {:?}", err);
                break;
            }
        }
    }
}

/// Evaluate a source file one line at a time. Returns whether any line reported a diagnostic.
pub fn run_source(source: &str) -> bool {
    let mut evaluator = Evaluator::new();
    let mut failed = false;

    for (number, line) in source.lines().enumerate() {
        let trimmed = line.trim();
        // Skip blank lines and comments
        if trimmed.is_empty() || trimmed.starts_with(';') {
            continue;
        }

        debug!(line = number + 1, "evaluating line");
        let result = evaluator.eval_line(line);

        let diagnostics = evaluator.take_diagnostics();
        failed |= !diagnostics.is_empty();
        print_diagnostics(diagnostics);
        print_result(&result);
    }

    failed
}

fn print_result(result: &Token) {
    if !result.is_none() {
        println!("{}", result.to_code_string());
    }
}

fn print_diagnostics(diagnostics: Vec<Diagnostic>) {
    let stderr = io::stderr();
    let mut handle = stderr.lock();
    for diagnostic in diagnostics {
        // Nothing sensible to do if stderr is gone
        let _ = writeln!(handle, "error: {}", diagnostic);
    }
}
