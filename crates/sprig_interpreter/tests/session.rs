use pretty_assertions::assert_eq;

use sprig_interpreter::{Diagnostic, Evaluator, RuntimeError};
use sprig_parser::{ast::Operator, lexer::tokenize, parser::ParseError, token::Token};

/// Feed every line to one evaluator and collect the printed form of each result.
fn replay(lines: &[&str]) -> (Vec<String>, Vec<Diagnostic>) {
    let mut evaluator = Evaluator::new();

    let printed = lines
        .iter()
        .map(|line| evaluator.eval_line(line).to_code_string())
        .collect();

    (printed, evaluator.take_diagnostics())
}

#[test]
fn tokenize_then_evaluate() {
    let tokens = tokenize("(+ 1 2)").tokens;
    assert_eq!(
        tokens,
        vec![
            Token::LeftParen,
            Token::Plus,
            Token::Integer(1),
            Token::Integer(2),
            Token::RightParen,
        ]
    );

    let mut evaluator = Evaluator::new();
    assert_eq!(evaluator.eval_tokens(tokens), Token::Integer(3));
}

#[test]
fn arithmetic_session() {
    let (printed, diagnostics) = replay(&[
        "(+ 1 2)",
        "(+ 1.0 2)",
        "(+ \"a\" \"b\")",
        "(* (- 10 4) (/ 9 3))",
    ]);

    assert_eq!(printed, vec!["3", "3.0", "\"ab\"", "18"]);
    assert!(diagnostics.is_empty());
}

#[test]
fn definitions_persist_across_lines() {
    let (printed, diagnostics) = replay(&[
        "(define x 5)",
        "(+ x 1)",
        "(define x 7)",
        "x",
        "(setq x 9)",
        "x",
    ]);

    assert_eq!(printed, vec!["x", "6", "nil", "5", "9", "9"]);
    assert_eq!(
        diagnostics,
        vec![Diagnostic::Runtime(RuntimeError::AlreadyDefined(
            "x".into()
        ))]
    );
}

#[test]
fn lambda_session() {
    let (printed, diagnostics) = replay(&[
        "(define area (lambda (a) (* a a)))",
        "(area 4)",
        "(area 5)",
        "(area (area 2))",
        "(define hyp (lambda (a b) (+ (area a) (area b))))",
        "(hyp 3 4)",
    ]);

    assert_eq!(printed, vec!["area", "16", "25", "16", "hyp", "25"]);
    assert!(diagnostics.is_empty());
}

#[test]
fn comparison_session() {
    let (printed, diagnostics) = replay(&[
        "(eq \"abc\" \"abc\")",
        "(equal \"abc\" \"abc\")",
        "(if (eq 1 2) 10 20)",
        "(if true 10 20)",
        "(if false 10 20)",
    ]);

    assert_eq!(printed, vec!["false", "true", "20", "10", "20"]);
    assert!(diagnostics.is_empty());
}

#[test]
fn list_session() {
    let (printed, diagnostics) = replay(&[
        "(define nums (quote (1 2 3)))",
        "(car nums)",
        "(cdr nums)",
        "(car (cdr nums))",
        "(equal (cdr nums) '(2 3))",
    ]);

    assert_eq!(printed, vec!["nums", "1", "(2 3)", "2", "true"]);
    assert!(diagnostics.is_empty());
}

#[test]
fn unclosed_paren_recovers_on_next_line() {
    let (printed, diagnostics) = replay(&["(+ 1 2", "(+ 1 2)"]);

    assert_eq!(printed, vec!["nil", "3"]);
    assert_eq!(
        diagnostics,
        vec![Diagnostic::Parse(ParseError::NoMatchingParen)]
    );
    assert_eq!(diagnostics[0].to_string(), "no matching ')'");
}

#[test]
fn while_counts_down() {
    let (printed, diagnostics) = replay(&[
        "(define n 3)",
        "(define steps 0)",
        "(while (if (eq n 0) false true) (setq steps (+ steps (setq n (- n 1)))))",
        "steps",
        "n",
    ]);

    assert_eq!(printed, vec!["n", "steps", "3", "3", "0"]);
    assert!(diagnostics.is_empty());
}

#[test]
fn setq_reaches_one_outer_hop() {
    let (printed, diagnostics) = replay(&[
        "(define counter 0)",
        "(define bump (lambda () (setq counter (+ counter 1))))",
        "(bump)",
        "(bump)",
        "counter",
        "(define outer (lambda () (bump)))",
        "(outer)",
        "counter",
    ]);

    // Inside `bump` called from `outer`, the global is two hops away
    assert_eq!(
        printed,
        vec!["counter", "bump", "1", "2", "2", "outer", "nil", "2"]
    );
    assert_eq!(
        diagnostics,
        vec![
            Diagnostic::Runtime(RuntimeError::IdentifierNotFound("counter".into())),
            Diagnostic::Runtime(RuntimeError::InvalidOperands {
                operator: Operator::Plus,
                left: "nil",
                right: "integer",
            }),
            Diagnostic::Runtime(RuntimeError::IdentifierNotFound("counter".into())),
        ]
    );
}

#[test]
fn lambdas_cannot_be_copied() {
    let (printed, diagnostics) = replay(&["(define f (lambda (a) (+ a 1)))", "f", "(f 1)"]);

    assert_eq!(printed, vec!["f", "nil", "2"]);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].to_string(), "a lambda value cannot be copied");
}

#[test]
#[should_panic]
fn integer_division_by_zero_aborts() {
    replay(&["(/ 10 0)"]);
}
