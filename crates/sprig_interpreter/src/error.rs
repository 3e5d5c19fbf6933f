use sprig_parser::{
    ast::Operator,
    lexer::LexError,
    parser::ParseError,
    span::WithSpan,
    token::{Builtin, LambdaNotCopyable},
};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    /// When referencing an identifier that does not exist/has not been defined
    #[error("identifier '{0}' not found")]
    IdentifierNotFound(String),
    /// When a value that is not a function is used with call syntax
    #[error("{0} is not a function")]
    NotAFunction(String),
    /// When defining a name that already exists in the current environment
    #[error("identifier '{0}' is already defined")]
    AlreadyDefined(String),
    /// When an arithmetic operator gets operand types it does not support (e.g. `(+ 1 "a")`)
    #[error("unsupported operand type(s) for {operator} operator: `{left}` and `{right}`")]
    InvalidOperands {
        operator: Operator,
        left: &'static str,
        right: &'static str,
    },
    #[error(transparent)]
    LambdaNotCopyable(#[from] LambdaNotCopyable),
    /// When a call's argument count does not match the expected parameter count
    #[error("{name} expected {expected} argument(s) but got {got}")]
    BadArity {
        name: String,
        expected: usize,
        got: usize,
    },
    /// When a builtin gets an argument of a type it does not support
    #[error("unsupported argument type for {} function: `{typename}`", .builtin.name())]
    InvalidArgumentType {
        builtin: Builtin,
        typename: &'static str,
    },
    #[error("{} called on a list without elements", .0.name())]
    EmptyList(Builtin),
    /// When `eq` is asked to compare values of unrelated kinds
    #[error("cannot compare `{0}` with `{1}`")]
    Incomparable(&'static str, &'static str),
}

/// Anything that went wrong while handling a line.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Diagnostic {
    #[error(transparent)]
    Lex(#[from] WithSpan<LexError>),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}
