mod builtin;
mod environment;
pub mod error;
mod evaluator;

pub use environment::Environment;
pub use error::{Diagnostic, RuntimeError};
pub use evaluator::Evaluator;
