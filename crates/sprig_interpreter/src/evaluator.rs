use std::{cell::RefCell, mem, rc::Rc};

use tracing::{debug, trace, warn};

use crate::{builtin, environment::Environment, error::Diagnostic, error::RuntimeError};

use sprig_parser::{
    ast::{Argument, Node, Operator},
    lexer::{tokenize, Tokenized},
    parser::{self, Evaluate, ParseError, Parser},
    token::{duplicate_all, Builtin, Lambda, Token},
};

/// What a call resolved to, copied out of the environment so no borrow outlives the lookup.
enum Callee {
    Lambda {
        parameters: Vec<String>,
        body: Vec<Token>,
    },
    Builtin(Builtin),
    NotCallable(String),
}

pub struct Evaluator {
    env: Rc<RefCell<Environment>>,
    diagnostics: Vec<Diagnostic>,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator {
    pub fn new() -> Self {
        Self::new_with_env(Rc::new(RefCell::new(Environment::new())))
    }

    pub fn new_with_env(env: Rc<RefCell<Environment>>) -> Self {
        Evaluator {
            env,
            diagnostics: Vec::new(),
        }
    }

    /// Bind a value in the current environment from the host side.
    pub fn define(&mut self, name: &str, value: Token) -> Result<(), RuntimeError> {
        self.env.borrow_mut().define(name.to_owned(), value)
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Drain every diagnostic reported since the last call.
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        mem::take(&mut self.diagnostics)
    }

    /// Tokenize one line and evaluate it. Characters the lexer rejects are reported and skipped.
    pub fn eval_line(&mut self, line: &str) -> Token {
        let Tokenized { tokens, errors } = tokenize(line);
        trace!(?tokens, "tokenized line");
        for error in errors {
            self.report(error);
        }

        self.eval_tokens(tokens)
    }

    /// Parse and evaluate the one form a token sequence holds.
    ///
    /// A parse error, or any token left over after the form, is reported and yields `Token::None`.
    pub fn eval_tokens(&mut self, mut tokens: Vec<Token>) -> Token {
        if tokens.is_empty() {
            return Token::None;
        }

        let (parsed, cursor, depth) = {
            let mut parser = Parser::new(&mut tokens, self);
            let parsed = parser.parse();
            (parsed, parser.cursor(), parser.depth())
        };

        let node = match parsed {
            Ok(node) => node,
            Err(error) => {
                debug!(depth, "abandoning line");
                self.report(error);
                return Token::None;
            }
        };

        // One form per line
        if cursor < tokens.len() {
            debug!(cursor, remaining = tokens.len() - cursor, "tokens left after form");
            self.report(ParseError::UnexpectedParen);
            return Token::None;
        }

        self.eval(&node)
    }

    /// Evaluate one node. Failures are reported and turn into `Token::None`.
    pub fn eval(&mut self, node: &Node) -> Token {
        trace!(form = %node, "evaluating");

        let result = self.eval_node(node);
        self.recover(result)
    }

    fn eval_node(&mut self, node: &Node) -> Result<Token, RuntimeError> {
        match node {
            Node::Literal(value) => Ok(value.duplicate()?),
            Node::Quote(datum) => Ok(datum.duplicate()?),
            Node::Identifier(name) => self.resolve(name),

            Node::Binary {
                operator,
                left,
                right,
            } => {
                let left = self.eval(left);
                let right = self.eval(right);
                eval_arithmetic(*operator, &left, &right)
            }

            Node::Define { name, value } => {
                let value = self.eval(value);
                self.env.borrow_mut().define(name.clone(), value)?;
                Ok(Token::Identifier(name.clone()))
            }
            Node::Setq { name, value } => {
                let value = self.eval(value);
                // Lambdas can be assigned but not handed back
                let copy = value.duplicate().unwrap_or_default();
                self.env.borrow_mut().assign(name.clone(), value)?;
                Ok(copy)
            }

            Node::Lambda { parameters, body } => Ok(Token::Lambda(Box::new(Lambda::new(
                duplicate_all(parameters)?,
                duplicate_all(body)?,
            )))),

            Node::If {
                condition,
                consequence,
                alternative,
            } => {
                let branch = match self.eval(condition) {
                    Token::True => consequence,
                    _ => alternative,
                };
                Ok(self.eval(branch))
            }
            Node::While { condition, body } => {
                let mut result = Token::None;
                while !matches!(self.eval(condition), Token::False) {
                    result = self.eval(body);
                }
                Ok(result)
            }

            Node::Call { callee, arguments } => self.eval_call(callee, arguments),
        }
    }

    /// Look a name up in the environment, falling back to the builtins, and copy its value.
    fn resolve(&self, name: &str) -> Result<Token, RuntimeError> {
        match self.env.borrow().with(name, Token::duplicate) {
            Some(value) => Ok(value?),
            // NOTE: Builtins are not bound in the environment, so a definition shadows them
            None => match Builtin::lookup(name) {
                Some(builtin) => Ok(Token::Builtin(builtin)),
                None => Err(RuntimeError::IdentifierNotFound(name.to_owned())),
            },
        }
    }

    fn eval_call(&mut self, callee: &str, arguments: &[Argument]) -> Result<Token, RuntimeError> {
        let args = self.materialize_arguments(callee, arguments);

        let target = self.env.borrow().with(callee, |value| match value {
            Token::Lambda(lambda) => Callee::Lambda {
                parameters: lambda
                    .parameter_names()
                    .into_iter()
                    .map(str::to_owned)
                    .collect(),
                body: lambda.instantiate_body().unwrap_or_default(),
            },
            Token::Builtin(builtin) => Callee::Builtin(*builtin),
            other => Callee::NotCallable(other.to_code_string()),
        });

        let target = match target {
            Some(target) => target,
            None => match Builtin::lookup(callee) {
                Some(builtin) => Callee::Builtin(builtin),
                None => return Err(RuntimeError::IdentifierNotFound(callee.to_owned())),
            },
        };

        match target {
            Callee::Lambda { parameters, body } => {
                self.apply_lambda(callee, parameters, body, args)
            }
            // Builtins handle themselves
            Callee::Builtin(builtin) => builtin::apply(builtin, &args),
            Callee::NotCallable(shown) => Err(RuntimeError::NotAFunction(shown)),
        }
    }

    /// Build the argument vector: the callee name in slot 0, then one value per argument.
    fn materialize_arguments(&mut self, callee: &str, arguments: &[Argument]) -> Vec<Token> {
        let mut args = Vec::with_capacity(arguments.len() + 1);
        args.push(Token::Identifier(callee.to_owned()));

        for argument in arguments {
            let value = match argument {
                Argument::Token(Token::Identifier(name)) => self.resolve(name),
                Argument::Token(token) | Argument::Evaluated(token) => {
                    token.duplicate().map_err(RuntimeError::from)
                }
            };
            let value = self.recover(value);
            args.push(value);
        }

        args
    }

    fn apply_lambda(
        &mut self,
        name: &str,
        parameters: Vec<String>,
        mut body: Vec<Token>,
        args: Vec<Token>,
    ) -> Result<Token, RuntimeError> {
        // Check that number of args & params matches
        let got = args.len() - 1;
        if got != parameters.len() {
            return Err(RuntimeError::BadArity {
                name: name.to_owned(),
                expected: parameters.len(),
                got,
            });
        }

        // The frame hangs off the calling environment, not the defining one
        let mut frame = Environment::new_enclosed(Rc::clone(&self.env));
        for (parameter, value) in parameters.into_iter().zip(args.into_iter().skip(1)) {
            frame.define(parameter, value)?;
        }

        // Remember current environment (when exiting from call)
        let current_env = mem::replace(&mut self.env, Rc::new(RefCell::new(frame)));
        debug!(function = name, depth = self.env.borrow().depth(), "entering call frame");

        let mut cursor = 0;
        let result = match parser::parse(&mut body, &mut cursor, self) {
            Ok(node) => self.eval(&node),
            Err(error) => {
                self.report(error);
                Token::None
            }
        };

        self.env = current_env;
        debug!(function = name, "leaving call frame");

        Ok(result)
    }

    fn recover(&mut self, result: Result<Token, RuntimeError>) -> Token {
        match result {
            Ok(value) => value,
            Err(error) => {
                self.report(error);
                Token::None
            }
        }
    }

    fn report(&mut self, error: impl Into<Diagnostic>) {
        let diagnostic = error.into();
        warn!(error = %diagnostic, "diagnostic reported");
        self.diagnostics.push(diagnostic);
    }
}

impl Evaluate for Evaluator {
    fn evaluate(&mut self, node: &Node) -> Token {
        self.eval(node)
    }
}

fn eval_arithmetic(operator: Operator, left: &Token, right: &Token) -> Result<Token, RuntimeError> {
    match (left, right) {
        (Token::Integer(left_value), Token::Integer(right_value)) => Ok(Token::Integer(
            eval_integer_arithmetic(operator, *left_value, *right_value),
        )),

        (Token::Float(left_value), Token::Float(right_value)) => Ok(Token::Float(
            eval_float_arithmetic(operator, *left_value, *right_value),
        )),
        (Token::Float(left_value), Token::Integer(right_value)) => Ok(Token::Float(
            eval_float_arithmetic(operator, *left_value, *right_value as f64),
        )),
        (Token::Integer(left_value), Token::Float(right_value)) => Ok(Token::Float(
            eval_float_arithmetic(operator, *left_value as f64, *right_value),
        )),

        (Token::String(left_value), Token::String(right_value))
            if operator == Operator::Plus =>
        {
            Ok(Token::string(&format!("{}{}", left_value, right_value)))
        }

        _ => Err(RuntimeError::InvalidOperands {
            operator,
            left: left.typename(),
            right: right.typename(),
        }),
    }
}

/// Wraps on overflow. Division by zero panics.
fn eval_integer_arithmetic(operator: Operator, left_value: i64, right_value: i64) -> i64 {
    match operator {
        Operator::Plus => left_value.wrapping_add(right_value),
        Operator::Minus => left_value.wrapping_sub(right_value),
        Operator::Star => left_value.wrapping_mul(right_value),
        Operator::Slash => left_value / right_value,
    }
}

fn eval_float_arithmetic(operator: Operator, left_value: f64, right_value: f64) -> f64 {
    match operator {
        Operator::Plus => left_value + right_value,
        Operator::Minus => left_value - right_value,
        Operator::Star => left_value * right_value,
        Operator::Slash => left_value / right_value,
    }
}
