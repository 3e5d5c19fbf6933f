use std::{fmt, rc::Rc};

use thiserror::Error;

/// Returned when a value that cannot be copied (a lambda) is asked to be duplicated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("a lambda value cannot be copied")]
pub struct LambdaNotCopyable;

/// Primitive operations, resolved by name when nothing in the environment shadows them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Car,
    Cdr,
    Eq,
    Equal,
}

impl Builtin {
    pub fn lookup(name: &str) -> Option<Builtin> {
        match name {
            "car" => Some(Builtin::Car),
            "cdr" => Some(Builtin::Cdr),
            "eq" => Some(Builtin::Eq),
            "equal" => Some(Builtin::Equal),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Builtin::Car => "car",
            Builtin::Cdr => "cdr",
            Builtin::Eq => "eq",
            Builtin::Equal => "equal",
        }
    }
}

impl fmt::Display for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "builtin function {}", self.name())
    }
}

/// A user function: raw parameter tokens and the unevaluated body tokens.
///
/// The body is parsed again on every call, so it is kept as tokens rather than as a tree.
#[derive(Debug, PartialEq)]
pub struct Lambda {
    pub parameters: Vec<Token>,
    pub body: Vec<Token>,
}

impl Lambda {
    pub fn new(parameters: Vec<Token>, body: Vec<Token>) -> Self {
        Lambda { parameters, body }
    }

    /// Names of the declared parameters, in order.
    pub fn parameter_names(&self) -> Vec<&str> {
        self.parameters
            .iter()
            .filter_map(|param| match param {
                Token::Identifier(name) => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    /// A fresh copy of the body tokens, ready to be consumed by a parser.
    pub fn instantiate_body(&self) -> Result<Vec<Token>, LambdaNotCopyable> {
        duplicate_all(&self.body)
    }
}

impl fmt::Display for Lambda {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lambda")
    }
}

/// Tokens double as runtime values.
///
/// The lexer only produces the syntax kinds and the literal kinds; `List`, `Lambda`,
/// `Identity` and `Builtin` only ever appear as the result of evaluation.
#[derive(Debug, PartialEq)]
pub enum Token {
    // Operators
    Plus,
    Minus,
    Star,
    Slash,

    // Delimiters
    LeftParen,
    RightParen,
    /// The `'` marker
    Quote,

    // Keywords
    Define,
    Setq,
    LambdaKeyword,
    If,
    While,
    QuoteKeyword,
    True,
    False,

    // Identifiers & Literals
    Identifier(String),
    Integer(i64),
    Float(f64),
    String(Rc<str>),

    // Runtime values
    List(Rc<[Token]>),
    Lambda(Box<Lambda>),
    /// An opaque reference to another value; duplicates share the referenced value.
    Identity(Rc<Token>),
    Builtin(Builtin),

    /// The empty value. Also marks a slot whose token has been moved out by the parser.
    None,
}

impl Default for Token {
    fn default() -> Self {
        Token::None
    }
}

impl Token {
    /// Get the Token for the given keyword, if valid.
    pub fn lookup_keyword(s: &str) -> Option<Token> {
        match s {
            "define" => Some(Token::Define),
            "setq" => Some(Token::Setq),
            "lambda" => Some(Token::LambdaKeyword),
            "if" => Some(Token::If),
            "while" => Some(Token::While),
            "quote" => Some(Token::QuoteKeyword),
            "true" => Some(Token::True),
            "false" => Some(Token::False),
            _ => None,
        }
    }

    pub fn string(value: &str) -> Token {
        Token::String(Rc::from(value))
    }

    pub fn list(items: Vec<Token>) -> Token {
        Token::List(Rc::from(items))
    }

    /// Wrap a value in a shared, opaque reference.
    pub fn identity(value: Token) -> Token {
        Token::Identity(Rc::new(value))
    }

    pub fn from_bool(value: bool) -> Token {
        if value {
            Token::True
        } else {
            Token::False
        }
    }

    /// Copy this value.
    ///
    /// Scalars are copied, strings and lists get fresh allocations, identities keep pointing
    /// at the same value. Lambdas cannot be copied.
    pub fn duplicate(&self) -> Result<Token, LambdaNotCopyable> {
        use Token::*;

        let copy = match self {
            Plus => Plus,
            Minus => Minus,
            Star => Star,
            Slash => Slash,
            LeftParen => LeftParen,
            RightParen => RightParen,
            Quote => Quote,
            Define => Define,
            Setq => Setq,
            LambdaKeyword => LambdaKeyword,
            If => If,
            While => While,
            QuoteKeyword => QuoteKeyword,
            True => True,
            False => False,
            Identifier(name) => Identifier(name.clone()),
            Integer(value) => Integer(*value),
            Float(value) => Float(*value),
            String(value) => String(Rc::from(&**value)),
            List(items) => List(Rc::from(duplicate_all(items)?)),
            Lambda(_) => return Err(LambdaNotCopyable),
            Identity(target) => Identity(Rc::clone(target)),
            Builtin(builtin) => Builtin(*builtin),
            None => None,
        };

        Ok(copy)
    }

    pub fn typename(&self) -> &'static str {
        use Token::*;

        match self {
            Plus | Minus | Star | Slash => "operator",
            LeftParen | RightParen => "paren",
            Quote => "quote",
            Define | Setq | LambdaKeyword | If | While | QuoteKeyword => "keyword",
            True | False => "boolean",
            Identifier(_) => "symbol",
            Integer(_) => "integer",
            Float(_) => "float",
            String(_) => "string",
            List(_) => "list",
            Lambda(_) => "lambda",
            Identity(_) => "identity",
            Builtin(_) => "builtin",
            None => "nil",
        }
    }

    /// Strings and lists: the values `eq` compares by identity.
    pub fn is_complex(&self) -> bool {
        matches!(self, Token::String(_) | Token::List(_))
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Token::None)
    }

    /// Converts the given value to a string (in the format of a code object).
    ///
    /// # Examples
    /// ```rust
    /// use sprig_parser::token::Token;
    ///
    /// let value = Token::string("hello world");
    ///
    /// assert_eq!(value.to_code_string(), "\"hello world\"");
    /// ```
    pub fn to_code_string(&self) -> String {
        match self {
            Token::String(value) => format!("\"{}\"", value),
            value => value.to_string(),
        }
    }
}

/// Duplicate every token of a sequence.
pub fn duplicate_all(tokens: &[Token]) -> Result<Vec<Token>, LambdaNotCopyable> {
    tokens.iter().map(Token::duplicate).collect()
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Token::*;

        match self {
            Plus => write!(f, "+"),
            Minus => write!(f, "-"),
            Star => write!(f, "*"),
            Slash => write!(f, "/"),

            LeftParen => write!(f, "("),
            RightParen => write!(f, ")"),
            Quote => write!(f, "'"),

            Define => write!(f, "define"),
            Setq => write!(f, "setq"),
            LambdaKeyword => write!(f, "lambda"),
            If => write!(f, "if"),
            While => write!(f, "while"),
            QuoteKeyword => write!(f, "quote"),
            True => write!(f, "true"),
            False => write!(f, "false"),

            Identifier(name) => write!(f, "{}", name),
            Integer(value) => write!(f, "{}", value),
            // Always shows a decimal place, e.g. 1.0 instead of 1
            Float(value) => write!(f, "{}", ryu::Buffer::new().format(*value)),
            String(value) => write!(f, "{}", value),

            List(items) => write!(f, "{}", render_list(items)),
            Lambda(lambda) => write!(f, "{}", lambda),
            Identity(target) => write!(f, "#<identity {}>", target.to_code_string()),
            Builtin(builtin) => write!(f, "{}", builtin),

            None => write!(f, "nil"),
        }
    }
}

/// Quoted lists keep their paren tokens, so they are joined without padding inside the parens.
fn render_list(items: &[Token]) -> String {
    let mut rendered = String::new();
    let mut after_open = true;

    for item in items {
        if !after_open && !matches!(item, Token::RightParen) {
            rendered.push(' ');
        }
        rendered.push_str(&item.to_code_string());
        after_open = matches!(item, Token::LeftParen);
    }

    rendered
}
