use std::fmt::Display;

use crate::token::Token;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Plus,
    Minus,
    Star,
    Slash,
}

impl Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operator::Plus => write!(f, "+"),
            Operator::Minus => write!(f, "-"),
            Operator::Star => write!(f, "*"),
            Operator::Slash => write!(f, "/"),
        }
    }
}

/// One entry of a call's argument list.
#[derive(Debug, PartialEq)]
pub enum Argument {
    /// A token taken verbatim from the source (literal or identifier)
    Token(Token),
    /// The value of a sub-form, evaluated while the call was being parsed
    Evaluated(Token),
}

impl Display for Argument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Argument::Token(token) => write!(f, "{}", token.to_code_string()),
            Argument::Evaluated(value) => write!(f, "{}", value.to_code_string()),
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum Node {
    // Leaves
    Literal(Token),
    /// A quoted datum, held as a `Token::List`
    Quote(Token),
    Identifier(String),

    // Forms
    Call {
        callee: String,
        arguments: Vec<Argument>,
    },
    Binary {
        operator: Operator,
        left: Box<Node>,
        right: Box<Node>,
    },
    Define {
        name: String,
        value: Box<Node>,
    },
    Setq {
        name: String,
        value: Box<Node>,
    },
    Lambda {
        /// Raw parameter tokens
        parameters: Vec<Token>,
        /// Raw body tokens, parens included
        body: Vec<Token>,
    },
    If {
        condition: Box<Node>,
        consequence: Box<Node>,
        alternative: Box<Node>,
    },
    While {
        condition: Box<Node>,
        body: Box<Node>,
    },
}

impl Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use Node::*;

        match self {
            Literal(value) => write!(f, "{}", value.to_code_string()),
            Quote(datum) => write!(f, "'{}", datum),
            Identifier(name) => write!(f, "{}", name),

            Call { callee, arguments } => {
                write!(f, "({}", callee)?;
                for argument in arguments {
                    write!(f, " {}", argument)?;
                }
                write!(f, ")")
            }
            Binary {
                operator,
                left,
                right,
            } => write!(f, "({} {} {})", operator, left, right),
            Define { name, value } => {
                write!(f, "({} {} {})", Token::Define, name, value)
            }
            Setq { name, value } => write!(f, "({} {} {})", Token::Setq, name, value),
            Lambda { parameters, body } => write!(
                f,
                "({} ({}) {})",
                Token::LambdaKeyword,
                join(parameters),
                Token::list(
                    body.iter()
                        .filter_map(|token| token.duplicate().ok())
                        .collect()
                )
            ),
            If {
                condition,
                consequence,
                alternative,
            } => write!(
                f,
                "({} {} {} {})",
                Token::If,
                condition,
                consequence,
                alternative
            ),
            While { condition, body } => {
                write!(f, "({} {} {})", Token::While, condition, body)
            }
        }
    }
}

fn join(tokens: &[Token]) -> String {
    tokens
        .iter()
        .map(|token| token.to_string())
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use crate::ast::{Argument, Node, Operator};
    use crate::token::Token;

    #[test]
    fn display_forms() {
        let node = Node::Define {
            name: "area".into(),
            value: Box::new(Node::Lambda {
                parameters: vec![Token::Identifier("a".into())],
                body: vec![
                    Token::LeftParen,
                    Token::Star,
                    Token::Identifier("a".into()),
                    Token::Identifier("a".into()),
                    Token::RightParen,
                ],
            }),
        };
        assert_eq!(node.to_string(), "(define area (lambda (a) (* a a)))");

        let node = Node::If {
            condition: Box::new(Node::Call {
                callee: "eq".into(),
                arguments: vec![
                    Argument::Token(Token::Identifier("x".into())),
                    Argument::Evaluated(Token::string("s")),
                ],
            }),
            consequence: Box::new(Node::Binary {
                operator: Operator::Plus,
                left: Box::new(Node::Literal(Token::Integer(1))),
                right: Box::new(Node::Identifier("x".into())),
            }),
            alternative: Box::new(Node::Literal(Token::Float(2.0))),
        };
        assert_eq!(node.to_string(), "(if (eq x \"s\") (+ 1 x) 2.0)");
    }
}
