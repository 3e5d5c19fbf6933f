use std::mem;

use thiserror::Error;

use crate::ast::{Argument, Node, Operator};
use crate::token::Token;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("no matching ')'")]
    NoMatchingParen,
    #[error("unexpected ')'")]
    UnexpectedParen,
    #[error("{0} must be followed by a symbol name")]
    MissingSymbol(&'static str),
    #[error("lambda is missing its parameter list")]
    MissingParameterList,
    #[error("lambda is missing its body")]
    MissingBody,
    #[error("lambda parameters must be symbols but got `{0}`")]
    InvalidParameter(String),
    #[error("expected a form but reached the end of the input")]
    UnexpectedEnd,
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Evaluates a sub-form as soon as it has been parsed.
///
/// The arguments of a call are evaluated while the call itself is being parsed, so the parser
/// needs a way back into the evaluator.
pub trait Evaluate {
    fn evaluate(&mut self, node: &Node) -> Token;
}

/// Parse one form of `tokens` starting at `cursor`, and move `cursor` past it.
pub fn parse(
    tokens: &mut [Token],
    cursor: &mut usize,
    evaluator: &mut dyn Evaluate,
) -> ParseResult<Node> {
    let mut parser = Parser::starting_at(tokens, *cursor, evaluator);
    let result = parser.parse();
    *cursor = parser.cursor();
    result
}

pub struct Parser<'t, 'e> {
    /// Payload tokens are moved out as they are parsed, leaving `Token::None` behind
    tokens: &'t mut [Token],
    cursor: usize,
    /// Number of currently open parens
    depth: usize,
    evaluator: &'e mut dyn Evaluate,
}

impl<'t, 'e> Parser<'t, 'e> {
    pub fn new(tokens: &'t mut [Token], evaluator: &'e mut dyn Evaluate) -> Self {
        Self::starting_at(tokens, 0, evaluator)
    }

    pub fn starting_at(
        tokens: &'t mut [Token],
        cursor: usize,
        evaluator: &'e mut dyn Evaluate,
    ) -> Self {
        Parser {
            tokens,
            cursor,
            depth: 0,
            evaluator,
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn is_at_end(&self) -> bool {
        self.cursor >= self.tokens.len()
    }

    /// Forget about any paren left open by a form that failed to parse.
    pub fn reset(&mut self) {
        self.depth = 0;
    }

    /// Parse one top-level form.
    pub fn parse(&mut self) -> ParseResult<Node> {
        let node = self.parse_form()?;

        if let Some(Token::RightParen) = self.current() {
            return Err(ParseError::UnexpectedParen);
        }

        Ok(node)
    }

    fn current(&self) -> Option<&Token> {
        self.tokens.get(self.cursor)
    }

    /// Move the current token out of the stream and advance.
    fn take(&mut self) -> ParseResult<Token> {
        let slot = self
            .tokens
            .get_mut(self.cursor)
            .ok_or(ParseError::UnexpectedEnd)?;
        self.cursor += 1;
        Ok(mem::take(slot))
    }

    fn take_identifier(&mut self) -> Option<String> {
        if !matches!(self.current(), Some(Token::Identifier(_))) {
            return None;
        }

        match self.take() {
            Ok(Token::Identifier(name)) => Some(name),
            _ => None,
        }
    }

    /// Consume the `)` closing the innermost open paren.
    fn close(&mut self) -> ParseResult<()> {
        match self.current() {
            Some(Token::RightParen) if self.depth > 0 => {
                self.depth -= 1;
                self.cursor += 1;
                Ok(())
            }
            Some(Token::RightParen) => Err(ParseError::UnexpectedParen),
            _ => Err(ParseError::NoMatchingParen),
        }
    }

    fn parse_form(&mut self) -> ParseResult<Node> {
        let token = match self.current() {
            Some(token) => token,
            None if self.depth > 0 => return Err(ParseError::NoMatchingParen),
            None => return Err(ParseError::UnexpectedEnd),
        };

        match token {
            Token::LeftParen => self.parse_parenthesized(),
            Token::RightParen => Err(ParseError::UnexpectedParen),

            Token::Plus => self.parse_binary(Operator::Plus),
            Token::Minus => self.parse_binary(Operator::Minus),
            Token::Star => self.parse_binary(Operator::Star),
            Token::Slash => self.parse_binary(Operator::Slash),

            Token::Quote => {
                self.cursor += 1;
                self.parse_quoted()
            }
            Token::QuoteKeyword => {
                self.cursor += 1;
                let node = self.parse_quoted()?;
                self.close()?;
                Ok(node)
            }

            Token::Define => {
                let (name, value) = self.parse_assignment("define")?;
                Ok(Node::Define { name, value })
            }
            Token::Setq => {
                let (name, value) = self.parse_assignment("setq")?;
                Ok(Node::Setq { name, value })
            }
            Token::LambdaKeyword => self.parse_lambda(),
            Token::If => self.parse_if(),
            Token::While => self.parse_while(),

            Token::Identifier(_) => self.parse_identifier(),

            Token::Integer(_)
            | Token::Float(_)
            | Token::String(_)
            | Token::True
            | Token::False => Ok(Node::Literal(self.take()?)),

            // Runtime values only show up here when an embedder put them in the stream
            Token::List(_)
            | Token::Lambda(_)
            | Token::Identity(_)
            | Token::Builtin(_)
            | Token::None => Ok(Node::Literal(self.take()?)),
        }
    }

    fn parse_parenthesized(&mut self) -> ParseResult<Node> {
        let outer_depth = self.depth;
        self.depth += 1;
        self.cursor += 1;

        let node = self.parse_form()?;

        // Operators, keywords and calls consume their own `)`
        if self.depth > outer_depth {
            self.close()?;
        }

        Ok(node)
    }

    fn parse_binary(&mut self, operator: Operator) -> ParseResult<Node> {
        self.cursor += 1;

        let left = self.parse_form()?;
        let right = self.parse_form()?;
        self.close()?;

        Ok(Node::Binary {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    /// Collect a datum verbatim, up to the paren that brings the depth back to where it started.
    ///
    /// A quote inside the datum is collected as a plain token.
    fn parse_quoted(&mut self) -> ParseResult<Node> {
        let entry_depth = self.depth;
        let mut datum = Vec::new();

        loop {
            match self.current() {
                None => break,
                Some(Token::RightParen) if self.depth == entry_depth => {
                    return Err(ParseError::UnexpectedParen)
                }
                Some(_) => {}
            }

            let token = self.take()?;
            match token {
                Token::LeftParen => self.depth += 1,
                Token::RightParen => self.depth -= 1,
                _ => {}
            }
            datum.push(token);

            if self.depth == entry_depth {
                break;
            }
        }

        if self.depth != entry_depth {
            return Err(ParseError::NoMatchingParen);
        }
        if datum.is_empty() {
            return Err(ParseError::UnexpectedEnd);
        }

        Ok(Node::Quote(Token::list(datum)))
    }

    /// `define` and `setq`: a symbol, a value form and the closing paren.
    fn parse_assignment(&mut self, keyword: &'static str) -> ParseResult<(String, Box<Node>)> {
        self.cursor += 1;

        let name = self
            .take_identifier()
            .ok_or(ParseError::MissingSymbol(keyword))?;
        let value = self.parse_form()?;
        self.close()?;

        Ok((name, Box::new(value)))
    }

    /// Parameters and body are stored as raw tokens and parsed on every call.
    fn parse_lambda(&mut self) -> ParseResult<Node> {
        self.cursor += 1;

        if !matches!(self.current(), Some(Token::LeftParen)) {
            return Err(ParseError::MissingParameterList);
        }
        self.cursor += 1;

        let mut parameters = Vec::new();
        loop {
            match self.current() {
                None => return Err(ParseError::NoMatchingParen),
                Some(Token::RightParen) => {
                    self.cursor += 1;
                    break;
                }
                Some(Token::Identifier(_)) => parameters.push(self.take()?),
                Some(other) => return Err(ParseError::InvalidParameter(other.to_string())),
            }
        }

        if !matches!(self.current(), Some(Token::LeftParen)) {
            return Err(ParseError::MissingBody);
        }

        let entry_depth = self.depth;
        let mut body = Vec::new();
        loop {
            if self.is_at_end() {
                return Err(ParseError::NoMatchingParen);
            }

            let token = self.take()?;
            match token {
                Token::LeftParen => self.depth += 1,
                Token::RightParen => self.depth -= 1,
                _ => {}
            }
            body.push(token);

            if self.depth == entry_depth {
                break;
            }
        }

        self.close()?;

        Ok(Node::Lambda { parameters, body })
    }

    fn parse_if(&mut self) -> ParseResult<Node> {
        self.cursor += 1;

        let condition = self.parse_form()?;
        let consequence = self.parse_form()?;
        let alternative = self.parse_form()?;
        self.close()?;

        Ok(Node::If {
            condition: Box::new(condition),
            consequence: Box::new(consequence),
            alternative: Box::new(alternative),
        })
    }

    fn parse_while(&mut self) -> ParseResult<Node> {
        self.cursor += 1;

        let condition = self.parse_form()?;
        let body = self.parse_form()?;
        self.close()?;

        Ok(Node::While {
            condition: Box::new(condition),
            body: Box::new(body),
        })
    }

    /// An identifier right after `(` is a call, anywhere else a variable reference.
    fn parse_identifier(&mut self) -> ParseResult<Node> {
        let in_call_position = self.cursor > 0
            && matches!(self.tokens.get(self.cursor - 1), Some(Token::LeftParen));

        let name = self.take_identifier().ok_or(ParseError::UnexpectedEnd)?;

        if !in_call_position {
            return Ok(Node::Identifier(name));
        }

        let mut arguments = Vec::new();
        loop {
            match self.current() {
                None => return Err(ParseError::NoMatchingParen),
                Some(Token::RightParen) => break,
                Some(Token::LeftParen) | Some(Token::Quote) => {
                    let node = self.parse_form()?;
                    let value = self.evaluator.evaluate(&node);
                    arguments.push(Argument::Evaluated(value));
                }
                Some(_) => arguments.push(Argument::Token(self.take()?)),
            }
        }
        self.close()?;

        Ok(Node::Call {
            callee: name,
            arguments,
        })
    }
}
