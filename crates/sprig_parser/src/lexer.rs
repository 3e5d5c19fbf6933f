use std::iter::Peekable;
use std::num::{ParseFloatError, ParseIntError};
use std::str::Chars;

use thiserror::Error;

use crate::span::{BytePos, Span, WithSpan};
use crate::token::Token;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexError {
    #[error("unknown character '{0}' ignored")]
    UnknownCharacter(char),
    #[error("expected closing \" of string literal but reached the end of the line")]
    StringNotClosed,
    #[error("'.' is not allowed in the hex literal {0}")]
    DotInHexLiteral(String),
    #[error("invalid float: {0}")]
    InvalidFloat(ParseFloatError),
    #[error("invalid int: {0}")]
    InvalidInt(ParseIntError),
}

type LexResult<T> = Result<T, LexError>;

/// Everything the lexer produced for one line.
#[derive(Debug, Default, PartialEq)]
pub struct Tokenized {
    pub tokens: Vec<Token>,
    pub errors: Vec<WithSpan<LexError>>,
}

/// Tokenize one line of source. Lexing stops at the first newline.
pub fn tokenize(line: &str) -> Tokenized {
    let mut tokenized = Tokenized::default();

    for result in Lexer::new(line) {
        match result {
            Ok(token) => tokenized.tokens.push(token.value),
            Err(error) => tokenized.errors.push(error),
        }
    }

    tokenized
}

pub struct Lexer<'a> {
    input_iter: Peekable<Chars<'a>>,
    current_position: BytePos,
    /// An error found while reading a token that was still produced
    pending_error: Option<WithSpan<LexError>>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Lexer<'a> {
        let mut lexer = Lexer {
            input_iter: input.chars().peekable(),
            current_position: BytePos::new(0),
            pending_error: None,
        };

        // Blank lines before the first token are skipped entirely
        while let Some(&c) = lexer.peek_char() {
            if c.is_whitespace() {
                lexer.read_char();
            } else {
                break;
            }
        }

        lexer
    }

    /// Consume the next character from the list.
    fn read_char(&mut self) -> Option<char> {
        let next = self.input_iter.next();
        if let Some(c) = next {
            self.current_position = self.current_position.shift(c);
        }
        next
    }

    /// Get the next character from the list without consuming it.
    fn peek_char(&mut self) -> Option<&char> {
        self.input_iter.peek()
    }

    /// Look `n` characters past the next one without consuming anything.
    fn peek_nth(&self, n: usize) -> Option<char> {
        self.input_iter.clone().nth(n)
    }

    /// Consume whitespace until a non-whitespace character or a newline is found.
    fn skip_whitespace(&mut self) {
        while let Some(&c) = self.peek_char() {
            if c.is_whitespace() && c != '\n' {
                self.read_char();
            } else {
                break;
            }
        }
    }

    /// Read everything up to the closing `"`. No escape sequences.
    fn read_string(&mut self) -> LexResult<Token> {
        let mut str = String::new();

        loop {
            match self.peek_char() {
                Some('"') => {
                    self.read_char();
                    break;
                }
                Some('\n') | None => return Err(LexError::StringNotClosed),
                Some(&ch) => {
                    str.push(ch);
                    self.read_char();
                }
            }
        }

        Ok(Token::string(&str))
    }

    /// Read a numeric literal whose first digit (and optional sign) have been consumed.
    fn read_number(&mut self, sign: Option<char>, first: char) -> LexResult<Token> {
        let mut digits = String::new();
        digits.push(first);

        let mut hex = false;
        let mut seen_dot = false;

        if first == '0'
            && self.peek_char() == Some(&'x')
            && self.peek_nth(1).map_or(false, |c| c.is_ascii_hexdigit())
        {
            self.read_char();
            hex = true;
            // The leading 0 carries no value in hex
            digits.clear();
        }

        while let Some(&ch) = self.peek_char() {
            if hex && ch.is_ascii_hexdigit() || !hex && is_digit(ch) {
                digits.push(ch);
                self.read_char();
            } else if ch == '.' {
                if hex {
                    // Drop the dot and report it, but keep the literal read so far
                    let start = self.current_position;
                    self.read_char();
                    let span = Span::new(start, self.current_position);
                    self.pending_error = Some(WithSpan::new(
                        LexError::DotInHexLiteral(format!("0x{}", digits)),
                        span,
                    ));
                    break;
                } else if !seen_dot {
                    seen_dot = true;
                    digits.push(ch);
                    self.read_char();
                } else {
                    break;
                }
            } else {
                break;
            }
        }

        let mut literal = String::new();
        if let Some(sign) = sign {
            literal.push(sign);
        }
        literal.push_str(&digits);

        if hex {
            i64::from_str_radix(&literal, 16)
                .map(Token::Integer)
                .map_err(LexError::InvalidInt)
        } else if seen_dot {
            literal
                .parse()
                .map(Token::Float)
                .map_err(LexError::InvalidFloat)
        } else {
            literal
                .parse()
                .map(Token::Integer)
                .map_err(LexError::InvalidInt)
        }
    }

    /// Read the current and following characters as an identifier or a keyword (if it exists).
    fn read_identifier_or_keyword(&mut self, first: char) -> Token {
        let mut identifier = String::new();
        identifier.push(first);

        while let Some(&ch) = self.peek_char() {
            if is_identifier_char(ch) {
                identifier.push(ch);
                self.read_char();
            } else {
                break;
            }
        }

        match Token::lookup_keyword(&identifier) {
            Some(keyword_token) => keyword_token,
            None => Token::Identifier(identifier),
        }
    }

    /// Read a new token from the characters list, `None` once the line is exhausted.
    pub fn next_token(&mut self) -> Option<Result<WithSpan<Token>, WithSpan<LexError>>> {
        if let Some(error) = self.pending_error.take() {
            return Some(Err(error));
        }

        self.skip_whitespace();

        let initial_position = self.current_position;

        let c = match self.peek_char() {
            Some('\n') | None => return None,
            Some(&c) => c,
        };
        self.read_char();

        let token = match c {
            '(' => Ok(Token::LeftParen),
            ')' => Ok(Token::RightParen),

            // A sign directly followed by a digit starts a number
            '+' | '-' => match self.peek_char() {
                Some(&digit) if is_digit(digit) => {
                    self.read_char();
                    self.read_number(Some(c), digit)
                }
                _ if c == '+' => Ok(Token::Plus),
                _ => Ok(Token::Minus),
            },
            '*' => Ok(Token::Star),
            '/' => Ok(Token::Slash),

            '\'' => Ok(Token::Quote),
            '"' => self.read_string(),

            c if is_identifier_start(c) => Ok(self.read_identifier_or_keyword(c)),
            c if is_digit(c) => self.read_number(None, c),

            _ => Err(LexError::UnknownCharacter(c)),
        };

        let span = Span::new(initial_position, self.current_position);

        Some(match token {
            Ok(token) => Ok(WithSpan::new(token, span)),
            Err(error) => Err(WithSpan::new(error, span)),
        })
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<WithSpan<Token>, WithSpan<LexError>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}

/// Whether or not the given character is a digit
fn is_digit(c: char) -> bool {
    c.is_ascii_digit()
}

/// Whether or not the given character may start an identifier
fn is_identifier_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

/// Whether or not the given character is valid in an identifier
fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
