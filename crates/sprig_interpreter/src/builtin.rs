use std::{mem, rc::Rc};

use sprig_parser::token::{Builtin, Token};

use crate::error::RuntimeError;

/// Apply a builtin to a materialized argument vector, slot 0 being the callee name.
pub fn apply(builtin: Builtin, args: &[Token]) -> Result<Token, RuntimeError> {
    match builtin {
        Builtin::Car => {
            let list = list_argument(builtin, args)?;
            match list.get(1) {
                Some(first) => Ok(first.duplicate()?),
                None => Err(RuntimeError::EmptyList(builtin)),
            }
        }
        Builtin::Cdr => {
            let list = list_argument(builtin, args)?;

            // Keep the opening paren in slot 0, drop the first element
            let mut rest = Vec::with_capacity(list.len().saturating_sub(1));
            if let Some(head) = list.first() {
                rest.push(head.duplicate()?);
            }
            for item in list.iter().skip(2) {
                rest.push(item.duplicate()?);
            }

            Ok(Token::list(rest))
        }
        Builtin::Eq => {
            check_arity(builtin, args, 2)?;
            eq(&args[1], &args[2]).map(Token::from_bool)
        }
        Builtin::Equal => {
            check_arity(builtin, args, 2)?;
            equal(&args[1], &args[2]).map(Token::from_bool)
        }
    }
}

fn check_arity(builtin: Builtin, args: &[Token], expected: usize) -> Result<(), RuntimeError> {
    let got = args.len().saturating_sub(1);
    if got != expected {
        return Err(RuntimeError::BadArity {
            name: builtin.name().to_owned(),
            expected,
            got,
        });
    }

    Ok(())
}

fn list_argument(builtin: Builtin, args: &[Token]) -> Result<&[Token], RuntimeError> {
    check_arity(builtin, args, 1)?;

    match &args[1] {
        Token::List(items) => Ok(&items[..]),
        other => Err(RuntimeError::InvalidArgumentType {
            builtin,
            typename: other.typename(),
        }),
    }
}

/// Identity comparison for strings and lists, value comparison for everything else.
pub fn eq(left: &Token, right: &Token) -> Result<bool, RuntimeError> {
    let result = match (left, right) {
        (Token::String(a), Token::String(b)) => Rc::ptr_eq(a, b),
        (Token::List(a), Token::List(b)) => Rc::ptr_eq(a, b),
        // A string is never the same allocation as a list
        (a, b) if a.is_complex() && b.is_complex() => false,

        (Token::Integer(a), Token::Integer(b)) => a == b,
        (Token::Integer(a), Token::Float(b)) => (*a as f64) == *b,
        (Token::Float(a), Token::Integer(b)) => *a == (*b as f64),
        (Token::Float(a), Token::Float(b)) => a == b,

        (Token::True | Token::False, Token::True | Token::False) => left == right,
        (Token::Identifier(a), Token::Identifier(b)) => a == b,
        (Token::Builtin(a), Token::Builtin(b)) => a == b,
        (Token::Identity(a), Token::Identity(b)) => Rc::ptr_eq(a, b),

        (a, b) if is_structural(a) && mem::discriminant(a) == mem::discriminant(b) => true,

        _ => {
            return Err(RuntimeError::Incomparable(
                left.typename(),
                right.typename(),
            ))
        }
    };

    Ok(result)
}

/// Content comparison for strings and lists, `eq` for everything else.
pub fn equal(left: &Token, right: &Token) -> Result<bool, RuntimeError> {
    match (left, right) {
        (Token::String(a), Token::String(b)) => Ok(a == b),
        (Token::List(a), Token::List(b)) => {
            if a.len() != b.len() {
                return Ok(false);
            }

            for (x, y) in a.iter().zip(b.iter()) {
                if !equal(x, y)? {
                    return Ok(false);
                }
            }

            Ok(true)
        }
        _ => eq(left, right),
    }
}

fn is_structural(token: &Token) -> bool {
    use Token::*;

    matches!(
        token,
        Plus | Minus
            | Star
            | Slash
            | LeftParen
            | RightParen
            | Quote
            | Define
            | Setq
            | LambdaKeyword
            | If
            | While
            | QuoteKeyword
            | None
    )
}
