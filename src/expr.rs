//! Restricted arithmetic for calculated fields.
//!
//! An expression is checked against a character whitelist, tokenized, and
//! evaluated by a recursive-descent parser over `+ - * / ( )` and decimal
//! literals. Nothing else is ever interpreted.

use regex::Regex;
use std::borrow::Cow;
use std::sync::OnceLock;

use crate::error::ExpressionError;

const MAX_DEPTH: usize = 64;

/// True when every character is a digit, `+ - * / ( ) .` or whitespace.
pub fn is_whitelisted(expr: &str) -> bool {
    first_forbidden(expr).is_none()
}

fn first_forbidden(expr: &str) -> Option<char> {
    expr.chars().find(|c| {
        !(c.is_ascii_digit() || matches!(c, '+' | '-' | '*' | '/' | '(' | ')' | '.') || c.is_whitespace())
    })
}

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\[([^\[\]]+)\]").expect("placeholder pattern is valid"))
}

/// Replaces every `[name]` with `lookup(name)`. Unknown names are replaced by
/// whatever the lookup returns, so a failed lookup should return text that the
/// whitelist rejects.
pub fn substitute<'a, F>(expr: &'a str, mut lookup: F) -> Cow<'a, str>
where
    F: FnMut(&str) -> String,
{
    placeholder_pattern().replace_all(expr, |caps: &regex::Captures| lookup(caps[1].trim()))
}

// ============================================================================
// TOKENIZER
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

fn tokenize(expr: &str) -> Result<Vec<(usize, Token)>, ExpressionError> {
    let mut tokens = Vec::new();
    let mut chars = expr.char_indices().peekable();

    while let Some((pos, c)) = chars.next() {
        let token = match c {
            c if c.is_whitespace() => continue,
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => Token::Slash,
            '(' => Token::LParen,
            ')' => Token::RParen,
            c if c.is_ascii_digit() || c == '.' => {
                let mut literal = String::from(c);
                while let Some(&(_, next)) = chars.peek() {
                    if next.is_ascii_digit() || next == '.' {
                        literal.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let value = literal
                    .parse::<f64>()
                    .map_err(|_| ExpressionError::InvalidNumber(literal.clone()))?;
                Token::Number(value)
            }
            other => return Err(ExpressionError::Forbidden(other)),
        };
        tokens.push((pos, token));
    }

    Ok(tokens)
}

// ============================================================================
// PARSER
// ============================================================================

// expr   := term (('+' | '-') term)*
// term   := factor (('*' | '/') factor)*
// factor := ('+' | '-') factor | number | '(' expr ')'
struct Parser {
    tokens: Vec<(usize, Token)>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).map(|(_, t)| *t)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.peek();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn offset(&self) -> usize {
        self.tokens.get(self.pos).map(|(p, _)| *p).unwrap_or(0)
    }

    fn expr(&mut self) -> Result<f64, ExpressionError> {
        let mut value = self.term()?;
        while let Some(op @ (Token::Plus | Token::Minus)) = self.peek() {
            self.advance();
            let rhs = self.term()?;
            value = if op == Token::Plus { value + rhs } else { value - rhs };
        }
        Ok(value)
    }

    fn term(&mut self) -> Result<f64, ExpressionError> {
        let mut value = self.factor()?;
        while let Some(op @ (Token::Star | Token::Slash)) = self.peek() {
            self.advance();
            let rhs = self.factor()?;
            value = if op == Token::Star { value * rhs } else { value / rhs };
        }
        Ok(value)
    }

    fn factor(&mut self) -> Result<f64, ExpressionError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ExpressionError::TooDeep(MAX_DEPTH));
        }
        let offset = self.offset();
        let value = match self.advance() {
            Some(Token::Number(n)) => Ok(n),
            Some(Token::Minus) => self.factor().map(|v| -v),
            Some(Token::Plus) => self.factor(),
            Some(Token::LParen) => {
                let inner = self.expr()?;
                match self.advance() {
                    Some(Token::RParen) => Ok(inner),
                    Some(_) => Err(ExpressionError::UnexpectedToken(offset)),
                    None => Err(ExpressionError::UnexpectedEnd),
                }
            }
            Some(_) => Err(ExpressionError::UnexpectedToken(offset)),
            None => Err(ExpressionError::UnexpectedEnd),
        };
        self.depth -= 1;
        value
    }
}

/// Whitelist-checks and evaluates `expr`. Division by zero and other
/// non-finite results are errors.
pub fn evaluate(expr: &str) -> Result<f64, ExpressionError> {
    if let Some(c) = first_forbidden(expr) {
        return Err(ExpressionError::Forbidden(c));
    }
    let tokens = tokenize(expr)?;
    if tokens.is_empty() {
        return Err(ExpressionError::Empty);
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let value = parser.expr()?;
    if parser.pos < parser.tokens.len() {
        return Err(ExpressionError::UnexpectedToken(parser.offset()));
    }
    if !value.is_finite() {
        return Err(ExpressionError::NonFinite);
    }
    Ok(value)
}
