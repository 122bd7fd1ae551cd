//! Bounded grammar for serialized row lists.
//!
//! Drivers that stringify their rows produce text such as
//! `[('A', Decimal('12.50'), datetime.date(2024, 1, 5), None)]`. This module
//! parses exactly that shape: lists, tuples, quoted strings, numbers, `None`,
//! `True`/`False`, `Decimal(..)` and `datetime.date(..)`. Anything else is a
//! [`LiteralError`] carrying the byte offset where parsing stopped.

use std::fmt;

use chrono::NaiveDate;
use sqlscribe_core::Cell;
use thiserror::Error;

use crate::cells::is_numeric;

/// Deepest list or tuple nesting accepted before the input is rejected.
pub const MAX_DEPTH: usize = 64;

/// Where and why the grammar rejected the input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason} at byte {offset}")]
pub struct LiteralError {
    pub offset: usize,
    pub reason: String,
}

/// A parsed value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    List(Vec<Literal>),
    Tuple(Vec<Literal>),
    Scalar(Cell),
}

impl Literal {
    /// Elements of a list or tuple.
    pub fn items(&self) -> Option<&[Literal]> {
        match self {
            Literal::List(items) | Literal::Tuple(items) => Some(items),
            Literal::Scalar(_) => None,
        }
    }

    /// The scalar cell, or the literal text of a nested sequence.
    pub fn to_cell(&self) -> Cell {
        match self {
            Literal::Scalar(cell) => cell.clone(),
            nested => Cell::Text(nested.to_string()),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::List(items) => {
                write!(f, "[")?;
                write_items(f, items)?;
                write!(f, "]")
            }
            Literal::Tuple(items) => {
                write!(f, "(")?;
                write_items(f, items)?;
                if items.len() == 1 {
                    write!(f, ",")?;
                }
                write!(f, ")")
            }
            Literal::Scalar(cell) => write_scalar(f, cell),
        }
    }
}

fn write_items(f: &mut fmt::Formatter<'_>, items: &[Literal]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

/// Write one cell in the syntax [`parse`] accepts.
pub(crate) fn write_scalar(f: &mut impl fmt::Write, cell: &Cell) -> fmt::Result {
    match cell {
        Cell::Null => write!(f, "None"),
        Cell::Bool(true) => write!(f, "True"),
        Cell::Bool(false) => write!(f, "False"),
        Cell::Number(n) if is_numeric(n) => write!(f, "{n}"),
        Cell::Number(n) => {
            write!(f, "Decimal(")?;
            write_quoted(f, n)?;
            write!(f, ")")
        }
        Cell::Text(s) => write_quoted(f, s),
    }
}

fn write_quoted(f: &mut impl fmt::Write, text: &str) -> fmt::Result {
    f.write_char('\'')?;
    for c in text.chars() {
        match c {
            '\\' => f.write_str("\\\\")?,
            '\'' => f.write_str("\\'")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            c => f.write_char(c)?,
        }
    }
    f.write_char('\'')
}

/// Parse one complete literal; trailing input is an error.
pub fn parse(input: &str) -> Result<Literal, LiteralError> {
    let mut parser = Parser {
        input,
        pos: 0,
        depth: 0,
    };
    let value = parser.value()?;
    parser.skip_whitespace();
    if parser.pos < input.len() {
        return Err(parser.error("unexpected trailing input"));
    }
    Ok(value)
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn error(&self, reason: impl Into<String>) -> LiteralError {
        LiteralError {
            offset: self.pos,
            reason: reason.into(),
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), LiteralError> {
        self.skip_whitespace();
        match self.peek() {
            Some(c) if c == expected => {
                self.bump();
                Ok(())
            }
            Some(c) => Err(self.error(format!("expected '{expected}', found '{c}'"))),
            None => Err(self.error(format!("expected '{expected}', found end of input"))),
        }
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        let Some(after) = self.rest().strip_prefix(keyword) else {
            return false;
        };
        if after
            .chars()
            .next()
            .is_some_and(|c| c.is_alphanumeric() || c == '_')
        {
            return false;
        }
        self.pos += keyword.len();
        true
    }

    fn value(&mut self) -> Result<Literal, LiteralError> {
        self.skip_whitespace();
        match self.peek() {
            Some('[') => {
                let (items, _) = self.nested(']')?;
                Ok(Literal::List(items))
            }
            Some('(') => {
                let (mut items, trailing_comma) = self.nested(')')?;
                // `(x)` is a parenthesized value, `(x,)` a one-element tuple.
                if items.len() == 1 && !trailing_comma {
                    Ok(items.remove(0))
                } else {
                    Ok(Literal::Tuple(items))
                }
            }
            Some('\'' | '"') => Ok(Literal::Scalar(Cell::Text(self.string()?))),
            Some(c) if c.is_ascii_digit() || c == '-' || c == '+' || c == '.' => {
                Ok(Literal::Scalar(Cell::Number(self.number()?)))
            }
            Some(_) => self.word(),
            None => Err(self.error("unexpected end of input")),
        }
    }

    /// Opening bracket already peeked; parses its contents with the depth bound.
    fn nested(&mut self, close: char) -> Result<(Vec<Literal>, bool), LiteralError> {
        if self.depth >= MAX_DEPTH {
            return Err(self.error("nesting too deep"));
        }
        self.bump();
        self.depth += 1;
        let sequence = self.sequence(close);
        self.depth -= 1;
        sequence
    }

    /// Comma-separated values up to `close`; reports whether a trailing comma was seen.
    fn sequence(&mut self, close: char) -> Result<(Vec<Literal>, bool), LiteralError> {
        let mut items = Vec::new();
        let mut trailing_comma = false;
        loop {
            self.skip_whitespace();
            if self.peek() == Some(close) {
                self.bump();
                return Ok((items, trailing_comma));
            }
            items.push(self.value()?);
            self.skip_whitespace();
            match self.peek() {
                Some(',') => {
                    self.bump();
                    trailing_comma = true;
                }
                Some(c) if c == close => {
                    self.bump();
                    return Ok((items, false));
                }
                Some(c) => return Err(self.error(format!("expected ',' or '{close}', found '{c}'"))),
                None => return Err(self.error(format!("unterminated sequence, expected '{close}'"))),
            }
        }
    }

    fn string(&mut self) -> Result<String, LiteralError> {
        let quote = self.bump().ok_or_else(|| self.error("expected string"))?;
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error("unterminated string")),
                Some(c) if c == quote => return Ok(out),
                Some('\\') => match self.bump() {
                    Some('n') => out.push('\n'),
                    Some('r') => out.push('\r'),
                    Some('t') => out.push('\t'),
                    Some('0') => out.push('\0'),
                    Some(c @ ('\\' | '\'' | '"')) => out.push(c),
                    Some(c) => {
                        out.push('\\');
                        out.push(c);
                    }
                    None => return Err(self.error("unterminated escape")),
                },
                Some(c) => out.push(c),
            }
        }
    }

    fn number(&mut self) -> Result<String, LiteralError> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            // A sign only starts the number or follows an exponent marker.
            let sign_allowed = self.pos == start || self.input[..self.pos].ends_with(['e', 'E']);
            let accepted =
                c.is_ascii_alphanumeric() || c == '.' || (matches!(c, '+' | '-') && sign_allowed);
            if !accepted {
                break;
            }
            self.bump();
        }
        let text = &self.input[start..self.pos];
        if is_numeric(text) {
            Ok(text.to_string())
        } else {
            self.pos = start;
            Err(self.error(format!("invalid number '{text}'")))
        }
    }

    fn word(&mut self) -> Result<Literal, LiteralError> {
        if self.eat_keyword("None") {
            return Ok(Literal::Scalar(Cell::Null));
        }
        if self.eat_keyword("True") {
            return Ok(Literal::Scalar(Cell::Bool(true)));
        }
        if self.eat_keyword("False") {
            return Ok(Literal::Scalar(Cell::Bool(false)));
        }
        if self.eat_keyword("Decimal") {
            return self.decimal();
        }
        if self.rest().starts_with("datetime.date(") {
            self.pos += "datetime.date".len();
            return self.date();
        }
        Err(self.error("unsupported literal"))
    }

    fn decimal(&mut self) -> Result<Literal, LiteralError> {
        self.expect('(')?;
        self.skip_whitespace();
        let value = match self.peek() {
            Some('\'' | '"') => self.string()?,
            _ => self.number()?,
        };
        self.expect(')')?;
        Ok(Literal::Scalar(Cell::Number(value)))
    }

    fn date(&mut self) -> Result<Literal, LiteralError> {
        self.expect('(')?;
        let year = self.integer()?;
        self.expect(',')?;
        let month = self.integer()?;
        self.expect(',')?;
        let day = self.integer()?;
        self.expect(')')?;
        Ok(Literal::Scalar(Cell::Text(format_date(year, month, day))))
    }

    fn integer(&mut self) -> Result<&'a str, LiteralError> {
        self.skip_whitespace();
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }
        if self.pos == start {
            return Err(self.error("expected integer"));
        }
        Ok(&self.input[start..self.pos])
    }
}

/// `YYYY-MM-DD` for a date constructor's arguments.
///
/// Out-of-range dates are still rendered, zero-padded, so the cell keeps what
/// the driver printed.
pub fn format_date(year: &str, month: &str, day: &str) -> String {
    let valid = match (
        year.parse::<i32>(),
        month.parse::<u32>(),
        day.parse::<u32>(),
    ) {
        (Ok(y), Ok(m), Ok(d)) => NaiveDate::from_ymd_opt(y, m, d),
        _ => None,
    };
    match valid {
        Some(date) => date.format("%Y-%m-%d").to_string(),
        None => format!("{year}-{month:0>2}-{day:0>2}"),
    }
}
