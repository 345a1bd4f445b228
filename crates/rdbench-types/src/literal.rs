//! Quality-point literals.
//!
//! Runners label quality points with numeric-looking text: `22`, `22.5`,
//! or tuples such as `(22, 25)` for multi-layer encodes. Ordering and
//! layer-combination work on the parsed value, never on the text.

use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LiteralError {
    #[error("empty quality-point literal")]
    Empty,

    #[error("unexpected character {ch:?} at offset {offset} in {input:?}")]
    UnexpectedChar {
        input: String,
        offset: usize,
        ch: char,
    },

    #[error("unexpected end of input in {0:?}")]
    UnexpectedEnd(String),

    #[error("invalid number {0:?}")]
    InvalidNumber(String),

    #[error("quality-point literal nests deeper than {max} levels")]
    TooDeep { max: usize },
}

/// Deepest bracket nesting accepted in a quality-point literal.
pub const MAX_LITERAL_DEPTH: usize = 32;

/// A parsed quality-point key.
///
/// Total order: numbers compare numerically (ints and floats mix), every
/// number sorts before every tuple, tuples compare element-wise.
#[derive(Debug, Clone)]
pub enum QualityValue {
    Int(i64),
    Float(f64),
    Tuple(Vec<QualityValue>),
}

impl QualityValue {
    pub fn parse(input: &str) -> Result<Self, LiteralError> {
        let mut p = Parser {
            input,
            chars: input.char_indices().peekable(),
            depth: 0,
        };
        p.skip_ws();
        if p.chars.peek().is_none() {
            return Err(LiteralError::Empty);
        }
        let value = p.value()?;
        p.skip_ws();
        match p.chars.next() {
            None => Ok(value),
            Some((offset, ch)) => Err(p.unexpected(offset, ch)),
        }
    }

    pub fn empty_tuple() -> Self {
        QualityValue::Tuple(Vec::new())
    }

    /// Tuple/number union: tuples concatenate, numbers join as elements.
    pub fn concat(self, other: QualityValue) -> QualityValue {
        let mut items = self.into_items();
        items.extend(other.into_items());
        QualityValue::Tuple(items)
    }

    fn into_items(self) -> Vec<QualityValue> {
        match self {
            QualityValue::Tuple(items) => items,
            number => vec![number],
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            QualityValue::Int(i) => Some(*i as f64),
            QualityValue::Float(f) => Some(*f),
            QualityValue::Tuple(_) => None,
        }
    }
}

impl Ord for QualityValue {
    fn cmp(&self, other: &Self) -> Ordering {
        use QualityValue::*;
        match (self, other) {
            (Int(a), Int(b)) => a.cmp(b),
            (Tuple(a), Tuple(b)) => a.cmp(b),
            (Tuple(_), _) => Ordering::Greater,
            (_, Tuple(_)) => Ordering::Less,
            (a, b) => {
                let (a, b) = (a.as_f64().unwrap_or_default(), b.as_f64().unwrap_or_default());
                a.total_cmp(&b)
            }
        }
    }
}

impl PartialOrd for QualityValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for QualityValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QualityValue {}

impl fmt::Display for QualityValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QualityValue::Int(i) => write!(f, "{i}"),
            QualityValue::Float(x) => write!(f, "{x:?}"),
            QualityValue::Tuple(items) => {
                f.write_str("(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                if items.len() == 1 {
                    f.write_str(",")?;
                }
                f.write_str(")")
            }
        }
    }
}

impl std::str::FromStr for QualityValue {
    type Err = LiteralError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QualityValue::parse(s)
    }
}

struct Parser<'a> {
    input: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    depth: usize,
}

impl Parser<'_> {
    fn skip_ws(&mut self) {
        while self.chars.next_if(|(_, c)| c.is_whitespace()).is_some() {}
    }

    fn unexpected(&self, offset: usize, ch: char) -> LiteralError {
        LiteralError::UnexpectedChar {
            input: self.input.to_string(),
            offset,
            ch,
        }
    }

    fn value(&mut self) -> Result<QualityValue, LiteralError> {
        self.skip_ws();
        match self.chars.peek().copied() {
            None => Err(LiteralError::UnexpectedEnd(self.input.to_string())),
            Some((_, '(')) => self.sequence(')'),
            Some((_, '[')) => self.sequence(']'),
            Some((_, c)) if c.is_ascii_digit() || matches!(c, '-' | '+' | '.') => self.number(),
            Some((offset, ch)) => Err(self.unexpected(offset, ch)),
        }
    }

    fn sequence(&mut self, close: char) -> Result<QualityValue, LiteralError> {
        if self.depth == MAX_LITERAL_DEPTH {
            return Err(LiteralError::TooDeep {
                max: MAX_LITERAL_DEPTH,
            });
        }
        self.depth += 1;
        let value = self.items(close);
        self.depth -= 1;
        value
    }

    /// `(x)` is a parenthesised `x`; `(x,)` and `[x]` are one-element tuples.
    fn items(&mut self, close: char) -> Result<QualityValue, LiteralError> {
        self.chars.next();
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            match self.chars.peek().copied() {
                None => return Err(LiteralError::UnexpectedEnd(self.input.to_string())),
                Some((_, c)) if c == close => {
                    self.chars.next();
                    return Ok(QualityValue::Tuple(items));
                }
                Some(_) => {}
            }

            items.push(self.value()?);

            self.skip_ws();
            match self.chars.next() {
                None => return Err(LiteralError::UnexpectedEnd(self.input.to_string())),
                Some((_, ',')) => {}
                Some((_, c)) if c == close => {
                    if close == ')' && items.len() == 1 {
                        return Ok(items.remove(0));
                    }
                    return Ok(QualityValue::Tuple(items));
                }
                Some((offset, ch)) => return Err(self.unexpected(offset, ch)),
            }
        }
    }

    fn number(&mut self) -> Result<QualityValue, LiteralError> {
        let mut text = String::new();
        while let Some((_, c)) = self
            .chars
            .next_if(|(_, c)| c.is_ascii_alphanumeric() || matches!(c, '-' | '+' | '.' | '_'))
        {
            text.push(c);
        }

        let digits = text.replace('_', "");
        if let Ok(i) = digits.parse::<i64>() {
            return Ok(QualityValue::Int(i));
        }
        match digits.parse::<f64>() {
            Ok(f) if f.is_finite() => Ok(QualityValue::Float(f)),
            _ => Err(LiteralError::InvalidNumber(text)),
        }
    }
}
