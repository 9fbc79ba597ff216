// used to order values inside comparisons
use std::cmp::Ordering;
// used to print out readable forms of a value
use std::fmt;

// values are handed back to callers as plain scalars
use serde::Serialize;

use crate::error::{ArborError, Result};

// ------------- Cardinality -------------
/// How many children a node may hold at the same time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cardinality {
    None,
    One,
    Many,
}

impl Cardinality {
    pub const ONE_SEPARATOR: char = '!';
    pub const MANY_SEPARATOR: char = '.';

    pub fn from_separator(c: char) -> Option<Self> {
        match c {
            Self::ONE_SEPARATOR => Some(Self::One),
            Self::MANY_SEPARATOR => Some(Self::Many),
            _ => None,
        }
    }
    // None never separates anything in a well-formed path, but a dot keeps
    // rendering total.
    pub fn separator(&self) -> char {
        match self {
            Self::One => Self::ONE_SEPARATOR,
            Self::Many | Self::None => Self::MANY_SEPARATOR,
        }
    }
}

// ------------- Value -------------
/// The value carried by a node in the fact tree or by a token in a sentence.
///
/// Serializes untagged, so a value leaves the crate as a plain JSON scalar.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Symbol(String),
    Integer(i64),
    Float(f64),
    /// A quoted string literal. The tokenizer never produces these; they only
    /// arrive as operand or binding values supplied by a caller.
    Text(String),
    Variable(String),
}

impl Value {
    pub const VARIABLE_MARK: char = '?';

    /// Classifies a raw token: variable, then integer, then float, then symbol.
    /// A token that looks like a number is never a symbol.
    pub fn parse(token: &str) -> Self {
        if token.starts_with(Self::VARIABLE_MARK) {
            return Self::Variable(token.to_owned());
        }
        if let Ok(i) = token.parse::<i64>() {
            return Self::Integer(i);
        }
        // f64 happily parses "inf" and "NaN", which are symbols to us
        if token.chars().any(|c| c.is_ascii_digit()) {
            if let Ok(f) = token.parse::<f64>() {
                return Self::Float(f);
            }
        }
        Self::Symbol(token.to_owned())
    }
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }
    /// Canonical textual form, used as the key of a node among its siblings.
    pub fn symbol(&self) -> String {
        match self {
            Self::Symbol(s) | Self::Variable(s) => s.clone(),
            Self::Integer(i) => i.to_string(),
            // Debug keeps the fractional part, so 1.0 stays a float on re-parse
            Self::Float(f) => format!("{:?}", f),
            Self::Text(s) => format!("\"{}\"", s),
        }
    }
    pub fn data_type(&self) -> &'static str {
        match self {
            Self::Symbol(_) => "Symbol",
            Self::Integer(_) => "Integer",
            Self::Float(_) => "Float",
            Self::Text(_) => "String",
            Self::Variable(_) => "Variable",
        }
    }
    pub fn is_variable(&self) -> bool {
        matches!(self, Self::Variable(_))
    }

    pub fn equal_to(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Integer(i), Self::Float(f)) | (Self::Float(f), Self::Integer(i)) => {
                (*i as f64) == *f
            }
            (Self::Symbol(a), Self::Symbol(b))
            | (Self::Text(a), Self::Text(b))
            | (Self::Variable(a), Self::Variable(b)) => a == b,
            _ => false,
        }
    }
    pub fn not_equal_to(&self, other: &Value) -> bool {
        !self.equal_to(other)
    }
    pub fn less_than(&self, other: &Value) -> Result<bool> {
        Ok(self.order(other, "<")? == Some(Ordering::Less))
    }
    pub fn less_than_or_equal(&self, other: &Value) -> Result<bool> {
        Ok(matches!(
            self.order(other, "<=")?,
            Some(Ordering::Less | Ordering::Equal)
        ))
    }
    pub fn greater_than(&self, other: &Value) -> Result<bool> {
        Ok(self.order(other, ">")? == Some(Ordering::Greater))
    }
    pub fn greater_than_or_equal(&self, other: &Value) -> Result<bool> {
        Ok(matches!(
            self.order(other, ">=")?,
            Some(Ordering::Greater | Ordering::Equal)
        ))
    }

    // None means the pair is comparable but unordered (NaN).
    fn order(&self, other: &Value, op: &'static str) -> Result<Option<Ordering>> {
        match (self, other) {
            (Self::Integer(a), Self::Integer(b)) => Ok(Some(a.cmp(b))),
            (Self::Integer(a), Self::Float(b)) => Ok((*a as f64).partial_cmp(b)),
            (Self::Float(a), Self::Integer(b)) => Ok(a.partial_cmp(&(*b as f64))),
            (Self::Float(a), Self::Float(b)) => Ok(a.partial_cmp(b)),
            (Self::Symbol(a), Self::Symbol(b)) => Ok(Some(a.cmp(b))),
            // variables are substituted before any comparison runs, so this
            // arm only catches unbound operands
            (Self::Variable(_), _) | (_, Self::Variable(_)) => Err(self.type_error(other, op)),
            (Self::Text(_), _) | (_, Self::Text(_)) => Err(self.type_error(other, op)),
            (Self::Symbol(_), Self::Integer(_) | Self::Float(_))
            | (Self::Integer(_) | Self::Float(_), Self::Symbol(_)) => {
                Err(self.type_error(other, op))
            }
        }
    }
    fn type_error(&self, other: &Value, op: &'static str) -> ArborError {
        ArborError::Type {
            op,
            left: self.data_type(),
            right: other.data_type(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}
impl From<&str> for Value {
    fn from(token: &str) -> Self {
        Self::parse(token)
    }
}
impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}
impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}
