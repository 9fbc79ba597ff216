//! Sentences are parsed paths such as `astrid.relationships.jordan.reputation!30`.
//!
//! A `.` after a token marks that token as having cardinality `Many`, a `!`
//! marks it `One`. The final token carries no separator and is `Many` by
//! convention, since nothing is ever read or written through it.
use std::fmt;

use crate::datatype::{Cardinality, Value};
use crate::error::{ArborError, Result};
use crate::unify::Variables;

/// One position in a sentence: a value and the cardinality implied by the
/// separator following it.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    value: Value,
    cardinality: Cardinality,
}

impl Token {
    pub fn new(value: Value, cardinality: Cardinality) -> Self {
        Self { value, cardinality }
    }
    pub fn value(&self) -> &Value {
        &self.value
    }
    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }
    pub fn symbol(&self) -> String {
        self.value.symbol()
    }
    pub fn is_variable(&self) -> bool {
        self.value.is_variable()
    }
}

#[derive(Debug, Clone)]
pub struct Sentence {
    tokens: Vec<Token>,
    has_variables: bool,
}

impl Sentence {
    /// Single left-to-right scan; every run of characters ended by a separator
    /// becomes a token tagged with that separator's cardinality.
    pub fn parse(path: &str) -> Result<Self> {
        let mut tokens = Vec::new();
        let mut current = String::new();
        for c in path.chars() {
            match Cardinality::from_separator(c) {
                Some(cardinality) => {
                    tokens.push(Self::token(&current, cardinality, path)?);
                    current.clear();
                }
                None => current.push(c),
            }
        }
        tokens.push(Self::token(&current, Cardinality::Many, path)?);
        Ok(Self::from_tokens(tokens))
    }
    fn token(text: &str, cardinality: Cardinality, path: &str) -> Result<Token> {
        if text.is_empty() {
            return Err(ArborError::syntax(format!(
                "Empty token in sentence '{}'",
                path
            )));
        }
        Ok(Token::new(Value::parse(text), cardinality))
    }
    pub fn from_tokens(tokens: Vec<Token>) -> Self {
        let has_variables = tokens.iter().any(Token::is_variable);
        Self {
            tokens,
            has_variables,
        }
    }
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }
    pub fn len(&self) -> usize {
        self.tokens.len()
    }
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
    pub fn has_variables(&self) -> bool {
        self.has_variables
    }
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().filter_map(|t| match t.value() {
            Value::Variable(name) => Some(name.as_str()),
            _ => None,
        })
    }
    /// Fails with a variable error if any token is a variable.
    pub fn ensure_ground(&self) -> Result<()> {
        match self.variables().next() {
            Some(variable) => Err(ArborError::Variable {
                variable: variable.to_owned(),
                sentence: self.to_string(),
            }),
            None => Ok(()),
        }
    }
    /// Substitutes every variable bound in `row`. Unbound variables and
    /// ground tokens are left as they are.
    pub fn bind(&self, row: &Variables) -> Sentence {
        let tokens = self
            .tokens
            .iter()
            .map(|token| match token.value() {
                Value::Variable(name) => match row.get(name) {
                    Some(bound) => Token::new(bound.clone(), token.cardinality()),
                    None => token.clone(),
                },
                _ => token.clone(),
            })
            .collect();
        Self::from_tokens(tokens)
    }
    /// True when every token of `prefix` matches this sentence by type and
    /// value, and all but the last compared token also agree on cardinality.
    pub fn starts_with(&self, prefix: &Sentence) -> bool {
        if prefix.len() > self.len() {
            return false;
        }
        let last = prefix.len().saturating_sub(1);
        self.tokens
            .iter()
            .zip(prefix.tokens.iter())
            .enumerate()
            .all(|(i, (subject, test))| {
                subject.value().data_type() == test.value().data_type()
                    && subject.value().equal_to(test.value())
                    && (i == last || subject.cardinality() == test.cardinality())
            })
    }
}

impl fmt::Display for Sentence {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut s = String::new();
        for (i, token) in self.tokens.iter().enumerate() {
            s += &token.symbol();
            if i + 1 < self.tokens.len() {
                s.push(token.cardinality().separator());
            }
        }
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn separators_tag_the_preceding_token() {
        let sentence = Sentence::parse("astrid.relationships.jordan.reputation!30").unwrap();
        let cardinalities: Vec<Cardinality> =
            sentence.tokens().iter().map(Token::cardinality).collect();
        assert_eq!(
            cardinalities,
            vec![
                Cardinality::Many,
                Cardinality::Many,
                Cardinality::Many,
                Cardinality::One,
                Cardinality::Many
            ]
        );
        assert_eq!(sentence.tokens()[4].value(), &Value::Integer(30));
        assert!(!sentence.has_variables());
    }

    #[test]
    fn numbers_are_never_symbols() {
        let sentence = Sentence::parse("a.-10.?x.1e3").unwrap();
        assert_eq!(sentence.tokens()[1].value(), &Value::Integer(-10));
        assert_eq!(sentence.tokens()[2].value(), &Value::Variable("?x".into()));
        assert_eq!(sentence.tokens()[3].value(), &Value::Float(1000.0));
        assert!(sentence.has_variables());
    }

    #[test]
    fn empty_tokens_are_rejected() {
        assert!(Sentence::parse("").is_err());
        assert!(Sentence::parse("a..b").is_err());
        assert!(Sentence::parse("a!").is_err());
    }

    #[test]
    fn display_restores_the_path() {
        let path = "player.relationships.jordan.reputation!-20";
        assert_eq!(Sentence::parse(path).unwrap().to_string(), path);
    }

    #[test]
    fn prefix_cardinality_ignored_on_last_token() {
        let sentence = Sentence::parse("a.b!c").unwrap();
        assert!(sentence.starts_with(&Sentence::parse("a.b").unwrap()));
        assert!(!sentence.starts_with(&Sentence::parse("a!b").unwrap()));
        assert!(!sentence.starts_with(&Sentence::parse("a.b!c.d").unwrap()));
    }
}
