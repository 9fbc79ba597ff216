use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArborError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Io error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Cardinality mismatch on {symbol} in sentence '{sentence}'")]
    Cardinality { symbol: String, sentence: String },
    #[error("Structural error: {0}")]
    Structure(String),
    #[error("Found variable {variable} in sentence '{sentence}', which only allows ground values")]
    Variable { variable: String, sentence: String },
    #[error("Type error: {op} not defined between nodes of type {left} and {right}")]
    Type {
        op: &'static str,
        left: &'static str,
        right: &'static str,
    },
    #[error("Syntax error: {message}")]
    Syntax { message: String },
}

pub type Result<T> = std::result::Result<T, ArborError>;

impl ArborError {
    pub(crate) fn syntax(message: impl Into<String>) -> Self {
        Self::Syntax {
            message: message.into(),
        }
    }
}

// Helper conversions
impl From<config::ConfigError> for ArborError {
    fn from(e: config::ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}
impl From<serde_json::Error> for ArborError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
impl From<std::io::Error> for ArborError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}
