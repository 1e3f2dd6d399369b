use derive_more::{Display, From};

use crate::types::Value;

pub type Result<T> = core::result::Result<T, PlotError>;

/// Raised by an expression compiler when the input text is malformed.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
#[display("parse error: {message}")]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::error::Error for ParseError {}

#[derive(Debug, Display, From)]
pub enum PlotError {
    #[from]
    #[display("{_0}")]
    Parse(ParseError),
    #[display("expression is empty")]
    EmptyExpression,
    #[display("expression does not evaluate to a finite value at the origin")]
    NonFiniteAtOrigin,
    #[display("invalid grid: half range {half_range}, resolution {resolution}")]
    InvalidGrid { half_range: Value, resolution: usize },
}

impl std::error::Error for PlotError {}
