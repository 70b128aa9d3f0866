//! Small closed expression language for visibility and computed fields.
//!
//! Sources are tokenized, parsed into an [`Expr`] tree and interpreted
//! against a flat [`Values`] context. Nothing outside that context is
//! reachable, and parsing rejects input beyond fixed size and depth limits,
//! so evaluation always terminates.
//!
//! [`evaluate_visibility`] and [`evaluate_computed`] never fail: a broken
//! expression leaves the field visible and its value untouched.

pub mod ast;
pub mod eval;
pub mod lexer;
pub mod parser;

use std::collections::BTreeSet;

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::Values;

pub use ast::{BinaryOp, Expr, UnaryOp};
pub use eval::{display, truthy};
pub use parser::{MAX_DEPTH, MAX_TOKENS};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExprError {
    #[error("expression is empty")]
    Empty,
    #[error("unexpected character '{found}' at {pos}")]
    UnexpectedChar { pos: usize, found: String },
    #[error("unexpected {found} at {pos}")]
    UnexpectedToken { pos: usize, found: String },
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("expected {expected} at {pos}, found {found}")]
    Expected {
        pos: usize,
        expected: String,
        found: String,
    },
    #[error("unsupported reference '{name}' at {pos}")]
    UnsupportedReference { pos: usize, name: String },
    #[error("expression nests deeper than {limit} levels")]
    TooDeep { limit: usize },
    #[error("expression is longer than {limit} tokens")]
    TooLong { limit: usize },
    #[error("number literal at {pos} is out of range")]
    InvalidNumber { pos: usize },
    #[error("operator '{op}' cannot be applied to {found}")]
    TypeMismatch {
        op: &'static str,
        found: &'static str,
    },
    #[error("cannot compare {left} with {right} using '{op}'")]
    Incomparable {
        op: &'static str,
        left: &'static str,
        right: &'static str,
    },
    #[error("division by zero")]
    DivisionByZero,
    #[error("result is not a finite number")]
    NonFinite,
}

/// A parsed expression together with its source text.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    source: String,
    ast: Expr,
}

impl Expression {
    pub fn parse(source: &str) -> Result<Self, ExprError> {
        let ast = parser::parse(source)?;
        Ok(Self {
            source: source.to_string(),
            ast,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn ast(&self) -> &Expr {
        &self.ast
    }

    pub fn evaluate(&self, values: &Values) -> Result<Value, ExprError> {
        eval::evaluate(&self.ast, values)
    }

    /// Keys the expression reads from the value context.
    pub fn field_refs(&self) -> BTreeSet<&str> {
        self.ast.field_refs()
    }
}

/// Parses `source` without evaluating it, for editor feedback.
pub fn check(source: &str) -> Result<(), ExprError> {
    parser::parse(source).map(|_| ())
}

fn non_blank(source: Option<&str>) -> Option<&str> {
    source.map(str::trim).filter(|s| !s.is_empty())
}

/// Whether a field gated by `source` is visible. Absent, blank, malformed
/// or failing expressions all mean visible.
pub fn evaluate_visibility(source: Option<&str>, values: &Values) -> bool {
    let Some(source) = non_blank(source) else {
        return true;
    };
    match Expression::parse(source).and_then(|expr| expr.evaluate(values)) {
        Ok(value) => truthy(&value),
        Err(err) => {
            debug!(expression = source, error = %err, "visibility expression failed; field stays visible");
            true
        }
    }
}

/// Override value for a computed field, or `None` to keep the raw value.
/// A `null` result also means no override.
pub fn evaluate_computed(source: Option<&str>, values: &Values) -> Option<Value> {
    let source = non_blank(source)?;
    match Expression::parse(source).and_then(|expr| expr.evaluate(values)) {
        Ok(Value::Null) => None,
        Ok(value) => Some(value),
        Err(err) => {
            debug!(expression = source, error = %err, "computed expression failed; keeping raw value");
            None
        }
    }
}
