//! Internal signalling for the rewrite engine.
//!
//! There is exactly one failure mode: a sub-expression cannot be proven
//! safe to rewrite. The error never escapes the engine - the nearest
//! enclosing select responds by emitting its input unchanged.

use thiserror::Error;

/// Result type for rewrite operations.
pub type RewriteResult<T> = Result<T, RewriteError>;

/// The "cannot prove this safe" signal.
///
/// Propagated by early return to abort the current select's rewrite
/// attempt. Never user-visible.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RewriteError {
    #[error("unsupported field reference: {0}")]
    UnsupportedField(String),

    #[error("unsupported expression: {0}")]
    UnsupportedExpression(String),

    #[error("disqualifying clause: {0}")]
    DisqualifyingClause(&'static str),
}
