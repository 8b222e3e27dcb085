//! # rollup_rewrite
//!
//! A query rewrite engine that inspects analytical queries over a raw,
//! append-only event log and, when it can prove the rewrite preserves
//! semantics, substitutes a smaller pre-aggregated rollup table holding
//! partial aggregate state.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │          Entry Gate (tenant timezone, toggle)            │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [rewrite::driver]
//! ┌─────────────────────────────────────────────────────────┐
//! │   Tree-Wide Driver (CTEs, unions, nested selects)        │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [rewrite::select]
//! ┌─────────────────────────────────────────────────────────┐
//! │   Select-Level Rewriter (preconditions, WHERE split)     │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [rewrite::expr]
//! ┌─────────────────────────────────────────────────────────┐
//! │   Expression Rewriter (aggregates, buckets, fields)      │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [patterns, mapping]
//! ┌─────────────────────────────────────────────────────────┐
//! │   Safety Predicates + Field Mapping Tables               │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! The engine is fail-closed: any construct it cannot prove safe causes
//! the enclosing select block to be returned byte-for-byte unchanged. The
//! worst observable outcome of an unsupported construct is a missed
//! optimization, never an altered query.

pub mod ast;
pub mod error;
pub mod mapping;
pub mod patterns;
pub mod rewrite;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::ast::{
        and, call, count, count_distinct, field, field_chain, lit_bool, lit_float, lit_int,
        lit_null, lit_str, or, uniq, CompareOp, Cte, Expr, ExprExt, Select, SetOpKind,
        SetOperation, TableSource, Value,
    };
    pub use crate::error::{RewriteError, RewriteResult};
    pub use crate::rewrite::{rewrite_query, RewriteSettings};
}
