//! Query AST consumed and produced by the rewrite engine.

pub mod expr;

pub use expr::{
    and, call, count, count_distinct, field, field_chain, lit_bool, lit_float, lit_int, lit_null,
    lit_str, or, uniq, ArrayJoin, Call, CompareOp, Cte, Expr, ExprExt, Field, Join, JoinKind,
    OrderByExpr, Select, SetOpKind, SetOperation, TableSource, Value,
};
