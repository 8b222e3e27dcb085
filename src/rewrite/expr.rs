//! Expression rewriter - the recursive visitor that maps event-log
//! expressions onto rollup-table equivalents.
//!
//! Every function returns `RewriteResult`; an `Err` means "cannot prove
//! this safe" and aborts the enclosing select's rewrite attempt. Nothing
//! here mutates the input tree.

use crate::ast::{Call, CompareOp, Expr, Field, Value};
use crate::error::{RewriteError, RewriteResult};
use crate::mapping::{
    column_for_chain, BUCKET_COLUMN, PAGEVIEWS_STATE_COLUMN, PERSONS_STATE_COLUMN,
    SESSIONS_STATE_COLUMN, SUM_MERGE, UNIQ_MERGE,
};
use crate::patterns::{
    bucket_granularity, classify_boundary, is_person_id_field, is_session_id_field,
    is_timestamp_field, Boundary,
};
use crate::rewrite::context::RewriteScope;

/// Rewrite one expression against the rollup table.
///
/// Comparison operators are normalized to their function-call form first,
/// so the same recognizers apply to operator and call syntax. Alias nodes
/// are transparent: the wrapped expression is rewritten and the alias name
/// becomes locally valid for later siblings.
pub fn rewrite_expr(expr: &Expr, scope: &mut RewriteScope) -> RewriteResult<Expr> {
    match expr {
        Expr::Constant(_) => Ok(expr.clone()),

        Expr::Field(f) => rewrite_field(f, scope),

        Expr::Alias { name, expr: inner } => {
            let rewritten = rewrite_expr(inner, scope)?;
            scope.record_alias(name);
            Ok(Expr::Alias {
                name: name.clone(),
                expr: Box::new(rewritten),
            })
        }

        Expr::Compare { op, left, right } => {
            let normalized = Call::new(op.call_name(), vec![(**left).clone(), (**right).clone()]);
            rewrite_call(&normalized, scope)
        }

        Expr::Call(c) => rewrite_call(c, scope),

        Expr::And(operands) => Ok(Expr::And(rewrite_all(operands, scope)?)),
        Expr::Or(operands) => Ok(Expr::Or(rewrite_all(operands, scope)?)),

        // Nested selects are transformed by the tree-wide driver before the
        // enclosing select is attempted; here they pass through untouched.
        Expr::Select(_) | Expr::SetOperation(_) => Ok(expr.clone()),
    }
}

/// Rewrite a list of sibling expressions in order.
pub fn rewrite_all(exprs: &[Expr], scope: &mut RewriteScope) -> RewriteResult<Vec<Expr>> {
    exprs.iter().map(|e| rewrite_expr(e, scope)).collect()
}

// =============================================================================
// Fields
// =============================================================================

fn rewrite_field(f: &Field, scope: &mut RewriteScope) -> RewriteResult<Expr> {
    if let [only] = f.chain.as_slice() {
        if scope.is_local_alias(only) {
            return Ok(Expr::Field(f.clone()));
        }
    }
    match column_for_chain(&f.chain, scope.tables()) {
        Some(column) => Ok(Expr::Field(Field::new(vec![column]))),
        None => Err(RewriteError::UnsupportedField(f.chain.join("."))),
    }
}

// =============================================================================
// Calls
// =============================================================================

fn rewrite_call(call: &Call, scope: &mut RewriteScope) -> RewriteResult<Expr> {
    if let Some(merged) = rewrite_aggregate(call, scope) {
        scope.mark_aggregate_rewrite();
        return Ok(merged);
    }

    if bucket_granularity(call, scope.tables()).is_some() {
        return Ok(bucket_truncation(call, scope));
    }

    if let Some(compare) = rewrite_boundary_compare(call, scope) {
        return Ok(compare);
    }

    let args = rewrite_all(&call.args, scope)?;
    Ok(Expr::Call(Call {
        name: call.name.clone(),
        args,
        distinct: call.distinct,
    }))
}

// =============================================================================
// Aggregate substitution
// =============================================================================

/// Recognize a supported aggregate call and produce its partial-state
/// merge form. Returns `None` when the call is not a recognized aggregate
/// (it then falls through to the other recognizers).
fn rewrite_aggregate(call: &Call, scope: &RewriteScope) -> Option<Expr> {
    let tables = scope.tables();

    // count() / count(*) -> merge of the pre-aggregated pageview counter.
    if call.name == "count" && !call.distinct && is_count_all_args(&call.args) {
        return Some(merge_call(SUM_MERGE, PAGEVIEWS_STATE_COLUMN));
    }

    // uniq(person_id) / count(DISTINCT person_id), any spelling.
    // uniq(session.id) / count(DISTINCT session.id), any spelling.
    let distinct_arg = match (call.name.as_str(), call.distinct, call.args.as_slice()) {
        ("uniq", false, [arg]) => arg,
        ("count", true, [arg]) => arg,
        _ => return None,
    };
    if is_person_id_field(distinct_arg, tables) {
        return Some(merge_call(UNIQ_MERGE, PERSONS_STATE_COLUMN));
    }
    if is_session_id_field(distinct_arg, tables) {
        return Some(merge_call(UNIQ_MERGE, SESSIONS_STATE_COLUMN));
    }
    None
}

fn is_count_all_args(args: &[Expr]) -> bool {
    match args {
        [] => true,
        [Expr::Field(f)] => f.chain.len() == 1 && f.chain[0] == "*",
        _ => false,
    }
}

fn merge_call(merge_fn: &str, state_column: &str) -> Expr {
    Expr::Call(Call::new(
        merge_fn,
        vec![Expr::Field(Field::new(vec![state_column]))],
    ))
}

// =============================================================================
// Time buckets
// =============================================================================

/// The same truncation call, re-targeted at the pre-computed bucket
/// column. The original spelling (`toStartOfDay` vs `dateTrunc`) is kept.
fn bucket_truncation(call: &Call, scope: &RewriteScope) -> Expr {
    let args = call
        .args
        .iter()
        .map(|arg| {
            if is_timestamp_field(arg, scope.tables()) {
                Expr::Field(Field::new(vec![BUCKET_COLUMN]))
            } else {
                arg.clone()
            }
        })
        .collect();
    Expr::Call(Call {
        name: call.name.clone(),
        args,
        distinct: call.distinct,
    })
}

/// A comparison of the raw timestamp against a bucket-aligned boundary is
/// rewritten to compare the bucket column directly. Only combinations that
/// are equivalent under hour-aligned truncation qualify:
///
/// - `ts >= B` and `ts < B` for any hour-aligned boundary B
///   (and the mirrored `B <= ts` / `B > ts`)
/// - `ts <= E` for a day-end boundary E (23:59:59)
///
/// Anything else (`ts > B`, `ts = B`, non-boundary constants, ...) returns
/// `None` and falls through to the generic path, where the raw timestamp
/// field is unsupported and rejects the enclosing select.
fn rewrite_boundary_compare(call: &Call, scope: &RewriteScope) -> Option<Expr> {
    let op = CompareOp::from_call_name(&call.name)?;
    let [left, right] = call.args.as_slice() else {
        return None;
    };
    let tables = scope.tables();

    let rewritable = if is_timestamp_field(left, tables) {
        let boundary = boundary_operand(right)?;
        match op {
            CompareOp::GtEq | CompareOp::Lt => boundary.is_hour_aligned(),
            CompareOp::LtEq => boundary == Boundary::DayEnd,
            _ => false,
        }
    } else if is_timestamp_field(right, tables) {
        let boundary = boundary_operand(left)?;
        match op {
            CompareOp::LtEq | CompareOp::Gt => boundary.is_hour_aligned(),
            _ => false,
        }
    } else {
        return None;
    };

    if !rewritable {
        return None;
    }

    let bucket = Expr::Field(Field::new(vec![BUCKET_COLUMN]));
    let args = if is_timestamp_field(left, tables) {
        vec![bucket, right.clone()]
    } else {
        vec![left.clone(), bucket]
    };
    Some(Expr::Call(Call::new(&call.name, args)))
}

/// Classify a comparison operand as a bucket boundary: either a literal
/// that parses to a boundary instant, or a truncation call over a literal
/// (whose result is a boundary by construction).
fn boundary_operand(expr: &Expr) -> Option<Boundary> {
    match expr {
        Expr::Constant(value) => classify_boundary(value),
        Expr::Call(c) => {
            let constant_arg = |e: &Expr| matches!(e, Expr::Constant(_));
            match (c.name.as_str(), c.args.as_slice()) {
                ("toStartOfDay", [arg]) if constant_arg(arg) => Some(Boundary::DayStart),
                ("toStartOfHour", [arg]) if constant_arg(arg) => Some(Boundary::HourStart),
                ("dateTrunc", [Expr::Constant(Value::String(unit)), arg]) if constant_arg(arg) => {
                    match unit.as_str() {
                        "day" => Some(Boundary::DayStart),
                        "hour" => Some(Boundary::HourStart),
                        _ => None,
                    }
                }
                _ => None,
            }
        }
        _ => None,
    }
}
