//! Select-level rewriter - structural preconditions, WHERE splitting,
//! and assembly of the rewritten select.
//!
//! A rewrite covers a whole select block or nothing: any failed
//! precondition or unsupported sub-expression returns the input select
//! unchanged.

use crate::ast::{Expr, Select, TableSource, Value};
use crate::error::{RewriteError, RewriteResult};
use crate::mapping::{RAW_EVENTS_TABLE, ROLLUP_TABLE};
use crate::patterns::is_pageview_filter;
use crate::rewrite::context::RewriteScope;
use crate::rewrite::expr::rewrite_all;

/// Rewrite one select block against the rollup table, or return it
/// unchanged when any part cannot be proven safe.
pub fn rewrite_select(select: &Select) -> Select {
    try_rewrite_select(select).unwrap_or_else(|_| select.clone())
}

fn try_rewrite_select(select: &Select) -> RewriteResult<Select> {
    check_clauses(select)?;
    let source = check_source(select)?;

    let mut scope = RewriteScope::new(source.alias.as_deref());

    let (pageview_filters, remaining_where) = split_where(select, &scope)?;
    if pageview_filters != 1 {
        return Err(RewriteError::UnsupportedExpression(
            "expected exactly one pageview filter".into(),
        ));
    }

    // SELECT list first: aliases defined here are valid in WHERE/GROUP BY.
    let select_list = rewrite_all(&select.select, &mut scope)?;
    if !scope.rewrote_aggregate() {
        return Err(RewriteError::UnsupportedExpression(
            "no recognized aggregate in SELECT list".into(),
        ));
    }

    let where_parts = rewrite_all(&remaining_where, &mut scope)?;
    let group_by = rewrite_all(&select.group_by, &mut scope)?;

    Ok(Select {
        ctes: select.ctes.clone(),
        select: select_list,
        distinct: false,
        from: Some(TableSource {
            table: ROLLUP_TABLE.to_string(),
            alias: source.alias.clone(),
            // 100% sampling is a no-op; the clause is dropped.
            sample: None,
        }),
        joins: Vec::new(),
        array_join: None,
        prewhere: None,
        where_clause: combine_where(where_parts),
        group_by,
        having: select.having.clone(),
        window_exprs: Vec::new(),
        order_by: select.order_by.clone(),
        limit: select.limit,
        offset: select.offset,
        limit_by: Vec::new(),
        view_name: None,
    })
}

// =============================================================================
// Preconditions
// =============================================================================

fn check_clauses(select: &Select) -> RewriteResult<()> {
    if select.array_join.is_some() {
        return Err(RewriteError::DisqualifyingClause("ARRAY JOIN"));
    }
    if !select.window_exprs.is_empty() {
        return Err(RewriteError::DisqualifyingClause("WINDOW"));
    }
    if !select.limit_by.is_empty() {
        return Err(RewriteError::DisqualifyingClause("LIMIT BY"));
    }
    if select.prewhere.is_some() {
        return Err(RewriteError::DisqualifyingClause("PREWHERE"));
    }
    if select.view_name.is_some() {
        return Err(RewriteError::DisqualifyingClause("view reference"));
    }
    if select.distinct {
        return Err(RewriteError::DisqualifyingClause("DISTINCT"));
    }
    Ok(())
}

fn check_source(select: &Select) -> RewriteResult<&TableSource> {
    if !select.joins.is_empty() {
        return Err(RewriteError::DisqualifyingClause("JOIN"));
    }
    let source = select
        .from
        .as_ref()
        .ok_or(RewriteError::DisqualifyingClause("missing FROM"))?;
    if source.table != RAW_EVENTS_TABLE {
        return Err(RewriteError::UnsupportedExpression(format!(
            "source table is not the raw event log: {}",
            source.table
        )));
    }
    match source.sample {
        None => Ok(source),
        Some(fraction) if fraction == 1.0 => Ok(source),
        Some(_) => Err(RewriteError::DisqualifyingClause("SAMPLE")),
    }
}

// =============================================================================
// WHERE splitting
// =============================================================================

/// Flatten the WHERE clause through nested conjunctions (both `And` nodes
/// and `and(...)` calls), drop trivially-true constants, and partition the
/// operands into pageview filters and the remainder. A disjunction at the
/// top level is unsupported.
fn split_where(select: &Select, scope: &RewriteScope) -> RewriteResult<(usize, Vec<Expr>)> {
    let mut operands = Vec::new();
    if let Some(where_clause) = &select.where_clause {
        flatten_conjunction(where_clause, &mut operands)?;
    }

    let mut pageview_filters = 0;
    let mut remaining = Vec::new();
    for operand in operands {
        if is_pageview_filter(&operand, scope.tables()) {
            pageview_filters += 1;
        } else {
            remaining.push(operand);
        }
    }
    Ok((pageview_filters, remaining))
}

fn flatten_conjunction(expr: &Expr, out: &mut Vec<Expr>) -> RewriteResult<()> {
    match expr {
        Expr::And(operands) => {
            for operand in operands {
                flatten_conjunction(operand, out)?;
            }
            Ok(())
        }
        Expr::Call(c) if c.name == "and" => {
            for operand in &c.args {
                flatten_conjunction(operand, out)?;
            }
            Ok(())
        }
        Expr::Or(_) => Err(RewriteError::UnsupportedExpression(
            "disjunction in WHERE".into(),
        )),
        Expr::Call(c) if c.name == "or" => Err(RewriteError::UnsupportedExpression(
            "disjunction in WHERE".into(),
        )),
        Expr::Constant(Value::Bool(true)) | Expr::Constant(Value::Int(1)) => Ok(()),
        other => {
            out.push(other.clone());
            Ok(())
        }
    }
}

fn combine_where(mut parts: Vec<Expr>) -> Option<Expr> {
    match parts.len() {
        0 => None,
        1 => parts.pop(),
        _ => Some(Expr::And(parts)),
    }
}
