//! Tree-wide driver and entry gate.
//!
//! The driver walks the full tree top-down, transforming each select
//! branch independently so one ineligible sub-query never blocks a
//! sibling. The entry gate refuses to attempt anything when the tenant
//! time zone is missing or not aligned to whole hours, since the rollup
//! buckets are hour-aligned.

use chrono::{DateTime, Offset, Utc};
use chrono_tz::Tz;

use crate::ast::{Cte, Expr, SetOperation};
use crate::rewrite::context::RewriteSettings;
use crate::rewrite::select::rewrite_select;

/// Rewrite a full query tree against the rollup table.
///
/// This is the engine's single entry point. The result is either a tree
/// with some select blocks re-targeted at the rollup table, or a clone of
/// the input; it is never a partial hybrid of a single select block and
/// never an error.
pub fn rewrite_query(expr: &Expr, settings: &RewriteSettings) -> Expr {
    if !settings.enabled {
        return expr.clone();
    }
    let whole_hour = settings
        .timezone
        .as_deref()
        .is_some_and(timezone_has_whole_hour_offset);
    if !whole_hour {
        return expr.clone();
    }
    rewrite_node(expr)
}

/// Walk one node: recurse into nested selects and set-operation branches,
/// then attempt the select-level rewrite on the node itself.
pub fn rewrite_node(expr: &Expr) -> Expr {
    match expr {
        Expr::SetOperation(set_op) => Expr::SetOperation(SetOperation {
            op: set_op.op,
            branches: set_op.branches.iter().map(rewrite_node).collect(),
        }),
        Expr::Select(select) => {
            let mut recursed = (**select).clone();
            // Named sub-queries first, each transformed in isolation.
            recursed.ctes = recursed
                .ctes
                .iter()
                .map(|cte| Cte {
                    name: cte.name.clone(),
                    body: rewrite_node(&cte.body),
                })
                .collect();
            // Then nested selects inside the SELECT-list expressions.
            recursed.select = recursed.select.iter().map(rewrite_embedded).collect();
            Expr::Select(Box::new(rewrite_select(&recursed)))
        }
        other => other.clone(),
    }
}

/// Replace select nodes embedded inside an expression, leaving everything
/// else untouched.
fn rewrite_embedded(expr: &Expr) -> Expr {
    match expr {
        Expr::Select(_) | Expr::SetOperation(_) => rewrite_node(expr),
        Expr::Alias { name, expr } => Expr::Alias {
            name: name.clone(),
            expr: Box::new(rewrite_embedded(expr)),
        },
        Expr::Call(c) => Expr::Call(crate::ast::Call {
            name: c.name.clone(),
            args: c.args.iter().map(rewrite_embedded).collect(),
            distinct: c.distinct,
        }),
        Expr::Compare { op, left, right } => Expr::Compare {
            op: *op,
            left: Box::new(rewrite_embedded(left)),
            right: Box::new(rewrite_embedded(right)),
        },
        Expr::And(operands) => Expr::And(operands.iter().map(rewrite_embedded).collect()),
        Expr::Or(operands) => Expr::Or(operands.iter().map(rewrite_embedded).collect()),
        Expr::Field(_) | Expr::Constant(_) => expr.clone(),
    }
}

// =============================================================================
// Entry gate
// =============================================================================

/// True iff the named time zone currently sits at a whole-hour UTC offset.
/// Unknown names fail the gate.
pub fn timezone_has_whole_hour_offset(name: &str) -> bool {
    match name.parse::<Tz>() {
        Ok(tz) => offset_is_whole_hours(tz, Utc::now()),
        Err(_) => false,
    }
}

/// Whole-hour check at a specific instant, for deterministic testing.
pub fn offset_is_whole_hours(tz: Tz, at: DateTime<Utc>) -> bool {
    let seconds = at.with_timezone(&tz).offset().fix().local_minus_utc();
    seconds % 3600 == 0
}
