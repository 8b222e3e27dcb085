//! Safety predicates - pure classifiers over AST nodes.
//!
//! Each function answers one question: does this node match a pattern the
//! rewriter knows how to handle? Anything these predicates do not
//! recognize falls through to the fail-closed path in the rewriter.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::ast::{Call, CompareOp, Expr, Value};
use crate::mapping::{strip_table_qualifier, PAGEVIEW_EVENT};

// =============================================================================
// Simple field shapes
// =============================================================================

/// True iff `expr` is a field whose chain is exactly `[name]` or
/// `[<table>, name]` for one of the known `tables`.
pub fn is_simple_field(expr: &Expr, name: &str, tables: &[String]) -> bool {
    match expr {
        Expr::Field(f) => matches!(strip_table_qualifier(&f.chain, tables), [only] if only == name),
        _ => false,
    }
}

/// True iff `expr` references the canonical event-name field.
pub fn is_event_field(expr: &Expr, tables: &[String]) -> bool {
    is_simple_field(expr, "event", tables)
}

/// True iff `expr` references the raw event timestamp.
pub fn is_timestamp_field(expr: &Expr, tables: &[String]) -> bool {
    is_simple_field(expr, "timestamp", tables)
}

/// True iff `expr` spells the person identity in any recognized form:
/// `person_id`, `person.id`, or either qualified by a known table.
pub fn is_person_id_field(expr: &Expr, tables: &[String]) -> bool {
    match expr {
        Expr::Field(f) => matches!(
            strip_table_qualifier(&f.chain, tables),
            [only] if only == "person_id"
        ) || matches!(
            strip_table_qualifier(&f.chain, tables),
            [a, b] if a == "person" && b == "id"
        ),
        _ => false,
    }
}

/// True iff `expr` spells the session identity in any recognized form:
/// `session.id`, `$session_id`, `properties.$session_id`, or any of those
/// qualified by a known table.
pub fn is_session_id_field(expr: &Expr, tables: &[String]) -> bool {
    match expr {
        Expr::Field(f) => match strip_table_qualifier(&f.chain, tables) {
            [only] => only == "$session_id",
            [a, b] => (a == "session" && b == "id") || (a == "properties" && b == "$session_id"),
            _ => false,
        },
        _ => false,
    }
}

// =============================================================================
// Pageview filter
// =============================================================================

/// True iff `expr` is an equality between the event-name field and the
/// pageview literal, in either operand order, as an operator comparison or
/// its `equals(..)` call form. Alias wrappers around the field side are
/// transparent.
pub fn is_pageview_filter(expr: &Expr, tables: &[String]) -> bool {
    let (left, right) = match expr {
        Expr::Compare { op, left, right } if *op == CompareOp::Eq => (&**left, &**right),
        Expr::Call(c) if c.name == "equals" && c.args.len() == 2 => (&c.args[0], &c.args[1]),
        _ => return false,
    };
    (is_event_side(left, tables) && is_pageview_literal(right))
        || (is_event_side(right, tables) && is_pageview_literal(left))
}

fn is_event_side(expr: &Expr, tables: &[String]) -> bool {
    match expr {
        Expr::Alias { expr, .. } => is_event_side(expr, tables),
        other => is_event_field(other, tables),
    }
}

fn is_pageview_literal(expr: &Expr) -> bool {
    matches!(expr, Expr::Constant(Value::String(s)) if s == PAGEVIEW_EVENT)
}

// =============================================================================
// Time-bucket calls
// =============================================================================

/// Truncation granularities the rollup table can serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Day,
    Hour,
}

impl Granularity {
    fn interval_name(&self) -> &'static str {
        match self {
            Granularity::Day => "day",
            Granularity::Hour => "hour",
        }
    }

    fn dedicated_fn(&self) -> &'static str {
        match self {
            Granularity::Day => "toStartOfDay",
            Granularity::Hour => "toStartOfHour",
        }
    }
}

/// Classify a call as a day/hour truncation of a simple timestamp field.
///
/// Two equivalent forms per granularity are recognized: the dedicated
/// function (`toStartOfDay(ts)`) and the generic interval truncation
/// (`dateTrunc('day', ts)`).
pub fn bucket_granularity(call: &Call, tables: &[String]) -> Option<Granularity> {
    for g in [Granularity::Day, Granularity::Hour] {
        if call.name == g.dedicated_fn()
            && call.args.len() == 1
            && is_timestamp_field(&call.args[0], tables)
        {
            return Some(g);
        }
        if call.name == "dateTrunc"
            && call.args.len() == 2
            && matches!(&call.args[0], Expr::Constant(Value::String(s)) if s == g.interval_name())
            && is_timestamp_field(&call.args[1], tables)
        {
            return Some(g);
        }
    }
    None
}

/// True iff the call truncates the raw timestamp to day granularity.
pub fn is_day_bucket_call(call: &Call, tables: &[String]) -> bool {
    bucket_granularity(call, tables) == Some(Granularity::Day)
}

/// True iff the call truncates the raw timestamp to hour granularity.
pub fn is_hour_bucket_call(call: &Call, tables: &[String]) -> bool {
    bucket_granularity(call, tables) == Some(Granularity::Hour)
}

// =============================================================================
// Boundary constants
// =============================================================================

/// Where a literal sits relative to bucket boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    /// Exactly midnight - start of a day (and of an hour).
    DayStart,
    /// Exactly 23:59:59 - the last instant of a day.
    DayEnd,
    /// Start of an hour that is not midnight.
    HourStart,
}

impl Boundary {
    /// Every day start is also an hour start.
    pub fn is_hour_aligned(&self) -> bool {
        matches!(self, Boundary::DayStart | Boundary::HourStart)
    }
}

/// Parse a literal as a timestamp. Accepts `YYYY-MM-DD HH:MM:SS` and a
/// bare `YYYY-MM-DD` date, which denotes midnight.
fn parse_timestamp(value: &Value) -> Option<NaiveDateTime> {
    let s = match value {
        Value::String(s) => s,
        _ => return None,
    };
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

/// Classify a literal relative to day/hour boundaries.
pub fn classify_boundary(value: &Value) -> Option<Boundary> {
    let ts = parse_timestamp(value)?;
    let t = ts.time();
    if t == NaiveTime::MIN {
        Some(Boundary::DayStart)
    } else if t.hour() == 23 && t.minute() == 59 && t.second() == 59 {
        Some(Boundary::DayEnd)
    } else if t.minute() == 0 && t.second() == 0 {
        Some(Boundary::HourStart)
    } else {
        None
    }
}

/// True iff the literal denotes exactly midnight.
pub fn is_day_start_constant(value: &Value) -> bool {
    classify_boundary(value) == Some(Boundary::DayStart)
}

/// True iff the literal denotes exactly 23:59:59.
pub fn is_day_end_constant(value: &Value) -> bool {
    classify_boundary(value) == Some(Boundary::DayEnd)
}

/// True iff the literal denotes the start of an hour (midnight included).
pub fn is_hour_start_constant(value: &Value) -> bool {
    classify_boundary(value).is_some_and(|b| b.is_hour_aligned())
}
