//! Expression AST - the query tree the rewrite engine reads and writes.
//!
//! This is a closed, strongly-typed AST with exhaustive pattern matching
//! enforced by the compiler. Trees are produced by an upstream parser,
//! consumed once by the rewriter, and handed to a downstream printer; the
//! engine never mutates a node in place.

use serde::{Deserialize, Serialize};

// =============================================================================
// Expression AST
// =============================================================================

/// A query expression.
///
/// Every variant must be handled in the rewriter - the compiler enforces this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// Field access: an ordered chain of identifier segments,
    /// e.g. `properties.$browser` or `session.id`.
    Field(Field),

    /// Function call: name(args...)
    Call(Call),

    /// Comparison: left op right
    Compare {
        op: CompareOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// Logical conjunction over two or more operands.
    And(Vec<Expr>),

    /// Logical disjunction over two or more operands.
    Or(Vec<Expr>),

    /// Literal value.
    Constant(Value),

    /// Named expression: expr AS name
    Alias { name: String, expr: Box<Expr> },

    /// Nested SELECT usable in expression position.
    Select(Box<Select>),

    /// UNION-like combination of select branches.
    SetOperation(SetOperation),
}

/// A dotted field-access path, stored as explicit segments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub chain: Vec<String>,
}

impl Field {
    pub fn new(chain: Vec<&str>) -> Self {
        Self {
            chain: chain.into_iter().map(String::from).collect(),
        }
    }
}

/// A function call.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Call {
    pub name: String,
    pub args: Vec<Expr>,
    pub distinct: bool,
}

impl Call {
    pub fn new(name: &str, args: Vec<Expr>) -> Self {
        Self {
            name: name.into(),
            args,
            distinct: false,
        }
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    Eq,
    NotEq,
    Gt,
    GtEq,
    Lt,
    LtEq,
}

impl CompareOp {
    /// The function-call spelling of the operator. Comparisons are
    /// normalized to this form before rewrite recognition so the same
    /// recognizers apply to operator and call syntax.
    pub fn call_name(&self) -> &'static str {
        match self {
            CompareOp::Eq => "equals",
            CompareOp::NotEq => "notEquals",
            CompareOp::Gt => "greater",
            CompareOp::GtEq => "greaterOrEquals",
            CompareOp::Lt => "less",
            CompareOp::LtEq => "lessOrEquals",
        }
    }

    /// Inverse mapping of [`CompareOp::call_name`].
    pub fn from_call_name(name: &str) -> Option<Self> {
        match name {
            "equals" => Some(CompareOp::Eq),
            "notEquals" => Some(CompareOp::NotEq),
            "greater" => Some(CompareOp::Gt),
            "greaterOrEquals" => Some(CompareOp::GtEq),
            "less" => Some(CompareOp::Lt),
            "lessOrEquals" => Some(CompareOp::LtEq),
            _ => None,
        }
    }
}

/// Literal values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
}

// =============================================================================
// Select
// =============================================================================

/// A table reference with optional alias and optional row-sampling fraction.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TableSource {
    pub table: String,
    pub alias: Option<String>,
    /// SAMPLE fraction in (0, 1]. `None` means no sampling clause.
    pub sample: Option<f64>,
}

impl TableSource {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.into(),
            alias: None,
            sample: None,
        }
    }

    pub fn with_alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn with_sample(mut self, fraction: f64) -> Self {
        self.sample = Some(fraction);
        self
    }
}

/// Type of join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinKind {
    Inner,
    Left,
    Cross,
}

/// A JOIN clause. The rewriter never touches joins; their presence alone
/// disqualifies a select from rewriting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Join {
    pub kind: JoinKind,
    pub table: TableSource,
    pub on: Option<Expr>,
}

/// An ORDER BY expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderByExpr {
    pub expr: Expr,
    pub desc: bool,
}

/// An ARRAY JOIN clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayJoin {
    pub left: bool,
    pub exprs: Vec<Expr>,
}

/// A named sub-query (WITH clause entry).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cte {
    pub name: String,
    pub body: Expr,
}

impl Cte {
    pub fn new(name: &str, body: Expr) -> Self {
        Self {
            name: name.into(),
            body,
        }
    }
}

/// Kind of set operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SetOpKind {
    Union,
    UnionAll,
    Intersect,
    Except,
}

/// A set operation over two or more select branches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetOperation {
    pub op: SetOpKind,
    pub branches: Vec<Expr>,
}

impl SetOperation {
    pub fn union_all(branches: Vec<Expr>) -> Self {
        Self {
            op: SetOpKind::UnionAll,
            branches,
        }
    }
}

/// A SELECT block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
#[must_use = "builders have no effect until used"]
pub struct Select {
    pub ctes: Vec<Cte>,
    pub select: Vec<Expr>,
    pub distinct: bool,
    pub from: Option<TableSource>,
    pub joins: Vec<Join>,
    pub array_join: Option<ArrayJoin>,
    pub prewhere: Option<Expr>,
    pub where_clause: Option<Expr>,
    pub group_by: Vec<Expr>,
    pub having: Option<Expr>,
    pub window_exprs: Vec<Expr>,
    pub order_by: Vec<OrderByExpr>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub limit_by: Vec<Expr>,
    /// Reference to a named view instead of an inline source.
    pub view_name: Option<String>,
}

impl Select {
    /// Create an empty select.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a select over a named table.
    pub fn from_table(table: &str) -> Self {
        Self {
            from: Some(TableSource::new(table)),
            ..Self::default()
        }
    }

    /// Set the SELECT list.
    pub fn with_select(mut self, exprs: Vec<Expr>) -> Self {
        self.select = exprs;
        self
    }

    /// Set the FROM source.
    pub fn with_from(mut self, source: TableSource) -> Self {
        self.from = Some(source);
        self
    }

    /// Set the WHERE clause.
    pub fn with_where(mut self, expr: Expr) -> Self {
        self.where_clause = Some(expr);
        self
    }

    /// Set the PREWHERE clause.
    pub fn with_prewhere(mut self, expr: Expr) -> Self {
        self.prewhere = Some(expr);
        self
    }

    /// Set the GROUP BY list.
    pub fn with_group_by(mut self, exprs: Vec<Expr>) -> Self {
        self.group_by = exprs;
        self
    }

    /// Set the HAVING clause.
    pub fn with_having(mut self, expr: Expr) -> Self {
        self.having = Some(expr);
        self
    }

    /// Append an ORDER BY expression.
    pub fn order_by(mut self, expr: Expr, desc: bool) -> Self {
        self.order_by.push(OrderByExpr { expr, desc });
        self
    }

    /// Set LIMIT.
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set OFFSET.
    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Add DISTINCT.
    pub fn with_distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Append a named sub-query.
    pub fn with_cte(mut self, cte: Cte) -> Self {
        self.ctes.push(cte);
        self
    }

    /// Append a JOIN.
    pub fn join(mut self, kind: JoinKind, table: TableSource, on: Option<Expr>) -> Self {
        self.joins.push(Join { kind, table, on });
        self
    }

    /// Wrap into an expression node.
    pub fn into_expr(self) -> Expr {
        Expr::Select(Box::new(self))
    }
}

// =============================================================================
// Expression Constructors
// =============================================================================

/// Create a field reference from a dotted path.
pub fn field(path: &str) -> Expr {
    Expr::Field(Field {
        chain: path.split('.').map(String::from).collect(),
    })
}

/// Create a field reference from explicit chain segments.
pub fn field_chain(chain: Vec<&str>) -> Expr {
    Expr::Field(Field::new(chain))
}

/// Create a string literal.
pub fn lit_str(s: &str) -> Expr {
    Expr::Constant(Value::String(s.into()))
}

/// Create an integer literal.
pub fn lit_int(n: i64) -> Expr {
    Expr::Constant(Value::Int(n))
}

/// Create a float literal.
pub fn lit_float(f: f64) -> Expr {
    Expr::Constant(Value::Float(f))
}

/// Create a boolean literal.
pub fn lit_bool(b: bool) -> Expr {
    Expr::Constant(Value::Bool(b))
}

/// Create a NULL literal.
pub fn lit_null() -> Expr {
    Expr::Constant(Value::Null)
}

/// Generic function call.
pub fn call(name: &str, args: Vec<Expr>) -> Expr {
    Expr::Call(Call::new(name, args))
}

/// count() - the bare pageview/event counter.
pub fn count() -> Expr {
    Expr::Call(Call::new("count", vec![]))
}

/// count(DISTINCT expr)
pub fn count_distinct(expr: Expr) -> Expr {
    Expr::Call(Call::new("count", vec![expr]).distinct())
}

/// uniq(expr)
pub fn uniq(expr: Expr) -> Expr {
    Expr::Call(Call::new("uniq", vec![expr]))
}

/// Conjunction of operands.
pub fn and(operands: Vec<Expr>) -> Expr {
    Expr::And(operands)
}

/// Disjunction of operands.
pub fn or(operands: Vec<Expr>) -> Expr {
    Expr::Or(operands)
}

// =============================================================================
// Expression Builder Trait
// =============================================================================

/// Extension trait for building expressions fluently.
pub trait ExprExt: Sized {
    fn into_expr(self) -> Expr;

    fn compare(self, op: CompareOp, other: Expr) -> Expr {
        Expr::Compare {
            op,
            left: Box::new(self.into_expr()),
            right: Box::new(other),
        }
    }

    fn eq(self, other: Expr) -> Expr {
        self.compare(CompareOp::Eq, other)
    }

    fn not_eq(self, other: Expr) -> Expr {
        self.compare(CompareOp::NotEq, other)
    }

    fn gt(self, other: Expr) -> Expr {
        self.compare(CompareOp::Gt, other)
    }

    fn gt_eq(self, other: Expr) -> Expr {
        self.compare(CompareOp::GtEq, other)
    }

    fn lt(self, other: Expr) -> Expr {
        self.compare(CompareOp::Lt, other)
    }

    fn lt_eq(self, other: Expr) -> Expr {
        self.compare(CompareOp::LtEq, other)
    }

    fn alias(self, name: &str) -> Expr {
        Expr::Alias {
            name: name.into(),
            expr: Box::new(self.into_expr()),
        }
    }
}

impl ExprExt for Expr {
    fn into_expr(self) -> Expr {
        self
    }
}
