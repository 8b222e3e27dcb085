//! The rewrite engine: context, expression visitor, select-level
//! rewriter, and tree-wide driver.

pub mod context;
pub mod driver;
pub mod expr;
pub mod select;

pub use context::{RewriteScope, RewriteSettings};
pub use driver::{rewrite_node, rewrite_query};
pub use expr::{rewrite_all, rewrite_expr};
pub use select::rewrite_select;
