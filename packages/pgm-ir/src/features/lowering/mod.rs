//! Tree-to-graph lowering: scope/version tracking, expression lowering,
//! and statement lowering.

pub mod domain;
pub mod infrastructure;

pub use domain::{Fragment, TraversalContext};
pub use infrastructure::expression_lowering::lower_expr;
pub use infrastructure::statement_lowering::StatementLowering;
