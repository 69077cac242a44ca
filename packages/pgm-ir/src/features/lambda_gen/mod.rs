//! Lambda emission: the side-channel of standalone computation units
//! referenced by name from the graph.

pub mod domain;
pub mod infrastructure;

pub use domain::{LambdaDef, LambdaSink};
pub use infrastructure::renderer::{render_expr, render_lambda};
