pub mod expression_lowering;
pub mod statement_lowering;
