//! Feature modules: lowering, lambda emission, document assembly.

pub mod assembly;
pub mod lambda_gen;
pub mod lowering;
