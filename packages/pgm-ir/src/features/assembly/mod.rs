//! Fragment merge and top-level document assembly.

pub mod application;

pub use application::{translate_modules, Translation};
