//! Cross-feature utilities.

pub mod name_registry;

pub use name_registry::NameRegistry;
