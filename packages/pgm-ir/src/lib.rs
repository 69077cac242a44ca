/*
 * pgm-ir — tree-to-graph lowering for the Program Graph Model.
 *
 * Feature-First Hexagonal Architecture:
 * - shared/     : Common models (syntax tree, descriptors, PGM document, errors)
 * - features/   : Vertical slices (lowering → lambda_gen → assembly)
 *
 * The pass walks a restricted-subset syntax tree, assigns SSA-style
 * version numbers to variable writes, emits named lambda units for every
 * computation, and reifies loops and conditionals as loop plates and
 * decision merges. Single-threaded by design: a batch compiler step, not
 * a server.
 */

#![allow(clippy::module_inception)] // Module naming intentional
#![allow(clippy::new_without_default)] // Default impl not always needed

/// Shared models and utilities
pub mod shared;

/// Feature modules (lowering pipeline stages)
pub mod features;

// Re-exports for the public API.
pub use features::assembly::{translate_modules, Translation};
pub use features::lambda_gen::{LambdaDef, LambdaSink};
pub use features::lowering::{Fragment, StatementLowering, TraversalContext};
pub use shared::models::{
    AccessContext, AssignBody, BinOp, BodyEntry, BoolOp, CompareOp, Domain, Expr, IterationRange,
    Module, NamedSource, Number, Param, PgmDocument, PgmError, PgmFunction, Result,
    SourceDescriptor, SourceKind, Stmt, TypedVariable, UnaryOp, VariableReference,
};
pub use shared::utils::NameRegistry;
