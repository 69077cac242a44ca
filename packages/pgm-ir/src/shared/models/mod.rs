//! Shared data model: input tree, source descriptors, PGM document, errors.

pub mod ast;
pub mod error;
pub mod pgm;
pub mod source;

pub use ast::{AccessContext, BinOp, BoolOp, CompareOp, Expr, Module, Number, Param, Stmt, UnaryOp};
pub use error::{PgmError, Result};
pub use pgm::{
    AssignBody, BodyEntry, IterationRange, NamedSource, PgmDocument, PgmFunction, SourceKind,
    TypedVariable,
};
pub use source::{CallDescriptor, Domain, SourceDescriptor, VariableReference};
