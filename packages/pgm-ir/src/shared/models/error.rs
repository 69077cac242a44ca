//! Error taxonomy for the lowering pass.
//!
//! Every failure is fatal and unrecoverable from within the pass: the input
//! tree is either fully lowerable under the supported subset or the whole
//! translation aborts. No partial document is produced on failure.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PgmError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PgmError {
    /// A tree node kind without a lowering handler. Fail-fast by design:
    /// silently skipping unknown constructs would silently corrupt the graph.
    #[error("unsupported construct `{construct}` at line {line}")]
    UnsupportedConstruct { construct: String, line: u32 },

    /// Missing or unrecognized type annotation.
    #[error("unsupported type annotation `{annotation}`")]
    UnsupportedType { annotation: String },

    /// A body variable whose domain could not be established from any
    /// annotation, literal, or typed source.
    #[error("no domain could be established for variable `{variable}`")]
    MissingDomain { variable: String },

    /// Loop header does not conform to the supported range form.
    #[error("unsupported loop range: {reason}")]
    UnsupportedRange { reason: String },

    /// More than one loop index target.
    #[error("only one loop index variable is supported, found {count}")]
    MultipleLoopIndices { count: usize },

    /// Subscript with a non-constant index expression.
    #[error("array indexing with a non-constant subscript is unsupported for `{variable}`")]
    ArrayIndexingUnsupported { variable: String },
}

impl PgmError {
    pub fn unsupported(construct: impl Into<String>, line: u32) -> Self {
        PgmError::UnsupportedConstruct {
            construct: construct.into(),
            line,
        }
    }

    pub fn range(reason: impl Into<String>) -> Self {
        PgmError::UnsupportedRange {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PgmError::unsupported("while", 17);
        assert_eq!(format!("{}", err), "unsupported construct `while` at line 17");

        let err = PgmError::UnsupportedType {
            annotation: "complex".into(),
        };
        assert!(format!("{}", err).contains("complex"));
    }
}
