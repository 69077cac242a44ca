//! Source descriptors — the intermediate result of expression lowering.
//!
//! An expression subtree lowers to an ordered list of descriptors: the
//! literals, versioned variable reads/writes, and calls it mentions. The
//! statement layer turns these into PGM functions and body records.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Variable domains supported by the PGM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Integer,
    Real,
    String,
    Boolean,
}

impl Domain {
    /// Map a source-level annotation to a domain.
    ///
    /// `List[T]` annotations register the element domain; the per-element
    /// versioning approximation means the list itself carries no extra type.
    pub fn from_annotation(annotation: &str) -> Option<Domain> {
        let inner = annotation
            .strip_prefix("List[")
            .and_then(|rest| rest.strip_suffix(']'))
            .unwrap_or(annotation);
        match inner.trim() {
            "int" => Some(Domain::Integer),
            "float" => Some(Domain::Real),
            "str" => Some(Domain::String),
            "bool" => Some(Domain::Boolean),
            _ => None,
        }
    }
}

/// A versioned read/write handle on a variable.
///
/// Two references denote the same value iff both fields are equal. The
/// version is serialized as `index` for compatibility with the persisted
/// document format.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VariableReference {
    pub variable: String,
    #[serde(rename = "index")]
    pub version: i64,
}

impl VariableReference {
    pub fn new(variable: impl Into<String>, version: i64) -> Self {
        Self {
            variable: variable.into(),
            version,
        }
    }

    /// Versioned display name, e.g. `x_2`. Used by decision sources.
    pub fn versioned_name(&self) -> String {
        format!("{}_{}", self.variable, self.version)
    }
}

/// A call mentioned by an expression. Each syntactic argument keeps its own
/// descriptor list so multi-descriptor arguments (e.g. range bounds lowered
/// from a list) survive intact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallDescriptor {
    pub function: String,
    pub inputs: Vec<Vec<SourceDescriptor>>,
}

/// One lowered source of a computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SourceDescriptor {
    Literal { dtype: Domain, value: Value },
    Variable(VariableReference),
    Call(CallDescriptor),
}

impl SourceDescriptor {
    pub fn literal(dtype: Domain, value: impl Into<Value>) -> Self {
        SourceDescriptor::Literal {
            dtype,
            value: value.into(),
        }
    }

    pub fn variable(variable: impl Into<String>, version: i64) -> Self {
        SourceDescriptor::Variable(VariableReference::new(variable, version))
    }

    pub fn as_variable(&self) -> Option<&VariableReference> {
        match self {
            SourceDescriptor::Variable(var) => Some(var),
            _ => None,
        }
    }

    pub fn as_call(&self) -> Option<&CallDescriptor> {
        match self {
            SourceDescriptor::Call(call) => Some(call),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_from_annotation() {
        assert_eq!(Domain::from_annotation("int"), Some(Domain::Integer));
        assert_eq!(Domain::from_annotation("float"), Some(Domain::Real));
        assert_eq!(Domain::from_annotation("List[int]"), Some(Domain::Integer));
        assert_eq!(Domain::from_annotation("complex"), None);
    }

    #[test]
    fn test_variable_reference_identity() {
        let a = VariableReference::new("x", 1);
        let b = VariableReference::new("x", 1);
        let c = VariableReference::new("x", 2);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(c.versioned_name(), "x_2");
    }

    #[test]
    fn test_version_serializes_as_index() {
        let var = VariableReference::new("x", 3);
        let json = serde_json::to_value(&var).unwrap();
        assert_eq!(json["index"], 3);
        assert!(json.get("version").is_none());
    }

    #[test]
    fn test_descriptor_tagging() {
        let lit = SourceDescriptor::literal(Domain::Integer, 5);
        let json = serde_json::to_value(&lit).unwrap();
        assert_eq!(json["type"], "literal");
        assert_eq!(json["dtype"], "integer");

        let var = SourceDescriptor::variable("x", 0);
        let json = serde_json::to_value(&var).unwrap();
        assert_eq!(json["type"], "variable");
        assert_eq!(json["variable"], "x");
    }
}
