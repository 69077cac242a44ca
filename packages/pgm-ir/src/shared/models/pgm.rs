//! Program Graph Model — the emitted static dataflow/control document.
//!
//! Functions are the nodes, body records the edge list. The document is
//! built once per translation run, immutable after assembly, and serialized
//! as a single JSON record.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::source::{Domain, SourceDescriptor, VariableReference};

/// A named input of an `assign`/`decision` function: either a variable it
/// reads or a function it calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedSource {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SourceKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Variable,
    Function,
}

impl NamedSource {
    pub fn variable(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: SourceKind::Variable,
        }
    }

    pub fn function(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: SourceKind::Function,
        }
    }
}

/// The computation payload of an `assign` function: a reference into the
/// lambda stream, or a direct literal when the right-hand side was a lone
/// constant (no lambda is emitted for those).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AssignBody {
    Lambda {
        name: String,
        /// Original source line, for traceability back to the input tree.
        reference: u32,
    },
    Literal {
        dtype: Domain,
        value: serde_json::Value,
    },
}

/// A variable or parameter tagged with its domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypedVariable {
    pub name: String,
    pub domain: Domain,
}

/// Endpoints of a bounded loop; either endpoint may be a literal or a
/// variable reference descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationRange {
    pub start: SourceDescriptor,
    pub end: SourceDescriptor,
}

/// A named unit of computation in the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PgmFunction {
    /// One variable write computed from named sources.
    Assign {
        name: String,
        target: String,
        sources: Vec<NamedSource>,
        body: AssignBody,
    },
    /// Phi-style merge at a conditional exit: the condition output is always
    /// the first source, followed by the candidate versions.
    Decision {
        name: String,
        target: String,
        sources: Vec<NamedSource>,
    },
    /// A lowered function definition: typed parameters, typed locals, and
    /// the body records of its statement sequence.
    Container {
        name: String,
        input: Vec<TypedVariable>,
        variables: Vec<TypedVariable>,
        body: Vec<BodyEntry>,
    },
    /// One static loop replication template.
    LoopPlate {
        name: String,
        input: Vec<String>,
        index_variable: String,
        index_iteration_range: IterationRange,
        body: Vec<BodyEntry>,
    },
}

impl PgmFunction {
    pub fn name(&self) -> &str {
        match self {
            PgmFunction::Assign { name, .. }
            | PgmFunction::Decision { name, .. }
            | PgmFunction::Container { name, .. }
            | PgmFunction::LoopPlate { name, .. } => name,
        }
    }
}

/// One edge-list record: which function consumed which versioned inputs to
/// produce which versioned output. `output` is `None` for side-effecting
/// calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyEntry {
    pub name: String,
    pub input: Vec<VariableReference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<VariableReference>,
}

impl BodyEntry {
    pub fn new(
        name: impl Into<String>,
        input: Vec<VariableReference>,
        output: Option<VariableReference>,
    ) -> Self {
        Self {
            name: name.into(),
            input,
            output,
        }
    }
}

/// The assembled top-level document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PgmDocument {
    /// Entry call name discovered at module top level, or empty.
    pub start: String,
    pub name: String,
    #[serde(rename = "dateCreated")]
    pub date_created: String,
    pub functions: Vec<PgmFunction>,
    pub body: Vec<BodyEntry>,
}

impl PgmDocument {
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn function(&self, name: &str) -> Option<&PgmFunction> {
        self.functions.iter().find(|f| f.name() == name)
    }

    /// Well-formedness check: unique function names, and every body record
    /// that produces an output resolves to a defined function. Records with
    /// no output may name external side-effecting callees.
    pub fn integrity_violations(&self) -> Vec<String> {
        let mut violations = Vec::new();

        let mut seen = HashSet::new();
        for function in &self.functions {
            if !seen.insert(function.name()) {
                violations.push(format!("duplicate function name `{}`", function.name()));
            }
        }

        let defined: HashSet<&str> = self.functions.iter().map(|f| f.name()).collect();
        for entry in self.all_body_entries() {
            if entry.output.is_some() && !defined.contains(entry.name.as_str()) {
                violations.push(format!("body record references undefined `{}`", entry.name));
            }
        }

        violations
    }

    /// Body records of the document plus those nested in containers and
    /// loop plates.
    pub fn all_body_entries(&self) -> Vec<&BodyEntry> {
        let mut entries: Vec<&BodyEntry> = self.body.iter().collect();
        for function in &self.functions {
            match function {
                PgmFunction::Container { body, .. } | PgmFunction::LoopPlate { body, .. } => {
                    entries.extend(body.iter());
                }
                _ => {}
            }
        }
        entries
    }
}
