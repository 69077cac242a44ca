//! Lowering domain — traversal contexts and fragments.
//!
//! A `TraversalContext` is the per-scope version/type store. Nested scopes
//! copy the mappings they need by value; sibling branches never alias, and
//! callers reconcile divergent versions explicitly after a nested traversal
//! returns.

use rustc_hash::FxHashMap;

use crate::shared::models::{BodyEntry, Domain, PgmFunction};

/// Counter key for synthesized condition variables. Kept out of `last_defs`
/// so it never shows up as a container variable.
const COND_COUNTER: &str = "#cond";

/// Per-scope variable version and type state.
#[derive(Debug, Clone)]
pub struct TraversalContext {
    /// Most recent version visible for reads, per variable.
    last_defs: FxHashMap<String, i64>,
    /// Next version to assign on a write, per variable.
    next_defs: FxHashMap<String, i64>,
    /// Version treated as "not yet defined" in this scope: 0 at function
    /// entry, -1 inside a loop body so the first in-loop write is
    /// distinguishable from any value entering the loop.
    baseline_version: i64,
    /// Variable domains registered so far.
    var_types: FxHashMap<String, Domain>,
    /// Enclosing function, if any. Top-level statements outside a function
    /// only contribute start-call discovery.
    current_function: Option<String>,
    /// First-touch order of `last_defs` keys, for deterministic output.
    def_order: Vec<String>,
}

impl TraversalContext {
    /// Root context for module top-level traversal.
    pub fn root() -> Self {
        Self {
            last_defs: FxHashMap::default(),
            next_defs: FxHashMap::default(),
            baseline_version: 0,
            var_types: FxHashMap::default(),
            current_function: None,
            def_order: Vec::new(),
        }
    }

    /// Fully isolated scope for a function definition.
    pub fn for_function(name: impl Into<String>) -> Self {
        Self {
            current_function: Some(name.into()),
            ..Self::root()
        }
    }

    /// Branch scope for one arm of a conditional: full value copy. Version
    /// continuity across sibling arms is reconciled by the caller via
    /// `adopt_next_defs`.
    pub fn branch_scope(&self) -> Self {
        self.clone()
    }

    /// Loop-body scope: empty version maps and baseline -1, so the first
    /// in-loop write of any variable gets version 0.
    pub fn loop_scope(&self) -> Self {
        Self {
            last_defs: FxHashMap::default(),
            next_defs: FxHashMap::default(),
            baseline_version: -1,
            var_types: self.var_types.clone(),
            current_function: self.current_function.clone(),
            def_order: Vec::new(),
        }
    }

    pub fn function_name(&self) -> Option<&str> {
        self.current_function.as_deref()
    }

    /// Current version for a read. A read-before-write installs and returns
    /// the baseline; it is never an error.
    pub fn read_version(&mut self, variable: &str) -> i64 {
        if let Some(&version) = self.last_defs.get(variable) {
            return version;
        }
        self.record_def(variable, self.baseline_version);
        self.baseline_version
    }

    /// Version for a read without installing an entry. Used where observing
    /// a variable must not make it visible in this scope (loop-plate call
    /// inputs in the enclosing fragment).
    pub fn peek_version(&self, variable: &str) -> i64 {
        self.last_defs
            .get(variable)
            .copied()
            .unwrap_or(self.baseline_version)
    }

    /// New version for a write. Strictly increasing per variable per scope;
    /// observable by subsequent reads in the same scope.
    pub fn write_version(&mut self, variable: &str) -> i64 {
        let version = self
            .next_defs
            .get(variable)
            .copied()
            .unwrap_or(self.baseline_version + 1);
        self.next_defs.insert(variable.to_string(), version + 1);
        self.record_def(variable, version);
        version
    }

    /// Install a specific version, e.g. version 0 of a synthesized
    /// condition variable.
    pub fn seed_version(&mut self, variable: &str, version: i64) {
        self.record_def(variable, version);
    }

    /// Version of a variable if this scope has touched it.
    pub fn version_of(&self, variable: &str) -> Option<i64> {
        self.last_defs.get(variable).copied()
    }

    /// Allocate the next synthesized-condition index for this scope.
    pub fn next_condition_index(&mut self) -> i64 {
        let index = self
            .next_defs
            .get(COND_COUNTER)
            .copied()
            .unwrap_or(self.baseline_version + 1);
        self.next_defs.insert(COND_COUNTER.to_string(), index + 1);
        index
    }

    pub fn register_type(&mut self, variable: &str, domain: Domain) {
        self.var_types.insert(variable.to_string(), domain);
    }

    pub fn domain_of(&self, variable: &str) -> Option<Domain> {
        self.var_types.get(variable).copied()
    }

    /// Variables touched in this scope, in first-touch order.
    pub fn defined_variables(&self) -> &[String] {
        &self.def_order
    }

    /// Variables actually written in this scope, in first-touch order.
    pub fn written_variables(&self) -> Vec<String> {
        self.def_order
            .iter()
            .filter(|variable| self.next_defs.contains_key(*variable))
            .cloned()
            .collect()
    }

    /// Continue version numbering after a sibling scope, so candidates
    /// produced by two arms of a conditional stay distinct.
    pub fn adopt_next_defs(&mut self, other: &TraversalContext) {
        self.next_defs = other.next_defs.clone();
    }

    /// Take over domains registered inside a nested scope.
    pub fn adopt_types(&mut self, other: &TraversalContext) {
        for (variable, domain) in &other.var_types {
            self.var_types
                .entry(variable.clone())
                .or_insert(*domain);
        }
    }

    fn record_def(&mut self, variable: &str, version: i64) {
        if self.last_defs.insert(variable.to_string(), version).is_none() {
            self.def_order.push(variable.to_string());
        }
    }
}

/// An intermediate (functions, body records) pair produced while lowering a
/// statement or statement sequence. Order is preserved for deterministic
/// output.
#[derive(Debug, Clone, Default)]
pub struct Fragment {
    pub functions: Vec<PgmFunction>,
    pub body: Vec<BodyEntry>,
}

impl Fragment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_function(&mut self, function: PgmFunction) {
        self.functions.push(function);
    }

    pub fn push_body(&mut self, entry: BodyEntry) {
        self.body.push(entry);
    }

    /// Append another fragment, keeping both orders.
    pub fn merge(&mut self, other: Fragment) {
        self.functions.extend(other.functions);
        self.body.extend(other.body);
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty() && self.body.is_empty()
    }
}
