//! Deterministic unique-name generation for PGM functions.
//!
//! Names derive from `{enclosing}__{role}__{subject}` basenames plus a
//! per-basename counter, so repeated constructs (two `if` statements in the
//! same function, say) never collide. The registry is passed explicitly
//! into the lowering call rather than living in a module global, so
//! independent translations never interfere.

use rustc_hash::FxHashMap;

#[derive(Debug, Default)]
pub struct NameRegistry {
    counters: FxHashMap<String, u32>,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next unique name for a basename: `{basename}_{n}` with n starting
    /// at 0 and strictly increasing per basename.
    pub fn fresh(&mut self, basename: &str) -> String {
        let counter = self.counters.entry(basename.to_string()).or_insert(0);
        let name = format!("{}_{}", basename, counter);
        *counter += 1;
        name
    }
}
