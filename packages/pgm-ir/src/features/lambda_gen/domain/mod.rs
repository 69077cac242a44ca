//! Lambda stream — the side-channel of rendered computation units.

/// One rendered lambda, addressable by its generated unique name.
#[derive(Debug, Clone, PartialEq)]
pub struct LambdaDef {
    pub name: String,
    /// Original source line of the expression this lambda re-expresses.
    pub line: u32,
    pub source: String,
}

/// Append-only, order-preserving accumulator of rendered lambdas.
/// Downstream consumers address lambdas by name, but deterministic emission
/// order aids reproducibility and testing.
#[derive(Debug, Default)]
pub struct LambdaSink {
    defs: Vec<LambdaDef>,
}

impl LambdaSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, name: impl Into<String>, line: u32, source: String) {
        self.defs.push(LambdaDef {
            name: name.into(),
            line,
            source,
        });
    }

    pub fn defs(&self) -> &[LambdaDef] {
        &self.defs
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// The whole stream as one source text, units separated by blank lines
    /// in emission order.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for def in &self.defs {
            out.push_str(&def.source);
            out.push('\n');
        }
        out
    }
}
