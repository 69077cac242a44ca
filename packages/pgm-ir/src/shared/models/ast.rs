//! Input syntax tree — the restricted subset accepted by the lowering pass.
//!
//! Closed sum types with one variant per supported construct plus an
//! `Unsupported` catch-all, so lowering is exhaustive pattern matching and a
//! new construct surfaces at the match site, not as silent graph corruption.
//! The tree is produced by an external front end; serde tagging (`kind`)
//! lets it arrive as JSON.

use serde::{Deserialize, Serialize};

/// One source file's top-level statement sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub body: Vec<Stmt>,
}

impl Module {
    pub fn new(body: Vec<Stmt>) -> Self {
        Self { body }
    }
}

/// Whether a name/subscript occurrence reads or writes the variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessContext {
    Load,
    Store,
}

/// A function parameter with its mandatory domain annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    pub annotation: String,
}

impl Param {
    pub fn new(name: impl Into<String>, annotation: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            annotation: annotation.into(),
        }
    }
}

/// Statement kinds. Lines are 1-based and preserved for lambda traceability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Stmt {
    FunctionDef {
        name: String,
        params: Vec<Param>,
        body: Vec<Stmt>,
        line: u32,
    },
    Assign {
        targets: Vec<Expr>,
        value: Expr,
        line: u32,
    },
    AnnAssign {
        target: Expr,
        annotation: String,
        value: Option<Expr>,
        line: u32,
    },
    If {
        test: Expr,
        body: Vec<Stmt>,
        orelse: Vec<Stmt>,
        line: u32,
    },
    For {
        targets: Vec<Expr>,
        iter: Expr,
        body: Vec<Stmt>,
        orelse: Vec<Stmt>,
        line: u32,
    },
    Expr {
        value: Expr,
        line: u32,
    },
    Unsupported {
        construct: String,
        line: u32,
    },
}

impl Stmt {
    pub fn line(&self) -> u32 {
        match self {
            Stmt::FunctionDef { line, .. }
            | Stmt::Assign { line, .. }
            | Stmt::AnnAssign { line, .. }
            | Stmt::If { line, .. }
            | Stmt::For { line, .. }
            | Stmt::Expr { line, .. }
            | Stmt::Unsupported { line, .. } => *line,
        }
    }
}

/// Numeric literal payload.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Int(n) => n as f64,
            Number::Float(f) => f,
        }
    }

    pub fn negated(self) -> Number {
        match self {
            Number::Int(n) => Number::Int(-n),
            Number::Float(f) => Number::Float(-f),
        }
    }
}

/// Binary arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    Add,
    Sub,
    Mult,
    Div,
    Pow,
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    UAdd,
    USub,
    Not,
}

/// Short-circuit boolean operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoolOp {
    And,
    Or,
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    Eq,
    NotEq,
    Lt,
    LtE,
    Gt,
    GtE,
}

/// Expression kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Expr {
    Name {
        id: String,
        ctx: AccessContext,
    },
    Num {
        value: Number,
    },
    Str {
        value: String,
    },
    List {
        elts: Vec<Expr>,
    },
    BinOp {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
    },
    UnaryOp {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    BoolOp {
        op: BoolOp,
        values: Vec<Expr>,
    },
    Compare {
        left: Box<Expr>,
        ops: Vec<CompareOp>,
        comparators: Vec<Expr>,
    },
    Call {
        func: Box<Expr>,
        args: Vec<Expr>,
    },
    Attribute {
        value: Box<Expr>,
        attr: String,
    },
    Subscript {
        value: Box<Expr>,
        index: Box<Expr>,
        ctx: AccessContext,
    },
    Unsupported {
        construct: String,
    },
}

impl Expr {
    /// The construct name reported by `UnsupportedConstruct` errors.
    pub fn kind_name(&self) -> &str {
        match self {
            Expr::Name { .. } => "name",
            Expr::Num { .. } => "num",
            Expr::Str { .. } => "str",
            Expr::List { .. } => "list",
            Expr::BinOp { .. } => "binop",
            Expr::UnaryOp { .. } => "unaryop",
            Expr::BoolOp { .. } => "boolop",
            Expr::Compare { .. } => "compare",
            Expr::Call { .. } => "call",
            Expr::Attribute { .. } => "attribute",
            Expr::Subscript { .. } => "subscript",
            Expr::Unsupported { construct } => construct,
        }
    }

    // Convenience constructors for front ends and tests.

    pub fn load(id: impl Into<String>) -> Self {
        Expr::Name {
            id: id.into(),
            ctx: AccessContext::Load,
        }
    }

    pub fn store(id: impl Into<String>) -> Self {
        Expr::Name {
            id: id.into(),
            ctx: AccessContext::Store,
        }
    }

    pub fn int(value: i64) -> Self {
        Expr::Num {
            value: Number::Int(value),
        }
    }

    pub fn float(value: f64) -> Self {
        Expr::Num {
            value: Number::Float(value),
        }
    }

    pub fn str(value: impl Into<String>) -> Self {
        Expr::Str {
            value: value.into(),
        }
    }

    pub fn bin(left: Expr, op: BinOp, right: Expr) -> Self {
        Expr::BinOp {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    pub fn compare(left: Expr, op: CompareOp, right: Expr) -> Self {
        Expr::Compare {
            left: Box::new(left),
            ops: vec![op],
            comparators: vec![right],
        }
    }

    pub fn call(func: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Call {
            func: Box::new(Expr::load(func)),
            args,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stmt_json_round_trip() {
        let stmt = Stmt::Assign {
            targets: vec![Expr::store("x")],
            value: Expr::bin(Expr::load("y"), BinOp::Add, Expr::int(1)),
            line: 3,
        };
        let json = serde_json::to_string(&stmt).unwrap();
        let back: Stmt = serde_json::from_str(&json).unwrap();
        assert_eq!(stmt, back);
    }

    #[test]
    fn test_kind_tagging() {
        let json = serde_json::to_value(Expr::load("x")).unwrap();
        assert_eq!(json["kind"], "Name");
        assert_eq!(json["ctx"], "load");
    }

    #[test]
    fn test_number_untagged() {
        let int: Number = serde_json::from_str("2").unwrap();
        assert_eq!(int, Number::Int(2));
        let float: Number = serde_json::from_str("2.5").unwrap();
        assert_eq!(float, Number::Float(2.5));
    }

    #[test]
    fn test_unknown_kind_is_an_error() {
        let result: std::result::Result<Expr, _> =
            serde_json::from_str(r#"{"kind": "Starred"}"#);
        assert!(result.is_err());
    }
}
