//! Expression lowering — syntax subtree to ordered source descriptors.
//!
//! Dispatch is exhaustive over the closed `Expr` sum type; anything outside
//! the supported subset is a fatal `UnsupportedConstruct`. Binary operators
//! and single comparisons between two literals are constant-folded so loop
//! bounds and simple constants never generate spurious graph nodes.

use crate::features::lowering::domain::TraversalContext;
use crate::shared::models::{
    AccessContext, BinOp, CallDescriptor, CompareOp, Domain, Expr, Number, PgmError, Result,
    SourceDescriptor, UnaryOp,
};

/// Lower an expression subtree. `line` is the enclosing statement's line,
/// used only for error reporting.
pub fn lower_expr(
    expr: &Expr,
    line: u32,
    ctx: &mut TraversalContext,
) -> Result<Vec<SourceDescriptor>> {
    match expr {
        Expr::Num { value } => Ok(vec![literal_of(*value)]),

        Expr::Str { value } => Ok(vec![SourceDescriptor::literal(
            Domain::String,
            value.clone(),
        )]),

        Expr::Name { id, ctx: access } => {
            let version = match access {
                AccessContext::Load => ctx.read_version(id),
                AccessContext::Store => ctx.write_version(id),
            };
            Ok(vec![SourceDescriptor::variable(id.clone(), version)])
        }

        Expr::List { elts } => {
            let mut sources = Vec::new();
            for elt in elts {
                sources.extend(lower_expr(elt, line, ctx)?);
            }
            Ok(sources)
        }

        Expr::BinOp { left, op, right } => {
            if let (Expr::Num { value: l }, Expr::Num { value: r }) = (&**left, &**right) {
                return Ok(vec![fold_binary(*op, *l, *r, line)?]);
            }
            let mut sources = lower_expr(left, line, ctx)?;
            sources.extend(lower_expr(right, line, ctx)?);
            Ok(sources)
        }

        Expr::UnaryOp { op, operand } => {
            // A signed numeric literal is still a literal.
            if let (UnaryOp::USub, Expr::Num { value }) = (op, &**operand) {
                return Ok(vec![literal_of(value.negated())]);
            }
            lower_expr(operand, line, ctx)
        }

        // Short-circuit boolean chains flatten to their operand sources.
        Expr::BoolOp { values, .. } => {
            let mut sources = Vec::new();
            for value in values {
                sources.extend(lower_expr(value, line, ctx)?);
            }
            Ok(sources)
        }

        Expr::Compare {
            left,
            ops,
            comparators,
        } => {
            if let ([op], [Expr::Num { value: r }]) = (ops.as_slice(), comparators.as_slice()) {
                if let Expr::Num { value: l } = &**left {
                    return Ok(vec![fold_compare(*op, *l, *r)]);
                }
            }
            let mut sources = lower_expr(left, line, ctx)?;
            for comparator in comparators {
                sources.extend(lower_expr(comparator, line, ctx)?);
            }
            Ok(sources)
        }

        Expr::Call { func, args } => {
            let function = callee_name(func, line)?;
            let mut inputs = Vec::with_capacity(args.len());
            for arg in args {
                inputs.push(lower_expr(arg, line, ctx)?);
            }
            Ok(vec![SourceDescriptor::Call(CallDescriptor {
                function,
                inputs,
            })])
        }

        Expr::Subscript { value, index, ctx: access } => {
            let base = match &**value {
                Expr::Name { id, .. } => id.clone(),
                other => return Err(PgmError::unsupported(other.kind_name(), line)),
            };
            if !matches!(&**index, Expr::Num { .. }) {
                return Err(PgmError::ArrayIndexingUnsupported { variable: base });
            }

            // Array element accesses share one version counter per array;
            // indices are not distinguished (documented approximation).
            let version = match access {
                AccessContext::Load => ctx.read_version(&base),
                AccessContext::Store => ctx.write_version(&base),
            };
            Ok(vec![SourceDescriptor::variable(base, version)])
        }

        Expr::Attribute { .. } => Err(PgmError::unsupported(expr.kind_name(), line)),

        Expr::Unsupported { construct } => Err(PgmError::unsupported(construct.clone(), line)),
    }
}

/// Resolve a call target name, qualifying attribute-style callees with
/// their receiver (`module.function`).
pub fn callee_name(func: &Expr, line: u32) -> Result<String> {
    match func {
        Expr::Name { id, .. } => Ok(id.clone()),
        Expr::Attribute { value, attr } => match &**value {
            Expr::Name { id, .. } => Ok(format!("{}.{}", id, attr)),
            other => Err(PgmError::unsupported(other.kind_name(), line)),
        },
        other => Err(PgmError::unsupported(other.kind_name(), line)),
    }
}

fn literal_of(value: Number) -> SourceDescriptor {
    match value {
        Number::Int(n) => SourceDescriptor::literal(Domain::Integer, n),
        Number::Float(f) => SourceDescriptor::literal(Domain::Real, f),
    }
}

fn fold_binary(op: BinOp, left: Number, right: Number, line: u32) -> Result<SourceDescriptor> {
    if let (Number::Int(l), Number::Int(r)) = (left, right) {
        // Division always promotes; the others stay integral when exact.
        let folded = match op {
            BinOp::Add => l.checked_add(r),
            BinOp::Sub => l.checked_sub(r),
            BinOp::Mult => l.checked_mul(r),
            BinOp::Div => None,
            BinOp::Pow => u32::try_from(r).ok().and_then(|exp| l.checked_pow(exp)),
        };
        if let Some(n) = folded {
            return Ok(SourceDescriptor::literal(Domain::Integer, n));
        }
    }

    let l = left.as_f64();
    let r = right.as_f64();
    let value = match op {
        BinOp::Add => l + r,
        BinOp::Sub => l - r,
        BinOp::Mult => l * r,
        BinOp::Div => l / r,
        BinOp::Pow => l.powf(r),
    };
    // Division by zero and friends. A non-finite f64 would serialize as
    // JSON null, corrupting the document instead of failing the run.
    if !value.is_finite() {
        return Err(PgmError::unsupported("non-finite constant arithmetic", line));
    }
    Ok(SourceDescriptor::literal(Domain::Real, value))
}

fn fold_compare(op: CompareOp, left: Number, right: Number) -> SourceDescriptor {
    let l = left.as_f64();
    let r = right.as_f64();
    let value = match op {
        CompareOp::Eq => l == r,
        CompareOp::NotEq => l != r,
        CompareOp::Lt => l < r,
        CompareOp::LtE => l <= r,
        CompareOp::Gt => l > r,
        CompareOp::GtE => l >= r,
    };
    SourceDescriptor::literal(Domain::Boolean, value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ctx() -> TraversalContext {
        TraversalContext::for_function("f")
    }

    #[test]
    fn test_literal_domains() {
        let mut ctx = ctx();
        assert_eq!(
            lower_expr(&Expr::int(2), 1, &mut ctx).unwrap(),
            vec![SourceDescriptor::literal(Domain::Integer, 2)]
        );
        assert_eq!(
            lower_expr(&Expr::float(2.5), 1, &mut ctx).unwrap(),
            vec![SourceDescriptor::literal(Domain::Real, 2.5)]
        );
        assert_eq!(
            lower_expr(&Expr::str("ab"), 1, &mut ctx).unwrap(),
            vec![SourceDescriptor::literal(Domain::String, "ab")]
        );
    }

    #[test]
    fn test_name_read_and_write_versions() {
        let mut ctx = ctx();
        let read = lower_expr(&Expr::load("x"), 1, &mut ctx).unwrap();
        assert_eq!(read, vec![SourceDescriptor::variable("x", 0)]);

        let write = lower_expr(&Expr::store("x"), 1, &mut ctx).unwrap();
        assert_eq!(write, vec![SourceDescriptor::variable("x", 1)]);

        let read_again = lower_expr(&Expr::load("x"), 1, &mut ctx).unwrap();
        assert_eq!(read_again, vec![SourceDescriptor::variable("x", 1)]);
    }

    #[test]
    fn test_binary_folding_is_a_single_literal() {
        let mut ctx = ctx();
        let sources =
            lower_expr(&Expr::bin(Expr::int(2), BinOp::Add, Expr::int(3)), 1, &mut ctx).unwrap();
        assert_eq!(sources, vec![SourceDescriptor::literal(Domain::Integer, 5)]);

        let sources =
            lower_expr(&Expr::bin(Expr::int(1), BinOp::Div, Expr::int(2)), 1, &mut ctx).unwrap();
        assert_eq!(sources, vec![SourceDescriptor::literal(Domain::Real, 0.5)]);

        let sources = lower_expr(
            &Expr::bin(Expr::float(1.5), BinOp::Mult, Expr::int(2)),
            1,
            &mut ctx,
        )
        .unwrap();
        assert_eq!(sources, vec![SourceDescriptor::literal(Domain::Real, 3.0)]);
    }

    #[test]
    fn test_comparison_folding_to_boolean() {
        let mut ctx = ctx();
        let sources = lower_expr(
            &Expr::compare(Expr::int(2), CompareOp::LtE, Expr::int(3)),
            1,
            &mut ctx,
        )
        .unwrap();
        assert_eq!(sources, vec![SourceDescriptor::literal(Domain::Boolean, true)]);
    }

    #[test]
    fn test_non_finite_folds_rejected() {
        // A null would otherwise land in the document where a number belongs.
        let mut ctx = ctx();
        assert_eq!(
            lower_expr(&Expr::bin(Expr::int(1), BinOp::Div, Expr::int(0)), 7, &mut ctx),
            Err(PgmError::unsupported("non-finite constant arithmetic", 7))
        );
        assert_eq!(
            lower_expr(&Expr::bin(Expr::int(0), BinOp::Pow, Expr::int(-1)), 8, &mut ctx),
            Err(PgmError::unsupported("non-finite constant arithmetic", 8))
        );
        assert_eq!(
            lower_expr(
                &Expr::bin(Expr::float(0.0), BinOp::Div, Expr::float(0.0)),
                9,
                &mut ctx,
            ),
            Err(PgmError::unsupported("non-finite constant arithmetic", 9))
        );
    }

    #[test]
    fn test_variable_operand_disables_folding() {
        let mut ctx = ctx();
        let sources =
            lower_expr(&Expr::bin(Expr::load("x"), BinOp::Add, Expr::int(3)), 1, &mut ctx).unwrap();
        assert_eq!(
            sources,
            vec![
                SourceDescriptor::variable("x", 0),
                SourceDescriptor::literal(Domain::Integer, 3),
            ]
        );
    }

    #[test]
    fn test_negated_literal_keeps_its_sign() {
        let mut ctx = ctx();
        let sources = lower_expr(
            &Expr::UnaryOp {
                op: UnaryOp::USub,
                operand: Box::new(Expr::int(3)),
            },
            1,
            &mut ctx,
        )
        .unwrap();
        assert_eq!(sources, vec![SourceDescriptor::literal(Domain::Integer, -3)]);
    }

    #[test]
    fn test_bool_op_flattens_operands() {
        let mut ctx = ctx();
        let expr = Expr::BoolOp {
            op: crate::shared::models::BoolOp::And,
            values: vec![
                Expr::compare(Expr::load("a"), CompareOp::Lt, Expr::load("b")),
                Expr::load("c"),
            ],
        };
        let sources = lower_expr(&expr, 1, &mut ctx).unwrap();
        let names: Vec<_> = sources
            .iter()
            .filter_map(|s| s.as_variable())
            .map(|v| v.variable.as_str())
            .collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_call_with_attribute_receiver() {
        let mut ctx = ctx();
        let expr = Expr::Call {
            func: Box::new(Expr::Attribute {
                value: Box::new(Expr::load("fmt")),
                attr: "write_line".into(),
            }),
            args: vec![Expr::load("val")],
        };
        let sources = lower_expr(&expr, 1, &mut ctx).unwrap();
        let call = sources[0].as_call().unwrap();
        assert_eq!(call.function, "fmt.write_line");
        assert_eq!(call.inputs.len(), 1);
    }

    #[test]
    fn test_subscript_write_bumps_array_version() {
        let mut ctx = ctx();
        let expr = Expr::Subscript {
            value: Box::new(Expr::load("arr")),
            index: Box::new(Expr::int(0)),
            ctx: AccessContext::Store,
        };
        let sources = lower_expr(&expr, 1, &mut ctx).unwrap();
        assert_eq!(sources, vec![SourceDescriptor::variable("arr", 1)]);
    }

    #[test]
    fn test_non_constant_subscript_rejected() {
        let mut ctx = ctx();
        let expr = Expr::Subscript {
            value: Box::new(Expr::load("arr")),
            index: Box::new(Expr::load("i")),
            ctx: AccessContext::Load,
        };
        assert_eq!(
            lower_expr(&expr, 4, &mut ctx),
            Err(PgmError::ArrayIndexingUnsupported {
                variable: "arr".into()
            })
        );
    }

    #[test]
    fn test_unsupported_construct_is_fatal() {
        let mut ctx = ctx();
        let expr = Expr::Unsupported {
            construct: "starred".into(),
        };
        assert_eq!(
            lower_expr(&expr, 9, &mut ctx),
            Err(PgmError::unsupported("starred", 9))
        );
    }
}
