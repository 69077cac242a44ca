//! Lambda source rendering — re-expresses an expression subtree as a
//! standalone callable unit `def name(inputs): return value`.
//!
//! The rendering is a faithful re-expression of the original computation,
//! not of the graph: descriptors lose operator structure during lowering,
//! so the lambda body is rendered from the syntax tree itself.

use crate::shared::models::{BinOp, BoolOp, CompareOp, Expr, Number, UnaryOp};

/// Render one lambda unit.
pub fn render_lambda(name: &str, params: &[String], expr: &Expr) -> String {
    format!(
        "def {}({}):\n    return {}\n",
        name,
        params.join(", "),
        render_expr(expr)
    )
}

/// Render an expression back to source text. Binary and unary forms are
/// parenthesized so operator precedence never needs reconstruction.
pub fn render_expr(expr: &Expr) -> String {
    match expr {
        Expr::Name { id, .. } => id.clone(),
        Expr::Num { value } => render_number(*value),
        Expr::Str { value } => format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\"")),
        Expr::List { elts } => {
            let items: Vec<String> = elts.iter().map(render_expr).collect();
            format!("[{}]", items.join(", "))
        }
        Expr::BinOp { left, op, right } => format!(
            "({} {} {})",
            render_expr(left),
            bin_op_token(*op),
            render_expr(right)
        ),
        Expr::UnaryOp { op, operand } => match op {
            UnaryOp::UAdd => format!("(+{})", render_expr(operand)),
            UnaryOp::USub => format!("(-{})", render_expr(operand)),
            UnaryOp::Not => format!("(not {})", render_expr(operand)),
        },
        Expr::BoolOp { op, values } => {
            let token = match op {
                BoolOp::And => " and ",
                BoolOp::Or => " or ",
            };
            let parts: Vec<String> = values.iter().map(render_expr).collect();
            format!("({})", parts.join(token))
        }
        Expr::Compare {
            left,
            ops,
            comparators,
        } => {
            let mut out = format!("({}", render_expr(left));
            for (op, comparator) in ops.iter().zip(comparators) {
                out.push_str(&format!(
                    " {} {}",
                    compare_op_token(*op),
                    render_expr(comparator)
                ));
            }
            out.push(')');
            out
        }
        Expr::Call { func, args } => {
            let rendered: Vec<String> = args.iter().map(render_expr).collect();
            format!("{}({})", render_expr(func), rendered.join(", "))
        }
        Expr::Attribute { value, attr } => format!("{}.{}", render_expr(value), attr),
        Expr::Subscript { value, index, .. } => {
            format!("{}[{}]", render_expr(value), render_expr(index))
        }
        Expr::Unsupported { construct } => format!("<unsupported:{}>", construct),
    }
}

fn render_number(value: Number) -> String {
    match value {
        Number::Int(n) => n.to_string(),
        Number::Float(f) => {
            if f.fract() == 0.0 && f.is_finite() {
                format!("{:.1}", f)
            } else {
                f.to_string()
            }
        }
    }
}

fn bin_op_token(op: BinOp) -> &'static str {
    match op {
        BinOp::Add => "+",
        BinOp::Sub => "-",
        BinOp::Mult => "*",
        BinOp::Div => "/",
        BinOp::Pow => "**",
    }
}

fn compare_op_token(op: CompareOp) -> &'static str {
    match op {
        CompareOp::Eq => "==",
        CompareOp::NotEq => "!=",
        CompareOp::Lt => "<",
        CompareOp::LtE => "<=",
        CompareOp::Gt => ">",
        CompareOp::GtE => ">=",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_render_arithmetic() {
        let expr = Expr::bin(
            Expr::load("x"),
            BinOp::Add,
            Expr::bin(Expr::load("y"), BinOp::Mult, Expr::int(2)),
        );
        assert_eq!(render_expr(&expr), "(x + (y * 2))");
    }

    #[test]
    fn test_render_comparison_chain() {
        let expr = Expr::Compare {
            left: Box::new(Expr::load("a")),
            ops: vec![CompareOp::LtE, CompareOp::Lt],
            comparators: vec![Expr::load("b"), Expr::load("c")],
        };
        assert_eq!(render_expr(&expr), "(a <= b < c)");
    }

    #[test]
    fn test_render_call_and_subscript() {
        let expr = Expr::Call {
            func: Box::new(Expr::Attribute {
                value: Box::new(Expr::load("fmt")),
                attr: "write".into(),
            }),
            args: vec![Expr::Subscript {
                value: Box::new(Expr::load("arr")),
                index: Box::new(Expr::int(0)),
                ctx: crate::shared::models::AccessContext::Load,
            }],
        };
        assert_eq!(render_expr(&expr), "fmt.write(arr[0])");
    }

    #[test]
    fn test_render_float_keeps_decimal_point() {
        assert_eq!(render_number(Number::Float(5.0)), "5.0");
        assert_eq!(render_number(Number::Float(0.5)), "0.5");
    }

    #[test]
    fn test_render_lambda_unit() {
        let expr = Expr::bin(Expr::load("x"), BinOp::Add, Expr::int(3));
        let source = render_lambda("f__lambda__y_0", &["x".to_string()], &expr);
        assert_eq!(source, "def f__lambda__y_0(x):\n    return (x + 3)\n");
    }
}
