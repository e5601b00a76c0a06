use std::fmt;

use crate::{BinOp, Expr, ExpressionTree, TreeKind, UnOp};

const PREC_ADD: u8 = 1;
const PREC_MUL: u8 = 2;
const PREC_UNARY: u8 = 3;
const PREC_POW: u8 = 4;
const PREC_ATOM: u8 = 5;

fn binop_prec(op: BinOp) -> u8 {
    match op {
        BinOp::Add | BinOp::Sub => PREC_ADD,
        BinOp::Mul | BinOp::Div => PREC_MUL,
        BinOp::Pow => PREC_POW,
    }
}

fn prec(e: &Expr) -> u8 {
    match e {
        Expr::Binary(_, op, _) => binop_prec(*op),
        Expr::Unary(..) => PREC_UNARY,
        _ => PREC_ATOM,
    }
}

fn write_operand(f: &mut fmt::Formatter<'_>, e: &Expr, parens: bool) -> fmt::Result {
    if parens {
        write!(f, "({e})")
    } else {
        write!(f, "{e}")
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(n) => f.write_str(n),
            Expr::Const(c) => write!(f, "{c}"),
            Expr::Var(v) => f.write_str(v),
            Expr::Call(func, args) => {
                write!(f, "{func}(")?;
                for (i, a) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{a}")?;
                }
                f.write_str(")")
            }
            Expr::Unary(op, inner) => {
                f.write_str(match op {
                    UnOp::Plus => "+",
                    UnOp::Minus => "-",
                })?;
                write_operand(f, inner, prec(inner) < PREC_UNARY)
            }
            Expr::Binary(lhs, op, rhs) => {
                let p = binop_prec(*op);
                // `^` is right associative, the rest associate left
                let (left_parens, right_parens) = if *op == BinOp::Pow {
                    (prec(lhs) <= p, prec(rhs) < PREC_UNARY)
                } else {
                    (prec(lhs) < p, prec(rhs) <= p)
                };
                write_operand(f, lhs, left_parens)?;
                f.write_str(match op {
                    BinOp::Add => " + ",
                    BinOp::Sub => " - ",
                    BinOp::Mul => "*",
                    BinOp::Div => "/",
                    BinOp::Pow => "^",
                })?;
                write_operand(f, rhs, right_parens)
            }
        }
    }
}

impl fmt::Display for ExpressionTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            TreeKind::Expression(e) => write!(f, "{e}"),
            TreeKind::Equation { lhs, rhs } => write!(f, "{lhs} = {rhs}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::parse;

    fn canon(src: &str) -> String {
        parse(src, "x").map(|t| t.to_string()).unwrap()
    }

    #[test]
    fn drops_redundant_parentheses() {
        assert_eq!(canon("((x))+(1)"), "x + 1");
        assert_eq!(canon("2x"), "2*x");
        assert_eq!(canon("x^2 - 4 = 0"), "x^2 - 4 = 0");
    }

    #[test]
    fn keeps_grouping_that_changes_meaning() {
        assert_eq!(canon("x - (x - 1)"), "x - (x - 1)");
        assert_eq!(canon("(x^2)^3"), "(x^2)^3");
        assert_eq!(canon("x^2^3"), "x^2^3");
        assert_eq!(canon("-(x+1)"), "-(x + 1)");
        assert_eq!(canon("(-x)^2"), "(-x)^2");
        assert_eq!(canon("1/(2x)"), "1/(2*x)");
    }

    #[test]
    fn rendering_reparses_to_the_same_tree() {
        for src in [
            "3*x+1 = 2*x+8",
            "-x^2 + 2^-x",
            "log(x, 2) / (1 + sin(x)cos(x))",
            "(x+1)(x-1) - pi x",
            "x - -x",
            "2^(x+1)^2",
        ] {
            let tree = parse(src, "x").unwrap();
            let again = parse(&tree.to_string(), "x").unwrap();
            assert_eq!(tree, again, "{src} rendered as {tree}");
        }
    }
}
