//! Conversion between parser trees and symbolic expressions.

use graphcalc_parser::{BinOp, Expr, ExpressionTree, UnOp};

use crate::coeff::Coefficient;
use crate::expr::{SymExpr, SymExprKind};
use crate::SymbolicError;

pub fn lower(expr: &Expr) -> Result<SymExpr, SymbolicError> {
    Ok(match expr {
        Expr::Number(text) => SymExpr::num(
            Coefficient::from_decimal_str(text)
                .ok_or_else(|| SymbolicError::InvalidLiteral(text.clone()))?,
        ),
        Expr::Const(c) => SymExpr::constant(*c),
        Expr::Var(name) => SymExpr::var(name),
        Expr::Unary(UnOp::Plus, inner) => lower(inner)?,
        Expr::Unary(UnOp::Minus, inner) => SymExpr::neg(lower(inner)?),
        Expr::Binary(lhs, op, rhs) => {
            let (l, r) = (lower(lhs)?, lower(rhs)?);
            match op {
                BinOp::Add => l + r,
                BinOp::Sub => l - r,
                BinOp::Mul => l * r,
                BinOp::Div => l / r,
                BinOp::Pow => SymExpr::pow(l, r),
            }
        }
        Expr::Call(f, args) => {
            SymExpr::func(*f, args.iter().map(lower).collect::<Result<_, _>>()?)
        }
    })
}

/// The residual of a tree: `lhs - rhs` for an equation, the expression itself
/// otherwise. Its roots are the tree's solutions.
pub fn residual(tree: &ExpressionTree) -> Result<SymExpr, SymbolicError> {
    let lhs = lower(tree.lhs())?;
    match tree.rhs() {
        Some(rhs) => Ok(lhs - lower(rhs)?),
        None => Ok(lhs),
    }
}

fn coeff_expr(c: &Coefficient) -> Expr {
    match c {
        Coefficient::Rational(n, 1) => Expr::number(*n as f64),
        Coefficient::Rational(n, d) => {
            let frac = Expr::Binary(
                Box::new(Expr::Number(n.unsigned_abs().to_string())),
                BinOp::Div,
                Box::new(Expr::Number(d.to_string())),
            );
            if *n < 0 {
                Expr::Unary(UnOp::Minus, Box::new(frac))
            } else {
                frac
            }
        }
        Coefficient::Float(f) => Expr::number(*f),
    }
}

/// Split a term into a sign and its magnitude so sums render as `a - b`.
fn split_sign(term: &SymExpr) -> (bool, SymExpr) {
    match term.kind.as_ref() {
        SymExprKind::Neg(inner) => (true, inner.clone()),
        SymExprKind::Num(c) if c.is_negative() => (true, SymExpr::num(-*c)),
        SymExprKind::Mul(factors) => match factors.first().and_then(|f| f.as_coeff()) {
            Some(c) if c.is_negative() => {
                let mut rest = factors.clone();
                rest[0] = SymExpr::num(-*c);
                if rest[0].is_one() {
                    rest.remove(0);
                }
                (true, SymExpr::mul(rest))
            }
            _ => (false, term.clone()),
        },
        _ => (false, term.clone()),
    }
}

fn negative_power(factor: &SymExpr) -> Option<SymExpr> {
    if let SymExprKind::Pow(base, exp) = factor.kind.as_ref() {
        if let Some(c) = exp.as_coeff() {
            if c.is_negative() {
                let positive = -*c;
                return Some(if positive.is_one() {
                    base.clone()
                } else {
                    SymExpr::pow(base.clone(), SymExpr::num(positive))
                });
            }
        }
    }
    None
}

fn product(factors: Vec<Expr>) -> Option<Expr> {
    factors
        .into_iter()
        .reduce(|acc, f| Expr::Binary(Box::new(acc), BinOp::Mul, Box::new(f)))
}

/// Render a symbolic expression back into a parser tree.
pub fn to_expr(e: &SymExpr) -> Expr {
    match e.kind.as_ref() {
        SymExprKind::Num(c) => coeff_expr(c),
        SymExprKind::Const(c) => Expr::Const(*c),
        SymExprKind::Var(v) => Expr::Var(v.clone()),
        SymExprKind::Neg(inner) => Expr::Unary(UnOp::Minus, Box::new(to_expr(inner))),
        SymExprKind::Func(f, args) => Expr::Call(*f, args.iter().map(to_expr).collect()),
        SymExprKind::Pow(base, exp) => {
            if let Some(den) = negative_power(e) {
                return Expr::Binary(
                    Box::new(Expr::Number("1".into())),
                    BinOp::Div,
                    Box::new(to_expr(&den)),
                );
            }
            Expr::Binary(Box::new(to_expr(base)), BinOp::Pow, Box::new(to_expr(exp)))
        }
        SymExprKind::Add(terms) => {
            let mut out: Option<Expr> = None;
            for term in terms {
                out = Some(match out {
                    None => to_expr(term),
                    Some(acc) => {
                        let (negative, magnitude) = split_sign(term);
                        let op = if negative { BinOp::Sub } else { BinOp::Add };
                        Expr::Binary(Box::new(acc), op, Box::new(to_expr(&magnitude)))
                    }
                });
            }
            out.unwrap_or_else(|| Expr::Number("0".into()))
        }
        SymExprKind::Mul(factors) => {
            let mut numer = Vec::new();
            let mut denom = Vec::new();
            for f in factors {
                match negative_power(f) {
                    Some(d) => denom.push(to_expr(&d)),
                    None => numer.push(to_expr(f)),
                }
            }
            let top = product(numer).unwrap_or_else(|| Expr::Number("1".into()));
            match product(denom) {
                Some(bottom) => Expr::Binary(Box::new(top), BinOp::Div, Box::new(bottom)),
                None => top,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphcalc_parser::parse;

    #[test]
    fn subtraction_and_division_lower_to_sums_and_powers() {
        let tree = parse("x - 1/x", "x").unwrap();
        let e = lower(tree.lhs()).unwrap();
        let x = SymExpr::var("x");
        assert_eq!(e, x.clone() - SymExpr::int(1) * x.recip());
    }

    #[test]
    fn equation_residual() {
        let tree = parse("x^2 = 2", "x").unwrap();
        let r = residual(&tree).unwrap();
        assert_eq!(r.to_string(), "x^2 - 2");
    }

    #[test]
    fn rendering_uses_fractions_and_differences() {
        let x = SymExpr::var("x");
        let e = SymExpr::add(vec![
            SymExpr::mul(vec![SymExpr::int(-3), x.clone()]),
            SymExpr::mul(vec![SymExpr::rational(1, 2), SymExpr::pow(x.clone(), SymExpr::int(-2))]),
        ]);
        assert_eq!(e.to_string(), "-3*x + 1/2/x^2");
    }
}
