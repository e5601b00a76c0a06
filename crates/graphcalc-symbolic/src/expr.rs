//! Symbolic expression tree
//!
//! Nodes are reference counted so rewrites can share unchanged subtrees.
//! Subtraction and division are not node kinds: `a - b` is `a + (-b)` and
//! `a / b` is `a * b^-1`.

use graphcalc_parser::{Constant, Function};
use std::fmt;
use std::sync::Arc;

use crate::coeff::Coefficient;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SymExprKind {
    Num(Coefficient),
    Const(Constant),
    Var(String),
    Add(Vec<SymExpr>),
    Mul(Vec<SymExpr>),
    Pow(SymExpr, SymExpr),
    Neg(SymExpr),
    Func(Function, Vec<SymExpr>),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SymExpr {
    pub kind: Arc<SymExprKind>,
}

impl SymExpr {
    fn new(kind: SymExprKind) -> Self {
        SymExpr {
            kind: Arc::new(kind),
        }
    }

    pub fn num(c: Coefficient) -> Self {
        Self::new(SymExprKind::Num(c))
    }

    pub fn int(n: i64) -> Self {
        Self::num(Coefficient::int(n))
    }

    pub fn rational(num: i64, den: i64) -> Self {
        Self::num(Coefficient::rational(num, den))
    }

    pub fn constant(c: Constant) -> Self {
        Self::new(SymExprKind::Const(c))
    }

    pub fn var(name: &str) -> Self {
        Self::new(SymExprKind::Var(name.to_string()))
    }

    /// Sum of `terms`; collapses the empty and singleton cases.
    pub fn add(mut terms: Vec<SymExpr>) -> Self {
        match terms.len() {
            0 => Self::int(0),
            1 => terms.remove(0),
            _ => Self::new(SymExprKind::Add(terms)),
        }
    }

    /// Product of `factors`; collapses the empty and singleton cases.
    pub fn mul(mut factors: Vec<SymExpr>) -> Self {
        match factors.len() {
            0 => Self::int(1),
            1 => factors.remove(0),
            _ => Self::new(SymExprKind::Mul(factors)),
        }
    }

    pub fn pow(base: SymExpr, exp: SymExpr) -> Self {
        Self::new(SymExprKind::Pow(base, exp))
    }

    pub fn neg(inner: SymExpr) -> Self {
        Self::new(SymExprKind::Neg(inner))
    }

    pub fn func(f: Function, args: Vec<SymExpr>) -> Self {
        Self::new(SymExprKind::Func(f, args))
    }

    pub fn call(f: Function, arg: SymExpr) -> Self {
        Self::func(f, vec![arg])
    }

    pub fn recip(self) -> Self {
        Self::pow(self, Self::int(-1))
    }

    pub fn as_coeff(&self) -> Option<&Coefficient> {
        match self.kind.as_ref() {
            SymExprKind::Num(c) => Some(c),
            _ => None,
        }
    }

    pub fn is_num(&self) -> bool {
        self.as_coeff().is_some()
    }

    pub fn is_zero(&self) -> bool {
        self.as_coeff().is_some_and(|c| c.is_zero())
    }

    pub fn is_one(&self) -> bool {
        self.as_coeff().is_some_and(|c| c.is_one())
    }

    pub fn is_var(&self) -> bool {
        matches!(self.kind.as_ref(), SymExprKind::Var(_))
    }

    /// Whether `name` occurs anywhere in the tree.
    pub fn mentions(&self, name: &str) -> bool {
        match self.kind.as_ref() {
            SymExprKind::Var(v) => v == name,
            SymExprKind::Num(_) | SymExprKind::Const(_) => false,
            SymExprKind::Add(xs) | SymExprKind::Mul(xs) | SymExprKind::Func(_, xs) => {
                xs.iter().any(|x| x.mentions(name))
            }
            SymExprKind::Pow(b, e) => b.mentions(name) || e.mentions(name),
            SymExprKind::Neg(inner) => inner.mentions(name),
        }
    }

    /// Whether any call to one of `funcs` occurs in the tree.
    pub fn calls_any(&self, funcs: &[Function]) -> bool {
        match self.kind.as_ref() {
            SymExprKind::Func(f, args) => {
                funcs.contains(f) || args.iter().any(|a| a.calls_any(funcs))
            }
            SymExprKind::Num(_) | SymExprKind::Const(_) | SymExprKind::Var(_) => false,
            SymExprKind::Add(xs) | SymExprKind::Mul(xs) => xs.iter().any(|x| x.calls_any(funcs)),
            SymExprKind::Pow(b, e) => b.calls_any(funcs) || e.calls_any(funcs),
            SymExprKind::Neg(inner) => inner.calls_any(funcs),
        }
    }

    pub fn node_count(&self) -> usize {
        1 + match self.kind.as_ref() {
            SymExprKind::Num(_) | SymExprKind::Const(_) | SymExprKind::Var(_) => 0,
            SymExprKind::Add(xs) | SymExprKind::Mul(xs) | SymExprKind::Func(_, xs) => {
                xs.iter().map(SymExpr::node_count).sum()
            }
            SymExprKind::Pow(b, e) => b.node_count() + e.node_count(),
            SymExprKind::Neg(inner) => inner.node_count(),
        }
    }
}

impl std::ops::Add for SymExpr {
    type Output = SymExpr;

    fn add(self, rhs: SymExpr) -> SymExpr {
        SymExpr::add(vec![self, rhs])
    }
}

impl std::ops::Sub for SymExpr {
    type Output = SymExpr;

    fn sub(self, rhs: SymExpr) -> SymExpr {
        SymExpr::add(vec![self, SymExpr::neg(rhs)])
    }
}

impl std::ops::Mul for SymExpr {
    type Output = SymExpr;

    fn mul(self, rhs: SymExpr) -> SymExpr {
        SymExpr::mul(vec![self, rhs])
    }
}

impl std::ops::Div for SymExpr {
    type Output = SymExpr;

    fn div(self, rhs: SymExpr) -> SymExpr {
        SymExpr::mul(vec![self, rhs.recip()])
    }
}

impl std::ops::Neg for SymExpr {
    type Output = SymExpr;

    fn neg(self) -> SymExpr {
        SymExpr::neg(self)
    }
}

impl fmt::Display for SymExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", crate::lower::to_expr(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_collapse_trivial_nodes() {
        assert!(SymExpr::add(vec![]).is_zero());
        assert!(SymExpr::mul(vec![]).is_one());
        assert!(SymExpr::add(vec![SymExpr::var("x")]).is_var());
    }

    #[test]
    fn mentions_and_size() {
        let x = SymExpr::var("x");
        let e = SymExpr::call(Function::Sin, x.clone() * SymExpr::int(2)) + SymExpr::int(1);
        assert!(e.mentions("x"));
        assert!(!e.mentions("t"));
        assert!(e.calls_any(&[Function::Sin]));
        assert_eq!(e.node_count(), 6);
    }
}
