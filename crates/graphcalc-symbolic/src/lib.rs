//! graphcalc symbolic engine
//!
//! Formulas are lowered into [`SymExpr`], a tree with exact rational
//! coefficients, and brought to a canonical form by the
//! [`StagedNormalizer`]. From there the [`Solver`] finds real roots:
//! rational functions of the variable are solved in closed form where
//! possible, anything else is scanned numerically within a step and time
//! budget.

mod coeff;
mod diff;
mod expr;
mod lower;
mod normalize;
mod numeric;
mod poly;
mod roots;
mod solve;

pub use coeff::{format_decimal, Coefficient};
pub use diff::derivative;
pub use expr::{SymExpr, SymExprKind};
pub use lower::{lower, residual, to_expr};
pub use normalize::{NormPass, NormStep, StagedNormalizer};
pub use numeric::Budget;
pub use poly::{as_rational, Polynomial, RationalFunction};
pub use roots::{real_roots, PolyRoot};
pub use solve::{CriticalPoint, CurveFeatures, Root, Solver, SolverConfig};

use graphcalc_parser::ExpressionTree;
use graphcalc_scale::Domain;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SymbolicError {
    #[error("invalid numeric literal '{0}'")]
    InvalidLiteral(String),

    #[error("cannot combine curves in '{left}' and '{right}'")]
    VariableMismatch { left: String, right: String },

    #[error("evaluation failed: {0}")]
    Evaluation(String),
}

pub type Result<T> = std::result::Result<T, SymbolicError>;

/// Solve with the default configuration.
pub fn solve(tree: &ExpressionTree, other: Option<&ExpressionTree>, domain: Domain) -> Result<Vec<Root>> {
    Solver::default().solve(tree, other, domain)
}

/// Analyze with the default configuration.
pub fn analyze(tree: &ExpressionTree, domain: Domain) -> Result<CurveFeatures> {
    Solver::default().analyze(tree, domain)
}
