//! Numeric evaluation of parsed formulas over a set of samples.
//!
//! A formula is compiled once into a stack [`Program`] whose only callable
//! targets are the parser's whitelisted functions, then run per sample in
//! complex arithmetic with real fast paths. Non-finite and complex results are
//! data, reported through [`SampleValue`]; only structurally malformed input
//! produces an [`EvaluationError`].

mod compiler;
mod machine;
pub mod special;

use graphcalc_parser::{Expr, ExpressionTree};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use compiler::{compile_expr, Compiler, Op, Program};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} (in `{expression}`)")]
pub struct EvaluationError {
    pub message: String,
    /// The offending sub-expression, rendered as formula text.
    pub expression: String,
}

impl EvaluationError {
    pub fn new(message: impl Into<String>, expr: &Expr) -> Self {
        EvaluationError {
            message: message.into(),
            expression: expr.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AngleUnit {
    #[default]
    Radians,
    Degrees,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvalOptions {
    pub angle_unit: AngleUnit,
    /// When false, any complex intermediate becomes NaN.
    pub complex_results: bool,
}

impl Default for EvalOptions {
    fn default() -> Self {
        EvalOptions {
            angle_unit: AngleUnit::Radians,
            complex_results: true,
        }
    }
}

impl EvalOptions {
    pub fn degrees() -> Self {
        EvalOptions {
            angle_unit: AngleUnit::Degrees,
            ..Self::default()
        }
    }

    pub fn real_only(mut self) -> Self {
        self.complex_results = false;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NonFinite {
    NaN,
    PosInf,
    NegInf,
}

/// One evaluated y-value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum SampleValue {
    Real(f64),
    Complex(Complex64),
    NonFinite(NonFinite),
}

impl SampleValue {
    pub fn classify(v: Complex64) -> SampleValue {
        if v.im == 0.0 {
            if v.re.is_nan() {
                SampleValue::NonFinite(NonFinite::NaN)
            } else if v.re == f64::INFINITY {
                SampleValue::NonFinite(NonFinite::PosInf)
            } else if v.re == f64::NEG_INFINITY {
                SampleValue::NonFinite(NonFinite::NegInf)
            } else {
                SampleValue::Real(v.re)
            }
        } else if v.re.is_finite() && v.im.is_finite() {
            SampleValue::Complex(v)
        } else {
            SampleValue::NonFinite(NonFinite::NaN)
        }
    }

    pub fn as_real(&self) -> Option<f64> {
        match self {
            SampleValue::Real(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_finite(&self) -> bool {
        !matches!(self, SampleValue::NonFinite(_))
    }

    /// Real projection: reals as-is, infinities as infinities, everything
    /// else NaN.
    pub fn to_f64(&self) -> f64 {
        match self {
            SampleValue::Real(v) => *v,
            SampleValue::NonFinite(NonFinite::PosInf) => f64::INFINITY,
            SampleValue::NonFinite(NonFinite::NegInf) => f64::NEG_INFINITY,
            SampleValue::NonFinite(NonFinite::NaN) | SampleValue::Complex(_) => f64::NAN,
        }
    }
}

impl fmt::Display for SampleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleValue::Real(v) => write!(f, "{v}"),
            SampleValue::Complex(z) if z.im < 0.0 => write!(f, "{}-{}i", z.re, -z.im),
            SampleValue::Complex(z) => write!(f, "{}+{}i", z.re, z.im),
            SampleValue::NonFinite(NonFinite::NaN) => f.write_str("nan"),
            SampleValue::NonFinite(NonFinite::PosInf) => f.write_str("inf"),
            SampleValue::NonFinite(NonFinite::NegInf) => f.write_str("-inf"),
        }
    }
}

impl Program {
    pub fn eval(&self, x: f64, opts: &EvalOptions) -> SampleValue {
        SampleValue::classify(self.run(x, opts))
    }

    /// Evaluate every sample, in order.
    #[cfg(not(feature = "parallel"))]
    pub fn eval_many(&self, samples: &[f64], opts: &EvalOptions) -> Vec<SampleValue> {
        samples.iter().map(|&x| self.eval(x, opts)).collect()
    }

    /// Evaluate every sample, in order, across the rayon pool.
    #[cfg(feature = "parallel")]
    pub fn eval_many(&self, samples: &[f64], opts: &EvalOptions) -> Vec<SampleValue> {
        use rayon::prelude::*;
        samples.par_iter().map(|&x| self.eval(x, opts)).collect()
    }
}

/// Compile the expression side of `tree` for `variable`. Equations are
/// rejected: they have no single value to sample.
pub fn compile(tree: &ExpressionTree, variable: &str) -> Result<Program, EvaluationError> {
    match tree.expression() {
        Some(expr) => compile_expr(expr, variable),
        None => Err(EvaluationError {
            message: "cannot evaluate an equation, expected an expression".to_string(),
            expression: tree.to_string(),
        }),
    }
}

pub fn evaluate(
    tree: &ExpressionTree,
    variable: &str,
    samples: &[f64],
) -> Result<Vec<SampleValue>, EvaluationError> {
    evaluate_with(tree, variable, samples, &EvalOptions::default())
}

pub fn evaluate_with(
    tree: &ExpressionTree,
    variable: &str,
    samples: &[f64],
    opts: &EvalOptions,
) -> Result<Vec<SampleValue>, EvaluationError> {
    let program = compile(tree, variable)?;
    let values = program.eval_many(samples, opts);
    tracing::debug!(
        samples = samples.len(),
        non_finite = values.iter().filter(|v| !v.is_finite()).count(),
        "evaluated samples"
    );
    Ok(values)
}

pub fn evaluate_at(
    tree: &ExpressionTree,
    variable: &str,
    x: f64,
    opts: &EvalOptions,
) -> Result<SampleValue, EvaluationError> {
    Ok(compile(tree, variable)?.eval(x, opts))
}
