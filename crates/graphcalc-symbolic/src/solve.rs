//! Root, intersection and curve-feature solving.

use graphcalc_eval::{compile_expr, AngleUnit, EvalOptions, Program};
use graphcalc_parser::ExpressionTree;
use graphcalc_scale::Domain;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::diff::derivative;
use crate::expr::SymExpr;
use crate::lower::{residual, to_expr};
use crate::normalize::StagedNormalizer;
use crate::numeric::{confirm_root, scan, Budget, Scan};
use crate::poly::{as_rational, RationalFunction};
use crate::roots::{real_roots, sort_and_dedup, PolyRoot};
use crate::SymbolicError;

/// One real solution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Root {
    pub exact: String,
    pub approx: f64,
    /// Id of the other curve when this root is an intersection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intersection_of: Option<String>,
}

impl From<PolyRoot> for Root {
    fn from(r: PolyRoot) -> Self {
        Root {
            exact: r.exact,
            approx: r.approx,
            intersection_of: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriticalPoint {
    pub x: Root,
    pub y: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurveFeatures {
    pub intercepts: Vec<Root>,
    pub critical_points: Vec<CriticalPoint>,
    pub asymptotes: Vec<Root>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub max_steps: usize,
    pub timeout_ms: u64,
    /// Samples taken when scanning for sign changes.
    pub scan_points: usize,
    /// Scan transcendental residuals numerically instead of giving up.
    pub numeric_fallback: bool,
    #[serde(skip)]
    pub angle_unit: AngleUnit,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            max_steps: 10_000,
            timeout_ms: 2_000,
            scan_points: 2_000,
            numeric_fallback: true,
            angle_unit: AngleUnit::Radians,
        }
    }
}

impl SolverConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

// Above this degree the eigenvalue roots of an expanded numerator are
// backed by a scan of the residual itself
const TRUSTED_DEGREE: usize = 4;

/// Roots of a canonical residual, and the poles met along the way.
#[derive(Default)]
struct Found {
    roots: Vec<PolyRoot>,
    poles: Vec<PolyRoot>,
}

#[derive(Debug, Clone, Default)]
pub struct Solver {
    config: SolverConfig,
    normalizer: StagedNormalizer,
}

impl Solver {
    pub fn new(config: SolverConfig) -> Self {
        Solver {
            config,
            normalizer: StagedNormalizer::default(),
        }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Real solutions of `tree = 0`, or of `tree = other` when a second
    /// curve is given, restricted to `domain`, ascending. Running out of
    /// budget yields an empty set.
    pub fn solve(
        &self,
        tree: &ExpressionTree,
        other: Option<&ExpressionTree>,
        domain: Domain,
    ) -> Result<Vec<Root>, SymbolicError> {
        let variable = tree.variable.as_str();
        let mut f = residual(tree)?;
        if let Some(g) = other {
            if g.variable != tree.variable {
                return Err(SymbolicError::VariableMismatch {
                    left: tree.variable.clone(),
                    right: g.variable.clone(),
                });
            }
            f = f - residual(g)?;
        }
        let canonical = self.normalizer.normalize(f);
        debug!(residual = %canonical, "solving");

        let mut budget = Budget::new(self.config.max_steps, self.config.timeout());
        let found = self.find_roots(&canonical, variable, domain, &mut budget);
        if budget.is_exhausted() {
            warn!(steps = budget.steps(), residual = %canonical, "solver budget exhausted, no solution found");
            return Ok(Vec::new());
        }
        Ok(restrict(found.roots, domain))
    }

    /// Points where `f` meets `g`, each tagged with `g_id`.
    pub fn intersect(
        &self,
        f: &ExpressionTree,
        g: &ExpressionTree,
        g_id: &str,
        domain: Domain,
    ) -> Result<Vec<Root>, SymbolicError> {
        let mut roots = self.solve(f, Some(g), domain)?;
        for root in &mut roots {
            root.intersection_of = Some(g_id.to_string());
        }
        Ok(roots)
    }

    /// X-intercepts, critical points and vertical asymptotes of the curve.
    pub fn analyze(&self, tree: &ExpressionTree, domain: Domain) -> Result<CurveFeatures, SymbolicError> {
        let variable = tree.variable.as_str();
        let f = self.normalizer.normalize(residual(tree)?);
        let mut budget = Budget::new(self.config.max_steps, self.config.timeout());

        let found = self.find_roots(&f, variable, domain, &mut budget);
        let asymptotes = match as_rational(&f, variable, &self.eval_options(), &mut budget) {
            Some(rf) => vertical_asymptotes(&rf, &mut budget),
            None => found.poles,
        };

        let mut critical_points = Vec::new();
        match derivative(&f, variable) {
            Some(df) => {
                let df = self.normalizer.normalize(df);
                debug!(derivative = %df, "analyzing");
                let program = compile_expr(&to_expr(&f), variable)
                    .map_err(|e| SymbolicError::Evaluation(e.to_string()))?;
                let opts = self.eval_options();
                for x in restrict(self.find_roots(&df, variable, domain, &mut budget).roots, domain) {
                    if let Some(y) = program.eval(x.approx, &opts).as_real() {
                        critical_points.push(CriticalPoint { x, y });
                    }
                }
            }
            None => debug!("no closed-form derivative, skipping critical points"),
        }

        if budget.is_exhausted() {
            warn!(steps = budget.steps(), "solver budget exhausted while analyzing");
            return Ok(CurveFeatures::default());
        }
        Ok(CurveFeatures {
            intercepts: restrict(found.roots, domain),
            critical_points,
            asymptotes: restrict(asymptotes, domain),
        })
    }

    fn eval_options(&self) -> EvalOptions {
        EvalOptions {
            angle_unit: self.config.angle_unit,
            complex_results: false,
        }
    }

    fn find_roots(&self, f: &SymExpr, variable: &str, domain: Domain, budget: &mut Budget) -> Found {
        let program = match compile_expr(&to_expr(f), variable) {
            Ok(p) => Some(p),
            Err(e) => {
                debug!(error = %e, "residual does not compile");
                None
            }
        };
        if let Some(rf) = as_rational(f, variable, &self.eval_options(), budget) {
            return self.rational_roots(&rf, program.as_ref(), domain, budget);
        }
        if budget.is_exhausted() {
            return Found::default();
        }
        if !self.config.numeric_fallback {
            debug!("residual is not rational and numeric fallback is off");
            return Found::default();
        }
        let Some(program) = program else {
            return Found::default();
        };
        match self.scan_program(&program, domain, budget) {
            Some(Scan { roots, poles }) => Found {
                roots: roots.into_iter().map(PolyRoot::numeric).collect(),
                poles: poles.into_iter().map(PolyRoot::numeric).collect(),
            },
            None => Found::default(),
        }
    }

    /// Numerator roots that are not also roots of the denominator. An
    /// identically zero numerator has no discrete roots.
    ///
    /// Approximate roots come from the expanded numerator, which can lose
    /// every significant digit near clustered roots, so each one has to
    /// show up as a zero of `program` (the residual as written) too. Past
    /// [`TRUSTED_DEGREE`] the residual is also scanned for roots the
    /// eigenvalue solve missed.
    fn rational_roots(
        &self,
        rf: &RationalFunction,
        program: Option<&Program>,
        domain: Domain,
        budget: &mut Budget,
    ) -> Found {
        if rf.num.is_zero() {
            return Found::default();
        }
        let Some(candidates) = real_roots(&rf.num, budget) else {
            return Found::default();
        };
        let opts = self.eval_options();
        let mut roots = Vec::with_capacity(candidates.len());
        for root in candidates {
            let Some(program) = program.filter(|_| !root.is_exact()) else {
                roots.push(root);
                continue;
            };
            let f = |x: f64| program.eval(x, &opts).to_f64();
            match confirm_root(&f, root.approx, budget) {
                Some(x) => roots.push(PolyRoot::numeric(x)),
                None => debug!(candidate = root.approx, "not a root of the residual, dropped"),
            }
        }
        if rf.num.degree() > TRUSTED_DEGREE {
            if let Some(scan) = program.and_then(|p| self.scan_program(p, domain, budget)) {
                roots.extend(scan.roots.into_iter().map(PolyRoot::numeric));
            }
        }
        roots.retain(|r| !rf.den.vanishes_at(r.approx, r.value));
        Found {
            roots,
            poles: Vec::new(),
        }
    }

    fn scan_program(&self, program: &Program, domain: Domain, budget: &mut Budget) -> Option<Scan> {
        let opts = self.eval_options();
        scan(
            |x| program.eval(x, &opts).to_f64(),
            domain,
            self.config.scan_points,
            budget,
        )
    }
}

/// Denominator roots that the numerator does not cancel.
fn vertical_asymptotes(rf: &RationalFunction, budget: &mut Budget) -> Vec<PolyRoot> {
    if rf.is_polynomial() {
        return Vec::new();
    }
    real_roots(&rf.den, budget)
        .unwrap_or_default()
        .into_iter()
        .filter(|r| {
            rf.den.multiplicity(r.approx, r.value) > rf.num.multiplicity(r.approx, r.value)
        })
        .collect()
}

fn restrict(roots: Vec<PolyRoot>, domain: Domain) -> Vec<Root> {
    sort_and_dedup(roots)
        .into_iter()
        .filter(|r| domain.contains(r.approx))
        .map(Root::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphcalc_parser::parse;

    #[test]
    fn identity_has_no_discrete_roots() {
        let tree = parse("2*(x+1) = 2x + 2", "x").unwrap();
        let roots = Solver::default().solve(&tree, None, Domain::default()).unwrap();
        assert!(roots.is_empty());
    }

    #[test]
    fn mismatched_variables_are_rejected() {
        let f = parse("x", "x").unwrap();
        let g = parse("t", "t").unwrap();
        let err = Solver::default().solve(&f, Some(&g), Domain::default()).unwrap_err();
        assert!(matches!(err, SymbolicError::VariableMismatch { .. }));
    }

    #[test]
    fn root_serialization_omits_missing_tag() {
        let root = Root {
            exact: "7".into(),
            approx: 7.0,
            intersection_of: None,
        };
        let json = serde_json::to_value(&root).unwrap();
        assert_eq!(json, serde_json::json!({"exact": "7", "approx": 7.0}));
    }

    #[test]
    fn config_defaults_fill_missing_fields() {
        let cfg: SolverConfig = serde_json::from_str(r#"{"max_steps": 50}"#).unwrap();
        assert_eq!(cfg.max_steps, 50);
        assert_eq!(cfg.timeout_ms, 2_000);
        assert!(cfg.numeric_fallback);
    }
}
