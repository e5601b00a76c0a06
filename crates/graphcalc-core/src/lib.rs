//! graphcalc engine façade.
//!
//! Four pure entry points ([`parse`], [`evaluate`], [`solve`],
//! [`sample_coordinates`]), the [`plot`] pipeline that strings them together
//! for one request, and the rule that only teachers may comment on a saved
//! graph.
//! Configuration and the current user travel in an explicit
//! [`EngineContext`]; nothing here reads files or global state.

pub mod config;
mod plot;

pub use config::{EngineConfig, EvaluationConfig, LogLevel, LoggingConfig, SamplingConfig};
pub use plot::{plot, Curve, EngineContext, PlotOutput, PlotRequest, Sample, SecondCurve, RHS_CURVE_ID};

pub use graphcalc_eval::{
    evaluate, evaluate_with, AngleUnit, EvalOptions, EvaluationError, NonFinite, SampleValue,
};
pub use graphcalc_model::{
    Comment, GraphDefinition, GraphLibrary, ModelError, Role, UserIdentity,
};
pub use graphcalc_parser::{parse, ExpressionTree, ParseError};
pub use graphcalc_scale::{sample_coordinates, ConfigurationError, Domain, ScaleMode};
pub use graphcalc_symbolic::{CriticalPoint, CurveFeatures, Root, Solver, SolverConfig, SymbolicError};

use chrono::{DateTime, Utc};

#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Evaluation(#[from] EvaluationError),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Symbolic(#[from] SymbolicError),

    #[error("invalid request: {0}")]
    Request(String),

    #[error("no user is signed in")]
    NotSignedIn,
}

pub type Result<T> = std::result::Result<T, GraphError>;

/// Real roots of `tree` (or of `tree = other`) inside `domain`, ascending,
/// with the default solver limits. Anything the solver cannot handle is an
/// empty set.
pub fn solve(tree: &ExpressionTree, other: Option<&ExpressionTree>, domain: Domain) -> Vec<Root> {
    solve_with(tree, other, domain, &SolverConfig::default())
}

pub fn solve_with(
    tree: &ExpressionTree,
    other: Option<&ExpressionTree>,
    domain: Domain,
    config: &SolverConfig,
) -> Vec<Root> {
    match Solver::new(config.clone()).solve(tree, other, domain) {
        Ok(roots) => roots,
        Err(e) => {
            tracing::warn!(error = %e, "solve failed, no solution reported");
            Vec::new()
        }
    }
}

/// X-intercepts, critical points and vertical asymptotes inside `domain`.
pub fn analyze(tree: &ExpressionTree, domain: Domain, config: &SolverConfig) -> Result<CurveFeatures> {
    Ok(Solver::new(config.clone()).analyze(tree, domain)?)
}

/// Append a comment to `graph`. Only teachers may comment.
pub fn add_comment(
    graph: &mut GraphDefinition,
    user: &UserIdentity,
    text: impl Into<String>,
    timestamp: DateTime<Utc>,
) -> Result<()> {
    if !user.is_teacher() {
        return Err(ModelError::NotPermitted {
            user: user.id.clone(),
            role: user.role,
        }
        .into());
    }
    graph.push_comment(Comment::new(user.id.clone(), text, timestamp));
    tracing::debug!(graph = %graph.name, author = %user.id, "comment added");
    Ok(())
}

impl EngineContext {
    /// [`add_comment`] as the signed-in user.
    pub fn comment(
        &self,
        graph: &mut GraphDefinition,
        text: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Result<()> {
        let user = self.user.as_ref().ok_or(GraphError::NotSignedIn)?;
        add_comment(graph, user, text, timestamp)
    }

    pub fn plot(&self, request: &PlotRequest) -> Result<PlotOutput> {
        plot(request, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph() -> GraphDefinition {
        GraphDefinition::new("g", "x^2", "x", Domain::default(), ScaleMode::Linear)
    }

    #[test]
    fn students_cannot_comment() {
        let mut g = graph();
        let student = UserIdentity::new("sam", Role::Student, "Sam");
        let err = add_comment(&mut g, &student, "nice", Utc::now()).unwrap_err();
        assert!(matches!(
            err,
            GraphError::Model(ModelError::NotPermitted { role: Role::Student, .. })
        ));
        assert!(g.comments.is_empty());
    }

    #[test]
    fn teacher_comments_append_in_order() {
        let mut g = graph();
        let teacher = UserIdentity::new("ms-lee", Role::Teacher, "Ms Lee");
        let ctx = EngineContext::default().with_user(teacher.clone());
        add_comment(&mut g, &teacher, "first", Utc::now()).unwrap();
        ctx.comment(&mut g, "second", Utc::now()).unwrap();
        let texts: Vec<_> = g.comments.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, ["first", "second"]);
        assert_eq!(g.comments[0].author, "ms-lee");
    }

    #[test]
    fn commenting_needs_a_user() {
        let mut g = graph();
        let err = EngineContext::default().comment(&mut g, "hi", Utc::now()).unwrap_err();
        assert!(matches!(err, GraphError::NotSignedIn));
    }

    #[test]
    fn solve_swallows_variable_mismatch() {
        let f = parse("x", "x").unwrap();
        let g = parse("t", "t").unwrap();
        assert!(solve(&f, Some(&g), Domain::default()).is_empty());
    }

    #[test]
    fn parse_errors_surface_verbatim() {
        let err: GraphError = parse("x +* 2", "x").unwrap_err().into();
        assert!(err.to_string().starts_with("Parse error at position"));
    }
}
