//! One plot request from formula text to samples and roots.

use graphcalc_eval::{compile_expr, EvalOptions, SampleValue};
use graphcalc_model::{GraphDefinition, UserIdentity};
use graphcalc_parser::{parse, Expr};
use graphcalc_scale::{Domain, ScaleMode, ScaleTransform};
use graphcalc_symbolic::{Root, Solver};
use serde::{Deserialize, Serialize};
use tracing::{debug, debug_span};

use crate::config::EngineConfig;
use crate::GraphError;

/// Id given to the right-hand side of an equation when it is sampled as its
/// own curve.
pub const RHS_CURVE_ID: &str = "rhs";

/// Configuration and the signed-in user for a run of requests.
#[derive(Debug, Clone, Default)]
pub struct EngineContext {
    pub config: EngineConfig,
    pub user: Option<UserIdentity>,
}

impl EngineContext {
    pub fn new(config: EngineConfig) -> Self {
        EngineContext { config, user: None }
    }

    pub fn with_user(mut self, user: UserIdentity) -> Self {
        self.user = Some(user);
        self
    }
}

/// A second formula drawn against the first, identified by `id` in root tags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecondCurve {
    pub id: String,
    pub expression: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlotRequest {
    pub expression: String,
    pub variable: String,
    pub domain: Domain,
    pub scale_mode: ScaleMode,
    /// Falls back to `sampling.resolution`.
    #[serde(default)]
    pub resolution: Option<usize>,
    #[serde(default)]
    pub millisecond_mode: bool,
    #[serde(default)]
    pub second: Option<SecondCurve>,
}

impl PlotRequest {
    pub fn new(expression: impl Into<String>, variable: impl Into<String>) -> Self {
        PlotRequest {
            expression: expression.into(),
            variable: variable.into(),
            domain: Domain::default(),
            scale_mode: ScaleMode::default(),
            resolution: None,
            millisecond_mode: false,
            second: None,
        }
    }

    /// Request that redraws a saved graph.
    pub fn from_graph(graph: &GraphDefinition) -> Self {
        PlotRequest {
            expression: graph.expression.clone(),
            variable: graph.variable.clone(),
            domain: graph.domain,
            scale_mode: graph.scale_mode,
            resolution: None,
            millisecond_mode: graph.millisecond_mode,
            second: None,
        }
    }

    pub fn with_domain(mut self, start: f64, end: f64) -> Self {
        self.domain = Domain::new(start, end);
        self
    }

    pub fn with_scale_mode(mut self, mode: ScaleMode) -> Self {
        self.scale_mode = mode;
        self
    }

    pub fn with_resolution(mut self, resolution: usize) -> Self {
        self.resolution = Some(resolution);
        self
    }

    pub fn with_millisecond_mode(mut self, on: bool) -> Self {
        self.millisecond_mode = on;
        self
    }

    pub fn with_second(mut self, id: impl Into<String>, expression: impl Into<String>) -> Self {
        self.second = Some(SecondCurve {
            id: id.into(),
            expression: expression.into(),
        });
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub x: f64,
    pub y: SampleValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Curve {
    pub id: String,
    pub samples: Vec<Sample>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlotOutput {
    pub axis_label: String,
    pub scale_mode: ScaleMode,
    pub samples: Vec<Sample>,
    /// The second formula, or the right-hand side of an equation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub second: Option<Curve>,
    /// Present only for equations and two-curve requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roots: Option<Vec<Root>>,
}

/// Sample the request's formula over its domain and, when it is an equation
/// or has a second curve, solve for the crossing points.
///
/// Each formula is parsed exactly once. With a second curve the roots are
/// the points where the whole first formula meets it, tagged with the
/// second curve's id; an equation's two sides are sampled as two curves.
pub fn plot(request: &PlotRequest, ctx: &EngineContext) -> Result<PlotOutput, GraphError> {
    let _span = debug_span!(
        "graphcalc.plot",
        expression = %request.expression,
        scale = %request.scale_mode
    )
    .entered();
    let config = &ctx.config;

    let resolution = request.resolution.unwrap_or(config.sampling.resolution);
    let axis = ScaleTransform::new(request.scale_mode)
        .with_log_floor(config.sampling.log_floor)
        .with_millisecond_mode(request.millisecond_mode)
        .sample(
            &request.variable,
            request.domain.start,
            request.domain.end,
            resolution,
        )?;

    let tree = parse(&request.expression, &request.variable)?;
    let second_tree = request
        .second
        .as_ref()
        .map(|s| parse(&s.expression, &request.variable).map(|t| (s.id.as_str(), t)))
        .transpose()?;
    if let Some((id, g)) = &second_tree {
        if g.is_equation() {
            return Err(GraphError::Request(format!(
                "second curve '{id}' must be an expression, not an equation"
            )));
        }
    }

    let opts = config.eval_options(axis.angle_unit);
    let samples = sample_expr(tree.lhs(), &request.variable, &axis.coordinates, &opts)?;

    let second = match (&second_tree, tree.rhs()) {
        (Some((id, g)), _) => Some(Curve {
            id: id.to_string(),
            samples: sample_expr(g.lhs(), &request.variable, &axis.coordinates, &opts)?,
        }),
        (None, Some(rhs)) => Some(Curve {
            id: RHS_CURVE_ID.to_string(),
            samples: sample_expr(rhs, &request.variable, &axis.coordinates, &opts)?,
        }),
        (None, None) => None,
    };

    let solver = Solver::new(config.solver_config(axis.angle_unit));
    let roots = match &second_tree {
        Some((id, g)) => Some(solver.intersect(&tree, g, id, request.domain)?),
        None if tree.is_equation() => Some(solver.solve(&tree, None, request.domain)?),
        None => None,
    };

    debug!(
        samples = samples.len(),
        roots = roots.as_ref().map_or(0, Vec::len),
        "plot finished"
    );
    Ok(PlotOutput {
        axis_label: axis.label,
        scale_mode: axis.mode,
        samples,
        second,
        roots,
    })
}

fn sample_expr(
    expr: &Expr,
    variable: &str,
    coordinates: &[f64],
    opts: &EvalOptions,
) -> Result<Vec<Sample>, GraphError> {
    let program = compile_expr(expr, variable)?;
    let values = program.eval_many(coordinates, opts);
    Ok(coordinates
        .iter()
        .zip(values)
        .map(|(&x, y)| Sample { x, y })
        .collect())
}

