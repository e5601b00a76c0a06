//! graphcalc - plot, solve and analyze formulas from the command line

mod config;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use config::ConfigLoader;
use graphcalc_core::{
    analyze, parse, plot, solve_with, CurveFeatures, Domain, EngineConfig, EngineContext,
    PlotOutput, PlotRequest, Root, ScaleMode,
};
use graphcalc_logging::{init_logging, LoggingOptions};
use log::{debug, info};
use std::io::Write;
use std::path::PathBuf;

/// Id the `--with` curve carries in intersection tags.
const WITH_CURVE_ID: &str = "with";

#[derive(Parser)]
#[command(
    name = "graphcalc",
    version,
    about = "Sample, solve and analyze single-variable formulas",
    after_help = r#"
Environment Variables:
  GRAPHCALC_CONFIG=<path>          Configuration file
  GRAPHCALC_LOG=debug              Log filter (RUST_LOG wins when set)
  GRAPHCALC_RESOLUTION=1000        Samples per curve
  GRAPHCALC_COMPLEX=true           Report complex samples instead of NaN
  GRAPHCALC_SOLVER_TIMEOUT_MS=2000 Solver time limit
"#
)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Clone)]
struct RangeArgs {
    /// Independent variable
    #[arg(long = "var", default_value = "x")]
    variable: String,

    /// Start of the domain
    #[arg(long, default_value_t = -10.0, allow_hyphen_values = true)]
    from: f64,

    /// End of the domain
    #[arg(long, default_value_t = 10.0, allow_hyphen_values = true)]
    to: f64,
}

impl RangeArgs {
    fn domain(&self) -> Domain {
        Domain::new(self.from, self.to)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Csv,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Sample a formula over a domain
    Plot {
        #[arg(allow_hyphen_values = true)]
        expression: String,

        #[command(flatten)]
        range: RangeArgs,

        /// Scale mode (linear, degrees, log, polar, parametric)
        #[arg(long, default_value = "linear")]
        scale: ScaleMode,

        /// Number of samples
        #[arg(long)]
        resolution: Option<usize>,

        /// Treat the variable as time in milliseconds
        #[arg(long)]
        millis: bool,

        /// Second formula to draw and intersect with
        #[arg(long = "with", allow_hyphen_values = true)]
        with: Option<String>,

        #[arg(long, value_enum, default_value = "csv")]
        format: OutputFormat,
    },

    /// Real solutions of an equation, or of `expr = 0`
    Solve {
        #[arg(allow_hyphen_values = true)]
        equation: String,

        #[command(flatten)]
        range: RangeArgs,

        /// Solve `equation = with` instead
        #[arg(long = "with", allow_hyphen_values = true)]
        with: Option<String>,

        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Intercepts, critical points and vertical asymptotes
    Analyze {
        #[arg(allow_hyphen_values = true)]
        expression: String,

        #[command(flatten)]
        range: RangeArgs,

        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print a sample configuration, or write it to a file
    Generate {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the effective configuration
    Show,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ConfigLoader::load_with_file(path)?,
        None => ConfigLoader::load()?,
    };
    if let Some(level) = &cli.log_level {
        config.logging.level = level
            .parse()
            .map_err(anyhow::Error::msg)
            .context("Invalid --log-level")?;
    }

    let _logging = init_logging(LoggingOptions {
        level: Some(config.logging.level.to_string()),
        console: true,
    });
    debug!("graphcalc v{} starting", env!("CARGO_PKG_VERSION"));

    let ctx = EngineContext::new(config);
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    execute_command(cli.command, &ctx, &mut out)
}

fn execute_command(command: Commands, ctx: &EngineContext, out: &mut impl Write) -> Result<()> {
    match command {
        Commands::Plot {
            expression,
            range,
            scale,
            resolution,
            millis,
            with,
            format,
        } => {
            let mut request = PlotRequest::new(expression, range.variable.clone())
                .with_domain(range.from, range.to)
                .with_scale_mode(scale)
                .with_millisecond_mode(millis);
            if let Some(n) = resolution {
                request = request.with_resolution(n);
            }
            if let Some(g) = with {
                request = request.with_second(WITH_CURVE_ID, g);
            }
            let output = plot(&request, ctx)
                .with_context(|| format!("Failed to plot '{}'", request.expression))?;
            info!("Sampled {} points", output.samples.len());
            write_plot(&output, format, out)
        }
        Commands::Solve {
            equation,
            range,
            with,
            format,
        } => {
            let tree = parse(&equation, &range.variable)
                .with_context(|| format!("Failed to parse '{equation}'"))?;
            let other = with
                .as_deref()
                .map(|g| parse(g, &range.variable).with_context(|| format!("Failed to parse '{g}'")))
                .transpose()?;
            let roots = solve_with(&tree, other.as_ref(), range.domain(), &ctx.config.solver);
            write_roots(&roots, &range, format, out)
        }
        Commands::Analyze {
            expression,
            range,
            format,
        } => {
            let tree = parse(&expression, &range.variable)
                .with_context(|| format!("Failed to parse '{expression}'"))?;
            let features = analyze(&tree, range.domain(), &ctx.config.solver)
                .with_context(|| format!("Failed to analyze '{expression}'"))?;
            write_features(&features, format, out)
        }
        Commands::Config { command } => match command {
            ConfigCommand::Generate { output } => match output {
                Some(path) => ConfigLoader::save_to_file(&EngineConfig::default(), &path),
                None => {
                    out.write_all(ConfigLoader::generate_sample_config().as_bytes())?;
                    Ok(())
                }
            },
            ConfigCommand::Show => {
                let yaml = serde_yaml::to_string(&ctx.config).context("Failed to render config")?;
                out.write_all(yaml.as_bytes())?;
                Ok(())
            }
        },
    }
}

fn write_plot(output: &PlotOutput, format: OutputFormat, out: &mut impl Write) -> Result<()> {
    if format == OutputFormat::Json {
        serde_json::to_writer_pretty(&mut *out, output)?;
        writeln!(out)?;
        return Ok(());
    }

    match &output.second {
        Some(curve) => writeln!(out, "{},y,{}", output.axis_label, curve.id)?,
        None => writeln!(out, "{},y", output.axis_label)?,
    }
    for (i, sample) in output.samples.iter().enumerate() {
        match output.second.as_ref().and_then(|c| c.samples.get(i)) {
            Some(other) => writeln!(out, "{},{},{}", sample.x, sample.y, other.y)?,
            None => writeln!(out, "{},{}", sample.x, sample.y)?,
        }
    }
    for root in output.roots.iter().flatten() {
        writeln!(out, "# root {} = {}", root.exact, root.approx)?;
    }
    Ok(())
}

fn write_roots(roots: &[Root], range: &RangeArgs, format: OutputFormat, out: &mut impl Write) -> Result<()> {
    if format == OutputFormat::Json {
        serde_json::to_writer_pretty(&mut *out, roots)?;
        writeln!(out)?;
        return Ok(());
    }
    if roots.is_empty() {
        writeln!(out, "no real solutions in [{}, {}]", range.from, range.to)?;
        return Ok(());
    }
    for root in roots {
        write_root(&range.variable, root, format, out)?;
    }
    Ok(())
}

fn write_root(variable: &str, root: &Root, format: OutputFormat, out: &mut impl Write) -> Result<()> {
    if format == OutputFormat::Csv {
        writeln!(out, "{},{}", root.exact, root.approx)?;
    } else if root.exact == root.approx.to_string() {
        writeln!(out, "{variable} = {}", root.exact)?;
    } else {
        writeln!(out, "{variable} = {} ≈ {}", root.exact, root.approx)?;
    }
    Ok(())
}

fn write_features(features: &CurveFeatures, format: OutputFormat, out: &mut impl Write) -> Result<()> {
    if format == OutputFormat::Json {
        serde_json::to_writer_pretty(&mut *out, features)?;
        writeln!(out)?;
        return Ok(());
    }
    let list = |roots: &[Root]| {
        if roots.is_empty() {
            "none".to_string()
        } else {
            roots.iter().map(|r| r.exact.as_str()).collect::<Vec<_>>().join(", ")
        }
    };
    writeln!(out, "intercepts: {}", list(&features.intercepts))?;
    if features.critical_points.is_empty() {
        writeln!(out, "critical points: none")?;
    } else {
        let points: Vec<String> = features
            .critical_points
            .iter()
            .map(|p| format!("({}, {})", p.x.exact, p.y))
            .collect();
        writeln!(out, "critical points: {}", points.join(", "))?;
    }
    writeln!(out, "asymptotes: {}", list(&features.asymptotes))?;
    Ok(())
}
