//! Logging setup shared by the graphcalc binary and embedders.
//!
//! Library crates only emit `tracing` events. [`init_logging`] installs the
//! subscriber: an `EnvFilter`, an optional stderr formatter, and a bridge
//! that hands every event to a registered hook as a [`LogRecord`]. `log`
//! records are forwarded into `tracing` as well.

use once_cell::sync::OnceCell;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::subscriber::DefaultGuard;
use tracing::Subscriber;
use tracing_log::LogTracer;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Layer;

pub const LOG_ENV: &str = "GRAPHCALC_LOG";
pub const DEFAULT_LEVEL: &str = "info";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogRecord {
    pub ts: String,
    pub level: String,
    pub target: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<JsonValue>,
}

type LogHook = Arc<dyn Fn(&LogRecord) + Send + Sync>;

static LOG_HOOK: OnceCell<LogHook> = OnceCell::new();

/// Keeps a thread-local subscriber alive when a global one was already set.
pub struct LoggingGuard {
    _guard: Option<DefaultGuard>,
}

#[derive(Debug, Clone, Default)]
pub struct LoggingOptions {
    /// Filter directive used when neither `RUST_LOG` nor `GRAPHCALC_LOG` is set.
    pub level: Option<String>,
    /// Also print events to stderr.
    pub console: bool,
}

/// Register the structured log hook. Only the first registration sticks.
pub fn set_log_hook<F>(hook: F)
where
    F: Fn(&LogRecord) + Send + Sync + 'static,
{
    let _ = LOG_HOOK.set(Arc::new(hook));
}

/// Filter directive in precedence order: `RUST_LOG`, `GRAPHCALC_LOG`, the
/// configured level, then `info`.
pub fn filter_directive(
    rust_log: Option<String>,
    graphcalc_log: Option<String>,
    level: Option<&str>,
) -> String {
    [rust_log, graphcalc_log, level.map(str::to_string)]
        .into_iter()
        .flatten()
        .map(|d| d.trim().to_string())
        .find(|d| !d.is_empty())
        .unwrap_or_else(|| DEFAULT_LEVEL.to_string())
}

fn env_filter(level: Option<&str>) -> EnvFilter {
    let directive = filter_directive(
        std::env::var("RUST_LOG").ok(),
        std::env::var(LOG_ENV).ok(),
        level,
    );
    EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL))
}

pub fn init_logging(opts: LoggingOptions) -> LoggingGuard {
    let _ = LogTracer::init();

    let build_subscriber = || {
        let console = opts.console.then(|| {
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
        });
        tracing_subscriber::registry()
            .with(env_filter(opts.level.as_deref()))
            .with(HookLayer)
            .with(console)
    };

    let guard = match tracing::subscriber::set_global_default(build_subscriber()) {
        Ok(()) => None,
        Err(_) => Some(tracing::subscriber::set_default(build_subscriber())),
    };
    LoggingGuard { _guard: guard }
}

struct HookLayer;

fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

impl<S> Layer<S> for HookLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let Some(hook) = LOG_HOOK.get() else {
            return;
        };
        let mut visitor = JsonVisitor::default();
        event.record(&mut visitor);

        let meta = event.metadata();
        let record = LogRecord {
            ts: now_rfc3339(),
            level: meta.level().to_string(),
            target: meta.target().to_string(),
            message: visitor.message.unwrap_or_else(|| meta.name().to_string()),
            fields: visitor.fields.filter(|m| !m.is_empty()).map(JsonValue::Object),
        };
        hook(&record);
    }
}

#[derive(Default)]
struct JsonVisitor {
    message: Option<String>,
    fields: Option<serde_json::Map<String, JsonValue>>,
}

impl JsonVisitor {
    fn insert(&mut self, field: &tracing::field::Field, value: JsonValue) {
        if field.name() == "message" {
            self.message = Some(match value {
                JsonValue::String(s) => s,
                other => other.to_string(),
            });
            return;
        }
        // `log` records bridged by tracing-log carry their metadata as `log.*` fields
        if field.name().starts_with("log.") {
            return;
        }
        self.fields
            .get_or_insert_with(Default::default)
            .insert(field.name().to_string(), value);
    }
}

impl tracing::field::Visit for JsonVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.insert(field, JsonValue::String(format!("{value:?}")));
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.insert(field, JsonValue::String(value.to_string()));
    }

    fn record_f64(&mut self, field: &tracing::field::Field, value: f64) {
        let v = serde_json::Number::from_f64(value)
            .map(JsonValue::Number)
            .unwrap_or_else(|| JsonValue::String(value.to_string()));
        self.insert(field, v);
    }

    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        self.insert(field, JsonValue::from(value));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.insert(field, JsonValue::from(value));
    }

    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.insert(field, JsonValue::Bool(value));
    }
}
