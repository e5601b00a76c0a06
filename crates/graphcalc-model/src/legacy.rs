//! Loose on-disk forms accepted when loading graphs.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use graphcalc_scale::{Domain, ScaleMode};
use serde::Deserialize;

use crate::{Comment, GraphDefinition, ModelError};

const LEGACY_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// RFC 3339 text, `YYYY-MM-DD HH:MM:SS` text, or float seconds since epoch.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawTimestamp {
    Seconds(f64),
    Text(String),
}

impl RawTimestamp {
    pub(crate) fn resolve(&self) -> Result<DateTime<Utc>, ModelError> {
        match self {
            RawTimestamp::Seconds(secs) => {
                let whole = secs.floor();
                let nanos = ((secs - whole) * 1e9).round() as u32;
                Utc.timestamp_opt(whole as i64, nanos.min(999_999_999))
                    .single()
                    .ok_or_else(|| ModelError::InvalidTimestamp(secs.to_string()))
            }
            RawTimestamp::Text(text) => DateTime::parse_from_rfc3339(text)
                .map(|t| t.with_timezone(&Utc))
                .or_else(|_| {
                    NaiveDateTime::parse_from_str(text, LEGACY_TIMESTAMP_FORMAT).map(|t| t.and_utc())
                })
                .map_err(|_| ModelError::InvalidTimestamp(text.clone())),
        }
    }
}

/// Missing timestamps load as the Unix epoch.
fn resolve_or_epoch(ts: Option<&RawTimestamp>) -> Result<DateTime<Utc>, ModelError> {
    match ts {
        Some(ts) => ts.resolve(),
        None => Ok(DateTime::<Utc>::default()),
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawComment {
    Current {
        author: String,
        text: String,
        timestamp: RawTimestamp,
    },
    Legacy {
        teacher: String,
        comment: String,
        #[serde(default)]
        timestamp: Option<RawTimestamp>,
    },
    Text(String),
}

impl RawComment {
    fn resolve(self) -> Result<Comment, ModelError> {
        Ok(match self {
            RawComment::Current {
                author,
                text,
                timestamp,
            } => Comment::new(author, text, timestamp.resolve()?),
            RawComment::Legacy {
                teacher,
                comment,
                timestamp,
            } => Comment::new(teacher, comment, resolve_or_epoch(timestamp.as_ref())?),
            RawComment::Text(text) => Comment::new("", text, DateTime::<Utc>::default()),
        })
    }
}

#[doc(hidden)]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawGraph {
    #[serde(default)]
    name: String,
    expression: String,
    #[serde(default = "default_variable")]
    variable: String,
    #[serde(default)]
    domain: Option<Domain>,
    #[serde(default)]
    start: Option<f64>,
    #[serde(default)]
    end: Option<f64>,
    #[serde(default)]
    range: Option<Domain>,
    #[serde(default, alias = "scale_type")]
    scale_mode: Option<String>,
    #[serde(default)]
    comments: Vec<RawComment>,
    #[serde(default, alias = "millisecond_mode")]
    millisecond_mode: bool,
    #[serde(default, alias = "created_at", alias = "timestamp")]
    created_at: Option<RawTimestamp>,
}

fn default_variable() -> String {
    "x".to_string()
}

/// Scale names written by older versions, which only knew radians and
/// degrees.
fn parse_scale_mode(name: Option<&str>) -> Result<ScaleMode, ModelError> {
    match name {
        None => Ok(ScaleMode::default()),
        Some(n) if n.eq_ignore_ascii_case("radians") => Ok(ScaleMode::Linear),
        Some(n) => Ok(n.parse()?),
    }
}

impl TryFrom<RawGraph> for GraphDefinition {
    type Error = ModelError;

    fn try_from(raw: RawGraph) -> Result<Self, Self::Error> {
        let domain = match (raw.domain, raw.start, raw.end) {
            (Some(d), _, _) => d,
            (None, Some(start), Some(end)) => Domain::new(start, end),
            _ => Domain::default(),
        };
        Ok(GraphDefinition {
            name: raw.name,
            expression: raw.expression,
            variable: raw.variable,
            domain,
            range: raw.range,
            scale_mode: parse_scale_mode(raw.scale_mode.as_deref())?,
            comments: raw
                .comments
                .into_iter()
                .map(RawComment::resolve)
                .collect::<Result<_, _>>()?,
            millisecond_mode: raw.millisecond_mode,
            created_at: resolve_or_epoch(raw.created_at.as_ref())?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_seconds_keep_subsecond_precision() {
        let t = RawTimestamp::Seconds(1_700_000_000.25).resolve().unwrap();
        assert_eq!(t.timestamp(), 1_700_000_000);
        assert_eq!(t.timestamp_subsec_millis(), 250);
    }

    #[test]
    fn legacy_text_timestamp() {
        let t = RawTimestamp::Text("2023-05-04 10:20:30".into()).resolve().unwrap();
        assert_eq!(t.to_rfc3339(), "2023-05-04T10:20:30+00:00");
        assert!(RawTimestamp::Text("yesterday".into()).resolve().is_err());
    }

    #[test]
    fn radians_means_linear() {
        assert_eq!(parse_scale_mode(Some("Radians")).unwrap(), ScaleMode::Linear);
        assert_eq!(parse_scale_mode(Some("degrees")).unwrap(), ScaleMode::Degrees);
        assert!(parse_scale_mode(Some("cubic")).is_err());
    }
}
