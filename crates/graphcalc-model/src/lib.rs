//! Graph definitions as they are saved and loaded.
//!
//! Pure data: nothing here evaluates or solves. The JSON layout is camelCase
//! with RFC 3339 timestamps. Older files written with flat `start`/`end`
//! fields, `scale_type`, float timestamps and string comments are still
//! accepted on load; saving always writes the current layout.

mod legacy;
mod library;

pub use library::GraphLibrary;

use chrono::{DateTime, Utc};
use graphcalc_parser::validate_variable;
use graphcalc_scale::{ConfigurationError, Domain, ScaleMode, ScaleTransform};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("graph serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid timestamp '{0}'")]
    InvalidTimestamp(String),

    #[error("invalid variable: {0}")]
    InvalidVariable(String),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("only teachers can add comments ('{user}' is a {role})")]
    NotPermitted { user: String, role: Role },

    #[error("graph '{0}' not found")]
    GraphNotFound(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Teacher,
    Student,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Role::Teacher => "teacher",
            Role::Student => "student",
        })
    }
}

/// The signed-in user, supplied by the caller and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserIdentity {
    pub id: String,
    pub role: Role,
    pub display_name: String,
}

impl UserIdentity {
    pub fn new(id: impl Into<String>, role: Role, display_name: impl Into<String>) -> Self {
        UserIdentity {
            id: id.into(),
            role,
            display_name: display_name.into(),
        }
    }

    pub fn is_teacher(&self) -> bool {
        self.role == Role::Teacher
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub author: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl Comment {
    pub fn new(author: impl Into<String>, text: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Comment {
            author: author.into(),
            text: text.into(),
            timestamp,
        }
    }
}

/// One saved graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "legacy::RawGraph")]
pub struct GraphDefinition {
    pub name: String,
    pub expression: String,
    pub variable: String,
    pub domain: Domain,
    /// Independent y-range; `None` lets the renderer fit the samples.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<Domain>,
    pub scale_mode: ScaleMode,
    /// Append-only, oldest first.
    pub comments: Vec<Comment>,
    pub millisecond_mode: bool,
    pub created_at: DateTime<Utc>,
}

impl GraphDefinition {
    pub fn new(
        name: impl Into<String>,
        expression: impl Into<String>,
        variable: impl Into<String>,
        domain: Domain,
        scale_mode: ScaleMode,
    ) -> Self {
        GraphDefinition {
            name: name.into(),
            expression: expression.into(),
            variable: variable.into(),
            domain,
            range: None,
            scale_mode,
            comments: Vec::new(),
            millisecond_mode: false,
            created_at: Utc::now(),
        }
    }

    pub fn with_range(mut self, range: Domain) -> Self {
        self.range = Some(range);
        self
    }

    pub fn with_millisecond_mode(mut self, on: bool) -> Self {
        self.millisecond_mode = on;
        self
    }

    pub fn with_created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = at;
        self
    }

    /// Check the variable name and that the domain can be sampled in this
    /// graph's scale mode.
    pub fn validate(&self) -> Result<(), ModelError> {
        validate_variable(&self.variable).map_err(|e| ModelError::InvalidVariable(e.message))?;
        ScaleTransform::new(self.scale_mode).coordinates(self.domain.start, self.domain.end, 2)?;
        Ok(())
    }

    pub fn push_comment(&mut self, comment: Comment) {
        self.comments.push(comment);
    }

    /// Concatenate comments written elsewhere onto this graph's list.
    pub fn merge_comments(&mut self, incoming: impl IntoIterator<Item = Comment>) {
        self.comments.extend(incoming);
    }

    pub fn to_json(&self) -> Result<String, ModelError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Structural form of a graph, field for field.
pub fn serialize(graph: &GraphDefinition) -> Result<JsonValue, ModelError> {
    Ok(serde_json::to_value(graph)?)
}

/// Inverse of [`serialize`]; also accepts the legacy layout.
pub fn deserialize(value: JsonValue) -> Result<GraphDefinition, ModelError> {
    Ok(serde_json::from_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> GraphDefinition {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let mut g = GraphDefinition::new("parabola", "x^2", "x", Domain::new(-5.0, 5.0), ScaleMode::Linear)
            .with_created_at(at);
        g.push_comment(Comment::new("ms-lee", "check the vertex", at));
        g
    }

    #[test]
    fn layout_is_camel_case() {
        let v = serialize(&sample()).unwrap();
        assert_eq!(v["scaleMode"], "linear");
        assert_eq!(v["millisecondMode"], false);
        assert_eq!(v["domain"]["start"], -5.0);
        assert_eq!(v["comments"][0]["author"], "ms-lee");
        assert_eq!(v["createdAt"], "2024-03-01T12:00:00Z");
        assert!(v.get("range").is_none());
    }

    #[test]
    fn validation() {
        assert!(sample().validate().is_ok());
        let mut bad = sample();
        bad.variable = "sin".into();
        assert!(matches!(bad.validate(), Err(ModelError::InvalidVariable(_))));
        let mut empty = sample();
        empty.domain = Domain::new(3.0, 3.0);
        assert!(matches!(empty.validate(), Err(ModelError::Configuration(_))));
        let mut log = sample();
        log.scale_mode = ScaleMode::Log;
        log.domain = Domain::new(0.0, 100.0);
        assert!(log.validate().is_ok());
    }

    #[test]
    fn merge_concatenates() {
        let mut g = sample();
        let at = g.created_at;
        g.merge_comments(vec![Comment::new("a", "one", at), Comment::new("b", "two", at)]);
        let texts: Vec<&str> = g.comments.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["check the vertex", "one", "two"]);
    }
}
