//! Input normalization: loose client payloads into a canonical [`Query`].
//!
//! Priority order, first match wins:
//! 1. non-empty free text (`description` or `text`)
//! 2. explicit categories (`season`, `nature`, `vibe`, `target`)
//! 3. a flat `tags` list, broadcast to nature, vibe and target
//! 4. nothing, which yields the empty query

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;

use super::RecommendError;
use crate::models::{Query, Season};

/// Normalizes one tag: trim, strip a leading `#`, lowercase.
///
/// Returns `None` for tags that are empty after stripping.
pub fn normalize_tag(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let stripped = trimmed.strip_prefix('#').unwrap_or(trimmed).trim();
    if stripped.is_empty() {
        None
    } else {
        Some(stripped.to_lowercase())
    }
}

/// Normalizes a tag list and drops duplicates, keeping first-seen order.
///
/// Corpus tags go through this at load time and query tags at request time;
/// matching relies on both sides being normalized the same way.
pub fn normalize_tags<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    raw.into_iter()
        .filter_map(|tag| normalize_tag(tag.as_ref()))
        .filter(|tag| seen.insert(tag.clone()))
        .collect()
}

/// Recommendation request body as clients send it
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryPayload {
    #[serde(default, alias = "text")]
    pub description: Option<Value>,
    #[serde(default)]
    pub season: Option<Value>,
    #[serde(default)]
    pub nature: Option<Value>,
    #[serde(default)]
    pub vibe: Option<Value>,
    #[serde(default)]
    pub target: Option<Value>,
    #[serde(default)]
    pub tags: Option<Value>,
}

/// The shapes a query can arrive in, resolved from a [`QueryPayload`]
#[derive(Debug, Clone, PartialEq)]
pub enum QueryInput {
    Text(String),
    Categories {
        season: Option<String>,
        nature: Vec<String>,
        vibe: Vec<String>,
        target: Vec<String>,
    },
    FlatTags(Vec<String>),
    Empty,
}

impl QueryInput {
    /// Validates every field of the payload, then picks the variant by priority.
    ///
    /// Malformed fields are rejected even when a higher-priority field would
    /// have won, so a bad request never reaches scoring.
    pub fn from_payload(payload: &QueryPayload) -> Result<Self, RecommendError> {
        let description = optional_string("description", payload.description.as_ref())?;
        let season = optional_string("season", payload.season.as_ref())?;
        let nature = string_or_list("nature", payload.nature.as_ref())?;
        let vibe = string_or_list("vibe", payload.vibe.as_ref())?;
        let target = string_or_list("target", payload.target.as_ref())?;
        let tags = strict_list("tags", payload.tags.as_ref())?;

        if let Some(text) = description.filter(|t| !t.trim().is_empty()) {
            return Ok(QueryInput::Text(text));
        }

        let season = season.filter(|s| !s.trim().is_empty());
        if season.is_some() || !nature.is_empty() || !vibe.is_empty() || !target.is_empty() {
            return Ok(QueryInput::Categories {
                season,
                nature,
                vibe,
                target,
            });
        }

        if !tags.is_empty() {
            return Ok(QueryInput::FlatTags(tags));
        }

        Ok(QueryInput::Empty)
    }

    /// Converts the input into the canonical query
    pub fn normalize(self) -> Result<Query, RecommendError> {
        match self {
            QueryInput::Text(text) => Ok(normalize_text(text)),
            QueryInput::Categories {
                season,
                nature,
                vibe,
                target,
            } => normalize_categories(season.as_deref(), &nature, &vibe, &target),
            QueryInput::FlatTags(tags) => Ok(normalize_flat_tags(&tags)),
            QueryInput::Empty => Ok(Query::default()),
        }
    }
}

/// Resolves a raw payload straight into a canonical query
pub fn resolve_query(payload: &QueryPayload) -> Result<Query, RecommendError> {
    QueryInput::from_payload(payload)?.normalize()
}

fn normalize_text(text: String) -> Query {
    Query::text(text.trim())
}

fn normalize_categories(
    season: Option<&str>,
    nature: &[String],
    vibe: &[String],
    target: &[String],
) -> Result<Query, RecommendError> {
    let season = match season {
        Some(raw) => Season::parse_optional(raw)
            .map_err(|e| RecommendError::InvalidQuery(e.to_string()))?,
        None => None,
    };

    Ok(Query {
        text: None,
        season,
        nature: normalize_tags(nature),
        vibe: normalize_tags(vibe),
        target: normalize_tags(target),
    })
}

/// A flat tag cannot be attributed to one dimension, so it is applied to all three
fn normalize_flat_tags(tags: &[String]) -> Query {
    let normalized = normalize_tags(tags);
    Query {
        text: None,
        season: None,
        nature: normalized.clone(),
        vibe: normalized.clone(),
        target: normalized,
    }
}

fn optional_string(field: &str, value: Option<&Value>) -> Result<Option<String>, RecommendError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(RecommendError::InvalidQuery(format!(
            "'{field}' must be a string, got {}",
            json_kind(other)
        ))),
    }
}

/// Categorical fields accept a single string, coerced to a one-element list
fn string_or_list(field: &str, value: Option<&Value>) -> Result<Vec<String>, RecommendError> {
    match value {
        Some(Value::String(s)) => Ok(vec![s.clone()]),
        _ => strict_list(field, value),
    }
}

fn strict_list(field: &str, value: Option<&Value>) -> Result<Vec<String>, RecommendError> {
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.clone()),
                other => Err(RecommendError::InvalidQuery(format!(
                    "'{field}' must contain only strings, found {}",
                    json_kind(other)
                ))),
            })
            .collect(),
        Some(other) => Err(RecommendError::InvalidQuery(format!(
            "'{field}' must be a list, got {}",
            json_kind(other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: serde_json::Value) -> QueryPayload {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_normalize_tag_strips_hash_and_case() {
        assert_eq!(normalize_tag("  #Beach "), Some("beach".to_string()));
        assert_eq!(normalize_tag("#"), None);
        assert_eq!(normalize_tag("   "), None);
    }

    #[test]
    fn test_normalize_tags_dedupes_in_first_seen_order() {
        let tags = normalize_tags(["Forest", "#beach", "forest", " BEACH", "lake"]);
        assert_eq!(tags, vec!["forest", "beach", "lake"]);
    }

    #[test]
    fn test_free_text_has_highest_priority() {
        let input = QueryInput::from_payload(&payload(json!({
            "description": "  조용한 바다 ",
            "season": "summer",
            "tags": ["beach"]
        })))
        .unwrap();
        assert_eq!(input, QueryInput::Text("  조용한 바다 ".to_string()));
        assert_eq!(input.normalize().unwrap(), Query::text("조용한 바다"));
    }

    #[test]
    fn test_text_alias_is_accepted() {
        let query = resolve_query(&payload(json!({ "text": "snowy hike" }))).unwrap();
        assert_eq!(query.text.as_deref(), Some("snowy hike"));
    }

    #[test]
    fn test_blank_text_falls_through_to_categories() {
        let query = resolve_query(&payload(json!({
            "description": "   ",
            "season": "Winter",
            "nature": "#Mountain"
        })))
        .unwrap();
        assert_eq!(query.text, None);
        assert_eq!(query.season, Some(Season::Winter));
        assert_eq!(query.nature, vec!["mountain"]);
        assert!(query.vibe.is_empty());
    }

    #[test]
    fn test_categories_win_over_flat_tags() {
        let query = resolve_query(&payload(json!({
            "vibe": ["Healing"],
            "tags": ["beach"]
        })))
        .unwrap();
        assert_eq!(query.vibe, vec!["healing"]);
        assert!(query.nature.is_empty());
        assert!(query.target.is_empty());
    }

    #[test]
    fn test_flat_tags_broadcast_to_every_dimension() {
        let query = resolve_query(&payload(json!({ "tags": ["#Beach", "family", "beach"] }))).unwrap();
        let expected = vec!["beach".to_string(), "family".to_string()];
        assert_eq!(query.nature, expected);
        assert_eq!(query.vibe, expected);
        assert_eq!(query.target, expected);
        assert_eq!(query.season, None);
    }

    #[test]
    fn test_no_input_yields_empty_query() {
        let query = resolve_query(&payload(json!({}))).unwrap();
        assert!(query.is_empty());

        let query = resolve_query(&payload(json!({ "tags": [], "nature": null }))).unwrap();
        assert!(query.is_empty());
    }

    #[test]
    fn test_scalar_tags_field_is_rejected() {
        let err = resolve_query(&payload(json!({ "tags": "beach" }))).unwrap_err();
        assert!(matches!(err, RecommendError::InvalidQuery(_)));
    }

    #[test]
    fn test_non_string_list_items_are_rejected() {
        let err = resolve_query(&payload(json!({ "nature": ["beach", 3] }))).unwrap_err();
        assert!(matches!(err, RecommendError::InvalidQuery(msg) if msg.contains("nature")));
    }

    #[test]
    fn test_malformed_field_rejected_even_when_text_wins() {
        let err = resolve_query(&payload(json!({
            "description": "mountain cabin",
            "target": { "who": "family" }
        })))
        .unwrap_err();
        assert!(matches!(err, RecommendError::InvalidQuery(_)));
    }

    #[test]
    fn test_unknown_season_is_rejected() {
        let err = resolve_query(&payload(json!({ "season": "monsoon" }))).unwrap_err();
        assert!(matches!(err, RecommendError::InvalidQuery(msg) if msg.contains("monsoon")));
    }
}
