use serde::{Deserialize, Serialize};

use super::Season;

/// Canonical recommendation query.
///
/// Built once at the request boundary from whatever shape the client sent;
/// the scorers only ever see this form. Tag lists are normalized and
/// de-duplicated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Query {
    /// Free text for semantic matching
    pub text: Option<String>,
    pub season: Option<Season>,
    pub nature: Vec<String>,
    pub vibe: Vec<String>,
    pub target: Vec<String>,
}

impl Query {
    /// Creates a free-text query
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    /// True when no categorical field carries a preference
    pub fn has_no_categories(&self) -> bool {
        self.season.is_none()
            && self.nature.is_empty()
            && self.vibe.is_empty()
            && self.target.is_empty()
    }

    /// True when the query carries no signal at all
    pub fn is_empty(&self) -> bool {
        self.text.as_deref().map_or(true, |t| t.trim().is_empty()) && self.has_no_categories()
    }

    /// Text handed to the embedder.
    ///
    /// Free text wins. Without it, and when `synthesize` is set, the
    /// categorical fields are joined into a short phrase such as
    /// `"summer beach forest healing family"`.
    pub fn embedding_text(&self, synthesize: bool) -> Option<String> {
        if let Some(text) = self.text.as_deref().map(str::trim) {
            if !text.is_empty() {
                return Some(text.to_string());
            }
        }

        if !synthesize || self.has_no_categories() {
            return None;
        }

        let mut parts: Vec<&str> = Vec::new();
        if let Some(season) = &self.season {
            parts.push(season.as_str());
        }
        for tag in self.nature.iter().chain(&self.vibe).chain(&self.target) {
            if !parts.contains(&tag.as_str()) {
                parts.push(tag);
            }
        }
        Some(parts.join(" "))
    }
}
