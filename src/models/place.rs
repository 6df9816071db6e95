use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

/// Season a place is best visited in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Spring,
    Summer,
    Autumn,
    Winter,
}

/// Error returned when a season label is outside the closed set
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown season '{0}'")]
pub struct UnknownSeason(pub String);

impl Season {
    /// Parses an optional season label. Blank labels mean "no season".
    pub fn parse_optional(raw: &str) -> Result<Option<Self>, UnknownSeason> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        trimmed.parse().map(Some)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Season::Spring => "spring",
            Season::Summer => "summer",
            Season::Autumn => "autumn",
            Season::Winter => "winter",
        }
    }
}

impl FromStr for Season {
    type Err = UnknownSeason;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim().trim_start_matches('#').to_lowercase();
        match label.as_str() {
            "spring" | "봄" => Ok(Season::Spring),
            "summer" | "여름" => Ok(Season::Summer),
            "autumn" | "fall" | "가을" => Ok(Season::Autumn),
            "winter" | "겨울" => Ok(Season::Winter),
            _ => Err(UnknownSeason(s.to_string())),
        }
    }
}

impl Display for Season {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A travel destination in the recommendation corpus.
///
/// Tag lists are stored already normalized, so the tag scorer can compare them
/// against normalized query tags directly.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Place {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub season: Option<Season>,
    pub nature_tags: Vec<String>,
    pub vibe_tags: Vec<String>,
    pub target_tags: Vec<String>,
}

impl Place {
    /// Name, description, season and tags joined into the text a place is
    /// embedded from, so place vectors share a space with both free-text and
    /// synthesized tag queries
    pub fn embedding_text(&self) -> String {
        let mut parts = vec![self.name.as_str(), self.description.as_str()];
        if let Some(season) = &self.season {
            parts.push(season.as_str());
        }
        parts.extend(self.nature_tags.iter().map(String::as_str));
        parts.extend(self.vibe_tags.iter().map(String::as_str));
        parts.extend(self.target_tags.iter().map(String::as_str));
        parts.retain(|p| !p.trim().is_empty());
        parts.join(" ")
    }
}
