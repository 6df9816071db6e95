use serde::{Deserialize, Serialize};

/// One ranked place with the scores that produced its rank
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub place_id: i64,
    /// Cosine similarity in [-1, 1]
    pub similarity_score: f32,
    /// Request-relative tag score in [0, 1]
    pub tag_score: f32,
    pub hybrid_score: f32,
}

/// Ranked output of the recommender
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationSet {
    pub recommendations: Vec<Recommendation>,
    /// Number of candidates that were scored
    pub total_places: usize,
}
