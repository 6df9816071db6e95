use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    db::UserRepository,
    error::{AppError, AppResult},
    models::{Query, Recommendation},
    recommender::{resolve_query, QueryPayload, RecommendError, RecommenderHandle},
};

use super::metadata::PlaceMetadataService;

/// A ranked place joined with its display metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendedPlace {
    pub place_id: i64,
    pub name: String,
    pub address: Option<String>,
    pub image_url: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub similarity_score: f32,
    pub tag_score: f32,
    pub hybrid_score: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecommendationResponse {
    /// The canonical query that was scored
    pub query: Query,
    pub recommendations: Vec<RecommendedPlace>,
    pub total_places: usize,
}

/// Result-count policy applied to every request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopKPolicy {
    pub default: usize,
    pub max: usize,
}

impl TopKPolicy {
    /// Applies the default for `None` and caps at `max`; zero and negatives are invalid
    pub fn resolve(&self, requested: Option<i64>) -> Result<usize, RecommendError> {
        match requested {
            None => Ok(self.default),
            Some(k) if k < 1 => Err(RecommendError::InvalidQuery(format!(
                "top_k must be at least 1, got {k}"
            ))),
            Some(k) => Ok(usize::try_from(k).map_or(self.max, |k| k.min(self.max))),
        }
    }
}

/// Serves recommendation requests end to end
#[derive(Clone)]
pub struct RecommendationService {
    recommender: RecommenderHandle,
    users: Arc<dyn UserRepository>,
    metadata: PlaceMetadataService,
    top_k: TopKPolicy,
}

impl RecommendationService {
    pub fn new(
        recommender: RecommenderHandle,
        users: Arc<dyn UserRepository>,
        metadata: PlaceMetadataService,
        top_k: TopKPolicy,
    ) -> Self {
        Self {
            recommender,
            users,
            metadata,
            top_k,
        }
    }

    pub fn handle(&self) -> &RecommenderHandle {
        &self.recommender
    }

    /// Normalizes the payload, scores the corpus and joins metadata.
    ///
    /// An empty payload from a signed-in user falls back to their saved tag
    /// survey. Places without metadata are left out of the response.
    pub async fn recommend(
        &self,
        payload: &QueryPayload,
        top_k: Option<i64>,
        user_id: Option<Uuid>,
    ) -> AppResult<RecommendationResponse> {
        let top_k = self.top_k.resolve(top_k)?;
        let mut query = resolve_query(payload)?;

        if query.is_empty() {
            if let Some(user_id) = user_id {
                query = self.survey_query(user_id).await?.unwrap_or(query);
            }
        }

        // fail fast before any scoring when nothing is loaded
        let recommender = self.recommender.current()?;

        let scored_query = query.clone();
        let scored = tokio::task::spawn_blocking(move || recommender.recommend(&scored_query, top_k))
            .await
            .map_err(|e| AppError::Internal(format!("scoring task failed: {e}")))??;

        let ids: Vec<i64> = scored.recommendations.iter().map(|r| r.place_id).collect();
        let metadata = self.metadata.find_many(&ids).await?;

        let recommendations: Vec<RecommendedPlace> = scored
            .recommendations
            .into_iter()
            .zip(metadata)
            .filter_map(|(rec, meta)| match meta {
                Some(meta) => Some(join(rec, meta)),
                None => {
                    tracing::warn!(place_id = rec.place_id, "No metadata for recommended place");
                    None
                }
            })
            .collect();

        tracing::info!(
            returned = recommendations.len(),
            top_k,
            total_places = scored.total_places,
            "Recommendations served"
        );

        Ok(RecommendationResponse {
            query,
            recommendations,
            total_places: scored.total_places,
        })
    }

    async fn survey_query(&self, user_id: Uuid) -> AppResult<Option<Query>> {
        let survey = self.users.tag_survey(user_id).await?;
        Ok(survey.filter(|s| !s.is_empty()).map(|s| {
            tracing::debug!(user_id = %user_id, "Using saved tag survey as query");
            Query::from(s)
        }))
    }
}

fn join(rec: Recommendation, meta: crate::models::PlaceMetadata) -> RecommendedPlace {
    RecommendedPlace {
        place_id: rec.place_id,
        name: meta.name,
        address: meta.address,
        image_url: meta.image_url,
        latitude: meta.latitude,
        longitude: meta.longitude,
        similarity_score: rec.similarity_score,
        tag_score: rec.tag_score,
        hybrid_score: rec.hybrid_score,
    }
}
