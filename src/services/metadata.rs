use std::sync::Arc;

use crate::{
    cached,
    db::{Cache, CacheKey, PlaceDirectory},
    error::{AppError, AppResult},
    models::PlaceMetadata,
};

const CACHE_TTL: u64 = 3600; // 1 hour in seconds

/// Place display metadata, read through the optional Redis cache
#[derive(Clone)]
pub struct PlaceMetadataService {
    directory: Arc<dyn PlaceDirectory>,
    cache: Option<Cache>,
}

impl PlaceMetadataService {
    pub fn new(directory: Arc<dyn PlaceDirectory>, cache: Option<Cache>) -> Self {
        Self { directory, cache }
    }

    /// Looks up one place; only found places are cached
    pub async fn find(&self, place_id: i64) -> AppResult<Option<PlaceMetadata>> {
        cached!(
            self.cache.as_ref(),
            CacheKey::PlaceMetadata(place_id),
            CACHE_TTL,
            self.directory.find_place(place_id)
        )
    }

    /// Looks up several places concurrently, keeping input order
    pub async fn find_many(&self, place_ids: &[i64]) -> AppResult<Vec<Option<PlaceMetadata>>> {
        let tasks: Vec<_> = place_ids
            .iter()
            .map(|&place_id| {
                let service = self.clone();
                tokio::spawn(async move { service.find(place_id).await })
            })
            .collect();

        let mut results = Vec::with_capacity(tasks.len());
        for task in tasks {
            let found = task
                .await
                .map_err(|e| AppError::Internal(format!("metadata lookup task failed: {e}")))??;
            results.push(found);
        }
        Ok(results)
    }
}
