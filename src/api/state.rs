use axum::extract::FromRef;
use std::sync::Arc;

use crate::{
    auth::AuthConfig,
    db::{Cache, CorpusDirectory, MemoryStore, PlaceDirectory, UserRepository},
    recommender::RecommenderHandle,
    services::{AccountService, PlaceMetadataService, RecommendationService, TopKPolicy},
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub accounts: AccountService,
    pub recommendations: RecommendationService,
    pub auth: AuthConfig,
}

impl FromRef<AppState> for AuthConfig {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}

impl AppState {
    pub fn new(
        recommender: RecommenderHandle,
        users: Arc<dyn UserRepository>,
        places: Arc<dyn PlaceDirectory>,
        cache: Option<Cache>,
        auth: AuthConfig,
        top_k: TopKPolicy,
    ) -> Self {
        let metadata = PlaceMetadataService::new(places, cache);
        Self {
            accounts: AccountService::new(users.clone(), auth.clone()),
            recommendations: RecommendationService::new(recommender, users.clone(), metadata, top_k),
            users,
            auth,
        }
    }

    /// In-memory user data; place names come from the active corpus
    pub fn in_memory(recommender: RecommenderHandle, auth: AuthConfig, top_k: TopKPolicy) -> Self {
        let places = Arc::new(CorpusDirectory::new(recommender.clone()));
        Self::new(recommender, Arc::new(MemoryStore::new()), places, None, auth, top_k)
    }

    pub fn recommender(&self) -> &RecommenderHandle {
        self.recommendations.handle()
    }
}
