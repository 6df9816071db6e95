use std::collections::HashMap;

use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{PlaceDirectory, UserRepository};
use crate::{
    error::{AppError, AppResult},
    models::{Bookmark, NewUser, PlaceMetadata, Rating, TagSurvey, User},
    recommender::RecommenderHandle,
};

/// Process-local storage used when no database is configured, and by tests
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
    places: HashMap<i64, PlaceMetadata>,
}

#[derive(Default)]
struct MemoryStoreInner {
    users: HashMap<Uuid, User>,
    /// Ratings per user, in insertion order
    ratings: HashMap<Uuid, Vec<Rating>>,
    bookmarks: HashMap<Uuid, Vec<Bookmark>>,
    surveys: HashMap<Uuid, TagSurvey>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the place directory with display metadata
    pub fn with_places(places: impl IntoIterator<Item = PlaceMetadata>) -> Self {
        Self {
            inner: RwLock::default(),
            places: places.into_iter().map(|p| (p.place_id, p)).collect(),
        }
    }
}

#[async_trait::async_trait]
impl UserRepository for MemoryStore {
    async fn create_user(&self, user: NewUser) -> AppResult<User> {
        let mut inner = self.inner.write().await;

        if inner.users.values().any(|u| u.username == user.username) {
            return Err(AppError::Conflict("username already exists".to_string()));
        }
        if inner.users.values().any(|u| u.email == user.email) {
            return Err(AppError::Conflict("email already exists".to_string()));
        }

        let user = user.into_user();
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().find(|u| u.username == username).cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.get(&id).cloned())
    }

    async fn upsert_rating(&self, user_id: Uuid, place_id: i64, score: i16) -> AppResult<Rating> {
        let mut inner = self.inner.write().await;
        let ratings = inner.ratings.entry(user_id).or_default();

        // Update if exists, otherwise add
        if let Some(existing) = ratings.iter_mut().find(|r| r.place_id == place_id) {
            existing.score = score;
            existing.updated_at = Some(Utc::now());
            return Ok(existing.clone());
        }

        let rating = Rating {
            place_id,
            score,
            created_at: Utc::now(),
            updated_at: None,
        };
        ratings.push(rating.clone());
        Ok(rating)
    }

    async fn list_ratings(&self, user_id: Uuid) -> AppResult<Vec<Rating>> {
        let inner = self.inner.read().await;
        Ok(inner.ratings.get(&user_id).cloned().unwrap_or_default())
    }

    async fn add_bookmark(&self, user_id: Uuid, place_id: i64) -> AppResult<Bookmark> {
        let mut inner = self.inner.write().await;
        let bookmarks = inner.bookmarks.entry(user_id).or_default();

        if let Some(existing) = bookmarks.iter().find(|b| b.place_id == place_id) {
            return Ok(existing.clone());
        }

        let bookmark = Bookmark {
            place_id,
            created_at: Utc::now(),
        };
        bookmarks.push(bookmark.clone());
        Ok(bookmark)
    }

    async fn remove_bookmark(&self, user_id: Uuid, place_id: i64) -> AppResult<bool> {
        let mut inner = self.inner.write().await;
        let Some(bookmarks) = inner.bookmarks.get_mut(&user_id) else {
            return Ok(false);
        };
        let before = bookmarks.len();
        bookmarks.retain(|b| b.place_id != place_id);
        Ok(bookmarks.len() != before)
    }

    async fn list_bookmarks(&self, user_id: Uuid) -> AppResult<Vec<Bookmark>> {
        let inner = self.inner.read().await;
        Ok(inner.bookmarks.get(&user_id).cloned().unwrap_or_default())
    }

    async fn save_tag_survey(&self, user_id: Uuid, survey: &TagSurvey) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        inner.surveys.insert(user_id, survey.clone());
        Ok(())
    }

    async fn tag_survey(&self, user_id: Uuid) -> AppResult<Option<TagSurvey>> {
        let inner = self.inner.read().await;
        Ok(inner.surveys.get(&user_id).cloned())
    }

    async fn ping(&self) -> bool {
        true
    }
}

#[async_trait::async_trait]
impl PlaceDirectory for MemoryStore {
    async fn find_place(&self, place_id: i64) -> AppResult<Option<PlaceMetadata>> {
        Ok(self.places.get(&place_id).cloned())
    }
}

/// Place directory answering from the active corpus, with names only.
///
/// Used when no database holds richer metadata; follows corpus reloads.
#[derive(Clone)]
pub struct CorpusDirectory {
    handle: RecommenderHandle,
}

impl CorpusDirectory {
    pub fn new(handle: RecommenderHandle) -> Self {
        Self { handle }
    }
}

#[async_trait::async_trait]
impl PlaceDirectory for CorpusDirectory {
    async fn find_place(&self, place_id: i64) -> AppResult<Option<PlaceMetadata>> {
        let Ok(recommender) = self.handle.current() else {
            return Ok(None);
        };
        Ok(recommender.corpus().place(place_id).map(|place| PlaceMetadata {
            place_id: place.id,
            name: place.name.clone(),
            address: None,
            image_url: None,
            latitude: None,
            longitude: None,
        }))
    }
}
