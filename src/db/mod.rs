pub mod memory;
pub mod postgres;
pub mod redis;

use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Bookmark, NewUser, PlaceMetadata, Rating, TagSurvey, User},
};

pub use memory::{CorpusDirectory, MemoryStore};
pub use postgres::{create_pool, PgStore};
pub use self::redis::{create_redis_client, Cache, CacheKey, CacheWriterHandle};

/// Accounts and everything users save: ratings, bookmarks, tag surveys
#[async_trait::async_trait]
pub trait UserRepository: Send + Sync {
    /// Inserts a new account.
    ///
    /// Fails with `AppError::Conflict` when the username or email is taken.
    async fn create_user(&self, user: NewUser) -> AppResult<User>;

    async fn find_user_by_username(&self, username: &str) -> AppResult<Option<User>>;

    async fn find_user_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Inserts or replaces the user's rating for a place
    async fn upsert_rating(&self, user_id: Uuid, place_id: i64, score: i16) -> AppResult<Rating>;

    async fn list_ratings(&self, user_id: Uuid) -> AppResult<Vec<Rating>>;

    /// Adds a bookmark; adding an existing one returns it unchanged
    async fn add_bookmark(&self, user_id: Uuid, place_id: i64) -> AppResult<Bookmark>;

    /// Returns false when there was nothing to remove
    async fn remove_bookmark(&self, user_id: Uuid, place_id: i64) -> AppResult<bool>;

    async fn list_bookmarks(&self, user_id: Uuid) -> AppResult<Vec<Bookmark>>;

    async fn save_tag_survey(&self, user_id: Uuid, survey: &TagSurvey) -> AppResult<()>;

    async fn tag_survey(&self, user_id: Uuid) -> AppResult<Option<TagSurvey>>;

    /// Cheap connectivity check for health reporting
    async fn ping(&self) -> bool;
}

/// Display metadata for places, keyed by place id
#[async_trait::async_trait]
pub trait PlaceDirectory: Send + Sync {
    async fn find_place(&self, place_id: i64) -> AppResult<Option<PlaceMetadata>>;
}
