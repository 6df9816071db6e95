use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Query, Season};

/// A registered account
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields needed to create an account; the password is already hashed
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub name: Option<String>,
}

impl NewUser {
    /// Materializes the account with a fresh id
    pub fn into_user(self) -> User {
        User {
            id: Uuid::new_v4(),
            username: self.username,
            email: self.email,
            password_hash: self.password_hash,
            name: self.name,
            created_at: Utc::now(),
        }
    }
}

/// A user's star rating for a place, one per (user, place)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Rating {
    pub place_id: i64,
    pub score: i16,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Lowest and highest accepted rating scores
pub const RATING_RANGE: std::ops::RangeInclusive<i16> = 1..=5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Bookmark {
    pub place_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Saved answers of the tag survey, already normalized
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TagSurvey {
    pub season: Option<Season>,
    pub nature: Vec<String>,
    pub vibe: Vec<String>,
    pub target: Vec<String>,
}

impl TagSurvey {
    pub fn is_empty(&self) -> bool {
        self.season.is_none()
            && self.nature.is_empty()
            && self.vibe.is_empty()
            && self.target.is_empty()
    }
}

impl From<Query> for TagSurvey {
    fn from(query: Query) -> Self {
        Self {
            season: query.season,
            nature: query.nature,
            vibe: query.vibe,
            target: query.target,
        }
    }
}

impl From<TagSurvey> for Query {
    fn from(survey: TagSurvey) -> Self {
        Query {
            text: None,
            season: survey.season,
            nature: survey.nature,
            vibe: survey.vibe,
            target: survey.target,
        }
    }
}
