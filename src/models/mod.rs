mod metadata;
mod place;
mod query;
mod recommendation;
mod user;

pub use metadata::PlaceMetadata;
pub use place::{Place, Season, UnknownSeason};
pub use query::Query;
pub use recommendation::{Recommendation, RecommendationSet};
pub use user::{Bookmark, NewUser, Rating, TagSurvey, User, RATING_RANGE};
