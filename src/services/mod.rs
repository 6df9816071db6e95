pub mod accounts;
pub mod metadata;
pub mod recommendations;

pub use accounts::AccountService;
pub use metadata::PlaceMetadataService;
pub use recommendations::{
    RecommendationResponse, RecommendationService, RecommendedPlace, TopKPolicy,
};
