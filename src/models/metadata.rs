use serde::{Deserialize, Serialize};

/// Display fields for a place, kept apart from the scoring corpus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PlaceMetadata {
    pub place_id: i64,
    pub name: String,
    pub address: Option<String>,
    pub image_url: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}
