use std::collections::HashSet;

use crate::models::{Place, Query};

/// Contribution of each categorical dimension to the raw tag score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TagWeights {
    pub season: f32,
    pub nature: f32,
    pub vibe: f32,
    pub target: f32,
}

pub const TAG_WEIGHTS: TagWeights = TagWeights {
    season: 0.3,
    nature: 0.25,
    vibe: 0.25,
    target: 0.2,
};

impl TagWeights {
    pub fn sum(&self) -> f32 {
        self.season + self.nature + self.vibe + self.target
    }
}

/// |A ∩ B| / |A ∪ B| over de-duplicated tag lists. Zero when both are empty.
pub fn jaccard(a: &[String], b: &[String]) -> f32 {
    let a: HashSet<&str> = a.iter().map(String::as_str).collect();
    let b: HashSet<&str> = b.iter().map(String::as_str).collect();
    let union = a.union(&b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(&b).count() as f32 / union as f32
}

/// Share of the query's tags found in the place's tags
pub fn coverage(query: &[String], place: &[String]) -> f32 {
    let query: HashSet<&str> = query.iter().map(String::as_str).collect();
    if query.is_empty() {
        return 0.0;
    }
    let place: HashSet<&str> = place.iter().map(String::as_str).collect();
    query.intersection(&place).count() as f32 / query.len() as f32
}

/// Raw, unnormalized tag score of one place
pub fn raw_tag_score(query: &Query, place: &Place, weights: &TagWeights) -> f32 {
    let mut score = 0.0;

    if query.season.is_some() && query.season == place.season {
        score += weights.season;
    }
    if !query.nature.is_empty() {
        score += weights.nature * jaccard(&query.nature, &place.nature_tags);
    }
    if !query.vibe.is_empty() {
        score += weights.vibe * jaccard(&query.vibe, &place.vibe_tags);
    }
    if !query.target.is_empty() {
        score += weights.target * coverage(&query.target, &place.target_tags);
    }

    score
}

/// Tag scores for every place, in corpus order, scaled into [0, 1].
///
/// Scores are divided by the best raw score of this request, so the top
/// match always gets 1.0 whenever anything matched at all. This keeps them
/// on a scale comparable to cosine similarity; it also means a tag score is
/// only meaningful relative to the other places in the same response.
pub fn tag_scores(query: &Query, places: &[Place], weights: &TagWeights) -> Vec<f32> {
    if query.has_no_categories() {
        return vec![0.0; places.len()];
    }

    let mut scores: Vec<f32> = places
        .iter()
        .map(|place| raw_tag_score(query, place, weights))
        .collect();

    let max = scores.iter().copied().fold(0.0f32, f32::max);
    if max > 0.0 {
        for score in &mut scores {
            *score /= max;
        }
    }

    scores
}
