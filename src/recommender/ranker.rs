use std::cmp::Ordering;

use crate::models::{Place, Recommendation};

/// Blend weights for the hybrid score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HybridWeights {
    pub similarity: f32,
    pub tag: f32,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("hybrid weights must be finite and non-negative (similarity={similarity}, tag={tag})")]
pub struct InvalidWeights {
    pub similarity: f32,
    pub tag: f32,
}

impl HybridWeights {
    /// 0.6 similarity / 0.4 tag
    pub const REFERENCE: HybridWeights = HybridWeights {
        similarity: 0.6,
        tag: 0.4,
    };

    pub fn new(similarity: f32, tag: f32) -> Result<Self, InvalidWeights> {
        let valid = |w: f32| w.is_finite() && w >= 0.0;
        if valid(similarity) && valid(tag) {
            Ok(Self { similarity, tag })
        } else {
            Err(InvalidWeights { similarity, tag })
        }
    }

    pub fn blend(&self, similarity: f32, tag: f32) -> f32 {
        self.similarity * similarity + self.tag * tag
    }
}

impl Default for HybridWeights {
    fn default() -> Self {
        Self::REFERENCE
    }
}

/// Blends the parallel score arrays and returns the best `top_k` places.
///
/// Sorting is stable, so equal hybrid scores keep corpus row order. A `top_k`
/// larger than the corpus returns every place.
pub fn rank(
    places: &[Place],
    similarity: &[f32],
    tags: &[f32],
    weights: &HybridWeights,
    top_k: usize,
) -> Vec<Recommendation> {
    debug_assert_eq!(places.len(), similarity.len());
    debug_assert_eq!(places.len(), tags.len());

    let hybrid: Vec<f32> = similarity
        .iter()
        .zip(tags)
        .map(|(&sim, &tag)| weights.blend(sim, tag))
        .collect();

    let mut order: Vec<usize> = (0..hybrid.len()).collect();
    order.sort_by(|&a, &b| {
        hybrid[b]
            .partial_cmp(&hybrid[a])
            .unwrap_or(Ordering::Equal)
    });

    order
        .into_iter()
        .take(top_k)
        .map(|idx| Recommendation {
            place_id: places[idx].id,
            similarity_score: similarity[idx],
            tag_score: tags[idx],
            hybrid_score: hybrid[idx],
        })
        .collect()
}
