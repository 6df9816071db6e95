use super::{embedder::Embedder, RecommendError};

/// Cosine similarity in [-1, 1]. Zero when either vector has zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        tracing::warn!(
            a_len = a.len(),
            b_len = b.len(),
            "embedding dimension mismatch; returning zero similarity"
        );
        return 0.0;
    }

    // f64 keeps squared norms of any finite f32 row from overflowing
    let dot: f64 = a.iter().zip(b).map(|(&x, &y)| f64::from(x) * f64::from(y)).sum();
    let norm_a: f64 = a.iter().map(|&x| f64::from(x).powi(2)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|&x| f64::from(x).powi(2)).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    let cosine = dot / (norm_a * norm_b);
    if !cosine.is_finite() {
        return 0.0;
    }
    // float rounding can push identical vectors a hair past 1
    cosine.clamp(-1.0, 1.0) as f32
}

/// Scores the query text against every embedding row, in row order.
///
/// Absent or blank text gives a uniform zero vector without touching the
/// encoder, so tag-only queries rank purely on tags.
pub fn similarity_scores(
    embedder: &dyn Embedder,
    text: Option<&str>,
    embeddings: &[Vec<f32>],
) -> Result<Vec<f32>, RecommendError> {
    let text = match text.map(str::trim) {
        Some(t) if !t.is_empty() => t,
        _ => return Ok(vec![0.0; embeddings.len()]),
    };

    let query = embedder
        .embed(text)
        .map_err(|e| RecommendError::Embedding(e.to_string()))?;

    if query.len() != embedder.dimension() {
        return Err(RecommendError::Embedding(format!(
            "encoder '{}' returned {} components, expected {}",
            embedder.name(),
            query.len(),
            embedder.dimension()
        )));
    }

    Ok(embeddings
        .iter()
        .map(|row| cosine_similarity(&query, row))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recommender::embedder::{HashEmbedder, MockEmbedder};

    #[test]
    fn test_identical_vectors_score_one() {
        let sim = cosine_similarity(&[0.3, 0.4, 0.0], &[0.3, 0.4, 0.0]);
        assert!((sim - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_opposite_vectors_score_minus_one() {
        let sim = cosine_similarity(&[1.0, 2.0], &[-1.0, -2.0]);
        assert!((sim + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_large_magnitude_rows_keep_true_cosine() {
        let big = [3e19_f32, 4e19];
        let sim = cosine_similarity(&big, &big);
        assert!((sim - 1.0).abs() < 1e-6, "got {sim}");

        let sim = cosine_similarity(&[0.6, 0.8], &big);
        assert!((sim - 1.0).abs() < 1e-6, "got {sim}");

        let extreme = [f32::MAX, f32::MAX];
        let sim = cosine_similarity(&extreme, &[1.0, 0.0]);
        assert!(sim.is_finite());
        assert!((sim - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-6);
    }

    #[test]
    fn test_zero_vector_scores_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_dimension_mismatch_scores_zero() {
        assert_eq!(cosine_similarity(&[1.0, 0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_blank_text_never_calls_encoder() {
        let mut embedder = MockEmbedder::new();
        embedder.expect_embed().times(0);

        let rows = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        assert_eq!(similarity_scores(&embedder, None, &rows).unwrap(), vec![0.0, 0.0]);
        assert_eq!(
            similarity_scores(&embedder, Some("  "), &rows).unwrap(),
            vec![0.0, 0.0]
        );
    }

    #[test]
    fn test_scores_follow_row_order() {
        let mut embedder = MockEmbedder::new();
        embedder.expect_dimension().return_const(2usize);
        embedder.expect_embed().returning(|_| Ok(vec![1.0, 0.0]));

        let rows = vec![vec![0.0, 1.0], vec![1.0, 0.0], vec![-1.0, 0.0]];
        let scores = similarity_scores(&embedder, Some("beach"), &rows).unwrap();
        assert_eq!(scores, vec![0.0, 1.0, -1.0]);
    }

    #[test]
    fn test_wrong_length_from_encoder_is_an_error() {
        let mut embedder = MockEmbedder::new();
        embedder.expect_dimension().return_const(3usize);
        embedder.expect_name().return_const("mock");
        embedder.expect_embed().returning(|_| Ok(vec![1.0]));

        let err = similarity_scores(&embedder, Some("lake"), &[vec![1.0, 0.0, 0.0]]).unwrap_err();
        assert!(matches!(err, RecommendError::Embedding(_)));
    }

    #[test]
    fn test_unicode_and_emoji_text_stays_in_range() {
        let embedder = HashEmbedder::new(32);
        let rows = vec![
            embedder.embed("강릉 바다").unwrap(),
            embedder.embed("snow mountain").unwrap(),
        ];
        for text in ["강릉 바다 🌊!!", "¿¡—…🙂", "#$%^&*"] {
            let scores = similarity_scores(&embedder, Some(text), &rows).unwrap();
            assert_eq!(scores.len(), 2);
            assert!(scores.iter().all(|s| (-1.0..=1.0).contains(s)));
        }
    }
}
