//! Hybrid place recommender.
//!
//! A [`Recommender`] owns one [`Corpus`] and the encoder that matches its
//! embeddings. Scoring is read-only, so a recommender is shared behind an
//! `Arc` and queried concurrently without locks. [`RecommenderHandle`] is the
//! swap point for replacing corpus and embeddings together.

pub mod corpus;
pub mod embedder;
pub mod normalize;
pub mod ranker;
pub mod similarity;
pub mod tags;

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::sync::{Arc, RwLock};

use crate::models::{Place, Query, RecommendationSet};

pub use corpus::{load_places, write_embeddings, Corpus, CorpusError};
pub use embedder::{create_embedder, EmbedError, Embedder, EmbedderKind, HashEmbedder};
pub use normalize::{normalize_tag, normalize_tags, resolve_query, QueryInput, QueryPayload};
pub use ranker::{HybridWeights, InvalidWeights};
pub use tags::{TagWeights, TAG_WEIGHTS};

/// Failures of a single recommendation request
#[derive(Debug, thiserror::Error)]
pub enum RecommendError {
    #[error("recommender is not initialized: no place corpus loaded")]
    NotInitialized,

    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("query embedding failed: {0}")]
    Embedding(String),
}

/// Errors raised while pairing a corpus with an encoder
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Corpus(#[from] CorpusError),

    #[error(transparent)]
    Embedder(#[from] EmbedError),

    #[error("corpus embeddings have {corpus} components but encoder '{encoder}' produces {embedder}")]
    DimensionMismatch {
        corpus: usize,
        embedder: usize,
        encoder: &'static str,
    },
}

/// Embeds every place, one row per place in input order
pub fn embed_places(places: &[Place], embedder: &dyn Embedder) -> Result<Vec<Vec<f32>>, EmbedError> {
    places
        .iter()
        .map(|place| embedder.embed(&place.embedding_text()))
        .collect()
}

/// Loads the corpus, embedding the places with `embedder` when
/// `embeddings_path` does not exist.
///
/// A computed matrix is written to `embeddings_path` for the next start; a
/// failed write is logged and the in-memory matrix is used regardless.
pub fn load_or_embed_corpus(
    places_path: &Path,
    embeddings_path: &Path,
    embedder: &dyn Embedder,
) -> Result<Corpus, BuildError> {
    if embeddings_path.exists() {
        return Ok(Corpus::load(places_path, embeddings_path)?);
    }

    let places = load_places(places_path)?;
    tracing::info!(
        places = places.len(),
        embedder = embedder.name(),
        path = %embeddings_path.display(),
        "Embeddings file missing; embedding places"
    );
    let embeddings = embed_places(&places, embedder)?;

    let written = File::create(embeddings_path)
        .map_err(|e| CorpusError::Csv(e.into()))
        .and_then(|file| write_embeddings(BufWriter::new(file), &embeddings));
    if let Err(e) = written {
        tracing::warn!(error = %e, path = %embeddings_path.display(), "Could not save computed embeddings");
    }

    Ok(Corpus::new(places, embeddings)?)
}

/// Scoring knobs fixed at construction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringOptions {
    pub weights: HybridWeights,
    pub tag_weights: TagWeights,
    /// Embed a phrase built from the tags when the query has no free text
    pub synthesize_text: bool,
}

impl Default for ScoringOptions {
    fn default() -> Self {
        Self {
            weights: HybridWeights::REFERENCE,
            tag_weights: TAG_WEIGHTS,
            synthesize_text: true,
        }
    }
}

pub struct Recommender {
    corpus: Corpus,
    embedder: Arc<dyn Embedder>,
    options: ScoringOptions,
}

impl std::fmt::Debug for Recommender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Recommender")
            .field("places", &self.corpus.len())
            .field("dimension", &self.corpus.dimension())
            .field("embedder", &self.embedder.name())
            .field("options", &self.options)
            .finish()
    }
}

impl Recommender {
    /// Pairs a corpus with its encoder; their dimensions must agree
    pub fn new(
        corpus: Corpus,
        embedder: Arc<dyn Embedder>,
        options: ScoringOptions,
    ) -> Result<Self, BuildError> {
        if corpus.dimension() != embedder.dimension() {
            return Err(BuildError::DimensionMismatch {
                corpus: corpus.dimension(),
                embedder: embedder.dimension(),
                encoder: embedder.name(),
            });
        }

        Ok(Self {
            corpus,
            embedder,
            options,
        })
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn embedder_name(&self) -> &'static str {
        self.embedder.name()
    }

    pub fn options(&self) -> &ScoringOptions {
        &self.options
    }

    /// Scores every place against the query and returns the best `top_k`.
    ///
    /// Runs the encoder synchronously; call it from a blocking context.
    pub fn recommend(&self, query: &Query, top_k: usize) -> Result<RecommendationSet, RecommendError> {
        if top_k == 0 {
            return Err(RecommendError::InvalidQuery(
                "top_k must be at least 1".to_string(),
            ));
        }

        let text = query.embedding_text(self.options.synthesize_text);
        let similarity = similarity::similarity_scores(
            self.embedder.as_ref(),
            text.as_deref(),
            self.corpus.embeddings(),
        )?;
        let tag = tags::tag_scores(query, self.corpus.places(), &self.options.tag_weights);
        let recommendations = ranker::rank(
            self.corpus.places(),
            &similarity,
            &tag,
            &self.options.weights,
            top_k,
        );

        tracing::debug!(
            top_k,
            returned = recommendations.len(),
            semantic = text.is_some(),
            "Scored place corpus"
        );

        Ok(RecommendationSet {
            recommendations,
            total_places: self.corpus.len(),
        })
    }
}

/// Shared slot holding the active recommender, if one is loaded.
///
/// Requests clone the inner `Arc` and score without holding the lock, so an
/// [`install`](RecommenderHandle::install) never waits on scoring and never
/// exposes a corpus paired with the wrong embeddings.
#[derive(Clone, Default)]
pub struct RecommenderHandle {
    slot: Arc<RwLock<Option<Arc<Recommender>>>>,
}

impl RecommenderHandle {
    pub fn new(recommender: Recommender) -> Self {
        let handle = Self::default();
        handle.install(recommender);
        handle
    }

    /// A handle with nothing loaded; every request fails with `NotInitialized`
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns the active recommender or `NotInitialized`
    pub fn current(&self) -> Result<Arc<Recommender>, RecommendError> {
        let guard = self.slot.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.clone().ok_or(RecommendError::NotInitialized)
    }

    /// Atomically replaces the active recommender, returning the previous one
    pub fn install(&self, recommender: Recommender) -> Option<Arc<Recommender>> {
        let mut guard = self.slot.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.replace(Arc::new(recommender))
    }

    pub fn is_loaded(&self) -> bool {
        self.current().is_ok()
    }

    /// Corpus size of the active recommender, zero when none is loaded
    pub fn total_places(&self) -> usize {
        self.current().map(|r| r.corpus().len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Place, Season};
    use super::embedder::MockEmbedder;

    fn place(id: i64, season: Option<Season>, nature: &[&str]) -> Place {
        Place {
            id,
            name: format!("place-{id}"),
            description: String::new(),
            season,
            nature_tags: nature.iter().map(|t| t.to_string()).collect(),
            vibe_tags: Vec::new(),
            target_tags: Vec::new(),
        }
    }

    /// Corpus A/B/C with an encoder that always returns the zero vector
    fn stub_recommender(weights: HybridWeights) -> Recommender {
        let corpus = Corpus::new(
            vec![
                place(1, Some(Season::Summer), &["beach"]),
                place(2, Some(Season::Winter), &["mountain"]),
                place(3, Some(Season::Summer), &["beach", "forest"]),
            ],
            vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![0.7, 0.7]],
        )
        .unwrap();

        let mut embedder = MockEmbedder::new();
        embedder.expect_dimension().return_const(2usize);
        embedder.expect_name().return_const("stub");
        embedder.expect_embed().returning(|_| Ok(vec![0.0, 0.0]));

        let options = ScoringOptions {
            weights,
            ..ScoringOptions::default()
        };
        Recommender::new(corpus, Arc::new(embedder), options).unwrap()
    }

    fn summer_beach() -> Query {
        Query {
            season: Some(Season::Summer),
            nature: vec!["beach".to_string()],
            ..Query::default()
        }
    }

    #[test]
    fn test_tag_only_weights_rank_worked_example() {
        let rec = stub_recommender(HybridWeights::new(0.0, 1.0).unwrap());
        let result = rec.recommend(&summer_beach(), 3).unwrap();

        let ids: Vec<i64> = result.recommendations.iter().map(|r| r.place_id).collect();
        assert_eq!(ids, vec![1, 3, 2]);
        assert_eq!(result.total_places, 3);

        let a = &result.recommendations[0];
        assert!((a.tag_score - 1.0).abs() < 1e-6);
        let c = &result.recommendations[1];
        assert!((c.tag_score - 0.7727).abs() < 1e-3);
        assert_eq!(result.recommendations[2].tag_score, 0.0);
        assert!(result.recommendations.iter().all(|r| r.similarity_score == 0.0));
    }

    #[test]
    fn test_empty_query_gives_uniform_zero_baseline() {
        let rec = stub_recommender(HybridWeights::REFERENCE);
        let result = rec.recommend(&Query::default(), 10).unwrap();

        assert_eq!(result.recommendations.len(), 3);
        for r in &result.recommendations {
            assert_eq!(r.similarity_score, 0.0);
            assert_eq!(r.tag_score, 0.0);
            assert_eq!(r.hybrid_score, 0.0);
        }
        let ids: Vec<i64> = result.recommendations.iter().map(|r| r.place_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_identical_requests_give_identical_results() {
        let rec = Recommender::new(
            Corpus::new(
                vec![place(1, None, &["lake"]), place(2, None, &["sea"])],
                vec![
                    HashEmbedder::new(16).embed("calm lake").unwrap(),
                    HashEmbedder::new(16).embed("stormy sea").unwrap(),
                ],
            )
            .unwrap(),
            Arc::new(HashEmbedder::new(16)),
            ScoringOptions::default(),
        )
        .unwrap();

        let query = Query::text("lake at dawn");
        let first = rec.recommend(&query, 2).unwrap();
        let second = rec.recommend(&query, 2).unwrap();
        assert_eq!(
            serde_json::to_vec(&first).unwrap(),
            serde_json::to_vec(&second).unwrap()
        );
    }

    #[test]
    fn test_flat_tags_match_explicit_categories() {
        let rec = stub_recommender(HybridWeights::REFERENCE);
        let flat: QueryPayload =
            serde_json::from_value(serde_json::json!({ "tags": ["beach", "forest"] })).unwrap();
        let explicit: QueryPayload = serde_json::from_value(serde_json::json!({
            "nature": ["beach", "forest"],
            "vibe": ["beach", "forest"],
            "target": ["beach", "forest"]
        }))
        .unwrap();

        let flat = rec.recommend(&resolve_query(&flat).unwrap(), 3).unwrap();
        let explicit = rec.recommend(&resolve_query(&explicit).unwrap(), 3).unwrap();
        assert_eq!(flat, explicit);
    }

    #[test]
    fn test_zero_top_k_is_invalid() {
        let rec = stub_recommender(HybridWeights::REFERENCE);
        let err = rec.recommend(&summer_beach(), 0).unwrap_err();
        assert!(matches!(err, RecommendError::InvalidQuery(_)));
    }

    #[test]
    fn test_dimension_mismatch_fails_construction() {
        let corpus = Corpus::new(vec![place(1, None, &[])], vec![vec![1.0, 0.0]]).unwrap();
        let err = Recommender::new(corpus, Arc::new(HashEmbedder::new(8)), ScoringOptions::default())
            .unwrap_err();
        assert!(matches!(
            err,
            BuildError::DimensionMismatch {
                corpus: 2,
                embedder: 8,
                ..
            }
        ));
    }

    #[test]
    fn test_empty_handle_is_not_initialized() {
        let handle = RecommenderHandle::empty();
        assert!(matches!(handle.current(), Err(RecommendError::NotInitialized)));
        assert!(!handle.is_loaded());
        assert_eq!(handle.total_places(), 0);
    }

    #[test]
    fn test_install_swaps_whole_recommender() {
        let handle = RecommenderHandle::new(stub_recommender(HybridWeights::REFERENCE));
        let before = handle.current().unwrap();

        let single = Recommender::new(
            Corpus::new(vec![place(9, None, &[])], vec![vec![1.0]]).unwrap(),
            Arc::new(HashEmbedder::new(1)),
            ScoringOptions::default(),
        )
        .unwrap();
        let previous = handle.install(single).unwrap();

        assert!(Arc::ptr_eq(&before, &previous));
        // readers holding the old Arc keep a consistent corpus
        assert_eq!(before.corpus().len(), 3);
        assert_eq!(handle.total_places(), 1);
    }

    const PLACES_CSV: &str = "\
travel_id,name,description,season,nature_tags,vibe_tags,target_tags
1,Gyeongpo Beach,sandy beach,summer,beach|sea,,family
2,Seoraksan,granite peaks,autumn,mountain,,couple
";

    #[test]
    fn test_missing_embeddings_are_computed_and_saved() {
        let dir = tempfile::tempdir().unwrap();
        let places_path = dir.path().join("places.csv");
        let embeddings_path = dir.path().join("place_embeddings.csv");
        std::fs::write(&places_path, PLACES_CSV).unwrap();
        let embedder = HashEmbedder::new(16);

        let corpus = load_or_embed_corpus(&places_path, &embeddings_path, &embedder).unwrap();
        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.dimension(), 16);
        assert_eq!(
            corpus.embeddings()[1],
            embedder.embed(&corpus.places()[1].embedding_text()).unwrap()
        );

        // the next start reads the saved matrix instead of re-embedding
        assert!(embeddings_path.exists());
        let reloaded = load_or_embed_corpus(&places_path, &embeddings_path, &embedder).unwrap();
        assert_eq!(reloaded.embeddings(), corpus.embeddings());
    }

    #[test]
    fn test_unwritable_embeddings_path_still_loads() {
        let dir = tempfile::tempdir().unwrap();
        let places_path = dir.path().join("places.csv");
        std::fs::write(&places_path, PLACES_CSV).unwrap();
        let embeddings_path = dir.path().join("no-such-dir").join("place_embeddings.csv");

        let corpus =
            load_or_embed_corpus(&places_path, &embeddings_path, &HashEmbedder::new(8)).unwrap();
        assert_eq!(corpus.len(), 2);
        assert!(!embeddings_path.exists());
    }
}
