//! Text encoders used by the similarity scorer.
//!
//! The encoder must match the one that produced the precomputed place
//! embeddings, otherwise cosine similarity is meaningless.

use serde::Deserialize;
use siphasher::sip::SipHasher13;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Errors raised while building or running an encoder
#[derive(Debug, thiserror::Error)]
pub enum EmbedError {
    #[error("embedding model error: {0}")]
    Model(String),

    #[error("embedder '{0}' is not available in this build")]
    Unavailable(String),
}

/// Encodes text into a fixed-length vector.
///
/// Implementations must be deterministic: identical text yields an identical
/// vector for the lifetime of the process.
#[cfg_attr(test, mockall::automock)]
pub trait Embedder: Send + Sync {
    /// Short name for logs and health output
    fn name(&self) -> &'static str;

    fn dimension(&self) -> usize;

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError>;
}

/// Which encoder to build at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedderKind {
    Hash,
    Fastembed,
}

/// Builds the configured encoder
pub fn create_embedder(kind: EmbedderKind, dimension: usize) -> Result<Arc<dyn Embedder>, EmbedError> {
    match kind {
        EmbedderKind::Hash => Ok(Arc::new(HashEmbedder::new(dimension))),
        #[cfg(feature = "fastembed")]
        EmbedderKind::Fastembed => Ok(Arc::new(fast::FastEmbedder::new()?)),
        #[cfg(not(feature = "fastembed"))]
        EmbedderKind::Fastembed => Err(EmbedError::Unavailable("fastembed".to_string())),
    }
}

// Changing either key changes every vector; regenerate the place embeddings.
const HASH_SEED_K0: u64 = 0x5eed_7a11_0c0f_fee5;
const HASH_SEED_K1: u64 = 0x9a7e_c0de_b1a5_ed01;

/// Weight of whole-word features relative to character trigrams
const WORD_WEIGHT: f32 = 1.0;
const TRIGRAM_WEIGHT: f32 = 0.5;

/// Feature-hashing encoder.
///
/// Needs no model files and runs offline. Words and character trigrams are
/// hashed with SipHash13 under fixed keys, signed, summed and L2-normalized.
/// Works on any Unicode text; input without letters or digits maps to the
/// zero vector.
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    fn hash(&self, feature: &str, salt: u8) -> u64 {
        let mut hasher = SipHasher13::new_with_keys(HASH_SEED_K0, HASH_SEED_K1);
        salt.hash(&mut hasher);
        feature.hash(&mut hasher);
        hasher.finish()
    }

    fn add_feature(&self, vector: &mut [f32], feature: &str, weight: f32) {
        let idx = (self.hash(feature, 0) % self.dimension as u64) as usize;
        let sign = if self.hash(feature, 1) % 2 == 0 { 1.0 } else { -1.0 };
        vector[idx] += sign * weight;
    }
}

impl Embedder for HashEmbedder {
    fn name(&self) -> &'static str {
        "hash"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let mut vector = vec![0.0f32; self.dimension];
        let lowered = text.to_lowercase();

        for word in lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            self.add_feature(&mut vector, word, WORD_WEIGHT);

            let chars: Vec<char> = word.chars().collect();
            if chars.len() > 3 {
                for window in chars.windows(3) {
                    let trigram: String = window.iter().collect();
                    self.add_feature(&mut vector, &format!("#{trigram}"), TRIGRAM_WEIGHT);
                }
            }
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }

        Ok(vector)
    }
}

#[cfg(feature = "fastembed")]
mod fast {
    use std::sync::Mutex;

    use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

    use super::{EmbedError, Embedder};

    /// Dimension of paraphrase-multilingual-MiniLM-L12-v2
    const MINILM_DIMENSION: usize = 384;

    /// Sentence-transformer encoder, the model the place embeddings were built with
    pub struct FastEmbedder {
        model: Mutex<TextEmbedding>,
    }

    impl FastEmbedder {
        pub fn new() -> Result<Self, EmbedError> {
            let options = InitOptions::new(EmbeddingModel::ParaphraseMLMiniLML12V2)
                .with_show_download_progress(true);
            let model =
                TextEmbedding::try_new(options).map_err(|e| EmbedError::Model(e.to_string()))?;
            Ok(Self {
                model: Mutex::new(model),
            })
        }
    }

    impl Embedder for FastEmbedder {
        fn name(&self) -> &'static str {
            "fastembed"
        }

        fn dimension(&self) -> usize {
            MINILM_DIMENSION
        }

        fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
            let mut model = self
                .model
                .lock()
                .map_err(|_| EmbedError::Model("embedding model lock poisoned".to_string()))?;
            let embeddings = model
                .embed(vec![text], None)
                .map_err(|e| EmbedError::Model(e.to_string()))?;
            embeddings
                .into_iter()
                .next()
                .ok_or_else(|| EmbedError::Model("model returned no embedding".to_string()))
        }
    }
}
