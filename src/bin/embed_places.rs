//! Computes the place embedding matrix for `PLACES_CSV` and writes it to
//! `EMBEDDINGS_CSV`, using the same encoder the server is configured with.

use anyhow::Context;
use serde::Deserialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use travel_reco_api::recommender::{
    create_embedder, embed_places, load_places, write_embeddings, Embedder, EmbedderKind,
};

#[derive(Debug, Deserialize)]
struct EmbedConfig {
    #[serde(default = "default_places_csv")]
    places_csv: PathBuf,
    #[serde(default = "default_embeddings_csv")]
    embeddings_csv: PathBuf,
    #[serde(default = "default_embedder")]
    embedder: EmbedderKind,
    #[serde(default = "default_embedding_dim")]
    embedding_dim: usize,
}

fn default_places_csv() -> PathBuf {
    PathBuf::from("data/places.csv")
}

fn default_embeddings_csv() -> PathBuf {
    PathBuf::from("data/place_embeddings.csv")
}

fn default_embedder() -> EmbedderKind {
    EmbedderKind::Hash
}

fn default_embedding_dim() -> usize {
    384
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    dotenvy::dotenv().ok();
    let config = envy::from_env::<EmbedConfig>().context("reading configuration")?;

    let places = load_places(&config.places_csv)
        .with_context(|| format!("reading {}", config.places_csv.display()))?;
    let embedder = create_embedder(config.embedder, config.embedding_dim)?;
    tracing::info!(places = places.len(), embedder = embedder.name(), "Embedding places");

    let rows = embed_places(&places, embedder.as_ref())?;

    let file = File::create(&config.embeddings_csv)
        .with_context(|| format!("creating {}", config.embeddings_csv.display()))?;
    write_embeddings(BufWriter::new(file), &rows)?;

    tracing::info!(
        rows = rows.len(),
        dimension = embedder.dimension(),
        path = %config.embeddings_csv.display(),
        "Embeddings written"
    );
    Ok(())
}
