use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use travel_reco_api::{
    api::{create_router, AppState},
    auth::AuthConfig,
    config::Config,
    db::{create_pool, create_redis_client, Cache, CacheWriterHandle, PgStore},
    recommender::{
        create_embedder, load_or_embed_corpus, Corpus, EmbedderKind, Recommender, RecommenderHandle,
    },
    services::TopKPolicy,
};

/// Loads corpus and encoder from the configured files.
///
/// The hash encoder is cheap, so a missing embeddings file is computed from
/// the place table instead of failing.
fn build_recommender(config: &Config) -> anyhow::Result<Recommender> {
    let context = || {
        format!(
            "loading corpus from {} and {}",
            config.places_csv.display(),
            config.embeddings_csv.display()
        )
    };
    let embedder = create_embedder(config.embedder, config.embedding_dim)?;
    let corpus = match config.embedder {
        EmbedderKind::Hash => {
            load_or_embed_corpus(&config.places_csv, &config.embeddings_csv, embedder.as_ref())
                .with_context(context)?
        }
        EmbedderKind::Fastembed => {
            Corpus::load(&config.places_csv, &config.embeddings_csv).with_context(context)?
        }
    };
    Ok(Recommender::new(corpus, embedder, config.scoring_options()?)?)
}

/// Gives every corpus place a `place_metadata` row so the response join
/// keeps it
async fn sync_place_names(store: &PgStore, handle: &RecommenderHandle) {
    let Ok(recommender) = handle.current() else {
        return;
    };
    match store.sync_place_names(recommender.corpus().places()).await {
        Ok(inserted) => tracing::info!(inserted, "Place metadata synced with corpus"),
        Err(e) => tracing::error!(error = %e, "Failed to sync place metadata"),
    }
}

fn log_loaded(recommender: &Recommender) {
    tracing::info!(
        total_places = recommender.corpus().len(),
        dimension = recommender.corpus().dimension(),
        embedder = recommender.embedder_name(),
        "Recommender loaded"
    );
}

/// Failures leave the service up without a model
fn load_recommender(config: &Config) -> RecommenderHandle {
    match build_recommender(config) {
        Ok(recommender) => {
            log_loaded(&recommender);
            RecommenderHandle::new(recommender)
        }
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "Recommender unavailable; /recommend will return 503");
            RecommenderHandle::empty()
        }
    }
}

/// Rebuilds the recommender on SIGHUP and swaps it in; a failed rebuild
/// keeps the current one
#[cfg(unix)]
fn spawn_reload_on_sighup(
    config: Config,
    handle: RecommenderHandle,
    store: Option<Arc<PgStore>>,
) -> anyhow::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangups = signal(SignalKind::hangup())?;
    tokio::spawn(async move {
        while hangups.recv().await.is_some() {
            tracing::info!("SIGHUP received; reloading corpus");
            let config = config.clone();
            match tokio::task::spawn_blocking(move || build_recommender(&config)).await {
                Ok(Ok(recommender)) => {
                    log_loaded(&recommender);
                    handle.install(recommender);
                    if let Some(store) = &store {
                        sync_place_names(store, &handle).await;
                    }
                }
                Ok(Err(e)) => {
                    tracing::error!(error = %format!("{e:#}"), "Reload failed; keeping current recommender")
                }
                Err(e) => tracing::error!(error = %e, "Reload task panicked"),
            }
        }
    });
    Ok(())
}

/// Metadata cache in front of PostgreSQL, when `REDIS_URL` is set
fn connect_cache(config: &Config) -> Option<(Cache, CacheWriterHandle)> {
    let url = config.redis_url.as_deref()?;
    match create_redis_client(url) {
        Ok(client) => {
            tracing::info!("Place metadata cache enabled");
            Some(Cache::new(client))
        }
        Err(e) => {
            tracing::warn!(error = %e, "Invalid REDIS_URL; running without cache");
            None
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;
    let auth = AuthConfig::new(config.jwt_secret.clone(), config.jwt_ttl_hours);
    let top_k = TopKPolicy {
        default: config.default_top_k,
        max: config.max_top_k,
    };

    // corpus loading and model init block
    let recommender = {
        let config = config.clone();
        tokio::task::spawn_blocking(move || load_recommender(&config)).await?
    };
    let store = match config.database_url.as_deref() {
        Some(url) => {
            let pool = create_pool(url).await.context("connecting to PostgreSQL")?;
            tracing::info!("Connected to PostgreSQL");
            let store = Arc::new(PgStore::new(pool));
            sync_place_names(&store, &recommender).await;
            Some(store)
        }
        None => None,
    };

    #[cfg(unix)]
    spawn_reload_on_sighup(config.clone(), recommender.clone(), store.clone())?;

    let mut cache_writer = None;
    let state = match store {
        Some(store) => {
            let cache = connect_cache(&config).map(|(cache, writer)| {
                cache_writer = Some(writer);
                cache
            });
            AppState::new(recommender, store.clone(), store, cache, auth, top_k)
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory storage, data is lost on restart");
            AppState::in_memory(recommender, auth, top_k)
        }
    };

    let app = create_router(state);

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("binding {address}"))?;
    tracing::info!(address = %address, "Server running");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(writer) = cache_writer {
        writer.shutdown().await;
    }
    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
