use std::{path::PathBuf, sync::Arc};

use tokio::sync::RwLock;

use crate::{
    config::Config,
    error::{AppError, AppResult},
    services::{Engine, EngineStats, PosterResolver},
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub inner: Arc<RwLock<AppStateInner>>,
    pub posters: Arc<PosterResolver>,
    pub config: Arc<Config>,
}

/// The currently served dataset, or why there is none
pub struct AppStateInner {
    pub engine: Option<Arc<Engine>>,
    pub load_error: Option<String>,
}

impl AppState {
    /// Creates state around an already built engine
    pub fn new(config: Config, engine: Engine, posters: PosterResolver) -> Self {
        Self::with_inner(
            config,
            posters,
            AppStateInner {
                engine: Some(Arc::new(engine)),
                load_error: None,
            },
        )
    }

    /// Creates state with no dataset; data endpoints report `reason` until a reload succeeds
    pub fn without_data(config: Config, posters: PosterResolver, reason: String) -> Self {
        Self::with_inner(
            config,
            posters,
            AppStateInner {
                engine: None,
                load_error: Some(reason),
            },
        )
    }

    fn with_inner(config: Config, posters: PosterResolver, inner: AppStateInner) -> Self {
        Self {
            inner: Arc::new(RwLock::new(inner)),
            posters: Arc::new(posters),
            config: Arc::new(config),
        }
    }

    /// Loads the dataset named in `config`, keeping the failure instead of aborting
    pub async fn load(config: Config, posters: PosterResolver) -> Self {
        match load_engine(&config).await {
            Ok(engine) => Self::new(config, engine, posters),
            Err(e) => {
                tracing::error!(error = %e, "Dataset unavailable; serving without recommendations");
                Self::without_data(config, posters, e.to_string())
            }
        }
    }

    /// The engine currently being served
    pub async fn engine(&self) -> AppResult<Arc<Engine>> {
        let inner = self.inner.read().await;
        match (&inner.engine, &inner.load_error) {
            (Some(engine), _) => Ok(engine.clone()),
            (None, Some(reason)) => Err(AppError::MissingData(reason.clone())),
            (None, None) => Err(AppError::MissingData("no dataset loaded".to_string())),
        }
    }

    /// Re-reads the CSV files and swaps the engine in
    ///
    /// Requests already holding the previous engine finish against it. On
    /// failure the previous engine keeps serving.
    pub async fn reload(&self) -> AppResult<EngineStats> {
        let engine = load_engine(&self.config).await?;
        let stats = engine.stats();

        let mut inner = self.inner.write().await;
        inner.engine = Some(Arc::new(engine));
        inner.load_error = None;

        tracing::info!(dataset_id = %stats.dataset_id, "Dataset reloaded");
        Ok(stats)
    }
}

async fn load_engine(config: &Config) -> AppResult<Engine> {
    let movies_path = PathBuf::from(&config.movies_path);
    let ratings_path = PathBuf::from(&config.ratings_path);
    let unrated = config.unrated_policy();

    tokio::task::spawn_blocking(move || Engine::load(&movies_path, &ratings_path, unrated))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
}
