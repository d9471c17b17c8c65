/// Poster lookup for result cards
///
/// Each `PosterSource` knows one way of turning a movie into an image locator
/// (a cached file, a remote search). The `PosterResolver` chains them and
/// falls back to a placeholder image, so callers always get something to
/// render. The recommendation core never touches this module.
use std::sync::Arc;

use reqwest::Url;

use crate::{config::Config, error::AppResult, models::MovieId};

pub mod local;
pub mod tmdb;

pub use local::LocalPosterCache;
pub use tmdb::TmdbPosterSource;

/// A way of finding a poster for a movie
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait PosterSource: Send + Sync {
    /// Returns an image locator (path or URL) if this source has one
    async fn find(&self, movie_id: MovieId, title: &str) -> AppResult<Option<String>>;

    /// Source name for logging
    fn name(&self) -> &'static str;
}

/// Tries each source in order, then falls back to a placeholder
pub struct PosterResolver {
    sources: Vec<Arc<dyn PosterSource>>,
    placeholder_url: String,
}

impl PosterResolver {
    pub fn new(sources: Vec<Arc<dyn PosterSource>>, placeholder_url: impl Into<String>) -> Self {
        Self {
            sources,
            placeholder_url: placeholder_url.into(),
        }
    }

    /// Local cache first, then TMDB when an API key is configured
    pub fn from_config(config: &Config) -> AppResult<Self> {
        let cache = LocalPosterCache::new(&config.poster_dir);
        let mut sources: Vec<Arc<dyn PosterSource>> = vec![Arc::new(cache.clone())];

        match &config.tmdb_api_key {
            Some(key) if !key.trim().is_empty() => {
                sources.push(Arc::new(TmdbPosterSource::new(
                    key.clone(),
                    config.tmdb_api_url.clone(),
                    config.tmdb_image_url.clone(),
                    cache,
                )?));
            }
            _ => tracing::info!("TMDB_API_KEY not set; posters come from the local cache only"),
        }

        Ok(Self::new(sources, config.placeholder_poster_url.clone()))
    }

    pub fn source_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Resolver that only ever answers with the placeholder
    pub fn placeholder_only(placeholder_url: impl Into<String>) -> Self {
        Self::new(Vec::new(), placeholder_url)
    }

    /// Always yields a locator; source failures are logged and skipped
    pub async fn resolve(&self, movie_id: MovieId, title: &str) -> String {
        for source in &self.sources {
            match source.find(movie_id, title).await {
                Ok(Some(locator)) => return locator,
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(
                        movie_id = movie_id,
                        source = source.name(),
                        error = %e,
                        "Poster lookup failed"
                    );
                }
            }
        }

        self.placeholder(title)
    }

    /// Placeholder image labelled with the start of the title, form-encoded
    pub fn placeholder(&self, title: &str) -> String {
        let label: String = title.chars().take(10).collect();
        match Url::parse_with_params(&self.placeholder_url, &[("text", label.trim())]) {
            Ok(url) => url.into(),
            Err(e) => {
                tracing::warn!(
                    placeholder_url = %self.placeholder_url,
                    error = %e,
                    "Invalid placeholder URL"
                );
                self.placeholder_url.clone()
            }
        }
    }
}
