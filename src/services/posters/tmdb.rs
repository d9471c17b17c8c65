/// TMDB poster provider
///
/// Searches TMDB by cleaned title, takes the first hit's poster and stores it
/// in the local poster cache so later lookups never leave the machine.
///
/// API Flow:
/// 1. Search: /search/movie?query=<title> → `results[0].poster_path`
/// 2. Image: {image_url}{poster_path} → bytes written to `<dir>/<movieId>.jpg`
use std::time::Duration;

use reqwest::Client as HttpClient;
use serde::Deserialize;

use crate::{
    error::{AppError, AppResult},
    models::{clean_title, MovieId},
    services::posters::{LocalPosterCache, PosterSource},
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Response of GET /search/movie
#[derive(Debug, Deserialize)]
pub struct TmdbSearchResponse {
    #[serde(default)]
    pub results: Vec<TmdbMovie>,
}

#[derive(Debug, Deserialize)]
pub struct TmdbMovie {
    pub id: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
}

impl TmdbSearchResponse {
    /// Poster path of the first result, if it has one
    pub fn first_poster_path(&self) -> Option<&str> {
        self.results.first()?.poster_path.as_deref()
    }
}

#[derive(Clone)]
pub struct TmdbPosterSource {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    image_url: String,
    cache: LocalPosterCache,
}

impl TmdbPosterSource {
    pub fn new(
        api_key: String,
        api_url: String,
        image_url: String,
        cache: LocalPosterCache,
    ) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            http_client,
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            image_url: image_url.trim_end_matches('/').to_string(),
            cache,
        })
    }

    fn search_url(&self) -> String {
        format!("{}/search/movie", self.api_url)
    }

    fn image_url_for(&self, poster_path: &str) -> String {
        format!("{}/{}", self.image_url, poster_path.trim_start_matches('/'))
    }

    /// Looks the title up on TMDB; `None` when TMDB has no poster for it
    async fn search_poster_path(&self, title: &str) -> AppResult<Option<String>> {
        let query = clean_title(title);

        let response = self
            .http_client
            .get(self.search_url())
            .query(&[("api_key", self.api_key.as_str()), ("query", query)])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "TMDB API returned status {}: {}",
                status, body
            )));
        }

        let search: TmdbSearchResponse = response.json().await?;
        Ok(search.first_poster_path().map(str::to_string))
    }

    /// Downloads the poster into the cache and returns the cached path
    pub async fn download(&self, movie_id: MovieId, title: &str) -> AppResult<Option<String>> {
        let Some(poster_path) = self.search_poster_path(title).await? else {
            tracing::info!(movie_id = movie_id, title = %title, "No TMDB poster found");
            return Ok(None);
        };

        let response = self
            .http_client
            .get(self.image_url_for(&poster_path))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::ExternalApi(format!(
                "TMDB image request returned status {}",
                response.status()
            )));
        }

        let bytes = response.bytes().await?;
        tokio::fs::create_dir_all(self.cache.dir()).await?;
        let path = self.cache.path_for(movie_id);
        tokio::fs::write(&path, &bytes).await?;

        tracing::info!(
            movie_id = movie_id,
            title = %title,
            bytes = bytes.len(),
            provider = "tmdb",
            "Poster downloaded"
        );

        Ok(Some(path.to_string_lossy().into_owned()))
    }
}

#[async_trait::async_trait]
impl PosterSource for TmdbPosterSource {
    async fn find(&self, movie_id: MovieId, title: &str) -> AppResult<Option<String>> {
        if let Some(cached) = self.cache.lookup(movie_id).await? {
            return Ok(Some(cached));
        }
        self.download(movie_id, title).await
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_source(dir: &std::path::Path) -> TmdbPosterSource {
        TmdbPosterSource::new(
            "test_key".to_string(),
            "http://test.local/3/".to_string(),
            "http://images.test.local/t/p/w500".to_string(),
            LocalPosterCache::new(dir),
        )
        .unwrap()
    }

    #[test]
    fn test_urls_are_normalized() {
        let dir = tempfile::tempdir().unwrap();
        let source = create_test_source(dir.path());
        assert_eq!(source.search_url(), "http://test.local/3/search/movie");
        assert_eq!(
            source.image_url_for("/rhIRbceoE9lR4veEXuwCC2wARtG.jpg"),
            "http://images.test.local/t/p/w500/rhIRbceoE9lR4veEXuwCC2wARtG.jpg"
        );
    }

    #[test]
    fn test_search_response_deserialization() {
        let json = r#"{
            "page": 1,
            "results": [
                {"id": 862, "title": "Toy Story", "poster_path": "/uXDfjJbdP4ijW5hWSBrPrlKpxab.jpg"},
                {"id": 10193, "title": "Toy Story 3", "poster_path": null}
            ],
            "total_results": 2
        }"#;

        let response: TmdbSearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.results.len(), 2);
        assert_eq!(response.results[0].id, 862);
        assert_eq!(
            response.first_poster_path(),
            Some("/uXDfjJbdP4ijW5hWSBrPrlKpxab.jpg")
        );
    }

    #[test]
    fn test_first_result_without_poster() {
        let json = r#"{"results": [{"id": 1, "poster_path": null}]}"#;
        let response: TmdbSearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.first_poster_path(), None);
    }

    #[test]
    fn test_empty_search_response() {
        let response: TmdbSearchResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(response.first_poster_path(), None);
    }

    #[tokio::test]
    async fn test_cached_poster_skips_network() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("5.jpg"), b"jpeg").unwrap();
        let source = create_test_source(dir.path());

        // http://test.local is unreachable, so a hit proves the cache answered
        let found = source.find(5, "Father of the Bride Part II (1995)").await.unwrap();
        assert!(found.unwrap().ends_with("5.jpg"));
    }
}
