use serde::Deserialize;

use crate::models::{Aggregation, RecommendParams, UnratedPolicy};

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Path to the movie catalog CSV (movieId,title,genres)
    #[serde(default = "default_movies_path")]
    pub movies_path: String,

    /// Path to the ratings CSV (userId,movieId,rating[,timestamp])
    #[serde(default = "default_ratings_path")]
    pub ratings_path: String,

    /// Directory holding cached posters named `<movieId>.jpg`
    #[serde(default = "default_poster_dir")]
    pub poster_dir: String,

    /// TMDB API key; remote poster search is disabled without it
    #[serde(default)]
    pub tmdb_api_key: Option<String>,

    /// TMDB API base URL
    #[serde(default = "default_tmdb_api_url")]
    pub tmdb_api_url: String,

    /// Prefix prepended to TMDB poster paths
    #[serde(default = "default_tmdb_image_url")]
    pub tmdb_image_url: String,

    /// Image returned when no poster can be found
    #[serde(default = "default_placeholder_poster_url")]
    pub placeholder_poster_url: String,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_neighbor_count")]
    pub neighbor_count: usize,

    #[serde(default)]
    pub min_neighbor_rating: f64,

    #[serde(default = "default_result_limit")]
    pub result_limit: usize,

    #[serde(default)]
    pub aggregation: Aggregation,

    /// Mean rating given to movies without any rating
    #[serde(default = "default_unrated_default_rating")]
    pub unrated_default_rating: f64,

    /// Number of posters the prefetch tool tries to collect
    #[serde(default = "default_poster_target_count")]
    pub poster_target_count: usize,

    /// Pause between TMDB requests in the prefetch tool
    #[serde(default = "default_poster_request_delay_ms")]
    pub poster_request_delay_ms: u64,
}

fn default_movies_path() -> String {
    "movies.csv".to_string()
}

fn default_ratings_path() -> String {
    "ratings.csv".to_string()
}

fn default_poster_dir() -> String {
    "local_posters".to_string()
}

fn default_tmdb_api_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_tmdb_image_url() -> String {
    "https://image.tmdb.org/t/p/w500".to_string()
}

fn default_placeholder_poster_url() -> String {
    "https://via.placeholder.com/150x200".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_neighbor_count() -> usize {
    10
}

fn default_result_limit() -> usize {
    6
}

fn default_unrated_default_rating() -> f64 {
    3.5
}

fn default_poster_target_count() -> usize {
    100
}

fn default_poster_request_delay_ms() -> u64 {
    200
}

impl Default for Config {
    fn default() -> Self {
        Self {
            movies_path: default_movies_path(),
            ratings_path: default_ratings_path(),
            poster_dir: default_poster_dir(),
            tmdb_api_key: None,
            tmdb_api_url: default_tmdb_api_url(),
            tmdb_image_url: default_tmdb_image_url(),
            placeholder_poster_url: default_placeholder_poster_url(),
            host: default_host(),
            port: default_port(),
            neighbor_count: default_neighbor_count(),
            min_neighbor_rating: 0.0,
            result_limit: default_result_limit(),
            aggregation: Aggregation::default(),
            unrated_default_rating: default_unrated_default_rating(),
            poster_target_count: default_poster_target_count(),
            poster_request_delay_ms: default_poster_request_delay_ms(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// Recommendation parameters used when a request leaves them out
    pub fn recommend_params(&self) -> RecommendParams {
        RecommendParams {
            neighbors: self.neighbor_count,
            min_neighbor_rating: self.min_neighbor_rating,
            limit: self.result_limit,
            aggregation: self.aggregation,
        }
    }

    pub fn unrated_policy(&self) -> UnratedPolicy {
        UnratedPolicy::Fixed(self.unrated_default_rating)
    }
}
