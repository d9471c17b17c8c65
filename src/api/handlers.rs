use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::{Aggregation, GenreSort, MovieId, RecommendParams, UserId},
    services::EngineStats,
};

use super::AppState;

/// Upper bound on `limit` for every list endpoint
const MAX_LIMIT: usize = 100;

// Request/Response types

#[derive(Debug, Default, Deserialize)]
pub struct RecommendQuery {
    pub k: Option<usize>,
    pub min_rating: Option<f64>,
    pub limit: Option<usize>,
    pub aggregation: Option<Aggregation>,
}

#[derive(Debug, Deserialize)]
pub struct GenreQuery {
    pub genre: String,
    pub limit: Option<usize>,
    #[serde(default)]
    pub sort: GenreSort,
    pub seed: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SampleQuery {
    pub limit: Option<usize>,
    pub seed: Option<u64>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationStatus {
    Ok,
    /// The user has no rating history
    NoProfile,
}

#[derive(Debug, Serialize)]
pub struct RecommendationItem {
    pub movie_id: MovieId,
    pub title: Option<String>,
    pub genres: Vec<String>,
    pub score: f64,
    pub supporting_neighbors: Vec<UserId>,
    pub poster: String,
}

#[derive(Debug, Serialize)]
pub struct RecommendationResponse {
    pub user_id: UserId,
    pub status: RecommendationStatus,
    pub items: Vec<RecommendationItem>,
}

#[derive(Debug, Serialize)]
pub struct MovieResponse {
    pub movie_id: MovieId,
    pub title: String,
    pub genres: Vec<String>,
    pub mean_rating: Option<f64>,
    pub rating_count: usize,
    pub poster: String,
}

#[derive(Debug, Serialize)]
pub struct MovieListResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    pub items: Vec<MovieResponse>,
}

fn validate_limit(limit: usize) -> AppResult<usize> {
    if limit == 0 || limit > MAX_LIMIT {
        return Err(AppError::InvalidInput(format!(
            "limit must be between 1 and {}",
            MAX_LIMIT
        )));
    }
    Ok(limit)
}

fn rng_for(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

impl RecommendQuery {
    /// Merges the query with configured defaults and validates the result
    fn params(&self, defaults: RecommendParams) -> AppResult<RecommendParams> {
        let params = RecommendParams {
            neighbors: self.k.unwrap_or(defaults.neighbors),
            min_neighbor_rating: self.min_rating.unwrap_or(defaults.min_neighbor_rating),
            limit: validate_limit(self.limit.unwrap_or(defaults.limit))?,
            aggregation: self.aggregation.unwrap_or(defaults.aggregation),
        };

        if params.neighbors == 0 {
            return Err(AppError::InvalidInput("k must be at least 1".to_string()));
        }
        if !params.min_neighbor_rating.is_finite() {
            return Err(AppError::InvalidInput(
                "min_rating must be a finite number".to_string(),
            ));
        }

        Ok(params)
    }
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Personalized recommendations for one user
pub async fn recommend_for_user(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(user_id): Path<UserId>,
    Query(query): Query<RecommendQuery>,
) -> AppResult<Json<RecommendationResponse>> {
    let params = query.params(state.config.recommend_params())?;
    let engine = state.engine().await?;

    tracing::info!(
        request_id = %request_id,
        user_id = user_id,
        k = params.neighbors,
        min_rating = params.min_neighbor_rating,
        limit = params.limit,
        aggregation = ?params.aggregation,
        "Processing recommendation request"
    );

    let worker = engine.clone();
    let recommendations = tokio::task::spawn_blocking(move || worker.recommend(user_id, &params))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let status = if recommendations.is_unknown_user() {
        RecommendationStatus::NoProfile
    } else {
        RecommendationStatus::Ok
    };

    let mut items = Vec::with_capacity(recommendations.candidates().len());
    for candidate in recommendations.candidates() {
        let movie = engine.movie(candidate.movie_id);
        let title = movie.map(|m| m.title.clone());
        let poster = state
            .posters
            .resolve(candidate.movie_id, title.as_deref().unwrap_or_default())
            .await;

        items.push(RecommendationItem {
            movie_id: candidate.movie_id,
            title,
            genres: movie.map(|m| m.genres.clone()).unwrap_or_default(),
            score: candidate.score,
            supporting_neighbors: candidate.supporting_neighbors.clone(),
            poster,
        });
    }

    if items.is_empty() {
        tracing::warn!(
            request_id = %request_id,
            user_id = user_id,
            status = ?status,
            "No recommendations found"
        );
    }

    Ok(Json(RecommendationResponse {
        user_id,
        status,
        items,
    }))
}

/// Movies of one genre, best rated first or sampled
pub async fn movies_by_genre(
    State(state): State<AppState>,
    Query(query): Query<GenreQuery>,
) -> AppResult<Json<MovieListResponse>> {
    if query.genre.trim().is_empty() {
        return Err(AppError::InvalidInput("genre must not be blank".to_string()));
    }
    let limit = validate_limit(query.limit.unwrap_or(state.config.result_limit))?;
    let engine = state.engine().await?;

    let mut rng = rng_for(query.seed);
    let matches = engine.filter_by_genre(&query.genre, limit, query.sort, &mut rng);

    let mut items = Vec::with_capacity(matches.len());
    for m in matches {
        let poster = state.posters.resolve(m.movie_id, &m.title).await;
        items.push(MovieResponse {
            movie_id: m.movie_id,
            title: m.title,
            genres: m.genres,
            mean_rating: Some(m.mean_rating),
            rating_count: m.rating_count,
            poster,
        });
    }

    Ok(Json(MovieListResponse {
        genre: Some(query.genre),
        items,
    }))
}

/// Random sample of the catalog for the discover row
pub async fn trending(
    State(state): State<AppState>,
    Query(query): Query<SampleQuery>,
) -> AppResult<Json<MovieListResponse>> {
    let limit = validate_limit(query.limit.unwrap_or(state.config.result_limit))?;
    let engine = state.engine().await?;

    let mut rng = rng_for(query.seed);
    let picks: Vec<(MovieId, String, Vec<String>)> = engine
        .sample_catalog(limit, &mut rng)
        .into_iter()
        .map(|m| (m.movie_id, m.title.clone(), m.genres.clone()))
        .collect();

    let mut items = Vec::with_capacity(picks.len());
    for (movie_id, title, genres) in picks {
        let poster = state.posters.resolve(movie_id, &title).await;
        items.push(MovieResponse {
            movie_id,
            title,
            genres,
            mean_rating: engine.means().mean(movie_id),
            rating_count: engine.means().count(movie_id),
            poster,
        });
    }

    Ok(Json(MovieListResponse { genre: None, items }))
}

/// A single catalog movie
pub async fn get_movie(
    State(state): State<AppState>,
    Path(movie_id): Path<MovieId>,
) -> AppResult<Json<MovieResponse>> {
    let engine = state.engine().await?;
    let movie = engine
        .movie(movie_id)
        .ok_or_else(|| AppError::NotFound(format!("movie {}", movie_id)))?;

    let poster = state.posters.resolve(movie_id, &movie.title).await;

    Ok(Json(MovieResponse {
        movie_id,
        title: movie.title.clone(),
        genres: movie.genres.clone(),
        mean_rating: engine.means().mean(movie_id),
        rating_count: engine.means().count(movie_id),
        poster,
    }))
}

/// Distinct genre labels in the catalog
pub async fn list_genres(State(state): State<AppState>) -> AppResult<Json<Vec<String>>> {
    let engine = state.engine().await?;
    Ok(Json(engine.genres()))
}

/// Dataset summary
pub async fn stats(State(state): State<AppState>) -> AppResult<Json<EngineStats>> {
    let engine = state.engine().await?;
    Ok(Json(engine.stats()))
}

/// Re-read the CSV files and serve the fresh dataset
pub async fn reload(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
) -> AppResult<Json<EngineStats>> {
    tracing::info!(request_id = %request_id, "Reloading dataset");
    let stats = state.reload().await?;
    Ok(Json(stats))
}
