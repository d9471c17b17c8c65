//! Pre-fills the local poster cache for the best-rated movies.
//!
//! Candidates are the top `2 × POSTER_TARGET_COUNT` movies by mean rating,
//! or the first ones in catalog order when `ratings.csv` is absent. The tool
//! stops once `POSTER_TARGET_COUNT` posters are on disk.

use std::{path::PathBuf, time::Duration};

use anyhow::Context;
use movieflix_api::{
    config::Config,
    data::{load_movies, load_ratings_if_present, MovieCatalog, RatingStore},
    error::AppResult,
    services::{
        posters::{LocalPosterCache, TmdbPosterSource},
        rank_by_mean_rating, MeanRatings, PosterSource,
    },
    telemetry,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init_tracing();

    let config = Config::from_env()?;
    let api_key = config
        .tmdb_api_key
        .clone()
        .filter(|key| !key.trim().is_empty())
        .context("TMDB_API_KEY must be set to download posters")?;

    let movies_path = PathBuf::from(&config.movies_path);
    let ratings_path = PathBuf::from(&config.ratings_path);
    let unrated = config.unrated_policy();
    let (catalog, means) = tokio::task::spawn_blocking(
        move || -> AppResult<(MovieCatalog, Option<MeanRatings>)> {
            let catalog = MovieCatalog::new(load_movies(&movies_path)?);
            let means = load_ratings_if_present(&ratings_path)?
                .map(|ratings| MeanRatings::compute(&catalog, &RatingStore::new(ratings), unrated));
            Ok((catalog, means))
        },
    )
    .await??;

    let source = TmdbPosterSource::new(
        api_key,
        config.tmdb_api_url.clone(),
        config.tmdb_image_url.clone(),
        LocalPosterCache::new(&config.poster_dir),
    )?;

    let target = config.poster_target_count;
    let delay = Duration::from_millis(config.poster_request_delay_ms);
    let candidates = rank_by_mean_rating(&catalog, means.as_ref());

    tracing::info!(
        target = target,
        candidates = candidates.len().min(target * 2),
        ranked = means.is_some(),
        poster_dir = %config.poster_dir,
        "Collecting posters"
    );

    let mut collected = 0usize;
    for movie in candidates.into_iter().take(target * 2) {
        if collected >= target {
            break;
        }

        match source.find(movie.movie_id, &movie.title).await {
            Ok(Some(_)) => collected += 1,
            Ok(None) => {}
            Err(e) => tracing::warn!(
                movie_id = movie.movie_id,
                title = %movie.title,
                error = %e,
                "Poster download failed"
            ),
        }

        tokio::time::sleep(delay).await;
    }

    tracing::info!(
        collected = collected,
        poster_dir = %config.poster_dir,
        "Poster collection finished"
    );

    Ok(())
}
