use std::{path::Path, sync::OnceLock, time::Instant};

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use uuid::Uuid;

use crate::{
    data::{load_dataset, Dataset},
    error::AppResult,
    models::{GenreMatch, GenreSort, Movie, MovieId, RecommendParams, Recommendations, UnratedPolicy, UserId},
};

use super::{
    genre::{self, MeanRatings},
    matrix::{build_user_item_matrix, UserItemMatrix},
    recommender,
    similarity::{compute_user_similarity, SimilarityTable},
};

/// Summary of the loaded dataset
#[derive(Debug, Clone, Serialize)]
pub struct EngineStats {
    pub dataset_id: Uuid,
    pub loaded_at: DateTime<Utc>,
    pub users: usize,
    pub movies: usize,
    pub rated_movies: usize,
    pub ratings: usize,
    pub similarity_ready: bool,
}

/// One loaded dataset with everything derived from it
///
/// The similarity table is computed on first use and then reused for the
/// lifetime of this snapshot. Loading new data means building a new `Engine`.
pub struct Engine {
    id: Uuid,
    loaded_at: DateTime<Utc>,
    dataset: Dataset,
    matrix: UserItemMatrix,
    means: MeanRatings,
    similarity: OnceLock<SimilarityTable>,
}

impl Engine {
    pub fn new(dataset: Dataset, unrated: UnratedPolicy) -> AppResult<Self> {
        let matrix = build_user_item_matrix(dataset.ratings.all())?;
        let means = MeanRatings::compute(&dataset.catalog, &dataset.ratings, unrated);

        let engine = Self {
            id: Uuid::new_v4(),
            loaded_at: Utc::now(),
            dataset,
            matrix,
            means,
            similarity: OnceLock::new(),
        };

        tracing::info!(
            dataset_id = %engine.id,
            users = engine.matrix.dimensions().0,
            movies = engine.dataset.catalog.len(),
            "Recommendation engine ready"
        );

        Ok(engine)
    }

    /// Reads both CSV files and builds an engine over them
    pub fn load(movies_path: &Path, ratings_path: &Path, unrated: UnratedPolicy) -> AppResult<Self> {
        Self::new(load_dataset(movies_path, ratings_path)?, unrated)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn matrix(&self) -> &UserItemMatrix {
        &self.matrix
    }

    pub fn means(&self) -> &MeanRatings {
        &self.means
    }

    /// The memoized similarity table; the first caller computes it, concurrent callers wait
    pub fn similarity(&self) -> &SimilarityTable {
        self.similarity.get_or_init(|| {
            let start = Instant::now();
            let table = compute_user_similarity(&self.matrix);
            tracing::info!(
                dataset_id = %self.id,
                users = table.len(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Similarity table computed"
            );
            table
        })
    }

    pub fn recommend(&self, user_id: UserId, params: &RecommendParams) -> Recommendations {
        recommender::recommend(
            user_id,
            &self.dataset.ratings,
            &self.matrix,
            self.similarity(),
            params,
        )
    }

    pub fn filter_by_genre<R: Rng + ?Sized>(
        &self,
        genre: &str,
        limit: usize,
        sort: GenreSort,
        rng: &mut R,
    ) -> Vec<GenreMatch> {
        genre::filter_by_genre(&self.dataset.catalog, &self.means, genre, limit, sort, rng)
    }

    pub fn sample_catalog<R: Rng + ?Sized>(&self, limit: usize, rng: &mut R) -> Vec<&Movie> {
        genre::sample_catalog(&self.dataset.catalog, limit, rng)
    }

    pub fn movie(&self, movie_id: MovieId) -> Option<&Movie> {
        self.dataset.catalog.get(movie_id)
    }

    pub fn genres(&self) -> Vec<String> {
        self.dataset.catalog.genres().into_iter().collect()
    }

    pub fn stats(&self) -> EngineStats {
        let (users, rated_movies) = self.matrix.dimensions();
        EngineStats {
            dataset_id: self.id,
            loaded_at: self.loaded_at,
            users,
            movies: self.dataset.catalog.len(),
            rated_movies,
            ratings: self.dataset.ratings.len(),
            similarity_ready: self.similarity.get().is_some(),
        }
    }
}
