use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use crate::models::{Movie, MovieId, Rating, UserId};

/// Raw rating observations, indexed per user
///
/// Duplicate `(user, movie)` pairs keep the last value seen, matching the
/// matrix builder.
#[derive(Debug, Clone, Default)]
pub struct RatingStore {
    ratings: Vec<Rating>,
    by_user: BTreeMap<UserId, BTreeMap<MovieId, f64>>,
}

impl RatingStore {
    pub fn new(ratings: Vec<Rating>) -> Self {
        let mut by_user: BTreeMap<UserId, BTreeMap<MovieId, f64>> = BTreeMap::new();
        for r in &ratings {
            by_user
                .entry(r.user_id)
                .or_default()
                .insert(r.movie_id, r.rating);
        }

        Self { ratings, by_user }
    }

    /// All observations in load order
    pub fn all(&self) -> &[Rating] {
        &self.ratings
    }

    pub fn len(&self) -> usize {
        self.ratings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ratings.is_empty()
    }

    pub fn user_count(&self) -> usize {
        self.by_user.len()
    }

    pub fn has_user(&self, user_id: UserId) -> bool {
        self.by_user.contains_key(&user_id)
    }

    /// A user's ratings keyed by movie id, ascending
    pub fn user_ratings(&self, user_id: UserId) -> Option<&BTreeMap<MovieId, f64>> {
        self.by_user.get(&user_id)
    }

    /// Movies the user has rated, whatever the value
    pub fn watched(&self, user_id: UserId) -> HashSet<MovieId> {
        self.by_user
            .get(&user_id)
            .map(|movies| movies.keys().copied().collect())
            .unwrap_or_default()
    }
}

/// Immutable movie reference data, ordered by movie id
#[derive(Debug, Clone, Default)]
pub struct MovieCatalog {
    movies: Vec<Movie>,
    index: HashMap<MovieId, usize>,
}

impl MovieCatalog {
    pub fn new(mut movies: Vec<Movie>) -> Self {
        movies.sort_by_key(|m| m.movie_id);
        movies.dedup_by_key(|m| m.movie_id);
        let index = movies
            .iter()
            .enumerate()
            .map(|(i, m)| (m.movie_id, i))
            .collect();

        Self { movies, index }
    }

    pub fn get(&self, movie_id: MovieId) -> Option<&Movie> {
        self.index.get(&movie_id).map(|&i| &self.movies[i])
    }

    pub fn movies(&self) -> &[Movie] {
        &self.movies
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }

    /// Distinct genre labels across the catalog, sorted
    pub fn genres(&self) -> BTreeSet<String> {
        self.movies
            .iter()
            .flat_map(|m| m.genres.iter().cloned())
            .collect()
    }
}

/// Both input tables as loaded from disk
#[derive(Debug, Clone)]
pub struct Dataset {
    pub catalog: MovieCatalog,
    pub ratings: RatingStore,
}

impl Dataset {
    pub fn new(movies: Vec<Movie>, ratings: Vec<Rating>) -> Self {
        Self {
            catalog: MovieCatalog::new(movies),
            ratings: RatingStore::new(ratings),
        }
    }
}
