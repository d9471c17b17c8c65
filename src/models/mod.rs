use serde::{Deserialize, Serialize};

pub mod recommendation;

pub use recommendation::{
    Aggregation, Candidate, GenreMatch, GenreSort, RecommendParams, Recommendations,
    UnratedPolicy,
};

/// Identifier of a rating user (`userId` column)
pub type UserId = u32;

/// Identifier of a catalog movie (`movieId` column)
pub type MovieId = u32;

/// Separator between genre labels in the `genres` column
pub const GENRE_SEPARATOR: char = '|';

/// Marker MovieLens uses for movies without any genre
const NO_GENRES_MARKER: &str = "(no genres listed)";

/// A single observed rating
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    #[serde(rename = "userId")]
    pub user_id: UserId,
    #[serde(rename = "movieId")]
    pub movie_id: MovieId,
    pub rating: f64,
}

impl Rating {
    pub fn new(user_id: UserId, movie_id: MovieId, rating: f64) -> Self {
        Self {
            user_id,
            movie_id,
            rating,
        }
    }
}

/// A catalog movie with its genre labels
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Movie {
    pub movie_id: MovieId,
    pub title: String,
    pub genres: Vec<String>,
    /// Lower-cased copy of `genres`, precomputed for matching
    #[serde(skip)]
    genres_lower: Vec<String>,
}

impl Movie {
    /// Creates a movie from its pipe-delimited genre column
    pub fn new(movie_id: MovieId, title: impl Into<String>, genres: &str) -> Self {
        let genres: Vec<String> = genres
            .split(GENRE_SEPARATOR)
            .map(str::trim)
            .filter(|g| !g.is_empty() && *g != NO_GENRES_MARKER)
            .map(str::to_string)
            .collect();
        let genres_lower = genres.iter().map(|g| g.to_lowercase()).collect();

        Self {
            movie_id,
            title: title.into(),
            genres,
            genres_lower,
        }
    }

    /// True when any genre label contains `needle`, which must already be lower-case
    pub fn matches_genre(&self, needle: &str) -> bool {
        self.genres_lower.iter().any(|g| g.contains(needle))
    }

    /// Title without the trailing release year, e.g. `"Heat (1995)"` -> `"Heat"`
    pub fn search_title(&self) -> &str {
        clean_title(&self.title)
    }
}

/// Strips everything from the first `" ("` on
pub fn clean_title(title: &str) -> &str {
    title.split(" (").next().unwrap_or(title).trim()
}
