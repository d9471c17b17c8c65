use serde::{Deserialize, Serialize};

use super::{MovieId, UserId};

/// How neighbor ratings for one candidate movie are folded into a score
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    /// Arithmetic mean of the supporting neighbors' ratings
    #[default]
    Mean,
    /// Highest similarity among the supporting neighbors
    MaxSimilarity,
    /// Sum of supporting ratings over all selected neighbors (non-raters count as 0)
    NeighborhoodMean,
}

/// Tuning knobs for one recommendation request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecommendParams {
    /// Number of nearest neighbors to draw candidates from
    pub neighbors: usize,
    /// Neighbor ratings below this are ignored
    pub min_neighbor_rating: f64,
    /// Maximum number of candidates returned
    pub limit: usize,
    pub aggregation: Aggregation,
}

impl Default for RecommendParams {
    fn default() -> Self {
        Self {
            neighbors: 10,
            min_neighbor_rating: 0.0,
            limit: 6,
            aggregation: Aggregation::Mean,
        }
    }
}

/// A movie proposed to the target user
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Candidate {
    pub movie_id: MovieId,
    pub score: f64,
    /// Neighbors that rated this movie, in neighbor-rank order
    pub supporting_neighbors: Vec<UserId>,
}

/// Outcome of a recommendation request
#[derive(Debug, Clone, PartialEq)]
pub enum Recommendations {
    /// The target user has no ratings at all
    UnknownUser,
    /// Ranked candidates, possibly empty
    Ranked(Vec<Candidate>),
}

impl Recommendations {
    pub fn candidates(&self) -> &[Candidate] {
        match self {
            Recommendations::UnknownUser => &[],
            Recommendations::Ranked(candidates) => candidates,
        }
    }

    pub fn is_unknown_user(&self) -> bool {
        matches!(self, Recommendations::UnknownUser)
    }
}

/// Ordering of genre filter results
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GenreSort {
    #[default]
    MeanRating,
    Random,
}

/// Mean rating assigned to movies nobody has rated
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnratedPolicy {
    Fixed(f64),
    /// Uniform draw from `[low, high)`, reproducible through `seed`
    Sampled { low: f64, high: f64, seed: u64 },
}

impl Default for UnratedPolicy {
    fn default() -> Self {
        UnratedPolicy::Fixed(3.5)
    }
}

/// A movie selected by the genre filter
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GenreMatch {
    pub movie_id: MovieId,
    pub title: String,
    pub genres: Vec<String>,
    pub mean_rating: f64,
    pub rating_count: usize,
}
