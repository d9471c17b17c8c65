use std::collections::HashMap;

use crate::{
    data::RatingStore,
    models::{Aggregation, Candidate, MovieId, RecommendParams, Recommendations, UserId},
};

use super::{matrix::UserItemMatrix, similarity::SimilarityTable};

/// Per-movie accumulator while walking neighbor ratings
struct Tally {
    movie_id: MovieId,
    rating_sum: f64,
    max_similarity: f64,
    supporting_neighbors: Vec<UserId>,
}

/// User-based collaborative filtering for one target user
///
/// Picks the `params.neighbors` most similar users (similarity above zero),
/// gathers the movies they rated at or above `params.min_neighbor_rating`
/// that the target has not rated, scores each with `params.aggregation`,
/// and returns the best `params.limit`. Equal scores keep the order in which
/// the movie was first met while walking neighbors by rank, then movie id.
pub fn recommend(
    target: UserId,
    ratings: &RatingStore,
    matrix: &UserItemMatrix,
    similarity: &SimilarityTable,
    params: &RecommendParams,
) -> Recommendations {
    if matrix.user_index(target).is_none() {
        tracing::debug!(user_id = target, "No rating profile for user");
        return Recommendations::UnknownUser;
    }

    let neighbors = select_neighbors(target, similarity, params.neighbors);
    if neighbors.is_empty() {
        tracing::debug!(user_id = target, "No similar users found");
        return Recommendations::Ranked(Vec::new());
    }

    let watched = ratings.watched(target);

    let mut order: HashMap<MovieId, usize> = HashMap::new();
    let mut tallies: Vec<Tally> = Vec::new();

    for &(neighbor, sim) in &neighbors {
        let Some(neighbor_ratings) = ratings.user_ratings(neighbor) else {
            continue;
        };
        for (&movie_id, &rating) in neighbor_ratings {
            if watched.contains(&movie_id) || rating < params.min_neighbor_rating {
                continue;
            }
            let slot = *order.entry(movie_id).or_insert_with(|| {
                tallies.push(Tally {
                    movie_id,
                    rating_sum: 0.0,
                    max_similarity: f64::NEG_INFINITY,
                    supporting_neighbors: Vec::new(),
                });
                tallies.len() - 1
            });
            let tally = &mut tallies[slot];
            tally.rating_sum += rating;
            tally.max_similarity = tally.max_similarity.max(sim);
            tally.supporting_neighbors.push(neighbor);
        }
    }

    let neighborhood = neighbors.len() as f64;
    let mut candidates: Vec<Candidate> = tallies
        .into_iter()
        .map(|t| {
            let score = match params.aggregation {
                Aggregation::Mean => t.rating_sum / t.supporting_neighbors.len() as f64,
                Aggregation::MaxSimilarity => t.max_similarity,
                Aggregation::NeighborhoodMean => t.rating_sum / neighborhood,
            };
            Candidate {
                movie_id: t.movie_id,
                score,
                supporting_neighbors: t.supporting_neighbors,
            }
        })
        .collect();

    // sort_by is stable, so ties stay in first-appearance order
    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));
    candidates.truncate(params.limit);

    tracing::debug!(
        user_id = target,
        neighbors = neighbors.len(),
        watched = watched.len(),
        candidates = candidates.len(),
        "Recommendations computed"
    );

    Recommendations::Ranked(candidates)
}

/// Top `k` other users by similarity, descending; only strictly positive scores qualify
fn select_neighbors(target: UserId, similarity: &SimilarityTable, k: usize) -> Vec<(UserId, f64)> {
    let mut neighbors: Vec<(UserId, f64)> = similarity
        .neighbors_of(target)
        .filter(|&(_, sim)| sim > 0.0)
        .collect();
    neighbors.sort_by(|a, b| b.1.total_cmp(&a.1));
    neighbors.truncate(k);
    neighbors
}
