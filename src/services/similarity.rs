use std::time::Instant;

use ndarray::{Array1, Array2};

use crate::models::UserId;

use super::matrix::UserItemMatrix;

/// Symmetric user × user cosine similarity table
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityTable {
    user_ids: Vec<UserId>,
    scores: Array2<f64>,
}

/// Cosine similarity between every pair of user rows
///
/// Scores are clamped to `[-1, 1]`. A user whose row is all zeros has
/// similarity 0 with everyone, itself included.
pub fn compute_user_similarity(matrix: &UserItemMatrix) -> SimilarityTable {
    let start = Instant::now();
    let user_ids = matrix.user_ids().to_vec();
    let cells = matrix.cells();

    // gram[[i, j]] is the dot product of rows i and j
    let gram = cells.dot(&cells.t());
    let norms: Array1<f64> = gram.diag().mapv(f64::sqrt);

    let n = user_ids.len();
    let mut scores = Array2::zeros((n, n));
    for i in 0..n {
        if norms[i] == 0.0 {
            continue;
        }
        scores[[i, i]] = 1.0;

        for j in (i + 1)..n {
            if norms[j] == 0.0 {
                continue;
            }
            let sim = (gram[[i, j]] / (norms[i] * norms[j])).clamp(-1.0, 1.0);
            scores[[i, j]] = sim;
            scores[[j, i]] = sim;
        }
    }

    tracing::debug!(
        users = n,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Computed user similarity"
    );

    SimilarityTable { user_ids, scores }
}

impl SimilarityTable {
    pub fn len(&self) -> usize {
        self.user_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.user_ids.is_empty()
    }

    fn index_of(&self, user_id: UserId) -> Option<usize> {
        self.user_ids.binary_search(&user_id).ok()
    }

    pub fn get(&self, a: UserId, b: UserId) -> Option<f64> {
        let i = self.index_of(a)?;
        let j = self.index_of(b)?;
        self.scores.get((i, j)).copied()
    }

    /// Every other user with their similarity to `user_id`, in ascending user id
    pub fn neighbors_of(&self, user_id: UserId) -> impl Iterator<Item = (UserId, f64)> + '_ {
        let row = self.index_of(user_id).map(|i| self.scores.row(i));

        self.user_ids
            .iter()
            .zip(row.into_iter().flat_map(|row| row.into_iter()))
            .filter(move |&(&other, _)| other != user_id)
            .map(|(&other, &score)| (other, score))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Rating;
    use crate::services::matrix::build_user_item_matrix;

    fn table(ratings: &[Rating]) -> SimilarityTable {
        compute_user_similarity(&build_user_item_matrix(ratings).unwrap())
    }

    #[test]
    fn test_two_user_scenario() {
        let sims = table(&[
            Rating::new(1, 10, 5.0),
            Rating::new(1, 20, 3.0),
            Rating::new(2, 10, 5.0),
            Rating::new(2, 20, 3.0),
            Rating::new(2, 30, 4.0),
        ]);
        // [5,3,0]·[5,3,4] / (|[5,3,0]| |[5,3,4]|) = 34 / (sqrt(34) sqrt(50))
        let expected = 34.0 / (34.0_f64.sqrt() * 50.0_f64.sqrt());
        let sim = sims.get(1, 2).unwrap();
        assert!((sim - expected).abs() < 1e-12);
        assert!((sim - 0.8246).abs() < 1e-3);
    }

    #[test]
    fn test_symmetric_with_unit_diagonal() {
        let sims = table(&[
            Rating::new(1, 1, 4.0),
            Rating::new(1, 2, 1.0),
            Rating::new(2, 2, 5.0),
            Rating::new(3, 1, 2.5),
            Rating::new(3, 3, 3.5),
        ]);
        for a in [1, 2, 3] {
            assert_eq!(sims.get(a, a), Some(1.0));
            for b in [1, 2, 3] {
                assert_eq!(sims.get(a, b), sims.get(b, a));
            }
        }
    }

    #[test]
    fn test_disjoint_users_have_zero_similarity() {
        let sims = table(&[Rating::new(1, 1, 4.0), Rating::new(2, 2, 4.0)]);
        assert_eq!(sims.get(1, 2), Some(0.0));
    }

    #[test]
    fn test_zero_row_has_zero_diagonal() {
        // A rating of 0.0 is outside the scale but leaves an all-zero row
        let sims = table(&[Rating::new(1, 1, 4.0), Rating::new(2, 1, 0.0)]);
        assert_eq!(sims.get(2, 2), Some(0.0));
        assert_eq!(sims.get(1, 2), Some(0.0));
        assert_eq!(sims.get(1, 1), Some(1.0));
    }

    #[test]
    fn test_scores_stay_within_unit_range() {
        // Identical and proportional profiles sit exactly at 1 before rounding
        let sims = table(&[
            Rating::new(1, 1, 1.0),
            Rating::new(1, 2, 1.0),
            Rating::new(1, 3, 1.0),
            Rating::new(2, 1, 1.0),
            Rating::new(2, 2, 1.0),
            Rating::new(2, 3, 1.0),
            Rating::new(3, 1, 0.5),
            Rating::new(3, 2, 1.5),
            Rating::new(3, 3, 2.5),
            Rating::new(4, 1, 1.0),
            Rating::new(4, 2, 3.0),
            Rating::new(4, 3, 5.0),
        ]);
        for a in 1..=4 {
            for b in 1..=4 {
                let sim = sims.get(a, b).unwrap();
                assert!((-1.0..=1.0).contains(&sim), "sim({a},{b}) = {sim}");
            }
        }
        assert_eq!(sims.get(1, 2), Some(1.0));
        assert!((sims.get(3, 4).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_neighbors_exclude_self() {
        let sims = table(&[
            Rating::new(1, 1, 4.0),
            Rating::new(2, 1, 3.0),
            Rating::new(3, 1, 5.0),
        ]);
        let neighbors: Vec<UserId> = sims.neighbors_of(2).map(|(u, _)| u).collect();
        assert_eq!(neighbors, vec![1, 3]);
        assert_eq!(sims.neighbors_of(42).count(), 0);
    }
}
