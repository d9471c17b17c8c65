use std::collections::{BTreeSet, HashMap};

use ndarray::{Array2, ArrayView1, ArrayView2};

use crate::{
    error::{AppError, AppResult},
    models::{MovieId, Rating, UserId},
};

/// Dense user × movie rating matrix
///
/// Rows follow ascending user id, columns ascending movie id. A cell holds
/// `0.0` when the user never rated the movie. That sentinel is only safe
/// because real ratings start at 0.5; whether a user rated a movie must be
/// answered by the rating store, not by this matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct UserItemMatrix {
    user_ids: Vec<UserId>,
    movie_ids: Vec<MovieId>,
    user_index: HashMap<UserId, usize>,
    movie_index: HashMap<MovieId, usize>,
    /// `user_ids.len()` × `movie_ids.len()`
    cells: Array2<f64>,
}

/// Pivots ratings into a dense matrix; later duplicates overwrite earlier ones
pub fn build_user_item_matrix(ratings: &[Rating]) -> AppResult<UserItemMatrix> {
    if ratings.is_empty() {
        return Err(AppError::MissingData(
            "no ratings to build the user-item matrix from".to_string(),
        ));
    }

    let user_ids: Vec<UserId> = ratings
        .iter()
        .map(|r| r.user_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let movie_ids: Vec<MovieId> = ratings
        .iter()
        .map(|r| r.movie_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let user_index: HashMap<UserId, usize> =
        user_ids.iter().enumerate().map(|(i, &u)| (u, i)).collect();
    let movie_index: HashMap<MovieId, usize> =
        movie_ids.iter().enumerate().map(|(i, &m)| (m, i)).collect();

    let mut cells = Array2::zeros((user_ids.len(), movie_ids.len()));
    for r in ratings {
        cells[[user_index[&r.user_id], movie_index[&r.movie_id]]] = r.rating;
    }

    tracing::debug!(
        users = user_ids.len(),
        movies = movie_ids.len(),
        "Built user-item matrix"
    );

    Ok(UserItemMatrix {
        user_ids,
        movie_ids,
        user_index,
        movie_index,
        cells,
    })
}

impl UserItemMatrix {
    /// Row labels, ascending
    pub fn user_ids(&self) -> &[UserId] {
        &self.user_ids
    }

    /// Column labels, ascending
    pub fn movie_ids(&self) -> &[MovieId] {
        &self.movie_ids
    }

    /// `(rows, columns)`
    pub fn dimensions(&self) -> (usize, usize) {
        (self.user_ids.len(), self.movie_ids.len())
    }

    pub fn user_index(&self, user_id: UserId) -> Option<usize> {
        self.user_index.get(&user_id).copied()
    }

    pub fn row(&self, user_id: UserId) -> Option<ArrayView1<'_, f64>> {
        self.user_index(user_id).map(|i| self.cells.row(i))
    }

    /// The whole matrix, rows in `user_ids()` order
    pub fn cells(&self) -> ArrayView2<'_, f64> {
        self.cells.view()
    }

    /// Cell value; `None` only when either label is not in the matrix
    pub fn get(&self, user_id: UserId, movie_id: MovieId) -> Option<f64> {
        let row = self.user_index(user_id)?;
        let col = *self.movie_index.get(&movie_id)?;
        self.cells.get((row, col)).copied()
    }
}
