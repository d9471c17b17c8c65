pub mod engine;
pub mod genre;
pub mod matrix;
pub mod posters;
pub mod recommender;
pub mod similarity;

pub use engine::{Engine, EngineStats};
pub use genre::{filter_by_genre, rank_by_mean_rating, sample_catalog, MeanRatings};
pub use matrix::{build_user_item_matrix, UserItemMatrix};
pub use posters::{PosterResolver, PosterSource};
pub use recommender::recommend;
pub use similarity::{compute_user_similarity, SimilarityTable};
