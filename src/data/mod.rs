pub mod loader;
pub mod store;

pub use loader::{load_dataset, load_movies, load_ratings_if_present, read_movies, read_ratings};
pub use store::{Dataset, MovieCatalog, RatingStore};
