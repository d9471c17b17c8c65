use std::{fs::File, io::Read, path::Path};

use serde::Deserialize;

use crate::{
    error::{AppError, AppResult},
    models::{Movie, MovieId, Rating},
};

use super::Dataset;

/// Row of `movies.csv`
#[derive(Debug, Deserialize)]
struct MovieRecord {
    #[serde(rename = "movieId")]
    movie_id: MovieId,
    title: String,
    #[serde(default)]
    genres: String,
}

/// Loads both tables from disk
///
/// Either file missing, or either table without rows, is reported as
/// `AppError::MissingData` so callers can tell it apart from an empty query result.
pub fn load_dataset(movies_path: &Path, ratings_path: &Path) -> AppResult<Dataset> {
    let movies = read_movies(open_required(movies_path)?)?;
    let ratings = read_ratings(open_required(ratings_path)?)?;

    if movies.is_empty() {
        return Err(AppError::MissingData(format!(
            "{} contains no movies",
            movies_path.display()
        )));
    }
    if ratings.is_empty() {
        return Err(AppError::MissingData(format!(
            "{} contains no ratings",
            ratings_path.display()
        )));
    }

    tracing::info!(
        movies = movies.len(),
        ratings = ratings.len(),
        movies_path = %movies_path.display(),
        ratings_path = %ratings_path.display(),
        "Dataset loaded"
    );

    Ok(Dataset::new(movies, ratings))
}

/// Loads `movies.csv` on its own; a missing or empty file is `MissingData`
pub fn load_movies(path: &Path) -> AppResult<Vec<Movie>> {
    let movies = read_movies(open_required(path)?)?;
    if movies.is_empty() {
        return Err(AppError::MissingData(format!(
            "{} contains no movies",
            path.display()
        )));
    }
    Ok(movies)
}

/// Loads `ratings.csv` when it exists; `None` when the file is absent
pub fn load_ratings_if_present(path: &Path) -> AppResult<Option<Vec<Rating>>> {
    if !path.exists() {
        tracing::info!(ratings_path = %path.display(), "Ratings file not found");
        return Ok(None);
    }
    Ok(Some(read_ratings(File::open(path)?)?))
}

fn open_required(path: &Path) -> AppResult<File> {
    if !path.exists() {
        return Err(AppError::MissingData(format!(
            "{} not found",
            path.display()
        )));
    }
    Ok(File::open(path)?)
}

/// Parses `movieId,title,genres` rows
pub fn read_movies<R: Read>(reader: R) -> AppResult<Vec<Movie>> {
    let mut reader = csv::Reader::from_reader(reader);
    let mut movies = Vec::new();

    for record in reader.deserialize() {
        let record: MovieRecord = record?;
        movies.push(Movie::new(record.movie_id, record.title, &record.genres));
    }

    Ok(movies)
}

/// Parses `userId,movieId,rating[,timestamp]` rows; extra columns are ignored
pub fn read_ratings<R: Read>(reader: R) -> AppResult<Vec<Rating>> {
    let mut reader = csv::Reader::from_reader(reader);
    let mut ratings = Vec::new();

    for record in reader.deserialize() {
        let rating: Rating = record?;
        ratings.push(rating);
    }

    Ok(ratings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MOVIES: &str = "movieId,title,genres\n\
        1,Toy Story (1995),Adventure|Animation|Children|Comedy|Fantasy\n\
        2,\"City of Lost Children, The (1995)\",Adventure|Drama|Fantasy|Mystery|Sci-Fi\n";

    const RATINGS: &str = "userId,movieId,rating,timestamp\n\
        1,1,4.0,964982703\n\
        1,2,3.5,964981247\n\
        2,1,5.0,964982224\n";

    #[test]
    fn test_read_movies_handles_quoted_titles() {
        let movies = read_movies(MOVIES.as_bytes()).unwrap();
        assert_eq!(movies.len(), 2);
        assert_eq!(movies[1].title, "City of Lost Children, The (1995)");
        assert_eq!(movies[0].genres.len(), 5);
    }

    #[test]
    fn test_read_ratings_ignores_timestamp() {
        let ratings = read_ratings(RATINGS.as_bytes()).unwrap();
        assert_eq!(ratings.len(), 3);
        assert_eq!(ratings[1], Rating::new(1, 2, 3.5));
    }

    #[test]
    fn test_read_ratings_without_timestamp_column() {
        let ratings = read_ratings("userId,movieId,rating\n3,7,0.5\n".as_bytes()).unwrap();
        assert_eq!(ratings, vec![Rating::new(3, 7, 0.5)]);
    }

    #[test]
    fn test_read_ratings_rejects_malformed_row() {
        let result = read_ratings("userId,movieId,rating\n1,abc,4.0\n".as_bytes());
        assert!(matches!(result, Err(AppError::Csv(_))));
    }

    #[test]
    fn test_load_dataset_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let movies_path = dir.path().join("movies.csv");
        std::fs::write(&movies_path, MOVIES).unwrap();

        let result = load_dataset(&movies_path, &dir.path().join("ratings.csv"));
        match result {
            Err(AppError::MissingData(msg)) => assert!(msg.contains("ratings.csv")),
            other => panic!("expected MissingData, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_load_dataset_empty_ratings() {
        let dir = tempfile::tempdir().unwrap();
        let movies_path = dir.path().join("movies.csv");
        let ratings_path = dir.path().join("ratings.csv");
        std::fs::write(&movies_path, MOVIES).unwrap();
        let mut file = File::create(&ratings_path).unwrap();
        writeln!(file, "userId,movieId,rating,timestamp").unwrap();

        let result = load_dataset(&movies_path, &ratings_path);
        assert!(matches!(result, Err(AppError::MissingData(_))));
    }

    #[test]
    fn test_load_dataset_success() {
        let dir = tempfile::tempdir().unwrap();
        let movies_path = dir.path().join("movies.csv");
        let ratings_path = dir.path().join("ratings.csv");
        std::fs::write(&movies_path, MOVIES).unwrap();
        std::fs::write(&ratings_path, RATINGS).unwrap();

        let dataset = load_dataset(&movies_path, &ratings_path).unwrap();
        assert_eq!(dataset.catalog.len(), 2);
        assert_eq!(dataset.ratings.user_count(), 2);
    }

    #[test]
    fn test_load_movies_without_ratings_file() {
        let dir = tempfile::tempdir().unwrap();
        let movies_path = dir.path().join("movies.csv");
        std::fs::write(&movies_path, MOVIES).unwrap();

        assert_eq!(load_movies(&movies_path).unwrap().len(), 2);
        let ratings = load_ratings_if_present(&dir.path().join("ratings.csv")).unwrap();
        assert!(ratings.is_none());
    }

    #[test]
    fn test_load_ratings_if_present_reads_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let ratings_path = dir.path().join("ratings.csv");
        std::fs::write(&ratings_path, RATINGS).unwrap();

        let ratings = load_ratings_if_present(&ratings_path).unwrap().unwrap();
        assert_eq!(ratings.len(), 3);
    }

    #[test]
    fn test_load_movies_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_movies(&dir.path().join("movies.csv"));
        assert!(matches!(result, Err(AppError::MissingData(_))));
    }
}
