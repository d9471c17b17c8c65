use std::path::{Path, PathBuf};

use crate::{error::AppResult, models::MovieId};

use super::PosterSource;

/// Posters already on disk as `<dir>/<movieId>.jpg`
#[derive(Debug, Clone)]
pub struct LocalPosterCache {
    dir: PathBuf,
}

impl LocalPosterCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Where the poster for `movie_id` lives, whether or not it exists yet
    pub fn path_for(&self, movie_id: MovieId) -> PathBuf {
        self.dir.join(format!("{}.jpg", movie_id))
    }

    pub async fn lookup(&self, movie_id: MovieId) -> AppResult<Option<String>> {
        let path = self.path_for(movie_id);
        if tokio::fs::try_exists(&path).await? {
            Ok(Some(path.to_string_lossy().into_owned()))
        } else {
            Ok(None)
        }
    }
}

#[async_trait::async_trait]
impl PosterSource for LocalPosterCache {
    async fn find(&self, movie_id: MovieId, _title: &str) -> AppResult<Option<String>> {
        self.lookup(movie_id).await
    }

    fn name(&self) -> &'static str {
        "local"
    }
}
