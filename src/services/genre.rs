use std::collections::HashMap;

use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};

use crate::{
    data::{MovieCatalog, RatingStore},
    models::{GenreMatch, GenreSort, Movie, MovieId, UnratedPolicy},
};

/// Precomputed mean rating and rating count per catalog movie
#[derive(Debug, Clone, Default)]
pub struct MeanRatings {
    stats: HashMap<MovieId, (f64, usize)>,
}

impl MeanRatings {
    /// Averages every rating per movie; unrated catalog movies get a value from `policy`
    pub fn compute(catalog: &MovieCatalog, ratings: &RatingStore, policy: UnratedPolicy) -> Self {
        let mut sums: HashMap<MovieId, (f64, usize)> = HashMap::new();
        for r in ratings.all() {
            let entry = sums.entry(r.movie_id).or_insert((0.0, 0));
            entry.0 += r.rating;
            entry.1 += 1;
        }

        let mut sampler = match policy {
            UnratedPolicy::Sampled { seed, .. } => Some(StdRng::seed_from_u64(seed)),
            UnratedPolicy::Fixed(_) => None,
        };

        let mut stats = HashMap::with_capacity(catalog.len());
        let mut unrated = 0usize;
        for movie in catalog.movies() {
            let stat = match sums.get(&movie.movie_id) {
                Some(&(sum, count)) => (sum / count as f64, count),
                None => {
                    unrated += 1;
                    let value = match (policy, sampler.as_mut()) {
                        (UnratedPolicy::Sampled { low, high, .. }, Some(rng)) if low < high => {
                            rng.gen_range(low..high)
                        }
                        (UnratedPolicy::Sampled { low, .. }, _) => low,
                        (UnratedPolicy::Fixed(value), _) => value,
                    };
                    (value, 0)
                }
            };
            stats.insert(movie.movie_id, stat);
        }

        tracing::debug!(
            movies = stats.len(),
            unrated = unrated,
            "Computed mean ratings"
        );

        Self { stats }
    }

    pub fn mean(&self, movie_id: MovieId) -> Option<f64> {
        self.stats.get(&movie_id).map(|&(mean, _)| mean)
    }

    pub fn count(&self, movie_id: MovieId) -> usize {
        self.stats.get(&movie_id).map(|&(_, count)| count).unwrap_or(0)
    }
}

/// Movies whose genres contain `genre` (case-insensitive), ranked or sampled
///
/// A blank label matches nothing. With `GenreSort::Random` the result is a
/// sample without repetition of `min(limit, matches)` movies drawn from `rng`.
pub fn filter_by_genre<R: Rng + ?Sized>(
    catalog: &MovieCatalog,
    means: &MeanRatings,
    genre: &str,
    limit: usize,
    sort: GenreSort,
    rng: &mut R,
) -> Vec<GenreMatch> {
    let needle = genre.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    let matching: Vec<&Movie> = catalog
        .movies()
        .iter()
        .filter(|m| m.matches_genre(&needle))
        .collect();

    let selected: Vec<&Movie> = match sort {
        GenreSort::MeanRating => {
            let mut ranked = matching;
            ranked.sort_by(|a, b| {
                let a = means.mean(a.movie_id).unwrap_or(0.0);
                let b = means.mean(b.movie_id).unwrap_or(0.0);
                b.total_cmp(&a)
            });
            ranked.truncate(limit);
            ranked
        }
        GenreSort::Random => matching.choose_multiple(rng, limit).copied().collect(),
    };

    tracing::debug!(genre = %genre, sort = ?sort, results = selected.len(), "Genre filter applied");

    selected
        .into_iter()
        .map(|m| GenreMatch {
            movie_id: m.movie_id,
            title: m.title.clone(),
            genres: m.genres.clone(),
            mean_rating: means.mean(m.movie_id).unwrap_or(0.0),
            rating_count: means.count(m.movie_id),
        })
        .collect()
}

/// Random sample of the whole catalog for discover views
pub fn sample_catalog<'a, R: Rng + ?Sized>(
    catalog: &'a MovieCatalog,
    limit: usize,
    rng: &mut R,
) -> Vec<&'a Movie> {
    catalog.movies().choose_multiple(rng, limit).collect()
}

/// Catalog ordered by mean rating, best first, with movies nobody rated last
///
/// Without ratings the catalog order is kept as is.
pub fn rank_by_mean_rating<'a>(
    catalog: &'a MovieCatalog,
    means: Option<&MeanRatings>,
) -> Vec<&'a Movie> {
    let mut movies: Vec<&Movie> = catalog.movies().iter().collect();
    if let Some(means) = means {
        movies.sort_by(|a, b| {
            let rated_a = means.count(a.movie_id) > 0;
            let rated_b = means.count(b.movie_id) > 0;
            rated_b.cmp(&rated_a).then_with(|| {
                let mean_a = means.mean(a.movie_id).unwrap_or(0.0);
                let mean_b = means.mean(b.movie_id).unwrap_or(0.0);
                mean_b.total_cmp(&mean_a)
            })
        });
    }
    movies
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Rating;
    use std::collections::HashSet;

    fn catalog() -> MovieCatalog {
        MovieCatalog::new(vec![
            Movie::new(1, "Toy Story (1995)", "Adventure|Animation|Children|Comedy|Fantasy"),
            Movie::new(2, "Heat (1995)", "Action|Crime|Thriller"),
            Movie::new(3, "Grumpier Old Men (1995)", "Comedy|Romance"),
            Movie::new(4, "Waiting to Exhale (1995)", "Comedy|Drama|Romance"),
            Movie::new(5, "Father of the Bride Part II (1995)", "Comedy"),
            Movie::new(6, "Sabrina (1995)", "Comedy|Romance"),
            Movie::new(7, "Dark Comedy Noir (2001)", "Dark Comedy"),
        ])
    }

    fn ratings() -> RatingStore {
        RatingStore::new(vec![
            Rating::new(1, 1, 4.0),
            Rating::new(2, 1, 5.0),
            Rating::new(1, 2, 5.0),
            Rating::new(1, 3, 2.0),
            Rating::new(2, 4, 3.0),
            Rating::new(3, 4, 4.0),
            Rating::new(1, 5, 4.5),
        ])
    }

    fn means() -> MeanRatings {
        MeanRatings::compute(&catalog(), &ratings(), UnratedPolicy::Fixed(3.5))
    }

    #[test]
    fn test_mean_ratings_grouped_average() {
        let means = means();
        assert_eq!(means.mean(1), Some(4.5));
        assert_eq!(means.count(1), 2);
        assert_eq!(means.mean(4), Some(3.5));
        assert_eq!(means.mean(99), None);
    }

    #[test]
    fn test_unrated_movies_get_fixed_default() {
        let means = means();
        assert_eq!(means.mean(6), Some(3.5));
        assert_eq!(means.count(6), 0);
    }

    #[test]
    fn test_sampled_default_is_reproducible_and_bounded() {
        let policy = UnratedPolicy::Sampled {
            low: 3.0,
            high: 4.0,
            seed: 7,
        };
        let first = MeanRatings::compute(&catalog(), &ratings(), policy);
        let second = MeanRatings::compute(&catalog(), &ratings(), policy);
        for id in [6, 7] {
            let value = first.mean(id).unwrap();
            assert!((3.0..4.0).contains(&value));
            assert_eq!(first.mean(id), second.mean(id));
        }
    }

    #[test]
    fn test_comedy_by_mean_rating_is_non_increasing() {
        let mut rng = StdRng::seed_from_u64(0);
        let results = filter_by_genre(&catalog(), &means(), "Comedy", 5, GenreSort::MeanRating, &mut rng);
        assert_eq!(results.len(), 5);
        assert!(results
            .windows(2)
            .all(|w| w[0].mean_rating >= w[1].mean_rating));
        assert!(results
            .iter()
            .all(|m| m.genres.iter().any(|g| g.to_lowercase().contains("comedy"))));
        assert_eq!(results[0].movie_id, 1);
    }

    #[test]
    fn test_match_is_case_insensitive_substring() {
        let mut rng = StdRng::seed_from_u64(0);
        let results = filter_by_genre(&catalog(), &means(), "tHrIlL", 10, GenreSort::MeanRating, &mut rng);
        let ids: Vec<MovieId> = results.iter().map(|m| m.movie_id).collect();
        assert_eq!(ids, vec![2]);
    }

    #[test]
    fn test_ties_keep_catalog_order() {
        let mut rng = StdRng::seed_from_u64(0);
        let results = filter_by_genre(&catalog(), &means(), "romance", 10, GenreSort::MeanRating, &mut rng);
        // 4 and 6 both sit at 3.5
        let ids: Vec<MovieId> = results.iter().map(|m| m.movie_id).collect();
        assert_eq!(ids, vec![4, 6, 3]);
    }

    #[test]
    fn test_unknown_genre_is_empty() {
        let mut rng = StdRng::seed_from_u64(0);
        let results = filter_by_genre(&catalog(), &means(), "Western", 5, GenreSort::MeanRating, &mut rng);
        assert!(results.is_empty());
    }

    #[test]
    fn test_blank_genre_is_empty() {
        let mut rng = StdRng::seed_from_u64(0);
        let results = filter_by_genre(&catalog(), &means(), "  ", 5, GenreSort::Random, &mut rng);
        assert!(results.is_empty());
    }

    #[test]
    fn test_random_sample_properties() {
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let results = filter_by_genre(&catalog(), &means(), "comedy", 3, GenreSort::Random, &mut rng);
            assert_eq!(results.len(), 3);
            let unique: HashSet<MovieId> = results.iter().map(|m| m.movie_id).collect();
            assert_eq!(unique.len(), 3);
            assert!(results
                .iter()
                .all(|m| m.genres.iter().any(|g| g.to_lowercase().contains("comedy"))));
        }
    }

    #[test]
    fn test_random_sample_is_reproducible_with_seed() {
        let pick = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            filter_by_genre(&catalog(), &means(), "comedy", 3, GenreSort::Random, &mut rng)
        };
        assert_eq!(pick(42), pick(42));
    }

    #[test]
    fn test_random_sample_caps_at_match_count() {
        let mut rng = StdRng::seed_from_u64(1);
        let results = filter_by_genre(&catalog(), &means(), "action", 5, GenreSort::Random, &mut rng);
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn test_sample_catalog() {
        let catalog = catalog();
        let mut rng = StdRng::seed_from_u64(3);
        let picks = sample_catalog(&catalog, 6, &mut rng);
        assert_eq!(picks.len(), 6);
        let unique: HashSet<MovieId> = picks.iter().map(|m| m.movie_id).collect();
        assert_eq!(unique.len(), 6);
        assert_eq!(sample_catalog(&catalog, 50, &mut rng).len(), 7);
    }

    #[test]
    fn test_rank_by_mean_rating_puts_unrated_last() {
        let means = means();
        let ids: Vec<MovieId> = rank_by_mean_rating(&catalog(), Some(&means))
            .iter()
            .map(|m| m.movie_id)
            .collect();
        // 6 and 7 default to 3.5 but nobody rated them
        assert_eq!(ids, vec![2, 1, 5, 4, 3, 6, 7]);
    }

    #[test]
    fn test_rank_without_ratings_keeps_catalog_order() {
        let ids: Vec<MovieId> = rank_by_mean_rating(&catalog(), None)
            .iter()
            .map(|m| m.movie_id)
            .collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5, 6, 7]);
    }
}
