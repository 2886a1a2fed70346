use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::rating::types::MovieKey;

/// One row of the uploaded ratings export, normalized to the IMDb column
/// vocabulary. Letterboxd exports are mapped onto this shape at ingestion.
/// `your_rating` is on the 0-10 scale; rows where it failed numeric coercion
/// keep `None` and stay out of the rated pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovieRow {
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Year")]
    pub year: Option<i32>,
    #[serde(rename = "Title Type")]
    pub title_type: String,
    #[serde(rename = "Your Rating")]
    pub your_rating: Option<f64>,
    #[serde(rename = "IMDb Rating")]
    pub imdb_rating: Option<f64>,
    #[serde(rename = "URL")]
    pub url: Option<String>,
    #[serde(rename = "Num Votes")]
    pub num_votes: Option<i64>,
    #[serde(rename = "Runtime (mins)")]
    pub runtime_mins: Option<i32>,
    #[serde(rename = "Genres")]
    pub genres: String,
    #[serde(rename = "Directors")]
    pub directors: String,
    #[serde(rename = "Release Date")]
    pub release_date: String,
}

impl MovieRow {
    pub fn is_movie(&self) -> bool {
        !self.title.is_empty() && self.title_type.trim() == "Movie"
    }

    /// Rows with a usable personal rating form the rated pool.
    pub fn is_rated(&self) -> bool {
        self.is_movie() && self.your_rating.is_some_and(|r| r.is_finite())
    }

    pub fn key(&self) -> MovieKey {
        movie_key(&self.title, self.year)
    }
}

/// Derive the identity key for a (title, year) pair. Identical pairs always
/// collide to the same key; there is no surrogate ID.
pub fn movie_key(title: &str, year: Option<i32>) -> MovieKey {
    let t = title.trim();
    match year {
        Some(y) => format!("{}_{}", t, y),
        None => format!("{}_NA", t),
    }
}

/// Read-through display cache from movie key to (title, year).
///
/// Built once from the dataset and rebuilt whenever the dataset changes;
/// owned by whichever layer renders names, never by the rating engine.
#[derive(Debug, Default, Clone)]
pub struct TitleIndex {
    by_key: HashMap<MovieKey, (String, Option<i32>)>,
}

impl TitleIndex {
    pub fn build(rows: &[MovieRow]) -> Self {
        let mut by_key = HashMap::new();
        for row in rows {
            by_key
                .entry(row.key())
                .or_insert_with(|| (row.title.trim().to_string(), row.year));
        }
        Self { by_key }
    }

    /// Record a key seen outside the dataset (e.g. a saved placement).
    pub fn insert(&mut self, key: MovieKey, title: String, year: Option<i32>) {
        self.by_key.entry(key).or_insert((title, year));
    }

    pub fn meta(&self, key: &str) -> (String, Option<i32>) {
        match self.by_key.get(key) {
            Some((title, year)) => (title.clone(), *year),
            // Unknown key: best effort from the key itself
            None => {
                let title = key.split('_').next().unwrap_or("?").to_string();
                let title = if title.is_empty() { "?".to_string() } else { title };
                (title, None)
            }
        }
    }

    pub fn display_name(&self, key: &str) -> String {
        let (title, year) = self.meta(key);
        match year {
            Some(y) => format!("{} ({})", title, y),
            None => title,
        }
    }
}
