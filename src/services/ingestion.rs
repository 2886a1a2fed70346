use anyhow::{bail, Context, Result};
use log::info;
use std::collections::HashMap;
use std::path::Path;

use crate::config::settings::AppConfig;
use crate::domain::models::MovieRow;
use crate::domain::sources::{detect_source, letterboxd_stars_to_rating, DataSource};
use crate::rating::store::RatingStore;
use crate::storage::{keys, StateStore};

/// Loads a ratings export, caches the normalized dataset and seeds the
/// rating store from it.
pub struct IngestionService {
    storage: StateStore,
}

impl IngestionService {
    pub fn new(config: &AppConfig) -> Result<Self> {
        Ok(Self {
            storage: StateStore::new(&config.data_dir)?,
        })
    }

    pub fn run(&self, csv_path: &Path) -> Result<()> {
        info!("Ingesting ratings export: {}", csv_path.display());

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(csv_path)
            .with_context(|| format!("Failed to open CSV: {}", csv_path.display()))?;

        let headers: Vec<String> = reader
            .headers()
            .context("Failed to read CSV header row")?
            .iter()
            .map(str::to_string)
            .collect();
        let source = detect_source(&headers);
        info!("Detected source format: {}", source.as_str());

        let columns = column_index(&headers);
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.context("Failed to read CSV record")?;
            let row = match source {
                DataSource::Imdb => parse_imdb_row(&record, &columns),
                DataSource::Letterboxd => parse_letterboxd_row(&record, &columns),
            };
            if let Some(row) = row {
                rows.push(row);
            }
        }

        let movies: Vec<MovieRow> = rows.into_iter().filter(|r| r.is_movie()).collect();
        if movies.is_empty() {
            bail!("No movie rows found in the CSV — export your ratings and try again");
        }
        let rated = movies.iter().filter(|r| r.is_rated()).count();
        info!("Loaded {} movies ({} rated)", movies.len(), rated);

        self.storage.save(keys::CSV_DATA, &movies)?;
        self.storage.save(keys::DATA_SOURCE, &source.as_str())?;

        let mut store = RatingStore::load(&self.storage)?;
        for row in movies.iter().filter(|r| r.is_rated()) {
            if let Some(rating) = row.your_rating {
                store.seed(&row.key(), rating);
            }
        }
        store.ensure_baseline();
        store.persist(&self.storage)?;
        info!("Rating store now tracks {} movies", store.len());

        Ok(())
    }
}

fn column_index(headers: &[String]) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(i, h)| (h.trim().to_string(), i))
        .collect()
}

fn field<'a>(
    record: &'a csv::StringRecord,
    columns: &HashMap<String, usize>,
    name: &str,
) -> &'a str {
    columns
        .get(name)
        .and_then(|&i| record.get(i))
        .unwrap_or("")
}

fn parse_opt_f64(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_opt_i32(raw: &str) -> Option<i32> {
    raw.trim().parse::<i32>().ok()
}

fn parse_opt_i64_grouped(raw: &str) -> Option<i64> {
    raw.trim().replace(',', "").parse::<i64>().ok()
}

fn parse_imdb_row(record: &csv::StringRecord, columns: &HashMap<String, usize>) -> Option<MovieRow> {
    let title = field(record, columns, "Title").trim().to_string();
    if title.is_empty() {
        return None;
    }

    Some(MovieRow {
        title,
        year: parse_opt_i32(field(record, columns, "Year")),
        title_type: field(record, columns, "Title Type").trim().to_string(),
        your_rating: parse_opt_f64(field(record, columns, "Your Rating")),
        imdb_rating: parse_opt_f64(field(record, columns, "IMDb Rating")),
        url: non_empty(field(record, columns, "URL")),
        num_votes: parse_opt_i64_grouped(field(record, columns, "Num Votes")),
        runtime_mins: parse_opt_i32(field(record, columns, "Runtime (mins)")),
        genres: field(record, columns, "Genres").trim().to_string(),
        directors: field(record, columns, "Directors").trim().to_string(),
        release_date: field(record, columns, "Release Date").trim().to_string(),
    })
}

fn parse_letterboxd_row(
    record: &csv::StringRecord,
    columns: &HashMap<String, usize>,
) -> Option<MovieRow> {
    let title = field(record, columns, "Name").trim().to_string();
    if title.is_empty() {
        return None;
    }

    // Letterboxd exports carry no type column; everything is a movie
    Some(MovieRow {
        title,
        year: parse_opt_i32(field(record, columns, "Year")),
        title_type: "Movie".to_string(),
        your_rating: letterboxd_stars_to_rating(field(record, columns, "Rating")),
        imdb_rating: None,
        url: non_empty(field(record, columns, "Letterboxd URI")),
        num_votes: None,
        runtime_mins: None,
        genres: String::new(),
        directors: String::new(),
        release_date: String::new(),
    })
}

fn non_empty(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_from(fields: &[&str]) -> csv::StringRecord {
        csv::StringRecord::from(fields.to_vec())
    }

    fn imdb_columns() -> HashMap<String, usize> {
        column_index(&[
            "Const".to_string(),
            "Your Rating".to_string(),
            "Title".to_string(),
            "Title Type".to_string(),
            "Year".to_string(),
            "IMDb Rating".to_string(),
            "Num Votes".to_string(),
        ])
    }

    #[test]
    fn imdb_row_parses_with_numeric_coercion() {
        let columns = imdb_columns();
        let record = record_from(&["tt0113277", "9", "Heat", "Movie", "1995", "8.3", "750,026"]);
        let row = parse_imdb_row(&record, &columns).unwrap();

        assert_eq!(row.title, "Heat");
        assert_eq!(row.year, Some(1995));
        assert_eq!(row.your_rating, Some(9.0));
        assert_eq!(row.num_votes, Some(750_026));
        assert!(row.is_rated());
    }

    #[test]
    fn malformed_rating_keeps_the_row_out_of_the_pool_only() {
        let columns = imdb_columns();
        let record = record_from(&["tt1", "n/a", "Heat", "Movie", "1995", "", ""]);
        let row = parse_imdb_row(&record, &columns).unwrap();

        assert!(row.is_movie());
        assert!(!row.is_rated());
        assert_eq!(row.your_rating, None);
    }

    #[test]
    fn letterboxd_row_normalizes_stars_and_type() {
        let columns = column_index(&[
            "Date".to_string(),
            "Name".to_string(),
            "Year".to_string(),
            "Letterboxd URI".to_string(),
            "Rating".to_string(),
        ]);
        let record = record_from(&["2024-01-01", "Heat", "1995", "https://boxd.it/x", "4.5"]);
        let row = parse_letterboxd_row(&record, &columns).unwrap();

        assert_eq!(row.title_type, "Movie");
        assert_eq!(row.your_rating, Some(9.0));
        assert_eq!(row.key(), "Heat_1995");
    }

    #[test]
    fn non_movie_rows_are_filtered_by_the_caller_contract() {
        let columns = imdb_columns();
        let record = record_from(&["tt2", "8", "Chernobyl", "TV Mini Series", "2019", "", ""]);
        let row = parse_imdb_row(&record, &columns).unwrap();
        assert!(!row.is_movie());
    }
}
