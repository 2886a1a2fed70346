use anyhow::{Context, Result};
use log::debug;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use urlencoding::encode;

use crate::config::settings::TmdbSettings;

/// A fuzzy title-search candidate.
#[derive(Debug, Clone)]
pub struct TmdbSearchHit {
    pub title: String,
    pub year: Option<i32>,
    pub tmdb_id: i64,
    pub popularity: f64,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: i64,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    release_date: Option<String>,
    #[serde(default)]
    popularity: Option<f64>,
    #[serde(default)]
    poster_path: Option<String>,
}

/// Best-effort TMDb lookups for posters and title disambiguation.
///
/// Every failure degrades to "no result"; rating correctness never depends
/// on this client.
pub struct TmdbClient {
    client: Client,
    base_url: &'static str,
    image_base_url: &'static str,
    api_key: String,
}

impl TmdbClient {
    /// Returns `None` when no API key is configured.
    pub fn new(settings: &TmdbSettings) -> Result<Option<Self>> {
        let Some(api_key) = settings.api_key.clone() else {
            return Ok(None);
        };

        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Some(Self {
            client,
            base_url: settings.base_url,
            image_base_url: settings.image_base_url,
            api_key,
        }))
    }

    /// Fuzzy title search, most popular first. Empty on any failure.
    pub async fn search_movies(&self, query: &str) -> Vec<TmdbSearchHit> {
        if query.trim().len() < 2 {
            return Vec::new();
        }
        let url = format!(
            "{}/search/movie?api_key={}&query={}&include_adult=false",
            self.base_url,
            self.api_key,
            encode(query.trim())
        );
        let response = match self.get_search(&url).await {
            Ok(r) => r,
            Err(e) => {
                debug!("TMDb search failed: {:?}", e);
                return Vec::new();
            }
        };

        let mut hits: Vec<TmdbSearchHit> = response
            .results
            .into_iter()
            .filter_map(|item| {
                let title = item.title.or(item.name).unwrap_or_default();
                if title.is_empty() {
                    return None;
                }
                Some(TmdbSearchHit {
                    title,
                    year: parse_release_year(item.release_date.as_deref()),
                    tmdb_id: item.id,
                    popularity: item.popularity.unwrap_or(0.0),
                })
            })
            .collect();
        hits.sort_by(|a, b| b.popularity.total_cmp(&a.popularity));
        hits
    }

    /// Poster path for (title, year): year-scoped search first, then a
    /// retry without the year. `None` on miss or failure.
    pub async fn fetch_poster(&self, title: &str, year: Option<i32>) -> Option<String> {
        let with_year = match year {
            Some(y) => format!(
                "{}/search/movie?api_key={}&query={}&year={}",
                self.base_url,
                self.api_key,
                encode(title),
                y
            ),
            None => format!(
                "{}/search/movie?api_key={}&query={}",
                self.base_url,
                self.api_key,
                encode(title)
            ),
        };

        let mut results = self.get_search(&with_year).await.ok()?.results;
        if results.is_empty() && year.is_some() {
            let no_year = format!(
                "{}/search/movie?api_key={}&query={}",
                self.base_url,
                self.api_key,
                encode(title)
            );
            results = self.get_search(&no_year).await.ok()?.results;
        }

        results.into_iter().next().and_then(|item| item.poster_path)
    }

    pub fn image_url(&self, path: &str, size: &str) -> String {
        format!("{}/{}{}", self.image_base_url, size, path)
    }

    async fn get_search(&self, url: &str) -> Result<SearchResponse> {
        self.client
            .get(url)
            .send()
            .await
            .context("Failed to send TMDb request")?
            .json::<SearchResponse>()
            .await
            .context("Failed to parse TMDb response")
    }
}

fn parse_release_year(release_date: Option<&str>) -> Option<i32> {
    release_date?.get(..4)?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn release_year_comes_from_the_date_prefix() {
        assert_eq!(parse_release_year(Some("1995-12-15")), Some(1995));
        assert_eq!(parse_release_year(Some("")), None);
        assert_eq!(parse_release_year(None), None);
    }

    #[test]
    fn client_is_disabled_without_an_api_key() {
        let settings = TmdbSettings {
            base_url: "https://api.themoviedb.org/3",
            image_base_url: "https://image.tmdb.org/t/p",
            timeout_secs: 10,
            api_key: None,
        };
        assert!(TmdbClient::new(&settings).unwrap().is_none());
    }
}
