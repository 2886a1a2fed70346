use anyhow::{Context, Result};
use chrono::SecondsFormat;
use std::path::Path;

use crate::domain::models::TitleIndex;
use crate::rating::types::MatchEntry;

const HEADER: [&str; 11] = [
    "timestamp",
    "winner_key",
    "winner",
    "loser_key",
    "loser",
    "p_winner",
    "elo_winner_before",
    "elo_loser_before",
    "delta_winner",
    "delta_loser",
    "mode",
];

/// Render the full match history as CSV, display names resolved through the
/// title index. Quoting (double-quote doubling, quote on comma/quote/newline)
/// comes from the csv writer.
pub fn history_csv(history: &[MatchEntry], titles: &TitleIndex) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(HEADER).context("Failed to write CSV header")?;

    for entry in history {
        writer
            .write_record(&[
                entry.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
                entry.winner.clone(),
                titles.display_name(&entry.winner),
                entry.loser.clone(),
                titles.display_name(&entry.loser),
                format!("{:.6}", entry.p_winner),
                entry.winner_before.map(|r| r.to_string()).unwrap_or_default(),
                entry.loser_before.map(|r| r.to_string()).unwrap_or_default(),
                entry.delta_winner.to_string(),
                entry.delta_loser.to_string(),
                entry.mode.as_str().to_string(),
            ])
            .context("Failed to write CSV record")?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV writer: {}", e))?;
    String::from_utf8(bytes).context("History CSV was not valid UTF-8")
}

pub fn write_history_csv(
    path: &Path,
    history: &[MatchEntry],
    titles: &TitleIndex,
) -> Result<()> {
    let csv = history_csv(history, titles)?;
    std::fs::write(path, csv)
        .with_context(|| format!("Failed to write match log to {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::MovieRow;
    use crate::rating::types::MatchMode;
    use chrono::{DateTime, Utc};

    fn titles_with(title: &str, year: i32) -> TitleIndex {
        TitleIndex::build(&[MovieRow {
            title: title.to_string(),
            year: Some(year),
            title_type: "Movie".to_string(),
            your_rating: Some(8.0),
            imdb_rating: None,
            url: None,
            num_votes: None,
            runtime_mins: None,
            genres: String::new(),
            directors: String::new(),
            release_date: String::new(),
        }])
    }

    fn entry(winner: &str, loser: &str) -> MatchEntry {
        MatchEntry {
            timestamp: DateTime::<Utc>::UNIX_EPOCH,
            winner: winner.to_string(),
            loser: loser.to_string(),
            winner_before: Some(1000),
            loser_before: None,
            delta_winner: 16,
            delta_loser: -16,
            p_winner: 0.5,
            mode: MatchMode::Regular,
        }
    }

    #[test]
    fn header_and_probability_format() {
        let titles = titles_with("Heat", 1995);
        let csv = history_csv(&[entry("Heat_1995", "Alien_1979")], &titles).unwrap();
        let mut lines = csv.lines();

        assert_eq!(lines.next().unwrap(), HEADER.join(","));
        let row = lines.next().unwrap();
        assert!(row.contains("0.500000"));
        assert!(row.contains("Heat (1995)"));
        // Absent pre-match rating renders as an empty column
        assert!(row.contains(",1000,,16,-16,regular"));
    }

    #[test]
    fn titles_with_commas_are_quoted() {
        let titles = titles_with("Crouching Tiger, Hidden Dragon", 2000);
        let csv = history_csv(
            &[entry("Crouching Tiger, Hidden Dragon_2000", "Alien_1979")],
            &titles,
        )
        .unwrap();
        assert!(csv.contains("\"Crouching Tiger, Hidden Dragon (2000)\""));
    }
}
