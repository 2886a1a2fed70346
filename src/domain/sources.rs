use std::collections::HashSet;

/// Supported ratings-export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    Imdb,
    Letterboxd,
}

impl DataSource {
    pub fn as_str(&self) -> &str {
        match self {
            DataSource::Imdb => "imdb",
            DataSource::Letterboxd => "letterboxd",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "imdb" => Some(DataSource::Imdb),
            "letterboxd" => Some(DataSource::Letterboxd),
            _ => None,
        }
    }
}

/// Detect the export format from the CSV header row.
///
/// IMDb exports carry Const/Your Rating/Title/Title Type; Letterboxd exports
/// carry Date/Name/Year/Letterboxd URI. Ambiguous headers lean Letterboxd if
/// any of its signature columns appear, IMDb otherwise.
pub fn detect_source(fields: &[String]) -> DataSource {
    let set: HashSet<&str> = fields.iter().map(|f| f.trim()).collect();

    let imdb = set.contains("Const")
        && set.contains("Your Rating")
        && set.contains("Title")
        && set.contains("Title Type");
    let letterboxd = set.contains("Date")
        && set.contains("Name")
        && set.contains("Year")
        && set.contains("Letterboxd URI");

    if imdb {
        DataSource::Imdb
    } else if letterboxd || set.contains("Name") || set.contains("Letterboxd URI") {
        DataSource::Letterboxd
    } else {
        DataSource::Imdb
    }
}

/// Convert a Letterboxd star rating (0.5-5) to the internal 0-10 scale.
pub fn letterboxd_stars_to_rating(stars: &str) -> Option<f64> {
    let raw = stars.trim();
    if raw.is_empty() {
        return None;
    }
    raw.parse::<f64>().ok().map(|s| s * 2.0).filter(|r| r.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn detects_imdb_header() {
        let f = fields(&["Const", "Your Rating", "Date Rated", "Title", "Title Type", "Year"]);
        assert_eq!(detect_source(&f), DataSource::Imdb);
    }

    #[test]
    fn detects_letterboxd_header() {
        let f = fields(&["Date", "Name", "Year", "Letterboxd URI", "Rating"]);
        assert_eq!(detect_source(&f), DataSource::Letterboxd);
    }

    #[test]
    fn unknown_header_defaults_to_imdb() {
        let f = fields(&["Title", "Score"]);
        assert_eq!(detect_source(&f), DataSource::Imdb);
    }

    #[test]
    fn stars_double_to_internal_scale() {
        assert_eq!(letterboxd_stars_to_rating("4.5"), Some(9.0));
        assert_eq!(letterboxd_stars_to_rating(""), None);
        assert_eq!(letterboxd_stars_to_rating("n/a"), None);
    }
}
