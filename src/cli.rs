use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "movie-elo-ranking backend")]
pub struct Cli {
    /// Command
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
#[clap(rename_all = "lower_case")]
pub enum Command {
    /// Start the backend server for the dashboard UI
    Serve {
        /// Port number (optional, defaults to 3000)
        #[arg(short, long, default_value_t = 3000)]
        port: u16,
    },
    /// Load a ratings CSV export (IMDb or Letterboxd) and seed the store
    Ingest {
        /// Path to the exported CSV
        file: PathBuf,
    },
    /// Play regular head-to-head matches in the terminal
    Play {
        /// Stop after this many matches (default: until quit)
        #[arg(short, long)]
        rounds: Option<u32>,
    },
    /// Deal a quick batch and apply a one-vs-many result
    Quick,
    /// Run a provisional placement session for a movie, e.g. "Heat (1995)"
    Place {
        /// Title, optionally with a year suffix in parentheses
        query: String,
    },
    /// Print the ranked leaderboard
    Leaderboard {
        /// Maximum rows to print
        #[arg(short, long, default_value_t = 50)]
        limit: usize,
    },
    /// Print match-log analytics (upsets, streaks, most improved, ...)
    Stats,
    /// Export the match history as CSV
    Export {
        /// Output file
        #[arg(short, long, default_value = "elo_match_log.csv")]
        output: PathBuf,
    },
    /// Reset ratings, history and recent pairs; the dataset stays loaded
    Reset {
        /// Skip the confirmation
        #[arg(long)]
        yes: bool,
    },
}
