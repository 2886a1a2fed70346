use anyhow::{bail, Context, Result};
use colored::Colorize;
use regex::Regex;
use std::io::{self, Write};
use std::path::Path;

use super::export;
use super::state::EngineState;
use crate::rating::{analytics, resolver, sampler};
use crate::rating::placement::PlacementSession;
use crate::rating::types::{MatchMode, ResolveOutcome};

/// Terminal driver for the engine: regular duels, quick batches, placement
/// sessions and the read-only views.
pub struct ArenaService {
    state: EngineState,
}

impl ArenaService {
    pub fn new(state: EngineState) -> Self {
        Self { state }
    }

    // --- Regular duels ---

    pub fn run_duels(&mut self, rounds: Option<u32>) -> Result<()> {
        self.require_dataset()?;
        if self.state.pool.len() < 2 {
            bail!("Need at least 2 rated movies to play (check that your CSV has Your Rating)");
        }

        println!("{}", "Pick the better movie: 1 or 2, (s)kip, (q)uit".dimmed());
        let mut played = 0u32;
        loop {
            if let Some(target) = rounds {
                if played >= target {
                    break;
                }
            }

            let mut rng = rand::rng();
            let Some((left, right)) =
                sampler::pick_pair(&self.state.pool, &self.state.store, &self.state.config.elo, &mut rng)
            else {
                break;
            };

            println!(
                "\n  [1] {}  ({})",
                self.state.titles.display_name(&left).bold(),
                self.state.store.get(&left)
            );
            println!(
                "  [2] {}  ({})",
                self.state.titles.display_name(&right).bold(),
                self.state.store.get(&right)
            );

            let (winner, loser) = match prompt("Winner: ")?.as_str() {
                "1" => (left, right),
                "2" => (right, left),
                "s" => continue,
                "q" | "" => break,
                other => {
                    println!("Unrecognized input: {}", other);
                    continue;
                }
            };

            let outcome = resolver::resolve_match(
                &mut self.state.store,
                &winner,
                &loser,
                MatchMode::Regular,
                None,
                &self.state.config.elo,
            );
            if let ResolveOutcome::Applied = outcome {
                self.state.persist()?;
                self.print_last_match();
                played += 1;
            }
        }

        println!("\n{} matches recorded.", played);
        Ok(())
    }

    fn print_last_match(&self) {
        if let Some(entry) = self.state.store.history().last() {
            println!(
                "  {} {}  /  {} {}   (expected {})",
                self.state.titles.display_name(&entry.winner),
                signed(entry.delta_winner).green(),
                self.state.titles.display_name(&entry.loser),
                signed(entry.delta_loser).red(),
                pct(entry.p_winner)
            );
        }
    }

    // --- Quick batches ---

    pub fn run_quick(&mut self) -> Result<()> {
        self.require_dataset()?;
        if self.state.pool.len() < 3 {
            bail!("Need at least 3 rated movies to use quick rating");
        }

        let mut rng = rand::rng();
        let batch = sampler::deal_batch(
            &self.state.pool,
            &self.state.store,
            self.state.config.elo.quick_batch_size,
            &mut rng,
        );

        println!("{}", "Mark the winners; everything else in the batch loses to them.".dimmed());
        for (i, key) in batch.iter().enumerate() {
            println!(
                "  [{:>2}] {}  ({})",
                i + 1,
                self.state.titles.display_name(key),
                self.state.store.get(key)
            );
        }

        let raw = prompt("Winners (numbers, space-separated): ")?;
        let picked: Vec<usize> = raw
            .split_whitespace()
            .filter_map(|tok| tok.parse::<usize>().ok())
            .filter(|&n| n >= 1 && n <= batch.len())
            .map(|n| n - 1)
            .collect();
        if picked.is_empty() {
            println!("No winners selected; nothing applied.");
            return Ok(());
        }

        let winners: Vec<_> = picked.iter().map(|&i| batch[i].clone()).collect();
        let losers: Vec<_> = batch
            .iter()
            .enumerate()
            .filter(|(i, _)| !picked.contains(i))
            .map(|(_, key)| key.clone())
            .collect();

        let before = self.state.store.history().len();
        resolver::resolve_batch(&mut self.state.store, &winners, &losers, &self.state.config.elo);
        self.state.persist()?;
        println!(
            "Applied {} pairwise results ({} winners vs {} losers).",
            self.state.store.history().len() - before,
            winners.len(),
            losers.len()
        );
        Ok(())
    }

    // --- Placement sessions ---

    pub fn run_placement(&mut self, title: &str, year: Option<i32>) -> Result<()> {
        if self.state.store.len() < self.state.config.placement.min_pool {
            bail!("Play a few matches first so there are opponents to compare against");
        }

        let placement = self.state.config.placement.clone();
        let mut rng = rand::rng();
        let mut session = PlacementSession::start(
            title,
            year,
            &self.state.store,
            self.state.csv_mean_rating(),
            &placement,
            &mut rng,
        )?;

        println!(
            "Placing {} — starting at {}",
            session.title.clone().bold(),
            session.working_rating()
        );
        while let Some(opponent) = session.current_opponent().cloned() {
            let (done, total) = session.progress();
            println!(
                "\nMatch {} / {}:  [1] {}  vs  [2] {}  ({})",
                done + 1,
                total,
                session.title.clone().bold(),
                self.state.titles.display_name(&opponent),
                self.state.store.get(&opponent)
            );
            match prompt("Winner: ")?.as_str() {
                "1" => session.vote(true, &self.state.store, &placement)?,
                "2" => session.vote(false, &self.state.store, &placement)?,
                "c" | "q" => {
                    println!("Session cancelled; nothing saved.");
                    return Ok(());
                }
                other => println!("Unrecognized input: {}", other),
            }
        }

        let summary = session.summary(&self.state.store, &placement);
        println!(
            "\nProvisional rating: {} — projected rank #{} (W-L {}-{}) — projected {}\u{2605}",
            summary.working_rating.to_string().bold(),
            summary.projected_rank,
            summary.wins,
            summary.losses,
            summary.projected_stars
        );

        if prompt("(s)ave or (d)iscard? ")?.as_str() == "s" {
            let key = session.key().clone();
            session.save(&mut self.state.store);
            self.state
                .titles
                .insert(key, title.trim().to_string(), year);
            self.state.persist()?;
            println!("Saved.");
        } else {
            println!("Discarded.");
        }
        Ok(())
    }

    // --- Read-only views ---

    pub fn print_leaderboard(&mut self, limit: usize) -> Result<()> {
        let rows = self.state.store.leaderboard(&self.state.titles);
        self.state.persist()?; // ensure_baseline may have repaired the snapshot

        println!(
            "{}",
            format!("{:>4}  {:<42} {:>5} {:>5} {:>4} {:>4}", "#", "Title", "Elo", "Δ", "W", "L").bold()
        );
        for row in rows.iter().take(limit) {
            println!(
                "{:>4}  {:<42} {:>5} {:>5} {:>4} {:>4}",
                row.rank,
                truncate(&row.title, 42),
                row.rating,
                signed(row.rank_delta),
                row.wins,
                row.losses
            );
        }
        Ok(())
    }

    pub fn print_stats(&self) {
        let history = self.state.store.history();
        if history.is_empty() {
            println!("No matches recorded yet.");
            return;
        }
        let titles = &self.state.titles;

        println!("{}", "Biggest upsets".bold());
        for row in analytics::biggest_upsets(history, 10) {
            println!(
                "  {} beat {}  (p={}, {})",
                titles.display_name(&row.winner),
                titles.display_name(&row.loser),
                pct(row.p_winner),
                signed(row.delta)
            );
        }

        println!("\n{}", "Biggest gains".bold());
        for row in analytics::biggest_gains(history, 10) {
            println!(
                "  {} {} vs {}",
                titles.display_name(&row.key),
                signed(row.delta).green(),
                titles.display_name(&row.opponent)
            );
        }

        println!("\n{}", "Biggest losses".bold());
        for row in analytics::biggest_losses(history, 10) {
            println!(
                "  {} {} vs {}",
                titles.display_name(&row.key),
                signed(row.delta).red(),
                titles.display_name(&row.opponent)
            );
        }

        let (win_streaks, loss_streaks) = analytics::compute_streaks(history, 10);
        println!("\n{}", "Longest win streaks".bold());
        for row in win_streaks {
            println!("  {} — {}", titles.display_name(&row.key), row.streak);
        }
        println!("\n{}", "Longest losing streaks".bold());
        for row in loss_streaks {
            println!("  {} — {}", titles.display_name(&row.key), row.streak);
        }

        println!("\n{}", "Most improved (last 50 games each)".bold());
        for row in analytics::most_improved(history, 50, 10) {
            println!(
                "  {} {} over {} games",
                titles.display_name(&row.key),
                signed(row.delta_sum),
                row.games
            );
        }

        println!("\n{}", "Recent matches".bold());
        for entry in analytics::recent_matches(history, 25) {
            println!(
                "  {}  {} beat {}  ({}, {}/{}, {})",
                entry.timestamp.format("%Y-%m-%d %H:%M"),
                titles.display_name(&entry.winner),
                titles.display_name(&entry.loser),
                pct(entry.p_winner),
                signed(entry.delta_winner),
                signed(entry.delta_loser),
                entry.mode.as_str()
            );
        }
    }

    pub fn export_history(&self, path: &Path) -> Result<()> {
        let history = self.state.store.history();
        if history.is_empty() {
            bail!("No matches recorded yet");
        }
        export::write_history_csv(path, history, &self.state.titles)?;
        println!("Wrote {} matches to {}", history.len(), path.display());
        Ok(())
    }

    pub fn reset(&mut self) -> Result<()> {
        self.state.reset()?;
        println!(
            "Ratings, history and recent-pair memory reset; {} movies re-seeded.",
            self.state.store.len()
        );
        Ok(())
    }

    fn require_dataset(&self) -> Result<()> {
        if !self.state.have_dataset() {
            bail!("Load data first: ingest your IMDb or Letterboxd CSV");
        }
        Ok(())
    }
}

/// Parse a `"Title (Year)"` query into its parts; a query without the year
/// suffix is all title.
pub fn parse_title_query(raw: &str) -> (String, Option<i32>) {
    let re = Regex::new(r"^(.*)\s+\((\d{4})\)$").expect("static regex");
    if let Some(caps) = re.captures(raw.trim()) {
        let title = caps[1].trim().to_string();
        let year = caps[2].parse::<i32>().ok();
        if !title.is_empty() {
            return (title, year);
        }
    }
    (raw.trim().to_string(), None)
}

fn prompt(text: &str) -> Result<String> {
    print!("{}", text);
    io::stdout().flush().context("Failed to flush stdout")?;
    let mut line = String::new();
    io::stdin()
        .read_line(&mut line)
        .context("Failed to read stdin")?;
    Ok(line.trim().to_lowercase())
}

fn pct(x: f64) -> String {
    format!("{:.1}%", x * 100.0)
}

fn signed(n: i32) -> String {
    if n > 0 {
        format!("+{}", n)
    } else {
        n.to_string()
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_query_with_year_suffix_splits() {
        assert_eq!(parse_title_query("Heat (1995)"), ("Heat".to_string(), Some(1995)));
        assert_eq!(
            parse_title_query("  The Thing (1982) "),
            ("The Thing".to_string(), Some(1982))
        );
    }

    #[test]
    fn title_query_without_year_stays_whole() {
        assert_eq!(parse_title_query("Heat"), ("Heat".to_string(), None));
        assert_eq!(parse_title_query("2001 (space odyssey"), ("2001 (space odyssey".to_string(), None));
    }

    #[test]
    fn formatting_helpers() {
        assert_eq!(pct(0.523), "52.3%");
        assert_eq!(signed(12), "+12");
        assert_eq!(signed(-7), "-7");
        assert_eq!(signed(0), "0");
    }
}
