pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod fetchers;
pub mod rating;
pub mod services;
pub mod storage;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use std::path::Path;

use crate::cli::Command;
use crate::config::settings::AppConfig;
use crate::fetchers::tmdb::TmdbClient;
use crate::services::arena::{parse_title_query, ArenaService};
use crate::services::ingestion::IngestionService;
use crate::services::server::ServerService;
use crate::services::state::EngineState;

pub fn interpret() -> Command {
    let cli = Cli::parse();
    cli.command
}

pub fn handle_serve(port: u16) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let config = AppConfig::new();
        let service = ServerService::new(port, config);
        service.run().await
    })
}

pub fn handle_ingest(file: &Path) -> Result<()> {
    let config = AppConfig::new();
    let service = IngestionService::new(&config)?;
    service.run(file)
}

pub fn handle_play(rounds: Option<u32>) -> Result<()> {
    let mut arena = load_arena()?;
    arena.run_duels(rounds)
}

pub fn handle_quick() -> Result<()> {
    let mut arena = load_arena()?;
    arena.run_quick()
}

pub fn handle_place(query: &str) -> Result<()> {
    let config = AppConfig::new();
    let (mut title, mut year) = parse_title_query(query);

    // Fuzzy title search is assist-only: without a key or a hit, the typed
    // title stands as-is.
    if year.is_none() {
        if let Some(client) = TmdbClient::new(&config.tmdb)? {
            let runtime = tokio::runtime::Runtime::new()?;
            let hits = runtime.block_on(client.search_movies(&title));
            if let Some(hit) = hits.first() {
                title = hit.title.clone();
                year = hit.year;
            }
        }
    }

    let state = EngineState::load(config)?;
    let mut arena = ArenaService::new(state);
    arena.run_placement(&title, year)
}

pub fn handle_leaderboard(limit: usize) -> Result<()> {
    let mut arena = load_arena()?;
    arena.print_leaderboard(limit)
}

pub fn handle_stats() -> Result<()> {
    let arena = load_arena()?;
    arena.print_stats();
    Ok(())
}

pub fn handle_export(output: &Path) -> Result<()> {
    let arena = load_arena()?;
    arena.export_history(output)
}

pub fn handle_reset(yes: bool) -> Result<()> {
    if !yes {
        println!(
            "This clears Elo ratings, wins/losses, history and recent-pair memory \
             (your CSV stays loaded). Re-run with --yes to confirm."
        );
        return Ok(());
    }
    let mut arena = load_arena()?;
    arena.reset()
}

fn load_arena() -> Result<ArenaService> {
    let config = AppConfig::new();
    let state = EngineState::load(config)?;
    Ok(ArenaService::new(state))
}
