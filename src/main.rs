use anyhow::Result;

use movie_elo_ranking::cli::Command;
use movie_elo_ranking::{
    handle_export, handle_ingest, handle_leaderboard, handle_place, handle_play, handle_quick,
    handle_reset, handle_serve, handle_stats, interpret,
};

fn main() {
    setup_logging();
    parse_and_execute().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(1);
    });
}

fn setup_logging() {
    sensible_env_logger::init!();
}

fn parse_and_execute() -> Result<()> {
    let command = interpret();
    execute_command(&command)
}

fn execute_command(command: &Command) -> Result<()> {
    match command {
        Command::Serve { port } => handle_serve(*port),
        Command::Ingest { file } => handle_ingest(file),
        Command::Play { rounds } => handle_play(*rounds),
        Command::Quick => handle_quick(),
        Command::Place { query } => handle_place(query),
        Command::Leaderboard { limit } => handle_leaderboard(*limit),
        Command::Stats => handle_stats(),
        Command::Export { output } => handle_export(output),
        Command::Reset { yes } => handle_reset(*yes),
    }
}
