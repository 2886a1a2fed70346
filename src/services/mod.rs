pub mod arena;
pub mod export;
pub mod ingestion;
pub mod server;
pub mod state;
