pub mod models;
pub mod sources;

pub use models::{movie_key, MovieRow, TitleIndex};
pub use sources::DataSource;
