pub mod structs;

pub use structs::{keys, StateStore};
