pub mod config;
pub mod error;

// Recipe language and corpus
pub mod cookbook;
pub mod recipe;
pub mod search;

// Presentation
pub mod api;
pub mod format;

pub mod cli;

// Re-exports
pub use config::Settings;
pub use cookbook::{Cookbook, CookbookStore};
pub use error::{Error, LoadError, Result};
pub use recipe::Recipe;
pub use search::Query;
