//! Personal intelligence engine: turns journal entries into keywords,
//! entities and emotions, clusters them into relationship and theme
//! chapters, and derives storylines and a focus list from the result.

pub mod config;
pub mod db;
pub mod error;
pub mod intelligence;
pub mod models;
pub mod services;

pub use config::PieConfig;
pub use error::{PieError, Result};
pub use services::{GroupingService, PieEngine, ProcessOutcome, RebuildOutcome, SkippedEntry};
