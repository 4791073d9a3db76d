pub mod backends;
pub mod traits;

pub use backends::{InMemoryStore, JsonFileStore};
pub use traits::*;
