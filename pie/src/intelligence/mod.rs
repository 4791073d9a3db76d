pub mod aggregator;
pub mod associator;
pub mod atomizer;
pub mod lexicon;
pub mod themes;
pub mod utils;

pub use aggregator::Aggregator;
pub use associator::{Association, Associator};
pub use atomizer::Atomizer;
pub use themes::{ThemeBank, ThemeDefinition};
