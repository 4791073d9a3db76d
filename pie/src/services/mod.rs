mod grouping;
mod pie;

pub use grouping::{default_grouping_bank, GroupingService};
pub use pie::{PieEngine, ProcessOutcome, RebuildOutcome, SkippedEntry};
