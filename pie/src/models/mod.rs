mod chapter;
mod entry;
mod group;

pub use chapter::*;
pub use entry::*;
pub use group::*;
