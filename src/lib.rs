pub mod alignment;
pub mod backend;
pub mod clock;
pub mod collection;
pub mod error;
pub mod optimiser;
pub mod output;
pub mod partition;
pub mod scorer;
pub mod tree;

pub use error::{Result, TreeclustError};
pub use optimiser::{ChoosePolicy, Optimiser, SearchLimits, EPS};
pub use partition::Partition;
pub use scorer::PartitionScorer;

#[cfg(test)]
pub mod tests;
