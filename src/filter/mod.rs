pub mod cache;
pub mod engine;
pub mod extract;
pub mod keywords;
pub mod ledger;
pub mod tracker;
pub mod visibility;

pub use engine::{BatchId, BatchJob, FilterEngine};
pub use tracker::ElementState;
