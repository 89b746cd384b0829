pub mod settings;
pub mod types;

pub use settings::{Settings, AI_FILTER_MAX_CHARS};
pub use types::{ClassificationMap, HiddenReason, HiddenRecord, HiddenVideosSnapshot, QueueSnapshot};
