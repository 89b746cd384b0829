//! Feed filtering pipeline for video listing pages: keyword and AI
//! classification of video cards, with a native-messaging host that runs
//! the background side.

pub mod ai;
pub mod app;
pub mod background;
pub mod config;
pub mod dom;
pub mod domain;
pub mod filter;
pub mod host;
pub mod infrastructure;
pub mod protocol;
pub mod storage;
pub mod tasks;
