//! Scheduler layer for the watcher
//!
//! Sequences lookups and poll cycles of a single watch session and decides
//! when it ends.

pub mod watcher;

pub use watcher::{RunWatcher, WatchSettings};
