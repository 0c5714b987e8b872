//! Tekwatch Core
//!
//! Core types for following Tekton pipeline runs.
//!
//! This crate contains:
//! - Domain types: the slices of the Tekton REST objects the watcher reads
//!   (pipeline runs, task runs, steps)
//! - Log state: per-container bookkeeping used to emit only new log text

pub mod domain;
