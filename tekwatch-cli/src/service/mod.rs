//! Service layer for the watcher
//!
//! Finding the pipeline run and following its logs. Everything here talks to
//! the API through the `PipelineApi` trait only.

pub mod locator;
pub mod resolver;
pub mod tailer;

pub use locator::RunLocator;
pub use resolver::EndpointResolver;
pub use tailer::LogTailer;
