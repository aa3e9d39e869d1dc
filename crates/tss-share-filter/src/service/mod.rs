//! Service Layer
//!
//! Application services that orchestrate domain logic and report through
//! tracing and metrics.

pub mod tagging_service;

pub use tagging_service::TaggingService;
