//! Service Module
//!
//! Business logic layer for the server.
//! Services orchestrate between the generator, processing and the store.

pub mod generator;
pub mod log;
pub mod scheduler;

// Re-export for convenience
pub use log as log_service;
