//! Core domain types
//!
//! This module contains the core domain structures used across Insight services.
//! These types are shared between the server (which produces and stores logs)
//! and the dashboard (which aggregates them).

pub mod log;
pub mod stats;
