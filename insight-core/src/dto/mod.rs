//! Data Transfer Objects for inter-service communication
//!
//! This module contains the request and response bodies of the Insight HTTP API.

pub mod log;
