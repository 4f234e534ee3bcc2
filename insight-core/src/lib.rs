//! Insight Core
//!
//! Core types and the aggregation engine for the Insight log analytics pipeline.
//!
//! This crate contains:
//! - Domain types: log records, stored documents and aggregate statistics
//! - DTOs: wire shapes exchanged between the server, client and dashboard
//! - Aggregation: snapshot ingestion, statistics recomputation and the
//!   trailing-hour error histogram
//! - Feed: the live collection subscription abstraction
//! - Processing: payload validation and anomaly flagging before storage

pub mod aggregate;
pub mod domain;
pub mod dto;
pub mod feed;
pub mod processing;
pub mod time;
