//! Client library for the Olog electronic logbook service.
//!
//! # Overview
//! Olog keeps operator log entries for accelerator and experiment
//! facilities, organized into logbooks and decorated with tags, free-form
//! properties, and file attachments. This crate talks to its REST API:
//! listing and upserting logbooks, tags, and properties, searching and
//! fetching log entries, and moving attachments in both directions.
//!
//! # Design
//! - `OlogClient` builds `HttpRequest` values and parses `HttpResponse`
//!   values without touching the network (host-does-IO pattern), so every
//!   protocol rule is unit-testable.
//! - `BlockingClient` wraps it with a persistent `ureq` agent for callers
//!   that want method-per-operation round-trips.
//! - Single-object puts compare the server's echo against the submission;
//!   a write the server acknowledged but did not persist is an error.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.
//!
//! Timestamps in search queries accept several human conventions and are
//! normalized to the service's canonical `YYYY-MM-DD HH:MM:SS.mmm` form by
//! [`ensure_time`].

pub mod blocking;
pub mod client;
pub mod error;
pub mod http;
pub mod time;
pub mod types;

pub use blocking::BlockingClient;
pub use client::OlogClient;
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use time::{ensure_time, Timestamp, CANONICAL_FORMAT};
pub use types::{Attribute, LogEntry, Logbook, LogsQuery, NewAttachment, Property, Tag};
