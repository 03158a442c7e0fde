//! # Depot
//!
//! Turns the third-party pipe-delimited rules export into the normalized
//! `depot` JSON documents read by the web client.
//!
//! The algorithms live in [`depot_core`]; this crate owns configuration,
//! file I/O, logging, progress reporting, and the bounded worker pool.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌───────────────┐   ┌────────────────────┐
//! │ connector_fs │──▶│ depot_core    │──▶│ export             │
//! │ table files  │   │ Catalog/build │   │ factions/*.json    │
//! └──────────────┘   └───────────────┘   │ index.json         │
//!                                        └────────────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`logging`] | Tracing subscriber setup |
//! | [`progress`] | Generation progress on stderr |
//! | [`connector_fs`] | Locating and parsing table files |
//! | [`ingest`] | `depot generate` orchestration |
//! | [`export`] | JSON document writers and readers |
//! | [`tables`] | `depot tables` status listing |
//! | [`stats`] | `depot stats` output summary |
//! | [`share`] | Roster/collection share text |

pub mod config;
pub mod connector_fs;
pub mod export;
pub mod ingest;
pub mod logging;
pub mod progress;
pub mod share;
pub mod stats;
pub mod tables;
