//! # Depot Core
//!
//! Pure normalization logic for depot: parsing the upstream pipe-delimited
//! rules export, classifying sources, resolving supplements, grouping
//! wargear, resolving abilities, and aggregating everything into the
//! per-faction documents the web client reads.
//!
//! This crate performs no filesystem or network I/O and has no async
//! runtime dependency. The `depot` binary owns reading the raw tables and
//! writing the generated documents.
//!
//! ## Pipeline
//!
//! ```text
//! raw text ──▶ table::parse ──▶ build::Catalog ──▶ Catalog::build_faction ──▶ Faction
//!                                   │
//!            classify ◀─────────────┤
//!            supplement ◀───────────┤
//!            wargear / abilities ◀──┘
//! ```

pub mod abilities;
pub mod aggregate;
pub mod build;
pub mod classify;
pub mod error;
pub mod models;
pub mod roster;
pub mod supplement;
pub mod table;
pub mod util;
pub mod wargear;
