//! Scoop Core - Domain types for the catalog API.
//!
//! This crate provides the types shared by every Scoop component:
//! - `api` - The catalog/customer REST server
//! - `cli` - Migrations and demo data seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure calculations - no I/O, no
//! database access, no HTTP. Anything that needs a clock receives "now" as an
//! argument so results stay deterministic.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, emails, roles, discount windows and bundle pricing

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
