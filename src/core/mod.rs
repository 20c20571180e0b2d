//! core
//!
//! Core domain types and configuration for tagsmith.
//!
//! # Modules
//!
//! - [`types`] - Strong types: Oid
//! - [`version`] - Versions embedded in text, ordering and bumping
//! - [`ident`] - Release identity strings (`org/repo@tag:asset`)
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Schemas are strict and self-describing
//! - Defaults are explicit values, never process globals

pub mod config;
pub mod ident;
pub mod types;
pub mod version;
