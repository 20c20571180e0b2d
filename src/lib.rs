//! tagsmith - version-file driven tags, changelogs and GitHub releases
//!
//! A repository keeps its current version on the first line of a version
//! file. A commit that changes that line is a release commit. tagsmith
//! reads the history around release commits to bump versions, write
//! changelogs and find changed paths, and turns a release commit into a
//! GitHub tag, release and set of assets.
//!
//! # Architecture
//!
//! The codebase follows a layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, formats output)
//! - [`versioning`] - History walks: mainline, changelog, change-set
//! - [`release`] - Release protocol, transfer pool and release queries
//! - [`core`] - Domain types: versions, identities, object ids, config
//! - [`git`] - Read-only history access
//! - [`forge`] - Abstraction for remote release hosting (GitHub)
//! - [`auth`] - Token resolution for the forge
//! - [`ui`] - Output helpers
//!
//! # Correctness Invariants
//!
//! 1. The local repository is only ever read
//! 2. Remote tags are never moved and assets are never overwritten
//! 3. Every release step checks remote state first, so releases can be
//!    re-run after a partial failure

pub mod auth;
pub mod cli;
pub mod core;
pub mod forge;
pub mod git;
pub mod release;
pub mod ui;
pub mod versioning;
