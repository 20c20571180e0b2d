//! forge
//!
//! Abstraction for remote release hosting (GitHub).
//!
//! # Architecture
//!
//! The `Forge` trait defines the interface for tags, releases and assets on
//! a hosting service. Commands use the [`create_forge`] factory function
//! rather than importing specific forge implementations directly.
//!
//! # Modules
//!
//! - `traits`: Core `Forge` trait and request/response types
//! - [`github`]: GitHub implementation using the REST API
//! - [`mock`]: Mock implementation for deterministic testing
//! - `factory`: Forge creation
//!
//! # Example
//!
//! ```ignore
//! use tagsmith::forge::{create_forge, Forge};
//!
//! let forge = create_forge(provider, "https://api.github.com", "octocat", "hello");
//! for tag in forge.list_tags().await? {
//!     println!("{}", tag);
//! }
//! ```

mod factory;
pub mod github;
pub mod mock;
mod traits;

pub use factory::create_forge;
pub use traits::*;
