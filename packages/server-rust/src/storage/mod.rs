//! Document storage for the Bazaar server.
//!
//! - [`engines`]: concrete [`DocumentStore`](crate::traits::DocumentStore)
//!   implementations
//! - [`seed`]: bulk-loading documents from a JSON file at startup

pub mod engines;
pub mod seed;

pub use engines::*;
pub use seed::*;
