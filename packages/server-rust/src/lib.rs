//! Bazaar server: schema loading, the listing service, listing observers and
//! the axum JSON surface over an in-memory document store.

pub mod network;
pub mod observers;
pub mod schema_loader;
pub mod service;
pub mod storage;
pub mod traits;

pub use traits::DocumentStore;
