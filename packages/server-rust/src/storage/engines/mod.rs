//! Concrete [`DocumentStore`](crate::traits::DocumentStore) engines.

pub mod hashmap;

pub use hashmap::HashMapDocumentStore;
