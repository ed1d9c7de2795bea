//! Vector store implementations for Groundwire.

pub mod http;
pub mod in_memory;

pub use http::HttpVectorStore;
pub use in_memory::InMemoryStore;
