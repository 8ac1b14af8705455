//! Line schedule server.
//!
//! A web service that answers two questions about a transit line:
//! "when does it run today?" and "is it running right now?", backed by
//! an unreliable upstream API through a memory-plus-SQLite cache.

pub mod cache;
pub mod domain;
pub mod pool;
pub mod resolver;
pub mod status;
pub mod store;
pub mod topology;
pub mod upstream;
pub mod web;
pub mod window;
