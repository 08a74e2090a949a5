//! Cooccurrence - Literature co-occurrence TRAPI service
//!
//! Answers TRAPI queries by computing co-occurrence statistics between
//! text-mined biomedical concepts, rolled up through the concept hierarchy.

pub mod cache;
pub mod cli;
pub mod config;
pub mod context;
pub mod di;
pub mod error;
pub mod models;
pub mod repositories;
pub mod services;
pub mod trapi;

// Re-export FromRef at crate root for di-macros generated code
pub use di::FromRef;
