//! Core types and shared functionality for swcache.
//!
//! This crate provides:
//! - Named, versioned cache stores with SQLite and in-memory backends
//! - Resource classes and the per-class strategy table
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod policy;

pub use cache::{CacheDb, CacheStorage, MemoryStorage, RequestKey, ResponseSnapshot, StoreKind, StoreSet};
pub use config::AppConfig;
pub use error::Error;
pub use policy::{Policy, ResourceClass, Strategy, StrategyTable};
