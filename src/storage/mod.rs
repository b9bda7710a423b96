//! Storage layer for insysdb-cli
//!
//! Handles configuration management, credential files, and the on-disk
//! caches for tokens, dictionaries and header catalogs. Cache access goes
//! through the `CacheStore` trait so tests can swap in an in-memory store.

use crate::error::StorageError;

pub mod cache;
pub mod config;
pub mod credentials;

type Result<T> = std::result::Result<T, StorageError>;
