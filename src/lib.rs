//! HITRAN XSC Library
//!
//! Local caching and querying of HITRAN absorption cross-section metadata.
//! Metadata is fetched once from the HITRAN API, kept on disk with an expiry,
//! and served from an in-memory registry that can be filtered by wavenumber,
//! pressure and temperature.

pub mod app;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;
pub mod prelude;

// Re-export commonly used types for convenience
pub use errors::{AppError, Result};
