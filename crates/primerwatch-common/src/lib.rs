//! primerwatch-common: Shared types, errors, and traits used across all primerwatch crates.

pub mod error;
pub mod entities;
pub mod sequence;
pub mod fasta;
pub mod backend;

// Re-export commonly used types
pub use backend::{AuthProvider, Session, SurveillanceBackend};
pub use error::{ApiError, PrimerwatchError, Result};
