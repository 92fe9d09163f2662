//! Core types for printer tracking-dot analysis.
//!
//! This crate knows nothing about specific printer encodings. It provides the
//! toroidal [`BinaryMatrix`] a dot detector hands over, the rigid
//! [`Transform`] family the alignment search explores, and logger setup
//! shared by the higher-level crates.

mod logger;
mod matrix;
mod transform;

pub use logger::{init_from_env, init_with_level, LOG_ENV_VAR};
pub use matrix::{BinaryMatrix, MatrixError};
pub use transform::Transform;

#[cfg(feature = "tracing")]
pub use logger::init_tracing;
