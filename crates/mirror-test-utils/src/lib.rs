//! Shared test utilities for the folder-mirror workspace.
//!
//! This crate provides standardised fixtures to eliminate duplication
//! across crate test suites. It is a dev-dependency only and is never published.
//!
//! # Modules
//!
//! - [`tree`]: [`TestTree`] builder for source/replica directory pairs

pub mod tree;

pub use tree::{TestTree, snapshot};
