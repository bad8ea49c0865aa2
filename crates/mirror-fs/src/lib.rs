//! Filesystem layer for Folder Mirror
//!
//! Content digests, source/replica path mapping and the atomic
//! copy/create/remove primitives the mirror engine is built on.

pub mod checksum;
pub mod config;
pub mod error;
pub mod io;
pub mod path;

pub use checksum::{compute_content_checksum, compute_file_checksum};
pub use config::ConfigStore;
pub use error::{Error, Result};
pub use io::RobustnessConfig;
pub use path::{RootPair, display_relative, resolve_root, roots_overlap};
