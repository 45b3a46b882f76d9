//! Shared value types for wheelpack.
//!
//! Everything in this crate is pure: no filesystem, no subprocesses. The
//! engine in `wheelpack-core` and the binary in `wheelpack-cli` both build on
//! these identities.

pub mod descriptor;
pub mod target;
pub mod types;

// Re-exports
pub use descriptor::{ArtifactDescriptor, ArtifactForm, ParseError, WheelTags};
pub use target::*;
pub use types::*;

/// File extension of a prebuilt wheel artifact.
pub const WHEEL_EXTENSION: &str = ".whl";

/// Source-distribution archive extensions understood by the filename parser.
pub const SOURCE_EXTENSIONS: [&str; 3] = [".tar.gz", ".tgz", ".zip"];
