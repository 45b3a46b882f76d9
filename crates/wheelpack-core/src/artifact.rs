//! Artifacts handed from acquisition to installation.

use std::path::{Path, PathBuf};
use wheelpack_schema::{ArtifactDescriptor, ParseError};

/// An installable wheel on disk together with the identity parsed from its name.
///
/// Owned by whichever step produced it until installation consumes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Location of the wheel file.
    pub path: PathBuf,
    /// Identity parsed from the filename.
    pub descriptor: ArtifactDescriptor,
}

impl Artifact {
    /// Build an artifact from a path, parsing its filename.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] if the filename is not a recognized artifact name.
    pub fn from_path(path: &Path) -> Result<Self, ParseError> {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let descriptor = ArtifactDescriptor::parse(&filename)?;
        Ok(Self {
            path: path.to_path_buf(),
            descriptor,
        })
    }

    /// The artifact's filename.
    pub fn filename(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}
