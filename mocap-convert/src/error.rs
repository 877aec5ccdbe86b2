use crate::common::*;
use keypoint::ConventionError;

/// Failures that the converter distinguishes from one another.
///
/// Only [ConvertError::EmptyKeypointSet] is recoverable: the frame is
/// dropped and the run goes on. Everything else aborts before the bundle of
/// the split is written.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("annotation file '{}' is missing or unreadable: {reason}", path.display())]
    MissingAnnotationFile { path: PathBuf, reason: String },
    #[error("malformed record in {context}: {reason}")]
    MalformedRecord { context: String, reason: String },
    #[error("no annotated joint to derive a bounding box for '{image_path}'")]
    EmptyKeypointSet { image_path: String },
    #[error("unsupported keypoint convention: {0}")]
    UnsupportedConvention(#[from] ConventionError),
}

impl ConvertError {
    pub fn missing(path: impl Into<PathBuf>, reason: impl Display) -> Self {
        Self::MissingAnnotationFile {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn malformed(context: impl Display, reason: impl Display) -> Self {
        Self::MalformedRecord {
            context: context.to_string(),
            reason: reason.to_string(),
        }
    }
}
