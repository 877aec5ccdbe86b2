use crate::common::*;

#[derive(Debug, Error)]
pub enum ConventionError {
    #[error("unknown keypoint convention '{0}'")]
    UnknownConvention(String),
    #[error("convention '{convention}' lists joint '{joint}' more than once")]
    DuplicateJoint { convention: String, joint: String },
    #[error("convention '{0}' has no joints")]
    EmptyConvention(String),
    #[error("expect {expected} joints for convention '{convention}', but found {found}")]
    JointCountMismatch {
        convention: String,
        expected: usize,
        found: usize,
    },
    #[error("failed to read convention table '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse convention table: {0}")]
    Parse(#[from] json5::Error),
}
