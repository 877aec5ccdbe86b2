//! Keypoint conventions, joint remapping and visibility checks.

mod common;

pub mod convention;
pub mod error;
pub mod mapping;
pub mod visibility;

pub use convention::{Convention, ConventionTable};
pub use error::ConventionError;
pub use mapping::KeypointMapping;
pub use visibility::VisibilityFilter;
