//! Conversion program configuration format.

use crate::common::*;
use once_cell::sync::Lazy;
use semver::{Version, VersionReq};
use serde::{de::Error as _, Deserializer};

pub use bbox_options::*;
pub use dataset::*;
pub use keypoints::*;
pub use output::*;

pub static CONFIG_VERSION: Lazy<VersionReq> = Lazy::new(|| VersionReq::parse("0.1.0").unwrap());

/// The main conversion configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(deserialize_with = "deserialize_version")]
    pub version: Version,
    pub dataset: DatasetConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub bbox: BboxConfig,
    #[serde(default)]
    pub keypoints: KeypointsConfig,
}

impl Config {
    pub fn open<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let text = fs::read_to_string(path)?;
        let config = json5::from_str(&text)?;
        Ok(config)
    }
}

mod dataset {
    use super::*;

    /// Variants of dataset and options.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    #[serde(tag = "type")]
    pub enum DatasetConfig {
        /// 3D Poses in the Wild dataset options.
        Pw3d {
            dataset_dir: PathBuf,
            #[serde(default = "default_pw3d_modes")]
            modes: Vec<Pw3dSplit>,
        },
        /// MPI-INF-3DHP dataset options.
        MpiInf3dhp {
            dataset_dir: PathBuf,
            #[serde(default = "default_mpi_modes")]
            modes: Vec<MpiInf3dhpSplit>,
            /// Decode the training videos into frame images before converting.
            #[serde(default)]
            extract_img: bool,
            /// Keep one in this many training frames passing the visibility check.
            #[serde(default = "default_decimation")]
            decimation: NonZeroUsize,
        },
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum Pw3dSplit {
        Train,
        Validation,
        Test,
    }

    impl Pw3dSplit {
        pub fn as_str(&self) -> &'static str {
            match self {
                Self::Train => "train",
                Self::Validation => "validation",
                Self::Test => "test",
            }
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum MpiInf3dhpSplit {
        Train,
        Test,
    }

    impl MpiInf3dhpSplit {
        pub fn as_str(&self) -> &'static str {
            match self {
                Self::Train => "train",
                Self::Test => "test",
            }
        }
    }

    fn default_pw3d_modes() -> Vec<Pw3dSplit> {
        vec![Pw3dSplit::Train, Pw3dSplit::Test]
    }

    fn default_mpi_modes() -> Vec<MpiInf3dhpSplit> {
        vec![MpiInf3dhpSplit::Train, MpiInf3dhpSplit::Test]
    }

    fn default_decimation() -> NonZeroUsize {
        NonZeroUsize::new(10).unwrap()
    }
}

mod output {
    use super::*;

    /// Output options.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct OutputConfig {
        /// The directory where annotation bundles are written. Created if absent.
        pub dir: PathBuf,
    }
}

mod bbox_options {
    use super::*;

    /// Bounding box derivation options.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct BboxConfig {
        /// The factor the tight keypoint box is enlarged by.
        #[serde(default = "default_scale_factor")]
        pub scale_factor: R64,
        /// Reproduce the box layout of previously released 3DPW annotations.
        #[serde(default)]
        pub legacy_expansion: bool,
    }

    impl Default for BboxConfig {
        fn default() -> Self {
            Self {
                scale_factor: default_scale_factor(),
                legacy_expansion: false,
            }
        }
    }

    fn default_scale_factor() -> R64 {
        r64(1.2)
    }
}

mod keypoints {
    use super::*;

    /// Keypoint convention options.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct KeypointsConfig {
        /// Optional convention table replacing the built-in one.
        pub conventions_file: Option<PathBuf>,
        #[serde(default = "default_target_convention")]
        pub target_convention: String,
        /// Image height and width used by the visibility check.
        #[serde(default = "default_frame_size")]
        pub frame_size: [R64; 2],
    }

    impl Default for KeypointsConfig {
        fn default() -> Self {
            Self {
                conventions_file: None,
                target_convention: default_target_convention(),
                frame_size: default_frame_size(),
            }
        }
    }

    fn default_target_convention() -> String {
        "smplx".into()
    }

    fn default_frame_size() -> [R64; 2] {
        [r64(2048.0), r64(2048.0)]
    }
}

pub fn deserialize_version<'de, D>(deserializer: D) -> Result<Version, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    let version = Version::parse(&text).map_err(|err| {
        D::Error::custom(format!(
            "failed to parse version number '{}': {:?}",
            text, err
        ))
    })?;

    if !CONFIG_VERSION.matches(&version) {
        return Err(D::Error::custom(format!(
            "incompatible version: get '{}', but it is incompatible with requirement '{}'",
            version, &*CONFIG_VERSION,
        )));
    }

    Ok(version)
}
