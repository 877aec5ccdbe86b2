pub use bbox::HW;
pub use indexmap::{IndexMap, IndexSet};
pub use log::{debug, warn};
pub use ndarray::{s, Array1, Array3, ArrayView2, ArrayView3, Axis};
pub use once_cell::sync::Lazy;
pub use std::{
    fs,
    path::{Path, PathBuf},
};
pub use thiserror::Error;
