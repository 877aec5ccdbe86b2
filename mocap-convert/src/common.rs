//! Common imports from external crates.

pub use anyhow::{bail, ensure, format_err, Context, Error, Result};
pub use bbox::{prelude::*, CyCxHW, HW, TLBR, XYWH};
pub use itertools::Itertools;
pub use keypoint::{ConventionTable, KeypointMapping, VisibilityFilter};
pub use log::{debug, info, warn};
pub use ndarray::{
    s, Array, Array1, Array2, Array3, Array4, ArrayD, ArrayView1, ArrayView2, ArrayView3, Axis,
    Dimension,
};
pub use noisy_float::prelude::*;
pub use serde::{Deserialize, Serialize};
pub use std::{
    borrow::Cow,
    fmt::{self, Debug, Display},
    fs,
    num::NonZeroUsize,
    path::{Path, PathBuf},
    sync::Arc,
};
