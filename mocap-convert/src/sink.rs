//! Persistence of dataset bundles.

use crate::{
    accumulator::{BundleBody, DatasetBundle},
    common::*,
    npz::encode_strings,
};
use ndarray_npy::NpzWriter;
use std::fs::File;

/// Destination of converted bundles.
pub trait BundleSink {
    /// Store the bundle under the name `file_stem` and return where it went.
    fn persist(&mut self, file_stem: &str, bundle: &DatasetBundle) -> Result<PathBuf>;
}

/// Writes each bundle to a compressed `.npz` archive in a directory.
#[derive(Debug, Clone)]
pub struct NpzSink {
    dir: PathBuf,
}

impl NpzSink {
    pub fn new<P>(dir: P) -> Self
    where
        P: AsRef<Path>,
    {
        Self {
            dir: dir.as_ref().to_owned(),
        }
    }
}

impl BundleSink for NpzSink {
    /// The archive is assembled under a `.partial` name and renamed into
    /// place once complete, so `{file_stem}.npz` never holds a truncated bundle.
    fn persist(&mut self, file_stem: &str, bundle: &DatasetBundle) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir).with_context(|| {
            format!("failed to create output directory '{}'", self.dir.display())
        })?;

        let path = self.dir.join(format!("{}.npz", file_stem));
        let partial_path = self.dir.join(format!("{}.npz.partial", file_stem));

        if let Err(err) = write_npz(&partial_path, bundle) {
            if partial_path.is_file() {
                let _ = fs::remove_file(&partial_path);
            }
            return Err(err.context(format!("failed to write '{}'", path.display())));
        }
        fs::rename(&partial_path, &path).with_context(|| {
            format!(
                "failed to move '{}' to '{}'",
                partial_path.display(),
                path.display()
            )
        })?;
        info!("{} records written to '{}'", bundle.len(), path.display());

        Ok(path)
    }
}

fn write_npz(path: &Path, bundle: &DatasetBundle) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("failed to create '{}'", path.display()))?;
    let mut writer = NpzWriter::new_compressed(file);

    let DatasetBundle {
        config,
        image_path,
        bbox_xywh,
        body,
    } = bundle;

    writer.add_array("image_path", &encode_strings(image_path))?;
    writer.add_array("bbox_xywh", bbox_xywh)?;
    writer.add_array("config", &encode_strings(&[config]).row(0).to_owned())?;

    match body {
        BundleBody::Smpl {
            global_orient,
            body_pose,
            betas,
            gender,
        } => {
            writer.add_array("smpl.global_orient", global_orient)?;
            writer.add_array("smpl.body_pose", body_pose)?;
            writer.add_array("smpl.betas", betas)?;
            writer.add_array("meta.gender", &encode_strings(gender))?;
        }
        BundleBody::Keypoints {
            keypoints2d,
            keypoints3d,
            mask,
        } => {
            writer.add_array("keypoints2d", keypoints2d)?;
            writer.add_array("keypoints3d", keypoints3d)?;
            writer.add_array("mask", mask)?;
        }
    }

    writer.finish()?;
    Ok(())
}
