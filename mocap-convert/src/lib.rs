//! Conversion of 3DPW and MPI-INF-3DHP annotations into unified bundles.

mod common;

pub mod accumulator;
pub mod annotation;
pub mod config;
pub mod dataset;
pub mod decimate;
pub mod error;
pub mod npz;
pub mod record;
pub mod rotation;
pub mod sink;

pub use error::ConvertError;

use crate::{
    annotation::{BoxDeriver, Expansion, JointSelection},
    common::*,
    config::{Config, DatasetConfig, MpiInf3dhpSplit},
    dataset::{MpiInf3dhpConverter, Pw3dConverter},
    sink::{BundleSink, NpzSink},
};

/// Convert the configured dataset and write the bundles to the output directory.
pub fn start(config: Arc<Config>) -> Result<Vec<PathBuf>> {
    let mut sink = NpzSink::new(&config.output.dir);
    run(&config, &mut sink)
}

/// Convert the configured dataset splits one after another, handing each
/// bundle to `sink`. Returns the persisted locations in split order.
pub fn run<K>(config: &Config, sink: &mut K) -> Result<Vec<PathBuf>>
where
    K: BundleSink,
{
    let Config {
        dataset,
        bbox,
        keypoints,
        ..
    } = config;
    let scale_factor = bbox.scale_factor.raw();
    let mut outputs = vec![];

    match dataset {
        DatasetConfig::Pw3d { dataset_dir, modes } => {
            let expansion = if bbox.legacy_expansion {
                info!("using legacy bounding box expansion");
                Expansion::Legacy
            } else {
                Expansion::Linear
            };
            let deriver = BoxDeriver::new(scale_factor, JointSelection::Annotated, expansion)?;
            let converter = Pw3dConverter::new(deriver);

            for &split in modes {
                let bundle = converter
                    .convert_split(dataset_dir, split)
                    .with_context(|| format!("failed to convert 3DPW {} split", split.as_str()))?;
                let file_stem = format!("{}_{}", crate::dataset::PW3D_TAG, split.as_str());
                outputs.push(sink.persist(&file_stem, &bundle)?);
            }
        }
        DatasetConfig::MpiInf3dhp {
            dataset_dir,
            modes,
            extract_img,
            decimation,
        } => {
            if bbox.legacy_expansion {
                warn!("legacy bounding box expansion only applies to 3DPW, ignored");
            }

            let table: Cow<'_, ConventionTable> = match &keypoints.conventions_file {
                Some(path) => Cow::Owned(ConventionTable::open(path)?),
                None => Cow::Borrowed(ConventionTable::builtin()),
            };
            let [h, w] = keypoints.frame_size;
            let frame_size = HW::try_from_hw([h.raw(), w.raw()])?;
            let deriver = BoxDeriver::new(scale_factor, JointSelection::All, Expansion::Linear)?;
            let converter = MpiInf3dhpConverter::new(
                deriver,
                frame_size,
                &table,
                &keypoints.target_convention,
            )?;

            for &split in modes {
                let bundle = match split {
                    MpiInf3dhpSplit::Train => {
                        converter.convert_train(dataset_dir, *extract_img, *decimation)
                    }
                    MpiInf3dhpSplit::Test => converter.convert_test(dataset_dir),
                }
                .with_context(|| {
                    format!("failed to convert MPI-INF-3DHP {} split", split.as_str())
                })?;
                let file_stem = format!("{}_{}", crate::dataset::MPI_INF_3DHP_TAG, split.as_str());
                outputs.push(sink.persist(&file_stem, &bundle)?);
            }
        }
    }

    Ok(outputs)
}
