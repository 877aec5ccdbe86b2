//! Collects frame records and materializes them into columnar bundles.

use crate::{
    common::*,
    error::ConvertError,
    record::{FrameAnnotation, FrameRecord, NUM_BETAS, NUM_BODY_JOINTS},
};

/// Columns specific to the kind of annotation in a bundle.
#[derive(Debug, Clone, PartialEq)]
pub enum BundleBody {
    Smpl {
        /// `(N, 3)`
        global_orient: Array2<f64>,
        /// `(N, 23, 3)`
        body_pose: Array3<f64>,
        /// `(N, 10)`
        betas: Array2<f64>,
        gender: Vec<String>,
    },
    Keypoints {
        /// `(N, J, 3)`
        keypoints2d: Array3<f64>,
        /// `(N, J, 4)`
        keypoints3d: Array3<f64>,
        /// `(J,)`, true for joints populated from the source data.
        mask: Array1<bool>,
    },
}

/// The converted annotations of one dataset split.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetBundle {
    pub config: String,
    pub image_path: Vec<String>,
    /// `(N, 5)` rows of `[x, y, w, h, 1.0]`.
    pub bbox_xywh: Array2<f64>,
    pub body: BundleBody,
}

impl DatasetBundle {
    pub fn len(&self) -> usize {
        self.image_path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.image_path.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordAccumulator {
    records: Vec<FrameRecord>,
}

impl RecordAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: FrameRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[FrameRecord] {
        &self.records
    }

    pub fn into_smpl_bundle(self, tag: &str) -> Result<DatasetBundle, ConvertError> {
        let num_records = self.records.len();
        let mut global_orient = Array2::zeros((num_records, 3));
        let mut body_pose = Array3::zeros((num_records, NUM_BODY_JOINTS, 3));
        let mut betas = Array2::zeros((num_records, NUM_BETAS));
        let mut gender = Vec::with_capacity(num_records);

        for (index, record) in self.records.iter().enumerate() {
            let (params, record_gender) = match record.annotation() {
                FrameAnnotation::Smpl { params, gender } => (params, gender),
                FrameAnnotation::Keypoints { .. } => {
                    return Err(ConvertError::malformed(
                        record.image_path(),
                        "keypoint record in a body model bundle",
                    ))
                }
            };

            global_orient
                .row_mut(index)
                .assign(&ArrayView1::from(&params.global_orient()));
            body_pose
                .index_axis_mut(Axis(0), index)
                .assign(&params.body_pose());
            betas.row_mut(index).assign(&params.betas());
            gender.push(record_gender.clone());
        }

        let (image_path, bbox_xywh) = Self::common_columns(&self.records);

        Ok(DatasetBundle {
            config: tag.to_owned(),
            image_path,
            bbox_xywh,
            body: BundleBody::Smpl {
                global_orient,
                body_pose,
                betas,
                gender,
            },
        })
    }

    /// Stack keypoint records and remap them onto the target convention.
    pub fn into_keypoint_bundle(
        self,
        tag: &str,
        mapping: &KeypointMapping,
    ) -> Result<DatasetBundle, ConvertError> {
        let num_records = self.records.len();
        let num_joints = mapping.num_source_joints();
        let mut keypoints2d = Array3::zeros((num_records, num_joints, 3));
        let mut keypoints3d = Array3::zeros((num_records, num_joints, 4));

        for (index, record) in self.records.iter().enumerate() {
            let (record_2d, record_3d) = match record.annotation() {
                FrameAnnotation::Keypoints {
                    keypoints2d,
                    keypoints3d,
                } => (keypoints2d, keypoints3d),
                FrameAnnotation::Smpl { .. } => {
                    return Err(ConvertError::malformed(
                        record.image_path(),
                        "body model record in a keypoint bundle",
                    ))
                }
            };

            if record_2d.nrows() != num_joints {
                return Err(ConvertError::malformed(
                    record.image_path(),
                    format!(
                        "convention '{}' has {} joints, but the record has {}",
                        mapping.source(),
                        num_joints,
                        record_2d.nrows()
                    ),
                ));
            }

            keypoints2d
                .index_axis_mut(Axis(0), index)
                .assign(record_2d);
            keypoints3d
                .index_axis_mut(Axis(0), index)
                .assign(record_3d);
        }

        let keypoints2d = mapping.remap(keypoints2d.view())?;
        let keypoints3d = mapping.remap(keypoints3d.view())?;
        let (image_path, bbox_xywh) = Self::common_columns(&self.records);

        Ok(DatasetBundle {
            config: tag.to_owned(),
            image_path,
            bbox_xywh,
            body: BundleBody::Keypoints {
                keypoints2d,
                keypoints3d,
                mask: mapping.mask().clone(),
            },
        })
    }

    fn common_columns(records: &[FrameRecord]) -> (Vec<String>, Array2<f64>) {
        let image_path = records
            .iter()
            .map(|record| record.image_path().to_owned())
            .collect();

        let mut bbox_xywh = Array2::zeros((records.len(), 5));
        records.iter().enumerate().for_each(|(index, record)| {
            let row = record.bbox().to_row_with_score(1.0);
            bbox_xywh.row_mut(index).assign(&ArrayView1::from(&row));
        });

        (image_path, bbox_xywh)
    }
}
