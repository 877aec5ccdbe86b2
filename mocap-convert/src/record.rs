use crate::{common::*, error::ConvertError};

pub const NUM_BODY_JOINTS: usize = 23;
pub const NUM_BETAS: usize = 10;

/// Body model parameters of one person in one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct PoseParameters {
    global_orient: [f64; 3],
    body_pose: Array2<f64>,
    betas: Array1<f64>,
}

impl PoseParameters {
    /// Build from a root orientation, a `(23, 3)` body pose and 10 shape coefficients.
    pub fn new(
        global_orient: [f64; 3],
        body_pose: Array2<f64>,
        betas: Array1<f64>,
    ) -> Result<Self, ConvertError> {
        if body_pose.dim() != (NUM_BODY_JOINTS, 3) {
            return Err(ConvertError::malformed(
                "pose parameters",
                format!(
                    "body pose must have shape ({}, 3), but found {:?}",
                    NUM_BODY_JOINTS,
                    body_pose.shape()
                ),
            ));
        }
        if betas.len() != NUM_BETAS {
            return Err(ConvertError::malformed(
                "pose parameters",
                format!("expect {} betas, but found {}", NUM_BETAS, betas.len()),
            ));
        }

        Ok(Self {
            global_orient,
            body_pose,
            betas,
        })
    }

    pub fn global_orient(&self) -> [f64; 3] {
        self.global_orient
    }

    pub fn body_pose(&self) -> ArrayView2<'_, f64> {
        self.body_pose.view()
    }

    pub fn betas(&self) -> ArrayView1<'_, f64> {
        self.betas.view()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FrameAnnotation {
    /// `(J, 3)` 2D keypoints and `(J, 4)` root-relative 3D keypoints in meters.
    Keypoints {
        keypoints2d: Array2<f64>,
        keypoints3d: Array2<f64>,
    },
    Smpl {
        params: PoseParameters,
        gender: String,
    },
}

/// The converted annotation of one image.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameRecord {
    image_path: String,
    bbox: XYWH<f64>,
    annotation: FrameAnnotation,
}

impl FrameRecord {
    pub fn keypoints(
        image_path: impl Into<String>,
        bbox: XYWH<f64>,
        keypoints2d: Array2<f64>,
        keypoints3d: Array2<f64>,
    ) -> Result<Self, ConvertError> {
        let image_path = image_path.into();
        let (num_joints_2d, num_cols_2d) = keypoints2d.dim();
        let (num_joints_3d, num_cols_3d) = keypoints3d.dim();

        if num_cols_2d != 3 || num_cols_3d != 4 || num_joints_2d != num_joints_3d {
            return Err(ConvertError::malformed(
                &image_path,
                format!(
                    "expect (J, 3) 2D and (J, 4) 3D keypoints, but found {:?} and {:?}",
                    keypoints2d.shape(),
                    keypoints3d.shape()
                ),
            ));
        }

        Ok(Self {
            image_path,
            bbox,
            annotation: FrameAnnotation::Keypoints {
                keypoints2d,
                keypoints3d,
            },
        })
    }

    pub fn smpl(
        image_path: impl Into<String>,
        bbox: XYWH<f64>,
        params: PoseParameters,
        gender: impl Into<String>,
    ) -> Self {
        Self {
            image_path: image_path.into(),
            bbox,
            annotation: FrameAnnotation::Smpl {
                params,
                gender: gender.into(),
            },
        }
    }

    pub fn image_path(&self) -> &str {
        &self.image_path
    }

    pub fn bbox(&self) -> &XYWH<f64> {
        &self.bbox
    }

    pub fn annotation(&self) -> &FrameAnnotation {
        &self.annotation
    }
}
