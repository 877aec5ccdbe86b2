//! Bounding boxes derived from 2D keypoints.

use crate::{common::*, error::ConvertError};

/// Which joints take part in the enclosing box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JointSelection {
    /// Joints with a positive confidence in the third column.
    Annotated,
    /// Every joint regardless of confidence.
    All,
}

/// How the tight box is grown by the scale factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expansion {
    /// Width and height are multiplied by the factor around a fixed center.
    Linear,
    /// Bit-compatible with previously released 3DPW annotations.
    ///
    /// The height is measured from the smallest x instead of the smallest y,
    /// the corner moves by the factor about the tight center and the size is
    /// multiplied by the squared factor. Heights may come out negative.
    Legacy,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoxDeriver {
    scale_factor: f64,
    selection: JointSelection,
    expansion: Expansion,
}

impl BoxDeriver {
    pub fn new(scale_factor: f64, selection: JointSelection, expansion: Expansion) -> Result<Self> {
        ensure!(
            scale_factor.is_finite() && scale_factor > 0.0,
            "bounding box scale factor must be positive, but get {}",
            scale_factor
        );
        Ok(Self {
            scale_factor,
            selection,
            expansion,
        })
    }

    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    pub fn selection(&self) -> JointSelection {
        self.selection
    }

    pub fn expansion(&self) -> Expansion {
        self.expansion
    }

    /// Derive the expanded box of one frame.
    ///
    /// `keypoints` holds one `(x, y, ..)` row per joint, with the confidence
    /// in the third column when joints are selected by annotation.
    pub fn derive(
        &self,
        keypoints: ArrayView2<f64>,
        image_path: &str,
    ) -> Result<XYWH<f64>, ConvertError> {
        let tight = self.enclosing(keypoints, image_path)?;

        let bbox = match self.expansion {
            Expansion::Linear => {
                let expanded = CyCxHW::from(&tight)
                    .try_scale(self.scale_factor)
                    .map_err(|err| ConvertError::malformed(image_path, err))?;
                XYWH::from(&expanded)
            }
            Expansion::Legacy => {
                let s = self.scale_factor;
                let [min_y, min_x, max_y, max_x] = tight.tlbr();
                let w = max_x - min_x;
                let h = max_y - min_x;
                let cx = min_x + w / 2.0;
                let cy = min_y + h / 2.0;
                XYWH::from_raw_xywh([
                    s * (min_x - cx) + cx,
                    s * (min_y - cy) + cy,
                    w * s * s,
                    h * s * s,
                ])
            }
        };

        Ok(bbox)
    }

    fn enclosing(
        &self,
        keypoints: ArrayView2<f64>,
        image_path: &str,
    ) -> Result<TLBR<f64>, ConvertError> {
        let num_cols = keypoints.ncols();
        let min_cols = match self.selection {
            JointSelection::Annotated => 3,
            JointSelection::All => 2,
        };
        if num_cols < min_cols {
            return Err(ConvertError::malformed(
                image_path,
                format!(
                    "expect at least {} keypoint columns, but found {}",
                    min_cols, num_cols
                ),
            ));
        }

        let points: Vec<[f64; 2]> = keypoints
            .outer_iter()
            .filter(|joint| match self.selection {
                JointSelection::Annotated => joint[2] > 0.0,
                JointSelection::All => true,
            })
            .map(|joint| [joint[0], joint[1]])
            .collect();

        if points.iter().flatten().any(|value| !value.is_finite()) {
            return Err(ConvertError::malformed(
                image_path,
                "keypoint coordinates must be finite",
            ));
        }

        TLBR::try_enclosing(points).ok_or_else(|| ConvertError::EmptyKeypointSet {
            image_path: image_path.to_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn keypoints() -> Array2<f64> {
        array![
            [10.0, 40.0, 1.0],
            [30.0, 20.0, 1.0],
            [20.0, 80.0, 0.5],
            [500.0, 500.0, 0.0],
            [-90.0, 3.0, -1.0],
        ]
    }

    #[test]
    fn box_contains_visible_joints() {
        let keypoints = keypoints();
        for &scale in &[1.0, 1.2, 2.0] {
            let deriver =
                BoxDeriver::new(scale, JointSelection::Annotated, Expansion::Linear).unwrap();
            let bbox = deriver.derive(keypoints.view(), "img.jpg").unwrap();

            keypoints
                .outer_iter()
                .filter(|joint| joint[2] > 0.0)
                .for_each(|joint| assert!(bbox.contains_point(joint[0], joint[1])));
        }
    }

    #[test]
    fn unit_scale_is_tight_box() {
        let deriver = BoxDeriver::new(1.0, JointSelection::Annotated, Expansion::Linear).unwrap();
        let bbox = deriver.derive(keypoints().view(), "img.jpg").unwrap();
        assert_eq!(bbox.xywh(), [10.0, 20.0, 20.0, 60.0]);
    }

    #[test]
    fn linear_expansion_keeps_center() {
        let deriver = BoxDeriver::new(1.2, JointSelection::Annotated, Expansion::Linear).unwrap();
        let bbox = deriver.derive(keypoints().view(), "img.jpg").unwrap();

        assert_abs_diff_eq!(bbox.cx(), 20.0, epsilon = 1e-9);
        assert_abs_diff_eq!(bbox.cy(), 50.0, epsilon = 1e-9);
        assert_abs_diff_eq!(bbox.w(), 24.0, epsilon = 1e-9);
        assert_abs_diff_eq!(bbox.h(), 72.0, epsilon = 1e-9);
    }

    #[test]
    fn all_joints_selection_ignores_confidence() {
        let deriver = BoxDeriver::new(1.0, JointSelection::All, Expansion::Linear).unwrap();
        let bbox = deriver.derive(keypoints().view(), "img.jpg").unwrap();
        assert_eq!(bbox.xywh(), [-90.0, 3.0, 590.0, 497.0]);

        let without_confidence = array![[1.0, 2.0], [3.0, 5.0]];
        let bbox = deriver.derive(without_confidence.view(), "img.jpg").unwrap();
        assert_eq!(bbox.xywh(), [1.0, 2.0, 2.0, 3.0]);
    }

    #[test]
    fn legacy_expansion_formula() {
        let deriver = BoxDeriver::new(1.2, JointSelection::Annotated, Expansion::Legacy).unwrap();
        let bbox = deriver.derive(keypoints().view(), "img.jpg").unwrap();

        // tight box: min_x = 10, min_y = 20, w = 30 - 10, h = 80 - 10
        let (w, h) = (20.0, 70.0);
        let (cx, cy) = (10.0 + w / 2.0, 20.0 + h / 2.0);
        let expect = [
            1.2 * (10.0 - cx) + cx,
            1.2 * (20.0 - cy) + cy,
            w * 1.44,
            h * 1.44,
        ];
        bbox.xywh()
            .iter()
            .zip(expect.iter())
            .for_each(|(&got, &expect)| assert_abs_diff_eq!(got, expect, epsilon = 1e-9));
    }

    #[test]
    fn no_annotated_joint() {
        let deriver = BoxDeriver::new(1.2, JointSelection::Annotated, Expansion::Linear).unwrap();
        let keypoints = array![[1.0, 2.0, 0.0], [3.0, 4.0, -0.5]];
        let err = deriver.derive(keypoints.view(), "frame_7.jpg").unwrap_err();
        match err {
            ConvertError::EmptyKeypointSet { image_path } => assert_eq!(image_path, "frame_7.jpg"),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn non_finite_coordinates() {
        let deriver = BoxDeriver::new(1.2, JointSelection::All, Expansion::Linear).unwrap();
        let keypoints = array![[1.0, f64::NAN], [3.0, 4.0]];
        let err = deriver.derive(keypoints.view(), "img.jpg").unwrap_err();
        assert!(matches!(err, ConvertError::MalformedRecord { .. }));
    }

    #[test]
    fn missing_confidence_column() {
        let deriver = BoxDeriver::new(1.2, JointSelection::Annotated, Expansion::Linear).unwrap();
        let keypoints = array![[1.0, 2.0], [3.0, 4.0]];
        assert!(deriver.derive(keypoints.view(), "img.jpg").is_err());
    }

    #[test]
    fn invalid_scale_factor() {
        assert!(BoxDeriver::new(0.0, JointSelection::All, Expansion::Linear).is_err());
        assert!(BoxDeriver::new(f64::NAN, JointSelection::All, Expansion::Linear).is_err());
    }
}
