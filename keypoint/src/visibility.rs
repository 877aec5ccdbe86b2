use crate::common::*;

/// Keeps a frame only if enough joints land inside the image.
#[derive(Debug, Clone, PartialEq)]
pub struct VisibilityFilter {
    frame: HW<f64>,
    min_visible: usize,
}

impl VisibilityFilter {
    pub fn new(frame: HW<f64>, min_visible: usize) -> Self {
        Self { frame, min_visible }
    }

    /// Count joints with `0 <= x < w` and `0 <= y < h`.
    ///
    /// Each row of `keypoints` starts with the x and y pixel coordinates.
    pub fn count_in_frame(&self, keypoints: ArrayView2<f64>) -> usize {
        debug_assert!(keypoints.ncols() >= 2);
        keypoints
            .outer_iter()
            .filter(|joint| self.frame.contains(joint[0], joint[1]))
            .count()
    }

    pub fn accepts(&self, keypoints: ArrayView2<f64>) -> bool {
        self.count_in_frame(keypoints) >= self.min_visible
    }
}
