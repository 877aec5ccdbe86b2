use crate::{
    common::*,
    convention::{Convention, ConventionTable},
    error::ConventionError,
};

/// Joint correspondence from one convention to another.
///
/// Joints are matched by name. Target joints without a source counterpart
/// are zero-filled by [KeypointMapping::remap] and flagged `false` in the
/// mask.
#[derive(Debug, Clone)]
pub struct KeypointMapping {
    source: String,
    target: String,
    num_source_joints: usize,
    /// (source index, target index) pairs in target order.
    pairs: Vec<(usize, usize)>,
    mask: Array1<bool>,
}

impl KeypointMapping {
    pub fn new(
        table: &ConventionTable,
        source: &str,
        target: &str,
    ) -> Result<Self, ConventionError> {
        let source = table.get(source)?;
        let target = table.get(target)?;
        Ok(Self::between(source, target))
    }

    pub fn between(source: &Convention, target: &Convention) -> Self {
        let pairs: Vec<_> = target
            .joints()
            .enumerate()
            .filter_map(|(target_index, joint)| {
                let source_index = source.index_of(joint)?;
                Some((source_index, target_index))
            })
            .collect();

        let mut mask = Array1::from_elem(target.num_joints(), false);
        pairs.iter().for_each(|&(_, target_index)| {
            mask[target_index] = true;
        });

        debug!(
            "keypoint mapping '{}' -> '{}' covers {} of {} target joints",
            source.name(),
            target.name(),
            pairs.len(),
            target.num_joints()
        );

        Self {
            source: source.name().to_owned(),
            target: target.name().to_owned(),
            num_source_joints: source.num_joints(),
            pairs,
            mask,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn num_source_joints(&self) -> usize {
        self.num_source_joints
    }

    pub fn num_target_joints(&self) -> usize {
        self.mask.len()
    }

    /// Target joints populated from source data.
    pub fn mask(&self) -> &Array1<bool> {
        &self.mask
    }

    /// Remap a `(frames, joints, channels)` array into the target ordering.
    pub fn remap(&self, keypoints: ArrayView3<f64>) -> Result<Array3<f64>, ConventionError> {
        let (num_frames, num_joints, num_channels) = keypoints.dim();
        if num_joints != self.num_source_joints {
            return Err(ConventionError::JointCountMismatch {
                convention: self.source.clone(),
                expected: self.num_source_joints,
                found: num_joints,
            });
        }

        let mut output = Array3::zeros((num_frames, self.num_target_joints(), num_channels));
        self.pairs.iter().for_each(|&(source_index, target_index)| {
            output
                .index_axis_mut(Axis(1), target_index)
                .assign(&keypoints.index_axis(Axis(1), source_index));
        });

        Ok(output)
    }
}
