//! 3D Poses in the Wild (3DPW) converter.

use crate::{
    accumulator::{DatasetBundle, RecordAccumulator},
    annotation::BoxDeriver,
    common::*,
    config::Pw3dSplit,
    error::ConvertError,
    npz::AnnotationArchive,
    record::{FrameRecord, PoseParameters, NUM_BETAS, NUM_BODY_JOINTS},
    rotation::{camera_rotation, to_camera_frame},
};
use ndarray::{Ix2, Ix3, Ix4};

pub const PW3D_TAG: &str = "3dpw";

const POSE_DIM: usize = 3 + NUM_BODY_JOINTS * 3;

/// The annotations of one recorded sequence.
#[derive(Debug, Clone)]
pub struct Pw3dSequence {
    name: String,
    /// `(P, F, 72)` body model poses in world coordinates.
    poses: Array3<f64>,
    /// `(P, >=10)`
    betas: Array2<f64>,
    /// `(P, F, 3, J)` 2D detections, one column per joint.
    poses2d: Array4<f64>,
    /// `(F, 4, 4)` camera extrinsics.
    cam_poses: Array3<f64>,
    /// `(P, F)`
    campose_valid: Array2<bool>,
    genders: Vec<String>,
}

impl Pw3dSequence {
    pub fn new(
        name: impl Into<String>,
        poses: Array3<f64>,
        betas: Array2<f64>,
        poses2d: Array4<f64>,
        cam_poses: Array3<f64>,
        campose_valid: Array2<bool>,
        genders: Vec<String>,
    ) -> Result<Self, ConvertError> {
        let name = name.into();
        let (num_people, num_frames, pose_dim) = poses.dim();
        let malformed =
            |reason: String| ConvertError::malformed(format!("sequence '{}'", name), reason);

        if pose_dim != POSE_DIM {
            return Err(malformed(format!(
                "expect {} pose parameters, but found {}",
                POSE_DIM, pose_dim
            )));
        }
        if betas.nrows() != num_people || betas.ncols() < NUM_BETAS {
            return Err(malformed(format!(
                "expect betas of shape ({}, >={}), but found {:?}",
                num_people,
                NUM_BETAS,
                betas.shape()
            )));
        }
        {
            let (people, frames, channels, _) = poses2d.dim();
            if people != num_people || frames != num_frames || channels != 3 {
                return Err(malformed(format!(
                    "expect 2D poses of shape ({}, {}, 3, J), but found {:?}",
                    num_people,
                    num_frames,
                    poses2d.shape()
                )));
            }
        }
        {
            let (frames, rows, cols) = cam_poses.dim();
            if frames != num_frames || rows < 3 || cols < 3 {
                return Err(malformed(format!(
                    "expect camera poses of shape ({}, 4, 4), but found {:?}",
                    num_frames,
                    cam_poses.shape()
                )));
            }
        }
        if campose_valid.dim() != (num_people, num_frames) {
            return Err(malformed(format!(
                "expect validity flags of shape ({}, {}), but found {:?}",
                num_people,
                num_frames,
                campose_valid.shape()
            )));
        }
        if genders.len() != num_people {
            return Err(malformed(format!(
                "expect {} genders, but found {}",
                num_people,
                genders.len()
            )));
        }

        Ok(Self {
            name,
            poses,
            betas,
            poses2d,
            cam_poses,
            campose_valid,
            genders,
        })
    }

    /// Load a sequence archive.
    ///
    /// The sequence name is read from the `sequence` array if present,
    /// otherwise the file stem is used.
    pub fn load<P>(path: P) -> Result<Self, ConvertError>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let mut archive = AnnotationArchive::open(path)?;

        let name = if archive.contains("sequence") {
            archive.string("sequence")?
        } else {
            path.file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .ok_or_else(|| ConvertError::missing(path, "the file has no name"))?
        };
        let poses = archive.floats::<Ix3>("poses")?;
        let betas = archive.floats::<Ix2>("betas")?;
        let poses2d = archive.floats::<Ix4>("poses2d")?;
        let cam_poses = archive.floats::<Ix3>("cam_poses")?;
        let campose_valid = archive.flags::<Ix2>("campose_valid")?;
        let genders = archive.string_rows("genders")?;

        Self::new(
            name,
            poses,
            betas,
            poses2d,
            cam_poses,
            campose_valid,
            genders,
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn num_people(&self) -> usize {
        self.poses.dim().0
    }

    pub fn num_frames(&self) -> usize {
        self.poses.dim().1
    }

    pub fn image_path(&self, frame: usize) -> String {
        format!("imageFiles/{}/image_{:05}.jpg", self.name, frame)
    }
}

/// Turns 3DPW sequences into body model records.
#[derive(Debug, Clone)]
pub struct Pw3dConverter {
    deriver: BoxDeriver,
}

impl Pw3dConverter {
    pub fn new(deriver: BoxDeriver) -> Self {
        Self { deriver }
    }

    /// Append the records of all valid person-frames. Returns the number of
    /// appended records.
    pub fn convert_sequence(
        &self,
        sequence: &Pw3dSequence,
        accumulator: &mut RecordAccumulator,
    ) -> Result<usize, ConvertError> {
        let mut count = 0;

        for person in 0..sequence.num_people() {
            let gender = &sequence.genders[person];
            let betas = sequence.betas.slice(s![person, ..NUM_BETAS]).to_owned();

            for frame in 0..sequence.num_frames() {
                if !sequence.campose_valid[[person, frame]] {
                    continue;
                }

                let image_path = sequence.image_path(frame);
                let keypoints2d = sequence.poses2d.slice(s![person, frame, .., ..]);
                let bbox = match self.deriver.derive(keypoints2d.t(), &image_path) {
                    Ok(bbox) => bbox,
                    Err(ConvertError::EmptyKeypointSet { image_path }) => {
                        warn!("skip '{}': no annotated joint", image_path);
                        continue;
                    }
                    Err(err) => return Err(err),
                };

                let pose = sequence.poses.slice(s![person, frame, ..]);
                let rotation = camera_rotation(sequence.cam_poses.index_axis(Axis(0), frame))?;
                let global_orient = to_camera_frame([pose[0], pose[1], pose[2]], &rotation);
                let body_pose = pose
                    .slice(s![3..])
                    .to_owned()
                    .into_shape((NUM_BODY_JOINTS, 3))
                    .map_err(|err| ConvertError::malformed(&image_path, err))?;
                let params = PoseParameters::new(global_orient, body_pose, betas.clone())?;

                accumulator.push(FrameRecord::smpl(image_path, bbox, params, gender.as_str()));
                count += 1;
            }
        }

        Ok(count)
    }

    /// Convert every sequence of a split into one bundle.
    pub fn convert_split(&self, dataset_dir: &Path, split: Pw3dSplit) -> Result<DatasetBundle> {
        let files = list_sequence_files(dataset_dir, split)?;
        info!(
            "converting 3DPW {} split from {} sequences",
            split.as_str(),
            files.len()
        );

        let mut accumulator = RecordAccumulator::new();
        for path in &files {
            let sequence = Pw3dSequence::load(path)?;
            let count = self.convert_sequence(&sequence, &mut accumulator)?;
            debug!(
                "sequence '{}': {} records from {} people",
                sequence.name(),
                count,
                sequence.num_people()
            );
        }

        let bundle = accumulator.into_smpl_bundle(PW3D_TAG)?;
        Ok(bundle)
    }
}

/// List `sequenceFiles/{split}/*.npz` in sorted order.
pub fn list_sequence_files(dataset_dir: &Path, split: Pw3dSplit) -> Result<Vec<PathBuf>> {
    let split_dir = dataset_dir.join("sequenceFiles").join(split.as_str());
    if !split_dir.is_dir() {
        return Err(ConvertError::missing(&split_dir, "directory does not exist").into());
    }

    let pattern = split_dir.join("*.npz");
    let pattern = pattern
        .to_str()
        .ok_or_else(|| format_err!("non-UTF-8 path '{}'", pattern.display()))?;
    let files: Vec<_> = glob::glob(pattern)?
        .map(|path| path.map_err(Error::from))
        .collect::<Result<_>>()?;

    Ok(files.into_iter().sorted().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        accumulator::BundleBody,
        annotation::{Expansion, JointSelection},
    };
    use approx::assert_abs_diff_eq;

    const NUM_JOINTS: usize = 18;

    fn identity_cameras(num_frames: usize) -> Array3<f64> {
        let mut cam_poses = Array3::zeros((num_frames, 4, 4));
        cam_poses.outer_iter_mut().for_each(|mut pose| {
            pose.diag_mut().fill(1.0);
        });
        cam_poses
    }

    fn sequence(valid: &[bool]) -> Pw3dSequence {
        let num_frames = valid.len();
        let poses = Array3::from_shape_fn((1, num_frames, POSE_DIM), |(_, frame, index)| {
            0.01 * (index as f64 + 1.0) + 0.1 * frame as f64
        });
        let betas = Array2::from_shape_fn((1, 16), |(_, index)| index as f64);
        let poses2d = Array4::from_shape_fn(
            (1, num_frames, 3, NUM_JOINTS),
            |(_, frame, channel, joint)| match channel {
                0 => 100.0 + joint as f64 * 5.0 + frame as f64,
                1 => 200.0 + joint as f64 * 10.0,
                _ => 0.8,
            },
        );
        let campose_valid = Array2::from_shape_vec((1, num_frames), valid.to_vec()).unwrap();

        Pw3dSequence::new(
            "courtyard_basketball_00",
            poses,
            betas,
            poses2d,
            identity_cameras(num_frames),
            campose_valid,
            vec!["m".into()],
        )
        .unwrap()
    }

    fn converter() -> Pw3dConverter {
        Pw3dConverter::new(
            BoxDeriver::new(1.2, JointSelection::Annotated, Expansion::Linear).unwrap(),
        )
    }

    #[test]
    fn valid_frames_with_identity_camera() {
        let valid = [true, false, true, true, false, true, true];
        let sequence = sequence(&valid);
        let mut accumulator = RecordAccumulator::new();

        let count = converter()
            .convert_sequence(&sequence, &mut accumulator)
            .unwrap();
        assert_eq!(count, 5);

        let frames: [usize; 5] = [0, 2, 3, 5, 6];
        accumulator
            .records()
            .iter()
            .zip(frames.iter())
            .for_each(|(record, &frame)| {
                assert_eq!(
                    record.image_path(),
                    format!("imageFiles/courtyard_basketball_00/image_{:05}.jpg", frame)
                );
            });

        let bundle = accumulator.into_smpl_bundle(PW3D_TAG).unwrap();
        assert_eq!(bundle.config, "3dpw");
        assert_eq!(bundle.bbox_xywh.dim(), (5, 5));
        assert!(bundle.bbox_xywh.column(4).iter().all(|&score| score == 1.0));

        match bundle.body {
            BundleBody::Smpl {
                global_orient,
                body_pose,
                betas,
                gender,
            } => {
                frames.iter().enumerate().for_each(|(row, &frame)| {
                    let pose = sequence.poses.slice(s![0usize, frame, ..]);
                    (0..3).for_each(|axis| {
                        assert_abs_diff_eq!(global_orient[[row, axis]], pose[axis], epsilon = 1e-5)
                    });
                    assert_eq!(body_pose[[row, 0, 0]], pose[3]);
                    assert_eq!(body_pose[[row, 22, 2]], pose[71]);
                });
                assert_eq!(betas.row(0).to_vec(), (0..10).map(|i| i as f64).collect::<Vec<_>>());
                assert_eq!(gender, vec!["m"; 5]);
            }
            BundleBody::Keypoints { .. } => panic!("expect a body model bundle"),
        }
    }

    #[test]
    fn frames_without_annotated_joints_are_skipped() {
        let mut sequence = sequence(&[true, true, true]);
        sequence.poses2d.slice_mut(s![0, 1, 2, ..]).fill(0.0);

        let mut accumulator = RecordAccumulator::new();
        let count = converter()
            .convert_sequence(&sequence, &mut accumulator)
            .unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn camera_rotation_is_applied() {
        let mut sequence = sequence(&[true]);
        sequence.poses.slice_mut(s![0, 0, ..3]).fill(0.0);
        // 90 degrees about z
        let mut camera = sequence.cam_poses.index_axis_mut(Axis(0), 0);
        camera[[0, 0]] = 0.0;
        camera[[0, 1]] = -1.0;
        camera[[1, 0]] = 1.0;
        camera[[1, 1]] = 0.0;

        let mut accumulator = RecordAccumulator::new();
        converter()
            .convert_sequence(&sequence, &mut accumulator)
            .unwrap();
        let bundle = accumulator.into_smpl_bundle(PW3D_TAG).unwrap();
        match bundle.body {
            BundleBody::Smpl { global_orient, .. } => {
                assert_abs_diff_eq!(global_orient[[0, 0]], 0.0, epsilon = 1e-7);
                assert_abs_diff_eq!(global_orient[[0, 1]], 0.0, epsilon = 1e-7);
                assert_abs_diff_eq!(
                    global_orient[[0, 2]],
                    std::f64::consts::FRAC_PI_2,
                    epsilon = 1e-7
                );
            }
            BundleBody::Keypoints { .. } => panic!("expect a body model bundle"),
        }
    }

    #[test]
    fn inconsistent_shapes_are_rejected() {
        let result = Pw3dSequence::new(
            "bad",
            Array3::zeros((1, 2, POSE_DIM)),
            Array2::zeros((1, 10)),
            Array4::zeros((1, 3, 3, NUM_JOINTS)),
            identity_cameras(2),
            Array2::from_elem((1, 2), true),
            vec!["f".into()],
        );
        assert!(matches!(result, Err(ConvertError::MalformedRecord { .. })));
    }

    #[test]
    fn missing_split_directory() {
        let dir = tempfile::tempdir().unwrap();
        let result = list_sequence_files(dir.path(), Pw3dSplit::Validation);
        assert!(result.is_err());
    }
}
