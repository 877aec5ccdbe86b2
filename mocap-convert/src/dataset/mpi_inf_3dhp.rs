//! MPI-INF-3DHP converter.
//!
//! The training and test releases store keypoints in different axis layouts.
//! [TrainSequence] and [TestSubject] read their own layout and hand out
//! [RawKeypointFrame]s, so the conversion steps after them are shared.

use super::video::extract_frames;
use crate::{
    accumulator::{DatasetBundle, RecordAccumulator},
    annotation::BoxDeriver,
    common::*,
    decimate::Decimator,
    error::ConvertError,
    npz::AnnotationArchive,
    record::FrameRecord,
};
use keypoint::ConventionError;
use ndarray::{Ix1, Ix2, Ix3, Ix4};
use std::ops::RangeInclusive;

pub const MPI_INF_3DHP_TAG: &str = "mpi_inf_3dhp";
pub const TRAIN_CONVENTION: &str = "mpi_inf_3dhp";
pub const TEST_CONVENTION: &str = "mpi_inf_3dhp_test";

pub const TRAIN_SUBJECTS: RangeInclusive<usize> = 1..=8;
pub const TRAIN_SEQUENCES: RangeInclusive<usize> = 1..=2;
/// Camera views used for training. View 3 is left out.
pub const TRAIN_VIEWS: [usize; 8] = [0, 1, 2, 4, 5, 6, 7, 8];
pub const TEST_SUBJECTS: RangeInclusive<usize> = 1..=6;

const TRAIN_NUM_JOINTS: usize = 28;
const TRAIN_ROOT_JOINT: usize = 4;
const TEST_NUM_JOINTS: usize = 17;
const TEST_ROOT_JOINT: usize = 14;
const MM_PER_METER: f64 = 1000.0;

/// Keypoints of one image before the shared conversion steps.
#[derive(Debug, Clone, PartialEq)]
pub struct RawKeypointFrame {
    pub image_path: String,
    /// `(J, 2)` pixel coordinates.
    pub keypoints2d: Array2<f64>,
    /// `(J, 3)` coordinates in meters.
    pub keypoints3d: Array2<f64>,
}

impl RawKeypointFrame {
    /// Re-center the 3D keypoints on `root`, add full confidence to both
    /// keypoint sets and derive the bounding box.
    pub fn into_record(
        self,
        root: usize,
        deriver: &BoxDeriver,
    ) -> Result<FrameRecord, ConvertError> {
        let Self {
            image_path,
            keypoints2d,
            keypoints3d,
        } = self;
        let num_joints = keypoints2d.nrows();

        if keypoints2d.ncols() != 2 || keypoints3d.ncols() != 3 {
            return Err(ConvertError::malformed(
                &image_path,
                format!(
                    "expect (J, 2) 2D and (J, 3) 3D keypoints, but get {:?} and {:?}",
                    keypoints2d.dim(),
                    keypoints3d.dim()
                ),
            ));
        }

        if root >= num_joints || keypoints3d.nrows() != num_joints {
            return Err(ConvertError::malformed(
                &image_path,
                format!(
                    "root joint {} is out of range for {} 2D and {} 3D joints",
                    root,
                    num_joints,
                    keypoints3d.nrows()
                ),
            ));
        }

        let bbox = deriver.derive(keypoints2d.view(), &image_path)?;

        let root_position = keypoints3d.row(root).to_owned();
        let mut with_conf_2d = Array2::ones((num_joints, 3));
        with_conf_2d.slice_mut(s![.., ..2]).assign(&keypoints2d);
        let mut with_conf_3d = Array2::ones((num_joints, 4));
        with_conf_3d
            .slice_mut(s![.., ..3])
            .assign(&(&keypoints3d - &root_position));

        FrameRecord::keypoints(image_path, bbox, with_conf_2d, with_conf_3d)
    }
}

/// The annotations of one training sequence, `S{subject}/Seq{sequence}`.
#[derive(Debug, Clone)]
pub struct TrainSequence {
    subject: usize,
    sequence: usize,
    /// `(views, frames, 56)`
    annot2: Array3<f64>,
    /// `(views, frames, 84)` in millimeters.
    annot3: Array3<f64>,
}

impl TrainSequence {
    pub fn new(
        subject: usize,
        sequence: usize,
        annot2: Array3<f64>,
        annot3: Array3<f64>,
    ) -> Result<Self, ConvertError> {
        let (views_2d, frames_2d, dim_2d) = annot2.dim();
        let (views_3d, frames_3d, dim_3d) = annot3.dim();

        if dim_2d != TRAIN_NUM_JOINTS * 2
            || dim_3d != TRAIN_NUM_JOINTS * 3
            || views_2d != views_3d
            || frames_2d != frames_3d
        {
            return Err(ConvertError::malformed(
                format!("S{}/Seq{}", subject, sequence),
                format!(
                    "expect (V, F, {}) and (V, F, {}) annotations, but found {:?} and {:?}",
                    TRAIN_NUM_JOINTS * 2,
                    TRAIN_NUM_JOINTS * 3,
                    annot2.shape(),
                    annot3.shape()
                ),
            ));
        }

        Ok(Self {
            subject,
            sequence,
            annot2,
            annot3,
        })
    }

    pub fn load(dataset_dir: &Path, subject: usize, sequence: usize) -> Result<Self, ConvertError> {
        let path = dataset_dir
            .join(Self::relative_dir(subject, sequence))
            .join("annot.npz");
        let mut archive = AnnotationArchive::open(&path)?;
        let annot2 = archive.floats::<Ix3>("annot2")?;
        let annot3 = archive.floats::<Ix3>("annot3")?;
        Self::new(subject, sequence, annot2, annot3)
    }

    pub fn relative_dir(subject: usize, sequence: usize) -> PathBuf {
        PathBuf::from(format!("S{}", subject)).join(format!("Seq{}", sequence))
    }

    pub fn subject(&self) -> usize {
        self.subject
    }

    pub fn sequence(&self) -> usize {
        self.sequence
    }

    pub fn num_views(&self) -> usize {
        self.annot2.dim().0
    }

    pub fn num_frames(&self) -> usize {
        self.annot2.dim().1
    }

    /// Image path relative to the dataset directory.
    pub fn image_path(&self, view: usize, file_name: &str) -> String {
        format!(
            "S{}/Seq{}/video_{}/{}",
            self.subject, self.sequence, view, file_name
        )
    }

    pub fn frame(
        &self,
        view: usize,
        index: usize,
        image_path: String,
    ) -> Result<RawKeypointFrame, ConvertError> {
        if view >= self.num_views() || index >= self.num_frames() {
            return Err(ConvertError::malformed(
                &image_path,
                format!(
                    "no annotation for view {} frame {}, the sequence has {} views and {} frames",
                    view,
                    index,
                    self.num_views(),
                    self.num_frames()
                ),
            ));
        }

        let keypoints2d = self
            .annot2
            .slice(s![view, index, ..])
            .to_owned()
            .into_shape((TRAIN_NUM_JOINTS, 2))
            .map_err(|err| ConvertError::malformed(&image_path, err))?;
        let keypoints3d = self
            .annot3
            .slice(s![view, index, ..])
            .to_owned()
            .into_shape((TRAIN_NUM_JOINTS, 3))
            .map_err(|err| ConvertError::malformed(&image_path, err))?
            / MM_PER_METER;

        Ok(RawKeypointFrame {
            image_path,
            keypoints2d,
            keypoints3d,
        })
    }
}

/// The annotations of one test subject, `mpi_inf_3dhp_test_set/TS{subject}`.
#[derive(Debug, Clone)]
pub struct TestSubject {
    subject: usize,
    /// `(frames, 1, 17, 2)`
    annot2: Array4<f64>,
    /// `(frames, 1, 17, 3)` in millimeters.
    annot3: Array4<f64>,
    valid: Array1<bool>,
}

impl TestSubject {
    pub fn new(
        subject: usize,
        annot2: Array4<f64>,
        annot3: Array4<f64>,
        valid: Array1<bool>,
    ) -> Result<Self, ConvertError> {
        let num_frames = valid.len();
        let expect_2d = (num_frames, 1, TEST_NUM_JOINTS, 2);
        let expect_3d = (num_frames, 1, TEST_NUM_JOINTS, 3);

        if annot2.dim() != expect_2d || annot3.dim() != expect_3d {
            return Err(ConvertError::malformed(
                format!("TS{}", subject),
                format!(
                    "expect annotations of shape {:?} and {:?}, but found {:?} and {:?}",
                    expect_2d,
                    expect_3d,
                    annot2.shape(),
                    annot3.shape()
                ),
            ));
        }

        Ok(Self {
            subject,
            annot2,
            annot3,
            valid,
        })
    }

    pub fn load(dataset_dir: &Path, subject: usize) -> Result<Self, ConvertError> {
        let path = dataset_dir
            .join(Self::relative_dir(subject))
            .join("annot_data.npz");
        let mut archive = AnnotationArchive::open(&path)?;
        let annot2 = archive.floats::<Ix4>("annot2")?;
        let annot3 = archive.floats::<Ix4>("univ_annot3")?;
        let valid = match archive.flags::<Ix1>("valid_frame") {
            Ok(valid) => valid,
            Err(ConvertError::MalformedRecord { .. }) => {
                let valid = archive.flags::<Ix2>("valid_frame")?;
                valid.column(0).to_owned()
            }
            Err(err) => return Err(err),
        };
        Self::new(subject, annot2, annot3, valid)
    }

    pub fn relative_dir(subject: usize) -> PathBuf {
        PathBuf::from("mpi_inf_3dhp_test_set").join(format!("TS{}", subject))
    }

    pub fn subject(&self) -> usize {
        self.subject
    }

    pub fn num_frames(&self) -> usize {
        self.valid.len()
    }

    pub fn is_valid(&self, index: usize) -> bool {
        self.valid[index]
    }

    /// Image path relative to the dataset directory. Images are numbered from 1.
    pub fn image_path(&self, index: usize) -> String {
        format!(
            "mpi_inf_3dhp_test_set/TS{}/imageSequence/img_{:06}.jpg",
            self.subject,
            index + 1
        )
    }

    pub fn frame(&self, index: usize) -> RawKeypointFrame {
        RawKeypointFrame {
            image_path: self.image_path(index),
            keypoints2d: self.annot2.slice(s![index, 0, .., ..]).to_owned(),
            keypoints3d: self.annot3.slice(s![index, 0, .., ..]).to_owned() / MM_PER_METER,
        }
    }
}

/// Reject a source convention whose joint count differs from the dataset layout.
fn check_source_joints(mapping: &KeypointMapping, expected: usize) -> Result<(), ConvertError> {
    let found = mapping.num_source_joints();
    if found != expected {
        return Err(ConventionError::JointCountMismatch {
            convention: mapping.source().to_string(),
            expected,
            found,
        }
        .into());
    }
    Ok(())
}

/// Turns MPI-INF-3DHP annotations into keypoint records.
#[derive(Debug, Clone)]
pub struct MpiInf3dhpConverter {
    deriver: BoxDeriver,
    train_filter: VisibilityFilter,
    test_filter: VisibilityFilter,
    train_mapping: KeypointMapping,
    test_mapping: KeypointMapping,
}

impl MpiInf3dhpConverter {
    /// Create a converter with mappings from the dataset conventions to `target`.
    pub fn new(
        deriver: BoxDeriver,
        frame_size: HW<f64>,
        table: &ConventionTable,
        target: &str,
    ) -> Result<Self, ConvertError> {
        let train_mapping = KeypointMapping::new(table, TRAIN_CONVENTION, target)?;
        let test_mapping = KeypointMapping::new(table, TEST_CONVENTION, target)?;
        check_source_joints(&train_mapping, TRAIN_NUM_JOINTS)?;
        check_source_joints(&test_mapping, TEST_NUM_JOINTS)?;

        Ok(Self {
            deriver,
            train_filter: VisibilityFilter::new(frame_size.clone(), TRAIN_NUM_JOINTS),
            test_filter: VisibilityFilter::new(frame_size, TEST_NUM_JOINTS),
            train_mapping,
            test_mapping,
        })
    }

    /// Convert the frames of one view whose images are `file_names`, paired
    /// in order with the annotation rows. Returns the number of appended
    /// records.
    pub fn convert_train_view<S>(
        &self,
        sequence: &TrainSequence,
        view: usize,
        file_names: &[S],
        decimator: &mut Decimator,
        accumulator: &mut RecordAccumulator,
    ) -> Result<usize, ConvertError>
    where
        S: AsRef<str>,
    {
        let mut count = 0;
        let mut rejected = 0;

        for (index, file_name) in file_names.iter().enumerate() {
            let image_path = sequence.image_path(view, file_name.as_ref());
            let frame = sequence.frame(view, index, image_path)?;

            if !self.train_filter.accepts(frame.keypoints2d.view()) {
                rejected += 1;
                continue;
            }
            if !decimator.admit() {
                continue;
            }

            if let Some(record) = self.frame_to_record(frame, TRAIN_ROOT_JOINT)? {
                accumulator.push(record);
                count += 1;
            }
        }

        debug!(
            "S{}/Seq{}/video_{}: {} records, {} frames out of view",
            sequence.subject(),
            sequence.sequence(),
            view,
            count,
            rejected
        );
        Ok(count)
    }

    /// Convert the valid frames of one test subject. Returns the number of
    /// appended records.
    pub fn convert_test_subject(
        &self,
        subject: &TestSubject,
        accumulator: &mut RecordAccumulator,
    ) -> Result<usize, ConvertError> {
        let mut count = 0;
        let mut rejected = 0;

        for index in 0..subject.num_frames() {
            if !subject.is_valid(index) {
                continue;
            }

            let frame = subject.frame(index);
            if !self.test_filter.accepts(frame.keypoints2d.view()) {
                rejected += 1;
                continue;
            }

            if let Some(record) = self.frame_to_record(frame, TEST_ROOT_JOINT)? {
                accumulator.push(record);
                count += 1;
            }
        }

        debug!(
            "TS{}: {} records, {} frames out of view",
            subject.subject(),
            count,
            rejected
        );
        Ok(count)
    }

    pub fn convert_train(
        &self,
        dataset_dir: &Path,
        extract_img: bool,
        decimation: NonZeroUsize,
    ) -> Result<DatasetBundle> {
        info!("converting MPI-INF-3DHP train split");
        let mut decimator = Decimator::new(decimation);
        let mut accumulator = RecordAccumulator::new();

        for subject in TRAIN_SUBJECTS {
            for seq in TRAIN_SEQUENCES {
                let sequence = TrainSequence::load(dataset_dir, subject, seq)?;
                let seq_dir = dataset_dir.join(TrainSequence::relative_dir(subject, seq));

                for view in TRAIN_VIEWS {
                    let image_dir = seq_dir.join(format!("video_{}", view));

                    if extract_img {
                        let video_file = seq_dir
                            .join("imageSequence")
                            .join(format!("video_{}.avi", view));
                        extract_frames(&video_file, &image_dir)?;
                    }

                    let file_names = list_images(&image_dir)?;
                    self.convert_train_view(
                        &sequence,
                        view,
                        &file_names,
                        &mut decimator,
                        &mut accumulator,
                    )?;
                }
            }
        }

        info!(
            "{} of {} visible frames kept",
            accumulator.len(),
            decimator.seen()
        );
        let bundle = accumulator.into_keypoint_bundle(MPI_INF_3DHP_TAG, &self.train_mapping)?;
        Ok(bundle)
    }

    pub fn convert_test(&self, dataset_dir: &Path) -> Result<DatasetBundle> {
        info!("converting MPI-INF-3DHP test split");
        let mut accumulator = RecordAccumulator::new();

        for subject in TEST_SUBJECTS {
            let subject = TestSubject::load(dataset_dir, subject)?;
            self.convert_test_subject(&subject, &mut accumulator)?;
        }

        let bundle = accumulator.into_keypoint_bundle(MPI_INF_3DHP_TAG, &self.test_mapping)?;
        Ok(bundle)
    }

    fn frame_to_record(
        &self,
        frame: RawKeypointFrame,
        root: usize,
    ) -> Result<Option<FrameRecord>, ConvertError> {
        match frame.into_record(root, &self.deriver) {
            Ok(record) => Ok(Some(record)),
            Err(ConvertError::EmptyKeypointSet { image_path }) => {
                warn!("skip '{}': no joint to derive a bounding box", image_path);
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}

/// File names of the `*.jpg` images in `dir`, sorted.
fn list_images(dir: &Path) -> Result<Vec<String>> {
    let pattern = dir.join("*.jpg");
    let pattern = pattern
        .to_str()
        .ok_or_else(|| format_err!("non-UTF-8 path '{}'", pattern.display()))?;

    let names: Vec<String> = glob::glob(pattern)?
        .map(|path| -> Result<_> {
            let path = path?;
            let name = path
                .file_name()
                .ok_or_else(|| format_err!("invalid image path '{}'", path.display()))?
                .to_string_lossy()
                .into_owned();
            Ok(name)
        })
        .collect::<Result<_>>()?;

    if names.is_empty() {
        warn!("no images found in '{}'", dir.display());
    }
    Ok(names.into_iter().sorted().collect())
}
