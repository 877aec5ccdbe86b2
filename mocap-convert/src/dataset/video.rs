//! Decoding training videos into frame images.

use crate::common::*;

/// Decode every frame of `video_file` into `output_dir/frame_{n:06}.jpg`,
/// numbering from 1. Returns the number of written frames.
#[cfg(feature = "opencv")]
pub fn extract_frames(video_file: &Path, output_dir: &Path) -> Result<usize> {
    use opencv::{
        core::{Mat, Vector},
        imgcodecs,
        prelude::*,
        videoio::{VideoCapture, VideoCaptureAPIs},
    };

    let video_str = video_file
        .to_str()
        .ok_or_else(|| format_err!("non-UTF-8 path '{}'", video_file.display()))?;
    fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create '{}'", output_dir.display()))?;

    let mut capture = VideoCapture::from_file(video_str, VideoCaptureAPIs::CAP_ANY as i32)
        .with_context(|| format!("failed to open video '{}'", video_file.display()))?;
    if !capture.is_opened()? {
        bail!("video '{}' cannot be opened", video_file.display());
    }

    let mut count = 0;
    loop {
        let mut image = Mat::default();
        if !capture.read(&mut image)? {
            break;
        }
        count += 1;

        let image_file = output_dir.join(format!("frame_{:06}.jpg", count));
        let image_str = image_file
            .to_str()
            .ok_or_else(|| format_err!("non-UTF-8 path '{}'", image_file.display()))?;
        let ok = imgcodecs::imwrite(image_str, &image, &Vector::new())?;
        ensure!(ok, "failed to write '{}'", image_file.display());
    }

    debug!(
        "extracted {} frames from '{}'",
        count,
        video_file.display()
    );
    Ok(count)
}

#[cfg(not(feature = "opencv"))]
pub fn extract_frames(video_file: &Path, _output_dir: &Path) -> Result<usize> {
    bail!(
        "unable to extract frames from '{}': the program is built without the 'opencv' feature",
        video_file.display()
    )
}
