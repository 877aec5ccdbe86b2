//! Axis-angle and rotation matrix conversions.

use crate::{common::*, error::ConvertError};
use nalgebra::{Matrix3, Rotation3, UnitQuaternion, Vector3};

/// Rodrigues formula, axis-angle to rotation matrix.
pub fn axis_angle_to_matrix(axis_angle: [f64; 3]) -> Matrix3<f64> {
    Rotation3::new(Vector3::from(axis_angle)).into_inner()
}

/// Inverse Rodrigues formula.
///
/// The input is first projected onto the closest rotation, so slightly
/// non-orthonormal matrices read from annotation files are accepted.
pub fn matrix_to_axis_angle(matrix: &Matrix3<f64>) -> [f64; 3] {
    let rotation = nearest_rotation(matrix);
    let axis_angle = UnitQuaternion::from_rotation_matrix(&rotation).scaled_axis();
    [axis_angle.x, axis_angle.y, axis_angle.z]
}

/// Re-express a root orientation in the view of a camera.
pub fn to_camera_frame(global_orient: [f64; 3], camera_rotation: &Matrix3<f64>) -> [f64; 3] {
    let orient = axis_angle_to_matrix(global_orient);
    matrix_to_axis_angle(&(camera_rotation * orient))
}

/// The rotation block of a 4x4 (or 3x4) extrinsic matrix.
pub fn camera_rotation(extrinsics: ArrayView2<f64>) -> Result<Matrix3<f64>, ConvertError> {
    let (rows, cols) = extrinsics.dim();
    if rows < 3 || cols < 3 {
        return Err(ConvertError::malformed(
            "camera extrinsics",
            format!("expect at least 3x3 entries, but found {}x{}", rows, cols),
        ));
    }
    Ok(Matrix3::from_fn(|row, col| extrinsics[[row, col]]))
}

fn nearest_rotation(matrix: &Matrix3<f64>) -> Rotation3<f64> {
    let svd = matrix.svd(true, true);

    match (svd.u, svd.v_t) {
        (Some(mut u), Some(v_t)) => {
            if (u * v_t).determinant() < 0.0 {
                // singular values are sorted, flip the weakest direction
                u.column_mut(2).neg_mut();
            }
            Rotation3::from_matrix_unchecked(u * v_t)
        }
        _ => Rotation3::from_matrix(matrix),
    }
}
