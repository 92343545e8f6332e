//! Pinhole back-projection between image pixels and pan/tilt rays.
//!
//! A PTZ pose fixes a rotation `R = Rx(tilt) * Ry(pan)` and an intrinsic
//! matrix `K` built from the focal length and the principal point. Keypoint
//! pixels are lifted through `K` and `R` into absolute pan/tilt angles,
//! which is the coordinate frame the forest regresses into. All angles are
//! degrees.

use crate::domain::CameraPose;

type Mat3 = [[f64; 3]; 3];

fn transpose(m: &Mat3) -> Mat3 {
    let mut out = [[0.0; 3]; 3];
    for (i, row) in m.iter().enumerate() {
        for (j, value) in row.iter().enumerate() {
            out[j][i] = *value;
        }
    }
    out
}

fn mat_mul(a: &Mat3, b: &Mat3) -> Mat3 {
    let mut out = [[0.0; 3]; 3];
    for i in 0..3 {
        for j in 0..3 {
            out[i][j] = (0..3).map(|k| a[i][k] * b[k][j]).sum();
        }
    }
    out
}

fn mat_vec(m: &Mat3, v: &[f64; 3]) -> [f64; 3] {
    let mut out = [0.0; 3];
    for (i, row) in m.iter().enumerate() {
        out[i] = (0..3).map(|k| row[k] * v[k]).sum();
    }
    out
}

/// World-to-camera rotation for a pose, tilt applied after pan.
fn rotation(pan_deg: f64, tilt_deg: f64) -> Mat3 {
    let (sp, cp) = pan_deg.to_radians().sin_cos();
    let (st, ct) = tilt_deg.to_radians().sin_cos();
    let ry = [[cp, 0.0, -sp], [0.0, 1.0, 0.0], [sp, 0.0, cp]];
    let rx = [[1.0, 0.0, 0.0], [0.0, ct, st], [0.0, -st, ct]];
    mat_mul(&rx, &ry)
}

/// Lifts an image pixel into the absolute `[pan, tilt]` ray it observes.
///
/// The pixel is normalized through the inverse intrinsics, rotated out of
/// the camera frame with the transposed pose rotation, and converted to
/// angles. The principal point back-projects to the pose itself.
pub fn pixel_to_ray(pose: &CameraPose, principal_point: [f64; 2], pixel: [f64; 2]) -> [f64; 2] {
    let f = pose.focal_length;
    let q = [
        (pixel[0] - principal_point[0]) / f,
        (pixel[1] - principal_point[1]) / f,
        1.0,
    ];
    let r = rotation(pose.pan, pose.tilt);
    let v = mat_vec(&transpose(&r), &q);
    let theta = (v[0] / v[2]).atan();
    let phi = (-v[1] / (v[0] * v[0] + v[2] * v[2]).sqrt()).atan();
    [theta.to_degrees(), phi.to_degrees()]
}

/// Projects an absolute `[pan, tilt]` ray onto the image plane of `pose`.
///
/// Inverse of [`pixel_to_ray`] for rays in the camera's forward hemisphere.
/// The returned pixel may fall outside the sensor bounds.
pub fn ray_to_pixel(pose: &CameraPose, principal_point: [f64; 2], ray: [f64; 2]) -> [f64; 2] {
    let tan_theta = ray[0].to_radians().tan();
    let tan_phi = ray[1].to_radians().tan();
    let p = [
        tan_theta,
        -tan_phi * (tan_theta * tan_theta + 1.0).sqrt(),
        1.0,
    ];
    let r = rotation(pose.pan, pose.tilt);
    let w = mat_vec(&r, &p);
    let f = pose.focal_length;
    [
        f * w[0] / w[2] + principal_point[0],
        f * w[1] / w[2] + principal_point[1],
    ]
}
