pub mod grid;
pub mod range;
pub mod roots;

pub use range::CircleRange;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// 3x3 matrix.
pub type Matrix3 = nalgebra::Matrix3<f64>;

/// 3D rotation.
pub type Rotation3 = nalgebra::Rotation3<f64>;

/// Default tolerance for containment and intersection queries. Every public
/// query takes an explicit epsilon; this is the value API callers normally
/// pass.
pub const DEFAULT_EPSILON: f64 = 1e-6;

/// Strict tolerance for geometric predicates (degeneracy checks, vertex
/// merging, endpoint identity).
pub const TOLERANCE: f64 = 1e-10;

/// Normalizes an angle into `[0, 2*pi)`.
#[must_use]
pub fn normalize_angle(theta: f64) -> f64 {
    let tau = std::f64::consts::TAU;
    let mut a = theta % tau;
    if a < 0.0 {
        a += tau;
    }
    // Rounding can land exactly on tau after the correction.
    if a >= tau {
        a -= tau;
    }
    a
}

/// Returns an arbitrary unit vector perpendicular to `v`.
///
/// Picks the coordinate axis least aligned with `v` and projects it out.
#[must_use]
pub fn arbitrary_perpendicular(v: &Vector3) -> Vector3 {
    let abs = v.abs();
    let seed = if abs.x <= abs.y && abs.x <= abs.z {
        Vector3::x()
    } else if abs.y <= abs.z {
        Vector3::y()
    } else {
        Vector3::z()
    };
    (seed - v * (seed.dot(v) / v.norm_squared())).normalize()
}

/// Builds a right-handed orthonormal frame whose third column is `z`.
///
/// The first two columns are an arbitrary perpendicular pair; only the
/// direction of the third axis is meaningful to callers.
#[must_use]
pub fn frame_from_z(z: &Vector3) -> Rotation3 {
    let z = z.normalize();
    let x = arbitrary_perpendicular(&z);
    let y = z.cross(&x);
    Rotation3::from_matrix_unchecked(Matrix3::from_columns(&[x, y, z]))
}

/// Builds a right-handed orthonormal frame with prescribed `x` and `z`
/// columns. `x` is re-orthogonalized against `z`.
#[must_use]
pub fn frame_from_xz(x: &Vector3, z: &Vector3) -> Rotation3 {
    let z = z.normalize();
    let x = (x - z * x.dot(&z)).normalize();
    let y = z.cross(&x);
    Rotation3::from_matrix_unchecked(Matrix3::from_columns(&[x, y, z]))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::f64::consts::{PI, TAU};

    #[test]
    fn normalize_wraps_negative() {
        let a = normalize_angle(-PI / 2.0);
        assert!((a - 3.0 * PI / 2.0).abs() < TOLERANCE);
    }

    #[test]
    fn normalize_wraps_above_tau() {
        let a = normalize_angle(TAU + 0.25);
        assert!((a - 0.25).abs() < TOLERANCE);
    }

    #[test]
    fn perpendicular_is_perpendicular() {
        for v in [
            Vector3::new(1.0, 2.0, 3.0),
            Vector3::z(),
            Vector3::new(-0.3, 0.0, 0.1),
        ] {
            let p = arbitrary_perpendicular(&v);
            assert!(v.dot(&p).abs() < TOLERANCE);
            assert!((p.norm() - 1.0).abs() < TOLERANCE);
        }
    }

    #[test]
    fn frame_is_orthonormal() {
        let f = frame_from_z(&Vector3::new(0.2, -0.7, 0.4));
        let m = f.matrix();
        assert!((m.determinant() - 1.0).abs() < 1e-9);
        assert!((m * m.transpose() - Matrix3::identity()).norm() < 1e-9);
    }
}
