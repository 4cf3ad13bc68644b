use crate::error::{GeometryError, Result};
use crate::math::{Vector3, TOLERANCE};

/// Intersects two circles on the unit sphere given as planes
/// `p . n = h` with unit normals.
///
/// Solves in the span of the two normals: `p = a n1 + b n2 + t (n1 x n2)`,
/// with `a`, `b` fixed by the plane offsets and `t` by `|p| = 1`. Returns
/// zero, one (tangent) or two points.
///
/// # Errors
///
/// Returns an error when the circles are coincident.
pub fn circle_circle(
    n1: &Vector3,
    h1: f64,
    n2: &Vector3,
    h2: f64,
    eps: f64,
) -> Result<Vec<Vector3>> {
    let d = n1.dot(n2);
    let w = n1.cross(n2);
    let w_sq = w.norm_squared();

    if w_sq < TOLERANCE {
        // Parallel planes: same circle or no intersection.
        let same = if d > 0.0 {
            (h1 - h2).abs() <= eps
        } else {
            (h1 + h2).abs() <= eps
        };
        if same {
            return Err(GeometryError::CoincidentCurves.into());
        }
        return Ok(Vec::new());
    }

    let a = (h1 - d * h2) / w_sq;
    let b = (h2 - d * h1) / w_sq;
    let base = n1 * a + n2 * b;
    let t_sq = (1.0 - base.norm_squared()) / w_sq;

    if t_sq < -eps {
        return Ok(Vec::new());
    }
    if t_sq <= eps {
        return Ok(vec![base.normalize()]);
    }
    let t = t_sq.sqrt();
    Ok(vec![
        (base + w * t).normalize(),
        (base - w * t).normalize(),
    ])
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::DEFAULT_EPSILON;
    use std::f64::consts::FRAC_PI_3;

    #[test]
    fn orthogonal_great_circles_meet_at_antipodes() {
        let pts = circle_circle(&Vector3::z(), 0.0, &Vector3::y(), 0.0, DEFAULT_EPSILON).unwrap();
        assert_eq!(pts.len(), 2);
        assert!((pts[0] + pts[1]).norm() < 1e-12);
        for p in &pts {
            assert!(p.dot(&Vector3::z()).abs() < 1e-12);
            assert!(p.dot(&Vector3::y()).abs() < 1e-12);
        }
    }

    #[test]
    fn cone_and_equator_meet_twice() {
        // A 60-degree cone about x crosses the z = 0 great circle.
        let h = FRAC_PI_3.cos();
        let pts = circle_circle(&Vector3::x(), h, &Vector3::z(), 0.0, DEFAULT_EPSILON).unwrap();
        assert_eq!(pts.len(), 2);
        for p in &pts {
            assert!((p.norm() - 1.0).abs() < 1e-12);
            assert!((p.dot(&Vector3::x()) - h).abs() < 1e-9);
            assert!(p.z.abs() < 1e-9);
        }
    }

    #[test]
    fn disjoint_caps_do_not_meet() {
        let h = 0.9;
        let pts = circle_circle(&Vector3::z(), h, &-Vector3::z(), h, DEFAULT_EPSILON).unwrap();
        assert!(pts.is_empty());
    }

    #[test]
    fn tangent_circles_meet_once() {
        // Caps of half-angle pi/3 about axes 2*pi/3 apart touch in one point.
        let axis2 = Vector3::new((2.0 * FRAC_PI_3).sin(), 0.0, (2.0 * FRAC_PI_3).cos());
        let h = FRAC_PI_3.cos();
        let pts = circle_circle(&Vector3::z(), h, &axis2, h, 1e-9).unwrap();
        assert_eq!(pts.len(), 1);
        let expected = Vector3::new(FRAC_PI_3.sin(), 0.0, FRAC_PI_3.cos());
        assert!((pts[0] - expected).norm() < 1e-6);
    }

    #[test]
    fn coincident_circles_rejected() {
        let r = circle_circle(&Vector3::z(), 0.5, &Vector3::z(), 0.5, DEFAULT_EPSILON);
        assert!(r.is_err());
        // Opposite normal, negated height is the same circle.
        let r = circle_circle(&Vector3::z(), 0.5, &-Vector3::z(), -0.5, DEFAULT_EPSILON);
        assert!(r.is_err());
    }
}
