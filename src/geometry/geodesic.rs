use crate::error::{GeometryError, Result};
use crate::math::{self, normalize_angle, Rotation3, Vector3, TOLERANCE};

/// Two unit vectors are treated as the same sphere point below this
/// chordal distance.
const POINT_IDENTITY_EPSILON: f64 = 1e-12;

/// A great circle on the unit sphere, parameterized counterclockwise
/// around its normal.
#[derive(Debug, Clone, PartialEq)]
pub struct GeodesicCurve {
    normal: Vector3,
    frame: Rotation3,
}

impl GeodesicCurve {
    /// Creates the great circle with the given plane normal.
    ///
    /// # Errors
    ///
    /// Returns an error if the normal has zero length.
    pub fn new(normal: &Vector3) -> Result<Self> {
        if normal.norm() < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }
        let frame = math::frame_from_z(normal);
        Ok(Self {
            normal: normal.normalize(),
            frame,
        })
    }

    /// Creates the unique great circle through two unit points, oriented so
    /// the parameter runs from `a` toward `b` the short way.
    ///
    /// # Errors
    ///
    /// Returns an error if the points are identical or antipodal.
    pub fn by_points(a: &Vector3, b: &Vector3) -> Result<Self> {
        if (a - b).norm() < POINT_IDENTITY_EPSILON {
            return Err(GeometryError::Degenerate("geodesic endpoints are identical".into()).into());
        }
        if a.dot(b) < -1.0 + POINT_IDENTITY_EPSILON {
            return Err(GeometryError::AntipodalPoints.into());
        }
        Self::new(&a.cross(b))
    }

    /// Like [`Self::by_points`], but an antipodal pair gets an arbitrary
    /// great circle through both points instead of an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the points are identical.
    pub fn by_points_with_arbitrary_normal(a: &Vector3, b: &Vector3) -> Result<Self> {
        if a.dot(b) < -1.0 + POINT_IDENTITY_EPSILON {
            return Self::new(&math::arbitrary_perpendicular(a));
        }
        Self::by_points(a, b)
    }

    #[must_use]
    pub fn normal(&self) -> &Vector3 {
        &self.normal
    }

    /// The same great circle traversed in the opposite direction.
    #[must_use]
    pub fn reversed(&self) -> Self {
        let normal = -self.normal;
        Self {
            normal,
            frame: math::frame_from_z(&normal),
        }
    }

    #[must_use]
    pub fn point(&self, theta: f64) -> Vector3 {
        self.frame * Vector3::new(theta.cos(), theta.sin(), 0.0)
    }

    #[must_use]
    pub fn angle(&self, p: &Vector3) -> f64 {
        let q = self.frame.inverse() * p;
        normalize_angle(q.y.atan2(q.x))
    }

    #[must_use]
    pub fn derivative(&self, theta: f64) -> Vector3 {
        self.point(theta + std::f64::consts::FRAC_PI_2)
    }

    #[must_use]
    pub fn contains_point(&self, p: &Vector3, eps: f64) -> bool {
        (p.norm_squared() - 1.0).abs() <= eps && p.dot(&self.normal).abs() <= eps
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::DEFAULT_EPSILON;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn point_angle_round_trip() {
        let g = GeodesicCurve::new(&Vector3::new(0.3, -0.5, 0.8)).unwrap();
        for theta in [0.0, 1.0, FRAC_PI_2, PI, 5.5] {
            let p = g.point(theta);
            assert!((g.angle(&p) - crate::math::normalize_angle(theta)).abs() < 1e-9);
            assert!(g.contains_point(&p, DEFAULT_EPSILON));
        }
    }

    #[test]
    fn derivative_is_tangent() {
        let g = GeodesicCurve::new(&Vector3::z()).unwrap();
        let theta = 0.7;
        let p = g.point(theta);
        let d = g.derivative(theta);
        assert!(p.dot(&d).abs() < 1e-9);
        assert!(d.dot(&Vector3::z()).abs() < 1e-9);
    }

    #[test]
    fn by_points_passes_through_both() {
        let a = Vector3::new(1.0, 0.0, 0.0);
        let b = Vector3::new(0.0, 0.0, 1.0);
        let g = GeodesicCurve::by_points(&a, &b).unwrap();
        assert!(g.contains_point(&a, DEFAULT_EPSILON));
        assert!(g.contains_point(&b, DEFAULT_EPSILON));
        // Short way: b sits a quarter turn after a.
        assert!((g.angle(&b) - g.angle(&a) - FRAC_PI_2).abs() < 1e-9);
    }

    #[test]
    fn antipodal_points_rejected() {
        let a = Vector3::x();
        let b = -Vector3::x();
        assert!(GeodesicCurve::by_points(&a, &b).is_err());
        let g = GeodesicCurve::by_points_with_arbitrary_normal(&a, &b).unwrap();
        assert!(g.contains_point(&a, DEFAULT_EPSILON));
        assert!(g.contains_point(&b, DEFAULT_EPSILON));
    }

    #[test]
    fn off_plane_point_not_contained() {
        let g = GeodesicCurve::new(&Vector3::z()).unwrap();
        assert!(!g.contains_point(&Vector3::new(0.0, 0.0, 1.0), DEFAULT_EPSILON));
    }

    #[test]
    fn reversed_runs_backwards() {
        let g = GeodesicCurve::new(&Vector3::z()).unwrap();
        let r = g.reversed();
        let p = g.point(0.3);
        let q = r.point(r.angle(&p) + 0.1);
        // Moving forward on the reversed curve moves backward on the original.
        assert!(g.angle(&q) < g.angle(&p));
    }
}
