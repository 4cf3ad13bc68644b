use crate::error::{NumericsError, Result};
use crate::math::{roots, Vector3};

use super::rdc::RdcCurve;

/// An RDC iso-curve pushed sideways along the sphere by a fixed geodesic
/// distance, used to widen band boundaries by their experimental
/// uncertainty.
///
/// Each base point is rotated about the curve's unit tangent by the signed
/// offset angle. There is no closed-form inverse: [`Self::angle`] recovers
/// the parameter numerically.
#[derive(Debug, Clone, PartialEq)]
pub struct RdcOffsetCurve {
    base: RdcCurve,
    distance: f64,
}

impl RdcOffsetCurve {
    #[must_use]
    pub fn new(base: RdcCurve, distance: f64) -> Self {
        Self { base, distance }
    }

    #[must_use]
    pub fn base(&self) -> &RdcCurve {
        &self.base
    }

    /// Signed geodesic offset distance in radians.
    #[must_use]
    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// Offset point at parameter `theta` of the base curve.
    ///
    /// Non-finite at the base curve's singular parameters (where the
    /// tangent is undefined); numeric consumers skip such samples.
    #[must_use]
    pub fn point(&self, theta: f64) -> Vector3 {
        let Some(d) = self.base.derivative(theta) else {
            return Vector3::repeat(f64::NAN);
        };
        let p = self.base.point(theta);
        let t = d / d.norm();
        // The tangent is perpendicular to p, so the axis-angle rotation
        // reduces to two terms.
        p * self.distance.cos() + t.cross(&p) * self.distance.sin()
    }

    #[must_use]
    pub fn derivative(&self, theta: f64) -> Option<Vector3> {
        let d = self.base.derivative(theta)?;
        let d2 = self.base.second_derivative(theta)?;
        let p = self.base.point(theta);
        let n = d.norm();
        let t = d / n;
        let dt = d2 / n - d * (d.dot(&d2) / (n * n * n));
        Some(d * self.distance.cos() + (dt.cross(&p) + t.cross(&d)) * self.distance.sin())
    }

    /// Recovers the base parameter whose offset point is `p`.
    ///
    /// Finds the critical points of `point(theta) . p` by scanning for
    /// roots of its derivative, then keeps the best-aligned one.
    ///
    /// # Errors
    ///
    /// Fails when no critical point exists (numeric non-convergence); the
    /// error carries the query point.
    pub fn angle(&self, p: &Vector3) -> Result<f64> {
        let objective = |theta: f64| match self.derivative(theta) {
            Some(d) => d.dot(p),
            None => f64::NAN,
        };
        let candidates = roots::periodic_roots(objective, roots::DEFAULT_SAMPLES, 1e-9);
        candidates
            .into_iter()
            .map(|theta| (theta, self.point(theta).dot(p)))
            .filter(|(_, align)| align.is_finite())
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(theta, _)| theta)
            .ok_or_else(|| {
                NumericsError::AngleRecovery {
                    x: p.x,
                    y: p.y,
                    z: p.z,
                    reason: "no critical point of the offset alignment objective".into(),
                }
                .into()
            })
    }

    /// Whether `p` lies on the offset curve.
    ///
    /// # Errors
    ///
    /// Propagates angle-recovery failures.
    pub fn contains_point(&self, p: &Vector3, eps: f64) -> Result<bool> {
        if (p.norm_squared() - 1.0).abs() > eps {
            return Ok(false);
        }
        let theta = self.angle(p)?;
        Ok(self.point(theta).dot(p) >= 1.0 - eps)
    }

    #[must_use]
    pub fn has_length(&self) -> bool {
        self.base.has_length()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::tensor::AlignmentTensor;
    use crate::math::DEFAULT_EPSILON;

    fn offset_curve(distance: f64) -> RdcOffsetCurve {
        let tensor = AlignmentTensor::diagonal(-4.0, -8.0, 12.0).unwrap();
        RdcOffsetCurve::new(RdcCurve::new(&tensor, 2.0, 1).unwrap(), distance)
    }

    #[test]
    fn offset_points_stay_on_sphere() {
        let c = offset_curve(0.05);
        for theta in [0.2, 1.1, 2.8, 4.6] {
            let p = c.point(theta);
            assert!((p.norm() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn offset_moves_by_the_distance() {
        let c = offset_curve(0.05);
        for theta in [0.3, 2.0, 5.1] {
            let gap = c.base().point(theta).dot(&c.point(theta)).acos();
            assert!((gap - 0.05).abs() < 1e-9);
        }
    }

    #[test]
    fn offset_leaves_the_iso_value() {
        let c = offset_curve(0.08);
        let p = c.point(1.0);
        let residual = (c.base().tensor().back_compute(&p) - c.base().d()).abs();
        assert!(residual > 1e-4);
    }

    #[test]
    fn derivative_matches_finite_difference() {
        let c = offset_curve(0.05);
        let h = 1e-6;
        for theta in [0.4, 1.7, 3.9] {
            let numeric = (c.point(theta + h) - c.point(theta - h)) / (2.0 * h);
            let analytic = c.derivative(theta).unwrap();
            assert!((numeric - analytic).norm() < 1e-4);
        }
    }

    #[test]
    fn angle_recovers_parameter() {
        let c = offset_curve(0.05);
        for theta in [0.5, 2.3, 4.0] {
            let p = c.point(theta);
            let recovered = c.angle(&p).unwrap();
            assert!((c.point(recovered) - p).norm() < 1e-6);
            assert!(c.contains_point(&p, DEFAULT_EPSILON).unwrap());
        }
    }

    #[test]
    fn off_curve_point_not_contained() {
        let c = offset_curve(0.05);
        assert!(!c.contains_point(&Vector3::z(), DEFAULT_EPSILON).unwrap());
    }
}
