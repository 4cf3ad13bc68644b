pub mod builder;

pub use builder::{dilated_face, BandSelection, DilatedFace, IntersectionFaceBuilder};

use std::f64::consts::PI;

use crate::error::{GeometryError, Result};
use crate::geometry::{AlignmentTensor, CircularCurve, Curve, CurveArc, RdcCurve};
use crate::math::Vector3;

/// Which bounding curve of a band an arc belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BandPart {
    /// The lower bound of the band's value range.
    Min,
    /// The band's central value.
    Mid,
    /// The upper bound of the band's value range.
    Max,
}

/// A sphere region consistent with one experimental constraint within
/// its error, bounded by Min/Max curves.
pub trait Band {
    /// Whether `p` lies in the band, boundary included.
    ///
    /// # Errors
    ///
    /// Propagates numeric failures.
    fn contains_point(&self, p: &Vector3, eps: f64) -> Result<bool>;

    /// Whether `p` lies on one of the band's bounding curves.
    ///
    /// # Errors
    ///
    /// Propagates numeric failures.
    fn boundary_contains_point(&self, p: &Vector3, eps: f64) -> Result<bool>;

    /// Whether `curve` is one of this band's bounding curves.
    fn has_curve_on_boundary(&self, curve: &Curve) -> bool;

    /// The bounding arcs to insert into an arrangement. Degenerate
    /// bounds (clamped to a point) are omitted.
    fn boundary_arcs(&self) -> Vec<CurveArc>;
}

/// A cone/annulus constraint about an axis: the polar angle to the axis
/// must stay within `theta` plus or minus `delta`.
#[derive(Debug, Clone)]
pub struct KinematicBand {
    axis: Vector3,
    lo: f64,
    hi: f64,
    min: Option<CircularCurve>,
    max: Option<CircularCurve>,
}

impl KinematicBand {
    /// Builds the band about `axis`. Bounds are clamped to `[0, pi]`; a
    /// bound that degenerates to a pole contributes no curve.
    ///
    /// # Errors
    ///
    /// Rejects a zero axis, `theta` outside `[0, pi]` and non-positive
    /// `delta`.
    pub fn new(axis: &Vector3, theta: f64, delta: f64) -> Result<Self> {
        if axis.norm_squared() <= f64::EPSILON {
            return Err(GeometryError::ZeroVector.into());
        }
        if !(0.0..=PI).contains(&theta) {
            return Err(GeometryError::ParameterOutOfRange {
                parameter: "theta",
                value: theta,
                min: 0.0,
                max: PI,
            }
            .into());
        }
        if delta <= 0.0 || delta > PI {
            return Err(GeometryError::ParameterOutOfRange {
                parameter: "delta",
                value: delta,
                min: 0.0,
                max: PI,
            }
            .into());
        }
        let axis = axis.normalize();
        let lo = (theta - delta).max(0.0);
        let hi = (theta + delta).min(PI);
        let bound = |angle: f64| -> Result<Option<CircularCurve>> {
            if angle <= 0.0 || angle >= PI {
                return Ok(None);
            }
            let curve = CircularCurve::new(&axis, angle)?;
            Ok(curve.has_length().then_some(curve))
        };
        let (min, max) = (bound(lo)?, bound(hi)?);
        Ok(Self {
            axis,
            lo,
            hi,
            min,
            max,
        })
    }

    #[must_use]
    pub fn axis(&self) -> &Vector3 {
        &self.axis
    }

    /// The band's polar-angle interval.
    #[must_use]
    pub fn angle_range(&self) -> (f64, f64) {
        (self.lo, self.hi)
    }

    /// Which bound `curve` is, if any.
    #[must_use]
    pub fn part_of(&self, curve: &Curve) -> Option<BandPart> {
        let is = |bound: &Option<CircularCurve>| {
            bound
                .as_ref()
                .is_some_and(|c| Curve::Circular(c.clone()) == *curve)
        };
        if is(&self.min) {
            Some(BandPart::Min)
        } else if is(&self.max) {
            Some(BandPart::Max)
        } else {
            None
        }
    }
}

impl Band for KinematicBand {
    fn contains_point(&self, p: &Vector3, eps: f64) -> Result<bool> {
        let angle = self.axis.dot(p).clamp(-1.0, 1.0).acos();
        Ok(angle >= self.lo - eps && angle <= self.hi + eps)
    }

    fn boundary_contains_point(&self, p: &Vector3, eps: f64) -> Result<bool> {
        let on = |bound: &Option<CircularCurve>| {
            bound.as_ref().is_some_and(|c| c.contains_point(p, eps))
        };
        Ok(on(&self.min) || on(&self.max))
    }

    fn has_curve_on_boundary(&self, curve: &Curve) -> bool {
        self.part_of(curve).is_some()
    }

    fn boundary_arcs(&self) -> Vec<CurveArc> {
        [&self.min, &self.max]
            .into_iter()
            .flatten()
            .map(|c| Curve::Circular(c.clone()).closed_arc())
            .collect()
    }
}

/// An RDC constraint: the back-computed coupling of the orientation
/// must stay within `d` plus or minus `error`, both clamped to the
/// tensor's feasible range.
///
/// `eps` arguments are interpreted relative to the tensor's coupling
/// span, so one spatial tolerance works for every band kind.
#[derive(Debug, Clone)]
pub struct RdcBand {
    tensor: AlignmentTensor,
    d_min: f64,
    d_max: f64,
    curves: Vec<(BandPart, RdcCurve)>,
}

impl RdcBand {
    /// Builds the band for the coupling interval `d` plus or minus
    /// `error`. Each bound contributes up to two iso-curve loops, one
    /// per symmetry half; bounds clamped onto the range limit
    /// degenerate and are skipped.
    ///
    /// # Errors
    ///
    /// Rejects a negative `error` and a `d` outside the tensor's
    /// feasible coupling range.
    pub fn new(tensor: &AlignmentTensor, d: f64, error: f64) -> Result<Self> {
        if error < 0.0 {
            return Err(GeometryError::ParameterOutOfRange {
                parameter: "error",
                value: error,
                min: 0.0,
                max: f64::INFINITY,
            }
            .into());
        }
        let (range_lo, range_hi) = tensor.rdc_range();
        if !tensor.is_rdc_in_range(d) {
            return Err(GeometryError::ParameterOutOfRange {
                parameter: "d",
                value: d,
                min: range_lo,
                max: range_hi,
            }
            .into());
        }
        let d_min = (d - error).max(range_lo);
        let d_max = (d + error).min(range_hi);
        let mut curves = Vec::with_capacity(4);
        let mut bounds = vec![(BandPart::Min, d_min)];
        // A zero-width interval has one bounding curve, not two copies.
        if d_max > d_min {
            bounds.push((BandPart::Max, d_max));
        }
        for (part, value) in bounds {
            for arcnum in 0..2u8 {
                let curve = RdcCurve::new(tensor, value, arcnum)?;
                if curve.has_length() {
                    curves.push((part, curve));
                }
            }
        }
        Ok(Self {
            tensor: tensor.clone(),
            d_min,
            d_max,
            curves,
        })
    }

    /// The band's coupling interval after clamping.
    #[must_use]
    pub fn coupling_range(&self) -> (f64, f64) {
        (self.d_min, self.d_max)
    }

    #[must_use]
    pub fn tensor(&self) -> &AlignmentTensor {
        &self.tensor
    }

    /// Which bound `curve` is, if any.
    #[must_use]
    pub fn part_of(&self, curve: &Curve) -> Option<BandPart> {
        self.curves
            .iter()
            .find(|(_, c)| Curve::Rdc(c.clone()) == *curve)
            .map(|&(part, _)| part)
    }

    fn coupling_eps(&self, eps: f64) -> f64 {
        let (lo, hi) = self.tensor.rdc_range();
        eps * (hi - lo).abs()
    }
}

impl Band for RdcBand {
    fn contains_point(&self, p: &Vector3, eps: f64) -> Result<bool> {
        let back = self.tensor.back_compute(p);
        let tol = self.coupling_eps(eps);
        Ok(back >= self.d_min - tol && back <= self.d_max + tol)
    }

    fn boundary_contains_point(&self, p: &Vector3, eps: f64) -> Result<bool> {
        let tol = self.coupling_eps(eps);
        Ok(self
            .curves
            .iter()
            .any(|(_, c)| c.contains_point(p, tol)))
    }

    fn has_curve_on_boundary(&self, curve: &Curve) -> bool {
        self.part_of(curve).is_some()
    }

    fn boundary_arcs(&self) -> Vec<CurveArc> {
        self.curves
            .iter()
            .map(|(_, c)| Curve::Rdc(c.clone()).closed_arc())
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::DEFAULT_EPSILON;

    fn tensor() -> AlignmentTensor {
        AlignmentTensor::diagonal(-4.0, -8.0, 12.0).unwrap()
    }

    #[test]
    fn kinematic_band_bounds_and_membership() {
        let band = KinematicBand::new(&Vector3::z(), 30.0_f64.to_radians(), 10.0_f64.to_radians())
            .unwrap();
        assert_eq!(band.boundary_arcs().len(), 2);

        let inside = Vector3::new(30.0_f64.to_radians().sin(), 0.0, 30.0_f64.to_radians().cos());
        let outside = Vector3::new(10.0_f64.to_radians().sin(), 0.0, 10.0_f64.to_radians().cos());
        let rim = Vector3::new(20.0_f64.to_radians().sin(), 0.0, 20.0_f64.to_radians().cos());
        assert!(band.contains_point(&inside, DEFAULT_EPSILON).unwrap());
        assert!(!band.contains_point(&outside, DEFAULT_EPSILON).unwrap());
        assert!(band.boundary_contains_point(&rim, DEFAULT_EPSILON).unwrap());
        assert!(!band.boundary_contains_point(&inside, DEFAULT_EPSILON).unwrap());
    }

    #[test]
    fn kinematic_band_degenerates_to_a_cap() {
        let band = KinematicBand::new(&Vector3::z(), 5.0_f64.to_radians(), 10.0_f64.to_radians())
            .unwrap();
        // The lower bound clamps onto the pole and vanishes.
        assert_eq!(band.boundary_arcs().len(), 1);
        assert!(band.contains_point(&Vector3::z(), DEFAULT_EPSILON).unwrap());
    }

    #[test]
    fn kinematic_band_rejects_bad_parameters() {
        assert!(KinematicBand::new(&Vector3::zeros(), 0.5, 0.1).is_err());
        assert!(KinematicBand::new(&Vector3::z(), -0.1, 0.1).is_err());
        assert!(KinematicBand::new(&Vector3::z(), 0.5, 0.0).is_err());
    }

    #[test]
    fn rdc_band_has_four_loops_for_an_interior_coupling() {
        let band = RdcBand::new(&tensor(), 2.0, 1.0).unwrap();
        assert_eq!(band.boundary_arcs().len(), 4);
        assert_eq!(band.coupling_range(), (1.0, 3.0));
    }

    #[test]
    fn rdc_band_membership_follows_back_computation() {
        let band = RdcBand::new(&tensor(), 2.0, 1.0).unwrap();
        // back(+z) = 12, far above the band.
        assert!(!band.contains_point(&Vector3::z(), DEFAULT_EPSILON).unwrap());
        // On the x-z plane back = 12 - 16 sin^2, so sin^2 = 10/16 gives d = 2.
        let theta = (10.0_f64 / 16.0).sqrt().asin();
        let mid = Vector3::new(theta.sin(), 0.0, theta.cos());
        assert!(band.contains_point(&mid, DEFAULT_EPSILON).unwrap());
        assert!(!band.boundary_contains_point(&mid, DEFAULT_EPSILON).unwrap());
    }

    #[test]
    fn rdc_band_boundary_points_lie_on_its_curves() {
        let band = RdcBand::new(&tensor(), 2.0, 1.0).unwrap();
        for arc in band.boundary_arcs() {
            let p = arc.midpoint();
            assert!(band.boundary_contains_point(&p, DEFAULT_EPSILON).unwrap());
            assert!(band.contains_point(&p, DEFAULT_EPSILON).unwrap());
            assert!(band.has_curve_on_boundary(arc.curve()));
        }
    }

    #[test]
    fn rdc_band_clamps_to_the_feasible_range() {
        let band = RdcBand::new(&tensor(), 11.5, 2.0).unwrap();
        let (lo, hi) = band.coupling_range();
        assert!((lo - 9.5).abs() < 1e-12);
        assert!((hi - 12.0).abs() < 1e-12);
        // The upper bound sits on the range limit and degenerates.
        assert_eq!(band.boundary_arcs().len(), 2);
    }

    #[test]
    fn rdc_band_rejects_out_of_range_coupling() {
        assert!(RdcBand::new(&tensor(), 20.0, 1.0).is_err());
        assert!(RdcBand::new(&tensor(), 2.0, -1.0).is_err());
    }
}
