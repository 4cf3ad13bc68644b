pub mod circular;
pub mod elliptical;
pub mod geodesic;
pub mod offset;
pub mod rdc;
pub mod tensor;

pub use circular::CircularCurve;
pub use elliptical::{ApexMode, EllipticalCurve};
pub use geodesic::GeodesicCurve;
pub use offset::RdcOffsetCurve;
pub use rdc::{RdcCurve, SymmetryAxis};
pub use tensor::AlignmentTensor;

use crate::error::{GeometryError, Result};
use crate::math::{normalize_angle, CircleRange, Vector3, TOLERANCE};

/// Two unit vectors below this chordal distance are the same endpoint.
pub(crate) const ENDPOINT_EPSILON: f64 = 1e-12;

/// A closed analytic curve on the unit sphere, parameterized by an angle in
/// `[0, 2*pi)`.
///
/// Closed tagged union over the five supported kinds; intersection dispatch
/// matches on pairs of variants.
#[derive(Debug, Clone, PartialEq)]
pub enum Curve {
    Geodesic(GeodesicCurve),
    Circular(CircularCurve),
    Elliptical(EllipticalCurve),
    Rdc(RdcCurve),
    RdcOffset(RdcOffsetCurve),
}

impl Curve {
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Curve::Geodesic(_) => "geodesic",
            Curve::Circular(_) => "circular",
            Curve::Elliptical(_) => "elliptical",
            Curve::Rdc(_) => "rdc",
            Curve::RdcOffset(_) => "rdc-offset",
        }
    }

    #[must_use]
    pub fn point(&self, theta: f64) -> Vector3 {
        match self {
            Curve::Geodesic(c) => c.point(theta),
            Curve::Circular(c) => c.point(theta),
            Curve::Elliptical(c) => c.point(theta),
            Curve::Rdc(c) => c.point(theta),
            Curve::RdcOffset(c) => c.point(theta),
        }
    }

    /// Inverse of [`Self::point`] for points on the curve.
    ///
    /// # Errors
    ///
    /// Fails at singular points (elliptical double point) and on numeric
    /// non-convergence (offset curves).
    pub fn angle(&self, p: &Vector3) -> Result<f64> {
        match self {
            Curve::Geodesic(c) => Ok(c.angle(p)),
            Curve::Circular(c) => Ok(c.angle(p)),
            Curve::Elliptical(c) => c.angle(p),
            Curve::Rdc(c) => Ok(c.angle(p)),
            Curve::RdcOffset(c) => c.angle(p),
        }
    }

    /// Parameter derivative; `None` at removable singularities of RDC and
    /// offset arcs.
    #[must_use]
    pub fn derivative(&self, theta: f64) -> Option<Vector3> {
        match self {
            Curve::Geodesic(c) => Some(c.derivative(theta)),
            Curve::Circular(c) => Some(c.derivative(theta)),
            Curve::Elliptical(c) => Some(c.derivative(theta)),
            Curve::Rdc(c) => c.derivative(theta),
            Curve::RdcOffset(c) => c.derivative(theta),
        }
    }

    /// Whether `p` lies on the curve within `eps`.
    ///
    /// # Errors
    ///
    /// Propagates numeric angle-recovery failures for offset curves.
    pub fn contains_point(&self, p: &Vector3, eps: f64) -> Result<bool> {
        match self {
            Curve::Geodesic(c) => Ok(c.contains_point(p, eps)),
            Curve::Circular(c) => Ok(c.contains_point(p, eps)),
            Curve::Elliptical(c) => Ok(c.contains_point(p, eps)),
            Curve::Rdc(c) => Ok(c.contains_point(p, eps)),
            Curve::RdcOffset(c) => c.contains_point(p, eps),
        }
    }

    /// `false` for curves degenerated to a point.
    #[must_use]
    pub fn has_length(&self) -> bool {
        match self {
            Curve::Geodesic(_) | Curve::Elliptical(_) => true,
            Curve::Circular(c) => c.has_length(),
            Curve::Rdc(c) => c.has_length(),
            Curve::RdcOffset(c) => c.has_length(),
        }
    }

    /// The full curve as a closed arc anchored at parameter zero.
    #[must_use]
    pub fn closed_arc(&self) -> CurveArc {
        CurveArc::new(self.clone(), CircleRange::circle(0.0))
    }
}

/// A directed sub-range of a [`Curve`], or the whole closed curve.
#[derive(Debug, Clone, PartialEq)]
pub struct CurveArc {
    curve: Curve,
    range: CircleRange,
}

impl CurveArc {
    #[must_use]
    pub fn new(curve: Curve, range: CircleRange) -> Self {
        Self { curve, range }
    }

    #[must_use]
    pub fn curve(&self) -> &Curve {
        &self.curve
    }

    #[must_use]
    pub fn range(&self) -> &CircleRange {
        &self.range
    }

    #[must_use]
    pub fn source(&self) -> Vector3 {
        self.curve.point(self.range.source())
    }

    #[must_use]
    pub fn target(&self) -> Vector3 {
        self.curve.point(self.range.target())
    }

    #[must_use]
    pub fn midpoint(&self) -> Vector3 {
        self.curve.point(self.range.midpoint())
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.range.is_circle()
    }

    #[must_use]
    pub fn has_length(&self) -> bool {
        self.curve.has_length() && self.range.length() > TOLERANCE
    }

    /// Same arc traversed the other way.
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self {
            curve: self.curve.clone(),
            range: self.range.reversed(),
        }
    }

    /// Whether `p` lies on the arc: on the curve and within the angular
    /// range.
    ///
    /// # Errors
    ///
    /// Propagates numeric angle-recovery failures.
    pub fn contains_point(&self, p: &Vector3, eps: f64) -> Result<bool> {
        if !self.curve.contains_point(p, eps)? {
            return Ok(false);
        }
        if self.range.is_circle() {
            return Ok(true);
        }
        let theta = self.curve.angle(p)?;
        Ok(self.range.contains(theta, eps))
    }

    /// Whether `p` coincides with either endpoint.
    #[must_use]
    pub fn is_endpoint(&self, p: &Vector3) -> bool {
        (self.source() - p).norm() < ENDPOINT_EPSILON || (self.target() - p).norm() < ENDPOINT_EPSILON
    }

    /// Given one endpoint, the other one. `None` if `p` is not an endpoint.
    #[must_use]
    pub fn other_endpoint(&self, p: &Vector3) -> Option<Vector3> {
        if (self.source() - p).norm() < ENDPOINT_EPSILON {
            Some(self.target())
        } else if (self.target() - p).norm() < ENDPOINT_EPSILON {
            Some(self.source())
        } else {
            None
        }
    }

    /// Splits the arc at an interior point.
    ///
    /// # Errors
    ///
    /// Returns an error if `p` is not in the arc's interior.
    pub fn split_at(&self, p: &Vector3, eps: f64) -> Result<(CurveArc, CurveArc)> {
        let theta = self.curve.angle(p)?;
        let pos = self.position_of(theta);
        if !self.range.is_circle()
            && (pos < TOLERANCE || pos > self.range.length() - TOLERANCE || !self.range.contains(theta, eps))
        {
            return Err(GeometryError::PointNotOnCurve {
                x: p.x,
                y: p.y,
                z: p.z,
            }
            .into());
        }
        let (first, second) = self.range.split(theta);
        Ok((
            Self::new(self.curve.clone(), first),
            Self::new(self.curve.clone(), second),
        ))
    }

    /// Splits the arc at every given interior point, in curve order.
    ///
    /// Points at the endpoints and duplicates are skipped. Splitting a
    /// closed arc at one point re-anchors it; at two or more points it
    /// yields that many open arcs.
    ///
    /// # Errors
    ///
    /// Propagates angle-recovery failures.
    pub fn split_at_many(&self, points: &[Vector3], eps: f64) -> Result<Vec<CurveArc>> {
        let mut positions = Vec::with_capacity(points.len());
        for p in points {
            let theta = self.curve.angle(p)?;
            let pos = self.position_of(theta);
            if self.range.is_circle() {
                positions.push((pos, theta));
            } else if self.range.contains(theta, eps)
                && pos > TOLERANCE
                && pos < self.range.length() - TOLERANCE
            {
                positions.push((pos, theta));
            }
        }
        positions.sort_by(|a, b| a.0.total_cmp(&b.0));
        positions.dedup_by(|a, b| (a.0 - b.0).abs() < TOLERANCE);

        if self.range.is_circle() {
            return Ok(self.split_closed(&positions));
        }

        let mut pieces = Vec::with_capacity(positions.len() + 1);
        let mut rest = self.range;
        for &(_, theta) in &positions {
            let (head, tail) = rest.split(theta);
            if head.length() > TOLERANCE {
                pieces.push(Self::new(self.curve.clone(), head));
            }
            rest = tail;
        }
        if rest.length() > TOLERANCE {
            pieces.push(Self::new(self.curve.clone(), rest));
        }
        Ok(pieces)
    }

    fn split_closed(&self, positions: &[(f64, f64)]) -> Vec<CurveArc> {
        let ccw = self.range.is_counterclockwise();
        match positions {
            [] => vec![self.clone()],
            [(_, theta)] => {
                // One point cannot cut a loop; re-anchor there.
                let range = if ccw {
                    CircleRange::circle(*theta)
                } else {
                    CircleRange::circle(*theta).reversed()
                };
                vec![Self::new(self.curve.clone(), range)]
            }
            _ => {
                let mut pieces = Vec::with_capacity(positions.len());
                for (i, &(pos, theta)) in positions.iter().enumerate() {
                    let (next_pos, _) = positions[(i + 1) % positions.len()];
                    let mut sweep = normalize_angle(next_pos - pos);
                    if sweep < TOLERANCE {
                        sweep = std::f64::consts::TAU;
                    }
                    let offset = if ccw { sweep } else { -sweep };
                    pieces.push(Self::new(
                        self.curve.clone(),
                        CircleRange::by_offset(theta, offset),
                    ));
                }
                pieces
            }
        }
    }

    /// Directed angular distance of `theta` from the arc source.
    fn position_of(&self, theta: f64) -> f64 {
        if self.range.is_counterclockwise() {
            normalize_angle(theta - self.range.source())
        } else {
            normalize_angle(self.range.source() - theta)
        }
    }

    /// `n + 1` points spaced uniformly in parameter, endpoints included.
    #[must_use]
    pub fn sample_points(&self, n: usize) -> Vec<Vector3> {
        self.range
            .samples(n)
            .into_iter()
            .map(|theta| self.curve.point(theta))
            .collect()
    }

    /// Chord-sum approximation of the arc length.
    #[must_use]
    pub fn approximate_length(&self, n: usize) -> f64 {
        let samples = self.sample_points(n);
        samples.windows(2).map(|w| (w[1] - w[0]).norm()).sum()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::DEFAULT_EPSILON;
    use std::f64::consts::{FRAC_PI_2, PI, TAU};

    fn equator_arc(a: f64, b: f64) -> CurveArc {
        let curve = Curve::Geodesic(GeodesicCurve::new(&Vector3::z()).unwrap());
        CurveArc::new(curve, CircleRange::by_counterclockwise(a, b))
    }

    #[test]
    fn endpoints_evaluate_on_curve() {
        let arc = equator_arc(0.0, FRAC_PI_2);
        assert!((arc.source() - Vector3::x()).norm() < 1e-12);
        assert!((arc.target() - Vector3::y()).norm() < 1e-12);
        assert!(arc.contains_point(&arc.midpoint(), DEFAULT_EPSILON).unwrap());
    }

    #[test]
    fn out_of_range_point_rejected() {
        let arc = equator_arc(0.0, FRAC_PI_2);
        let behind = Vector3::new((-0.3_f64).cos(), (-0.3_f64).sin(), 0.0);
        assert!(!arc.contains_point(&behind, DEFAULT_EPSILON).unwrap());
    }

    #[test]
    fn split_round_trip_preserves_endpoints() {
        let arc = equator_arc(0.5, 2.5);
        let mid = arc.midpoint();
        let (a, b) = arc.split_at(&mid, DEFAULT_EPSILON).unwrap();
        assert!((a.source() - arc.source()).norm() < 1e-9);
        assert!((a.target() - mid).norm() < 1e-9);
        assert!((b.source() - mid).norm() < 1e-9);
        assert!((b.target() - arc.target()).norm() < 1e-9);
    }

    #[test]
    fn split_at_endpoint_rejected() {
        let arc = equator_arc(0.5, 2.5);
        assert!(arc.split_at(&arc.source(), DEFAULT_EPSILON).is_err());
    }

    #[test]
    fn multi_split_orders_points() {
        let arc = equator_arc(0.0, 3.0);
        let curve = arc.curve().clone();
        // Deliberately out of order.
        let points = vec![curve.point(2.0), curve.point(1.0)];
        let pieces = arc.split_at_many(&points, DEFAULT_EPSILON).unwrap();
        assert_eq!(pieces.len(), 3);
        assert!((pieces[0].target() - curve.point(1.0)).norm() < 1e-9);
        assert!((pieces[1].target() - curve.point(2.0)).norm() < 1e-9);
        assert!((pieces[2].target() - arc.target()).norm() < 1e-9);
    }

    #[test]
    fn closed_arc_splits_into_two() {
        let curve = Curve::Geodesic(GeodesicCurve::new(&Vector3::z()).unwrap());
        let arc = curve.closed_arc();
        let points = vec![curve.point(0.0), curve.point(PI)];
        let pieces = arc.split_at_many(&points, DEFAULT_EPSILON).unwrap();
        assert_eq!(pieces.len(), 2);
        for piece in &pieces {
            assert!(!piece.is_closed());
            assert!((piece.range().length() - PI).abs() < 1e-9);
        }
    }

    #[test]
    fn closed_arc_single_split_re_anchors() {
        let curve = Curve::Geodesic(GeodesicCurve::new(&Vector3::z()).unwrap());
        let arc = curve.closed_arc();
        let pieces = arc
            .split_at_many(&[curve.point(1.0)], DEFAULT_EPSILON)
            .unwrap();
        assert_eq!(pieces.len(), 1);
        assert!(pieces[0].is_closed());
        assert!((pieces[0].range().source() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn reversed_swaps_direction() {
        let arc = equator_arc(0.0, 1.0);
        let rev = arc.reversed();
        assert!((rev.source() - arc.target()).norm() < 1e-12);
        assert!((rev.target() - arc.source()).norm() < 1e-12);
    }

    #[test]
    fn length_of_quarter_equator() {
        let arc = equator_arc(0.0, FRAC_PI_2);
        let len = arc.approximate_length(64);
        assert!((len - FRAC_PI_2).abs() < 1e-3);
    }

    #[test]
    fn closed_arc_has_full_range() {
        let curve = Curve::Circular(CircularCurve::new(&Vector3::z(), 0.5).unwrap());
        let arc = curve.closed_arc();
        assert!(arc.is_closed());
        assert!((arc.range().length() - TAU).abs() < 1e-12);
    }
}
