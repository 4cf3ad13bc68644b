use crate::error::{GeometryError, Result, TopologyError};
use crate::geometry::CurveArc;

use super::{Arrangement, Halfedge};

/// Endpoint tolerance for linking chain arcs.
const CONNECT_EPSILON: f64 = 1e-10;

/// Assembles arcs, added one at a time, into a connected halfedge
/// chain.
///
/// The first arc's direction is provisional; the second arc fixes it by
/// whichever endpoint the two share. Every later arc must connect to
/// the running end of the chain. The chain closes when the running end
/// returns to the first vertex.
#[derive(Debug)]
pub struct ChainBuilder {
    arrangement: Arrangement,
    halfedges: Vec<Halfedge>,
    closed: bool,
}

impl Default for ChainBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ChainBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            arrangement: Arrangement::with_epsilon(CONNECT_EPSILON),
            halfedges: Vec::new(),
            closed: false,
        }
    }

    /// Appends an arc to the chain.
    ///
    /// # Errors
    ///
    /// Rejects closed and zero-length arcs, arcs that do not connect to
    /// the open end, and any arc once the chain has closed.
    pub fn add_arc(&mut self, arc: &CurveArc) -> Result<()> {
        if self.closed {
            return Err(TopologyError::ChainClosed.into());
        }
        if arc.is_closed() {
            return Err(GeometryError::Degenerate("closed arc cannot join a chain".into()).into());
        }
        if !arc.has_length() {
            return Err(GeometryError::Degenerate("zero-length arc in chain".into()).into());
        }

        let id = self.arrangement.insert_edge_raw(arc.clone());
        let forward = Halfedge::forward(id);
        let s = self.arrangement.halfedge_source(forward)?;
        let t = self.arrangement.halfedge_target(forward)?;

        let linked = if self.halfedges.is_empty() {
            self.halfedges.push(forward);
            true
        } else if self.halfedges.len() == 1 {
            let first = self.halfedges[0];
            let s0 = self.arrangement.halfedge_source(first)?;
            let t0 = self.arrangement.halfedge_target(first)?;
            if t0 == s {
                self.halfedges.push(forward);
                true
            } else if t0 == t {
                self.halfedges.push(forward.twin());
                true
            } else if s0 == s || s0 == t {
                // The first arc was facing the wrong way.
                self.halfedges[0] = first.twin();
                self.halfedges
                    .push(if s0 == s { forward } else { forward.twin() });
                true
            } else {
                false
            }
        } else {
            let last = *self.halfedges.last().ok_or_else(|| {
                TopologyError::InvalidTopology("empty chain after linking".into())
            })?;
            let end = self.arrangement.halfedge_target(last)?;
            if end == s {
                self.halfedges.push(forward);
                true
            } else if end == t {
                self.halfedges.push(forward.twin());
                true
            } else {
                false
            }
        };
        if !linked {
            self.arrangement.remove_edge(id)?;
            return Err(TopologyError::ChainNotConnected.into());
        }

        if self.halfedges.len() >= 2 {
            let first = self.arrangement.halfedge_source(self.halfedges[0])?;
            let last = self
                .arrangement
                .halfedge_target(*self.halfedges.last().ok_or_else(|| {
                    TopologyError::InvalidTopology("empty chain after linking".into())
                })?)?;
            if first == last {
                self.closed = true;
            }
        }
        Ok(())
    }

    /// Reverses the chain in place: the halfedge order flips and every
    /// halfedge becomes its twin.
    pub fn reverse(&mut self) {
        self.halfedges.reverse();
        for h in &mut self.halfedges {
            *h = h.twin();
        }
    }

    /// Whether the chain has come back to its first vertex.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.halfedges.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.halfedges.is_empty()
    }

    /// The chain's halfedges in traversal order.
    #[must_use]
    pub fn halfedges(&self) -> &[Halfedge] {
        &self.halfedges
    }

    #[must_use]
    pub fn arrangement(&self) -> &Arrangement {
        &self.arrangement
    }

    /// Consumes the builder, keeping the backing arrangement.
    #[must_use]
    pub fn into_arrangement(self) -> Arrangement {
        self.arrangement
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::{Curve, GeodesicCurve};
    use crate::math::{CircleRange, Vector3};
    use crate::topology::Direction;

    fn arc_between(a: &Vector3, b: &Vector3) -> CurveArc {
        let curve = Curve::Geodesic(GeodesicCurve::by_points(a, b).unwrap());
        let s = curve.angle(a).unwrap();
        let t = curve.angle(b).unwrap();
        CurveArc::new(curve, CircleRange::by_counterclockwise(s, t))
    }

    #[test]
    fn triangle_closes_on_third_arc() {
        let (a, b, c) = (Vector3::x(), Vector3::y(), Vector3::z());
        let mut chain = ChainBuilder::new();
        chain.add_arc(&arc_between(&a, &b)).unwrap();
        assert!(!chain.is_closed());
        chain.add_arc(&arc_between(&b, &c)).unwrap();
        assert!(!chain.is_closed());
        chain.add_arc(&arc_between(&c, &a)).unwrap();
        assert!(chain.is_closed());
        assert_eq!(chain.len(), 3);
        for h in chain.halfedges() {
            assert_eq!(h.direction, Direction::Forward);
        }
    }

    #[test]
    fn first_arc_direction_is_fixed_by_the_second() {
        let (a, b, c) = (Vector3::x(), Vector3::y(), Vector3::z());
        let mut chain = ChainBuilder::new();
        // Stored backwards on purpose.
        chain.add_arc(&arc_between(&b, &a)).unwrap();
        chain.add_arc(&arc_between(&b, &c)).unwrap();
        assert_eq!(chain.halfedges()[0].direction, Direction::Reverse);
        assert_eq!(chain.halfedges()[1].direction, Direction::Forward);
    }

    #[test]
    fn reverse_twins_and_flips_order() {
        let (a, b, c) = (Vector3::x(), Vector3::y(), Vector3::z());
        let mut chain = ChainBuilder::new();
        chain.add_arc(&arc_between(&a, &b)).unwrap();
        chain.add_arc(&arc_between(&b, &c)).unwrap();
        let before: Vec<_> = chain.halfedges().to_vec();
        chain.reverse();
        assert_eq!(chain.halfedges()[0], before[1].twin());
        assert_eq!(chain.halfedges()[1], before[0].twin());
        // Still a connected walk, now from c back to a.
        let start = chain
            .arrangement()
            .halfedge_source(chain.halfedges()[0])
            .unwrap();
        let end = chain
            .arrangement()
            .halfedge_target(chain.halfedges()[1])
            .unwrap();
        assert!((chain.arrangement().vertex(start).unwrap().point - c).norm() < 1e-9);
        assert!((chain.arrangement().vertex(end).unwrap().point - a).norm() < 1e-9);
    }

    #[test]
    fn disconnected_arc_is_rejected_and_rolled_back() {
        let mut chain = ChainBuilder::new();
        chain
            .add_arc(&arc_between(&Vector3::x(), &Vector3::y()))
            .unwrap();
        let far = arc_between(&Vector3::z(), &(-Vector3::x()));
        assert!(chain.add_arc(&far).is_err());
        assert_eq!(chain.len(), 1);
        assert_eq!(chain.arrangement().edge_count(), 1);
    }

    #[test]
    fn closed_chain_rejects_more_arcs() {
        let (a, b, c) = (Vector3::x(), Vector3::y(), Vector3::z());
        let mut chain = ChainBuilder::new();
        chain.add_arc(&arc_between(&a, &b)).unwrap();
        chain.add_arc(&arc_between(&b, &c)).unwrap();
        chain.add_arc(&arc_between(&c, &a)).unwrap();
        let extra = arc_between(&a, &-Vector3::y());
        assert!(chain.add_arc(&extra).is_err());
    }

    #[test]
    fn closed_and_degenerate_arcs_are_rejected() {
        let mut chain = ChainBuilder::new();
        let equator = Curve::Geodesic(GeodesicCurve::new(&Vector3::z()).unwrap());
        assert!(chain.add_arc(&equator.closed_arc()).is_err());
        let empty = CurveArc::new(equator, CircleRange::by_offset(0.0, 0.0));
        assert!(chain.add_arc(&empty).is_err());
        assert!(chain.is_empty());
    }
}
