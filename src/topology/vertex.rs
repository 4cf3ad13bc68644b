use std::f64::consts::PI;

use crate::error::{NumericsError, Result};
use crate::geometry::{CircularCurve, Curve, CurveArc};
use crate::intersect::arc_intersections;
use crate::math::Vector3;

use super::edge::Halfedge;

slotmap::new_key_type! {
    /// Unique identifier for a vertex in the arrangement.
    pub struct VertexId;
}

/// Data associated with an arrangement vertex.
///
/// Near-coincident insertion points collapse onto one vertex; the
/// arrangement drops any vertex whose incident set becomes empty.
#[derive(Debug, Clone)]
pub struct VertexData {
    /// Position on the unit sphere.
    pub point: Vector3,
    /// Halfedges leaving this vertex, in insertion order.
    pub outgoing: Vec<Halfedge>,
}

impl VertexData {
    #[must_use]
    pub fn new(point: Vector3) -> Self {
        Self {
            point,
            outgoing: Vec::new(),
        }
    }

    /// Number of incident halfedges.
    #[must_use]
    pub fn degree(&self) -> usize {
        self.outgoing.len()
    }
}

/// Starting probe radius, one degree.
const PROBE_START: f64 = PI / 180.0;

/// A probe circle whose plane height is within this of 1 has underflowed.
const PROBE_HEIGHT_EPSILON: f64 = 1e-10;

/// Sorts directed arcs leaving `center` into clockwise order, as seen
/// from outside the sphere.
///
/// Tangent comparison at the vertex itself is unreliable for curved
/// arcs, so each arc's departure direction is localized by intersecting
/// it with a small probe circle around the vertex. The probe starts at
/// one degree (capped by the angle to the nearest arc midpoint) and is
/// halved until every arc meets it in exactly one point.
///
/// Returns the input indices in clockwise ring order.
///
/// # Errors
///
/// Fails with [`NumericsError::ProbeRadiusUnderflow`] when the probe
/// shrinks past the resolution of the arrangement without separating
/// the arcs.
pub(crate) fn clockwise_ring(center: &Vector3, arcs: &[CurveArc], eps: f64) -> Result<Vec<usize>> {
    if arcs.len() <= 1 {
        return Ok((0..arcs.len()).collect());
    }
    let mut radius = PROBE_START;
    for arc in arcs {
        let reach = center.dot(&arc.midpoint()).clamp(-1.0, 1.0).acos();
        if reach > 0.0 {
            radius = radius.min(reach);
        }
    }

    'shrink: loop {
        if radius.cos() >= 1.0 - PROBE_HEIGHT_EPSILON {
            return Err(NumericsError::ProbeRadiusUnderflow {
                x: center.x,
                y: center.y,
                z: center.z,
            }
            .into());
        }
        let probe = CircularCurve::new(center, radius)?;
        let probe_arc = Curve::Circular(probe.clone()).closed_arc();
        let probe_eps = eps.min(radius * 0.5);

        let mut angles = Vec::with_capacity(arcs.len());
        for arc in arcs {
            let hits = arc_intersections(&probe_arc, arc, probe_eps)?;
            let [hit] = hits.as_slice() else {
                radius *= 0.5;
                continue 'shrink;
            };
            angles.push(probe.angle(hit));
        }

        let mut order: Vec<usize> = (0..arcs.len()).collect();
        order.sort_by(|&a, &b| angles[b].total_cmp(&angles[a]));
        return Ok(order);
    }
}
