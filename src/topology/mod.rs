pub mod chain;
pub mod edge;
pub mod face;
pub mod vertex;

pub use chain::ChainBuilder;
pub use edge::{Direction, EdgeData, EdgeId, Halfedge};
pub use face::Face;
pub use vertex::{VertexData, VertexId};

use crate::error::{GeometryError, Result, TopologyError};
use crate::geometry::{Curve, CurveArc};
use crate::intersect::arc_intersections;
use crate::math::{normalize_angle, CircleRange, Vector3, DEFAULT_EPSILON};
use slotmap::SlotMap;

/// The subdivision of the unit sphere induced by a set of curve arcs.
///
/// Owns the vertex and edge arenas; entities reference each other via
/// typed IDs (generational indices), avoiding ownership cycles.
/// Invariant: edges from different curves never cross away from a
/// vertex. Insertion splits both the new arc and the edges it hits to
/// maintain this; edges sharing a curve are never split against each
/// other.
#[derive(Debug)]
pub struct Arrangement {
    vertices: SlotMap<VertexId, VertexData>,
    edges: SlotMap<EdgeId, EdgeData>,
    epsilon: f64,
}

impl Default for Arrangement {
    fn default() -> Self {
        Self::new()
    }
}

impl Arrangement {
    /// Creates an empty arrangement with the default tolerance.
    #[must_use]
    pub fn new() -> Self {
        Self::with_epsilon(DEFAULT_EPSILON)
    }

    /// Creates an empty arrangement with the given point tolerance.
    /// Points closer than `epsilon` collapse onto one vertex.
    #[must_use]
    pub fn with_epsilon(epsilon: f64) -> Self {
        Self {
            vertices: SlotMap::with_key(),
            edges: SlotMap::with_key(),
            epsilon,
        }
    }

    #[must_use]
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn vertices(&self) -> impl Iterator<Item = (VertexId, &VertexData)> {
        self.vertices.iter()
    }

    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &EdgeData)> {
        self.edges.iter()
    }

    /// Returns the vertex data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not in the arrangement.
    pub fn vertex(&self, id: VertexId) -> Result<&VertexData> {
        Ok(self
            .vertices
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("vertex".into()))?)
    }

    /// Returns the edge data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not in the arrangement.
    pub fn edge(&self, id: EdgeId) -> Result<&EdgeData> {
        Ok(self
            .edges
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("edge".into()))?)
    }

    /// All halfedges, two per edge.
    #[must_use]
    pub fn halfedges(&self) -> Vec<Halfedge> {
        self.edges
            .keys()
            .flat_map(|id| [Halfedge::forward(id), Halfedge::reverse(id)])
            .collect()
    }

    /// The vertex a halfedge leaves.
    ///
    /// # Errors
    ///
    /// Returns an error if the edge is not in the arrangement.
    pub fn halfedge_source(&self, h: Halfedge) -> Result<VertexId> {
        let data = self.edge(h.edge)?;
        Ok(match h.direction {
            Direction::Forward => data.source,
            Direction::Reverse => data.target,
        })
    }

    /// The vertex a halfedge enters.
    ///
    /// # Errors
    ///
    /// Returns an error if the edge is not in the arrangement.
    pub fn halfedge_target(&self, h: Halfedge) -> Result<VertexId> {
        self.halfedge_source(h.twin())
    }

    /// The edge's arc directed the way the halfedge traverses it.
    ///
    /// # Errors
    ///
    /// Returns an error if the edge is not in the arrangement.
    pub fn halfedge_arc(&self, h: Halfedge) -> Result<CurveArc> {
        let data = self.edge(h.edge)?;
        Ok(match h.direction {
            Direction::Forward => data.arc.clone(),
            Direction::Reverse => data.arc.reversed(),
        })
    }

    /// The existing vertex within `epsilon` of `p`, if any. First match
    /// wins; epsilon equality is not transitive, so callers must not
    /// rely on a particular winner among near-coincident clusters.
    #[must_use]
    pub fn find_vertex(&self, p: &Vector3) -> Option<VertexId> {
        self.vertices
            .iter()
            .find(|(_, v)| (v.point - p).norm() <= self.epsilon)
            .map(|(id, _)| id)
    }

    fn ensure_vertex(&mut self, p: Vector3) -> VertexId {
        match self.find_vertex(&p) {
            Some(id) => id,
            None => self.vertices.insert(VertexData::new(p)),
        }
    }

    /// Inserts a whole curve, splitting it and the edges it crosses.
    /// Curves degenerated to a point are ignored.
    ///
    /// # Errors
    ///
    /// Propagates intersection failures.
    pub fn add_curve(&mut self, curve: &Curve) -> Result<Vec<EdgeId>> {
        if !curve.has_length() {
            return Ok(Vec::new());
        }
        self.add_arc(&curve.closed_arc())
    }

    /// Inserts an arc, splitting it and the edges it crosses.
    ///
    /// Zero-length arcs are ignored. A full closed arc is first cut at
    /// its source and midpoint so that no edge is a self-loop.
    ///
    /// # Errors
    ///
    /// Propagates intersection failures.
    pub fn add_arc(&mut self, arc: &CurveArc) -> Result<Vec<EdgeId>> {
        if !arc.has_length() {
            return Ok(Vec::new());
        }
        if arc.is_closed() {
            let cuts = [arc.source(), arc.midpoint()];
            let mut ids = Vec::new();
            for half in arc.split_at_many(&cuts, self.epsilon)? {
                ids.extend(self.add_edge(&half)?);
            }
            return Ok(ids);
        }
        self.add_edge(arc)
    }

    fn add_edge(&mut self, arc: &CurveArc) -> Result<Vec<EdgeId>> {
        let mut cuts: Vec<Vector3> = Vec::new();
        let existing: Vec<EdgeId> = self.edges.keys().collect();
        for id in existing {
            let other = self.edge(id)?.arc.clone();
            if other.curve() == arc.curve() {
                // Edges of one curve may share endpoints but never
                // interior coverage.
                let overlapping = strictly_within(other.range(), arc.range().midpoint())
                    || strictly_within(arc.range(), other.range().midpoint())
                    || strictly_within(arc.range(), other.range().source())
                    || strictly_within(arc.range(), other.range().target());
                if overlapping {
                    return Err(GeometryError::CoincidentCurves.into());
                }
                continue;
            }
            let hits = arc_intersections(arc, &other, self.epsilon)?;
            if hits.is_empty() {
                continue;
            }
            let interior: Vec<Vector3> = hits
                .iter()
                .copied()
                .filter(|p| !self.near_endpoint(&other, p))
                .collect();
            if !interior.is_empty() {
                self.split_edge(id, &interior)?;
            }
            cuts.extend(hits);
        }
        cuts.retain(|p| !self.near_endpoint(arc, p));

        let mut ids = Vec::new();
        for piece in arc.split_at_many(&cuts, self.epsilon)? {
            if piece.has_length() {
                ids.push(self.insert_edge_raw(piece));
            }
        }
        Ok(ids)
    }

    fn near_endpoint(&self, arc: &CurveArc, p: &Vector3) -> bool {
        (arc.source() - p).norm() <= self.epsilon || (arc.target() - p).norm() <= self.epsilon
    }

    fn split_edge(&mut self, id: EdgeId, points: &[Vector3]) -> Result<Vec<EdgeId>> {
        let data = self.remove_edge(id)?;
        let mut ids = Vec::new();
        for piece in data.arc.split_at_many(points, self.epsilon)? {
            if piece.has_length() {
                ids.push(self.insert_edge_raw(piece));
            }
        }
        Ok(ids)
    }

    /// Inserts an edge without intersection checks. The caller
    /// guarantees the arc crosses no existing edge away from a vertex.
    pub(crate) fn insert_edge_raw(&mut self, arc: CurveArc) -> EdgeId {
        debug_assert!(arc.has_length() && !arc.is_closed());
        let source = self.ensure_vertex(arc.source());
        let target = self.ensure_vertex(arc.target());
        let id = self.edges.insert(EdgeData {
            arc,
            source,
            target,
        });
        if let Some(v) = self.vertices.get_mut(source) {
            v.outgoing.push(Halfedge::forward(id));
        }
        if let Some(v) = self.vertices.get_mut(target) {
            v.outgoing.push(Halfedge::reverse(id));
        }
        id
    }

    /// Removes an edge, dropping any endpoint vertex left isolated.
    ///
    /// # Errors
    ///
    /// Returns an error if the edge is not in the arrangement.
    pub fn remove_edge(&mut self, id: EdgeId) -> Result<EdgeData> {
        let data = self
            .edges
            .remove(id)
            .ok_or_else(|| TopologyError::EntityNotFound("edge".into()))?;
        self.detach(data.source, id);
        self.detach(data.target, id);
        Ok(data)
    }

    fn detach(&mut self, vertex: VertexId, edge: EdgeId) {
        if let Some(v) = self.vertices.get_mut(vertex) {
            v.outgoing.retain(|h| h.edge != edge);
            if v.outgoing.is_empty() {
                self.vertices.remove(vertex);
            }
        }
    }

    /// Outgoing halfedges at `vertex` in clockwise order around it.
    /// Vertices of degree two or less keep insertion order.
    ///
    /// # Errors
    ///
    /// Propagates probe failures from the ring sort.
    pub fn clockwise_outgoing(&self, vertex: VertexId) -> Result<Vec<Halfedge>> {
        let data = self.vertex(vertex)?;
        if data.outgoing.len() <= 2 {
            return Ok(data.outgoing.clone());
        }
        let arcs: Vec<CurveArc> = data
            .outgoing
            .iter()
            .map(|&h| self.halfedge_arc(h))
            .collect::<Result<_>>()?;
        let order = vertex::clockwise_ring(&data.point, &arcs, self.epsilon)?;
        Ok(order.into_iter().map(|i| data.outgoing[i]).collect())
    }

    /// The boundary successor of `h`: the outgoing halfedge at `h`'s
    /// target immediately counterclockwise of `h`'s twin. Following
    /// successors keeps the same face region on the left of every
    /// halfedge and traces its boundary exactly once.
    ///
    /// # Errors
    ///
    /// Propagates ring-sort failures.
    pub fn next_halfedge(&self, h: Halfedge) -> Result<Halfedge> {
        let ring = self.clockwise_outgoing(self.halfedge_target(h)?)?;
        self.next_in_ring(&ring, h)
    }

    pub(crate) fn next_in_ring(&self, ring: &[Halfedge], h: Halfedge) -> Result<Halfedge> {
        let twin = h.twin();
        let idx = ring
            .iter()
            .position(|&o| o == twin)
            .ok_or(TopologyError::EdgeNotIncident)?;
        Ok(ring[(idx + ring.len() - 1) % ring.len()])
    }
}

/// Whether `angle` lies in the open interior of `range`.
fn strictly_within(range: &CircleRange, angle: f64) -> bool {
    const SLACK: f64 = 1e-9;
    let rel = if range.is_counterclockwise() {
        normalize_angle(angle - range.source())
    } else {
        normalize_angle(range.source() - angle)
    };
    rel > SLACK && rel < range.length() - SLACK
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::{CircularCurve, GeodesicCurve};
    use crate::math::CircleRange;
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_3, PI};

    fn great_circle(normal: Vector3) -> Curve {
        Curve::Geodesic(GeodesicCurve::new(&normal).unwrap())
    }

    #[test]
    fn single_closed_curve_splits_into_two_edges() {
        let mut arr = Arrangement::new();
        let ids = arr.add_curve(&great_circle(Vector3::z())).unwrap();
        assert_eq!(ids.len(), 2);
        assert_eq!(arr.vertex_count(), 2);
        assert_eq!(arr.edge_count(), 2);
        for (_, v) in arr.vertices() {
            assert_eq!(v.degree(), 2);
        }
    }

    #[test]
    fn crossing_circles_split_each_other() {
        let mut arr = Arrangement::new();
        arr.add_curve(&great_circle(Vector3::z())).unwrap();
        arr.add_curve(&great_circle(Vector3::y())).unwrap();
        // Two antipodal crossings at +-x, four edges per invariant.
        assert_eq!(arr.vertex_count(), 2);
        assert_eq!(arr.edge_count(), 4);
        for (_, v) in arr.vertices() {
            assert_eq!(v.degree(), 4);
        }
    }

    #[test]
    fn degenerate_curve_is_ignored() {
        let mut arr = Arrangement::new();
        let point_cone = Curve::Circular(CircularCurve::new(&Vector3::z(), 0.0).unwrap());
        assert!(arr.add_curve(&point_cone).unwrap().is_empty());
        assert_eq!(arr.edge_count(), 0);
    }

    #[test]
    fn disjoint_cones_do_not_interact() {
        let mut arr = Arrangement::new();
        let inner = Curve::Circular(CircularCurve::new(&Vector3::z(), FRAC_PI_3 - 0.4).unwrap());
        let outer = Curve::Circular(CircularCurve::new(&Vector3::z(), FRAC_PI_3 + 0.4).unwrap());
        arr.add_curve(&inner).unwrap();
        arr.add_curve(&outer).unwrap();
        assert_eq!(arr.vertex_count(), 4);
        assert_eq!(arr.edge_count(), 4);
    }

    #[test]
    fn remove_edge_drops_isolated_vertices() {
        let mut arr = Arrangement::new();
        let ids = arr.add_curve(&great_circle(Vector3::z())).unwrap();
        arr.remove_edge(ids[0]).unwrap();
        assert_eq!(arr.edge_count(), 1);
        // The remaining edge still holds both vertices.
        assert_eq!(arr.vertex_count(), 2);
        arr.remove_edge(ids[1]).unwrap();
        assert_eq!(arr.vertex_count(), 0);
    }

    #[test]
    fn shared_endpoints_are_deduplicated() {
        let mut arr = Arrangement::new();
        let equator = great_circle(Vector3::z());
        let a = CurveArc::new(equator.clone(), CircleRange::by_counterclockwise(0.0, PI));
        let b = CurveArc::new(equator, CircleRange::by_counterclockwise(PI, 0.0));
        arr.add_arc(&a).unwrap();
        arr.add_arc(&b).unwrap();
        assert_eq!(arr.vertex_count(), 2);
        assert_eq!(arr.edge_count(), 2);
    }

    #[test]
    fn overlapping_coverage_of_one_curve_is_rejected() {
        let mut arr = Arrangement::new();
        let equator = great_circle(Vector3::z());
        arr.add_curve(&equator).unwrap();
        assert!(arr.add_curve(&equator.clone()).is_err());
        let quarter = CurveArc::new(equator, CircleRange::by_counterclockwise(0.1, FRAC_PI_2));
        assert!(arr.add_arc(&quarter).is_err());
    }

    #[test]
    fn next_halfedge_turns_left_at_a_crossing() {
        let mut arr = Arrangement::new();
        arr.add_curve(&great_circle(Vector3::z())).unwrap();
        arr.add_curve(&great_circle(Vector3::y())).unwrap();
        // Walk the quarter lune y > 0, z > 0: from the equator edge
        // through +y, the successor must climb the meridian through +z.
        let start = arr
            .edges()
            .find(|(_, e)| e.arc.midpoint().y > 0.9)
            .map(|(id, _)| Halfedge::forward(id))
            .unwrap();
        let start = if arr.halfedge_arc(start).unwrap().source().x > 0.0 {
            start
        } else {
            start.twin()
        };
        let mut cycle = vec![start];
        loop {
            let next = arr.next_halfedge(*cycle.last().unwrap()).unwrap();
            if next == start {
                break;
            }
            cycle.push(next);
            assert!(cycle.len() <= 8, "runaway boundary walk");
        }
        assert_eq!(cycle.len(), 2);
        let second = arr.halfedge_arc(cycle[1]).unwrap();
        assert!(second.midpoint().z > 0.9);
    }

    #[test]
    fn missing_entity_is_reported() {
        let mut arr = Arrangement::new();
        let ids = arr.add_curve(&great_circle(Vector3::z())).unwrap();
        arr.remove_edge(ids[0]).unwrap();
        assert!(arr.edge(ids[0]).is_err());
        assert!(arr.remove_edge(ids[0]).is_err());
    }
}
