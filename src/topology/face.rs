use std::collections::{HashMap, HashSet};
use std::f64::consts::PI;

use crate::error::{GeometryError, OrisphereError, Result, TopologyError};
use crate::geometry::{CircularCurve, Curve, CurveArc, GeodesicCurve};
use crate::intersect::arc_intersections;
use crate::math::{grid, CircleRange, Vector3};

use super::{vertex, Arrangement, EdgeId, Halfedge, VertexId};

/// One face of the arrangement: an outer boundary cycle plus any number
/// of hole cycles. Every cycle keeps the face region on the left of its
/// halfedges.
///
/// Faces are snapshots. Any further arrangement mutation invalidates
/// them; recompute instead of persisting across edits.
#[derive(Debug, Clone)]
pub struct Face {
    outer: Vec<Halfedge>,
    holes: Vec<Vec<Halfedge>>,
}

impl Arrangement {
    /// Extracts all faces of the arrangement.
    ///
    /// Boundary cycles are traced by repeatedly following
    /// [`next_halfedge`](Self::next_halfedge) until each halfedge is
    /// consumed, then grouped into faces by hole nesting. On a sphere
    /// every cycle belongs to some face; there is no unbounded face.
    ///
    /// # Errors
    ///
    /// Propagates ring-sort and intersection failures, and reports
    /// inconsistent connectivity as `InvalidTopology`.
    pub fn compute_faces(&self) -> Result<Vec<Face>> {
        let mut rings: HashMap<VertexId, Vec<Halfedge>> = HashMap::new();
        let mut remaining: HashSet<Halfedge> = self.halfedges().into_iter().collect();
        let mut cycles: Vec<Vec<Halfedge>> = Vec::new();

        while let Some(&start) = remaining.iter().next() {
            let mut cycle = Vec::new();
            let mut h = start;
            loop {
                remaining.remove(&h);
                cycle.push(h);
                let target = self.halfedge_target(h)?;
                let next = match rings.get(&target) {
                    Some(ring) => self.next_in_ring(ring, h)?,
                    None => {
                        let ring = self.clockwise_outgoing(target)?;
                        let next = self.next_in_ring(&ring, h)?;
                        rings.insert(target, ring);
                        next
                    }
                };
                if next == start {
                    break;
                }
                if !remaining.contains(&next) {
                    return Err(TopologyError::InvalidTopology(
                        "boundary walk revisited a halfedge".into(),
                    )
                    .into());
                }
                h = next;
            }
            cycles.push(cycle);
        }

        self.assemble_faces(cycles)
    }

    /// Groups boundary cycles into faces, attaching nested cycles as
    /// holes.
    ///
    /// A cycle is a hole of an outer candidate when the two share no
    /// vertex, each one's witness point lies on the other's face side,
    /// and the cycle is outermost among the candidates: a geodesic from
    /// it to the outer boundary crosses every other nested cycle an
    /// even number of times.
    fn assemble_faces(&self, cycles: Vec<Vec<Halfedge>>) -> Result<Vec<Face>> {
        let n = cycles.len();
        let mut samples = Vec::with_capacity(n);
        let mut vertex_sets: Vec<HashSet<VertexId>> = Vec::with_capacity(n);
        for cycle in &cycles {
            let first = cycle.first().ok_or_else(|| {
                TopologyError::InvalidTopology("empty boundary cycle".into())
            })?;
            samples.push(self.halfedge_arc(*first)?.midpoint());
            let mut set = HashSet::with_capacity(cycle.len());
            for &h in cycle {
                set.insert(self.halfedge_source(h)?);
            }
            vertex_sets.push(set);
        }

        let mut consumed = vec![false; n];
        let mut faces = Vec::new();
        for i in 0..n {
            if consumed[i] {
                continue;
            }
            consumed[i] = true;
            // A hole candidate is nested in the outer (no shared
            // vertex, witness on the outer's face side) and keeps the
            // outer's witness on its own face side.
            let mut nested = Vec::new();
            for j in 0..n {
                if consumed[j] || !vertex_sets[i].is_disjoint(&vertex_sets[j]) {
                    continue;
                }
                if self.cycle_side_contains(&cycles[i], &samples[j])?
                    && self.cycle_side_contains(&cycles[j], &samples[i])?
                {
                    nested.push(j);
                }
            }
            let mut holes = Vec::new();
            for &j in &nested {
                let mut outermost = true;
                for &k in &nested {
                    if k == j || !vertex_sets[j].is_disjoint(&vertex_sets[k]) {
                        continue;
                    }
                    if self.crossing_parity(&samples[j], &samples[i], &cycles[k])? {
                        outermost = false;
                        break;
                    }
                }
                if outermost {
                    holes.push(j);
                }
            }
            for &j in &holes {
                consumed[j] = true;
            }
            faces.push(Face {
                outer: cycles[i].clone(),
                holes: holes.iter().map(|&j| cycles[j].clone()).collect(),
            });
        }
        Ok(faces)
    }

    /// Whether `p` lies on the face side (left) of a single boundary
    /// cycle, ignoring every other cycle. Points on the cycle count as
    /// contained.
    ///
    /// A geodesic from `p` to the nearest cycle vertex is intersected
    /// with the cycle; at the crossing nearest to `p` the query
    /// direction is ranked against the two boundary directions, and `p`
    /// is inside exactly when the query falls in the sector swept
    /// counterclockwise from the outgoing to the reversed incoming
    /// boundary arc.
    fn cycle_side_contains(&self, cycle: &[Halfedge], p: &Vector3) -> Result<bool> {
        for &h in cycle {
            if self.halfedge_arc(h)?.contains_point(p, self.epsilon())? {
                return Ok(true);
            }
        }

        let mut nearest: Option<(f64, VertexId)> = None;
        for &h in cycle {
            let v = self.halfedge_source(h)?;
            let d = (self.vertex(v)?.point - p).norm();
            if nearest.is_none_or(|(best, _)| d < best) {
                nearest = Some((d, v));
            }
        }
        let (_, vid) = nearest.ok_or_else(|| {
            TopologyError::InvalidTopology("empty boundary cycle".into())
        })?;
        let vpoint = self.vertex(vid)?.point;
        let query = open_geodesic(p, &vpoint)?;

        let mut hit: Option<(f64, Vector3, usize)> = None;
        for (idx, &h) in cycle.iter().enumerate() {
            let arc = self.halfedge_arc(h)?;
            for x in arc_intersections(&query, &arc, self.epsilon())? {
                let d = (x - p).norm();
                if hit.is_none_or(|(best, _, _)| d < best) {
                    hit = Some((d, x, idx));
                }
            }
        }
        let Some((_, x, idx)) = hit else {
            // The query ends on a cycle vertex, so a missing crossing
            // is a tolerance artifact; fall back to the endpoint.
            return self.sector_test(cycle, &vpoint, &query.reversed());
        };

        // Direction from the crossing back towards the query point.
        let towards_p = if (x - p).norm() <= self.epsilon() {
            return Ok(true);
        } else if (x - vpoint).norm() <= self.epsilon() {
            query.reversed()
        } else {
            query.split_at(&x, self.epsilon())?.0.reversed()
        };

        let at_vertex = cycle.iter().try_fold(false, |acc, &h| {
            let v = self.halfedge_source(h)?;
            Ok::<bool, OrisphereError>(acc || (self.vertex(v)?.point - x).norm() <= self.epsilon())
        })?;
        if at_vertex {
            return self.sector_test(cycle, &x, &towards_p);
        }

        let arc = self.halfedge_arc(cycle[idx])?;
        let (head, tail) = arc.split_at(&x, self.epsilon())?;
        self.sector_pair_test(&x, &head.reversed(), &tail, &towards_p)
    }

    /// Sector test at a cycle vertex `x`: true when the query direction
    /// falls inside any face sector formed by an incoming/outgoing
    /// boundary pair at the vertex.
    fn sector_test(&self, cycle: &[Halfedge], x: &Vector3, towards_p: &CurveArc) -> Result<bool> {
        let len = cycle.len();
        for (i, &h) in cycle.iter().enumerate() {
            let t = self.halfedge_target(h)?;
            if (self.vertex(t)?.point - x).norm() > self.epsilon() {
                continue;
            }
            let inbound = self.halfedge_arc(h)?.reversed();
            let outbound = self.halfedge_arc(cycle[(i + 1) % len])?;
            if self.sector_pair_test(x, &inbound, &outbound, towards_p)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// True when `towards_p` leaves `x` strictly inside the face sector
    /// between `outbound` and `inbound` (counterclockwise from the
    /// former to the latter).
    fn sector_pair_test(
        &self,
        x: &Vector3,
        inbound: &CurveArc,
        outbound: &CurveArc,
        towards_p: &CurveArc,
    ) -> Result<bool> {
        let arcs = [outbound.clone(), inbound.clone(), towards_p.clone()];
        let order = vertex::clockwise_ring(x, &arcs, self.epsilon())?;
        let pos = order
            .iter()
            .position(|&i| i == 1)
            .ok_or_else(|| TopologyError::InvalidTopology("degenerate sector".into()))?;
        Ok(order[(pos + 1) % order.len()] == 2)
    }

    /// Whether the geodesic from `a` to `b` crosses `cycle` an odd
    /// number of times. Both endpoints must be off the cycle; the
    /// parity is then independent of the path taken.
    fn crossing_parity(&self, a: &Vector3, b: &Vector3, cycle: &[Halfedge]) -> Result<bool> {
        let query = open_geodesic(a, b)?;
        let edges: HashSet<EdgeId> = cycle.iter().map(|h| h.edge).collect();
        let mut crossings = 0_usize;
        for id in edges {
            let arc = self.edge(id)?.arc.clone();
            crossings += arc_intersections(&query, &arc, self.epsilon())?.len();
        }
        Ok(crossings % 2 == 1)
    }
}

/// Geodesic arc from `a` to `b` the short way around, falling back to
/// an arbitrary normal for antipodal endpoints.
fn open_geodesic(a: &Vector3, b: &Vector3) -> Result<CurveArc> {
    let curve = match GeodesicCurve::by_points(a, b) {
        Ok(g) => g,
        Err(_) => GeodesicCurve::by_points_with_arbitrary_normal(a, b)?,
    };
    let curve = Curve::Geodesic(curve);
    let from = curve.angle(a)?;
    let to = curve.angle(b)?;
    Ok(CurveArc::new(curve, CircleRange::by_short_segment(from, to)))
}

fn is_coincident(err: &OrisphereError) -> bool {
    matches!(
        err,
        OrisphereError::Geometry(GeometryError::CoincidentCurves)
    )
}

impl Face {
    /// The outer boundary cycle.
    #[must_use]
    pub fn outer(&self) -> &[Halfedge] {
        &self.outer
    }

    /// Hole boundary cycles.
    #[must_use]
    pub fn holes(&self) -> &[Vec<Halfedge>] {
        &self.holes
    }

    /// All boundary cycles, outer first.
    pub fn boundaries(&self) -> impl Iterator<Item = &[Halfedge]> {
        std::iter::once(self.outer.as_slice()).chain(self.holes.iter().map(Vec::as_slice))
    }

    /// Every boundary halfedge of the face.
    #[must_use]
    pub fn halfedges(&self) -> Vec<Halfedge> {
        self.boundaries().flatten().copied().collect()
    }

    /// Whether `p` lies on any boundary cycle.
    ///
    /// # Errors
    ///
    /// Propagates angle-recovery failures.
    pub fn boundary_contains_point(&self, arr: &Arrangement, p: &Vector3) -> Result<bool> {
        for h in self.halfedges() {
            if arr.halfedge_arc(h)?.contains_point(p, arr.epsilon())? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Whether `p` lies in the face, boundary included.
    ///
    /// The face is exactly the intersection of the left regions of its
    /// boundary cycles, so each cycle is tested independently.
    ///
    /// # Errors
    ///
    /// Propagates intersection and ring-sort failures.
    pub fn contains_point(&self, arr: &Arrangement, p: &Vector3) -> Result<bool> {
        if self.boundary_contains_point(arr, p)? {
            return Ok(true);
        }
        for cycle in self.boundaries() {
            if !arr.cycle_side_contains(cycle, p)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// A point strictly inside the face.
    ///
    /// Full geodesics through pairs of boundary anchors (vertices and
    /// edge midpoints) are cut at every boundary crossing; the first
    /// piece midpoint strictly inside the face wins.
    ///
    /// # Errors
    ///
    /// Returns `NoInteriorPoint` when every candidate fails.
    pub fn arbitrary_interior_point(&self, arr: &Arrangement) -> Result<Vector3> {
        let mut anchors = Vec::new();
        for h in self.halfedges() {
            let arc = arr.halfedge_arc(h)?;
            anchors.push(arc.source());
            anchors.push(arc.midpoint());
        }

        for (i, a) in anchors.iter().enumerate() {
            'pair: for b in anchors.iter().skip(i + 1) {
                if (a - b).norm() <= arr.epsilon() {
                    continue;
                }
                let Ok(curve) = GeodesicCurve::by_points_with_arbitrary_normal(a, b) else {
                    continue;
                };
                let query = Curve::Geodesic(curve).closed_arc();
                let mut crossings = Vec::new();
                for h in self.halfedges() {
                    let arc = arr.halfedge_arc(h)?;
                    match arc_intersections(&query, &arc, arr.epsilon()) {
                        Ok(points) => crossings.extend(points),
                        Err(e) if is_coincident(&e) => continue 'pair,
                        Err(e) => return Err(e),
                    }
                }
                for piece in query.split_at_many(&crossings, arr.epsilon())? {
                    let m = piece.midpoint();
                    if !self.boundary_contains_point(arr, &m)? && self.contains_point(arr, &m)? {
                        return Ok(m);
                    }
                }
            }
        }
        Err(TopologyError::NoInteriorPoint.into())
    }

    /// Estimates the smallest spherical cap around the boundary.
    ///
    /// The cap axis comes from a bounding sphere of boundary samples;
    /// the half-angle is bisected, to about a degree, between the
    /// widest sample and the first cap circle that clears the whole
    /// boundary.
    ///
    /// # Errors
    ///
    /// Propagates intersection failures.
    pub fn circular_bound(&self, arr: &Arrangement) -> Result<CircularCurve> {
        let mut samples = Vec::new();
        for h in self.halfedges() {
            samples.extend(arr.halfedge_arc(h)?.sample_points(16));
        }
        let (center, _) = grid::bounding_sphere(&samples)
            .ok_or_else(|| TopologyError::InvalidTopology("face has no boundary".into()))?;
        let center = if center.norm() <= arr.epsilon() {
            // Boundary samples surround the origin; any axis bounds.
            Vector3::z()
        } else {
            center.normalize()
        };

        let mut lo = samples
            .iter()
            .map(|s| center.dot(s).clamp(-1.0, 1.0).acos())
            .fold(0.0_f64, f64::max);
        let mut hi = PI;
        let resolution = PI / 180.0;
        while hi - lo > resolution {
            let mid = (lo + hi) / 2.0;
            if self.cap_clears(arr, &center, mid)? {
                hi = mid;
            } else {
                lo = mid;
            }
        }
        Ok(CircularCurve::new(&center, hi)?)
    }

    fn cap_clears(&self, arr: &Arrangement, center: &Vector3, theta: f64) -> Result<bool> {
        let cap = Curve::Circular(CircularCurve::new(center, theta)?).closed_arc();
        for h in self.halfedges() {
            let arc = arr.halfedge_arc(h)?;
            match arc_intersections(&cap, &arc, arr.epsilon()) {
                Ok(points) if points.is_empty() => {}
                Ok(_) => return Ok(false),
                Err(e) if is_coincident(&e) => return Ok(false),
                Err(e) => return Err(e),
            }
        }
        Ok(true)
    }
}
