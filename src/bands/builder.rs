use std::collections::{HashMap, VecDeque};
use std::f64::consts::TAU;

use crate::error::{GeometryError, Result, TopologyError};
use crate::geometry::{CircularCurve, Curve, CurveArc, GeodesicCurve, RdcCurve, RdcOffsetCurve};
use crate::math::grid::GeodesicGrid;
use crate::math::{normalize_angle, CircleRange, Vector3, DEFAULT_EPSILON, TOLERANCE};
use crate::topology::{Arrangement, ChainBuilder, Face, Halfedge};

use super::Band;

/// Grid refinement used when hunting for a seed point off every band
/// boundary.
const SEED_SUBDIVISIONS: usize = 2;

/// Finds the arrangement faces consistent with a set of bands.
///
/// The bands' bounding curves are inserted into one arrangement and its
/// faces extracted. Band membership is evaluated directly only at a
/// single seed point; from there a breadth-first search over the face
/// adjacency graph flips one membership flag per boundary curve
/// crossed, which keeps the expensive point queries off every face.
pub struct IntersectionFaceBuilder<'a> {
    required: Vec<&'a dyn Band>,
    desired: Vec<&'a dyn Band>,
    epsilon: f64,
}

/// Outcome of a band intersection query: the shared arrangement and the
/// winning faces.
#[derive(Debug)]
pub struct BandSelection {
    pub arrangement: Arrangement,
    pub faces: Vec<Face>,
}

impl<'a> IntersectionFaceBuilder<'a> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            required: Vec::new(),
            desired: Vec::new(),
            epsilon: DEFAULT_EPSILON,
        }
    }

    #[must_use]
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Adds a band every selected face must satisfy.
    #[must_use]
    pub fn require(mut self, band: &'a dyn Band) -> Self {
        self.required.push(band);
        self
    }

    /// Adds a band the selection satisfies when possible.
    #[must_use]
    pub fn desire(mut self, band: &'a dyn Band) -> Self {
        self.desired.push(band);
        self
    }

    /// Builds the arrangement and selects the faces inside every
    /// required band and inside as many desired bands as attainable.
    /// With no satisfying face the selection is empty.
    ///
    /// # Errors
    ///
    /// Fails with `NoStartPoint` when no seed grid point clears every
    /// band boundary, and propagates arrangement construction errors.
    /// Two bands sharing a bounding curve surface as
    /// `CoincidentCurves`.
    pub fn intersection_faces(&self) -> Result<BandSelection> {
        let bands: Vec<&dyn Band> = self
            .required
            .iter()
            .chain(self.desired.iter())
            .copied()
            .collect();
        if bands.is_empty() {
            return Err(GeometryError::Degenerate(
                "band intersection needs at least one band".into(),
            )
            .into());
        }

        let mut arrangement = Arrangement::with_epsilon(self.epsilon);
        for band in &bands {
            for arc in band.boundary_arcs() {
                arrangement.add_arc(&arc)?;
            }
        }
        let faces = arrangement.compute_faces()?;

        let (seed_face, seed_flags) = self.seed(&arrangement, &faces, &bands)?;
        let flags = self.propagate(&arrangement, &faces, &bands, seed_face, seed_flags)?;

        let n_required = self.required.len();
        let mut best = 0usize;
        let mut selected: Vec<usize> = Vec::new();
        for (idx, face_flags) in flags.iter().enumerate() {
            let Some(face_flags) = face_flags else {
                continue;
            };
            if !face_flags[..n_required].iter().all(|&f| f) {
                continue;
            }
            let score = face_flags[n_required..].iter().filter(|&&f| f).count();
            if score > best {
                best = score;
                selected.clear();
            }
            if score == best {
                selected.push(idx);
            }
        }

        let faces = selected.into_iter().map(|idx| faces[idx].clone()).collect();
        Ok(BandSelection { arrangement, faces })
    }

    /// Picks a grid point off every band boundary and evaluates all
    /// memberships there once.
    fn seed(
        &self,
        arrangement: &Arrangement,
        faces: &[Face],
        bands: &[&dyn Band],
    ) -> Result<(usize, Vec<bool>)> {
        'grid: for p in GeodesicGrid::new(SEED_SUBDIVISIONS).face_midpoints() {
            for band in bands {
                if band.boundary_contains_point(&p, self.epsilon)? {
                    continue 'grid;
                }
            }
            for (idx, face) in faces.iter().enumerate() {
                if face.contains_point(arrangement, &p)? {
                    let flags = bands
                        .iter()
                        .map(|band| band.contains_point(&p, self.epsilon))
                        .collect::<Result<Vec<bool>>>()?;
                    return Ok((idx, flags));
                }
            }
        }
        Err(TopologyError::NoStartPoint.into())
    }

    /// Walks the face adjacency graph from the seed, toggling the flag
    /// of every band whose boundary curve is crossed.
    fn propagate(
        &self,
        arrangement: &Arrangement,
        faces: &[Face],
        bands: &[&dyn Band],
        seed_face: usize,
        seed_flags: Vec<bool>,
    ) -> Result<Vec<Option<Vec<bool>>>> {
        let mut owner: HashMap<Halfedge, usize> = HashMap::new();
        for (idx, face) in faces.iter().enumerate() {
            for h in face.halfedges() {
                owner.insert(h, idx);
            }
        }

        let mut flags: Vec<Option<Vec<bool>>> = vec![None; faces.len()];
        flags[seed_face] = Some(seed_flags);
        let mut queue = VecDeque::from([seed_face]);
        while let Some(here) = queue.pop_front() {
            let here_flags = flags[here].clone().ok_or_else(|| {
                TopologyError::InvalidTopology("queued face without membership flags".into())
            })?;
            for h in faces[here].halfedges() {
                let &there = owner.get(&h.twin()).ok_or_else(|| {
                    TopologyError::InvalidTopology("halfedge twin not owned by any face".into())
                })?;
                if flags[there].is_some() {
                    continue;
                }
                let curve = arrangement.edge(h.edge)?.arc.curve().clone();
                let mut next = here_flags.clone();
                for (flag, band) in next.iter_mut().zip(bands) {
                    if band.has_curve_on_boundary(&curve) {
                        *flag = !*flag;
                    }
                }
                flags[there] = Some(next);
                queue.push_back(there);
            }
        }
        Ok(flags)
    }
}

impl Default for IntersectionFaceBuilder<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// A face whose boundary was pushed outward to absorb measurement
/// uncertainty. Holes of the source face are dropped, so the region is
/// a superset of the dilated source.
#[derive(Debug)]
pub struct DilatedFace {
    arrangement: Arrangement,
    face: Face,
}

impl DilatedFace {
    #[must_use]
    pub fn arrangement(&self) -> &Arrangement {
        &self.arrangement
    }

    #[must_use]
    pub fn face(&self) -> &Face {
        &self.face
    }

    /// Whether `p` lies in the dilated region, boundary included.
    ///
    /// # Errors
    ///
    /// Propagates containment query failures.
    pub fn contains_point(&self, p: &Vector3) -> Result<bool> {
        self.face.contains_point(&self.arrangement, p)
    }
}

/// Pushes the outer boundary of `face` outward by the angular `margin`.
///
/// RDC iso-curve edges are replaced by offset curves on the side away
/// from the face; other curve kinds already carry their uncertainty in
/// their own parameters and are kept as-is. Corner gaps opened by the
/// offsets are bridged with circular fillets about the original vertex,
/// or with a geodesic where only one side moved.
///
/// # Errors
///
/// Rejects a non-positive `margin`; fails when the offset boundary does
/// not close into a loop or no longer encloses the face interior.
pub fn dilated_face(arrangement: &Arrangement, face: &Face, margin: f64) -> Result<DilatedFace> {
    if margin <= 0.0 || margin >= TAU {
        return Err(GeometryError::ParameterOutOfRange {
            parameter: "margin",
            value: margin,
            min: 0.0,
            max: TAU,
        }
        .into());
    }
    let interior = face.arbitrary_interior_point(arrangement)?;

    let mut pieces: Vec<CurveArc> = Vec::with_capacity(face.outer().len());
    for &h in face.outer() {
        let arc = arrangement.halfedge_arc(h)?;
        match arc.curve() {
            Curve::Rdc(base) => pieces.push(outward_offset(&arc, base, margin)?),
            _ => pieces.push(arc),
        }
    }

    let mut chain = ChainBuilder::new();
    for (i, piece) in pieces.iter().enumerate() {
        chain.add_arc(piece)?;
        let next = &pieces[(i + 1) % pieces.len()];
        let (from, to) = (piece.target(), next.source());
        if (from - to).norm() <= TOLERANCE {
            continue;
        }
        let corner = arrangement
            .vertex(arrangement.halfedge_target(face.outer()[i])?)?
            .point;
        chain.add_arc(&bridge_arc(arrangement, face, &corner, &from, &to)?)?;
    }
    if !chain.is_closed() {
        return Err(TopologyError::InvalidTopology(
            "dilated boundary does not close into a loop".into(),
        )
        .into());
    }

    let dilated = chain.into_arrangement();
    let faces = dilated.compute_faces()?;
    for candidate in faces {
        if candidate.contains_point(&dilated, &interior)? {
            return Ok(DilatedFace {
                arrangement: dilated,
                face: candidate,
            });
        }
    }
    Err(TopologyError::InvalidTopology("dilated boundary does not enclose the face".into()).into())
}

/// Travel direction of the directed arc at its midpoint, by central
/// difference so curve singularities need no special casing.
fn travel_direction(arc: &CurveArc) -> Vector3 {
    let theta = arc.range().midpoint();
    let step = 1e-5;
    let mut t = arc.curve().point(theta + step) - arc.curve().point(theta - step);
    if !arc.range().is_counterclockwise() {
        t = -t;
    }
    t
}

/// Offsets an RDC edge by `margin` on the side away from the face.
///
/// The face lies on the left of its boundary halfedges, so of the two
/// signed offsets the one displacing the midpoint furthest to the right
/// is the outward one.
fn outward_offset(arc: &CurveArc, base: &RdcCurve, margin: f64) -> Result<CurveArc> {
    let mid = arc.midpoint();
    let rightward = travel_direction(arc).cross(&mid);
    if rightward.norm() < TOLERANCE {
        return Err(GeometryError::Degenerate("stationary boundary arc".into()).into());
    }
    let mut best: Option<(f64, CurveArc)> = None;
    for distance in [margin, -margin] {
        let offset = RdcOffsetCurve::new(base.clone(), distance);
        let candidate = CurveArc::new(Curve::RdcOffset(offset), *arc.range());
        let displacement = candidate.midpoint() - mid;
        if !displacement.iter().all(|c| c.is_finite()) {
            continue;
        }
        let score = displacement.dot(&rightward);
        if best.as_ref().is_none_or(|(s, _)| score > *s) {
            best = Some((score, candidate));
        }
    }
    best.map(|(_, c)| c)
        .ok_or_else(|| GeometryError::Degenerate("offset boundary is singular".into()).into())
}

/// Bridges the gap a corner opens between two offset boundary pieces.
///
/// When both gap endpoints sit at the same distance from the original
/// vertex the bridge is a fillet of the circle about that vertex, taken
/// on whichever side stays off the face. When only one side moved the
/// bridge degenerates to a geodesic.
fn bridge_arc(
    arrangement: &Arrangement,
    face: &Face,
    corner: &Vector3,
    from: &Vector3,
    to: &Vector3,
) -> Result<CurveArc> {
    let r_from = corner.dot(from).clamp(-1.0, 1.0).acos();
    let r_to = corner.dot(to).clamp(-1.0, 1.0).acos();
    if r_from > TOLERANCE && (r_from - r_to).abs() < 1e-9 {
        let circle = CircularCurve::oriented(corner, from)?;
        let sweep = normalize_angle(circle.angle(to));
        let short = CurveArc::new(
            Curve::Circular(circle.clone()),
            CircleRange::by_offset(0.0, if sweep <= TAU - sweep { sweep } else { sweep - TAU }),
        );
        let long = CurveArc::new(
            Curve::Circular(circle),
            CircleRange::by_offset(0.0, if sweep <= TAU - sweep { sweep - TAU } else { sweep }),
        );
        for candidate in [&short, &long] {
            if !face.contains_point(arrangement, &candidate.midpoint())? {
                return Ok(candidate.clone());
            }
        }
        return Ok(short);
    }
    let geodesic = GeodesicCurve::by_points(from, to)
        .or_else(|_| GeodesicCurve::by_points_with_arbitrary_normal(from, to))?;
    let range = CircleRange::by_short_segment(geodesic.angle(from), geodesic.angle(to));
    Ok(CurveArc::new(Curve::Geodesic(geodesic), range))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::bands::{KinematicBand, RdcBand};
    use crate::geometry::{AlignmentTensor, RdcCurve};

    fn tensor() -> AlignmentTensor {
        AlignmentTensor::diagonal(-4.0, -8.0, 12.0).unwrap()
    }

    /// Point on the x-z plane at the polar angle where the iso-value
    /// `12 - 16 sin^2(theta)` equals `d`.
    fn xz_probe(d: f64) -> Vector3 {
        let theta = ((12.0 - d) / 16.0).sqrt().asin();
        Vector3::new(theta.sin(), 0.0, theta.cos())
    }

    #[test]
    fn required_bands_select_their_common_face() {
        let rdc = RdcBand::new(&tensor(), 2.0, 1.0).unwrap();
        let kin = KinematicBand::new(&Vector3::z(), 50.0_f64.to_radians(), 8.0_f64.to_radians())
            .unwrap();
        let selection = IntersectionFaceBuilder::new()
            .require(&rdc)
            .require(&kin)
            .intersection_faces()
            .unwrap();

        // The kinematic annulus swallows the northern iso-band ring and
        // misses the southern one, so exactly one face survives.
        assert_eq!(selection.faces.len(), 1);
        let face = &selection.faces[0];
        let inside = xz_probe(2.0);
        assert!(face.contains_point(&selection.arrangement, &inside).unwrap());
        let southern = Vector3::new(inside.x, inside.y, -inside.z);
        assert!(!face
            .contains_point(&selection.arrangement, &southern)
            .unwrap());
    }

    #[test]
    fn desired_bands_break_ties_between_required_faces() {
        let rdc = RdcBand::new(&tensor(), 2.0, 1.0).unwrap();
        let kin = KinematicBand::new(&Vector3::z(), 50.0_f64.to_radians(), 8.0_f64.to_radians())
            .unwrap();
        let selection = IntersectionFaceBuilder::new()
            .require(&kin)
            .desire(&rdc)
            .intersection_faces()
            .unwrap();

        // Three faces lie in the annulus; only the middle one also
        // meets the desired iso-band.
        assert_eq!(selection.faces.len(), 1);
        assert!(selection.faces[0]
            .contains_point(&selection.arrangement, &xz_probe(2.0))
            .unwrap());
    }

    #[test]
    fn disjoint_required_bands_yield_no_faces() {
        let near = KinematicBand::new(&Vector3::z(), 20.0_f64.to_radians(), 5.0_f64.to_radians())
            .unwrap();
        let far = KinematicBand::new(&Vector3::z(), 60.0_f64.to_radians(), 5.0_f64.to_radians())
            .unwrap();
        let selection = IntersectionFaceBuilder::new()
            .require(&near)
            .require(&far)
            .intersection_faces()
            .unwrap();
        assert!(selection.faces.is_empty());
    }

    #[test]
    fn builder_without_bands_is_rejected() {
        assert!(IntersectionFaceBuilder::new().intersection_faces().is_err());
    }

    #[test]
    fn dilation_pushes_an_iso_loop_outward() {
        let curve = RdcCurve::new(&tensor(), 2.0, 1).unwrap();
        let mut arrangement = Arrangement::new();
        arrangement.add_curve(&Curve::Rdc(curve)).unwrap();
        let faces = arrangement.compute_faces().unwrap();
        let face = faces
            .iter()
            .find(|f| f.contains_point(&arrangement, &Vector3::z()).unwrap())
            .unwrap();

        let margin = 0.05;
        let dilated = dilated_face(&arrangement, face, margin).unwrap();
        assert!(dilated.contains_point(&Vector3::z()).unwrap());

        // On the x-z plane the boundary sits at polar angle ~0.912 and
        // the offset moves it exactly meridionally.
        let theta = (10.0_f64 / 16.0).sqrt().asin();
        let at = |t: f64| Vector3::new(t.sin(), 0.0, t.cos());
        assert!(!face.contains_point(&arrangement, &at(theta + 0.02)).unwrap());
        assert!(dilated.contains_point(&at(theta + 0.02)).unwrap());
        assert!(!dilated.contains_point(&at(theta + 0.09)).unwrap());
    }

    #[test]
    fn dilation_rejects_a_bad_margin() {
        let curve = RdcCurve::new(&tensor(), 2.0, 1).unwrap();
        let mut arrangement = Arrangement::new();
        arrangement.add_curve(&Curve::Rdc(curve)).unwrap();
        let faces = arrangement.compute_faces().unwrap();
        assert!(dilated_face(&arrangement, &faces[0], 0.0).is_err());
        assert!(dilated_face(&arrangement, &faces[0], -0.1).is_err());
    }
}
