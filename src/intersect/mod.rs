pub mod cones;
pub mod offset_roots;
pub mod quartic;

pub use offset_roots::clear_offset_cache;

use crate::error::{GeometryError, Result};
use crate::geometry::{Curve, CurveArc, EllipticalCurve, RdcCurve, RdcOffsetCurve};
use crate::math::{roots, Vector3, TOLERANCE};

/// In-plane axes, normal, radius and plane offset of a circle-like curve.
struct CircleBasis {
    u: Vector3,
    v: Vector3,
    n: Vector3,
    r: f64,
    h: f64,
}

fn circle_basis(curve: &Curve) -> Option<CircleBasis> {
    match curve {
        Curve::Geodesic(g) => Some(CircleBasis {
            u: g.point(0.0),
            v: g.point(std::f64::consts::FRAC_PI_2),
            n: *g.normal(),
            r: 1.0,
            h: 0.0,
        }),
        Curve::Circular(c) => {
            let n = *c.normal();
            let (r, h) = (c.half_width(), c.height());
            Some(CircleBasis {
                u: (c.point(0.0) - n * h) / r,
                v: (c.point(std::f64::consts::FRAC_PI_2) - n * h) / r,
                n,
                r,
                h,
            })
        }
        _ => None,
    }
}

/// Intersection points of two distinct curves.
///
/// Kind-pair dispatch: circle pairs in closed form, RDC against circles via
/// the quartic, everything elliptical and RDC-to-RDC by scanning one
/// curve's parameter, offset curves against circles through the cached
/// bracket-and-refine search.
///
/// # Errors
///
/// Returns `CoincidentCurves` for identical or coincident inputs and
/// `UnsupportedCurvePair` for combinations with no method (offset curves
/// against anything but circles and geodesics).
pub fn curve_intersections(a: &Curve, b: &Curve, eps: f64) -> Result<Vec<Vector3>> {
    if a == b {
        return Err(GeometryError::CoincidentCurves.into());
    }
    match (a, b) {
        (
            Curve::Geodesic(_) | Curve::Circular(_),
            Curve::Geodesic(_) | Curve::Circular(_),
        ) => {
            let (Some(ca), Some(cb)) = (circle_basis(a), circle_basis(b)) else {
                return Err(GeometryError::UnsupportedCurvePair {
                    left: a.kind_name(),
                    right: b.kind_name(),
                }
                .into());
            };
            cones::circle_circle(&ca.n, ca.h, &cb.n, cb.h, eps)
        }
        (Curve::Rdc(r), Curve::Geodesic(_) | Curve::Circular(_)) => Ok(rdc_circle(r, b)),
        (Curve::Geodesic(_) | Curve::Circular(_), Curve::Rdc(r)) => Ok(rdc_circle(r, a)),
        (Curve::Rdc(ra), Curve::Rdc(rb)) => Ok(rdc_rdc(ra, rb)),
        (
            Curve::Elliptical(e),
            Curve::Geodesic(_) | Curve::Circular(_) | Curve::Rdc(_) | Curve::Elliptical(_),
        ) => Ok(along_elliptical(e, b)),
        (
            Curve::Geodesic(_) | Curve::Circular(_) | Curve::Rdc(_),
            Curve::Elliptical(e),
        ) => Ok(along_elliptical(e, a)),
        (Curve::RdcOffset(o), Curve::Geodesic(_) | Curve::Circular(_)) => Ok(offset_circle(o, b)),
        (Curve::Geodesic(_) | Curve::Circular(_), Curve::RdcOffset(o)) => Ok(offset_circle(o, a)),
        _ => Err(GeometryError::UnsupportedCurvePair {
            left: a.kind_name(),
            right: b.kind_name(),
        }
        .into()),
    }
}

/// Intersection points of two arcs: the underlying curves are intersected,
/// then results are filtered to points lying on both arcs.
///
/// # Errors
///
/// Propagates curve-pair and numeric failures.
pub fn arc_intersections(a: &CurveArc, b: &CurveArc, eps: f64) -> Result<Vec<Vector3>> {
    let candidates = curve_intersections(a.curve(), b.curve(), eps)?;
    let mut points: Vec<Vector3> = Vec::with_capacity(candidates.len());
    for p in candidates {
        if !p.iter().all(|c| c.is_finite()) {
            continue;
        }
        if !(a.contains_point(&p, eps)? && b.contains_point(&p, eps)?) {
            continue;
        }
        if points.iter().all(|q| (q - p).norm() > TOLERANCE) {
            points.push(p);
        }
    }
    Ok(points)
}

fn rdc_circle(rdc: &RdcCurve, circle: &Curve) -> Vec<Vector3> {
    let Some(basis) = circle_basis(circle) else {
        return Vec::new();
    };
    quartic::rdc_circle_angles(rdc, &basis.u, &basis.v, &basis.n, basis.r, basis.h)
        .into_iter()
        .map(|t| basis.n * basis.h + (basis.u * t.cos() + basis.v * t.sin()) * basis.r)
        .collect()
}

fn rdc_rdc(a: &RdcCurve, b: &RdcCurve) -> Vec<Vector3> {
    if a.tensor() == b.tensor() && (a.d() - b.d()).abs() <= TOLERANCE {
        // Same iso-set, different halves: they can only touch where the
        // lifted coordinate vanishes.
        return a.junction_points();
    }
    let residual = |theta: f64| b.tensor().back_compute(&a.point(theta)) - b.d();
    roots::periodic_roots(residual, roots::DEFAULT_SAMPLES, 1e-9)
        .into_iter()
        .map(|theta| a.point(theta))
        .collect()
}

fn along_elliptical(e: &EllipticalCurve, other: &Curve) -> Vec<Vector3> {
    let residual: Box<dyn Fn(&Vector3) -> f64> = match other {
        Curve::Geodesic(g) => {
            let n = *g.normal();
            Box::new(move |p: &Vector3| p.dot(&n))
        }
        Curve::Circular(c) => {
            let (n, h) = (*c.normal(), c.height());
            Box::new(move |p: &Vector3| p.dot(&n) - h)
        }
        Curve::Rdc(r) => {
            let (tensor, d) = (r.tensor().clone(), r.d());
            Box::new(move |p: &Vector3| tensor.back_compute(p) - d)
        }
        Curve::Elliptical(o) => {
            let o = o.clone();
            Box::new(move |p: &Vector3| o.axial_residual(p))
        }
        _ => return Vec::new(),
    };
    let f = |theta: f64| residual(&e.point(theta));
    roots::periodic_roots(f, roots::DEFAULT_SAMPLES, 1e-9)
        .into_iter()
        .map(|theta| e.point(theta))
        .collect()
}

fn offset_circle(o: &RdcOffsetCurve, circle: &Curve) -> Vec<Vector3> {
    let Some(basis) = circle_basis(circle) else {
        return Vec::new();
    };
    offset_roots::offset_circle_roots(o, &basis.n, basis.h)
        .into_iter()
        .map(|theta| o.point(theta))
        .collect()
}
