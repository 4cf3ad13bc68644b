use crate::geometry::RdcCurve;
use crate::math::{normalize_angle, roots, Vector3};

/// Intersects an RDC iso-curve with a circle `p . n = h` of Euclidean
/// radius `r` and in-plane axes `u`, `v` (so the circle is
/// `h n + r (cos(t) u + sin(t) v)`).
///
/// Substituting the circle into the principal-frame quadratic form gives a
/// trigonometric equation; the Weierstrass substitution `x = tan(t/2)`
/// turns it into a quartic. `t = pi` maps to infinity and is recovered from
/// the vanishing leading coefficient. Roots are polished with a few Newton
/// steps on the iso-value residual.
///
/// Returns circle parameters of the intersections, deduplicated.
#[must_use]
pub fn rdc_circle_angles(
    rdc: &RdcCurve,
    u: &Vector3,
    v: &Vector3,
    n: &Vector3,
    r: f64,
    h: f64,
) -> Vec<f64> {
    let tensor = rdc.tensor();
    let pof = tensor.rot_pof_to_mol().inverse();
    let (up, vp, np) = (pof * u, pof * v, pof * n);
    let lambda = Vector3::new(tensor.dxx(), tensor.dyy(), tensor.dzz());

    let quad = |a: &Vector3, b: &Vector3| {
        lambda.x * a.x * b.x + lambda.y * a.y * b.y + lambda.z * a.z * b.z
    };
    let a_nn = quad(&np, &np);
    let a_uu = quad(&up, &up);
    let a_vv = quad(&vp, &vp);
    let a_nu = quad(&np, &up);
    let a_nv = quad(&np, &vp);
    let a_uv = quad(&up, &vp);

    let k = h * h * a_nn - rdc.d();
    let c4 = k + r * r * a_uu - 2.0 * h * r * a_nu;
    let c3 = 4.0 * h * r * a_nv - 4.0 * r * r * a_uv;
    let c2 = 2.0 * k - 2.0 * r * r * a_uu + 4.0 * r * r * a_vv;
    let c1 = 4.0 * h * r * a_nv + 4.0 * r * r * a_uv;
    let c0 = k + r * r * a_uu + 2.0 * h * r * a_nu;
    let coeffs = [c0, c1, c2, c3, c4];

    let residual = |t: f64| {
        let p = n * h + (u * t.cos() + v * t.sin()) * r;
        tensor.back_compute(&p) - rdc.d()
    };

    let mut angles: Vec<f64> = roots::real_polynomial_roots(&coeffs)
        .into_iter()
        .map(|x| 2.0 * x.atan())
        .collect();
    // The substitution cannot represent t = pi; it is a root exactly when
    // the quartic degenerates.
    let scale = coeffs.iter().fold(0.0_f64, |m, c| m.max(c.abs()));
    if scale > 0.0 && c4.abs() <= 1e-9 * scale {
        angles.push(std::f64::consts::PI);
    }

    let mut out: Vec<f64> = Vec::with_capacity(angles.len());
    for t in angles {
        let t = normalize_angle(roots::newton_polish(&residual, t, 3));
        if residual(t).abs() > 1e-6 {
            continue;
        }
        if out
            .iter()
            .all(|&s| (normalize_angle(t - s)).min(normalize_angle(s - t)) > 1e-9)
        {
            out.push(t);
        }
    }
    out.sort_by(f64::total_cmp);
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::geometry::AlignmentTensor;
    use crate::math::arbitrary_perpendicular;

    fn rdc(d: f64, arcnum: u8) -> RdcCurve {
        let tensor = AlignmentTensor::diagonal(-4.0, -8.0, 12.0).unwrap();
        RdcCurve::new(&tensor, d, arcnum).unwrap()
    }

    fn circle_axes(n: &Vector3) -> (Vector3, Vector3) {
        let u = arbitrary_perpendicular(n);
        (u, n.cross(&u))
    }

    #[test]
    fn great_circle_crossings_satisfy_both() {
        // The y-z great circle sweeps couplings over [Dyy, Dzz], so it must
        // cross the d = 2 iso-set; each loop is hit twice.
        let c = rdc(2.0, 1);
        let n = Vector3::x();
        let (u, v) = circle_axes(&n);
        let angles = rdc_circle_angles(&c, &u, &v, &n, 1.0, 0.0);
        assert_eq!(angles.len(), 4);
        for t in angles {
            let p = u * t.cos() + v * t.sin();
            assert!((c.tensor().back_compute(&p) - 2.0).abs() < 1e-6);
        }
    }

    #[test]
    fn small_circle_crossings() {
        let c = rdc(2.0, 1);
        let n = Vector3::new(0.3, 0.2, 0.9).normalize();
        let (u, v) = circle_axes(&n);
        let theta: f64 = 0.9;
        let (r, h) = (theta.sin(), theta.cos());
        let angles = rdc_circle_angles(&c, &u, &v, &n, r, h);
        for t in &angles {
            let p = n * h + (u * t.cos() + v * t.sin()) * r;
            assert!((p.norm() - 1.0).abs() < 1e-9);
            assert!((c.tensor().back_compute(&p) - 2.0).abs() < 1e-6);
        }
        // Cross-check count against a dense scan of sign changes.
        let f = |t: f64| {
            let p = n * h + (u * t.cos() + v * t.sin()) * r;
            c.tensor().back_compute(&p) - 2.0
        };
        let scan = crate::math::roots::periodic_roots(f, 2880, 1e-12);
        assert_eq!(angles.len(), scan.len());
    }

    #[test]
    fn distant_cap_misses_curve() {
        // A tight cap around -z: every point there back-computes near Dzz
        // only when aligned with z; around -z values are also near Dzz.
        // Use a cap around x where the form is near Dxx = -4, far from 11.9.
        let c = rdc(11.9, 1);
        let n = Vector3::x();
        let (u, v) = circle_axes(&n);
        let theta: f64 = 0.2;
        let angles = rdc_circle_angles(&c, &u, &v, &n, theta.sin(), theta.cos());
        assert!(angles.is_empty());
    }
}
