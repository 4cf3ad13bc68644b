use std::f64::consts::TAU;

use nalgebra::{Complex, Matrix3, Matrix4};

use super::normalize_angle;

/// Sample count for periodic root scans, one sample per quarter degree.
pub const DEFAULT_SAMPLES: usize = 1440;

const BISECT_ITERATIONS: usize = 100;
const REFINE_ITERATIONS: usize = 80;
const ANGLE_EPSILON: f64 = 1e-12;
const DEDUP_EPSILON: f64 = 1e-9;

/// Finds the roots of a `2*pi`-periodic function by dense sampling.
///
/// Sign changes between adjacent samples are bisected. Local extrema whose
/// value lies within `root_eps` of zero are accepted as grazing roots, which
/// catches tangential crossings a pure sign-change scan would miss.
/// Non-finite samples (a curve's singular parameters) break brackets and are
/// otherwise ignored.
pub fn periodic_roots<F>(f: F, samples: usize, root_eps: f64) -> Vec<f64>
where
    F: Fn(f64) -> f64,
{
    #[allow(clippy::cast_precision_loss)]
    let step = TAU / samples as f64;
    #[allow(clippy::cast_precision_loss)]
    let thetas: Vec<f64> = (0..samples).map(|i| i as f64 * step).collect();
    let values: Vec<f64> = thetas.iter().map(|&t| f(t)).collect();

    let mut roots = Vec::new();

    for i in 0..samples {
        let j = (i + 1) % samples;
        let (a, fa) = (thetas[i], values[i]);
        let (b, fb) = (thetas[i] + step, values[j]);
        if !fa.is_finite() || !fb.is_finite() {
            continue;
        }
        if fa == 0.0 {
            roots.push(a);
            continue;
        }
        if fa * fb < 0.0 {
            roots.push(bisect(&f, a, b, fa));
        }
    }

    // Grazing roots: refine slope-sign-change brackets and keep near-zero
    // extrema.
    for i in 0..samples {
        let prev = (i + samples - 1) % samples;
        let next = (i + 1) % samples;
        let (fp, fi, fn_) = (values[prev], values[i], values[next]);
        if !fp.is_finite() || !fi.is_finite() || !fn_.is_finite() {
            continue;
        }
        let left = fi - fp;
        let right = fn_ - fi;
        if left * right < 0.0 {
            let minimum = left < 0.0;
            let lo = thetas[i] - step;
            let hi = thetas[i] + step;
            let ext = refine_extremum(&f, lo, hi, minimum);
            if f(ext).abs() <= root_eps {
                roots.push(normalize_angle(ext));
            }
        }
    }

    roots.sort_by(f64::total_cmp);
    dedup_angles(roots)
}

fn bisect<F: Fn(f64) -> f64>(f: &F, mut lo: f64, mut hi: f64, f_lo: f64) -> f64 {
    let sign_lo = f_lo.signum();
    for _ in 0..BISECT_ITERATIONS {
        let mid = 0.5 * (lo + hi);
        if hi - lo < ANGLE_EPSILON {
            return normalize_angle(mid);
        }
        let fm = f(mid);
        if fm == 0.0 {
            return normalize_angle(mid);
        }
        if fm.signum() == sign_lo {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    normalize_angle(0.5 * (lo + hi))
}

/// Golden-section search for a local extremum of `f` in `[lo, hi]`.
fn refine_extremum<F: Fn(f64) -> f64>(f: &F, mut lo: f64, mut hi: f64, minimum: bool) -> f64 {
    let inv_phi = 0.5 * (5.0_f64.sqrt() - 1.0);
    let signed = |x: f64| if minimum { f(x) } else { -f(x) };
    let mut c = hi - inv_phi * (hi - lo);
    let mut d = lo + inv_phi * (hi - lo);
    let mut fc = signed(c);
    let mut fd = signed(d);
    for _ in 0..REFINE_ITERATIONS {
        if hi - lo < ANGLE_EPSILON {
            break;
        }
        if fc < fd {
            hi = d;
            d = c;
            fd = fc;
            c = hi - inv_phi * (hi - lo);
            fc = signed(c);
        } else {
            lo = c;
            c = d;
            fc = fd;
            d = lo + inv_phi * (hi - lo);
            fd = signed(d);
        }
    }
    0.5 * (lo + hi)
}

fn dedup_angles(sorted: Vec<f64>) -> Vec<f64> {
    let mut out: Vec<f64> = Vec::with_capacity(sorted.len());
    for a in sorted {
        if out.iter().any(|&b| angles_close(a, b)) {
            continue;
        }
        out.push(a);
    }
    out
}

fn angles_close(a: f64, b: f64) -> bool {
    let d = normalize_angle(a - b);
    d < DEDUP_EPSILON || d > TAU - DEDUP_EPSILON
}

/// Real roots of a polynomial with coefficients in ascending order
/// (`coeffs[k]` multiplies `x^k`), degree at most four.
///
/// Leading coefficients that are negligible relative to the largest one are
/// trimmed before dispatch. Degrees three and four go through the companion
/// matrix eigenvalues; complex pairs are discarded.
#[must_use]
pub fn real_polynomial_roots(coeffs: &[f64]) -> Vec<f64> {
    let scale = coeffs.iter().fold(0.0_f64, |m, c| m.max(c.abs()));
    if scale == 0.0 {
        return Vec::new();
    }
    let mut degree = coeffs.len().saturating_sub(1);
    while degree > 0 && coeffs[degree].abs() <= 1e-12 * scale {
        degree -= 1;
    }

    match degree {
        0 => Vec::new(),
        1 => vec![-coeffs[0] / coeffs[1]],
        2 => quadratic_roots(coeffs[0], coeffs[1], coeffs[2]),
        3 => {
            let c = |k: usize| coeffs[k] / coeffs[3];
            let m = Matrix3::new(
                0.0, 0.0, -c(0), //
                1.0, 0.0, -c(1), //
                0.0, 1.0, -c(2),
            );
            real_eigenvalues(m.complex_eigenvalues().as_slice())
        }
        _ => {
            let c = |k: usize| coeffs[k] / coeffs[4];
            let m = Matrix4::new(
                0.0, 0.0, 0.0, -c(0), //
                1.0, 0.0, 0.0, -c(1), //
                0.0, 1.0, 0.0, -c(2), //
                0.0, 0.0, 1.0, -c(3),
            );
            real_eigenvalues(m.complex_eigenvalues().as_slice())
        }
    }
}

fn quadratic_roots(c0: f64, c1: f64, c2: f64) -> Vec<f64> {
    let disc = c1 * c1 - 4.0 * c2 * c0;
    if disc < 0.0 {
        return Vec::new();
    }
    if disc == 0.0 {
        return vec![-c1 / (2.0 * c2)];
    }
    // Citardauq form on one branch avoids cancellation.
    let q = -0.5 * (c1 + c1.signum() * disc.sqrt());
    let mut roots = vec![q / c2];
    if q != 0.0 {
        roots.push(c0 / q);
    }
    roots
}

fn real_eigenvalues(eigen: &[Complex<f64>]) -> Vec<f64> {
    eigen
        .iter()
        .filter(|e| e.im.abs() <= 1e-8 * (1.0 + e.re.abs()))
        .map(|e| e.re)
        .collect()
}

/// One Newton polish step per iteration against a numeric derivative.
/// Returns the input unchanged when the slope is too flat to trust.
#[must_use]
pub fn newton_polish<F: Fn(f64) -> f64>(f: &F, mut x: f64, iterations: usize) -> f64 {
    let h = 1e-7;
    for _ in 0..iterations {
        let fx = f(x);
        let slope = (f(x + h) - f(x - h)) / (2.0 * h);
        if !slope.is_finite() || slope.abs() < 1e-14 {
            return x;
        }
        let step = fx / slope;
        if !step.is_finite() {
            return x;
        }
        x -= step;
        if step.abs() < 1e-14 {
            break;
        }
    }
    x
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::TOLERANCE;
    use std::f64::consts::PI;

    #[test]
    fn sine_roots() {
        let roots = periodic_roots(f64::sin, 360, 1e-9);
        assert_eq!(roots.len(), 2);
        assert!(roots[0].abs() < 1e-9);
        assert!((roots[1] - PI).abs() < 1e-9);
    }

    #[test]
    fn grazing_root_is_found() {
        // cos(theta) - 1 touches zero at theta = 0 without a sign change.
        let roots = periodic_roots(|t| t.cos() - 1.0, 720, 1e-9);
        assert_eq!(roots.len(), 1);
        let d = normalize_angle(roots[0]);
        assert!(d < 1e-4 || TAU - d < 1e-4);
    }

    #[test]
    fn no_roots_when_offset() {
        let roots = periodic_roots(|t| t.cos() + 2.0, 360, 1e-9);
        assert!(roots.is_empty());
    }

    #[test]
    fn quadratic() {
        let mut roots = real_polynomial_roots(&[2.0, -3.0, 1.0]);
        roots.sort_by(f64::total_cmp);
        assert_eq!(roots.len(), 2);
        assert!((roots[0] - 1.0).abs() < 1e-12);
        assert!((roots[1] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn quartic_known_roots() {
        // (x-1)(x+1)(x-2)(x+3) = x^4 + x^3 - 7x^2 - x + 6
        let mut roots = real_polynomial_roots(&[6.0, -1.0, -7.0, 1.0, 1.0]);
        roots.sort_by(f64::total_cmp);
        assert_eq!(roots.len(), 4);
        for (r, want) in roots.iter().zip([-3.0, -1.0, 1.0, 2.0]) {
            assert!((r - want).abs() < 1e-7);
        }
    }

    #[test]
    fn quartic_with_complex_pair() {
        // (x^2+1)(x-4)(x+2) = x^4 - 2x^3 - 7x^2 - 2x - 8
        let mut roots = real_polynomial_roots(&[-8.0, -2.0, -7.0, -2.0, 1.0]);
        roots.sort_by(f64::total_cmp);
        assert_eq!(roots.len(), 2);
        assert!((roots[0] + 2.0).abs() < 1e-7);
        assert!((roots[1] - 4.0).abs() < 1e-7);
    }

    #[test]
    fn trimmed_leading_coefficient_degrades_degree() {
        let roots = real_polynomial_roots(&[-2.0, 1.0, 1e-16]);
        assert_eq!(roots.len(), 1);
        assert!((roots[0] - 2.0).abs() < TOLERANCE);
    }

    #[test]
    fn polish_tightens_root() {
        let f = |x: f64| x * x - 2.0;
        let x = newton_polish(&f, 1.4, 8);
        assert!((x - 2.0_f64.sqrt()).abs() < 1e-12);
    }
}
