use crate::error::{GeometryError, Result};
use crate::math::{normalize_angle, Matrix3, Vector3, TOLERANCE};

use super::tensor::AlignmentTensor;

/// Which symmetry axis of the principal order frame the iso-curve is split
/// around. Chosen so the lifted coordinate stays well-conditioned over the
/// whole arc.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymmetryAxis {
    Z,
    Y,
}

/// One of the two arcs of the iso-value curve `back_compute(p) = d` of an
/// alignment tensor on the unit sphere.
///
/// In a permuted ("quasi") principal frame the curve projects to an ellipse
/// `(cx cos(theta), cy sin(theta))`; the third coordinate is lifted onto the
/// sphere with the sign picked by `arcnum`. The two arcs meet where the
/// lifted coordinate vanishes.
#[derive(Debug, Clone, PartialEq)]
pub struct RdcCurve {
    tensor: AlignmentTensor,
    d: f64,
    arcnum: u8,
    axis: SymmetryAxis,
    cx: f64,
    cy: f64,
    // Orthogonal map from quasi-frame to molecular coordinates. For the Y
    // symmetry axis the PoF y/z columns are swapped, so this is not always a
    // proper rotation.
    quasi: Matrix3,
}

impl RdcCurve {
    /// Creates the `arcnum` half (0 or 1) of the iso-curve for coupling `d`.
    ///
    /// # Errors
    ///
    /// Returns an error if `d` is outside the tensor's attainable range or
    /// `arcnum` is not 0 or 1.
    pub fn new(tensor: &AlignmentTensor, d: f64, arcnum: u8) -> Result<Self> {
        if arcnum > 1 {
            return Err(GeometryError::ParameterOutOfRange {
                parameter: "arcnum",
                value: f64::from(arcnum),
                min: 0.0,
                max: 1.0,
            }
            .into());
        }
        if !tensor.is_rdc_in_range(d) {
            let (min, max) = tensor.rdc_range();
            return Err(GeometryError::ParameterOutOfRange {
                parameter: "d",
                value: d,
                min,
                max,
            }
            .into());
        }

        let (dxx, dyy, dzz) = (tensor.dxx(), tensor.dyy(), tensor.dzz());
        let axis = if dzz > 0.0 {
            if d >= dxx {
                SymmetryAxis::Z
            } else {
                SymmetryAxis::Y
            }
        } else if d <= dxx {
            SymmetryAxis::Z
        } else {
            SymmetryAxis::Y
        };

        let (cx, cy) = match axis {
            SymmetryAxis::Z => (
                ((d - dzz) / (dxx - dzz)).max(0.0).sqrt(),
                ((d - dzz) / (dyy - dzz)).max(0.0).sqrt(),
            ),
            SymmetryAxis::Y => (
                ((d - dyy) / (dxx - dyy)).max(0.0).sqrt(),
                ((d - dyy) / (dzz - dyy)).max(0.0).sqrt(),
            ),
        };

        let pof = tensor.rot_pof_to_mol().matrix();
        let (x, y, z): (Vector3, Vector3, Vector3) =
            (pof.column(0).into(), pof.column(1).into(), pof.column(2).into());
        let quasi = match axis {
            SymmetryAxis::Z => Matrix3::from_columns(&[x, y, z]),
            SymmetryAxis::Y => Matrix3::from_columns(&[x, z, y]),
        };

        Ok(Self {
            tensor: tensor.clone(),
            d,
            arcnum,
            axis,
            cx,
            cy,
            quasi,
        })
    }

    #[must_use]
    pub fn tensor(&self) -> &AlignmentTensor {
        &self.tensor
    }

    #[must_use]
    pub fn d(&self) -> f64 {
        self.d
    }

    #[must_use]
    pub fn arcnum(&self) -> u8 {
        self.arcnum
    }

    #[must_use]
    pub fn symmetry_axis(&self) -> SymmetryAxis {
        self.axis
    }

    fn arc_factor(&self) -> f64 {
        2.0 * f64::from(self.arcnum) - 1.0
    }

    fn quasi_point(&self, theta: f64) -> Vector3 {
        let x = self.cx * theta.cos();
        let y = self.cy * theta.sin();
        let z = self.arc_factor() * (1.0 - x * x - y * y).max(0.0).sqrt();
        Vector3::new(x, y, z)
    }

    #[must_use]
    pub fn point(&self, theta: f64) -> Vector3 {
        self.quasi * self.quasi_point(theta)
    }

    #[must_use]
    pub fn angle(&self, p: &Vector3) -> f64 {
        let q = self.quasi.transpose() * p;
        normalize_angle((q.y / self.cy).atan2(q.x / self.cx))
    }

    /// `None` where the lifted coordinate vanishes (the junction of the two
    /// arcs).
    #[must_use]
    pub fn derivative(&self, theta: f64) -> Option<Vector3> {
        let q = self.quasi_point(theta);
        let dx = -self.cx * theta.sin();
        let dy = self.cy * theta.cos();
        let dz = -(q.x * dx + q.y * dy) / q.z;
        if !dz.is_finite() {
            return None;
        }
        Some(self.quasi * Vector3::new(dx, dy, dz))
    }

    /// Second parameter derivative; `None` at the arc junctions.
    #[must_use]
    pub fn second_derivative(&self, theta: f64) -> Option<Vector3> {
        let q = self.quasi_point(theta);
        let dx = -self.cx * theta.sin();
        let dy = self.cy * theta.cos();
        let dz = -(q.x * dx + q.y * dy) / q.z;
        let d2x = -self.cx * theta.cos();
        let d2y = -self.cy * theta.sin();
        let d2z = -(dx * dx + q.x * d2x + dy * dy + q.y * d2y + dz * dz) / q.z;
        if !dz.is_finite() || !d2z.is_finite() {
            return None;
        }
        Some(self.quasi * Vector3::new(d2x, d2y, d2z))
    }

    #[must_use]
    pub fn contains_point(&self, p: &Vector3, eps: f64) -> bool {
        if (p.norm_squared() - 1.0).abs() > eps {
            return false;
        }
        if (self.tensor.back_compute(p) - self.d).abs() > eps {
            return false;
        }
        // The right half: the lifted coordinate's sign must match, with
        // slack at the junctions shared by both arcs.
        let q = self.quasi.transpose() * p;
        q.z * self.arc_factor() >= -eps
    }

    /// Points where this curve's iso-set touches the complementary arc
    /// (the lifted coordinate vanishes). Empty for interior couplings,
    /// whose two loops are disjoint.
    #[must_use]
    pub fn junction_points(&self) -> Vec<Vector3> {
        let unclamped = |theta: f64| {
            let x = self.cx * theta.cos();
            let y = self.cy * theta.sin();
            1.0 - x * x - y * y
        };
        crate::math::roots::periodic_roots(unclamped, 720, 1e-9)
            .into_iter()
            .map(|theta| {
                self.quasi
                    * Vector3::new(self.cx * theta.cos(), self.cy * theta.sin(), 0.0)
            })
            .collect()
    }

    /// `false` when the iso-curve degenerates to a point (coupling at the
    /// edge of the attainable range).
    #[must_use]
    pub fn has_length(&self) -> bool {
        (self.d - self.tensor.dzz()).abs() > TOLERANCE
            && (self.d - self.tensor.dyy()).abs() > TOLERANCE
    }
}
