use crate::error::{GeometryError, Result};
use crate::math::{Matrix3, Rotation3, Vector3, TOLERANCE};

/// A diagonalized alignment tensor: the three eigenvalues of the Saupe
/// matrix plus the rotation taking its principal order frame (PoF) into the
/// molecular frame.
///
/// In the PoF the back-computed coupling for a unit bond vector `v` is the
/// quadratic form `Dxx vx^2 + Dyy vy^2 + Dzz vz^2`.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentTensor {
    dxx: f64,
    dyy: f64,
    dzz: f64,
    rot_pof_to_mol: Rotation3,
}

impl AlignmentTensor {
    /// Creates a tensor from eigenvalues ordered `|Dxx| <= |Dyy| <= |Dzz|`
    /// and the PoF rotation.
    ///
    /// # Errors
    ///
    /// Returns an error if the eigenvalue magnitudes are not ordered.
    pub fn new(dxx: f64, dyy: f64, dzz: f64, rot_pof_to_mol: Rotation3) -> Result<Self> {
        if dxx.abs() > dyy.abs() + TOLERANCE || dyy.abs() > dzz.abs() + TOLERANCE {
            return Err(GeometryError::Degenerate(
                "alignment tensor eigenvalues are not ordered by magnitude".into(),
            )
            .into());
        }
        Ok(Self {
            dxx,
            dyy,
            dzz,
            rot_pof_to_mol,
        })
    }

    /// Tensor already expressed in its own principal frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the eigenvalue magnitudes are not ordered.
    pub fn diagonal(dxx: f64, dyy: f64, dzz: f64) -> Result<Self> {
        Self::new(dxx, dyy, dzz, Rotation3::identity())
    }

    /// Tensor from eigenvalues and explicit principal axes in the molecular
    /// frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the axes are not right-handed orthonormal or the
    /// eigenvalues are not ordered.
    pub fn from_axes(
        dxx: f64,
        dyy: f64,
        dzz: f64,
        x_axis: &Vector3,
        y_axis: &Vector3,
        z_axis: &Vector3,
    ) -> Result<Self> {
        let m = Matrix3::from_columns(&[*x_axis, *y_axis, *z_axis]);
        if (m * m.transpose() - Matrix3::identity()).norm() > 1e-8
            || (m.determinant() - 1.0).abs() > 1e-8
        {
            return Err(GeometryError::Degenerate(
                "principal axes are not a right-handed orthonormal frame".into(),
            )
            .into());
        }
        Self::new(dxx, dyy, dzz, Rotation3::from_matrix_unchecked(m))
    }

    #[must_use]
    pub fn dxx(&self) -> f64 {
        self.dxx
    }

    #[must_use]
    pub fn dyy(&self) -> f64 {
        self.dyy
    }

    #[must_use]
    pub fn dzz(&self) -> f64 {
        self.dzz
    }

    #[must_use]
    pub fn rot_pof_to_mol(&self) -> &Rotation3 {
        &self.rot_pof_to_mol
    }

    /// The coupling this tensor predicts for the molecular-frame unit
    /// vector `v`.
    #[must_use]
    pub fn back_compute(&self, v: &Vector3) -> f64 {
        let q = self.rot_pof_to_mol.inverse() * v;
        self.dxx * q.x * q.x + self.dyy * q.y * q.y + self.dzz * q.z * q.z
    }

    /// The attainable coupling interval `[min, max]` over the unit sphere.
    #[must_use]
    pub fn rdc_range(&self) -> (f64, f64) {
        if self.dzz > 0.0 {
            (self.dyy, self.dzz)
        } else {
            (self.dzz, self.dyy)
        }
    }

    #[must_use]
    pub fn is_rdc_in_range(&self, d: f64) -> bool {
        let (min, max) = self.rdc_range();
        (min..=max).contains(&d)
    }
}
