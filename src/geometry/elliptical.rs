use crate::error::{GeometryError, NumericsError, Result};
use crate::math::{self, normalize_angle, Rotation3, Vector3, DEFAULT_EPSILON, TOLERANCE};

/// Where the elliptical cone's apex sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApexMode {
    /// Apex on the unit sphere; sphere points are reached by re-intersecting
    /// rays from the apex with the sphere.
    Surface,
    /// Apex at the origin; directions are normalized onto the sphere.
    Origin,
}

/// The intersection of an elliptical cone with the unit sphere.
///
/// The cone is `x^2/tan^2(major) + y^2/tan^2(minor) = z^2` in its own frame
/// (z along the cone axis, x along the major axis). The parameter traces the
/// ellipse in the `z = 1` cross-section.
#[derive(Debug, Clone, PartialEq)]
pub struct EllipticalCurve {
    apex: Vector3,
    mode: ApexMode,
    major_tan: f64,
    minor_tan: f64,
    frame: Rotation3,
}

impl EllipticalCurve {
    /// Creates the curve from the cone apex, axis, major-axis direction and
    /// the two half-angles.
    ///
    /// The apex must lie on the unit sphere (surface mode) or at the origin
    /// (origin mode); which one is inferred from its length.
    ///
    /// # Errors
    ///
    /// Returns an error if the apex is neither on the sphere nor at the
    /// origin, the half-angles leave `(0, pi/2)`, or the axes are
    /// degenerate.
    pub fn new(
        apex: &Vector3,
        axis: &Vector3,
        major_axis: &Vector3,
        major_theta: f64,
        minor_theta: f64,
    ) -> Result<Self> {
        let len_sq = apex.norm_squared();
        let mode = if (len_sq - 1.0).abs() <= DEFAULT_EPSILON {
            ApexMode::Surface
        } else if len_sq <= DEFAULT_EPSILON {
            ApexMode::Origin
        } else {
            return Err(GeometryError::Degenerate(
                "cone apex must lie on the unit sphere or at the origin".into(),
            )
            .into());
        };
        for (name, theta) in [("major_theta", major_theta), ("minor_theta", minor_theta)] {
            if theta <= 0.0 || theta >= std::f64::consts::FRAC_PI_2 {
                return Err(GeometryError::ParameterOutOfRange {
                    parameter: name,
                    value: theta,
                    min: 0.0,
                    max: std::f64::consts::FRAC_PI_2,
                }
                .into());
            }
        }
        if axis.norm() < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }
        if axis.cross(major_axis).norm() < TOLERANCE {
            return Err(GeometryError::Degenerate(
                "major axis is parallel to the cone axis".into(),
            )
            .into());
        }
        Ok(Self {
            apex: *apex,
            mode,
            major_tan: major_theta.tan(),
            minor_tan: minor_theta.tan(),
            frame: math::frame_from_xz(major_axis, axis),
        })
    }

    #[must_use]
    pub fn mode(&self) -> ApexMode {
        self.mode
    }

    #[must_use]
    pub fn apex(&self) -> &Vector3 {
        &self.apex
    }

    /// Cross-section direction in the molecular frame, before projection.
    fn ray(&self, theta: f64) -> Vector3 {
        self.frame
            * Vector3::new(
                self.major_tan * theta.cos(),
                self.minor_tan * theta.sin(),
                1.0,
            )
    }

    fn ray_derivative(&self, theta: f64) -> Vector3 {
        self.frame
            * Vector3::new(
                -self.major_tan * theta.sin(),
                self.minor_tan * theta.cos(),
                0.0,
            )
    }

    #[must_use]
    pub fn point(&self, theta: f64) -> Vector3 {
        let u = self.ray(theta);
        match self.mode {
            ApexMode::Origin => u.normalize(),
            ApexMode::Surface => {
                // Second intersection of `apex + s u` with the sphere.
                let s = -2.0 * self.apex.dot(&u) / u.norm_squared();
                self.apex + u * s
            }
        }
    }

    /// Inverse of [`Self::point`].
    ///
    /// # Errors
    ///
    /// Fails at the cone's double point, where the ray direction vanishes.
    pub fn angle(&self, p: &Vector3) -> Result<f64> {
        let u = self.frame.inverse() * (p - self.apex);
        if u.norm_squared() <= 1e-12 {
            return Err(NumericsError::AngleRecovery {
                x: p.x,
                y: p.y,
                z: p.z,
                reason: "point coincides with the cone apex (double point)".into(),
            }
            .into());
        }
        let f = if u.z < 0.0 { -1.0 } else { 1.0 };
        Ok(normalize_angle(
            (f * u.y / self.minor_tan).atan2(f * u.x / self.major_tan),
        ))
    }

    #[must_use]
    pub fn derivative(&self, theta: f64) -> Vector3 {
        let u = self.ray(theta);
        let du = self.ray_derivative(theta);
        match self.mode {
            ApexMode::Origin => {
                let n = u.norm();
                du / n - u * (u.dot(&du) / (n * n * n))
            }
            ApexMode::Surface => {
                let uu = u.norm_squared();
                let au = self.apex.dot(&u);
                let s = -2.0 * au / uu;
                let ds = -2.0 * (self.apex.dot(&du) * uu - au * 2.0 * u.dot(&du)) / (uu * uu);
                u * ds + du * s
            }
        }
    }

    /// Signed residual of the cone equation for the direction from the apex
    /// to `p`; zero on the curve.
    #[must_use]
    pub fn axial_residual(&self, p: &Vector3) -> f64 {
        let u = self.frame.inverse() * (p - self.apex);
        let dx = u.x / self.major_tan;
        let dy = u.y / self.minor_tan;
        dx * dx + dy * dy - u.z * u.z
    }

    #[must_use]
    pub fn contains_point(&self, p: &Vector3, eps: f64) -> bool {
        (p.norm_squared() - 1.0).abs() <= eps && self.axial_residual(p).abs() <= eps
    }
}
