use crate::error::{GeometryError, Result};
use crate::math::{self, normalize_angle, Rotation3, Vector3, TOLERANCE};

/// A small (or great) circle on the unit sphere: the section of the sphere
/// by the plane `p . normal = height`.
///
/// Stored as the cone form: `half_width = sin(theta)`, `height = cos(theta)`
/// for cone half-angle `theta` about `normal`. The parameter runs
/// counterclockwise around the normal.
#[derive(Debug, Clone, PartialEq)]
pub struct CircularCurve {
    normal: Vector3,
    half_width: f64,
    height: f64,
    frame: Rotation3,
}

impl CircularCurve {
    /// Creates the circle at cone half-angle `cone_theta` about `normal`.
    ///
    /// # Errors
    ///
    /// Returns an error if the normal has zero length or the angle is
    /// outside `[0, pi]`.
    pub fn new(normal: &Vector3, cone_theta: f64) -> Result<Self> {
        if normal.norm() < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }
        if !(0.0..=std::f64::consts::PI).contains(&cone_theta) {
            return Err(GeometryError::ParameterOutOfRange {
                parameter: "cone_theta",
                value: cone_theta,
                min: 0.0,
                max: std::f64::consts::PI,
            }
            .into());
        }
        let normal = normal.normalize();
        Ok(Self {
            normal,
            half_width: cone_theta.sin().abs(),
            height: cone_theta.cos(),
            frame: math::frame_from_z(&normal),
        })
    }

    /// Creates the circle about `normal` passing through `zero_point`, with
    /// the parameter origin at `zero_point`.
    ///
    /// # Errors
    ///
    /// Returns an error if the normal is zero or `zero_point` lies on the
    /// axis.
    pub fn oriented(normal: &Vector3, zero_point: &Vector3) -> Result<Self> {
        if normal.norm() < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }
        let normal = normal.normalize();
        let height = zero_point.dot(&normal);
        let radial = zero_point - normal * height;
        if radial.norm() < TOLERANCE {
            return Err(
                GeometryError::Degenerate("zero point lies on the circle axis".into()).into(),
            );
        }
        Ok(Self {
            normal,
            half_width: radial.norm(),
            height,
            frame: math::frame_from_xz(&radial, &normal),
        })
    }

    /// Creates the circle through three unit points.
    ///
    /// # Errors
    ///
    /// Returns an error if the points are collinear (no unique plane).
    pub fn by_three_points(a: &Vector3, b: &Vector3, c: &Vector3) -> Result<Self> {
        let normal = (b - a).cross(&(c - a));
        if normal.norm() < TOLERANCE {
            return Err(
                GeometryError::Degenerate("circle points do not span a plane".into()).into(),
            );
        }
        let normal = normal.normalize();
        let height = a.dot(&normal);
        let half_width = (1.0 - height * height).max(0.0).sqrt();
        Ok(Self {
            normal,
            half_width,
            height,
            frame: math::frame_from_z(&normal),
        })
    }

    #[must_use]
    pub fn normal(&self) -> &Vector3 {
        &self.normal
    }

    /// `sin` of the cone half-angle: the circle's Euclidean radius.
    #[must_use]
    pub fn half_width(&self) -> f64 {
        self.half_width
    }

    /// `cos` of the cone half-angle: the plane's signed offset along the
    /// normal.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Cone half-angle about the normal, in `[0, pi]`.
    #[must_use]
    pub fn cone_theta(&self) -> f64 {
        self.half_width.atan2(self.height)
    }

    /// Whether `p` lies inside the spherical cap bounded by this circle.
    #[must_use]
    pub fn encloses_point(&self, p: &Vector3) -> bool {
        p.dot(&self.normal) >= self.height
    }

    /// The same circle traversed in the opposite direction.
    #[must_use]
    pub fn reversed(&self) -> Self {
        let normal = -self.normal;
        Self {
            normal,
            half_width: self.half_width,
            height: -self.height,
            frame: math::frame_from_z(&normal),
        }
    }

    #[must_use]
    pub fn point(&self, theta: f64) -> Vector3 {
        self.frame
            * Vector3::new(
                self.half_width * theta.cos(),
                self.half_width * theta.sin(),
                self.height,
            )
    }

    #[must_use]
    pub fn angle(&self, p: &Vector3) -> f64 {
        let q = self.frame.inverse() * p;
        normalize_angle(q.y.atan2(q.x))
    }

    #[must_use]
    pub fn derivative(&self, theta: f64) -> Vector3 {
        self.frame
            * Vector3::new(
                -self.half_width * theta.sin(),
                self.half_width * theta.cos(),
                0.0,
            )
    }

    #[must_use]
    pub fn contains_point(&self, p: &Vector3, eps: f64) -> bool {
        (p.norm_squared() - 1.0).abs() <= eps && (p.dot(&self.normal) - self.height).abs() <= eps
    }

    /// `false` for point circles at the poles of the axis.
    #[must_use]
    pub fn has_length(&self) -> bool {
        self.half_width > TOLERANCE
    }
}
