use std::f64::consts::TAU;

use super::normalize_angle;

/// A directed angular range on a circle.
///
/// Stored as a normalized source angle plus a signed offset in
/// `[-2*pi, 2*pi]`. A positive offset runs counterclockwise in the curve's
/// own parameter, a negative offset clockwise. An offset of magnitude
/// `2*pi` denotes the full circle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircleRange {
    source: f64,
    offset: f64,
}

impl CircleRange {
    /// Full circle starting (and ending) at `source`, counterclockwise.
    #[must_use]
    pub fn circle(source: f64) -> Self {
        Self {
            source: normalize_angle(source),
            offset: TAU,
        }
    }

    /// Range from `source` sweeping by the signed `offset`.
    #[must_use]
    pub fn by_offset(source: f64, offset: f64) -> Self {
        Self {
            source: normalize_angle(source),
            offset: offset.clamp(-TAU, TAU),
        }
    }

    /// Counterclockwise range from `a` to `b`.
    #[must_use]
    pub fn by_counterclockwise(a: f64, b: f64) -> Self {
        Self {
            source: normalize_angle(a),
            offset: normalize_angle(b - a),
        }
    }

    /// Range from `a` to `b` along the shorter way around.
    #[must_use]
    pub fn by_short_segment(a: f64, b: f64) -> Self {
        let mut offset = normalize_angle(b - a);
        if offset > std::f64::consts::PI {
            offset -= TAU;
        }
        Self {
            source: normalize_angle(a),
            offset,
        }
    }

    /// Range from `a` to `b` passing through `mid`.
    #[must_use]
    pub fn by_three_points(a: f64, mid: f64, b: f64) -> Self {
        let ccw = normalize_angle(b - a);
        let rel_mid = normalize_angle(mid - a);
        let offset = if rel_mid <= ccw { ccw } else { ccw - TAU };
        Self {
            source: normalize_angle(a),
            offset,
        }
    }

    /// Start angle, in `[0, 2*pi)`.
    #[must_use]
    pub fn source(&self) -> f64 {
        self.source
    }

    /// End angle, in `[0, 2*pi)`.
    #[must_use]
    pub fn target(&self) -> f64 {
        normalize_angle(self.source + self.offset)
    }

    /// Signed sweep from source to target.
    #[must_use]
    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Absolute angular length of the range.
    #[must_use]
    pub fn length(&self) -> f64 {
        self.offset.abs()
    }

    /// Angle halfway along the range.
    #[must_use]
    pub fn midpoint(&self) -> f64 {
        normalize_angle(self.source + self.offset / 2.0)
    }

    #[must_use]
    pub fn is_circle(&self) -> bool {
        self.offset.abs() >= TAU
    }

    #[must_use]
    pub fn is_counterclockwise(&self) -> bool {
        self.offset >= 0.0
    }

    /// Same range traversed in the opposite direction.
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self {
            source: self.target(),
            offset: -self.offset,
        }
    }

    /// Whether `angle` lies within the range, inclusive of endpoints, with
    /// angular slack `eps`.
    #[must_use]
    pub fn contains(&self, angle: f64, eps: f64) -> bool {
        if self.is_circle() {
            return true;
        }
        // Canonicalize to a counterclockwise sweep from `start`.
        let (start, len) = if self.offset >= 0.0 {
            (self.source, self.offset)
        } else {
            (self.target(), -self.offset)
        };
        let rel = normalize_angle(angle - start);
        rel <= len + eps || rel >= TAU - eps
    }

    /// Splits the range at `angle` into the leading and trailing parts,
    /// both keeping the original direction.
    ///
    /// The caller is responsible for `angle` lying within the range; for a
    /// full circle the first part runs from the source to `angle`.
    #[must_use]
    pub fn split(&self, angle: f64) -> (Self, Self) {
        let lead = if self.offset >= 0.0 {
            normalize_angle(angle - self.source)
        } else {
            -normalize_angle(self.source - angle)
        };
        let first = Self {
            source: self.source,
            offset: lead,
        };
        let second = Self {
            source: normalize_angle(self.source + lead),
            offset: self.offset - lead,
        };
        (first, second)
    }

    /// `n + 1` angles spaced uniformly over the range, endpoints included.
    #[must_use]
    pub fn samples(&self, n: usize) -> Vec<f64> {
        #[allow(clippy::cast_precision_loss)]
        let step = self.offset / n as f64;
        #[allow(clippy::cast_precision_loss)]
        (0..=n)
            .map(|i| normalize_angle(self.source + step * i as f64))
            .collect()
    }
}
