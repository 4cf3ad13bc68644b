use super::Vector3;

/// Triangular geodesic grid from a subdivided icosahedron.
///
/// Face midpoints give a roughly uniform covering of the sphere, used to
/// seed searches that need a point away from a set of curves.
#[derive(Debug, Clone)]
pub struct GeodesicGrid {
    faces: Vec<[Vector3; 3]>,
}

impl GeodesicGrid {
    /// Builds the grid with the given number of 4-way subdivision passes.
    /// Zero passes is the plain icosahedron (20 faces); each pass
    /// quadruples the face count.
    #[must_use]
    pub fn new(subdivisions: usize) -> Self {
        let t = (1.0 + 5.0_f64.sqrt()) / 2.0;
        let verts: Vec<Vector3> = [
            (-1.0, t, 0.0),
            (1.0, t, 0.0),
            (-1.0, -t, 0.0),
            (1.0, -t, 0.0),
            (0.0, -1.0, t),
            (0.0, 1.0, t),
            (0.0, -1.0, -t),
            (0.0, 1.0, -t),
            (t, 0.0, -1.0),
            (t, 0.0, 1.0),
            (-t, 0.0, -1.0),
            (-t, 0.0, 1.0),
        ]
        .iter()
        .map(|&(x, y, z)| Vector3::new(x, y, z).normalize())
        .collect();

        const INDICES: [[usize; 3]; 20] = [
            [0, 11, 5],
            [0, 5, 1],
            [0, 1, 7],
            [0, 7, 10],
            [0, 10, 11],
            [1, 5, 9],
            [5, 11, 4],
            [11, 10, 2],
            [10, 7, 6],
            [7, 1, 8],
            [3, 9, 4],
            [3, 4, 2],
            [3, 2, 6],
            [3, 6, 8],
            [3, 8, 9],
            [4, 9, 5],
            [2, 4, 11],
            [6, 2, 10],
            [8, 6, 7],
            [9, 8, 1],
        ];

        let mut faces: Vec<[Vector3; 3]> = INDICES
            .iter()
            .map(|idx| [verts[idx[0]], verts[idx[1]], verts[idx[2]]])
            .collect();

        for _ in 0..subdivisions {
            let mut next = Vec::with_capacity(faces.len() * 4);
            for [a, b, c] in &faces {
                let ab = (a + b).normalize();
                let bc = (b + c).normalize();
                let ca = (c + a).normalize();
                next.push([*a, ab, ca]);
                next.push([*b, bc, ab]);
                next.push([*c, ca, bc]);
                next.push([ab, bc, ca]);
            }
            faces = next;
        }

        Self { faces }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.faces.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Normalized centroids of all grid faces.
    pub fn face_midpoints(&self) -> impl Iterator<Item = Vector3> + '_ {
        self.faces
            .iter()
            .map(|[a, b, c]| ((a + b + c) / 3.0).normalize())
    }
}

/// Approximate minimal enclosing sphere of a point set (Ritter's two-pass
/// construction). Returns `None` for an empty slice.
#[must_use]
pub fn bounding_sphere(points: &[Vector3]) -> Option<(Vector3, f64)> {
    let first = points.first()?;
    let far = |from: &Vector3| {
        points
            .iter()
            .max_by(|a, b| {
                let da = (*a - from).norm_squared();
                let db = (*b - from).norm_squared();
                da.total_cmp(&db)
            })
            .copied()
            .unwrap_or(*from)
    };
    let a = far(first);
    let b = far(&a);
    let mut center = (a + b) / 2.0;
    let mut radius = (b - a).norm() / 2.0;

    for p in points {
        let d = (p - center).norm();
        if d > radius {
            let grown = (radius + d) / 2.0;
            center += (p - center) * ((grown - radius) / d);
            radius = grown;
        }
    }
    Some((center, radius))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::TOLERANCE;

    #[test]
    fn face_counts() {
        assert_eq!(GeodesicGrid::new(0).len(), 20);
        assert_eq!(GeodesicGrid::new(2).len(), 320);
    }

    #[test]
    fn midpoints_are_unit() {
        let grid = GeodesicGrid::new(1);
        for m in grid.face_midpoints() {
            assert!((m.norm() - 1.0).abs() < TOLERANCE);
        }
    }

    #[test]
    fn bounding_sphere_covers_inputs() {
        let points = vec![
            Vector3::new(1.0, 0.0, 0.0),
            Vector3::new(0.0, 1.0, 0.0),
            Vector3::new(0.9, 0.1, 0.2),
            Vector3::new(0.5, 0.5, 0.6),
        ];
        let (center, radius) = bounding_sphere(&points).unwrap();
        for p in &points {
            assert!((p - center).norm() <= radius + TOLERANCE);
        }
    }

    #[test]
    fn empty_input() {
        assert!(bounding_sphere(&[]).is_none());
    }
}
