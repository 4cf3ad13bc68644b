use crate::geometry::CurveArc;

use super::vertex::VertexId;

slotmap::new_key_type! {
    /// Unique identifier for an edge in the arrangement.
    pub struct EdgeId;
}

/// Traversal direction of a halfedge relative to its edge's arc.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Along the arc, source to target.
    Forward,
    /// Against the arc, target to source.
    Reverse,
}

impl Direction {
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Direction::Forward => Direction::Reverse,
            Direction::Reverse => Direction::Forward,
        }
    }
}

/// Data associated with an arrangement edge.
///
/// An edge is a non-closed, non-zero-length arc between two vertices.
/// Edges never cross away from a vertex; the arrangement splits them
/// on insertion to keep that invariant.
#[derive(Debug, Clone)]
pub struct EdgeData {
    /// The arc defining this edge's shape, directed source to target.
    pub arc: CurveArc,
    /// Start vertex of the arc.
    pub source: VertexId,
    /// End vertex of the arc.
    pub target: VertexId,
}

/// One of the two oriented traversals of an edge.
///
/// A lightweight handle; the owning [`Arrangement`](super::Arrangement)
/// resolves it to endpoints and a directed arc.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Halfedge {
    /// The edge identifier.
    pub edge: EdgeId,
    /// Which way the edge's arc is traversed.
    pub direction: Direction,
}

impl Halfedge {
    /// The halfedge running along the edge's arc.
    #[must_use]
    pub fn forward(edge: EdgeId) -> Self {
        Self {
            edge,
            direction: Direction::Forward,
        }
    }

    /// The halfedge running against the edge's arc.
    #[must_use]
    pub fn reverse(edge: EdgeId) -> Self {
        Self {
            edge,
            direction: Direction::Reverse,
        }
    }

    /// The oppositely directed halfedge of the same edge.
    #[must_use]
    pub fn twin(self) -> Self {
        Self {
            edge: self.edge,
            direction: self.direction.opposite(),
        }
    }
}
