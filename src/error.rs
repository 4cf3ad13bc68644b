use thiserror::Error;

/// Top-level error type for the orisphere arrangement kernel.
#[derive(Debug, Error)]
pub enum OrisphereError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Topology(#[from] TopologyError),

    #[error(transparent)]
    Numerics(#[from] NumericsError),
}

/// Errors related to geometric computations and curve construction.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("parameter {parameter} = {value} is out of range [{min}, {max}]")]
    ParameterOutOfRange {
        parameter: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    #[error("zero-length vector")]
    ZeroVector,

    #[error("points are antipodal, geodesic is not unique")]
    AntipodalPoints,

    #[error("point ({x}, {y}, {z}) does not lie on the curve")]
    PointNotOnCurve { x: f64, y: f64, z: f64 },

    #[error("curves are coincident, intersection is not discrete")]
    CoincidentCurves,

    #[error("no intersection method for curve pair {left} / {right}")]
    UnsupportedCurvePair {
        left: &'static str,
        right: &'static str,
    },
}

/// Errors related to topological operations on an arrangement.
#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("entity not found: {0}")]
    EntityNotFound(String),

    #[error("arc does not connect to the open end of the chain")]
    ChainNotConnected,

    #[error("chain is already closed")]
    ChainClosed,

    #[error("edge is not incident to the vertex")]
    EdgeNotIncident,

    #[error("no interior point found for face")]
    NoInteriorPoint,

    #[error("no start point avoids every band boundary")]
    NoStartPoint,

    #[error("invalid topology: {0}")]
    InvalidTopology(String),
}

/// Fatal numeric failures. Variants carry the state needed to reproduce.
#[derive(Debug, Error)]
pub enum NumericsError {
    #[error("probe circle radius underflow at vertex ({x}, {y}, {z})")]
    ProbeRadiusUnderflow { x: f64, y: f64, z: f64 },

    #[error("angle recovery failed for point ({x}, {y}, {z}): {reason}")]
    AngleRecovery {
        x: f64,
        y: f64,
        z: f64,
        reason: String,
    },
}

/// Convenience type alias for results using [`OrisphereError`].
pub type Result<T> = std::result::Result<T, OrisphereError>;
