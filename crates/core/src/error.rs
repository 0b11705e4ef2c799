use thiserror::Error;

/// Reasons a generation run is aborted. A run that fails never hands out a
/// partial artifact.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("{axis} segment count must be positive, got {value}")]
    InvalidSegments { axis: SegmentAxis, value: i32 },

    #[error("artifact allocation failed: {0}")]
    Allocation(String),

    #[error("thread setup failed: {0}")]
    ThreadSetup(String),

    #[error("post-processing invalidated the artifact")]
    PostProcessInvalidated,

    #[error("unknown primitive '{0}'")]
    UnknownPrimitive(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentAxis {
    U,
    V,
    Curve,
}

impl std::fmt::Display for SegmentAxis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SegmentAxis::U => write!(f, "u"),
            SegmentAxis::V => write!(f, "v"),
            SegmentAxis::Curve => write!(f, "curve"),
        }
    }
}

pub type Result<T> = std::result::Result<T, GenerationError>;
