use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SegmentError {
    #[error("invalid grid dimensions: {reason}")]
    InvalidDimensions { reason: String },

    #[error("cannot build a graph from {cells} cell(s), at least 2 are needed")]
    EmptyGraph { cells: usize },

    #[error("invalid {name}: {value} (must be a finite positive number)")]
    InvalidParameter { name: &'static str, value: f32 },

    /// A cell id outside the forest. This is a construction bug, never an
    /// input problem.
    #[error("unknown cell {cell} in a forest of {len} cells")]
    UnknownCell { cell: usize, len: usize },
}

impl SegmentError {
    pub(crate) fn dimensions(reason: impl Into<String>) -> SegmentError {
        SegmentError::InvalidDimensions {
            reason: reason.into(),
        }
    }
}
