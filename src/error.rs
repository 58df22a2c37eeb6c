use std::{
    error::Error,
    fmt::{Display, Formatter},
};

/// Result type for anything that touches files, parsing, or the command line.
pub type ForesightResult<T> = Result<T, Box<dyn Error>>;

/// Errors raised by the aggregation pipeline itself.
#[derive(Debug, Clone, PartialEq)]
pub enum ForesightError {
    /// The requested H3 resolution is outside of 0..=15.
    InvalidResolution(i32),
    /// A row was missing a value the scorer requires.
    MissingFeature {
        /// Zero based index of the row in the input table.
        row: usize,
        /// Name of the missing feature.
        feature: &'static str,
    },
    /// The ring handed to the boundary constructor is not a closed polygon.
    InvalidBoundary(&'static str),
    /// The hexagonal index could not compute a coverage for the polygon.
    InvalidGeometry(String),
    /// The model file could not be understood.
    ModelFormat(String),
}

impl Display for ForesightError {
    fn fmt(&self, f: &mut Formatter) -> Result<(), std::fmt::Error> {
        use ForesightError::*;

        match self {
            InvalidResolution(res) => {
                write!(f, "invalid H3 resolution {}, must be in 0..=15", res)
            }
            MissingFeature { row, feature } => {
                write!(f, "row {} is missing required feature '{}'", row, feature)
            }
            InvalidBoundary(msg) => write!(f, "invalid boundary: {}", msg),
            InvalidGeometry(msg) => write!(f, "invalid geometry: {}", msg),
            ModelFormat(msg) => write!(f, "invalid model file: {}", msg),
        }
    }
}

impl Error for ForesightError {}
