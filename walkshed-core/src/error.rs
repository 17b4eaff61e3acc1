use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Input file not found: {}", .0.display())]
    MissingInput(PathBuf),
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("GeoJSON error: {0}")]
    GeoJsonError(String),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
}

impl From<geojson::Error> for Error {
    fn from(value: geojson::Error) -> Self {
        Error::GeoJsonError(value.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error::GeoJsonError(value.to_string())
    }
}

/// Reasons a line could not be cut to a sub-line
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TruncationError {
    #[error("line has fewer than two vertices")]
    TooFewVertices,
    #[error("line has zero length")]
    ZeroLength,
    #[error("offsets {start}..{end} are outside 0..{length}")]
    OutOfRange { start: f64, end: f64, length: f64 },
    #[error("offset is not a finite number")]
    NonFinite,
    #[error("segment has no geometry for part {0}")]
    MissingGeometry(usize),
}
