use crate::grid::Grid;
use crate::roi::Roi;
use std::fmt;

/// The raster access seam. One call returns one band as a 2-D grid:
/// cropped to the ROI footprint when a cutline is given, resampled to
/// `shape` (rows, columns) when one is requested, at the source window's
/// own shape otherwise.
pub trait RasterReader: Send + Sync {
    fn read(
        &self,
        reference: &str,
        roi: Option<&Roi>,
        shape: Option<(usize, usize)>,
    ) -> Result<Grid, ReadError>;
}

#[derive(Debug)]
pub enum ReadError {
    Open(String),
    Gdal(gdal::errors::GdalError),
    Window(String),
    Shape(String),
}

impl fmt::Display for ReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadError::Open(msg) => write!(f, "Failed to open raster: {}", msg),
            ReadError::Gdal(e) => write!(f, "Raster engine error: {}", e),
            ReadError::Window(msg) => write!(f, "Degenerate read window: {}", msg),
            ReadError::Shape(msg) => write!(f, "Buffer shape mismatch: {}", msg),
        }
    }
}

impl std::error::Error for ReadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReadError::Gdal(e) => Some(e),
            _ => None,
        }
    }
}

impl From<gdal::errors::GdalError> for ReadError {
    fn from(err: gdal::errors::GdalError) -> ReadError {
        ReadError::Gdal(err)
    }
}
