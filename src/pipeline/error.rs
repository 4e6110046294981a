use crate::bands::Band;
use crate::readers::ReadError;
use chrono::NaiveDate;
use std::fmt;

/// Failures that abort a whole extraction call. Unusable scenes are not
/// errors; workers report those in-band and the orchestrator drops them.
#[derive(Debug)]
pub enum ExtractError {
    MissingCloudMask(NaiveDate),
    MissingBand { date: NaiveDate, band: Band },
    Read { date: NaiveDate, source: ReadError },
    Pool(rayon::ThreadPoolBuildError),
    WorkerLost,
}

impl fmt::Display for ExtractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractError::MissingCloudMask(date) => {
                write!(f, "No cloud-mask raster in the catalog entry for {}", date)
            }
            ExtractError::MissingBand { date, band } => {
                write!(f, "Catalog entry for {} has no reference for band {}", date, band)
            }
            ExtractError::Read { date, source } => {
                write!(f, "Failed to read acquisition {}: {}", date, source)
            }
            ExtractError::Pool(e) => write!(f, "Failed to build worker pool: {}", e),
            ExtractError::WorkerLost => {
                write!(f, "A worker task ended without reporting a result")
            }
        }
    }
}

impl std::error::Error for ExtractError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExtractError::Read { source, .. } => Some(source),
            ExtractError::Pool(e) => Some(e),
            _ => None,
        }
    }
}

impl From<rayon::ThreadPoolBuildError> for ExtractError {
    fn from(err: rayon::ThreadPoolBuildError) -> ExtractError {
        ExtractError::Pool(err)
    }
}
