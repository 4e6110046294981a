//! Per-field vegetation-index time series from multi-date satellite
//! imagery.
//!
//! A date-keyed [`Catalog`] of raster references fans out over a bounded
//! worker pool; each worker clips its acquisition to a field boundary,
//! masks nodata and cloudy pixels, and either computes a
//! normalized-difference index or returns one raw band. The
//! [`Extractor`] collects results in completion order and keeps only the
//! acquisitions that produced usable data.

pub mod bands;
pub mod catalog;
pub mod config;
pub mod grid;
pub mod pipeline;
pub mod readers;
pub mod roi;
pub mod stats;

pub use bands::{Band, BandPair};
pub use catalog::Catalog;
pub use config::Config;
pub use pipeline::{ConsoleProgress, DateSeries, Extractor, NullProgress, ProgressSink, Settings};
pub use readers::{RasterReader, WarpReader};
pub use roi::Roi;
