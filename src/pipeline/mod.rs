pub mod error;
pub mod extract;
pub mod progress;
pub mod worker;

pub use error::ExtractError;
pub use extract::{DateSeries, Extractor};
pub use progress::{ConsoleProgress, NullProgress, ProgressSink};

/// Knobs of one extraction run. The nodata floor and reflectance divisor
/// are provider constants for Sentinel-2 surface reflectance, overridable
/// for other products.
#[derive(Debug, Clone)]
pub struct Settings {
    pub cloud_threshold: u8,
    pub max_workers: usize,
    pub nodata_floor: f32,
    pub reflectance_divisor: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cloud_threshold: 20,
            max_workers: 10,
            nodata_floor: -9990.0,
            reflectance_divisor: 10000.0,
        }
    }
}
