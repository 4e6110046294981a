use serde::Deserialize;
use serde::Deserializer;
use serde::de::Error;

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::bands::{Band, BandPair};
use crate::pipeline::Settings;
use crate::roi::Roi;

pub mod error;
pub use error::ConfigError;

/// One extraction run as described by a JSON document: where the
/// acquisition index lives, which field boundary to cut to, which band
/// pair feeds the index, and the pipeline knobs.
#[derive(Debug, Clone)]
pub struct Config {
    catalog_url: String,
    roi_file: Option<String>,
    bands: BandPair,
    cloud_threshold: u8,
    max_workers: usize,
    nodata_floor: f32,
    reflectance_divisor: f32,
}

// Deserializes a Config, filling in pipeline defaults and rejecting
// out-of-range knobs before anything downstream sees them.
impl<'de> Deserialize<'de> for Config {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct ConfigHelper {
            catalog_url: String,
            roi_file: Option<String>,
            bands: Option<[String; 2]>,
            cloud_threshold: Option<u8>,
            max_workers: Option<usize>,
            nodata_floor: Option<f32>,
            reflectance_divisor: Option<f32>,
        }

        let helper = ConfigHelper::deserialize(deserializer)?;
        let defaults = Settings::default();

        let bands = match helper.bands {
            Some([b0, b1]) => {
                let b0: Band = b0.parse().map_err(D::Error::custom)?;
                let b1: Band = b1.parse().map_err(D::Error::custom)?;
                BandPair::new(b0, b1)
            }
            None => BandPair::ndre(),
        };

        let cloud_threshold = helper.cloud_threshold.unwrap_or(defaults.cloud_threshold);
        if !(5..=90).contains(&cloud_threshold) {
            return Err(D::Error::custom(ConfigError::CloudThreshold));
        }

        let max_workers = helper.max_workers.unwrap_or(defaults.max_workers);
        if max_workers == 0 {
            return Err(D::Error::custom(ConfigError::Workers));
        }

        let reflectance_divisor = helper
            .reflectance_divisor
            .unwrap_or(defaults.reflectance_divisor);
        if reflectance_divisor <= 0.0 {
            return Err(D::Error::custom(ConfigError::Reflectance));
        }

        Ok(Config {
            catalog_url: helper.catalog_url,
            roi_file: helper.roi_file,
            bands,
            cloud_threshold,
            max_workers,
            nodata_floor: helper.nodata_floor.unwrap_or(defaults.nodata_floor),
            reflectance_divisor,
        })
    }
}

impl Config {
    pub fn new<S: Into<String>>(catalog_url: S) -> Self {
        let defaults = Settings::default();
        Self {
            catalog_url: catalog_url.into(),
            roi_file: None,
            bands: BandPair::ndre(),
            cloud_threshold: defaults.cloud_threshold,
            max_workers: defaults.max_workers,
            nodata_floor: defaults.nodata_floor,
            reflectance_divisor: defaults.reflectance_divisor,
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);

        let config: Config = serde_json::from_reader(reader).map_err(ConfigError::from)?;

        Ok(config)
    }

    pub fn catalog_url(&self) -> &str {
        &self.catalog_url
    }

    pub fn roi(&self) -> Option<Roi> {
        self.roi_file.as_deref().map(Roi::new)
    }

    pub fn band_pair(&self) -> BandPair {
        self.bands
    }

    pub fn settings(&self) -> Settings {
        Settings {
            cloud_threshold: self.cloud_threshold,
            max_workers: self.max_workers,
            nodata_floor: self.nodata_floor,
            reflectance_divisor: self.reflectance_divisor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    fn write_config(contents: &str) -> Result<Config, ConfigError> {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("extract.json");
        let mut file = File::create(&file_path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();

        Config::from_file(file_path)
    }

    #[test]
    fn test_from_file() {
        let config = write_config(
            r#"
    {
        "catalog_url": "http://example.org/composites/database.json",
        "roi_file": "carto/Field_01.geojson",
        "bands": ["B04", "B08"],
        "cloud_threshold": 60,
        "max_workers": 4
    }
    "#,
        )
        .unwrap();

        assert_eq!(
            config.catalog_url(),
            "http://example.org/composites/database.json"
        );
        assert_eq!(config.roi().unwrap().as_str(), "carto/Field_01.geojson");
        assert_eq!(config.band_pair(), BandPair::ndvi());

        let settings = config.settings();
        assert_eq!(settings.cloud_threshold, 60);
        assert_eq!(settings.max_workers, 4);
    }

    #[test]
    fn test_defaults() {
        let config = write_config(
            r#"{ "catalog_url": "http://example.org/database.json" }"#,
        )
        .unwrap();

        assert!(config.roi().is_none());
        assert_eq!(config.band_pair(), BandPair::ndre());

        let settings = config.settings();
        assert_eq!(settings.cloud_threshold, 20);
        assert_eq!(settings.max_workers, 10);
        assert_eq!(settings.nodata_floor, -9990.0);
        assert_eq!(settings.reflectance_divisor, 10000.0);
    }

    #[test]
    fn test_cloud_threshold_range_is_enforced() {
        let result = write_config(
            r#"{ "catalog_url": "http://example.org/db.json", "cloud_threshold": 95 }"#,
        );
        assert!(result.is_err());

        let result = write_config(
            r#"{ "catalog_url": "http://example.org/db.json", "cloud_threshold": 3 }"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_workers_is_rejected() {
        let result =
            write_config(r#"{ "catalog_url": "http://example.org/db.json", "max_workers": 0 }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_band_is_rejected() {
        let result = write_config(
            r#"{ "catalog_url": "http://example.org/db.json", "bands": ["B04", "B99"] }"#,
        );
        assert!(result.is_err());
    }
}
