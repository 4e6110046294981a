use chrono::NaiveDate;
use log::debug;
use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Cloud-mask rasters are published alongside the spectral bands and found
/// by name, not by position.
pub const CLOUD_MASK_SUFFIX: &str = "_CLD.vrt";

/// Date-keyed acquisition index: one entry per satellite overpass, holding
/// the raster references of every band of that product in layout order.
///
/// The index document is a JSON object whose keys are ISO dates
/// (`YYYY-MM-DD`) and whose values are arrays of raster reference strings.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: BTreeMap<NaiveDate, Vec<String>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetches and parses a remote index document.
    pub fn from_url(url: &str) -> Result<Self, CatalogError> {
        debug!("Fetching acquisition index from {}", url);

        let body = reqwest::blocking::get(url)?.error_for_status()?.text()?;
        let raw: BTreeMap<String, Vec<String>> = serde_json::from_str(&body)?;

        Self::from_raw(raw)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, CatalogError> {
        let raw: BTreeMap<String, Vec<String>> = serde_json::from_reader(reader)?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: BTreeMap<String, Vec<String>>) -> Result<Self, CatalogError> {
        let mut entries = BTreeMap::new();

        for (key, references) in raw {
            let date = NaiveDate::parse_from_str(&key, "%Y-%m-%d")?;
            entries.insert(date, references);
        }

        Ok(Self { entries })
    }

    pub fn insert(&mut self, date: NaiveDate, references: Vec<String>) {
        self.entries.insert(date, references);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NaiveDate, &[String])> {
        self.entries.iter().map(|(date, refs)| (date, refs.as_slice()))
    }

    pub fn dates(&self) -> impl Iterator<Item = &NaiveDate> {
        self.entries.keys()
    }

    pub fn references(&self, date: &NaiveDate) -> Option<&[String]> {
        self.entries.get(date).map(Vec::as_slice)
    }

    /// The cloud-mask raster of one acquisition, if the entry carries one.
    pub fn cloud_mask(&self, date: &NaiveDate) -> Option<&str> {
        self.entries.get(date).and_then(|refs| cloud_mask_in(refs))
    }
}

pub(crate) fn cloud_mask_in(references: &[String]) -> Option<&str> {
    references
        .iter()
        .find(|r| r.ends_with(CLOUD_MASK_SUFFIX))
        .map(String::as_str)
}

#[derive(Debug)]
pub enum CatalogError {
    Http(reqwest::Error),
    Io(std::io::Error),
    Json(serde_json::Error),
    DateParse(chrono::ParseError),
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::Http(e) => write!(f, "Failed to fetch index document: {}", e),
            CatalogError::Io(e) => write!(f, "I/O error: {}", e),
            CatalogError::Json(e) => write!(f, "Failed to parse index document: {}", e),
            CatalogError::DateParse(e) => write!(f, "Invalid acquisition date key: {}", e),
        }
    }
}

impl std::error::Error for CatalogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CatalogError::Http(e) => Some(e),
            CatalogError::Io(e) => Some(e),
            CatalogError::Json(e) => Some(e),
            CatalogError::DateParse(e) => Some(e),
        }
    }
}

impl From<reqwest::Error> for CatalogError {
    fn from(err: reqwest::Error) -> CatalogError {
        CatalogError::Http(err)
    }
}

impl From<std::io::Error> for CatalogError {
    fn from(err: std::io::Error) -> CatalogError {
        CatalogError::Io(err)
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> CatalogError {
        CatalogError::Json(err)
    }
}

impl From<chrono::ParseError> for CatalogError {
    fn from(err: chrono::ParseError) -> CatalogError {
        CatalogError::DateParse(err)
    }
}
