use std::path::{Path, PathBuf};

/// A field boundary used as the cutline for every raster read of one
/// extraction call. The reference is kept verbatim; only the raster engine
/// sees the virtual-filesystem prefix for remote documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roi {
    reference: String,
}

impl Roi {
    pub fn new<S: Into<String>>(reference: S) -> Self {
        Self {
            reference: reference.into(),
        }
    }

    /// Boundary document for one numbered field, following the
    /// `Field_NN.geojson` convention inside the boundary directory.
    pub fn field_boundary<P: AsRef<Path>>(dir: P, field_no: u32) -> Self {
        let path = dir
            .as_ref()
            .join(format!("Field_{:02}.geojson", field_no));
        Self::new(path.to_string_lossy().to_string())
    }

    pub fn is_remote(&self) -> bool {
        self.reference.starts_with("http://") || self.reference.starts_with("https://")
    }

    pub fn as_str(&self) -> &str {
        &self.reference
    }

    /// The reference as the raster engine expects it: remote documents go
    /// through GDAL's HTTP virtual filesystem, local paths pass unchanged.
    pub fn cutline_reference(&self) -> String {
        if self.is_remote() {
            format!("/vsicurl/{}", self.reference)
        } else {
            self.reference.clone()
        }
    }
}

/// Lists the field boundary documents present in a directory, sorted by
/// field number.
pub fn discover_boundaries<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>, glob::PatternError> {
    let pattern = dir
        .as_ref()
        .join("Field_*.geojson")
        .to_string_lossy()
        .to_string();

    let mut boundaries: Vec<PathBuf> = glob::glob(&pattern)?.filter_map(|e| e.ok()).collect();
    boundaries.sort();

    Ok(boundaries)
}
