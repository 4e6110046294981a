use super::{RasterReader, ReadError};
use crate::grid::Grid;
use crate::roi::Roi;
use gdal::Dataset;
use gdal::raster::ResampleAlg;
use gdal::vector::LayerAccess;
use log::debug;
use ndarray::Array2;

/// GDAL-backed implementation of the raster seam. Remote references are
/// routed through the HTTP virtual filesystem, the ROI's envelope becomes a
/// pixel window via the source geotransform, and shape requests resample
/// through the read buffer.
#[derive(Debug, Default)]
pub struct WarpReader;

impl WarpReader {
    pub fn new() -> Self {
        Self
    }

    fn cutline_window(
        dataset: &Dataset,
        roi: &Roi,
    ) -> Result<(isize, isize, usize, usize), ReadError> {
        let cutline = Dataset::open(roi.cutline_reference())?;
        let layer = cutline.layer(0)?;
        let envelope = layer.get_extent()?;

        let geo_transform = dataset.geo_transform()?;
        let bounds = (envelope.MinX, envelope.MaxX, envelope.MinY, envelope.MaxY);

        window_from_bounds(&geo_transform, dataset.raster_size(), bounds)
    }
}

impl RasterReader for WarpReader {
    fn read(
        &self,
        reference: &str,
        roi: Option<&Roi>,
        shape: Option<(usize, usize)>,
    ) -> Result<Grid, ReadError> {
        let source = gdal_reference(reference);
        let dataset = Dataset::open(&source)?;
        let (raster_width, raster_height) = dataset.raster_size();

        let (x0, y0, window_width, window_height) = match roi {
            Some(roi) => Self::cutline_window(&dataset, roi)?,
            None => (0, 0, raster_width, raster_height),
        };

        let (rows, cols) = shape.unwrap_or((window_height, window_width));
        debug!(
            "Reading {} window {}x{} at ({}, {}) into {}x{}",
            reference, window_width, window_height, x0, y0, cols, rows
        );

        let band = dataset.rasterband(1)?;
        let buffer = band.read_as::<f32>(
            (x0, y0),
            (window_width, window_height),
            (cols, rows),
            Some(ResampleAlg::NearestNeighbour),
        )?;

        Array2::from_shape_vec((rows, cols), buffer.data().to_vec())
            .map_err(|e| ReadError::Shape(e.to_string()))
    }
}

/// Remote rasters are read through GDAL's HTTP virtual filesystem; local
/// paths pass unchanged.
pub(crate) fn gdal_reference(reference: &str) -> String {
    if reference.starts_with("http://") || reference.starts_with("https://") {
        format!("/vsicurl/{}", reference)
    } else {
        reference.to_string()
    }
}

/// Converts a geographic envelope (min_x, max_x, min_y, max_y) into a
/// clamped pixel window (x0, y0, width, height) on the source raster.
/// geo_transform layout: [top_left_x, pixel_width, 0, top_left_y, 0, -pixel_height]
pub(crate) fn window_from_bounds(
    geo_transform: &[f64; 6],
    raster_size: (usize, usize),
    bounds: (f64, f64, f64, f64),
) -> Result<(isize, isize, usize, usize), ReadError> {
    let (raster_width, raster_height) = raster_size;
    let (min_x, max_x, min_y, max_y) = bounds;

    let pixel_min_x = ((min_x - geo_transform[0]) / geo_transform[1]).floor() as isize;
    let pixel_max_x = ((max_x - geo_transform[0]) / geo_transform[1]).ceil() as isize;
    let pixel_min_y = ((max_y - geo_transform[3]) / geo_transform[5]).floor() as isize;
    let pixel_max_y = ((min_y - geo_transform[3]) / geo_transform[5]).ceil() as isize;

    let x0 = pixel_min_x.max(0);
    let y0 = pixel_min_y.max(0);
    let x1 = pixel_max_x.max(0).min(raster_width as isize);
    let y1 = pixel_max_y.max(0).min(raster_height as isize);

    if x1 <= x0 || y1 <= y0 {
        return Err(ReadError::Window(format!(
            "cutline footprint ({}, {}, {}, {}) does not intersect the raster",
            min_x, max_x, min_y, max_y
        )));
    }

    Ok((x0, y0, (x1 - x0) as usize, (y1 - y0) as usize))
}
