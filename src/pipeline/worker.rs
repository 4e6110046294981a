use super::Settings;
use crate::grid::{self, Grid};
use crate::readers::{RasterReader, ReadError};
use crate::roi::Roi;
use chrono::NaiveDate;
use log::debug;

/// Pulls one acquisition's band, optionally cloud-masked. `Ok(None)` means
/// the scene holds no usable data and should be dropped, not that anything
/// failed.
pub(crate) fn retrieve_band(
    reader: &dyn RasterReader,
    key: NaiveDate,
    band_ref: &str,
    roi: Option<&Roi>,
    cloud_ref: Option<&str>,
    settings: &Settings,
) -> Result<Option<Grid>, ReadError> {
    let threshold = settings.cloud_threshold as f32;

    // The band is read before the mask is consulted, so an all-cloudy scene
    // still costs one band read. The early exit only skips the masking.
    let mut data = reader.read(band_ref, roi, None)?;

    let cloud = match cloud_ref {
        Some(cloud_ref) => {
            let (rows, cols) = data.dim();
            let mask = reader.read(cloud_ref, roi, Some((rows, cols)))?;

            if grid::clear_pixel_count(&mask, threshold) == 0 {
                debug!("{}: no clear pixels, dropping scene", key);
                return Ok(None);
            }

            Some(mask)
        }
        None => None,
    };

    grid::mask_nodata(&mut data, settings.nodata_floor);
    if let Some(mask) = &cloud {
        grid::apply_cloud_mask(&mut data, mask, threshold);
    }

    if grid::nan_mean(&data).is_nan() {
        debug!("{}: every pixel masked out, dropping scene", key);
        return Ok(None);
    }

    Ok(Some(data))
}

/// Computes one acquisition's normalized-difference index from two bands.
///
/// The cloud-clear check has the opposite polarity of `retrieve_band`: the
/// scene is dropped when the mask holds *no* over-threshold pixel. The
/// asymmetry is deliberate and pinned by tests; flipping it is a contract
/// change, not a cleanup.
pub(crate) fn compute_index(
    reader: &dyn RasterReader,
    key: NaiveDate,
    b0_ref: &str,
    b1_ref: &str,
    cloud_ref: &str,
    roi: Option<&Roi>,
    settings: &Settings,
) -> Result<Option<Grid>, ReadError> {
    let threshold = settings.cloud_threshold as f32;

    let mut band0 = reader.read(b0_ref, roi, None)?;
    let (rows, cols) = band0.dim();

    let mask = reader.read(cloud_ref, roi, Some((rows, cols)))?;
    if grid::cloudy_pixel_count(&mask, threshold) == 0 {
        debug!("{}: mask has no over-threshold pixels, dropping scene", key);
        return Ok(None);
    }

    let mut band1 = reader.read(b1_ref, roi, Some((rows, cols)))?;

    grid::mask_nodata(&mut band0, settings.nodata_floor);
    grid::mask_nodata(&mut band1, settings.nodata_floor);
    grid::apply_cloud_mask(&mut band0, &mask, threshold);
    grid::apply_cloud_mask(&mut band1, &mask, threshold);
    grid::scale_reflectance(&mut band0, settings.reflectance_divisor);
    grid::scale_reflectance(&mut band1, settings.reflectance_divisor);

    if grid::nan_mean(&band0).is_nan() {
        debug!("{}: every pixel masked out, dropping scene", key);
        return Ok(None);
    }

    Ok(Some(grid::normalized_difference(&band0, &band1)))
}
