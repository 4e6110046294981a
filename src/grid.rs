use ndarray::{Array2, Zip};

/// One raster read, clipped and aligned: rows x columns of f32 with NaN as
/// the only in-band marker for unusable pixels.
pub type Grid = Array2<f32>;

/// Replaces provider nodata sentinels with NaN. Anything below the floor is
/// nodata; the floor itself is a valid value.
pub fn mask_nodata(grid: &mut Grid, floor: f32) {
    grid.mapv_inplace(|v| if v < floor { f32::NAN } else { v });
}

/// Sets every pixel whose cloud confidence exceeds the threshold to NaN.
/// The mask must already be aligned to the grid's shape.
pub fn apply_cloud_mask(grid: &mut Grid, mask: &Grid, threshold: f32) {
    Zip::from(grid).and(mask).for_each(|v, &confidence| {
        if confidence > threshold {
            *v = f32::NAN;
        }
    });
}

/// Pixels strictly below the threshold, i.e. confidently clear ones.
pub fn clear_pixel_count(mask: &Grid, threshold: f32) -> usize {
    mask.iter().filter(|&&v| v < threshold).count()
}

/// Pixels strictly above the threshold, i.e. confidently cloudy ones.
pub fn cloudy_pixel_count(mask: &Grid, threshold: f32) -> usize {
    mask.iter().filter(|&&v| v > threshold).count()
}

/// Mean over finite pixels, accumulated in f64 for stability. NaN when no
/// pixel survives masking.
pub fn nan_mean(grid: &Grid) -> f32 {
    let mut sum = 0.0f64;
    let mut count = 0usize;

    for &v in grid.iter() {
        if !v.is_nan() {
            sum += v as f64;
            count += 1;
        }
    }

    if count == 0 {
        f32::NAN
    } else {
        (sum / count as f64) as f32
    }
}

/// Converts digital numbers to reflectance by dividing through the provider
/// scale factor.
pub fn scale_reflectance(grid: &mut Grid, divisor: f32) {
    grid.mapv_inplace(|v| v / divisor);
}

/// Pixelwise (b1 - b0) / (b1 + b0). Zero denominators and NaN operands
/// propagate NaN, no guard.
pub fn normalized_difference(b0: &Grid, b1: &Grid) -> Grid {
    (b1 - b0) / (b1 + b0)
}
