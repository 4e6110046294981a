use crate::grid::Grid;

/// Finite-pixel statistics of one extracted grid, as reported per date by
/// the demo binary.
#[derive(Debug, Clone, Copy)]
pub struct GridSummary {
    pub min: f32,
    pub max: f32,
    pub mean: f32,
    pub valid_fraction: f32,
}

pub fn summarize(grid: &Grid) -> GridSummary {
    let valid: Vec<f32> = grid.iter().filter(|v| !v.is_nan()).copied().collect();

    let min = valid.iter().fold(f32::INFINITY, |a, &b| a.min(b));
    let max = valid.iter().fold(f32::NEG_INFINITY, |a, &b| a.max(b));
    let mean = if valid.is_empty() {
        f32::NAN
    } else {
        valid.iter().sum::<f32>() / valid.len() as f32
    };

    GridSummary {
        min,
        max,
        mean,
        valid_fraction: valid.len() as f32 / grid.len() as f32,
    }
}

/// Flattened finite sample of a grid, the per-date input of distribution
/// plots over a season.
pub fn finite_values(grid: &Grid) -> Vec<f32> {
    grid.iter().filter(|v| !v.is_nan()).copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_summarize_ignores_masked_pixels() {
        let grid = array![[0.2, f32::NAN], [0.4, 0.6]];
        let summary = summarize(&grid);

        assert_eq!(summary.min, 0.2);
        assert_eq!(summary.max, 0.6);
        assert!((summary.mean - 0.4).abs() < 1e-6);
        assert_eq!(summary.valid_fraction, 0.75);
    }

    #[test]
    fn test_summarize_fully_masked_grid() {
        let grid = array![[f32::NAN, f32::NAN]];
        let summary = summarize(&grid);

        assert!(summary.mean.is_nan());
        assert_eq!(summary.valid_fraction, 0.0);
    }

    #[test]
    fn test_finite_values() {
        let grid = array![[0.1, f32::NAN], [f32::NAN, 0.3]];
        assert_eq!(finite_values(&grid), vec![0.1, 0.3]);
    }
}
