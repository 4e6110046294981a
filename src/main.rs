use fieldtrace::{Catalog, Config, ConsoleProgress, Extractor, WarpReader, stats};
use log::info;
use std::sync::Arc;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "./data/config/extract.json".to_string());
    let config = Config::from_file(&config_path)?;

    let catalog = Catalog::from_url(config.catalog_url())?;
    info!("Loaded catalog with {} acquisitions", catalog.len());

    let extractor = Extractor::with_settings(Arc::new(WarpReader::new()), config.settings());
    let roi = config.roi();
    let series = extractor.extract_index(
        &catalog,
        roi.as_ref(),
        config.band_pair(),
        &ConsoleProgress::new(),
    )?;

    println!(
        "Usable acquisitions: {} of {}",
        series.len(),
        catalog.len()
    );
    for (date, data) in &series {
        let summary = stats::summarize(data);
        println!(
            "{}  min: {:.3}  max: {:.3}  mean: {:.3}  valid: {:.1}%",
            date,
            summary.min,
            summary.max,
            summary.mean,
            100.0 * summary.valid_fraction
        );
    }

    Ok(())
}
