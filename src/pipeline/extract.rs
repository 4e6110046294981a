use super::progress::ProgressSink;
use super::worker;
use super::{ExtractError, Settings};
use crate::bands::{Band, BandPair};
use crate::catalog::{self, Catalog};
use crate::grid::Grid;
use crate::readers::{RasterReader, ReadError};
use crate::roi::Roi;
use chrono::NaiveDate;
use log::info;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::mpsc;

/// Per-call result mapping: only acquisitions that produced usable data
/// appear, so the mapping is never larger than the catalog.
pub type DateSeries = BTreeMap<NaiveDate, Grid>;

/// Fans one worker task per acquisition out over a bounded thread pool and
/// collects results in completion order on the calling thread.
///
/// A worker that finds no usable data reports that in-band and its key is
/// dropped from the result. Everything else (missing cloud mask, unreadable
/// raster) aborts the call with no partial mapping; already-submitted
/// sibling tasks still run to completion before the error is returned.
pub struct Extractor {
    reader: Arc<dyn RasterReader>,
    settings: Settings,
}

enum Outcome {
    Usable(Grid),
    Empty,
    Failed(ReadError),
}

impl Extractor {
    pub fn new(reader: Arc<dyn RasterReader>) -> Self {
        Self::with_settings(reader, Settings::default())
    }

    pub fn with_settings(reader: Arc<dyn RasterReader>, settings: Settings) -> Self {
        Self { reader, settings }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Normalized-difference index series over the caller's band pair.
    /// Every catalog entry must carry a cloud-mask reference.
    pub fn extract_index(
        &self,
        catalog: &Catalog,
        roi: Option<&Roi>,
        bands: BandPair,
        progress: &dyn ProgressSink,
    ) -> Result<DateSeries, ExtractError> {
        let mut jobs = Vec::with_capacity(catalog.len());
        for (date, refs) in catalog.iter() {
            let b0 = band_reference(refs, *date, bands.b0)?.to_string();
            let b1 = band_reference(refs, *date, bands.b1)?.to_string();
            let cloud = catalog::cloud_mask_in(refs)
                .ok_or(ExtractError::MissingCloudMask(*date))?
                .to_string();
            jobs.push((*date, b0, b1, cloud));
        }

        info!(
            "Extracting {} index over {} acquisitions with {} workers",
            bands,
            jobs.len(),
            self.settings.max_workers
        );

        self.run(jobs.len(), progress, |pool, tx| {
            for (date, b0, b1, cloud) in jobs {
                let tx = tx.clone();
                let reader = Arc::clone(&self.reader);
                let roi = roi.cloned();
                let settings = self.settings.clone();

                pool.spawn(move || {
                    let outcome = worker::compute_index(
                        reader.as_ref(),
                        date,
                        &b0,
                        &b1,
                        &cloud,
                        roi.as_ref(),
                        &settings,
                    );
                    let _ = tx.send((date, outcome));
                });
            }
        })
    }

    /// Raw (optionally cloud-masked) series of one named band. With masking
    /// disabled the catalog entries need no cloud-mask reference at all.
    pub fn extract_band(
        &self,
        catalog: &Catalog,
        band: Band,
        roi: Option<&Roi>,
        use_cloud_mask: bool,
        progress: &dyn ProgressSink,
    ) -> Result<DateSeries, ExtractError> {
        let mut jobs = Vec::with_capacity(catalog.len());
        for (date, refs) in catalog.iter() {
            let band_ref = band_reference(refs, *date, band)?.to_string();
            let cloud = if use_cloud_mask {
                Some(
                    catalog::cloud_mask_in(refs)
                        .ok_or(ExtractError::MissingCloudMask(*date))?
                        .to_string(),
                )
            } else {
                None
            };
            jobs.push((*date, band_ref, cloud));
        }

        info!(
            "Extracting band {} over {} acquisitions with {} workers",
            band,
            jobs.len(),
            self.settings.max_workers
        );

        self.run(jobs.len(), progress, |pool, tx| {
            for (date, band_ref, cloud) in jobs {
                let tx = tx.clone();
                let reader = Arc::clone(&self.reader);
                let roi = roi.cloned();
                let settings = self.settings.clone();

                pool.spawn(move || {
                    let outcome = worker::retrieve_band(
                        reader.as_ref(),
                        date,
                        &band_ref,
                        roi.as_ref(),
                        cloud.as_deref(),
                        &settings,
                    );
                    let _ = tx.send((date, outcome));
                });
            }
        })
    }

    fn run<F>(
        &self,
        total: usize,
        progress: &dyn ProgressSink,
        submit: F,
    ) -> Result<DateSeries, ExtractError>
    where
        F: FnOnce(&rayon::ThreadPool, &mpsc::Sender<(NaiveDate, Result<Option<Grid>, ReadError>)>),
    {
        progress.begin(total as u64);
        if total == 0 {
            progress.finish();
            return Ok(DateSeries::new());
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.settings.max_workers)
            .build()?;
        let (tx, rx) = mpsc::channel();

        submit(&pool, &tx);
        drop(tx);

        let mut series = DateSeries::new();
        let mut failure: Option<ExtractError> = None;

        // Results arrive in completion order; the failure (if any) is only
        // surfaced after every submitted task has reported.
        for _ in 0..total {
            let (date, result) = rx.recv().map_err(|_| ExtractError::WorkerLost)?;
            progress.advance(date);

            match outcome_of(result) {
                Outcome::Usable(data) => {
                    series.insert(date, data);
                }
                Outcome::Empty => {}
                Outcome::Failed(source) => {
                    if failure.is_none() {
                        failure = Some(ExtractError::Read { date, source });
                    }
                }
            }
        }

        progress.finish();

        match failure {
            Some(err) => Err(err),
            None => Ok(series),
        }
    }
}

fn outcome_of(result: Result<Option<Grid>, ReadError>) -> Outcome {
    match result {
        Ok(Some(data)) => Outcome::Usable(data),
        Ok(None) => Outcome::Empty,
        Err(e) => Outcome::Failed(e),
    }
}

fn band_reference(refs: &[String], date: NaiveDate, band: Band) -> Result<&str, ExtractError> {
    refs.get(band.index())
        .map(String::as_str)
        .ok_or(ExtractError::MissingBand { date, band })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::NullProgress;
    use crate::pipeline::fixtures::{FakeReader, date, product_entry, uniform};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct CountingSink {
        total: AtomicU64,
        ticks: AtomicUsize,
        keys: Mutex<Vec<NaiveDate>>,
    }

    impl ProgressSink for CountingSink {
        fn begin(&self, total: u64) {
            self.total.store(total, Ordering::SeqCst);
        }

        fn advance(&self, key: NaiveDate) {
            self.ticks.fetch_add(1, Ordering::SeqCst);
            self.keys.lock().unwrap().push(key);
        }

        fn finish(&self) {}
    }

    /// Catalog of `n` days starting 2017-05-01, one full product per day,
    /// plus a reader fixture serving every referenced raster.
    fn populated(n: u32, reader: FakeReader) -> (Catalog, FakeReader) {
        let mut catalog = Catalog::new();
        let mut reader = reader;

        for day in 0..n {
            let key = date(2017, 5, 1 + day);
            let (refs, rasters) = product_entry(&key.to_string());
            catalog.insert(key, refs);

            for (reference, data) in rasters {
                reader = reader.with_grid(&reference, data);
            }
        }

        (catalog, reader)
    }

    #[test]
    fn test_extract_index_over_catalog() {
        let (catalog, reader) = populated(3, FakeReader::new());
        let extractor = Extractor::new(Arc::new(reader));

        let series = extractor
            .extract_index(&catalog, None, BandPair::ndre(), &NullProgress)
            .unwrap();

        assert_eq!(series.len(), 3);
        for data in series.values() {
            // (0.3 - 0.1) / (0.3 + 0.1) from the fixture's band values.
            assert!((data[(0, 0)] - 0.5).abs() < 1e-6);
        }
    }

    #[test]
    fn test_fully_clouded_acquisition_is_absent() {
        let (mut catalog, reader) = populated(2, FakeReader::new());

        // Third entry whose mask has no over-threshold pixel: the inverted
        // clear-check drops it from the index series.
        let clouded = date(2017, 5, 21);
        let (refs, rasters) = product_entry(&clouded.to_string());
        catalog.insert(clouded, refs);
        let mut reader = reader;
        for (reference, data) in rasters {
            let data = if reference.ends_with("_CLD.vrt") {
                uniform(2, 2, 0.0)
            } else {
                data
            };
            reader = reader.with_grid(&reference, data);
        }

        let extractor = Extractor::new(Arc::new(reader));
        let series = extractor
            .extract_index(&catalog, None, BandPair::ndre(), &NullProgress)
            .unwrap();

        assert_eq!(series.len(), 2);
        assert!(!series.contains_key(&clouded));
        assert!(series.len() <= catalog.len());
    }

    #[test]
    fn test_empty_catalog_submits_nothing() {
        let reader = Arc::new(FakeReader::new());
        let extractor = Extractor::new(Arc::clone(&reader) as Arc<dyn RasterReader>);

        let series = extractor
            .extract_index(&Catalog::new(), None, BandPair::ndre(), &NullProgress)
            .unwrap();

        assert!(series.is_empty());
        assert_eq!(reader.read_count(), 0);
    }

    #[test]
    fn test_missing_cloud_mask_aborts_the_call() {
        let mut catalog = Catalog::new();
        let key = date(2017, 5, 1);
        catalog.insert(
            key,
            vec!["a_B02.vrt".to_string(); 13],
        );

        let extractor = Extractor::new(Arc::new(FakeReader::new()));
        let result = extractor.extract_index(&catalog, None, BandPair::ndre(), &NullProgress);

        assert!(matches!(result, Err(ExtractError::MissingCloudMask(d)) if d == key));
    }

    #[test]
    fn test_short_catalog_entry_aborts_the_call() {
        let mut catalog = Catalog::new();
        catalog.insert(date(2017, 5, 1), vec!["a_B02.vrt".to_string()]);

        let extractor = Extractor::new(Arc::new(FakeReader::new()));
        let result = extractor.extract_index(&catalog, None, BandPair::ndre(), &NullProgress);

        assert!(matches!(result, Err(ExtractError::MissingBand { .. })));
    }

    #[test]
    fn test_read_failure_aborts_with_no_partial_mapping() {
        let (mut catalog, reader) = populated(2, FakeReader::new());

        // Entry whose rasters the reader does not serve.
        let broken = date(2017, 5, 21);
        let (refs, _) = product_entry(&broken.to_string());
        catalog.insert(broken, refs);

        let extractor = Extractor::new(Arc::new(reader));
        let result = extractor.extract_index(&catalog, None, BandPair::ndre(), &NullProgress);

        assert!(matches!(result, Err(ExtractError::Read { date, .. }) if date == broken));
    }

    #[test]
    fn test_progress_ticks_once_per_acquisition() {
        let (catalog, reader) = populated(4, FakeReader::new());
        let extractor = Extractor::new(Arc::new(reader));
        let sink = CountingSink::default();

        extractor
            .extract_index(&catalog, None, BandPair::ndre(), &sink)
            .unwrap();

        assert_eq!(sink.total.load(Ordering::SeqCst), 4);
        assert_eq!(sink.ticks.load(Ordering::SeqCst), 4);

        let mut keys = sink.keys.lock().unwrap().clone();
        keys.sort();
        let expected: Vec<NaiveDate> = catalog.dates().copied().collect();
        assert_eq!(keys, expected);
    }

    #[test]
    fn test_concurrency_stays_within_the_worker_bound() {
        let (catalog, reader) =
            populated(25, FakeReader::new().with_delay(Duration::from_millis(2)));
        let reader = Arc::new(reader);

        let settings = Settings {
            max_workers: 4,
            ..Settings::default()
        };
        let extractor =
            Extractor::with_settings(Arc::clone(&reader) as Arc<dyn RasterReader>, settings);

        extractor
            .extract_index(&catalog, None, BandPair::ndre(), &NullProgress)
            .unwrap();

        assert!(reader.peak_in_flight() <= 4);
    }

    #[test]
    fn test_extract_band_without_cloud_mask() {
        let mut catalog = Catalog::new();
        let key = date(2017, 5, 1);
        // No CLD reference anywhere; masking disabled makes that legal.
        let refs: Vec<String> = (0..13).map(|i| format!("layer_{:02}.vrt", i)).collect();
        catalog.insert(key, refs.clone());

        let mut reader = FakeReader::new();
        for reference in &refs {
            reader = reader.with_grid(reference, uniform(2, 2, 42.0));
        }

        let extractor = Extractor::new(Arc::new(reader));
        let series = extractor
            .extract_band(&catalog, Band::B08, None, false, &NullProgress)
            .unwrap();

        assert_eq!(series.len(), 1);
        assert_eq!(series[&key][(0, 0)], 42.0);
    }

    #[test]
    fn test_extract_band_with_cloud_mask() {
        let (catalog, reader) = populated(2, FakeReader::new());
        let extractor = Extractor::new(Arc::new(reader));

        let series = extractor
            .extract_band(&catalog, Band::B08, None, true, &NullProgress)
            .unwrap();

        assert_eq!(series.len(), 2);
        for data in series.values() {
            // Raw digital numbers, cloudy corner masked out.
            assert_eq!(data[(0, 0)], 3000.0);
            assert!(data[(1, 1)].is_nan());
        }
    }
}
