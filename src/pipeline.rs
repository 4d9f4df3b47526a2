//! Batch pipeline: images → OCR → records → spreadsheet.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::config::HopeConfig;
use crate::error::{ErrorContext, HopeError, HopeResult};
use crate::logging::PerformanceTimer;
use crate::ocr::OcrEngine;
use crate::record::{build_record, NormalizedRecord};
use crate::spreadsheet;
use crate::taxonomy::Taxonomy;

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub workers: usize,
    pub fuzzy_threshold: f64,
}

impl BatchOptions {
    pub fn from_config(config: &HopeConfig) -> Self {
        Self {
            workers: config.processing.parallel_workers.max(1),
            fuzzy_threshold: config.processing.fuzzy_threshold,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BatchSummary {
    pub images: usize,
    pub records: usize,
    pub spreadsheet: PathBuf,
}

impl BatchSummary {
    pub fn skipped(&self) -> usize {
        self.images - self.records
    }
}

/// Image files directly inside `folder`, sorted by name
pub fn collect_images(folder: &Path, config: &HopeConfig) -> HopeResult<Vec<PathBuf>> {
    let mut images = Vec::new();
    for entry in std::fs::read_dir(folder).with_path(folder)? {
        let path = entry.with_path(folder)?.path();
        if path.is_file() && config.is_image(&path) {
            images.push(path);
        }
    }
    images.sort();
    Ok(images)
}

/// OCR and classify every image; failed images are left out.
///
/// At most `options.workers` images are in flight at once. The returned
/// records are in completion order.
pub async fn process_batch(
    images: Vec<PathBuf>,
    engine: Arc<dyn OcrEngine>,
    taxonomy: Arc<Taxonomy>,
    options: &BatchOptions,
) -> Vec<NormalizedRecord> {
    let total = images.len();
    let permits = Arc::new(Semaphore::new(options.workers.max(1)));
    let mut tasks = JoinSet::new();

    for path in images {
        let engine = Arc::clone(&engine);
        let taxonomy = Arc::clone(&taxonomy);
        let permits = Arc::clone(&permits);
        let threshold = options.fuzzy_threshold;

        tasks.spawn(async move {
            let _permit = permits.acquire_owned().await.ok();
            let filename = file_name(&path);
            let text = engine.extract_text(&path).await;
            build_record(&filename, text, &taxonomy, threshold)
        });
    }

    let mut records = Vec::with_capacity(total);
    let mut completed = 0;
    while let Some(joined) = tasks.join_next().await {
        completed += 1;
        match joined {
            Ok(Some(record)) => records.push(record),
            Ok(None) => {}
            Err(e) => error!("Image task aborted: {}", e),
        }
        info!("{}/{} 처리 완료", completed, total);
    }

    records
}

/// Run the whole OCR stage for a folder and write the results spreadsheet
pub async fn process_folder(
    folder: &Path,
    config: &HopeConfig,
    engine: Arc<dyn OcrEngine>,
    taxonomy: Arc<Taxonomy>,
) -> HopeResult<BatchSummary> {
    let timer = PerformanceTimer::start(format!("OCR batch {}", folder.display()));

    let images = collect_images(folder, config)?;
    if images.is_empty() {
        warn!("No valid images in {}", folder.display());
        return Err(HopeError::NoValidImages {
            folder: folder.display().to_string(),
        });
    }
    info!("📷 Found {} images in {}", images.len(), folder.display());

    let image_count = images.len();
    let records = process_batch(images, engine, taxonomy, &BatchOptions::from_config(config)).await;
    timer.checkpoint("ocr");
    if records.is_empty() {
        warn!("Every image failed OCR in {}", folder.display());
        return Err(HopeError::NoValidImages {
            folder: folder.display().to_string(),
        });
    }

    let spreadsheet_path = folder.join(&config.output.spreadsheet_name);
    spreadsheet::write_records(&spreadsheet_path, &records, &config.output.unidentified_folder)?;
    info!("✅ Spreadsheet saved: {}", spreadsheet_path.display());

    Ok(BatchSummary {
        images: image_count,
        records: records.len(),
        spreadsheet: spreadsheet_path,
    })
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
