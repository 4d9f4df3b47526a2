use std::path::{Path, PathBuf};
use std::sync::Arc;
use anyhow::{Context, Result};
use tracing::info;

use crate::config::HopeConfig;
use crate::ocr::{MistralOcr, OcrEngine};
use crate::package::package_results;
use crate::pipeline::process_folder;
use crate::router::route_files;
use crate::taxonomy::Taxonomy;

/// Built-in taxonomy, or the replacement named in the config
pub fn load_taxonomy(config: &HopeConfig) -> Result<Taxonomy> {
    match &config.processing.taxonomy_path {
        Some(path) => {
            let taxonomy = Taxonomy::load_from_file(path)?;
            info!("Loaded {} categories from {}", taxonomy.len(), path.display());
            Ok(taxonomy)
        }
        None => Ok(Taxonomy::builtin()),
    }
}

fn ensure_folder(folder: &Path) -> Result<()> {
    if !folder.is_dir() {
        return Err(anyhow::anyhow!("Folder not found: {:?}", folder));
    }
    Ok(())
}

/// OCR every image in the folder and write the results spreadsheet
pub async fn process_command(folder: PathBuf, config: &HopeConfig) -> Result<()> {
    info!("🔍 Processing images in {:?}", folder);
    ensure_folder(&folder)?;

    let engine: Arc<dyn OcrEngine> = Arc::new(MistralOcr::new(&config.ocr)?);
    let taxonomy = Arc::new(load_taxonomy(config)?);

    let summary = process_folder(&folder, config, engine, taxonomy).await?;

    println!("🎉 OCR Complete!");
    println!("   Images found: {}", summary.images);
    println!("   Records written: {}", summary.records);
    println!("   Skipped (OCR failed): {}", summary.skipped());
    println!("   Spreadsheet: {:?}", summary.spreadsheet);

    Ok(())
}

/// Move files into category folders according to the spreadsheet
pub fn route_command(folder: PathBuf, spreadsheet: Option<PathBuf>, config: &HopeConfig) -> Result<()> {
    ensure_folder(&folder)?;
    let spreadsheet = spreadsheet.unwrap_or_else(|| folder.join(&config.output.spreadsheet_name));
    info!("📂 Routing files in {:?} using {:?}", folder, spreadsheet);

    let taxonomy = load_taxonomy(config)?;
    let summary = route_files(&spreadsheet, &folder, &taxonomy, &config.output.unidentified_folder)
        .with_context(|| format!("routing failed for {:?}", folder))?;

    println!("🎉 Routing Complete!");
    println!("   Moved: {}", summary.moved);
    println!("   Not found: {}", summary.missing);
    println!("   Failed: {}", summary.failed);

    Ok(())
}

/// Zip the spreadsheet and category folders
pub fn package_command(folder: PathBuf, output: Option<PathBuf>, config: &HopeConfig) -> Result<PathBuf> {
    ensure_folder(&folder)?;
    let output = output.unwrap_or_else(|| default_archive_path(&folder, config));

    let written = package_results(&folder, &config.output.spreadsheet_name, &output)?;

    println!("📦 Package Complete!");
    println!("   Files: {}", written);
    println!("   Archive: {:?}", output);

    Ok(output)
}

/// OCR, route and package in one go
pub async fn run_command(folder: PathBuf, output: Option<PathBuf>, config: &HopeConfig) -> Result<()> {
    process_command(folder.clone(), config).await?;
    route_command(folder.clone(), None, config)?;
    package_command(folder, output, config)?;
    Ok(())
}

/// Print the classification of a defect description
pub fn classify_command(text: &str, config: &HopeConfig) -> Result<()> {
    let taxonomy = load_taxonomy(config)?;
    let result = taxonomy.classify(text, config.processing.fuzzy_threshold);
    let folder = result.first().unwrap_or(config.output.unidentified_folder.as_str());

    println!("Input:    {}", text);
    println!("Keywords: {}", result);
    println!("Folder:   {}", folder);

    Ok(())
}

pub fn init_config_command(path: PathBuf) -> Result<()> {
    if path.exists() {
        return Err(anyhow::anyhow!("Refusing to overwrite existing file: {:?}", path));
    }
    HopeConfig::default().save_to_file(&path)?;
    println!("⚙️  Default config written to {:?}", path);
    Ok(())
}

/// Archive goes next to the working folder so it is not packed into itself
fn default_archive_path(folder: &Path, config: &HopeConfig) -> PathBuf {
    folder
        .parent()
        .unwrap_or(folder)
        .join(&config.output.archive_name)
}
