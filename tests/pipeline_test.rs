use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use hopezip::config::HopeConfig;
use hopezip::error::{HopeError, HopeResult};
use hopezip::ocr::OcrEngine;
use hopezip::package::package_results;
use hopezip::pipeline::{process_batch, process_folder, BatchOptions};
use hopezip::router::route_files;
use hopezip::taxonomy::Taxonomy;
use tempfile::tempdir;

/// Serves canned OCR text per filename; unknown files fail like a 500
struct MockOcr {
    pages: HashMap<String, String>,
}

impl MockOcr {
    fn new(pages: Vec<(&str, String)>) -> Self {
        Self {
            pages: pages
                .into_iter()
                .map(|(name, text)| (name.to_string(), text))
                .collect(),
        }
    }
}

#[async_trait]
impl OcrEngine for MockOcr {
    async fn extract_text(&self, image_path: &Path) -> HopeResult<String> {
        let name = image_path.file_name().unwrap().to_string_lossy().to_string();
        self.pages
            .get(&name)
            .cloned()
            .ok_or_else(|| HopeError::ocr(format!("500 Internal Server Error for {}", name)))
    }
}

fn report(unit: &str, defect: &str) -> String {
    format!(
        "현장명: 테스트아파트\n공종: 도배\n동호수: {}\n위치: 거실\n하자유형: {}\n일자: 2024-05-01",
        unit, defect
    )
}

fn seed_images(dir: &Path, names: &[&str]) -> Vec<PathBuf> {
    names
        .iter()
        .map(|name| {
            let path = dir.join(name);
            std::fs::write(&path, b"fake image bytes").unwrap();
            path
        })
        .collect()
}

fn sample_engine() -> MockOcr {
    MockOcr::new(vec![
        ("img1.jpg", report("101-203", "벽지 들뜸")),
        ("img2.jpg", report("3동 502호", "찢김 및 얼룩")),
        ("img3.png", report("", "확인 필요")),
        ("img4.jpg", report("7 12", "곰광이")),
    ])
}

#[tokio::test]
async fn test_failed_ocr_is_omitted_from_batch() {
    let dir = tempdir().unwrap();
    let images = seed_images(dir.path(), &["img1.jpg", "img2.jpg", "img3.png", "img4.jpg", "broken.jpg"]);

    for workers in [1, 3] {
        let options = BatchOptions { workers, fuzzy_threshold: 0.8 };
        let records = process_batch(
            images.clone(),
            Arc::new(sample_engine()),
            Arc::new(Taxonomy::builtin()),
            &options,
        )
        .await;

        assert_eq!(records.len(), 4);
        let names: HashSet<&str> = records.iter().map(|r| r.filename.as_str()).collect();
        assert!(!names.contains("broken.jpg"));
        assert_eq!(names, HashSet::from(["img1.jpg", "img2.jpg", "img3.png", "img4.jpg"]));
    }
}

#[tokio::test]
async fn test_records_carry_location_and_classification() {
    let dir = tempdir().unwrap();
    let images = seed_images(dir.path(), &["img1.jpg", "img2.jpg", "img3.png", "img4.jpg"]);
    let options = BatchOptions { workers: 2, fuzzy_threshold: 0.8 };

    let records = process_batch(images, Arc::new(sample_engine()), Arc::new(Taxonomy::builtin()), &options).await;
    let by_name: HashMap<&str, _> = records.iter().map(|r| (r.filename.as_str(), r)).collect();

    let first = by_name["img1.jpg"];
    assert_eq!((first.building.as_str(), first.unit.as_str()), ("101", "203"));
    assert_eq!(first.classification.joined(), "들뜸");

    let second = by_name["img2.jpg"];
    assert_eq!((second.building.as_str(), second.unit.as_str()), ("3", "502"));
    assert_eq!(second.classification.joined(), "오염, 훼손");

    let third = by_name["img3.png"];
    assert_eq!(third.building_number(), None);
    assert!(third.classification.is_empty());

    let fourth = by_name["img4.jpg"];
    assert_eq!((fourth.building.as_str(), fourth.unit.as_str()), ("7", "12"));
    assert_eq!(fourth.classification.joined(), "누수 및 곰팡이");
}

#[tokio::test]
async fn test_folder_without_images_is_fatal() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("readme.txt"), b"no images").unwrap();

    let result = process_folder(
        dir.path(),
        &HopeConfig::default(),
        Arc::new(sample_engine()),
        Arc::new(Taxonomy::builtin()),
    )
    .await;

    assert!(matches!(result, Err(HopeError::NoValidImages { .. })));
}

#[tokio::test]
async fn test_process_route_package_end_to_end() {
    let dir = tempdir().unwrap();
    let work = dir.path().join("upload");
    std::fs::create_dir(&work).unwrap();
    seed_images(&work, &["img1.jpg", "img2.jpg", "img3.png", "img4.jpg", "broken.jpg"]);

    let config = HopeConfig::default();
    let taxonomy = Taxonomy::builtin();
    let summary = process_folder(&work, &config, Arc::new(sample_engine()), Arc::new(taxonomy.clone()))
        .await
        .unwrap();

    assert_eq!(summary.images, 5);
    assert_eq!(summary.records, 4);
    assert_eq!(summary.skipped(), 1);
    assert!(summary.spreadsheet.is_file());

    let routed = route_files(&summary.spreadsheet, &work, &taxonomy, "unidentified").unwrap();
    assert_eq!(routed.moved, 4);
    assert_eq!(routed.missing, 0);
    assert_eq!(routed.failed, 0);

    assert!(work.join("들뜸").join("img1.jpg").is_file());
    assert!(work.join("오염").join("img2.jpg").is_file());
    assert!(work.join("unidentified").join("img3.png").is_file());
    assert!(work.join("누수 및 곰팡이").join("img4.jpg").is_file());
    // never made it into the spreadsheet, so it stays put
    assert!(work.join("broken.jpg").is_file());

    let zip_path = dir.path().join("bundle.zip");
    let packed = package_results(&work, &config.output.spreadsheet_name, &zip_path).unwrap();
    assert_eq!(packed, 5);
}

#[tokio::test]
async fn test_routing_twice_is_harmless() {
    let dir = tempdir().unwrap();
    seed_images(dir.path(), &["img1.jpg", "img3.png"]);

    let config = HopeConfig::default();
    let taxonomy = Taxonomy::builtin();
    let summary = process_folder(dir.path(), &config, Arc::new(sample_engine()), Arc::new(taxonomy.clone()))
        .await
        .unwrap();

    let first = route_files(&summary.spreadsheet, dir.path(), &taxonomy, "unidentified").unwrap();
    assert_eq!(first.moved, 2);

    let list = |p: &Path| {
        let mut names: Vec<String> = std::fs::read_dir(p)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    };
    let before = list(dir.path());

    let second = route_files(&summary.spreadsheet, dir.path(), &taxonomy, "unidentified").unwrap();
    assert_eq!(second.moved, 0);
    assert_eq!(second.missing, 2);
    assert_eq!(list(dir.path()), before);
    assert_eq!(list(&dir.path().join("들뜸")), vec!["img1.jpg"]);
    assert_eq!(list(&dir.path().join("unidentified")), vec!["img3.png"]);
}
