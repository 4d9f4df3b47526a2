//! Zip packaging of the routed working folder.

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{ErrorContext, HopeError, HopeResult};

/// Bundle `spreadsheet_name` and every subfolder of `work_dir` into `output`.
///
/// Files left loose in `work_dir` (other than the spreadsheet) are not
/// packed. Returns the number of files written.
pub fn package_results(work_dir: &Path, spreadsheet_name: &str, output: &Path) -> HopeResult<usize> {
    let file = File::create(output).with_path(output)?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut written = 0;
    let spreadsheet = work_dir.join(spreadsheet_name);
    if spreadsheet.is_file() {
        add_file(&mut zip, &spreadsheet, spreadsheet_name, options)?;
        written += 1;
    }

    for dir in sorted_entries(work_dir)?.into_iter().filter(|p| p.is_dir()) {
        let name = entry_name(&dir);
        written += add_dir(&mut zip, &dir, &name, options)?;
    }

    zip.finish()
        .map_err(|e| HopeError::archive(output.display().to_string(), e))?;
    info!("📦 Packed {} files into {}", written, output.display());
    Ok(written)
}

fn add_dir(
    zip: &mut ZipWriter<File>,
    dir: &Path,
    prefix: &str,
    options: SimpleFileOptions,
) -> HopeResult<usize> {
    zip.add_directory(format!("{}/", prefix), options)
        .map_err(|e| HopeError::archive(dir.display().to_string(), e))?;
    let mut written = 0;
    for path in sorted_entries(dir)? {
        let name = format!("{}/{}", prefix, entry_name(&path));
        if path.is_dir() {
            written += add_dir(zip, &path, &name, options)?;
        } else {
            add_file(zip, &path, &name, options)?;
            written += 1;
        }
    }
    Ok(written)
}

fn add_file(
    zip: &mut ZipWriter<File>,
    path: &Path,
    name: &str,
    options: SimpleFileOptions,
) -> HopeResult<()> {
    let mut buffer = Vec::new();
    File::open(path)
        .and_then(|mut f| f.read_to_end(&mut buffer))
        .with_path(path)?;
    zip.start_file(name, options)
        .map_err(|e| HopeError::archive(path.display().to_string(), e))?;
    zip.write_all(&buffer).with_path(path)?;
    Ok(())
}

fn sorted_entries(dir: &Path) -> HopeResult<Vec<PathBuf>> {
    let mut entries = Vec::new();
    for entry in std::fs::read_dir(dir).with_path(dir)? {
        entries.push(entry.with_path(dir)?.path());
    }
    entries.sort();
    Ok(entries)
}

fn entry_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn archive_names(path: &Path) -> Vec<String> {
        let mut archive = zip::ZipArchive::new(File::open(path).unwrap()).unwrap();
        (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect()
    }

    #[test]
    fn test_packs_spreadsheet_and_category_folders() {
        let work = tempdir().unwrap();
        let out = tempdir().unwrap();
        std::fs::write(work.path().join("results.xlsx"), b"xlsx").unwrap();
        std::fs::write(work.path().join("loose.jpg"), b"img").unwrap();
        std::fs::create_dir(work.path().join("들뜸")).unwrap();
        std::fs::write(work.path().join("들뜸").join("a.jpg"), b"img").unwrap();
        std::fs::create_dir(work.path().join("unidentified")).unwrap();
        std::fs::write(work.path().join("unidentified").join("b.jpg"), b"img").unwrap();

        let zip_path = out.path().join("bundle.zip");
        let written = package_results(work.path(), "results.xlsx", &zip_path).unwrap();

        assert_eq!(written, 3);
        let names = archive_names(&zip_path);
        assert!(names.contains(&"results.xlsx".to_string()));
        assert!(names.contains(&"들뜸/a.jpg".to_string()));
        assert!(names.contains(&"unidentified/b.jpg".to_string()));
        assert!(!names.iter().any(|n| n.contains("loose.jpg")));
    }

    #[test]
    fn test_missing_spreadsheet_still_packs_folders() {
        let work = tempdir().unwrap();
        let out = tempdir().unwrap();
        std::fs::create_dir(work.path().join("오염")).unwrap();
        std::fs::write(work.path().join("오염").join("c.jpg"), b"img").unwrap();

        let zip_path = out.path().join("bundle.zip");
        assert_eq!(package_results(work.path(), "results.xlsx", &zip_path).unwrap(), 1);
    }
}
