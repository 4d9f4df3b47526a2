//! File router: moves each processed image into its category folder.

use std::path::Path;
use tracing::{info, warn};

use crate::error::{ErrorContext, HopeResult};
use crate::spreadsheet::{read_routing_rows, RoutingRow};
use crate::taxonomy::Taxonomy;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoutingSummary {
    pub moved: usize,
    pub missing: usize,
    pub failed: usize,
}

/// Folder for a `키워드` value: its first token resolved against the
/// taxonomy, or `unidentified` when that token is empty or unknown.
pub fn resolve_folder<'a>(taxonomy: &'a Taxonomy, keywords: &str, unidentified: &'a str) -> &'a str {
    keywords
        .split([',', '/'])
        .map(str::trim)
        .find(|token| !token.is_empty())
        .and_then(|first| taxonomy.lookup(first))
        .unwrap_or(unidentified)
}

/// Move one file from `source_folder` into its category subfolder.
///
/// Returns `false` when the file is not (or no longer) in `source_folder`.
pub fn route_row(
    row: &RoutingRow,
    source_folder: &Path,
    taxonomy: &Taxonomy,
    unidentified: &str,
) -> HopeResult<bool> {
    let folder = resolve_folder(taxonomy, &row.keywords, unidentified);
    let source_path = source_folder.join(&row.filename);

    if !source_path.is_file() {
        warn!(file = %row.filename, "File not found");
        return Ok(false);
    }

    let dest_folder = source_folder.join(folder);
    std::fs::create_dir_all(&dest_folder).with_path(&dest_folder)?;
    let dest_path = dest_folder.join(&row.filename);
    std::fs::rename(&source_path, &dest_path).with_path(&source_path)?;

    info!(file = %row.filename, category = %folder, "Moved");
    Ok(true)
}

/// Route every row of the results spreadsheet.
///
/// Missing files are skipped and a row whose move fails is logged and
/// counted; neither stops the remaining rows.
pub fn route_files(
    spreadsheet: &Path,
    source_folder: &Path,
    taxonomy: &Taxonomy,
    unidentified: &str,
) -> HopeResult<RoutingSummary> {
    let rows = read_routing_rows(spreadsheet)?;
    let mut summary = RoutingSummary::default();

    for row in &rows {
        match route_row(row, source_folder, taxonomy, unidentified) {
            Ok(true) => summary.moved += 1,
            Ok(false) => summary.missing += 1,
            Err(e) => {
                warn!(file = %row.filename, error = %e, "Routing failed");
                summary.failed += 1;
            }
        }
    }

    info!(
        "✅ 파일 분류 및 이동 완료: {} moved, {} not found, {} failed",
        summary.moved, summary.missing, summary.failed
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::build_record;
    use crate::spreadsheet::write_records;
    use tempfile::tempdir;

    fn row(filename: &str, keywords: &str) -> RoutingRow {
        RoutingRow {
            filename: filename.to_string(),
            keywords: keywords.to_string(),
        }
    }

    #[test]
    fn test_resolve_first_token_only() {
        let taxonomy = Taxonomy::builtin();
        assert_eq!(resolve_folder(&taxonomy, "들뜸, 훼손", "unidentified"), "들뜸");
        assert_eq!(resolve_folder(&taxonomy, "누수 및 곰팡이, 오염", "unidentified"), "누수 및 곰팡이");
        assert_eq!(resolve_folder(&taxonomy, "찢김/오염", "unidentified"), "훼손");
    }

    #[test]
    fn test_resolve_unidentified() {
        let taxonomy = Taxonomy::builtin();
        assert_eq!(resolve_folder(&taxonomy, "", "unidentified"), "unidentified");
        assert_eq!(resolve_folder(&taxonomy, "모름, 들뜸", "unidentified"), "unidentified");
    }

    #[test]
    fn test_route_row_moves_file() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.jpg"), b"img").unwrap();

        let moved = route_row(&row("a.jpg", "들뜸, 훼손"), dir.path(), &Taxonomy::builtin(), "unidentified").unwrap();

        assert!(moved);
        assert!(!dir.path().join("a.jpg").exists());
        assert!(dir.path().join("들뜸").join("a.jpg").is_file());
    }

    #[test]
    fn test_route_row_missing_file() {
        let dir = tempdir().unwrap();
        let moved = route_row(&row("gone.jpg", ""), dir.path(), &Taxonomy::builtin(), "unidentified").unwrap();
        assert!(!moved);
        assert!(!dir.path().join("unidentified").exists());
    }

    #[test]
    fn test_failed_row_does_not_stop_later_rows() {
        let dir = tempdir().unwrap();
        let taxonomy = Taxonomy::builtin();
        std::fs::write(dir.path().join("a.jpg"), b"img").unwrap();
        std::fs::write(dir.path().join("b.jpg"), b"img").unwrap();
        // a plain file where the 들뜸 folder should go
        std::fs::write(dir.path().join("들뜸"), b"not a folder").unwrap();

        let records: Vec<_> = [("a.jpg", "하자유형: 들뜸"), ("b.jpg", "하자유형: 오염")]
            .iter()
            .map(|(name, text)| build_record(name, Ok(text.to_string()), &taxonomy, 0.8).unwrap())
            .collect();
        let sheet = dir.path().join("results.xlsx");
        write_records(&sheet, &records, "unidentified").unwrap();

        let summary = route_files(&sheet, dir.path(), &taxonomy, "unidentified").unwrap();

        assert_eq!(summary, RoutingSummary { moved: 1, missing: 0, failed: 1 });
        assert!(dir.path().join("a.jpg").is_file());
        assert!(dir.path().join("오염").join("b.jpg").is_file());
    }
}
