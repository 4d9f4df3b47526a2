//! Defect taxonomy shared by classification and file routing.
//!
//! One ordered table of category → synonyms. `classify` does the fuzzy
//! per-token matching used when building records; `lookup` does the exact
//! keyword resolution used when routing files into folders.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use tracing::debug;

use crate::error::{ErrorContext, HopeError, HopeResult};
use crate::similarity;

/// Built-in table, including known OCR misreads of each term
const BUILTIN: &[(&str, &[&str])] = &[
    ("단차불량", &["단차불량", "단차"]),
    ("훼손", &[
        "훼손", "찢김", "긁힘", "파손", "깨짐", "갈라짐", "찍힘", "스크래치", "손상", "뜯김",
        "찢어짐", "칼자국", "터짐", "까짐", "흠집", "찍김", "웨손", "긁험", "찍험", "찍임",
        "직힘", "긁림", "긁임", "찢심", "횟손", "찢검", "찢감",
    ]),
    ("오염", &["오염", "더러움", "얼룩", "변색", "낙서", "볼펜자국"]),
    ("누수 및 곰팡이", &["누수 및 곰팡이", "곰팡이", "누수", "곧광이", "곰광이"]),
    ("면불량", &["면불량", "면 불량", "퍼티", "돌출", "이물질", "돌기", "벽면불", "면불랑"]),
    ("들뜸", &["들뜸", "들뜰", "들픔", "들듬", "들음", "들등", "둘뜸", "들뜯", "돌뜸"]),
    ("꼬임", &["꼬임"]),
    ("주름", &["주름"]),
    ("울음", &["울음"]),
    ("석고수정", &["석고", "석고수정", "석고보드", "석고작업", "석고면불량"]),
    ("몰딩수정", &["몰딩", "몰딩수정", "몰딩교체", "몰딩작업", "돌딩", "올딩"]),
    ("걸레받이 수정", &[
        "걸레받이 수정", "걸레받이", "걸래받이", "걸레받지", "걸레받이수정", "걸레받이 교체",
        "걸레받이 작업",
    ]),
    ("문틀수정", &["문틀수정", "문틀"]),
    ("가구수정", &["가구", "가구수정"]),
    ("틈새", &["틈새", "틈새수정", "틈새과다", "벌어짐"]),
    ("합판", &["합판길이부족", "합판"]),
    ("결로", &["결로"]),
    ("이음새", &["이음새", "이음"]),
    ("오타공", &["오타공", "오타콩", "타공과다", "피스타공", "과타공", "타공"]),
    ("내장후속", &["내장후속", "내장 후속", "후속"]),
    ("탈락", &["탈락"]),
    ("마감불량", &["마감불량"]),
    ("폼시공", &["폼시공"]),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub synonyms: Vec<String>,
}

/// Ordered category table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Taxonomy {
    #[serde(rename = "category")]
    categories: Vec<Category>,
}

impl Default for Taxonomy {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Taxonomy {
    pub fn builtin() -> Self {
        let categories = BUILTIN
            .iter()
            .map(|(name, synonyms)| Category {
                name: name.to_string(),
                synonyms: synonyms.iter().map(|s| s.to_string()).collect(),
            })
            .collect();
        Self { categories }
    }

    pub fn new(categories: Vec<Category>) -> HopeResult<Self> {
        let taxonomy = Self { categories };
        taxonomy.validate()?;
        Ok(taxonomy)
    }

    /// Load a replacement table from TOML (`[[category]]` entries, order kept)
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> HopeResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).with_path(path)?;
        let taxonomy: Taxonomy = toml::from_str(&content).map_err(|e| {
            HopeError::configuration(format!("invalid taxonomy {}: {}", path.display(), e))
        })?;
        taxonomy.validate()?;
        Ok(taxonomy)
    }

    fn validate(&self) -> HopeResult<()> {
        let mut seen = BTreeSet::new();
        for category in &self.categories {
            if category.name.trim().is_empty() {
                return Err(HopeError::configuration("taxonomy category with empty name"));
            }
            if !seen.insert(category.name.as_str()) {
                return Err(HopeError::configuration(format!(
                    "duplicate taxonomy category: {}",
                    category.name
                )));
            }
            if category.synonyms.iter().any(|s| s.is_empty()) {
                return Err(HopeError::configuration(format!(
                    "empty synonym in category {}",
                    category.name
                )));
            }
        }
        Ok(())
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Fuzzy classification of a free-text defect description.
    ///
    /// A synonym matches a whitespace token when it is a substring of the
    /// token or their similarity ratio is strictly above `threshold`.
    pub fn classify(&self, text: &str, threshold: f64) -> Classification {
        let lowered = text.to_lowercase();
        let tokens: Vec<&str> = lowered.split_whitespace().collect();
        let mut matched = BTreeSet::new();

        for category in &self.categories {
            for synonym in &category.synonyms {
                let hit = tokens.iter().find(|token| {
                    token.contains(synonym.as_str())
                        || similarity::ratio(synonym, token) > threshold
                });
                if let Some(token) = hit {
                    debug!(category = %category.name, synonym = %synonym, token = %token, "Synonym matched");
                    matched.insert(category.name.clone());
                }
            }
        }

        Classification {
            categories: matched.into_iter().collect(),
        }
    }

    /// Exact resolution of a keyword to its category name
    pub fn lookup(&self, keyword: &str) -> Option<&str> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return None;
        }
        self.categories
            .iter()
            .find(|c| c.name == keyword || c.synonyms.iter().any(|s| s == keyword))
            .map(|c| c.name.as_str())
    }
}

/// Sorted, de-duplicated category names matched for one description
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    categories: Vec<String>,
}

impl Classification {
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// First category in sorted order; decides the link and folder
    pub fn first(&self) -> Option<&str> {
        self.categories.first().map(String::as_str)
    }

    pub fn joined(&self) -> String {
        self.categories.join(", ")
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.joined())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_FUZZY_THRESHOLD;
    use tempfile::tempdir;

    fn classify(text: &str) -> String {
        Taxonomy::builtin().classify(text, DEFAULT_FUZZY_THRESHOLD).joined()
    }

    #[test]
    fn test_substring_match() {
        assert_eq!(classify("벽지 들뜸 발생"), "들뜸");
        assert_eq!(classify("몰딩교체필요"), "몰딩수정");
    }

    #[test]
    fn test_known_misspellings() {
        assert_eq!(classify("둘뜸"), "들뜸");
        assert_eq!(classify("곰광이"), "누수 및 곰팡이");
        assert_eq!(classify("오타콩"), "오타공");
    }

    #[test]
    fn test_multiple_categories_sorted() {
        let result = classify("찢김 그리고 얼룩");
        assert_eq!(result, "오염, 훼손");

        let result = Taxonomy::builtin().classify("결로 결로 곰팡이 결로", 0.8);
        assert_eq!(result.categories(), &["결로".to_string(), "누수 및 곰팡이".to_string()]);
    }

    #[test]
    fn test_fuzzy_match_without_substring() {
        // one inserted character: ratio 8/9
        assert_eq!(classify("마감의불량"), "마감불량");
    }

    #[test]
    fn test_threshold_is_strict() {
        let taxonomy = Taxonomy::new(vec![Category {
            name: "마감불량".into(),
            synonyms: vec!["마감불량".into()],
        }])
        .unwrap();
        // 마감의불량 scores 0.888..
        assert!(taxonomy.classify("마감의불량", 0.88).first().is_some());
        assert!(taxonomy.classify("마감의불량", 0.9).is_empty());
    }

    #[test]
    fn test_no_match_is_empty() {
        assert_eq!(classify(""), "");
        assert_eq!(classify("   "), "");
        assert_eq!(classify("양호 확인"), "");
        assert_eq!(classify("abc xyz"), "");
    }

    #[test]
    fn test_lowercases_input() {
        let taxonomy = Taxonomy::new(vec![Category {
            name: "putty".into(),
            synonyms: vec!["putty".into()],
        }])
        .unwrap();
        assert_eq!(taxonomy.classify("PUTTY residue", 0.8).joined(), "putty");
    }

    #[test]
    fn test_every_category_is_a_lookup_key() {
        let taxonomy = Taxonomy::builtin();
        for category in taxonomy.categories() {
            assert_eq!(taxonomy.lookup(&category.name), Some(category.name.as_str()));
        }
    }

    #[test]
    fn test_lookup_synonyms() {
        let taxonomy = Taxonomy::builtin();
        assert_eq!(taxonomy.lookup("찢김"), Some("훼손"));
        assert_eq!(taxonomy.lookup(" 내장 후속 "), Some("내장후속"));
        assert_eq!(taxonomy.lookup("없는말"), None);
        assert_eq!(taxonomy.lookup(""), None);
    }

    #[test]
    fn test_classification_first() {
        let result = Taxonomy::builtin().classify("훼손 들뜸", 0.8);
        assert_eq!(result.first(), Some("들뜸"));
        assert_eq!(result.to_string(), "들뜸, 훼손");
        assert_eq!(Classification::default().first(), None);
    }

    #[test]
    fn test_load_from_file_keeps_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("taxonomy.toml");
        std::fs::write(
            &path,
            r#"
[[category]]
name = "타일"
synonyms = ["타일", "타일깨짐"]

[[category]]
name = "도배"
synonyms = ["도배", "벽지"]
"#,
        )
        .unwrap();

        let taxonomy = Taxonomy::load_from_file(&path).unwrap();
        let names: Vec<&str> = taxonomy.categories().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["타일", "도배"]);
        assert_eq!(taxonomy.classify("벽지 찢김", 0.8).joined(), "도배");
    }

    #[test]
    fn test_duplicate_category_rejected() {
        let category = Category { name: "결로".into(), synonyms: vec!["결로".into()] };
        assert!(Taxonomy::new(vec![category.clone(), category]).is_err());
    }
}
