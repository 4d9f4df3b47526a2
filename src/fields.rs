use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Field names printed on the defect report form
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Label {
    SiteName,
    WorkType,
    UnitCode,
    Location,
    DefectType,
    Date,
    Dimension,
    Remarks,
    Status,
}

impl Label {
    pub const ALL: [Label; 9] = [
        Label::SiteName,
        Label::WorkType,
        Label::UnitCode,
        Label::Location,
        Label::DefectType,
        Label::Date,
        Label::Dimension,
        Label::Remarks,
        Label::Status,
    ];

    /// Text of the label as it appears on the form
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::SiteName => "현장명",
            Label::WorkType => "공종",
            Label::UnitCode => "동호수",
            Label::Location => "위치",
            Label::DefectType => "하자유형",
            Label::Date => "일자",
            Label::Dimension => "치수",
            Label::Remarks => "비고",
            Label::Status => "현황",
        }
    }

    pub fn from_key(key: &str) -> Option<Label> {
        Label::ALL.iter().copied().find(|label| label.as_str() == key)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Label values recovered from one OCR text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawFields {
    values: BTreeMap<Label, String>,
}

impl RawFields {
    /// Parse `label: value` lines.
    ///
    /// Splits at the first `:`. Unknown keys and lines without a separator
    /// are ignored; a repeated label keeps the last value.
    pub fn parse(text: &str) -> Self {
        let mut values = BTreeMap::new();
        for line in text.lines() {
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            if let Some(label) = Label::from_key(key.trim()) {
                values.insert(label, value.trim().to_string());
            }
        }
        Self { values }
    }

    /// Fill every absent label with an empty string
    pub fn with_defaults(mut self) -> Self {
        for label in Label::ALL {
            self.values.entry(label).or_default();
        }
        self
    }

    pub fn get(&self, label: Label) -> Option<&str> {
        self.values.get(&label).map(String::as_str)
    }

    /// Value of `label`, or "" when absent
    pub fn value(&self, label: Label) -> &str {
        self.get(label).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
