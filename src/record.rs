use serde::Serialize;
use tracing::debug;

use crate::error::HopeResult;
use crate::fields::{Label, RawFields};
use crate::location::extract_dong_ho;
use crate::log_skipped;
use crate::taxonomy::{Classification, Taxonomy};

/// One processed report image
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedRecord {
    pub filename: String,
    pub fields: RawFields,
    /// 동 number: digits or empty
    pub building: String,
    /// 호 number: digits or empty
    pub unit: String,
    pub classification: Classification,
}

impl NormalizedRecord {
    pub fn field(&self, label: Label) -> &str {
        self.fields.value(label)
    }

    pub fn building_number(&self) -> Option<i64> {
        self.building.parse().ok()
    }

    pub fn unit_number(&self) -> Option<i64> {
        self.unit.parse().ok()
    }

    /// First matched category, used for the hyperlink and the target folder
    pub fn link_target(&self) -> Option<&str> {
        self.classification.first()
    }
}

/// Build a record from one image's OCR outcome.
///
/// An OCR failure is logged and yields `None`; the caller leaves the image
/// out of the results entirely.
pub fn build_record(
    filename: &str,
    ocr_text: HopeResult<String>,
    taxonomy: &Taxonomy,
    threshold: f64,
) -> Option<NormalizedRecord> {
    let text = match ocr_text {
        Ok(text) => text,
        Err(e) => {
            log_skipped!(e, filename);
            return None;
        }
    };

    let fields = RawFields::parse(&text).with_defaults();
    let dong_ho = extract_dong_ho(fields.value(Label::UnitCode));
    let classification = taxonomy.classify(fields.value(Label::DefectType), threshold);

    debug!(
        file = %filename,
        building = %dong_ho.building,
        unit = %dong_ho.unit,
        category = %classification,
        "Record built"
    );

    Some(NormalizedRecord {
        filename: filename.to_string(),
        fields,
        building: dong_ho.building,
        unit: dong_ho.unit,
        classification,
    })
}
