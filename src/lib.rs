// Public module exports for the binary and integration tests
pub mod cli;
pub mod config;
pub mod error;
pub mod fields;
pub mod location;
pub mod logging;
pub mod ocr;
pub mod package;
pub mod pipeline;
pub mod record;
pub mod router;
pub mod similarity;
pub mod spreadsheet;
pub mod taxonomy;

pub use config::HopeConfig;
pub use error::{HopeError, HopeResult};
pub use fields::{Label, RawFields};
pub use location::{extract_dong_ho, DongHo};
pub use ocr::OcrEngine;
pub use record::{build_record, NormalizedRecord};
pub use taxonomy::{Classification, Taxonomy};
