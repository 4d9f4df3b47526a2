use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use anyhow::{anyhow, Result};

use crate::error::{HopeError, HopeResult};

/// Similarity ratio a token must exceed to count as a fuzzy synonym match
pub const DEFAULT_FUZZY_THRESHOLD: f64 = 0.8;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HopeConfig {
    pub ocr: OcrConfig,
    pub processing: ProcessingConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    /// Base URL of the OCR service
    pub endpoint: String,

    pub model: String,

    /// Environment variable holding the API key
    pub api_key_env: String,

    /// Total attempts when the service answers 429
    pub max_attempts: u32,

    /// Linear backoff step in seconds (attempt n waits n * backoff)
    pub backoff_secs: u64,

    /// Pause after each successful request
    pub request_delay_ms: u64,

    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingConfig {
    /// Number of concurrent OCR workers
    pub parallel_workers: usize,

    pub fuzzy_threshold: f64,

    /// Lower-case extensions accepted as input images
    pub image_extensions: Vec<String>,

    /// Optional TOML file replacing the built-in defect taxonomy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taxonomy_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub spreadsheet_name: String,
    pub unidentified_folder: String,
    pub archive_name: String,
}

impl Default for HopeConfig {
    fn default() -> Self {
        Self {
            ocr: OcrConfig {
                endpoint: "https://api.mistral.ai".to_string(),
                model: "mistral-ocr-latest".to_string(),
                api_key_env: "MISTRAL_API_KEY".to_string(),
                max_attempts: 3,
                backoff_secs: 2,
                request_delay_ms: 1200,
                timeout_secs: 120,
            },
            processing: ProcessingConfig {
                parallel_workers: 1,
                fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
                image_extensions: ["jpg", "jpeg", "png", "bmp", "tif"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
                taxonomy_path: None,
            },
            output: OutputConfig {
                spreadsheet_name: "results_mistral_ocr.xlsx".to_string(),
                unidentified_folder: "unidentified".to_string(),
                archive_name: "classified_files_with_excel.zip".to_string(),
            },
        }
    }
}

impl OcrConfig {
    pub fn backoff(&self) -> Duration {
        Duration::from_secs(self.backoff_secs)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    /// Read the API key from the configured environment variable
    pub fn api_key(&self) -> HopeResult<String> {
        match std::env::var(&self.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(HopeError::configuration(format!(
                "{} environment variable is not set",
                self.api_key_env
            ))),
        }
    }
}

impl HopeConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| anyhow!("Failed to read config file: {}", e))?;

        let config: HopeConfig = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file: {}", e))?;

        Ok(config)
    }

    pub fn load_from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    /// Override with environment variables
    pub fn apply_env_overrides(&mut self) {
        if let Ok(workers) = std::env::var("HOPEZIP_WORKERS") {
            if let Ok(value) = workers.parse::<usize>() {
                self.processing.parallel_workers = value;
            }
        }

        if let Ok(threshold) = std::env::var("HOPEZIP_FUZZY_THRESHOLD") {
            if let Ok(value) = threshold.parse::<f64>() {
                self.processing.fuzzy_threshold = value;
            }
        }

        if let Ok(endpoint) = std::env::var("HOPEZIP_OCR_ENDPOINT") {
            self.ocr.endpoint = endpoint;
        }
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| anyhow!("Failed to serialize config: {}", e))?;

        std::fs::write(path.as_ref(), content)
            .map_err(|e| anyhow!("Failed to write config file: {}", e))?;

        Ok(())
    }

    pub fn validate(&self) -> HopeResult<()> {
        if self.processing.parallel_workers == 0 {
            return Err(HopeError::configuration("parallel_workers must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.processing.fuzzy_threshold) {
            return Err(HopeError::configuration(format!(
                "fuzzy_threshold must be within [0, 1], got {}",
                self.processing.fuzzy_threshold
            )));
        }
        if self.ocr.max_attempts == 0 {
            return Err(HopeError::configuration("max_attempts must be at least 1"));
        }
        if self.output.unidentified_folder.trim().is_empty() {
            return Err(HopeError::configuration("unidentified_folder must not be empty"));
        }
        Ok(())
    }

    /// True when `path` has one of the configured image extensions
    pub fn is_image(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| {
                let ext = ext.to_lowercase();
                self.processing.image_extensions.iter().any(|allowed| *allowed == ext)
            })
            .unwrap_or(false)
    }
}
