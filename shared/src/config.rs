use std::path::PathBuf;
use std::time::Duration;

use corrode_atoms::artifact::Workspace;
use corrode_atoms::inference::YoloParams;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{key}={value:?} is not a valid {expected}")]
    Invalid {
        key: &'static str,
        value: String,
        expected: &'static str,
    },
}

/// Process settings, read once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// DynamoDB table. `None` selects the in-memory store.
    pub table_name: Option<String>,
    pub bucket_name: String,
    pub dynamodb_endpoint_url: Option<String>,
    pub model_path: PathBuf,
    pub upload_folder: PathBuf,
    pub processed_folder: PathBuf,
    pub max_content_length: usize,
    pub remote_timeout: Duration,
    pub inference_timeout: Duration,
    pub confidence: f32,
    pub iou_threshold: f32,
    /// Seed the in-memory store with sample history.
    pub mock_samples: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            table_name: None,
            bucket_name: "corrosion-images".to_string(),
            dynamodb_endpoint_url: None,
            model_path: PathBuf::from("best.onnx"),
            upload_folder: PathBuf::from("/tmp/uploads"),
            processed_folder: PathBuf::from("/tmp/processed"),
            max_content_length: 16 * 1024 * 1024,
            remote_timeout: Duration::from_millis(5_000),
            inference_timeout: Duration::from_millis(30_000),
            confidence: 0.25,
            iou_threshold: 0.45,
            mock_samples: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        Ok(Self {
            table_name: get("TABLE_NAME"),
            bucket_name: get("S3_BUCKET_NAME").unwrap_or(defaults.bucket_name),
            dynamodb_endpoint_url: get("DYNAMODB_ENDPOINT_URL"),
            model_path: get("MODEL_PATH").map(PathBuf::from).unwrap_or(defaults.model_path),
            upload_folder: get("UPLOAD_FOLDER").map(PathBuf::from).unwrap_or(defaults.upload_folder),
            processed_folder: get("PROCESSED_FOLDER")
                .map(PathBuf::from)
                .unwrap_or(defaults.processed_folder),
            max_content_length: parse(get("MAX_CONTENT_LENGTH"), "MAX_CONTENT_LENGTH", "byte count")?
                .unwrap_or(defaults.max_content_length),
            remote_timeout: parse(get("REMOTE_TIMEOUT_MS"), "REMOTE_TIMEOUT_MS", "millisecond count")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.remote_timeout),
            inference_timeout: parse(get("INFERENCE_TIMEOUT_MS"), "INFERENCE_TIMEOUT_MS", "millisecond count")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.inference_timeout),
            confidence: parse_unit(get("CONFIDENCE"), "CONFIDENCE")?.unwrap_or(defaults.confidence),
            iou_threshold: parse_unit(get("IOU_THRESHOLD"), "IOU_THRESHOLD")?.unwrap_or(defaults.iou_threshold),
            mock_samples: parse_flag(get("MOCK_SAMPLES"), "MOCK_SAMPLES")?.unwrap_or(defaults.mock_samples),
        })
    }

    pub fn workspace(&self) -> Workspace {
        Workspace {
            upload_dir: self.upload_folder.clone(),
            processed_dir: self.processed_folder.clone(),
            max_upload_bytes: self.max_content_length,
        }
    }

    pub fn yolo_params(&self) -> YoloParams {
        YoloParams {
            conf_threshold: self.confidence,
            iou_threshold: self.iou_threshold,
            ..YoloParams::default()
        }
    }
}

fn parse<T: std::str::FromStr>(
    value: Option<String>,
    key: &'static str,
    expected: &'static str,
) -> Result<Option<T>, ConfigError> {
    value
        .map(|v| v.parse::<T>().map_err(|_| ConfigError::Invalid { key, value: v, expected }))
        .transpose()
}

/// A threshold in `[0, 1]`.
fn parse_unit(value: Option<String>, key: &'static str) -> Result<Option<f32>, ConfigError> {
    const EXPECTED: &str = "number between 0 and 1";
    match parse::<f32>(value, key, EXPECTED)? {
        Some(v) if !(0.0..=1.0).contains(&v) => Err(ConfigError::Invalid {
            key,
            value: v.to_string(),
            expected: EXPECTED,
        }),
        other => Ok(other),
    }
}

fn parse_flag(value: Option<String>, key: &'static str) -> Result<Option<bool>, ConfigError> {
    value
        .map(|v| match v.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::Invalid { key, value: v, expected: "boolean" }),
        })
        .transpose()
}
