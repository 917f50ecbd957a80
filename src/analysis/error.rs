use thiserror::Error;
use crate::analysis::judgment::JudgmentField;
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("row {row}, column `{column}`: cannot parse `{value}` as an integer sample")]
    MalformedSample {
        row: usize,
        column: String,
        value: String,
    },
    #[error("sample table has no `{0}` column")]
    MissingColumn(String),
    #[error("sample table row {row} has {actual} cells, header has {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },
    #[error("waveform has {len} samples; at least {required} are needed for detection")]
    InsufficientData { len: usize, required: usize },
    #[error("no measurement available for {0}")]
    MissingMeasurement(JudgmentField),
    #[error("{field}: minimum {min} exceeds maximum {max}")]
    InvalidConfig {
        field: JudgmentField,
        min: f64,
        max: f64,
    },
    #[error("config store I/O failed: {0}")]
    ConfigIo(#[from] std::io::Error),
    #[error("config is not valid JSON: {0}")]
    ConfigFormat(#[from] serde_json::Error),
    #[error("failed to shape channel matrix: {0}")]
    Shape(#[from] ndarray::ShapeError),
}
