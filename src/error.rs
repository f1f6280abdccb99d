use thiserror::Error;

/// Errors raised by the store, the pipeline stages and the exporter.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("database error: {0}")]
    Database(#[from] duckdb::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to parse config file: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("workbook error: {0}")]
    Workbook(#[from] rust_xlsxwriter::XlsxError),

    #[error("missing table(s): {}", .0.join(", "))]
    MissingTables(Vec<String>),

    #[error("invalid output mode: {0} (expected 'excel' or 'csv')")]
    InvalidOutputMode(String),

    #[error("stage plan error: {0}")]
    Plan(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
