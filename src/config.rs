use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Environment variable overriding [`PipelineConfig::database_path`].
pub const DATABASE_PATH_ENV: &str = "DATABASE_PATH";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// One workbook, one sheet per table
    #[default]
    Excel,
    /// One CSV file per table
    Csv,
}

impl FromStr for OutputMode {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "excel" | "xlsx" => Ok(OutputMode::Excel),
            "csv" => Ok(OutputMode::Csv),
            _ => Err(PipelineError::InvalidOutputMode(s.to_string())),
        }
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputMode::Excel => write!(f, "excel"),
            OutputMode::Csv => write!(f, "csv"),
        }
    }
}

/// Row counts and seed for the synthetic base data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub num_products: usize,
    pub num_customers: usize,
    pub num_sales: usize,
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            num_products: 30,
            num_customers: 20,
            num_sales: 50,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub mode: OutputMode,
    pub folder: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            mode: OutputMode::Excel,
            folder: PathBuf::from("data"),
        }
    }
}

/// Top-level configuration, read from an optional TOML file.
///
/// Precedence: defaults, then the file, then `DATABASE_PATH`, then CLI flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub database_path: String,
    /// DuckDB worker threads.
    pub threads: i64,
    pub generator: GeneratorConfig,
    pub export: ExportConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            database_path: "beverage_analysis.db".to_string(),
            threads: 1,
            generator: GeneratorConfig::default(),
            export: ExportConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: PipelineConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| env::var(key).ok());
    }

    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(DATABASE_PATH_ENV).filter(|p| !p.is_empty()) {
            self.database_path = path;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.database_path.trim().is_empty() {
            return Err(PipelineError::Config("database_path must not be empty".into()));
        }
        if self.threads < 1 {
            return Err(PipelineError::Config(format!(
                "threads must be at least 1, got {}",
                self.threads
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.database_path, "beverage_analysis.db");
        assert_eq!(config.export.mode, OutputMode::Excel);
        assert_eq!(config.export.folder, PathBuf::from("data"));
        assert_eq!(config.generator.num_sales, 50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml() {
        let config = PipelineConfig::from_toml_str(
            r#"
            database_path = "test.db"

            [generator]
            num_sales = 10
            seed = 42

            [export]
            mode = "csv"
            "#,
        )
        .unwrap();
        assert_eq!(config.database_path, "test.db");
        assert_eq!(config.generator.num_sales, 10);
        assert_eq!(config.generator.num_products, 30);
        assert_eq!(config.generator.seed, Some(42));
        assert_eq!(config.export.mode, OutputMode::Csv);
        assert_eq!(config.export.folder, PathBuf::from("data"));
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(
            PipelineConfig::from_toml_str("threads = 0"),
            Err(PipelineError::Config(_))
        ));
        assert!(matches!(
            PipelineConfig::from_toml_str("[export]\nmode = \"pdf\""),
            Err(PipelineError::ConfigParse(_))
        ));
    }

    #[test]
    fn test_env_override() {
        let mut config = PipelineConfig::default();
        config.apply_env_from(|key| (key == DATABASE_PATH_ENV).then(|| "/tmp/x.db".to_string()));
        assert_eq!(config.database_path, "/tmp/x.db");

        let mut config = PipelineConfig::default();
        config.apply_env_from(|_| Some(String::new()));
        assert_eq!(config.database_path, "beverage_analysis.db");
    }

    #[test]
    fn test_output_mode_parse() {
        assert_eq!("EXCEL".parse::<OutputMode>().unwrap(), OutputMode::Excel);
        assert_eq!("csv".parse::<OutputMode>().unwrap(), OutputMode::Csv);
        assert!("pdf".parse::<OutputMode>().is_err());
    }
}
