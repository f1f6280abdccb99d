use serde::Serialize;

use crate::config::PipelineConfig;
use crate::engine::{MetricsStore, StoreMode};
use crate::error::Result;
use crate::export::{export_tables, ExportSummary};
use crate::generator::validate::SchemaValidator;
use crate::generator::{populate, GenerationSummary};
use crate::pipeline::{run_all, StageReport};

/// Which phases of a run to execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    pub generate: bool,
    pub aggregate: bool,
    pub export: bool,
}

impl RunOptions {
    pub const FULL: RunOptions = RunOptions {
        generate: true,
        aggregate: true,
        export: true,
    };
}

impl Default for RunOptions {
    fn default() -> Self {
        Self::FULL
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation: Option<GenerationSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_error: Option<String>,
    pub stages: Vec<StageReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export: Option<ExportSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export_error: Option<String>,
}

impl RunReport {
    /// 0 when everything ran, 2 when a stage skipped for missing inputs,
    /// 1 when generation, a stage or the export failed.
    pub fn exit_code(&self) -> i32 {
        if self.generation_error.is_some()
            || self.export_error.is_some()
            || self.stages.iter().any(|s| s.is_failed())
        {
            1
        } else if self.stages.iter().any(|s| s.is_skipped()) {
            2
        } else {
            0
        }
    }
}

/// Generation, the aggregation stages and export, in that order.
///
/// Generation and stages share one read-write handle, which is dropped
/// before the exporter reopens the file read-only. Failures in generation
/// and export are recorded in the report rather than returned; only failing
/// to open the store is an error.
pub fn run(config: &PipelineConfig, options: RunOptions) -> Result<RunReport> {
    let mut report = RunReport::default();

    if options.generate || options.aggregate {
        let mut store = MetricsStore::open(&config.database_path, StoreMode::ReadWrite, config.threads)?;

        if options.generate {
            match populate(&store, &config.generator, &SchemaValidator) {
                Ok(summary) => report.generation = Some(summary),
                Err(e) => {
                    log::error!("failed to populate base tables: {e}");
                    report.generation_error = Some(e.to_string());
                }
            }
        }

        if options.aggregate {
            report.stages = run_all(&mut store)?;
        }
    }

    if options.export {
        let exported = MetricsStore::open(&config.database_path, StoreMode::ReadOnly, config.threads)
            .and_then(|store| export_tables(&store, config.export.mode, &config.export.folder));
        match exported {
            Ok(summary) => report.export = Some(summary),
            Err(e) => {
                log::error!("failed to export tables from '{}': {e}", config.database_path);
                report.export_error = Some(e.to_string());
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{Stage, StageStatus};

    #[test]
    fn test_exit_codes() {
        let mut report = RunReport::default();
        assert_eq!(report.exit_code(), 0);

        report.stages.push(StageReport {
            status: StageStatus::Skipped {
                missing: vec!["sales".into()],
            },
            ..StageReport::created(Stage::SupplierMetrics, 0)
        });
        assert_eq!(report.exit_code(), 2);

        report.export_error = Some("disk full".into());
        assert_eq!(report.exit_code(), 1);
    }

    #[test]
    fn test_export_of_missing_database_is_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig {
            database_path: dir.path().join("absent.db").to_string_lossy().into_owned(),
            ..PipelineConfig::default()
        };
        let options = RunOptions {
            generate: false,
            aggregate: false,
            export: true,
        };
        let report = run(&config, options).unwrap();
        assert!(report.export_error.is_some());
        assert_eq!(report.exit_code(), 1);
    }
}
