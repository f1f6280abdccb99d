use std::path::PathBuf;
use std::process;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use beverage_metrics::config::GeneratorConfig;
use beverage_metrics::{run, OutputMode, PipelineConfig, RunOptions, RunReport, StageStatus};

#[derive(Parser)]
#[command(
    name = "bevmetrics",
    version,
    about = "Generate beverage sales data, build grouping-set reports in DuckDB and export them"
)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// DuckDB database file (overrides DATABASE_PATH)
    #[arg(long, global = true)]
    db: Option<String>,

    /// Export format
    #[arg(long, value_enum, global = true)]
    output: Option<OutputMode>,

    /// Folder receiving the exported files
    #[arg(long, global = true)]
    out_dir: Option<PathBuf>,

    /// Print the run report as JSON on stdout
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Generate base data, build every report table and export (default)
    Run {
        #[command(flatten)]
        generator: GeneratorArgs,

        /// Reuse the base tables already in the database
        #[arg(long)]
        skip_generate: bool,

        #[arg(long)]
        skip_export: bool,
    },
    /// Only (re)create and populate product, customer and sales
    Generate {
        #[command(flatten)]
        generator: GeneratorArgs,
    },
    /// Only rebuild the derived report tables
    Aggregate,
    /// Only export the tables
    Export,
}

#[derive(Args, Default)]
struct GeneratorArgs {
    #[arg(long)]
    products: Option<usize>,

    #[arg(long)]
    customers: Option<usize>,

    #[arg(long)]
    sales: Option<usize>,

    /// Seed for reproducible data
    #[arg(long)]
    seed: Option<u64>,
}

impl GeneratorArgs {
    fn apply(&self, config: &mut GeneratorConfig) {
        if let Some(n) = self.products {
            config.num_products = n;
        }
        if let Some(n) = self.customers {
            config.num_customers = n;
        }
        if let Some(n) = self.sales {
            config.num_sales = n;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match try_main() {
        Ok(code) => process::exit(code),
        Err(e) => {
            log::error!("{e:#}");
            process::exit(1);
        }
    }
}

fn try_main() -> anyhow::Result<i32> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    config.apply_env();
    if let Some(db) = cli.db {
        config.database_path = db;
    }
    if let Some(mode) = cli.output {
        config.export.mode = mode;
    }
    if let Some(dir) = cli.out_dir {
        config.export.folder = dir;
    }

    let command = cli.command.unwrap_or(Command::Run {
        generator: GeneratorArgs::default(),
        skip_generate: false,
        skip_export: false,
    });
    let options = match &command {
        Command::Run {
            generator,
            skip_generate,
            skip_export,
        } => {
            generator.apply(&mut config.generator);
            RunOptions {
                generate: !skip_generate,
                aggregate: true,
                export: !skip_export,
            }
        }
        Command::Generate { generator } => {
            generator.apply(&mut config.generator);
            RunOptions {
                generate: true,
                aggregate: false,
                export: false,
            }
        }
        Command::Aggregate => RunOptions {
            generate: false,
            aggregate: true,
            export: false,
        },
        Command::Export => RunOptions {
            generate: false,
            aggregate: false,
            export: true,
        },
    };
    config.validate()?;

    let report = run(&config, options)?;
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        log_summary(&report);
    }
    Ok(report.exit_code())
}

fn log_summary(report: &RunReport) {
    for stage in &report.stages {
        match &stage.status {
            StageStatus::Created { rows } => log::info!("{:<36} created ({rows} rows)", stage.table),
            StageStatus::Skipped { missing } => {
                log::warn!("{:<36} skipped (missing {})", stage.table, missing.join(", "))
            }
            StageStatus::Failed { error } => log::error!("{:<36} failed: {error}", stage.table),
        }
    }
    if report.exit_code() == 0 {
        log::info!("all tables created successfully");
    }
}
