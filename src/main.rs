use std::path::PathBuf;
use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{error, info};

use hopezip::cli;
use hopezip::config::HopeConfig;
use hopezip::error::HopeError;
use hopezip::logging::{init_logging, LoggingConfig};

#[derive(Parser)]
#[command(name = "hopezip")]
#[command(about = "Hansoldeco OCR Project Extraction ZIP: read defect report photos, classify, file and bundle them")]
#[command(version)]
struct Cli {
    /// TOML config file (defaults plus HOPEZIP_* environment overrides when omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level: error, warn, info, debug, trace
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Also write daily log files to this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// OCR every image in a folder and write the results spreadsheet
    Process {
        folder: PathBuf,

        /// Concurrent OCR requests (overrides config)
        #[arg(short, long)]
        workers: Option<usize>,
    },

    /// Move images into category folders using the results spreadsheet
    Route {
        folder: PathBuf,

        /// Spreadsheet to read (defaults to the one inside the folder)
        #[arg(short, long)]
        spreadsheet: Option<PathBuf>,
    },

    /// Zip the spreadsheet and category folders
    Package {
        folder: PathBuf,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Process, route and package in one go
    Run {
        folder: PathBuf,

        #[arg(short, long)]
        workers: Option<usize>,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Classify a defect description and print the matched categories
    Classify {
        #[arg(required = true)]
        text: Vec<String>,
    },

    /// Write the default configuration to a TOML file
    InitConfig { path: PathBuf },
}

fn load_config(cli: &Cli, workers: Option<usize>) -> Result<HopeConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let mut config = HopeConfig::load_from_file(path)?;
            config.apply_env_overrides();
            config
        }
        None => HopeConfig::load_from_env(),
    };
    if let Some(workers) = workers {
        config.processing.parallel_workers = workers;
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let logging = LoggingConfig {
        level: cli.log_level.clone(),
        log_dir: cli.log_dir.clone(),
    };
    let _guard = init_logging(&logging)?;
    info!("HOPEZIP v{}", env!("CARGO_PKG_VERSION"));

    let workers = match &cli.command {
        Commands::Process { workers, .. } | Commands::Run { workers, .. } => *workers,
        _ => None,
    };
    let config = load_config(&cli, workers)?;

    let result = match cli.command {
        Commands::Process { folder, .. } => cli::process_command(folder, &config).await,
        Commands::Route { folder, spreadsheet } => cli::route_command(folder, spreadsheet, &config),
        Commands::Package { folder, output } => cli::package_command(folder, output, &config).map(|_| ()),
        Commands::Run { folder, output, .. } => cli::run_command(folder, output, &config).await,
        Commands::Classify { text } => cli::classify_command(&text.join(" "), &config),
        Commands::InitConfig { path } => cli::init_config_command(path),
    };

    if let Err(e) = &result {
        error!("{:#}", e);
        if let Some(hope) = e.downcast_ref::<HopeError>() {
            eprintln!("{}", hope.user_message());
        }
    }
    result
}
