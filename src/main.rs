use clap::Parser;
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};
use std::fs::File;
use std::path::PathBuf;
use waypoint::core::config::{self, CliOverrides, WaypointConfig};

#[derive(Parser)]
#[command(name = "waypoint", about = "Browse markdown pages through a fragment-persisted state router")]
struct Args {
    /// Directory of `<page>.md` files
    #[arg(long)]
    pages: Option<PathBuf>,

    /// File holding the persisted fragment
    #[arg(long)]
    fragment_file: Option<PathBuf>,

    /// Config file (default: ~/.waypoint/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    // Config errors fall back to defaults; the logger isn't up yet, so say so on stderr.
    let loaded = match &args.config {
        Some(path) => config::load_config_from(path),
        None => config::load_config(),
    };
    let file_config = loaded.unwrap_or_else(|e| {
        eprintln!("waypoint: {e}; using defaults");
        WaypointConfig::default()
    });

    let resolved = config::resolve(
        &file_config,
        &CliOverrides {
            pages_dir: args.pages,
            fragment_file: args.fragment_file,
            log_level: args.log_level,
        },
    );

    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();
    let level = resolved.log_level.parse().unwrap_or(LevelFilter::Debug);
    if let Some(parent) = resolved.log_file.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    if let Ok(log_file) = File::create(&resolved.log_file) {
        let _ = WriteLogger::init(level, log_config, log_file);
    }

    log::info!("Waypoint starting up with config: {:?}", resolved);

    waypoint::tui::run(resolved)
}
