use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use mecanum_drive_runtime::config::RuntimeConfig;

/// Heading-hold mecanum drive runtime
#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    /// JSON file with loop timing (missing fields keep their defaults)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Control loop rate in Hz
    #[arg(long)]
    loop_hz: Option<u64>,

    /// Stop the robot when no command arrives for this long
    #[arg(long)]
    cmd_timeout_ms: Option<u64>,

    /// Refuse closed-loop modes when the heading is older than this
    #[arg(long)]
    heading_timeout_ms: Option<u64>,
}

impl Args {
    fn runtime_config(&self) -> Result<RuntimeConfig, mecanum_drive_runtime::error::RuntimeError> {
        let mut config = match &self.config {
            Some(path) => RuntimeConfig::load(path)?,
            None => RuntimeConfig::default(),
        };
        if let Some(hz) = self.loop_hz {
            config.loop_hz = hz;
        }
        if let Some(ms) = self.cmd_timeout_ms {
            config.cmd_timeout_ms = ms;
        }
        if let Some(ms) = self.heading_timeout_ms {
            config.heading_timeout_ms = ms;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() {
    // Setup logging (set RUST_LOG=info or debug)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init(); // installs the subscriber globally

    let args = Args::parse();
    let config = match args.runtime_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Config error: {}", e);
            std::process::exit(2);
        }
    };

    if let Err(e) = mecanum_drive_runtime::runtime::run(config).await {
        eprintln!("Runtime error: {}", e);
        std::process::exit(1);
    }
}
