//! Terraload CLI - Command-line interface
//!
//! Drives the request scheduler and the tile pipeline outside of a renderer:
//! derive server keys, fetch URLs through the scheduler, or run a synthetic
//! tile-loading session and report what it did.

mod commands;
mod error;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use terraload::logging::{default_log_dir, default_log_file, init_logging};

use commands::fetch::FetchArgs;
use commands::simulate::SimulateArgs;
use error::CliError;

#[derive(Parser)]
#[command(name = "terraload")]
#[command(version, about = "Request scheduling and tile loading for streamed globes", long_about = None)]
struct Cli {
    /// Config file to use instead of ~/.terraload/config.ini
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the effective configuration and where it was loaded from
    Config,

    /// Print the host:port key a URL is throttled under
    ServerKey {
        /// URL to classify (relative URLs resolve against the base URL)
        url: String,

        /// Base URL for relative input (defaults to scheduler.base_url)
        #[arg(long)]
        base_url: Option<String>,
    },

    /// Fetch URLs over HTTP through the request scheduler
    Fetch {
        /// URLs to fetch
        #[arg(required = true)]
        urls: Vec<String>,

        /// Override scheduler.max_requests
        #[arg(long)]
        max_requests: Option<usize>,

        /// Override scheduler.max_requests_per_server
        #[arg(long)]
        max_requests_per_server: Option<usize>,

        /// Give up on outstanding requests after this many seconds
        #[arg(long, default_value = "30")]
        timeout: u64,
    },

    /// Run a synthetic tile-loading session
    Simulate {
        /// Number of frames to run
        #[arg(long, default_value = "60")]
        ticks: usize,

        /// Deepest level the camera refines to
        #[arg(long, default_value = "6")]
        levels: u32,

        /// Deepest level with real terrain data; deeper tiles are upsampled
        #[arg(long, default_value = "3")]
        data_levels: u32,

        /// Frames a synthetic request takes to arrive
        #[arg(long, default_value = "2")]
        latency: u32,

        /// Camera latitude in degrees
        #[arg(long, default_value = "10.0", allow_hyphen_values = true)]
        latitude: f64,

        /// Degrees of longitude the camera moves per frame
        #[arg(long, default_value = "6.0", allow_hyphen_values = true)]
        speed: f64,

        /// Override tiles.tile_cache_size
        #[arg(long)]
        tile_cache_size: Option<usize>,
    },
}

fn main() {
    let cli = Cli::parse();

    let _logging_guard = match init_logging(default_log_dir(), default_log_file()) {
        Ok(guard) => guard,
        Err(e) => CliError::LoggingInit(e).exit(),
    };

    let config = match commands::common::load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => e.exit(),
    };

    let result = match cli.command {
        Commands::Config => commands::config::run(cli.config.as_deref(), &config),
        Commands::ServerKey { url, base_url } => {
            commands::server_key::run(&url, base_url.as_deref(), &config)
        }
        Commands::Fetch {
            urls,
            max_requests,
            max_requests_per_server,
            timeout,
        } => commands::fetch::run(
            FetchArgs {
                urls,
                max_requests,
                max_requests_per_server,
                timeout_secs: timeout,
            },
            &config,
        ),
        Commands::Simulate {
            ticks,
            levels,
            data_levels,
            latency,
            latitude,
            speed,
            tile_cache_size,
        } => commands::simulate::run(
            SimulateArgs {
                ticks,
                levels,
                data_levels,
                latency,
                latitude,
                speed,
                tile_cache_size,
            },
            &config,
        ),
    };

    if let Err(e) = result {
        e.exit();
    }
}
