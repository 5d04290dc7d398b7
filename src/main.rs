// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand, ValueEnum};
use std::sync::Arc;
use vision_camera::backends::camera::Facing;
use vision_camera::config::Config;
use vision_camera::gallery::MemoryGallery;
use vision_camera::storage::DirectoryGallery;

mod cli;

#[derive(Parser)]
#[command(name = "vision-camera")]
#[command(about = "Camera with live face, object, text and QR recognition")]
#[command(version = env!("GIT_VERSION"))]
#[command(subcommand_required = false)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FacingArg {
    Front,
    Back,
}

impl From<FacingArg> for Facing {
    fn from(arg: FacingArg) -> Self {
        match arg {
            FacingArg::Front => Facing::Front,
            FacingArg::Back => Facing::Back,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run in the terminal (default)
    Terminal {
        /// Keep captures in memory instead of saving them
        #[arg(long)]
        no_save: bool,
    },

    /// Show which camera would be used and what it supports
    Probe {
        #[arg(short, long, value_enum, default_value = "front")]
        facing: FacingArg,
    },

    /// Take a photo
    Photo {
        #[arg(short, long, value_enum, default_value = "front")]
        facing: FacingArg,
    },

    /// Record a video
    Record {
        #[arg(short, long, value_enum, default_value = "front")]
        facing: FacingArg,

        /// Recording duration in seconds
        #[arg(short, long, default_value = "10")]
        duration: u64,
    },

    /// Scan for QR codes
    Scan {
        #[arg(short, long, value_enum, default_value = "back")]
        facing: FacingArg,

        /// Scan duration in seconds
        #[arg(short, long, default_value = "30")]
        duration: u64,
    },

    /// Ask the chat assistant
    Ask {
        prompt: Vec<String>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Set RUST_LOG to control the log level, e.g. RUST_LOG=vision_camera=debug
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let config = Config::load();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        match cli.command {
            None => vision_camera::terminal::run(config, Arc::new(DirectoryGallery::in_user_dirs())).await,
            Some(Commands::Terminal { no_save }) => {
                if no_save {
                    vision_camera::terminal::run(config, Arc::new(MemoryGallery::new())).await
                } else {
                    vision_camera::terminal::run(config, Arc::new(DirectoryGallery::in_user_dirs()))
                        .await
                }
            }
            Some(Commands::Probe { facing }) => cli::probe(config, facing.into()).await,
            Some(Commands::Photo { facing }) => cli::take_photo(config, facing.into()).await,
            Some(Commands::Record { facing, duration }) => {
                cli::record_video(config, facing.into(), duration).await
            }
            Some(Commands::Scan { facing, duration }) => {
                cli::scan(config, facing.into(), duration).await
            }
            Some(Commands::Ask { prompt }) => cli::ask(config, prompt.join(" ")).await,
        }
    })
}
