use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rollcall_core::IdentityTable;
use rollcall_hw::Camera;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod config;
mod engine;

use config::Config;

#[derive(Parser)]
#[command(name = "rollcall", about = "Face-annotated attendance over a looping background video")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the capture loop (default)
    Run(RunArgs),
    /// List V4L2 capture devices
    Devices,
    /// Validate the roster and print it as JSON
    Roster {
        /// Roster file; defaults to ROLLCALL_ROSTER
        path: Option<PathBuf>,
    },
}

/// Overrides for the environment configuration.
#[derive(clap::Args, Default)]
struct RunArgs {
    /// Capture device index (/dev/video<N>)
    #[arg(short, long)]
    camera: Option<u32>,
    /// Background video file
    #[arg(short, long)]
    background: Option<String>,
    /// Trained LBPH model
    #[arg(long)]
    model: Option<String>,
    /// Haar cascade XML
    #[arg(long)]
    cascade: Option<String>,
    /// Roster TOML
    #[arg(long)]
    roster: Option<PathBuf>,
    /// Attendance directory
    #[arg(long)]
    attendance_dir: Option<PathBuf>,
    /// Largest accepted confidence distance
    #[arg(short, long)]
    threshold: Option<f64>,
}

impl RunArgs {
    fn apply(self, config: &mut Config) {
        if let Some(v) = self.camera {
            config.camera_index = v;
        }
        if let Some(v) = self.background {
            config.background_path = v;
        }
        if let Some(v) = self.model {
            config.model_path = v;
        }
        if let Some(v) = self.cascade {
            config.cascade_path = v;
        }
        if let Some(v) = self.roster {
            config.roster_path = v;
        }
        if let Some(v) = self.attendance_dir {
            config.attendance_dir = v;
        }
        if let Some(v) = self.threshold {
            config.confidence_threshold = v;
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env();

    match cli.command.unwrap_or_else(|| Commands::Run(RunArgs::default())) {
        Commands::Run(args) => {
            args.apply(&mut config);
            tracing::info!(?config, "rollcall starting");
            let session = engine::open_session(&config)?;
            let summary = session.run().context("capture loop failed")?;
            tracing::info!(
                ticks = summary.ticks,
                skipped = summary.skipped,
                captures = summary.captures,
                rejected = summary.rejected_captures,
                "rollcall stopped"
            );
        }
        Commands::Devices => {
            let devices = Camera::list_devices();
            if devices.is_empty() {
                println!("No V4L2 capture devices found");
            }
            for d in devices {
                println!("{}  {} ({}, {})", d.path, d.name, d.driver, d.bus);
            }
        }
        Commands::Roster { path } => {
            let path = path.unwrap_or(config.roster_path);
            let table = IdentityTable::load(&path)?;
            let entries: Vec<serde_json::Value> = table
                .iter()
                .map(|(index, identity)| {
                    serde_json::json!({
                        "index": index,
                        "name": identity.name,
                        "class": identity.class,
                        "branch": identity.branch,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
    }

    Ok(())
}
