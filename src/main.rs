//! Tilegrab - interactive pointer move/resize for tiling window managers
//!
//! Drives one drag session at a time, either against a live X server or
//! headless from a recorded scene.
//!
//! # Features
//! - Edge snapping against the usable screen area
//! - Master split adjustment for tile, tile-left, tile-top and tile-bottom
//! - Scoped pointer grabs with move/resize cursors
//! - Configure, expose and map requests served while a drag is running
//! - TOML configuration with per-screen snap, padding and status bar
//! - JSON scene replay for testing drag behaviour without a display

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use tilegrab_core::config::Config;
use tilegrab_core::DragOperation;

mod replay;

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Backend {
    /// Replay a JSON scene against a scripted display
    Headless,
    /// Drag a real window on the X server from $DISPLAY
    X11,
}

fn parse_xid(s: &str) -> Result<u32, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid window id {s:?}: {e}"))
}

/// Tilegrab - pointer move/resize controller
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run in debug mode with verbose logging
    #[arg(short, long)]
    debug: bool,

    /// Validate configuration and exit
    #[arg(long)]
    validate: bool,

    /// Print default configuration to stdout
    #[arg(long)]
    print_default_config: bool,

    /// Backend to drive the drag with
    #[arg(long, value_enum, default_value_t = Backend::Headless)]
    backend: Backend,

    /// Scene to replay (headless backend)
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Window to drag (x11 backend), decimal or 0x-prefixed hex
    #[arg(long, value_parser = parse_xid)]
    window: Option<u32>,

    /// Drag to run on the window (x11 backend)
    #[arg(long, default_value = "move")]
    operation: DragOperation,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging; RUST_LOG overrides the default level
    let default_level = if args.debug {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .compact()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Tilegrab v{} starting...", env!("CARGO_PKG_VERSION"));

    // Handle special commands
    if args.print_default_config {
        println!("{}", Config::default_config_string());
        return Ok(());
    }

    // Load configuration
    let config = match Config::load(args.config.as_deref()) {
        Ok(cfg) => {
            info!("Configuration loaded successfully");
            cfg
        },
        Err(e) => {
            if args.validate {
                return Err(e);
            }
            warn!("Failed to load config: {:#}, using defaults", e);
            Config::default()
        },
    };

    if args.validate {
        config.validate().context("Configuration is invalid")?;
        info!("Configuration is valid");
        return Ok(());
    }

    match args.backend {
        Backend::Headless => {
            let path = args
                .replay
                .context("The headless backend needs a scene (--replay FILE)")?;
            let report = replay::run(&config, &path)
                .with_context(|| format!("Failed to replay {}", path.display()))?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        },
        Backend::X11 => {
            #[cfg(feature = "x11")]
            {
                let window = args
                    .window
                    .context("The x11 backend needs a window (--window XID)")?;
                info!("Using native X11 backend");
                let outcome =
                    tilegrab_backend_x11::run_single_drag(&config, window, args.operation)?;
                println!("{}", serde_json::to_string_pretty(&outcome)?);
                Ok(())
            }
            #[cfg(not(feature = "x11"))]
            {
                anyhow::bail!("X11 feature not compiled in. Rebuild with --features x11");
            }
        },
    }
}
