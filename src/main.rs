//! LensCast - MJPEG camera streaming server
//!
//! Serves a live camera feed to any number of HTTP viewers as a
//! multipart/x-mixed-replace stream, with a JSON health endpoint.

use anyhow::Result;
use clap::Parser;
use lenscast_camera::{lifecycle, SharedCamera};
use lenscast_core::{Config, Error};
use lenscast_server::{create_router, AppState};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, error, info, Level};
use tracing_subscriber::EnvFilter;

/// LensCast - stream a camera over HTTP
#[derive(Parser, Debug)]
#[command(name = "lenscast")]
#[command(version, about, long_about = None)]
struct Args {
    /// Capture width in pixels
    #[arg(short = 'W', long, default_value = "640")]
    width: u32,

    /// Capture height in pixels
    #[arg(short = 'H', long, default_value = "480")]
    height: u32,

    /// Target frame rate
    #[arg(short, long, default_value = "30")]
    fps: u32,

    /// Server port
    #[arg(short, long, default_value = "8000")]
    port: u16,

    /// JPEG quality (1-100)
    #[arg(short, long, default_value = "75")]
    quality: u8,

    /// V4L2 device index (/dev/video<N>)
    #[arg(short, long, default_value = "0")]
    device: usize,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Print a systemd unit file for this server and exit
    #[arg(long)]
    service: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.service {
        print_systemd_unit();
        return Ok(());
    }

    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .with_env_filter(EnvFilter::from_default_env().add_directive(log_level.into()))
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();

    info!("LensCast v{}", env!("CARGO_PKG_VERSION"));
    log_host_model();

    let config = Config::new()
        .with_width(args.width)
        .with_height(args.height)
        .with_fps(args.fps)
        .with_port(args.port)
        .with_jpeg_quality(args.quality)
        .with_device_index(args.device);

    info!("Initializing camera...");
    let source = match lifecycle::open(&config) {
        Ok(source) => source,
        Err(e) => {
            error!("Camera initialization failed: {e}");
            if matches!(e, Error::NoCamera) {
                error!("Troubleshooting:");
                error!("  - check the camera ribbon cable or USB connection");
                error!("  - verify a device node exists: ls /dev/video*");
                error!("  - on Raspberry Pi, enable the camera overlay in /boot/firmware/config.txt and reboot");
            }
            return Err(e.into());
        }
    };
    info!("Camera started ({:?})", source.pixel_format());

    let camera = Arc::new(SharedCamera::new(Box::new(source)));
    let state = Arc::new(AppState::new(config.clone(), camera.clone()));
    let router = create_router(state.clone());

    // Bind only after the camera is up.
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Camera stream server started");
    info!("  Stream: http://<host>:{}/stream.mjpg", config.port);
    info!("  Health: http://<host>:{}/health", config.port);
    info!("Press Ctrl+C to stop.");

    let shutdown_state = state.clone();
    let shutdown = async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Shutting down...");
        shutdown_state.trigger_shutdown();
    };

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;

    // All sessions have exited; nothing can capture past this point.
    camera.close().await;

    info!("Goodbye!");
    Ok(())
}

/// Log the board model when running on a device tree platform.
fn log_host_model() {
    match std::fs::read_to_string("/proc/device-tree/model") {
        Ok(model) => info!("Host: {}", model.trim_end_matches('\0').trim()),
        Err(_) => debug!("No device-tree model available"),
    }
}

fn print_systemd_unit() {
    let unit = "\
[Unit]
Description=LensCast camera stream server
After=network.target
Wants=network.target

[Service]
Type=simple
User=pi
ExecStart=/usr/local/bin/lenscast
Restart=always
RestartSec=10
StandardOutput=journal
StandardError=journal

[Install]
WantedBy=multi-user.target
";

    println!("# Save to: /etc/systemd/system/lenscast.service");
    println!("# Enable with: sudo systemctl enable --now lenscast.service");
    println!();
    println!("{unit}");
}
