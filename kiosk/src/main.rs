mod assets;
mod camera;
mod capture;
mod error;
mod gpio;
mod overlay;
mod session;
mod storage;

use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;

use camera::RpicamDevice;
use error::{FaultKind, KioskError};
use gpio::RppalIo;
use photobooth_common::config::Config;
use session::{Kiosk, KioskSettings};
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info, warn};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("photobooth.toml"));

    let config = match Config::load_or_default(&config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {e}", config_path.display());
            std::process::exit(1);
        }
    };

    // One log per run: the file is truncated at every start.
    let log_file = match File::create(&config.logging.file) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Failed to create log file {}: {e}", config.logging.file);
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.parse().unwrap_or_default()),
        )
        .with_writer(Mutex::new(log_file))
        .with_ansi(false)
        .init();

    info!(
        config = %config_path.display(),
        trigger_pin = config.gpio.trigger_pin,
        indicator_pin = config.gpio.indicator_pin,
        media_root = config.booth.media_root,
        "starting photobooth"
    );

    let code = match run(&config).await {
        Ok(()) => 0,
        Err(e) => {
            match e.kind() {
                FaultKind::Interrupted => warn!(kind = %e.kind(), "{e}"),
                kind => error!(%kind, error = %e, "unexpected error"),
            }
            e.exit_code()
        }
    };
    info!("end of session");
    std::process::exit(code);
}

async fn run(config: &Config) -> Result<(), KioskError> {
    let program_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(PathBuf::from))
        .ok_or_else(|| KioskError::Startup("cannot locate program directory".into()))?;

    let io = RppalIo::new(&config.gpio)?;

    RpicamDevice::probe(&config.camera)
        .await
        .map_err(|e| KioskError::Startup(format!("error initializing the camera: {e}")))?;
    let camera = RpicamDevice::new(&config.camera, &config.display)
        .map_err(|e| KioskError::Startup(e.to_string()))?;

    let settings = KioskSettings::from_config(&config.booth, &program_dir);
    let mut kiosk = Kiosk::new(camera, io, settings);

    let result = tokio::select! {
        r = kiosk.run() => r,
        sig = shutdown_signal() => Err(KioskError::Interrupted(sig)),
    };

    // Same cleanup whatever ended the run; the GPIO pins are released when
    // `kiosk` drops.
    kiosk.shutdown().await;
    result
}

/// Resolves with the name of the first stop signal received.
async fn shutdown_signal() -> &'static str {
    let mut term = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            warn!(error = %e, "cannot listen for SIGTERM, only SIGINT will stop the kiosk");
            let _ = tokio::signal::ctrl_c().await;
            return "SIGINT";
        }
    };
    tokio::select! {
        _ = tokio::signal::ctrl_c() => "SIGINT",
        _ = term.recv() => "SIGTERM",
    }
}
