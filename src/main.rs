// src/main.rs - axis-host demonstration binary

use axis_host::{load_config, Movement, MotionController, MotionError, TraceDevice};
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "axis-host", about = "Fixed-frequency motion host for multi-axis actuator devices")]
struct Cli {
    /// Path to the host configuration file
    #[arg(default_value = "axes.toml")]
    config: PathBuf,
    /// Home target applied before the demonstration sweep
    #[arg(long)]
    home_to: Option<f64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let cli = Cli::parse();
    tracing::info!("Starting axis-host");
    tracing::info!("Loading configuration from: {}", cli.config.display());

    let config = load_config(&cli.config).map_err(|e| {
        tracing::error!("Failed to load config from '{}': {}", cli.config.display(), e);
        e
    })?;

    let mut controller = MotionController::from_config(&config)?;
    controller.add_device(Box::new(TraceDevice::new("trace")));
    tracing::info!(
        "{} axes registered, ticking at {} Hz",
        controller.axes().len(),
        controller.frequency_hz()
    );

    let stop = controller.stop_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("ctrl-c received, stopping motion");
            stop.stop();
        }
    });

    let result = run_routine(&mut controller, cli.home_to).await;
    match result {
        Ok(()) => {
            tracing::info!("Routine complete");
            Ok(())
        }
        Err(MotionError::Cancelled) => {
            tracing::info!("Motion stopped; axes hold their last written value");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Home everything, then sweep the default axis end to end.
async fn run_routine(
    controller: &mut MotionController,
    home_to: Option<f64>,
) -> Result<(), MotionError> {
    controller.home(home_to).await?;
    let Some(axis) = controller.default_axis().map(str::to_string) else {
        return Ok(());
    };
    controller
        .move_axes(vec![Movement::to(0.1).on(axis.clone()).duration(1.0)])
        .await?;
    controller
        .move_axes(vec![Movement::to(0.9).on(axis).speed(0.5)])
        .await?;
    Ok(())
}
