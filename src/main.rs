//! Pi Cloud Camera CLI
//!
//! `watch` runs the config-polling capture loop; `capture` takes and
//! uploads a single still.

use clap::{Args, Parser, Subcommand};
use pi_cloud_camera::{
    api::HttpDeviceApi,
    auth::{SigningAlgorithm, TokenSigner},
    capture::RaspistillCamera,
    config::AgentConfig,
    metrics::MetricsRegistry,
    oneshot::capture_once,
    watchdog::Watchdog,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "pi-cloud-camera", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Poll device config and capture stills on the configured interval.
    Watch {
        #[command(flatten)]
        device: DeviceArgs,
        /// Serve Prometheus metrics on this port (0 disables).
        #[arg(long)]
        metrics_port: Option<u16>,
    },
    /// Capture one still, upload it and exit.
    Capture {
        #[command(flatten)]
        device: DeviceArgs,
    },
}

#[derive(Args)]
struct DeviceArgs {
    /// Cloud project id.
    project_id: Option<String>,
    /// Registry location, e.g. asia-east1.
    location: Option<String>,
    /// Device registry id.
    registry: Option<String>,
    /// Device id.
    device: Option<String>,
    /// PEM private key registered for the device.
    private_key: Option<PathBuf>,
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Device API base URL.
    #[arg(long)]
    base_url: Option<String>,
    /// Token signing algorithm (ES256 or RS256).
    #[arg(long)]
    algorithm: Option<SigningAlgorithm>,
}

impl DeviceArgs {
    /// Loads the config file, if any, and applies command-line overrides.
    fn load(self) -> Result<AgentConfig, pi_cloud_camera::config::ConfigError> {
        let mut config = match &self.config {
            Some(path) => AgentConfig::from_file(path)?,
            None => AgentConfig::default(),
        };

        if let Some(project_id) = self.project_id {
            config.device.project_id = project_id;
        }
        if let Some(location) = self.location {
            config.device.location = location;
        }
        if let Some(registry) = self.registry {
            config.device.registry = registry;
        }
        if let Some(device) = self.device {
            config.device.device = device;
        }
        if let Some(private_key) = self.private_key {
            config.device.private_key = private_key;
        }
        if let Some(base_url) = self.base_url {
            config.device.base_url = base_url;
        }
        if let Some(algorithm) = self.algorithm {
            config.device.algorithm = algorithm;
        }

        config.validate()?;
        Ok(config)
    }
}

/// Exits with a message if `result` is an error.
fn or_exit<T, E: std::fmt::Display>(result: Result<T, E>, what: &str) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            error!("{}: {}", what, e);
            eprintln!("{}: {}", what, e);
            std::process::exit(1);
        }
    }
}

struct Agent {
    config: AgentConfig,
    signer: TokenSigner,
    api: HttpDeviceApi,
    camera: RaspistillCamera,
}

fn build_agent(config: AgentConfig) -> Agent {
    let device = or_exit(config.device_path(), "Invalid device");
    let signer = or_exit(
        TokenSigner::from_pem_file(
            &config.device.private_key,
            config.device.algorithm,
            device.project_id.clone(),
            config.device.token_ttl_minutes,
        ),
        "Failed to load private key",
    );
    let api = HttpDeviceApi::new(config.device.base_url.clone(), device, config.http_timeout());
    let camera = or_exit(
        RaspistillCamera::new(config.camera.clone()),
        "Failed to set up camera",
    );

    Agent {
        config,
        signer,
        api,
        camera,
    }
}

fn start_metrics(port: u16, registry: &MetricsRegistry) {
    if port == 0 {
        return;
    }

    #[cfg(feature = "metrics")]
    {
        use pi_cloud_camera::metrics::{MetricsServer, MetricsServerConfig};

        let server = MetricsServer::new(MetricsServerConfig::with_port(port), registry.clone());
        // Detached: the exporter lives as long as the process.
        drop(server.spawn());
    }

    #[cfg(not(feature = "metrics"))]
    {
        let _ = registry;
        warn!(port, "Metrics port set but built without the `metrics` feature");
    }
}

fn watch(device: DeviceArgs, metrics_port: Option<u16>) {
    let config = or_exit(device.load(), "Invalid configuration");
    let Agent {
        config,
        signer,
        api,
        camera,
    } = build_agent(config);

    let registry = or_exit(MetricsRegistry::new(), "Failed to create metrics registry");
    start_metrics(metrics_port.unwrap_or(config.metrics.port), &registry);

    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&shutdown);
    if let Err(e) = ctrlc::set_handler(move || flag.store(true, Ordering::Relaxed)) {
        warn!("Failed to install signal handler: {}", e);
    }

    info!(
        device = %api.device().device,
        registry = %api.device().registry,
        "Starting watchdog"
    );

    let mut watchdog = Watchdog::new(camera, api, signer, Instant::now()).with_metrics(registry);
    or_exit(watchdog.run(&shutdown), "Watchdog stopped");
}

fn capture(device: DeviceArgs) {
    let config = or_exit(device.load(), "Invalid configuration");
    let Agent {
        signer,
        api,
        mut camera,
        ..
    } = build_agent(config);

    let outcome = or_exit(capture_once(&mut camera, &api, &signer), "Capture failed");
    println!("HTTP Code={}", outcome.status);
    if !outcome.is_success() {
        println!("{}", outcome.body);
        std::process::exit(1);
    }
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Pi Cloud Camera v{}", pi_cloud_camera::VERSION);

    match Cli::parse().command {
        Command::Watch {
            device,
            metrics_port,
        } => watch(device, metrics_port),
        Command::Capture { device } => capture(device),
    }
}
