use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use droidcpu::adb::AdbClient;
use droidcpu::core::Config;
use droidcpu::monitor::{PollLoop, PollSettings, Shutdown};
use droidcpu::ondevice::{self, OnDeviceSettings};
use droidcpu::report::{self, ReportSettings, SpikePolicy};
use droidcpu::sampler::{SampleSource, Sampler};
use droidcpu::ui::ConsoleUi;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Package name of the app to watch
    #[arg(long, global = true)]
    package: Option<String>,

    /// Core count of the device; scales every percentage
    #[arg(long, global = true)]
    cores: Option<u32>,

    /// adb serial of the target device
    #[arg(short, long, global = true)]
    serial: Option<String>,

    /// How many threads to chart and export
    #[arg(long, global = true)]
    top: Option<usize>,

    /// Spike threshold: fixed:<percent> or relative:<factor of mean>
    #[arg(long, global = true)]
    spike: Option<SpikePolicy>,

    /// JSON settings file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    mode: Option<Mode>,
}

#[derive(Subcommand, Debug, Clone)]
enum Mode {
    /// Poll thread counters from the host
    Live {
        /// Run length in seconds
        #[arg(default_value_t = 60)]
        duration: u64,
        /// Sample interval in milliseconds
        #[arg(default_value_t = 2000)]
        interval_ms: u64,
        /// Chart path (.png or .svg)
        #[arg(default_value = "cpu_usage.png")]
        output: PathBuf,
        /// Counter source: proc or top
        #[arg(long, default_value = "proc")]
        source: SampleSource,
    },
    /// Collect on the device, then pull and chart
    Ondevice {
        /// Run length in seconds
        #[arg(default_value_t = 60)]
        duration: u64,
        /// Chart path (.png or .svg)
        #[arg(default_value = "cpu_ondevice.png")]
        output: PathBuf,
        /// Sample interval in seconds
        #[arg(long, default_value_t = 2)]
        interval_secs: u64,
    },
}

impl Mode {
    fn output(&self) -> &Path {
        match self {
            Mode::Live { output, .. } | Mode::Ondevice { output, .. } => output,
        }
    }
}

impl Default for Mode {
    fn default() -> Self {
        Mode::Live {
            duration: 60,
            interval_ms: 2000,
            output: PathBuf::from("cpu_usage.png"),
            source: SampleSource::Proc,
        }
    }
}

fn build_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load(cli.config.as_deref()).context("Failed to load config")?;
    if let Some(package) = &cli.package {
        config.package = package.clone();
    }
    if let Some(cores) = cli.cores {
        config.cores = cores;
    }
    if let Some(serial) = &cli.serial {
        config.serial = Some(serial.clone());
    }
    if let Some(top) = cli.top {
        config.top_threads = top;
    }
    config.validate()?;
    Ok(config)
}

fn fatal(msg: &str) -> ! {
    ConsoleUi::error(msg);
    std::process::exit(1);
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = build_config(&cli)?;
    let mode = cli.mode.clone().unwrap_or_default();

    if let Err(e) = report::ensure_available(mode.output()) {
        fatal(&e.to_string());
    }
    let client = match AdbClient::new(&config) {
        Ok(c) => c,
        Err(e) => fatal(&format!("{e}. Install Android Platform-Tools or set adb_path.")),
    };
    if let Err(e) = client.ensure_present().await {
        fatal(&format!("adb version check failed: {e}"));
    }
    tracing::debug!(adb = %client.adb_path().display(), "using adb");

    let shutdown = Shutdown::new();
    shutdown
        .install_ctrlc()
        .context("Failed to install Ctrl-C handler")?;

    match mode {
        Mode::Live {
            duration,
            interval_ms,
            output,
            source,
        } => {
            let report = ReportSettings {
                output,
                top_k: config.top_threads,
                spike: cli.spike.unwrap_or(SpikePolicy::LIVE_DEFAULT),
                app_label: config.package.clone(),
            };
            run_live(&client, &config, duration, interval_ms, source, &report, shutdown).await
        }
        Mode::Ondevice {
            duration,
            output,
            interval_secs,
        } => {
            let report = ReportSettings {
                output,
                top_k: config.top_threads,
                spike: cli.spike.unwrap_or(SpikePolicy::ONDEVICE_DEFAULT),
                app_label: config.package.clone(),
            };
            let settings = OnDeviceSettings {
                duration_secs: duration,
                interval_secs,
            };
            run_ondevice(&client, &config, &settings, &report, &shutdown).await
        }
    }
}

async fn run_live(
    client: &AdbClient,
    config: &Config,
    duration: u64,
    interval_ms: u64,
    source: SampleSource,
    report: &ReportSettings,
    shutdown: Shutdown,
) -> Result<()> {
    ConsoleUi::write_banner("Live CPU Monitor");
    ConsoleUi::info(&format!("Monitoring {} for {} seconds...", config.package, duration));
    ConsoleUi::info(&format!(
        "Sample interval: {}ms ({}s)",
        interval_ms,
        interval_ms as f64 / 1000.0
    ));
    ConsoleUi::info(&format!("Mode: {source}, cores: {}", config.cores));

    let settings = PollSettings {
        package: config.package.clone(),
        duration: Duration::from_secs(duration),
        interval: Duration::from_millis(interval_ms),
        retry_delay: config.retry_delay(),
    };
    let sampler = Sampler::new(source, config.cores);
    let outcome = PollLoop::new(client, settings, sampler, shutdown).run().await;
    if outcome.restarts > 0 {
        ConsoleUi::warn(&format!("Process restarts: {}", outcome.restarts));
    }
    report::report_live(&outcome.recording, report)?;
    Ok(())
}

async fn run_ondevice(
    client: &AdbClient,
    config: &Config,
    settings: &OnDeviceSettings,
    report: &ReportSettings,
    shutdown: &Shutdown,
) -> Result<()> {
    ConsoleUi::write_banner("On-Device CPU Monitor");
    ConsoleUi::info(&format!(
        "Duration: {}s, Interval: {}s, cores: {}",
        settings.duration_secs, settings.interval_secs, config.cores
    ));

    let workdir = std::env::temp_dir().join(format!("droidcpu-{}", std::process::id()));
    std::fs::create_dir_all(&workdir)
        .with_context(|| format!("Failed to create {}", workdir.display()))?;
    let result = match ondevice::collect(client, config, settings, &workdir, shutdown).await {
        Ok(Some(capture)) => {
            report::report_ondevice(&capture.recording, &capture.raw_csv, report).map(|_| ())
        }
        Ok(None) => Ok(()),
        Err(e) => Err(e.into()),
    };
    let _ = std::fs::remove_dir_all(&workdir);
    result
}
