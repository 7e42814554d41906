use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use ibmcloud_platform::config::{Config, ServiceConfig};
use ibmcloud_platform::iam_policy::IamPolicyManagementV1;
use ibmcloud_platform::ibm::{format_service_error, with_cancel};
use ibmcloud_platform::resource_controller::ResourceControllerV2;
use ibmcloud_platform::walkthrough::{
    self, JsonPrinter, Observer, ResourceControllerSettings, TracingObserver,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Run IBM Cloud platform service walkthroughs
#[derive(Parser, Debug)]
#[command(name = "ibmcloud-platform", version, about, long_about = None)]
struct Args {
    /// Log level for debugging
    #[arg(long, value_enum, default_value = "info", global = true)]
    log_level: LogLevel,

    /// Log to stderr instead of the log file
    #[arg(long, global = true)]
    log_stderr: bool,

    /// Do not print results as JSON
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Policy and custom role lifecycle (IAM_POLICY_MANAGEMENT_* settings)
    IamPolicy,

    /// Instance, alias, binding, key and reclamation lifecycle
    /// (RESOURCE_CONTROLLER_* settings)
    ResourceController {
        /// Seconds to wait for the reclamation after deleting the instance
        #[arg(long, default_value_t = 20)]
        reclamation_delay: u64,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(
    level: LogLevel,
    to_stderr: bool,
) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let Some(tracing_level) = level.to_tracing_level() else {
        return Ok(None);
    };

    // RUST_LOG wins over --log-level when set
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(tracing_level.to_string().to_lowercase()));

    if to_stderr {
        let (non_blocking, guard) = tracing_appender::non_blocking(std::io::stderr());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(non_blocking)
            .with_target(false)
            .init();
        return Ok(Some(guard));
    }

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory {:?}", parent))?;
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {:?}", log_path))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("ibmcloud-platform started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Ok(Some(guard))
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("ibmcloud-platform").join("ibmcloud-platform.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".ibmcloud-platform").join("ibmcloud-platform.log");
    }
    PathBuf::from("ibmcloud-platform.log")
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level, args.log_stderr)?;

    let printing = (TracingObserver, JsonPrinter);
    let observer: &dyn Observer = if args.quiet { &TracingObserver } else { &printing };

    let mut state = Config::load();

    // Ctrl-C abandons the in-flight request
    let interrupted = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    match args.command {
        Command::IamPolicy => {
            let config = ServiceConfig::from_external_sources(IamPolicyManagementV1::DEFAULT_SERVICE_NAME);
            let account_id = config
                .require_property("testAccountId")
                .context("IAM policy walkthrough needs an account")?
                .to_string();
            let service = IamPolicyManagementV1::from_config(&config)
                .context("Failed to create IAM Policy Management client")?;

            with_cancel(walkthrough::run_iam_policy(&service, &account_id, observer), interrupted)
                .await
                .map_err(|e| anyhow::anyhow!(format_service_error(&e)))
                .context("IAM policy walkthrough failed")?;

            state.remember("iam-policy", Some(&account_id));
        }
        Command::ResourceController { reclamation_delay } => {
            let config = ServiceConfig::from_external_sources(ResourceControllerV2::DEFAULT_SERVICE_NAME);
            let mut settings = ResourceControllerSettings::from_config(&config)
                .context("Resource Controller walkthrough is not configured")?;
            settings.reclamation_delay = Duration::from_secs(reclamation_delay);
            let service = ResourceControllerV2::from_config(&config)
                .context("Failed to create Resource Controller client")?;

            with_cancel(
                walkthrough::run_resource_controller(&service, &settings, observer),
                interrupted,
            )
            .await
            .map_err(|e| anyhow::anyhow!(format_service_error(&e)))
            .context("Resource Controller walkthrough failed")?;

            state.remember("resource-controller", Some(&settings.account_id));
        }
    }

    tracing::info!("Walkthrough completed");
    Ok(())
}
