// # lxd-ddnsd - LXD DNS synchronizer daemon
//
// This is a thin integration layer. All reconciliation logic lives in
// lxd-ddns-core; the daemon only:
// 1. Parses the command line (every flag can also come from the environment)
// 2. Sets up logging
// 3. Builds the lxc source, hickory resolver and nsupdate updater
// 4. Runs the reconciler until SIGINT/SIGTERM or a fatal error
//
// ## Example
//
// ```bash
// lxd-ddnsd --key /etc/bind/ddns.key --domain lxd.example.com \
//     --zone example.com --interfaces eth0,eth1 --log-file -
// ```
//
// or
//
// ```bash
// export LXD_DDNS_KEY=/etc/bind/ddns.key
// export LXD_DDNS_DOMAIN=lxd.example.com
// lxd-ddnsd
// ```

use anyhow::{Context, Result};
use clap::Parser;
use lxd_ddns_core::{Reconciler, SyncConfig};
use lxd_ddns_provider_nsupdate::NsupdateProvider;
use lxd_ddns_resolver_hickory::{DNS_PORT, HickoryTxtResolver};
use lxd_ddns_source_lxc::LxcContainerSource;
use std::fs::OpenOptions;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum DaemonExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (fatal error in the reconciliation loop)
    RuntimeError = 2,
}

impl From<DaemonExitCode> for ExitCode {
    fn from(code: DaemonExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Keep a DNS zone in sync with the containers of an LXD host
#[derive(Parser, Debug)]
#[command(name = "lxd-ddnsd", version, about, long_about = None)]
struct Args {
    /// Path to the dynamic DNS key
    #[arg(long, env = "LXD_DDNS_KEY")]
    key: PathBuf,

    /// IP/hostname of the server to update
    #[arg(long, env = "LXD_DDNS_SERVER", default_value = "127.0.0.1")]
    server: String,

    /// The domain to be updated
    #[arg(long, env = "LXD_DDNS_DOMAIN")]
    domain: String,

    /// The zone to be updated (defaults to the domain)
    #[arg(long, env = "LXD_DDNS_ZONE")]
    zone: Option<String>,

    /// Max wait time for alias lookups before removals (seconds)
    #[arg(long, env = "LXD_DDNS_QUERY_TIMEOUT", default_value_t = 1.0)]
    query_timeout: f64,

    /// Run without doing any update
    #[arg(long, env = "LXD_DDNS_DRY_RUN")]
    dry_run: bool,

    /// Log level to display
    #[arg(long, env = "LXD_DDNS_LOG_LEVEL", default_value = "INFO")]
    log_level: String,

    /// Where to put the logs ("-" for stderr)
    #[arg(long, env = "LXD_DDNS_LOG_FILE", default_value = "/var/log/lxd-ddns.log")]
    log_file: String,

    /// Comma separated ordered list of interfaces to take addresses from
    #[arg(
        long,
        env = "LXD_DDNS_INTERFACES",
        default_value = "eth0",
        value_delimiter = ','
    )]
    interfaces: Vec<String>,

    /// Pause between update checks (seconds)
    #[arg(long, env = "LXD_DDNS_INTERVAL", default_value_t = 30.0)]
    interval: f64,

    /// Container client to run
    #[arg(long, env = "LXD_DDNS_LXC_COMMAND", default_value = "lxc")]
    lxc_command: String,

    /// Update tool to run
    #[arg(long, env = "LXD_DDNS_NSUPDATE_COMMAND", default_value = "nsupdate")]
    nsupdate_command: String,
}

impl Args {
    /// Engine settings from the command line
    fn sync_config(&self) -> SyncConfig {
        let config = SyncConfig::new(self.domain.as_str())
            .with_server(self.server.trim())
            .with_interfaces(self.interfaces.iter().map(|iface| iface.trim().to_string()))
            .with_interval_secs(self.interval)
            .with_query_timeout_secs(self.query_timeout)
            .with_dry_run(self.dry_run);

        match &self.zone {
            Some(zone) => config.with_zone(zone.as_str()),
            None => config,
        }
    }

    /// Validate what the engine does not check itself
    fn validate(&self) -> Result<()> {
        if parse_log_level(&self.log_level).is_none() {
            anyhow::bail!(
                "--log-level '{}' is not valid. \
                Valid levels: TRACE, DEBUG, INFO, WARNING, ERROR, CRITICAL",
                self.log_level
            );
        }

        if !self.dry_run && !self.key.is_file() {
            anyhow::bail!("--key file does not exist: {}", self.key.display());
        }

        Ok(())
    }
}

/// Map a log level name onto a tracing level
///
/// Accepts tracing names as well as WARNING and CRITICAL, case-insensitively.
fn parse_log_level(level: &str) -> Option<Level> {
    match level.to_ascii_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" | "warning" => Some(Level::WARN),
        "error" | "critical" => Some(Level::ERROR),
        _ => None,
    }
}

/// Install the global subscriber writing to `log_file` ("-" means stderr)
fn init_logging(level: Level, log_file: &str) -> Result<()> {
    if log_file == "-" {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_file)
            .with_context(|| format!("cannot open log file {log_file}"))?;
        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    }

    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    let config = args.sync_config();
    if let Err(e) = config.validate().map_err(anyhow::Error::from).and_then(|_| args.validate()) {
        eprintln!("Configuration validation error: {}", e);
        return DaemonExitCode::ConfigError.into();
    }

    let log_level = parse_log_level(&args.log_level).unwrap_or(Level::INFO);
    if let Err(e) = init_logging(log_level, &args.log_file) {
        eprintln!("Failed to set up logging: {:#}", e);
        return DaemonExitCode::ConfigError.into();
    }

    info!("Starting lxd-ddnsd with {:?}", args);

    // Reconciliation is sequential; one thread is all it needs
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DaemonExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        let reconciler = match build_reconciler(&args, config).await {
            Ok(reconciler) => reconciler,
            Err(e) => {
                error!("Startup error: {:#}", e);
                return DaemonExitCode::ConfigError;
            }
        };

        match reconciler.run().await {
            Ok(()) => {
                info!("Shutting down daemon");
                DaemonExitCode::CleanShutdown
            }
            Err(e) => {
                error!("Daemon error: {:?}", anyhow::Error::from(e));
                DaemonExitCode::RuntimeError
            }
        }
    })
    .into()
}

/// Wire the collaborators into a reconciler
async fn build_reconciler(args: &Args, config: SyncConfig) -> Result<Reconciler> {
    let resolver_addr = resolve_server(&config.server).await?;
    info!("Alias lookups go to {}", resolver_addr);

    let source = LxcContainerSource::new(args.lxc_command.as_str());
    let resolver = HickoryTxtResolver::new(resolver_addr, config.query_timeout());
    let updater =
        NsupdateProvider::new(args.key.clone()).with_command(args.nsupdate_command.as_str());

    if config.dry_run {
        warn!("Dry run: no update will be sent");
    }

    let (reconciler, _events) = Reconciler::new(
        Box::new(source),
        Box::new(resolver),
        Box::new(updater),
        config,
    )?;

    Ok(reconciler)
}

/// Socket address of the DNS server, resolving a hostname once at startup
async fn resolve_server(server: &str) -> Result<SocketAddr> {
    if let Ok(ip) = server.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, DNS_PORT));
    }

    tokio::net::lookup_host((server, DNS_PORT))
        .await
        .with_context(|| format!("cannot resolve DNS server {server}"))?
        .next()
        .with_context(|| format!("DNS server {server} has no address"))
}
