// # domainctl - one reconciliation pass over registrar-managed domains
//
// This binary is a thin integration layer: it reads configuration from the
// environment, wires a registrar adapter through the registry and hands every
// decision to `registrar_core::LifecycleOrchestrator`. No retry or policy logic
// lives here.
//
// ## Configuration
//
// ### Registrar
// - `DOMAINCTL_API_KEY`: API key (required)
// - `DOMAINCTL_API_SECRET`: API secret (required)
// - `DOMAINCTL_BASE_URL`: API base URL (default: production)
// - `DOMAINCTL_SHOPPER_ID`: Reseller shopper id (optional)
//
// ### Action
// - `DOMAINCTL_ACTION`: `apply` (default), `release` or `list-records`
// - `DOMAINCTL_MANIFEST`: Desired-state manifest path (required for `apply`)
// - `DOMAINCTL_DOMAINS`: Comma-separated domains (for `release` and `list-records`)
//
// ### Polling
// - `DOMAINCTL_POLL_MAX_ATTEMPTS`: Status checks per wait
// - `DOMAINCTL_POLL_INITIAL_MS`: First wait between checks
//
// ### Logging
// - `DOMAINCTL_LOG_LEVEL`: trace, debug, info, warn, error
//
// ## Example
//
// ```bash
// export DOMAINCTL_API_KEY=...
// export DOMAINCTL_API_SECRET=...
// export DOMAINCTL_BASE_URL=https://api.ote-godaddy.com
// export DOMAINCTL_MANIFEST=/etc/domainctl/domains.json
//
// domainctl
// ```

use anyhow::{Context, Result};
use registrar_core::{
    DesiredDomain, DesiredStateManifest, DomainName, DomainRequest, LifecycleEvent,
    LifecycleOrchestrator, ManagedDomain, OrchestratorConfig, PollConfig, RegistrarConfig,
    RegistrarRegistry, SystemClock, cancellation, config::DEFAULT_GODADDY_BASE_URL,
};
use std::env;
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes
///
/// - 0: Every domain reconciled
/// - 1: Configuration or startup error
/// - 2: At least one domain failed
#[derive(Debug, Clone, Copy)]
enum DomainctlExitCode {
    Success = 0,
    ConfigError = 1,
    RuntimeError = 2,
}

impl From<DomainctlExitCode> for ExitCode {
    fn from(code: DomainctlExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// What this run does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Apply,
    Release,
    ListRecords,
}

impl FromStr for Action {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "apply" => Ok(Self::Apply),
            "release" => Ok(Self::Release),
            "list-records" => Ok(Self::ListRecords),
            other => anyhow::bail!(
                "DOMAINCTL_ACTION '{}' is not supported. \
                Supported actions: apply, release, list-records",
                other
            ),
        }
    }
}

/// Application configuration
struct Config {
    api_key: String,
    api_secret: String,
    base_url: String,
    shopper_id: Option<String>,
    action: Action,
    manifest: Option<String>,
    domains: Vec<String>,
    poll_max_attempts: Option<u32>,
    poll_initial_ms: Option<u64>,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Self {
            api_key: lookup("DOMAINCTL_API_KEY").unwrap_or_default(),
            api_secret: lookup("DOMAINCTL_API_SECRET").unwrap_or_default(),
            base_url: non_empty("DOMAINCTL_BASE_URL")
                .unwrap_or_else(|| DEFAULT_GODADDY_BASE_URL.to_string()),
            shopper_id: non_empty("DOMAINCTL_SHOPPER_ID"),
            action: non_empty("DOMAINCTL_ACTION")
                .as_deref()
                .unwrap_or("apply")
                .parse()?,
            manifest: non_empty("DOMAINCTL_MANIFEST"),
            domains: lookup("DOMAINCTL_DOMAINS")
                .unwrap_or_default()
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            poll_max_attempts: non_empty("DOMAINCTL_POLL_MAX_ATTEMPTS")
                .map(|s| s.trim().parse())
                .transpose()
                .context("DOMAINCTL_POLL_MAX_ATTEMPTS must be a positive integer")?,
            poll_initial_ms: non_empty("DOMAINCTL_POLL_INITIAL_MS")
                .map(|s| s.trim().parse())
                .transpose()
                .context("DOMAINCTL_POLL_INITIAL_MS must be a positive integer")?,
            log_level: lookup("DOMAINCTL_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if self.api_key.is_empty() || self.api_secret.is_empty() {
            anyhow::bail!(
                "DOMAINCTL_API_KEY and DOMAINCTL_API_SECRET are required. \
                Set them via: export DOMAINCTL_API_KEY=... DOMAINCTL_API_SECRET=..."
            );
        }

        if !self.base_url.starts_with("https://") && !self.base_url.starts_with("http://") {
            anyhow::bail!(
                "DOMAINCTL_BASE_URL must use HTTP or HTTPS scheme. Got: {}",
                self.base_url
            );
        }

        match self.action {
            Action::Apply => {
                if self.manifest.is_none() {
                    anyhow::bail!(
                        "DOMAINCTL_MANIFEST is required for apply. \
                        Set it via: export DOMAINCTL_MANIFEST=/path/to/domains.json"
                    );
                }
            }
            Action::Release | Action::ListRecords => {
                if self.domains.is_empty() {
                    anyhow::bail!("DOMAINCTL_DOMAINS must name at least one domain for this action");
                }
                for domain in &self.domains {
                    DomainName::parse(domain)
                        .with_context(|| format!("DOMAINCTL_DOMAINS entry '{}'", domain))?;
                }
            }
        }

        if let Some(attempts) = self.poll_max_attempts
            && attempts == 0
        {
            anyhow::bail!("DOMAINCTL_POLL_MAX_ATTEMPTS must be at least 1");
        }

        if let Some(initial) = self.poll_initial_ms
            && initial == 0
        {
            anyhow::bail!("DOMAINCTL_POLL_INITIAL_MS must be at least 1");
        }

        self.level()?;
        Ok(())
    }

    fn level(&self) -> Result<Level> {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Ok(Level::TRACE),
            "debug" => Ok(Level::DEBUG),
            "info" => Ok(Level::INFO),
            "warn" => Ok(Level::WARN),
            "error" => Ok(Level::ERROR),
            _ => anyhow::bail!(
                "DOMAINCTL_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }
    }

    fn orchestrator_config(&self) -> OrchestratorConfig {
        let mut poll = PollConfig::default();
        if let Some(attempts) = self.poll_max_attempts {
            poll.max_attempts = Some(attempts);
        }
        if let Some(initial) = self.poll_initial_ms {
            poll.initial_interval_ms = initial;
        }

        OrchestratorConfig::new(RegistrarConfig::GoDaddy {
            api_key: self.api_key.clone(),
            api_secret: self.api_secret.clone(),
            base_url: self.base_url.clone(),
            shopper_id: self.shopper_id.clone(),
        })
        .with_poll(poll)
    }
}

fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return DomainctlExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {:#}", e);
        return DomainctlExitCode::ConfigError.into();
    }

    let log_level = config.level().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DomainctlExitCode::ConfigError.into();
    }

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DomainctlExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        match run(config).await {
            Ok(code) => code,
            Err(e) => {
                error!("Startup failed: {:#}", e);
                DomainctlExitCode::ConfigError
            }
        }
    })
    .into()
}

/// Build the orchestrator and run the configured action
///
/// Errors returned here are startup errors; per-domain failures are counted
/// and reported through the exit code.
async fn run(config: Config) -> Result<DomainctlExitCode> {
    let registry = RegistrarRegistry::new();

    #[cfg(feature = "godaddy")]
    {
        info!("Registering GoDaddy registrar");
        registrar_godaddy::register(&registry);
    }

    let orchestrator_config = config.orchestrator_config();
    orchestrator_config.validate()?;

    let registrar = registry.create_registrar(&orchestrator_config.registrar)?;
    info!(
        "Using registrar '{}' at {}",
        registrar.registrar_name(),
        config.base_url
    );

    let (cancel, signal) = cancellation();
    let (orchestrator, events) = LifecycleOrchestrator::new(
        Arc::from(registrar),
        Arc::new(SystemClock),
        &orchestrator_config,
    )?;
    let orchestrator = orchestrator.with_cancel(signal);

    let event_logger = tokio::spawn(log_events(events));
    let shutdown = tokio::spawn(async move {
        match wait_for_shutdown_signal().await {
            Ok(name) => {
                warn!("Received {}, abandoning in-flight waits", name);
                cancel.cancel();
            }
            Err(e) => warn!("Shutdown signal handling unavailable: {}", e),
        }
    });

    let failures = match config.action {
        Action::Apply => {
            let path = config
                .manifest
                .as_deref()
                .context("DOMAINCTL_MANIFEST is required for apply")?;
            let manifest = DesiredStateManifest::from_path(path)
                .with_context(|| format!("Failed to load manifest {}", path))?;
            info!("Loaded manifest with {} domain(s)", manifest.domains.len());
            apply(&orchestrator, &manifest).await
        }
        Action::Release => release(&orchestrator, &config.domains).await,
        Action::ListRecords => list_records(&orchestrator, &config.domains).await,
    };

    shutdown.abort();
    // Closing the event channel lets the logger finish.
    drop(orchestrator);
    if let Err(e) = event_logger.await {
        warn!("Event logger stopped abnormally: {}", e);
    }

    if failures > 0 {
        error!("{} domain(s) failed", failures);
        Ok(DomainctlExitCode::RuntimeError)
    } else {
        info!("All domains reconciled");
        Ok(DomainctlExitCode::Success)
    }
}

/// Converge every manifest entry; returns the number of failed domains
async fn apply(orchestrator: &LifecycleOrchestrator, manifest: &DesiredStateManifest) -> usize {
    let mut failures = 0;
    for desired in &manifest.domains {
        if let Err(e) = apply_one(orchestrator, desired).await {
            error!("{}: {:#}", desired.domain, e);
            failures += 1;
        }
    }
    failures
}

async fn apply_one(orchestrator: &LifecycleOrchestrator, desired: &DesiredDomain) -> Result<()> {
    let request = desired.request()?;
    let existing = current_state(orchestrator, &request).await?;

    let managed = orchestrator
        .ensure_domain(&request, existing.as_ref())
        .await?;
    info!(
        "{} registered until {}",
        managed.domain,
        managed.expires_string()
    );

    if let Some(name_servers) = &desired.name_servers {
        orchestrator
            .ensure_name_servers(&desired.domain, name_servers)
            .await?;
    }

    if let Some(records) = &desired.records {
        let applied = orchestrator
            .ensure_records(&desired.domain, records, &desired.policy())
            .await?;
        info!("{}: {} record group(s) replaced", desired.domain, applied);
    }

    Ok(())
}

/// Last known registrar state, or `None` when the domain is not registered
async fn current_state(
    orchestrator: &LifecycleOrchestrator,
    request: &DomainRequest,
) -> Result<Option<ManagedDomain>> {
    match orchestrator.read_domain(request).await {
        Ok(managed) => {
            if managed.pending_renewal {
                info!("{} expires {}, renewal due", managed.domain, managed.expires_string());
            }
            Ok(Some(managed))
        }
        Err(e) if e.is_not_found() => {
            info!("{} is not registered yet", request.domain);
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

async fn release(orchestrator: &LifecycleOrchestrator, domains: &[String]) -> usize {
    let mut failures = 0;
    for raw in domains {
        let result = match DomainName::parse(raw) {
            Ok(domain) => orchestrator.release_domain(&domain).await,
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            error!("{}: {}", raw, e);
            failures += 1;
        }
    }
    failures
}

/// Print every record of each domain to stdout as JSON
async fn list_records(orchestrator: &LifecycleOrchestrator, domains: &[String]) -> usize {
    let mut failures = 0;
    for raw in domains {
        let result = match DomainName::parse(raw) {
            Ok(domain) => orchestrator.list_records(&domain).await,
            Err(e) => Err(e),
        };
        match result.map_err(anyhow::Error::from).and_then(|records| {
            info!("{}: {} record(s)", raw, records.len());
            serde_json::to_string_pretty(&records).map_err(anyhow::Error::from)
        }) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                error!("{}: {:#}", raw, e);
                failures += 1;
            }
        }
    }
    failures
}

async fn log_events(mut events: mpsc::Receiver<LifecycleEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            LifecycleEvent::PurchaseIssued {
                domain,
                term_years,
                quoted_micros,
            } => info!(
                "Purchased {} for {} year(s) at {} micros",
                domain, term_years, quoted_micros
            ),
            LifecycleEvent::RenewalIssued {
                domain, term_years, ..
            } => info!("Renewed {} for {} year(s)", domain, term_years),
            LifecycleEvent::RenewalSkipped { domain, expires } => {
                info!("{} not due for renewal (expires {})", domain, expires)
            }
            LifecycleEvent::Converged { domain, expires } => {
                info!("{} converged, expires {}", domain, expires)
            }
            LifecycleEvent::RecordGroupApplied {
                domain,
                record_type,
                records,
            } => info!("{}: replaced {} {} record(s)", domain, records, record_type),
            LifecycleEvent::NameServersReplaced {
                domain,
                name_servers,
            } => info!("{}: delegated to {}", domain, name_servers.join(", ")),
            LifecycleEvent::CancellationIssued { domain } => info!("Released {}", domain),
            LifecycleEvent::OperationFailed {
                domain,
                operation,
                error,
            } => warn!("{} failed for {}: {}", operation, domain, error),
        }
    }
}

/// Wait for SIGTERM or SIGINT
#[cfg(unix)]
async fn wait_for_shutdown_signal() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Wait for CTRL-C
#[cfg(not(unix))]
async fn wait_for_shutdown_signal() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
