//! Reconciliation engine
//!
//! The Reconciler is responsible for:
//! - Polling the container source on a fixed interval
//! - Publishing A records (and hyphenated aliases) for running containers
//! - Removing records (and discovered aliases) for stopped containers
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │ ContainerSource │─── snapshot ───┐
//! └─────────────────┘                │
//!                                    ▼
//!                           ┌──────────────┐
//!                           │  Reconciler  │
//!                           └──────────────┘
//!                                    │
//!         ┌──────────────────────────┼──────────────────────────┐
//!         │                          │                          │
//!         ▼                          ▼                          ▼
//! ┌─────────────┐           ┌──────────────┐           ┌─────────────┐
//! │ TxtResolver │           │ ZoneUpdater  │           │   Events    │
//! │ (aliases)   │           │ (commit)     │           │  (notify)   │
//! └─────────────┘           └──────────────┘           └─────────────┘
//! ```
//!
//! ## Cycle
//!
//! 1. List containers
//! 2. `Stopped`: look up alias markers, delete the name and its aliases
//! 3. `Running`: replace the A record for every global IPv4 address found on
//!    the configured interfaces, in priority order
//! 4. Anything else is ignored
//! 5. Sleep, repeat
//!
//! Cycles are strictly sequential and nothing is carried from one to the next.

use crate::alias;
use crate::config::SyncConfig;
use crate::error::Result;
use crate::model::{Container, ContainerStatus};
use crate::traits::{ContainerSource, TxtResolver, ZoneUpdater};
use crate::transaction::UpdateTransaction;
use std::future::Future;
use std::net::Ipv4Addr;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, error, info, warn};

/// Capacity of the engine event channel
const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Events emitted by the Reconciler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Engine started
    Started { dry_run: bool },

    /// A-record update decided for a running container
    Registered {
        container: String,
        interface: String,
        ip: Ipv4Addr,
        alias: Option<String>,
        /// false in dry-run mode
        committed: bool,
    },

    /// Removal decided for a stopped container
    Removed {
        container: String,
        /// Every name deleted, the container's own name first
        names: Vec<String>,
        /// false in dry-run mode
        committed: bool,
    },

    /// Alias discovery failed; removal went ahead with the primary name only
    AliasLookupFailed { container: String, error: String },

    /// One full pass over the containers finished
    CycleCompleted(CycleSummary),

    /// Engine stopped
    Stopped { reason: String },
}

/// What one reconciliation cycle did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleSummary {
    /// A-record transactions decided (one per matching address)
    pub registrations: usize,
    /// Removal transactions decided
    pub removals: usize,
    /// Containers skipped because of their status
    pub ignored: usize,
}

/// Container-to-DNS reconciliation loop
///
/// ## Lifecycle
///
/// 1. Create with [`Reconciler::new()`]
/// 2. Start with [`Reconciler::run()`]
/// 3. Runs until SIGINT/SIGTERM arrives between cycles, or until a fatal error
///
/// ## Errors
///
/// Only resolver failures during alias discovery are absorbed. A failing
/// container listing, an unexpected lookup error or an update that cannot
/// be handed to the transport ends [`run()`](Reconciler::run) with an error.
pub struct Reconciler {
    /// Container platform client
    source: Box<dyn ContainerSource>,

    /// Resolver used for alias discovery
    resolver: Box<dyn TxtResolver>,

    /// Transport for update transactions
    updater: Box<dyn ZoneUpdater>,

    /// Synchronizer settings
    config: SyncConfig,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<EngineEvent>,
}

impl Reconciler {
    /// Create a new reconciler
    ///
    /// # Returns
    ///
    /// A tuple of (reconciler, event_receiver). Dropping the receiver is fine;
    /// events are then discarded.
    pub fn new(
        source: Box<dyn ContainerSource>,
        resolver: Box<dyn TxtResolver>,
        updater: Box<dyn ZoneUpdater>,
        config: SyncConfig,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        let reconciler = Self {
            source,
            resolver,
            updater,
            config,
            event_tx: tx,
        };

        Ok((reconciler, rx))
    }

    /// Run until SIGINT/SIGTERM
    ///
    /// Signal handlers are in place before the first cycle starts. A signal
    /// arriving mid-cycle takes effect once the cycle has finished, so no
    /// transaction is abandoned half-written.
    pub async fn run(&self) -> Result<()> {
        let shutdown = shutdown_signal();
        self.run_internal(shutdown).await
    }

    /// Run until `shutdown_rx` fires (or is dropped)
    ///
    /// With `None` this behaves like [`run()`](Reconciler::run). Used by
    /// tests and by embedders that own their own shutdown handling.
    pub async fn run_with_shutdown(
        &self,
        shutdown_rx: Option<tokio::sync::oneshot::Receiver<()>>,
    ) -> Result<()> {
        match shutdown_rx {
            Some(rx) => {
                self.run_internal(async move {
                    let _ = rx.await;
                })
                .await
            }
            None => self.run().await,
        }
    }

    async fn run_internal(&self, shutdown: impl Future<Output = ()>) -> Result<()> {
        tokio::pin!(shutdown);

        info!(
            "Reconciling {} every {:?} (server {}, zone {}, interfaces {:?}{})",
            self.config.domain,
            self.config.interval(),
            self.config.server,
            self.config.zone(),
            self.config.interfaces,
            if self.config.dry_run { ", dry run" } else { "" }
        );
        self.emit_event(EngineEvent::Started {
            dry_run: self.config.dry_run,
        });

        loop {
            self.run_cycle().await?;

            tokio::select! {
                _ = tokio::time::sleep(self.config.interval()) => {}
                _ = &mut shutdown => {
                    info!("Shutdown signal received");
                    self.emit_event(EngineEvent::Stopped {
                        reason: "Shutdown signal".to_string(),
                    });
                    break;
                }
            }
        }

        Ok(())
    }

    /// Run one reconciliation cycle
    ///
    /// Containers are handled one at a time in the order the source returned
    /// them.
    pub async fn run_cycle(&self) -> Result<CycleSummary> {
        let containers = self.source.list_containers().await?;
        debug!(
            "Fetched {} container(s) from {}",
            containers.len(),
            self.source.source_name()
        );

        let mut summary = CycleSummary::default();
        for container in &containers {
            match &container.status {
                ContainerStatus::Stopped => {
                    self.remove_container(&container.name).await?;
                    summary.removals += 1;
                }
                ContainerStatus::Running => {
                    summary.registrations += self.register_container(container).await?;
                }
                ContainerStatus::Other(status) => {
                    debug!("Ignoring {} in status {}", container.name, status);
                    summary.ignored += 1;
                }
            }
        }

        self.emit_event(EngineEvent::CycleCompleted(summary));
        Ok(summary)
    }

    /// Publish the addresses of a running container
    ///
    /// Every global IPv4 address on every configured interface the container
    /// has produces its own transaction, walking interfaces in list order.
    /// The last one sent is what the zone ends up holding.
    ///
    /// # Returns
    ///
    /// The number of transactions decided (sent, or skipped in dry-run mode).
    pub async fn register_container(&self, container: &Container) -> Result<usize> {
        let domain = &self.config.domain;
        let mut updates = 0;

        for interface in &self.config.interfaces {
            let Some(addresses) = container.addresses(interface) else {
                continue;
            };

            for address in addresses {
                if !address.is_global_inet() {
                    continue;
                }
                let Some(ip) = address.global_ipv4() else {
                    warn!(
                        "Ignoring malformed address {:?} on {} of {}",
                        address.address, interface, container.name
                    );
                    continue;
                };

                info!("Updating {} to ip -> {}", container.name, ip);
                let mut transaction = self.transaction();
                transaction.set_host(&container.name, domain, ip);

                let alias = alias::alternate_name(&container.name);
                if let Some(alias) = &alias {
                    info!("Adding alternate name {} to {}", alias, container.name);
                    transaction.set_alias(alias, domain, &container.name);
                }

                let committed = self.commit(&transaction).await?;
                self.emit_event(EngineEvent::Registered {
                    container: container.name.clone(),
                    interface: interface.clone(),
                    ip,
                    alias,
                    committed,
                });
                updates += 1;
            }
        }

        if updates == 0 {
            debug!(
                "No global IPv4 address for {} on {:?}, leaving its records alone",
                container.name, self.config.interfaces
            );
        }

        Ok(updates)
    }

    /// Delete the records of a stopped container and of any alias recorded
    /// for it
    ///
    /// # Returns
    ///
    /// Every name deleted, the container's own name first.
    pub async fn remove_container(&self, name: &str) -> Result<Vec<String>> {
        let domain = &self.config.domain;
        info!("Destroying {}", name);

        let mut names = vec![name.to_string()];
        names.extend(self.discover_aliases(name).await?);

        let mut transaction = self.transaction();
        for record in &names {
            info!("Removing record for {}", record);
            transaction.remove_name(record, domain);
        }

        let committed = self.commit(&transaction).await?;
        self.emit_event(EngineEvent::Removed {
            container: name.to_string(),
            names: names.clone(),
            committed,
        });

        Ok(names)
    }

    /// Read alias markers stored at `name`
    ///
    /// Resolver failures mean "no alias". Any other error is returned.
    /// Aliases that are not a single plain label are skipped.
    async fn discover_aliases(&self, name: &str) -> Result<Vec<String>> {
        let fqdn = format!("{}.{}.", name, self.config.domain);
        debug!("Looking for alias to {}", fqdn);

        let records = match self.resolver.lookup_txt(&fqdn).await {
            Ok(records) => records,
            Err(e) if e.is_lookup() => {
                error!("Cannot get TXT record for {}: {}", name, e);
                self.emit_event(EngineEvent::AliasLookupFailed {
                    container: name.to_string(),
                    error: e.to_string(),
                });
                return Ok(Vec::new());
            }
            Err(e) => {
                error!("Unexpected error looking up aliases of {}: {}", name, e);
                return Err(e);
            }
        };

        let mut aliases = Vec::new();
        for record in &records {
            debug!("Checking TXT record {:?} for alias", record);
            match alias::parse_marker(record) {
                Some(alias) if alias::is_valid_alias(alias) => aliases.push(alias.to_string()),
                Some(alias) => {
                    warn!("Ignoring malformed alias {:?} recorded for {}", alias, name);
                }
                None => {}
            }
        }

        Ok(aliases)
    }

    fn transaction(&self) -> UpdateTransaction {
        UpdateTransaction::new(self.config.server.clone(), self.config.zone())
    }

    /// Hand a transaction to the updater unless running dry
    ///
    /// Returns whether it was sent.
    async fn commit(&self, transaction: &UpdateTransaction) -> Result<bool> {
        debug!("Update transaction:\n{}", transaction);

        if self.config.dry_run {
            info!(
                "Dry run: not sending {} directive(s) to {}",
                transaction.directives.len(),
                self.updater.updater_name()
            );
            return Ok(false);
        }

        self.updater.send(transaction).await?;
        Ok(true)
    }

    /// Emit an engine event
    fn emit_event(&self, event: EngineEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            // Nobody is listening
            Err(TrySendError::Closed(_)) => {}
            Err(TrySendError::Full(_)) => {
                warn!("Event channel full, dropping event");
            }
        }
    }
}

/// Resolves on SIGTERM or SIGINT
///
/// The handlers are installed when this is called, not when the returned
/// future is first polled.
#[cfg(unix)]
fn shutdown_signal() -> impl Future<Output = ()> {
    use tokio::signal::unix::{Signal, SignalKind, signal};

    fn install(kind: SignalKind, name: &str) -> Option<Signal> {
        signal(kind)
            .map_err(|e| warn!("Failed to set up {} handler: {}", name, e))
            .ok()
    }

    async fn recv(signal: Option<Signal>) {
        match signal {
            Some(mut signal) => {
                signal.recv().await;
            }
            None => std::future::pending::<()>().await,
        }
    }

    let sigterm = install(SignalKind::terminate(), "SIGTERM");
    let sigint = install(SignalKind::interrupt(), "SIGINT");

    async move {
        tokio::select! {
            _ = recv(sigterm) => info!("Received SIGTERM"),
            _ = recv(sigint) => info!("Received SIGINT"),
        }
    }
}

/// Resolves on Ctrl-C
#[cfg(windows)]
fn shutdown_signal() -> impl Future<Output = ()> {
    let ctrl_c = tokio::signal::windows::ctrl_c()
        .map_err(|e| warn!("Failed to listen for Ctrl-C: {}", e))
        .ok();

    async move {
        match ctrl_c {
            Some(mut ctrl_c) => {
                ctrl_c.recv().await;
                info!("Received Ctrl-C");
            }
            None => std::future::pending::<()>().await,
        }
    }
}
