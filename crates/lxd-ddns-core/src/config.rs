//! Configuration for the reconciliation engine
//!
//! The daemon builds one [`SyncConfig`] from its command line and hands it to
//! [`Reconciler::new`](crate::Reconciler::new). Nothing reads configuration
//! from anywhere else.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings for one synchronizer instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// DNS server to update and to query for alias markers
    #[serde(default = "default_server")]
    pub server: String,

    /// Domain the container records live under
    pub domain: String,

    /// Zone to update (defaults to the domain)
    #[serde(default)]
    pub zone: Option<String>,

    /// Interface names to take addresses from, in priority order
    #[serde(default = "default_interfaces")]
    pub interfaces: Vec<String>,

    /// Pause between reconciliation cycles (in seconds)
    #[serde(default = "default_interval_secs")]
    pub interval_secs: f64,

    /// Upper bound on one alias TXT lookup (in seconds)
    #[serde(default = "default_query_timeout_secs")]
    pub query_timeout_secs: f64,

    /// Decide and log, but never send updates
    #[serde(default)]
    pub dry_run: bool,
}

impl SyncConfig {
    /// Create a configuration for `domain` with defaults for everything else
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            server: default_server(),
            domain: normalize_domain(&domain.into()),
            zone: None,
            interfaces: default_interfaces(),
            interval_secs: default_interval_secs(),
            query_timeout_secs: default_query_timeout_secs(),
            dry_run: false,
        }
    }

    /// Set the DNS server
    pub fn with_server(mut self, server: impl Into<String>) -> Self {
        self.server = server.into();
        self
    }

    /// Set an explicit zone
    pub fn with_zone(mut self, zone: impl Into<String>) -> Self {
        self.zone = Some(normalize_domain(&zone.into()));
        self
    }

    /// Set the interface priority list
    pub fn with_interfaces<I, S>(mut self, interfaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.interfaces = interfaces.into_iter().map(Into::into).collect();
        self
    }

    /// Set the pause between cycles
    pub fn with_interval_secs(mut self, interval_secs: f64) -> Self {
        self.interval_secs = interval_secs;
        self
    }

    /// Set the TXT lookup timeout
    pub fn with_query_timeout_secs(mut self, query_timeout_secs: f64) -> Self {
        self.query_timeout_secs = query_timeout_secs;
        self
    }

    /// Enable or disable dry-run mode
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Zone to update, falling back to the domain
    pub fn zone(&self) -> &str {
        self.zone.as_deref().unwrap_or(&self.domain)
    }

    /// Pause between cycles
    ///
    /// Only meaningful after [`validate`](Self::validate) succeeded.
    pub fn interval(&self) -> Duration {
        Duration::from_secs_f64(self.interval_secs)
    }

    /// TXT lookup timeout
    ///
    /// Only meaningful after [`validate`](Self::validate) succeeded.
    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.query_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.server.trim().is_empty() {
            return Err(crate::Error::config("DNS server cannot be empty"));
        }

        validate_domain_name("domain", &self.domain)?;
        if let Some(zone) = &self.zone {
            validate_domain_name("zone", zone)?;
        }

        if self.interfaces.is_empty() {
            return Err(crate::Error::config("At least one interface is required"));
        }
        if self.interfaces.iter().any(|iface| iface.trim().is_empty()) {
            return Err(crate::Error::config("Interface names cannot be empty"));
        }

        validate_seconds("interval", self.interval_secs)?;
        validate_seconds("query timeout", self.query_timeout_secs)?;

        Ok(())
    }
}

fn validate_seconds(what: &str, secs: f64) -> Result<(), crate::Error> {
    // Duration::from_secs_f64 panics on these, so reject them up front
    if !secs.is_finite() || secs <= 0.0 || secs > u32::MAX as f64 {
        return Err(crate::Error::config(format!(
            "{what} must be a positive number of seconds. Got: {secs}"
        )));
    }
    Ok(())
}

/// Basic RFC 1035 shape check
///
/// Underscores are accepted because container names (and therefore zones
/// built from them) may carry them.
fn validate_domain_name(what: &str, domain: &str) -> Result<(), crate::Error> {
    if domain.is_empty() {
        return Err(crate::Error::config(format!("{what} cannot be empty")));
    }

    if domain.len() > 253 {
        return Err(crate::Error::config(format!(
            "{what} too long: {} chars (max 253). Got: {domain}",
            domain.len()
        )));
    }

    for label in domain.split('.') {
        if label.is_empty() {
            return Err(crate::Error::config(format!(
                "{what} has empty label: '{domain}'"
            )));
        }

        if label.len() > 63 {
            return Err(crate::Error::config(format!(
                "{what} label too long: {} chars (max 63). Label: '{label}'",
                label.len()
            )));
        }

        if !label
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(crate::Error::config(format!(
                "{what} label contains invalid characters. Label: '{label}'"
            )));
        }

        if label.starts_with('-') || label.ends_with('-') {
            return Err(crate::Error::config(format!(
                "{what} label cannot start or end with hyphen. Label: '{label}'"
            )));
        }
    }

    Ok(())
}

fn normalize_domain(domain: &str) -> String {
    domain.trim().trim_end_matches('.').to_string()
}

fn default_server() -> String {
    "127.0.0.1".to_string()
}

fn default_interfaces() -> Vec<String> {
    vec!["eth0".to_string()]
}

fn default_interval_secs() -> f64 {
    30.0
}

fn default_query_timeout_secs() -> f64 {
    1.0
}
