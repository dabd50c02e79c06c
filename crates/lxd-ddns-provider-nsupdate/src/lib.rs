// # nsupdate Zone Updater
//
// This crate delivers update transactions by piping their text form into
// `nsupdate -k <key>`.
//
// ## Delivery Semantics
//
// - One `nsupdate` process per transaction
// - The transaction text is written to its stdin, then stdin is closed;
//   the trailing `send` line together with EOF commits the update
// - The process is awaited so it does not linger, but its exit status is
//   only logged. A rejected update is not an error for the engine.
// - Failing to start the process or to write its input is an error
//
// ## Security
//
// The key file path is passed on the command line; its contents are never
// read or logged by this crate.

use async_trait::async_trait;
use lxd_ddns_core::traits::ZoneUpdater;
use lxd_ddns_core::{Error, Result, UpdateTransaction};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

/// Default update tool binary
pub const DEFAULT_NSUPDATE_COMMAND: &str = "nsupdate";

/// Zone updater backed by the `nsupdate` tool
#[derive(Debug, Clone)]
pub struct NsupdateProvider {
    /// Tool binary to run
    command: String,

    /// TSIG key file handed to `-k`
    key_path: PathBuf,
}

impl NsupdateProvider {
    /// Create an updater running `nsupdate -k <key_path>`
    pub fn new(key_path: impl Into<PathBuf>) -> Self {
        Self {
            command: DEFAULT_NSUPDATE_COMMAND.to_string(),
            key_path: key_path.into(),
        }
    }

    /// Run a different binary instead of `nsupdate`
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = command.into();
        self
    }

    /// Key file handed to the tool
    pub fn key_path(&self) -> &Path {
        &self.key_path
    }
}

#[async_trait]
impl ZoneUpdater for NsupdateProvider {
    async fn send(&self, transaction: &UpdateTransaction) -> Result<()> {
        let mut child = Command::new(&self.command)
            .arg("-k")
            .arg(&self.key_path)
            .stdin(Stdio::piped())
            .spawn()
            .map_err(|e| Error::zone_update(format!("failed to run {}: {}", self.command, e)))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::zone_update(format!("{} has no stdin", self.command)))?;

        stdin
            .write_all(transaction.to_string().as_bytes())
            .await
            .map_err(|e| Error::zone_update(format!("failed to write to {}: {}", self.command, e)))?;
        // EOF commits
        drop(stdin);

        match child.wait().await {
            Ok(status) if status.success() => {
                debug!("{} finished for zone {}", self.command, transaction.zone);
            }
            Ok(status) => {
                warn!(
                    "{} exited with {} for zone {}",
                    self.command, status, transaction.zone
                );
            }
            Err(e) => {
                warn!("Failed to wait for {}: {}", self.command, e);
            }
        }

        Ok(())
    }

    fn updater_name(&self) -> &'static str {
        "nsupdate"
    }
}
