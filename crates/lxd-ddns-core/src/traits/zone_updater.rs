// # Zone Updater Trait
//
// Defines the interface for delivering update transactions to the DNS server.
//
// ## Implementations
//
// - nsupdate: `lxd-ddns-provider-nsupdate` crate

use crate::transaction::UpdateTransaction;
use async_trait::async_trait;

/// Trait for transports that commit update transactions
///
/// Delivery is fire-and-forget: implementations hand the transaction over and
/// return. They do not confirm that the server applied it and they never
/// retry.
#[async_trait]
pub trait ZoneUpdater: Send + Sync {
    /// Deliver one transaction
    ///
    /// # Errors
    ///
    /// Only failures to hand the transaction over (the tool cannot be
    /// started, its input cannot be written) are errors. They are fatal for
    /// the reconciliation loop.
    async fn send(&self, transaction: &UpdateTransaction) -> Result<(), crate::Error>;

    /// Updater name (for logging/debugging)
    fn updater_name(&self) -> &'static str;
}
