// # Container Source Trait
//
// Defines the interface for observing containers on the hypervisor.
//
// ## Implementations
//
// - `lxc` CLI: `lxd-ddns-source-lxc` crate
//
// ## Usage
//
// ```rust,ignore
// use lxd_ddns_core::ContainerSource;
//
// let containers = source.list_containers().await?;
// for container in &containers {
//     println!("{} is {}", container.name, container.status);
// }
// ```

use crate::model::Container;
use async_trait::async_trait;

/// Trait for container platform clients
///
/// A source is an observer only. It reports one snapshot per call and keeps
/// nothing between calls; the engine decides what to do with the snapshot.
#[async_trait]
pub trait ContainerSource: Send + Sync {
    /// List every container with its status and, for running containers,
    /// the addresses on each interface
    ///
    /// The order of the returned list is the order containers are reconciled in.
    ///
    /// # Errors
    ///
    /// Any error is fatal for the reconciliation loop.
    async fn list_containers(&self) -> Result<Vec<Container>, crate::Error>;

    /// Source name (for logging/debugging)
    fn source_name(&self) -> &'static str;
}
