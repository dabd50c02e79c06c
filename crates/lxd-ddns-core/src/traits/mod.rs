//! Core traits for the DNS synchronizer
//!
//! - [`ContainerSource`]: List containers and their network state
//! - [`TxtResolver`]: Look up TXT records for alias discovery
//! - [`ZoneUpdater`]: Commit update transactions to the zone

pub mod container_source;
pub mod txt_resolver;
pub mod zone_updater;

pub use container_source::ContainerSource;
pub use txt_resolver::TxtResolver;
pub use zone_updater::ZoneUpdater;
