// # lxd-ddns-core
//
// Core library for keeping a DNS zone in sync with LXD containers.
//
// ## Architecture Overview
//
// - **ContainerSource**: Trait for listing containers and their network state
// - **TxtResolver**: Trait for TXT lookups used to discover alias records
// - **ZoneUpdater**: Trait for committing zone update transactions
// - **Reconciler**: Polling loop that turns container state into DNS updates
// - **UpdateTransaction**: Typed model of the dynamic update text protocol
//
// ## Design Principles
//
// 1. **Stateless cycles**: Nothing is remembered between polls; the only index
//    lives in the zone itself as alias TXT markers
// 2. **Injected collaborators**: The engine owns its source, resolver and
//    updater for its whole lifetime, no globals
// 3. **Library-First**: The daemon is a thin wrapper around this crate

pub mod alias;
pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod traits;
pub mod transaction;

// Re-export core types for convenience
pub use config::SyncConfig;
pub use engine::{CycleSummary, EngineEvent, Reconciler};
pub use error::{Error, Result};
pub use model::{Address, Container, ContainerStatus};
pub use traits::{ContainerSource, TxtResolver, ZoneUpdater};
pub use transaction::{Directive, RecordData, UpdateTransaction};
