//! Test doubles and common utilities for reconciliation contract tests
//!
//! Each double is cheap to clone and shares its recorded state through
//! `Arc`, so a test can hand one clone to the engine and inspect the other.

#![allow(dead_code)]

use lxd_ddns_core::error::{Error, Result};
use lxd_ddns_core::traits::{ContainerSource, TxtResolver, ZoneUpdater};
use lxd_ddns_core::{Address, Container, EngineEvent, SyncConfig, UpdateTransaction};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// A container source returning the same snapshot on every call
#[derive(Clone)]
pub struct StaticContainerSource {
    containers: Arc<Mutex<Vec<Container>>>,
    fail: bool,
    list_call_count: Arc<AtomicUsize>,
}

impl StaticContainerSource {
    pub fn new(containers: Vec<Container>) -> Self {
        Self {
            containers: Arc::new(Mutex::new(containers)),
            fail: false,
            list_call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A source whose every listing fails
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(Vec::new())
        }
    }

    /// Get the number of times list_containers() was called
    pub fn list_call_count(&self) -> usize {
        self.list_call_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ContainerSource for StaticContainerSource {
    async fn list_containers(&self) -> Result<Vec<Container>> {
        self.list_call_count.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::container_source("platform unreachable"));
        }
        Ok(self.containers.lock().unwrap().clone())
    }

    fn source_name(&self) -> &'static str {
        "static"
    }
}

/// Canned answer for one TXT query
#[derive(Clone)]
pub enum TxtAnswer {
    Records(Vec<String>),
    LookupFailure(String),
    Unexpected(String),
}

/// A resolver answering from a fixed table; unknown names have no records
#[derive(Clone, Default)]
pub struct ScriptedResolver {
    answers: Arc<Mutex<HashMap<String, TxtAnswer>>>,
    queries: Arc<Mutex<Vec<String>>>,
}

impl ScriptedResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `fqdn` with `answer`
    pub fn with_answer(self, fqdn: &str, answer: TxtAnswer) -> Self {
        self.answers
            .lock()
            .unwrap()
            .insert(fqdn.to_string(), answer);
        self
    }

    /// Names queried so far, in order
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl TxtResolver for ScriptedResolver {
    async fn lookup_txt(&self, fqdn: &str) -> Result<Vec<String>> {
        self.queries.lock().unwrap().push(fqdn.to_string());
        match self.answers.lock().unwrap().get(fqdn).cloned() {
            None => Ok(Vec::new()),
            Some(TxtAnswer::Records(records)) => Ok(records),
            Some(TxtAnswer::LookupFailure(msg)) => Err(Error::lookup(msg)),
            Some(TxtAnswer::Unexpected(msg)) => Err(Error::invalid_input(msg)),
        }
    }
}

/// A zone updater that records every transaction it is handed
#[derive(Clone, Default)]
pub struct RecordingUpdater {
    sent: Arc<Mutex<Vec<UpdateTransaction>>>,
}

impl RecordingUpdater {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transactions received so far
    pub fn transactions(&self) -> Vec<UpdateTransaction> {
        self.sent.lock().unwrap().clone()
    }

    /// Transactions received so far, as wire text
    pub fn rendered(&self) -> Vec<String> {
        self.transactions().iter().map(ToString::to_string).collect()
    }

    /// Get the number of transactions received
    pub fn send_call_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl ZoneUpdater for RecordingUpdater {
    async fn send(&self, transaction: &UpdateTransaction) -> Result<()> {
        self.sent.lock().unwrap().push(transaction.clone());
        Ok(())
    }

    fn updater_name(&self) -> &'static str {
        "recording"
    }
}

/// A zone updater whose transport is broken
pub struct BrokenUpdater;

#[async_trait::async_trait]
impl ZoneUpdater for BrokenUpdater {
    async fn send(&self, _transaction: &UpdateTransaction) -> Result<()> {
        Err(Error::zone_update("failed to spawn update tool"))
    }

    fn updater_name(&self) -> &'static str {
        "broken"
    }
}

/// Global IPv4 address
pub fn inet(addr: &str) -> Address {
    Address::new("global", "inet", addr)
}

/// Global IPv6 address
pub fn inet6(addr: &str) -> Address {
    Address::new("global", "inet6", addr)
}

/// Minimal configuration for example.com
pub fn minimal_config() -> SyncConfig {
    SyncConfig::new("example.com")
        .with_server("127.0.0.1")
        .with_interval_secs(0.01)
}

/// Drain every event emitted so far
pub fn drain_events(rx: &mut mpsc::Receiver<EngineEvent>) -> Vec<EngineEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
