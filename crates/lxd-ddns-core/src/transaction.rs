//! Dynamic update transactions
//!
//! A transaction is what the update tool reads on its input: a header naming
//! the server and zone, a run of `update delete` / `update add` lines, and a
//! terminating `send`. Modelling it as data keeps the wire text independent of
//! how it gets delivered.
//!
//! ```text
//! server 127.0.0.1
//! zone example.com.
//! update delete web_1.example.com
//! update add web_1.example.com 60 A 10.0.0.5
//! send
//! ```

use crate::alias;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;

/// TTL of a container's A record
pub const HOST_TTL: u32 = 60;

/// TTL of alias CNAME and marker TXT records
pub const ALIAS_TTL: u32 = 600;

/// Record payload of an `update add` line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordData {
    A(Ipv4Addr),
    Cname(String),
    Txt(String),
}

impl fmt::Display for RecordData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordData::A(ip) => write!(f, "A {ip}"),
            RecordData::Cname(target) => write!(f, "CNAME {target}"),
            RecordData::Txt(text) => write!(f, "TXT {text}"),
        }
    }
}

/// One line of an update transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Directive {
    /// Delete every record at `owner`
    Delete { owner: String },
    /// Add one record at `owner`
    Add {
        owner: String,
        ttl: u32,
        data: RecordData,
    },
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Directive::Delete { owner } => write!(f, "update delete {owner}"),
            Directive::Add { owner, ttl, data } => write!(f, "update add {owner} {ttl} {data}"),
        }
    }
}

/// A complete update transaction for one container action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateTransaction {
    /// DNS server receiving the update
    pub server: String,
    /// Zone being updated, without the trailing dot
    pub zone: String,
    /// Ordered directives
    pub directives: Vec<Directive>,
}

impl UpdateTransaction {
    /// Create an empty transaction
    pub fn new(server: impl Into<String>, zone: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            zone: zone.into(),
            directives: Vec::new(),
        }
    }

    /// Append `update delete <owner>`
    pub fn delete(&mut self, owner: impl Into<String>) -> &mut Self {
        self.directives.push(Directive::Delete {
            owner: owner.into(),
        });
        self
    }

    /// Append `update add <owner> <ttl> <data>`
    pub fn add(&mut self, owner: impl Into<String>, ttl: u32, data: RecordData) -> &mut Self {
        self.directives.push(Directive::Add {
            owner: owner.into(),
            ttl,
            data,
        });
        self
    }

    /// Replace the A record of `name` with `ip`
    pub fn set_host(&mut self, name: &str, domain: &str, ip: Ipv4Addr) -> &mut Self {
        let owner = owner_name(name, domain);
        self.delete(owner.clone())
            .add(owner, HOST_TTL, RecordData::A(ip))
    }

    /// Point `alias` at `name` and leave a marker at `name` for later cleanup
    pub fn set_alias(&mut self, alias: &str, domain: &str, name: &str) -> &mut Self {
        let alias_owner = owner_name(alias, domain);
        let canonical = owner_name(name, domain);
        self.delete(alias_owner.clone())
            .add(
                alias_owner,
                ALIAS_TTL,
                RecordData::Cname(format!("{canonical}.")),
            )
            .add(canonical, ALIAS_TTL, RecordData::Txt(alias::marker(alias)))
    }

    /// Delete every record at `name`
    pub fn remove_name(&mut self, name: &str, domain: &str) -> &mut Self {
        self.delete(owner_name(name, domain))
    }
}

impl fmt::Display for UpdateTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "server {}", self.server)?;
        writeln!(f, "zone {}.", self.zone)?;
        for directive in &self.directives {
            writeln!(f, "{directive}")?;
        }
        writeln!(f, "send")
    }
}

/// `<name>.<domain>` as written in update directives
pub fn owner_name(name: &str, domain: &str) -> String {
    format!("{name}.{domain}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_update_text() {
        let mut tx = UpdateTransaction::new("127.0.0.1", "example.com");
        tx.set_host("db1", "example.com", Ipv4Addr::new(10, 0, 0, 7));

        assert_eq!(
            tx.to_string(),
            "server 127.0.0.1\n\
             zone example.com.\n\
             update delete db1.example.com\n\
             update add db1.example.com 60 A 10.0.0.7\n\
             send\n"
        );
    }

    #[test]
    fn alias_block_follows_host_update() {
        let mut tx = UpdateTransaction::new("ns1.example.com", "example.com");
        tx.set_host("web_1", "example.com", Ipv4Addr::new(10, 0, 0, 5))
            .set_alias("web-1", "example.com", "web_1");

        assert_eq!(
            tx.to_string(),
            "server ns1.example.com\n\
             zone example.com.\n\
             update delete web_1.example.com\n\
             update add web_1.example.com 60 A 10.0.0.5\n\
             update delete web-1.example.com\n\
             update add web-1.example.com 600 CNAME web_1.example.com.\n\
             update add web_1.example.com 600 TXT lxdDDNS-alias:web-1:\n\
             send\n"
        );
    }

    #[test]
    fn zone_may_differ_from_domain() {
        let mut tx = UpdateTransaction::new("127.0.0.1", "example.com");
        tx.remove_name("db1", "lxd.example.com");

        assert_eq!(
            tx.to_string(),
            "server 127.0.0.1\nzone example.com.\nupdate delete db1.lxd.example.com\nsend\n"
        );
    }

    #[test]
    fn empty_transaction_still_has_header_and_send() {
        let tx = UpdateTransaction::new("127.0.0.1", "example.com");
        assert!(tx.directives.is_empty());
        assert_eq!(tx.to_string(), "server 127.0.0.1\nzone example.com.\nsend\n");
    }
}
