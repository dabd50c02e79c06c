// # TXT Resolver Trait
//
// Defines the interface used to discover alias markers before a container's
// records are removed.
//
// ## Implementations
//
// - hickory: `lxd-ddns-resolver-hickory` crate

use async_trait::async_trait;

/// Trait for DNS clients able to answer TXT queries
#[async_trait]
pub trait TxtResolver: Send + Sync {
    /// Look up the TXT records at `fqdn`
    ///
    /// `fqdn` is absolute (ends with a dot). Each returned string is one TXT
    /// record with its character-strings concatenated.
    ///
    /// # Returns
    ///
    /// - `Ok(vec![])`: The name exists but carries no TXT records
    /// - `Err(Error::Lookup)`: Resolver-specific failure such as a timeout,
    ///   SERVFAIL, NXDOMAIN or a name too long to query. The engine logs
    ///   these and carries on.
    /// - `Err(_)`: Anything else. The engine treats it as fatal.
    async fn lookup_txt(&self, fqdn: &str) -> Result<Vec<String>, crate::Error>;
}
