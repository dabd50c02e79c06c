// # hickory TXT Resolver
//
// This crate answers the alias-marker TXT queries of the synchronizer with
// `hickory-resolver`, talking to one explicitly configured name server.
//
// ## Error Mapping
//
// - Empty answer (NOERROR/NODATA) → `Ok(vec![])`
// - Timeout, NXDOMAIN, SERVFAIL, refused, transport failures → `Error::Lookup`
// - A query name that is not a valid DNS name (label over 63 bytes, name
//   over 255 bytes, empty label) → `Error::Lookup`
//
// The engine absorbs `Error::Lookup`, so an unqueryable name only costs the
// alias and the container's own record is still removed.

use async_trait::async_trait;
use hickory_resolver::TokioAsyncResolver;
use hickory_resolver::config::{NameServerConfigGroup, ResolverConfig, ResolverOpts};
use hickory_resolver::error::{ResolveError, ResolveErrorKind};
use hickory_resolver::proto::op::ResponseCode;
use hickory_resolver::proto::rr::Name;
use lxd_ddns_core::traits::TxtResolver;
use lxd_ddns_core::{Error, Result};
use std::net::SocketAddr;
use std::time::Duration;
use tracing::debug;

/// Standard DNS port
pub const DNS_PORT: u16 = 53;

/// TXT resolver bound to a single name server
pub struct HickoryTxtResolver {
    resolver: TokioAsyncResolver,
    server: SocketAddr,
    timeout: Duration,
}

impl HickoryTxtResolver {
    /// Create a resolver that asks only `server`, giving up after `timeout`
    ///
    /// Answers are not cached: every lookup goes to the server.
    pub fn new(server: SocketAddr, timeout: Duration) -> Self {
        let name_servers = NameServerConfigGroup::from_ips_clear(&[server.ip()], server.port(), true);
        let config = ResolverConfig::from_parts(None, Vec::new(), name_servers);

        let mut opts = ResolverOpts::default();
        opts.timeout = timeout;
        opts.attempts = 1;
        opts.cache_size = 0;

        Self {
            resolver: TokioAsyncResolver::tokio(config, opts),
            server,
            timeout,
        }
    }

    /// Name server this resolver queries
    pub fn server(&self) -> SocketAddr {
        self.server
    }
}

impl std::fmt::Debug for HickoryTxtResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HickoryTxtResolver")
            .field("server", &self.server)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[async_trait]
impl TxtResolver for HickoryTxtResolver {
    async fn lookup_txt(&self, fqdn: &str) -> Result<Vec<String>> {
        let name = Name::from_ascii(fqdn)
            .map_err(|e| Error::lookup(format!("cannot query {fqdn:?}: {e}")))?;

        debug!("Querying {} for TXT {}", self.server, name);

        let lookup = match tokio::time::timeout(self.timeout, self.resolver.txt_lookup(name)).await
        {
            Ok(Ok(lookup)) => lookup,
            Ok(Err(e)) => return classify(fqdn, e),
            Err(_) => {
                return Err(Error::lookup(format!(
                    "TXT query for {fqdn} timed out after {:?}",
                    self.timeout
                )));
            }
        };

        Ok(lookup
            .iter()
            .map(|txt| {
                txt.txt_data()
                    .iter()
                    .map(|chunk| String::from_utf8_lossy(chunk))
                    .collect::<String>()
            })
            .collect())
    }
}

/// Map a resolver failure: an empty NOERROR answer is not a failure
fn classify(fqdn: &str, err: ResolveError) -> Result<Vec<String>> {
    match err.kind() {
        ResolveErrorKind::NoRecordsFound { response_code, .. }
            if *response_code == ResponseCode::NoError =>
        {
            debug!("No TXT records at {}", fqdn);
            Ok(Vec::new())
        }
        _ => Err(Error::lookup(format!("TXT query for {fqdn} failed: {err}"))),
    }
}
