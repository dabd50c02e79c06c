// # lxc Container Source
//
// This crate lists LXD containers through the `lxc` command line client.
//
// ## Architecture
//
// Each call runs `lxc list type=container --format json` and maps the JSON
// it prints into the core model. The client talks to the local LXD daemon
// (or the default remote) with whatever credentials it is configured with.
//
// ## JSON Shape
//
// ```json
// [
//   {
//     "name": "web_1",
//     "status": "Running",
//     "state": {
//       "network": {
//         "eth0": {
//           "addresses": [
//             { "family": "inet", "address": "10.0.0.5", "netmask": "24", "scope": "global" }
//           ]
//         }
//       }
//     }
//   }
// ]
// ```
//
// Stopped containers report `"state": { "network": null }` (or no state).

use async_trait::async_trait;
use lxd_ddns_core::traits::ContainerSource;
use lxd_ddns_core::{Address, Container, ContainerStatus, Error, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Default client binary
pub const DEFAULT_LXC_COMMAND: &str = "lxc";

/// Container source backed by the `lxc` CLI
#[derive(Debug, Clone)]
pub struct LxcContainerSource {
    /// Client binary to run
    command: String,
}

impl LxcContainerSource {
    /// Create a source running `command` (usually `lxc`)
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl Default for LxcContainerSource {
    fn default() -> Self {
        Self::new(DEFAULT_LXC_COMMAND)
    }
}

#[async_trait]
impl ContainerSource for LxcContainerSource {
    async fn list_containers(&self) -> Result<Vec<Container>> {
        debug!("Running {} list", self.command);

        let output = Command::new(&self.command)
            .args(["list", "type=container", "--format", "json"])
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                Error::container_source(format!("failed to run {}: {}", self.command, e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::container_source(format!(
                "{} list exited with {}: {}",
                self.command,
                output.status,
                stderr.trim()
            )));
        }

        parse_container_list(&output.stdout)
    }

    fn source_name(&self) -> &'static str {
        "lxc"
    }
}

#[derive(Debug, Deserialize)]
struct LxcInstance {
    name: String,
    status: String,
    #[serde(default)]
    state: Option<LxcState>,
}

#[derive(Debug, Deserialize)]
struct LxcState {
    #[serde(default)]
    network: Option<HashMap<String, LxcInterface>>,
}

#[derive(Debug, Deserialize)]
struct LxcInterface {
    #[serde(default)]
    addresses: Vec<LxcAddress>,
}

#[derive(Debug, Deserialize)]
struct LxcAddress {
    family: String,
    address: String,
    #[serde(default)]
    scope: String,
}

/// Map `lxc list --format json` output into containers, keeping its order
///
/// An entry without a name is rejected: it cannot be turned into a record.
pub fn parse_container_list(json: &[u8]) -> Result<Vec<Container>> {
    let instances: Vec<LxcInstance> = serde_json::from_slice(json)?;

    instances
        .into_iter()
        .map(|instance| {
            if instance.name.trim().is_empty() {
                return Err(Error::invalid_input(format!(
                    "container without a name in status {}",
                    instance.status
                )));
            }

            let network = instance
                .state
                .and_then(|state| state.network)
                .unwrap_or_default()
                .into_iter()
                .map(|(interface, settings)| {
                    let addresses = settings
                        .addresses
                        .into_iter()
                        .map(|a| Address::new(a.scope, a.family, a.address))
                        .collect();
                    (interface, addresses)
                })
                .collect();

            Ok(Container {
                name: instance.name,
                status: ContainerStatus::from(instance.status.as_str()),
                network,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"[
        {
            "name": "web_1",
            "status": "Running",
            "type": "container",
            "state": {
                "status": "Running",
                "network": {
                    "eth0": {
                        "addresses": [
                            { "family": "inet", "address": "10.0.0.5", "netmask": "24", "scope": "global" },
                            { "family": "inet6", "address": "fe80::216:3eff:fe00:1", "netmask": "64", "scope": "link" }
                        ],
                        "state": "up"
                    },
                    "lo": {
                        "addresses": [
                            { "family": "inet", "address": "127.0.0.1", "netmask": "8", "scope": "local" }
                        ]
                    }
                }
            }
        },
        { "name": "db1", "status": "Stopped", "type": "container", "state": { "status": "Stopped", "network": null } },
        { "name": "build", "status": "Frozen", "type": "container" }
    ]"#;

    #[test]
    fn parses_running_stopped_and_other() {
        let containers = parse_container_list(SAMPLE.as_bytes()).unwrap();
        assert_eq!(containers.len(), 3);

        let web = &containers[0];
        assert_eq!(web.name, "web_1");
        assert_eq!(web.status, ContainerStatus::Running);
        let eth0 = web.addresses("eth0").unwrap();
        assert_eq!(eth0.len(), 2);
        assert_eq!(eth0[0], Address::new("global", "inet", "10.0.0.5"));
        assert_eq!(eth0[1].family, "inet6");
        assert!(web.addresses("lo").is_some());

        assert_eq!(containers[1].name, "db1");
        assert_eq!(containers[1].status, ContainerStatus::Stopped);
        assert!(containers[1].network.is_empty());

        assert_eq!(
            containers[2].status,
            ContainerStatus::Other("Frozen".to_string())
        );
    }

    #[test]
    fn empty_list() {
        assert!(parse_container_list(b"[]").unwrap().is_empty());
    }

    #[test]
    fn malformed_output_is_an_error() {
        assert!(matches!(
            parse_container_list(b"Error: not found"),
            Err(Error::Json(_))
        ));
    }

    #[test]
    fn nameless_entry_is_rejected() {
        let json = br#"[{ "name": "web_1", "status": "Running" }, { "name": "", "status": "Stopped" }]"#;
        assert!(matches!(
            parse_container_list(json),
            Err(Error::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn missing_binary_is_a_source_error() {
        let source = LxcContainerSource::new("/nonexistent/lxc-binary");
        assert!(matches!(
            source.list_containers().await,
            Err(Error::ContainerSource(_))
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn runs_the_configured_client() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();

        let ok = dir.path().join("lxc-ok");
        std::fs::write(
            &ok,
            "#!/bin/sh\n\
             [ \"$*\" = \"list type=container --format json\" ] || exit 3\n\
             echo '[{\"name\":\"db1\",\"status\":\"Stopped\"}]'\n",
        )
        .unwrap();
        std::fs::set_permissions(&ok, std::fs::Permissions::from_mode(0o755)).unwrap();

        let containers = LxcContainerSource::new(ok.to_string_lossy())
            .list_containers()
            .await
            .unwrap();
        assert_eq!(containers, vec![Container::stopped("db1")]);

        let failing = dir.path().join("lxc-fail");
        std::fs::write(&failing, "#!/bin/sh\necho 'Error: daemon down' >&2\nexit 1\n").unwrap();
        std::fs::set_permissions(&failing, std::fs::Permissions::from_mode(0o755)).unwrap();

        let err = LxcContainerSource::new(failing.to_string_lossy())
            .list_containers()
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ContainerSource(ref msg) if msg.contains("daemon down")));
    }
}
