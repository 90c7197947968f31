//! Provider configuration block

use crate::schema::{Attribute, AttributeType, Schema};
use cephconfig::DEFAULT_CLUSTER;
use monclient::{ConnectionOptions, MonClientError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// The `provider "ceph"` block as written by the operator
///
/// All fields are optional. `cluster` defaults to `ceph`; an inline
/// `keyring` needs `mon_host`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProviderConfig {
    pub config_path: Option<PathBuf>,
    pub entity: Option<String>,
    pub cluster: Option<String>,
    pub keyring: Option<String>,
    pub key: Option<String>,
    pub mon_host: Option<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            config_path: None,
            entity: None,
            cluster: Some(DEFAULT_CLUSTER.to_string()),
            keyring: None,
            key: None,
            mon_host: None,
        }
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("config_path", &self.config_path)
            .field("entity", &self.entity)
            .field("cluster", &self.cluster)
            .field("keyring", &self.keyring.as_ref().map(|_| "<redacted>"))
            .field("key", &self.key.as_ref().map(|_| "<redacted>"))
            .field("mon_host", &self.mon_host)
            .finish()
    }
}

impl ProviderConfig {
    pub fn schema() -> Schema {
        use AttributeType::String;

        Schema::new(None)
            .attribute(
                "config_path",
                Attribute::optional(String, "Path to the ceph config"),
            )
            .attribute(
                "entity",
                Attribute::optional(
                    String,
                    "The cephx entity to use to connect to Ceph (i.e.: client.admin).",
                ),
            )
            .attribute(
                "cluster",
                Attribute::optional(String, "The name of the Ceph cluster to use.")
                    .with_default(DEFAULT_CLUSTER),
            )
            .attribute(
                "keyring",
                Attribute::optional(
                    String,
                    "The actual keyring (not a path to a file) to use to connect to Ceph.",
                )
                .sensitive(),
            )
            .attribute(
                "key",
                Attribute::optional(
                    String,
                    "The actual key (not a path to a file) to use to connect to Ceph.",
                )
                .sensitive(),
            )
            .attribute(
                "mon_host",
                Attribute::optional(String, "List of mon to connect to Ceph."),
            )
    }
}

impl TryFrom<&ProviderConfig> for ConnectionOptions {
    type Error = MonClientError;

    fn try_from(config: &ProviderConfig) -> Result<Self, Self::Error> {
        let mut builder = ConnectionOptions::builder();
        if let Some(path) = &config.config_path {
            builder = builder.config_path(path);
        }
        if let Some(entity) = &config.entity {
            builder = builder.entity(entity);
        }
        if let Some(cluster) = &config.cluster {
            builder = builder.cluster(cluster);
        }
        if let Some(keyring) = &config.keyring {
            builder = builder.keyring(keyring);
        }
        if let Some(key) = &config.key {
            builder = builder.key(key);
        }
        if let Some(mon_host) = &config.mon_host {
            builder = builder.mon_host(mon_host);
        }
        builder.build()
    }
}
