//! Connection options
//!
//! `ConnectionOptions` is the validated, strongly typed form of the
//! connection settings. Every field is optional; an inline keyring needs a
//! monitor host list because there is no config file to find monitors in.

use crate::error::{MonClientError, Result};
use auth::{CryptoKey, EntityName, Keyring};
use std::fmt;
use std::path::{Path, PathBuf};

/// How the cluster handle is created, chosen from the identity fields set
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    /// Named entity on a named cluster
    ClusterAndEntity { cluster: String, entity: EntityName },
    /// Named entity, default cluster
    Entity(EntityName),
    /// Library defaults for both
    Default,
}

/// Validated connection settings
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ConnectionOptions {
    config_path: Option<PathBuf>,
    entity: Option<EntityName>,
    cluster: Option<String>,
    keyring: Option<String>,
    key: Option<String>,
    mon_host: Vec<String>,
}

impl ConnectionOptions {
    pub fn builder() -> ConnectionOptionsBuilder {
        ConnectionOptionsBuilder::default()
    }

    /// Explicit ceph.conf path; `None` means the platform default search
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    pub fn entity(&self) -> Option<&EntityName> {
        self.entity.as_ref()
    }

    pub fn cluster(&self) -> Option<&str> {
        self.cluster.as_deref()
    }

    /// Inline keyring text (not a path)
    pub fn keyring(&self) -> Option<&str> {
        self.keyring.as_deref()
    }

    /// Inline base64 key
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn mon_host(&self) -> &[String] {
        &self.mon_host
    }

    /// The handle construction strategy these options select
    pub fn identity(&self) -> Identity {
        match (&self.entity, &self.cluster) {
            (Some(entity), Some(cluster)) => Identity::ClusterAndEntity {
                cluster: cluster.clone(),
                entity: entity.clone(),
            },
            (Some(entity), None) => Identity::Entity(entity.clone()),
            (None, _) => Identity::Default,
        }
    }

    /// Checks that hold for any options, however they were built
    pub(crate) fn check_keyring_requirements(&self) -> Result<()> {
        if self.keyring.is_some() && self.mon_host.is_empty() {
            return Err(MonClientError::InvalidConfig(
                "keyring specified while mon_host is not".to_string(),
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for ConnectionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionOptions")
            .field("config_path", &self.config_path)
            .field("entity", &self.entity.as_ref().map(ToString::to_string))
            .field("cluster", &self.cluster)
            .field("keyring", &self.keyring.as_ref().map(|_| "<redacted>"))
            .field("key", &self.key.as_ref().map(|_| "<redacted>"))
            .field("mon_host", &self.mon_host)
            .finish()
    }
}

/// Builder for [`ConnectionOptions`]; empty strings count as unset
#[derive(Debug, Clone, Default)]
pub struct ConnectionOptionsBuilder {
    config_path: Option<PathBuf>,
    entity: Option<String>,
    cluster: Option<String>,
    keyring: Option<String>,
    key: Option<String>,
    mon_host: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl ConnectionOptionsBuilder {
    pub fn config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    pub fn entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    pub fn cluster(mut self, cluster: impl Into<String>) -> Self {
        self.cluster = Some(cluster.into());
        self
    }

    pub fn keyring(mut self, keyring: impl Into<String>) -> Self {
        self.keyring = Some(keyring.into());
        self
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Monitor hosts in any form `mon host` accepts
    pub fn mon_host(mut self, mon_host: impl Into<String>) -> Self {
        self.mon_host = Some(mon_host.into());
        self
    }

    pub fn build(self) -> Result<ConnectionOptions> {
        let config_path = self
            .config_path
            .filter(|p| !p.as_os_str().is_empty());

        let entity = non_empty(self.entity)
            .map(|e| e.trim().parse::<EntityName>())
            .transpose()
            .map_err(|e| MonClientError::InvalidConfig(e.to_string()))?;

        let cluster = non_empty(self.cluster).map(|c| c.trim().to_string());
        if let Some(cluster) = &cluster {
            if cluster.contains(|c: char| c == '/' || c.is_whitespace()) {
                return Err(MonClientError::InvalidConfig(format!(
                    "invalid cluster name '{}'",
                    cluster
                )));
            }
        }

        let mon_host = match non_empty(self.mon_host) {
            Some(mon_host) => {
                cephconfig::parse_mon_host(&mon_host).map_err(|e| {
                    MonClientError::InvalidOption {
                        name: "mon_host".to_string(),
                        message: e.to_string(),
                    }
                })?
            }
            None => Vec::new(),
        };

        let key = non_empty(self.key).map(|k| k.trim().to_string());
        if let Some(key) = &key {
            CryptoKey::from_base64(key).map_err(|e| MonClientError::InvalidOption {
                name: "key".to_string(),
                message: e.to_string(),
            })?;
        }

        let keyring = non_empty(self.keyring);

        let options = ConnectionOptions {
            config_path,
            entity,
            cluster,
            keyring,
            key,
            mon_host,
        };
        options.check_keyring_requirements()?;

        if let Some(text) = &options.keyring {
            let parsed = Keyring::from_string(text).map_err(|e| MonClientError::InvalidOption {
                name: "keyring".to_string(),
                message: e.to_string(),
            })?;
            if parsed.is_empty() {
                return Err(MonClientError::InvalidOption {
                    name: "keyring".to_string(),
                    message: "keyring holds no entities".to_string(),
                });
            }
        }

        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "AQD8J8JoSpspNhAAU49nK6K8fO4MgTYFnrk+HQ==";

    #[test]
    fn test_empty_options_use_defaults() {
        let options = ConnectionOptions::builder().build().unwrap();
        assert_eq!(options.identity(), Identity::Default);
        assert!(options.config_path().is_none());
        assert!(options.mon_host().is_empty());
    }

    #[test]
    fn test_identity_selection() {
        let options = ConnectionOptions::builder()
            .entity("client.admin")
            .cluster("prod")
            .build()
            .unwrap();
        assert_eq!(
            options.identity(),
            Identity::ClusterAndEntity {
                cluster: "prod".to_string(),
                entity: "client.admin".parse().unwrap(),
            }
        );

        let options = ConnectionOptions::builder()
            .entity("client.admin")
            .build()
            .unwrap();
        assert_eq!(
            options.identity(),
            Identity::Entity("client.admin".parse().unwrap())
        );

        let options = ConnectionOptions::builder().cluster("prod").build().unwrap();
        assert_eq!(options.identity(), Identity::Default);
    }

    #[test]
    fn test_empty_strings_are_unset() {
        let options = ConnectionOptions::builder()
            .entity("")
            .cluster(" ")
            .mon_host("")
            .key("")
            .keyring("")
            .config_path("")
            .build()
            .unwrap();
        assert_eq!(options, ConnectionOptions::default());
    }

    #[test]
    fn test_keyring_requires_mon_host() {
        let keyring = format!("[client.admin]\n\tkey = {}\n", KEY);
        let err = ConnectionOptions::builder()
            .keyring(keyring.clone())
            .build()
            .unwrap_err();
        assert!(matches!(err, MonClientError::InvalidConfig(_)));
        assert!(err.to_string().contains("mon_host"));

        let options = ConnectionOptions::builder()
            .keyring(keyring)
            .mon_host("10.0.0.1:6789")
            .build()
            .unwrap();
        assert_eq!(options.mon_host(), ["10.0.0.1:6789".to_string()]);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            ConnectionOptions::builder().entity("admin").build(),
            Err(MonClientError::InvalidConfig(_))
        ));
        assert!(matches!(
            ConnectionOptions::builder().cluster("a/b").build(),
            Err(MonClientError::InvalidConfig(_))
        ));
        assert!(matches!(
            ConnectionOptions::builder().mon_host("10.0.0.1:bogus").build(),
            Err(MonClientError::InvalidOption { ref name, .. }) if name == "mon_host"
        ));
        assert!(matches!(
            ConnectionOptions::builder().key("not a key").build(),
            Err(MonClientError::InvalidOption { ref name, .. }) if name == "key"
        ));
        assert!(matches!(
            ConnectionOptions::builder()
                .keyring("# nothing here\n")
                .mon_host("10.0.0.1")
                .build(),
            Err(MonClientError::InvalidOption { ref name, .. }) if name == "keyring"
        ));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let options = ConnectionOptions::builder()
            .key(KEY)
            .keyring(format!("[client.admin]\n\tkey = {}\n", KEY))
            .mon_host("10.0.0.1")
            .build()
            .unwrap();
        let debug = format!("{:?}", options);
        assert!(!debug.contains(KEY));
        assert!(debug.contains("<redacted>"));
    }
}
