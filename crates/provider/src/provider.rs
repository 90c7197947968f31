use crate::config::ProviderConfig;
use crate::entity::{AuthDataSource, AuthResource};
use crate::error::{ProviderError, Result};
use crate::resource::{DataSource, Resource};
use crate::schema::ProviderSchema;
use crate::wait_online::{WaitOnlineDataSource, WaitOnlineResource};
use monclient::{ClusterConfig, ClusterLibrary, ConnectionOptions};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// A configured provider instance
///
/// Owns the one [`ClusterConfig`] every resource and data source of this
/// instance shares. Configuring does not connect; the first operation that
/// needs the cluster does.
#[derive(Debug, Clone)]
pub struct Provider {
    cluster: Arc<ClusterConfig>,
}

impl Provider {
    pub const NAME: &'static str = "ceph";

    pub fn configure(config: &ProviderConfig, library: Arc<dyn ClusterLibrary>) -> Result<Self> {
        debug!(?config, "configuring provider");
        let options = ConnectionOptions::try_from(config).map_err(ProviderError::Config)?;
        Ok(Self {
            cluster: Arc::new(ClusterConfig::new(options, library)),
        })
    }

    pub fn schema() -> ProviderSchema {
        ProviderSchema {
            provider: ProviderConfig::schema(),
            resources: BTreeMap::from([
                (AuthResource::TYPE_NAME, AuthResource::schema()),
                (WaitOnlineResource::TYPE_NAME, WaitOnlineResource::schema()),
            ]),
            data_sources: BTreeMap::from([
                (AuthDataSource::TYPE_NAME, AuthDataSource::schema()),
                (WaitOnlineDataSource::TYPE_NAME, WaitOnlineDataSource::schema()),
            ]),
        }
    }

    pub fn cluster(&self) -> &Arc<ClusterConfig> {
        &self.cluster
    }

    pub fn auth_resource(&self) -> AuthResource {
        AuthResource::new(Arc::clone(&self.cluster))
    }

    pub fn auth_data_source(&self) -> AuthDataSource {
        AuthDataSource::new(Arc::clone(&self.cluster))
    }

    pub fn wait_online_resource(&self) -> WaitOnlineResource {
        WaitOnlineResource::new(Arc::clone(&self.cluster))
    }

    pub fn wait_online_data_source(&self) -> WaitOnlineDataSource {
        WaitOnlineDataSource::new(Arc::clone(&self.cluster))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_names() {
        let schema = Provider::schema();
        assert_eq!(
            schema.resources.keys().copied().collect::<Vec<_>>(),
            ["ceph_auth", "ceph_wait_online"]
        );
        assert_eq!(
            schema.data_sources.keys().copied().collect::<Vec<_>>(),
            ["ceph_auth", "ceph_wait_online"]
        );
        assert_eq!(schema.provider.attributes["cluster"].default, Some("ceph"));
        assert_eq!(
            schema.resources["ceph_wait_online"].create_timeout_secs,
            Some(3600)
        );
    }
}
