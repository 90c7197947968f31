//! `ceph_wait_online`: block until the cluster accepts a connection
//!
//! The data source waits on every read. The resource waits once, at
//! creation, and keeps a label as its id; read and delete never touch the
//! cluster.

use crate::error::{ProviderError, Result};
use crate::resource::{DataSource, Plan, Resource};
use crate::schema::{Attribute, AttributeType, Schema};
use async_trait::async_trait;
use monclient::{ClusterConfig, WaitOptions, DEFAULT_WAIT_TIMEOUT};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

pub const TYPE_NAME: &str = "ceph_wait_online";

/// Operator input for the `ceph_wait_online` resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitOnlineConfig {
    /// Any unique label, typically the cluster name
    pub cluster_name: String,
    /// Create timeout and poll interval
    #[serde(skip)]
    pub wait: WaitOptions,
}

impl WaitOnlineConfig {
    pub fn new(cluster_name: impl Into<String>) -> Self {
        Self {
            cluster_name: cluster_name.into(),
            wait: WaitOptions::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitOnlineState {
    pub id: String,
    pub cluster_name: String,
    pub online: bool,
}

#[derive(Debug, Clone)]
pub struct WaitOnlineResource {
    cluster: Arc<ClusterConfig>,
}

impl WaitOnlineResource {
    pub fn new(cluster: Arc<ClusterConfig>) -> Self {
        Self { cluster }
    }
}

#[async_trait]
impl Resource for WaitOnlineResource {
    type Config = WaitOnlineConfig;
    type State = WaitOnlineState;

    const TYPE_NAME: &'static str = TYPE_NAME;

    fn schema() -> Schema {
        Schema::new(Some(
            "This dummy resource is waiting to Ceph to be online at creation time for up to 1 hour. \
             This is useful for example on a boostrap procedure.",
        ))
        .attribute(
            "cluster_name",
            Attribute::required(
                AttributeType::String,
                "That's a workaround to actually have an id, set this to something unique (i.e.: the cluster name).",
            )
            .force_new(),
        )
        .attribute(
            "online",
            Attribute::computed(
                AttributeType::Bool,
                "If the cluster is online, only checked at creation time (always true)",
            ),
        )
        .create_timeout(DEFAULT_WAIT_TIMEOUT)
    }

    fn plan(prior: &WaitOnlineState, desired: &WaitOnlineConfig) -> Plan {
        if prior.cluster_name != desired.cluster_name {
            Plan::Replace
        } else {
            Plan::NoOp
        }
    }

    async fn create(&self, config: &WaitOnlineConfig) -> Result<WaitOnlineState> {
        debug!(cluster_name = %config.cluster_name, "starting ceph_wait_online");
        self.cluster
            .wait_for_online(&config.wait)
            .await
            .map_err(ProviderError::WaitOnline)?;

        info!(cluster_name = %config.cluster_name, "ceph is online");
        Ok(WaitOnlineState {
            id: config.cluster_name.clone(),
            cluster_name: config.cluster_name.clone(),
            online: true,
        })
    }

    async fn read(&self, state: &WaitOnlineState) -> Result<Option<WaitOnlineState>> {
        Ok(Some(WaitOnlineState {
            cluster_name: state.id.clone(),
            ..state.clone()
        }))
    }

    async fn delete(&self, _state: &WaitOnlineState) -> Result<()> {
        Ok(())
    }
}

/// Result of the `ceph_wait_online` data source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnlineStatus {
    pub online: bool,
}

#[derive(Debug, Clone)]
pub struct WaitOnlineDataSource {
    cluster: Arc<ClusterConfig>,
}

impl WaitOnlineDataSource {
    pub fn new(cluster: Arc<ClusterConfig>) -> Self {
        Self { cluster }
    }
}

#[async_trait]
impl DataSource for WaitOnlineDataSource {
    type Config = WaitOptions;
    type State = OnlineStatus;

    const TYPE_NAME: &'static str = TYPE_NAME;

    fn schema() -> Schema {
        Schema::new(Some(
            "This dummy resource is waiting to Ceph to be online for up to 1 hour. \
             This is useful for example on a boostrap procedure.",
        ))
    }

    async fn read(&self, wait: &WaitOptions) -> Result<OnlineStatus> {
        self.cluster
            .wait_for_online(wait)
            .await
            .map_err(ProviderError::WaitOnline)?;
        Ok(OnlineStatus { online: true })
    }
}
