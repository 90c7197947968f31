//! Cluster client library interface
//!
//! The monitor session itself (cephx, msgr, monmap hunting) is provided by a
//! cluster client library. These traits are the narrow surface the
//! connection builder needs from it: create a handle for an identity, load
//! configuration, override named options, connect, and run monitor commands.
//!
//! Implementations:
//! - `librados::Librados` (feature `librados`): the system librados
//! - `mock::MockCluster` (feature `testing`): an in-memory cluster

use crate::error::Result;
use crate::options::Identity;
use async_trait::async_trait;
use auth::CommandResult;
use bytes::Bytes;
use std::fmt::Debug;
use std::path::Path;

/// Factory for cluster handles
pub trait ClusterLibrary: Send + Sync + Debug {
    /// Create an unconnected handle for `identity`.
    ///
    /// Errors are reported as `MonClientError::Library`.
    fn create(&self, identity: &Identity) -> Result<Box<dyn ClusterHandle>>;
}

/// An administrative session with the cluster
///
/// Dropping a handle tears it down, whether or not it ever connected.
#[async_trait]
pub trait ClusterHandle: Send + Sync + Debug {
    /// Load configuration from an explicit ceph.conf
    fn read_config_file(&mut self, path: &Path) -> Result<()>;

    /// Load configuration from the platform default location
    fn read_default_config(&mut self) -> Result<()>;

    /// Override a named option (`mon_host`, `key`, `keyring`, ...)
    fn set_option(&mut self, name: &str, value: &str) -> Result<()>;

    /// Perform the connect handshake
    async fn connect(&mut self) -> Result<()>;

    /// Send a JSON monitor command and wait for the reply
    async fn mon_command(&self, cmd: &str, inbl: Bytes) -> Result<CommandResult>;
}
