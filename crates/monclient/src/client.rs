//! Per-provider cluster configuration
//!
//! `ClusterConfig` owns the connection options, the cluster library, and
//! at most one live connection. The connection is built on first use and
//! shared by every later operation; failed builds are not cached.

use crate::connection::Connection;
use crate::error::Result;
use crate::library::ClusterLibrary;
use crate::online::{poll_until_ok, WaitOptions};
use crate::options::ConnectionOptions;
use std::fmt;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::debug;

pub struct ClusterConfig {
    options: ConnectionOptions,
    library: Arc<dyn ClusterLibrary>,
    connection: OnceCell<Arc<Connection>>,
}

impl ClusterConfig {
    pub fn new(options: ConnectionOptions, library: Arc<dyn ClusterLibrary>) -> Self {
        Self {
            options,
            library,
            connection: OnceCell::new(),
        }
    }

    pub fn options(&self) -> &ConnectionOptions {
        &self.options
    }

    /// The cached connection, building it first if needed
    pub async fn connection(&self) -> Result<Arc<Connection>> {
        if let Some(conn) = self.connection.get() {
            return Ok(Arc::clone(conn));
        }

        let conn = self
            .connection
            .get_or_try_init(|| async {
                Connection::establish(&self.options, self.library.as_ref())
                    .await
                    .map(Arc::new)
            })
            .await?;
        debug!("cached cluster connection");
        Ok(Arc::clone(conn))
    }

    /// The cached connection, if one has been built
    pub fn cached_connection(&self) -> Option<Arc<Connection>> {
        self.connection.get().cloned()
    }

    /// Retry [`connection`](Self::connection) until it succeeds or `wait`
    /// runs out.
    pub async fn wait_for_online(&self, wait: &WaitOptions) -> Result<Arc<Connection>> {
        poll_until_ok("ceph cluster connection", wait, || self.connection()).await
    }
}

impl fmt::Debug for ClusterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClusterConfig")
            .field("options", &self.options)
            .field("library", &self.library)
            .field("connected", &self.connection.initialized())
            .finish()
    }
}
