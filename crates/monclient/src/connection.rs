//! Cluster connection
//!
//! Builds one administrative connection from [`ConnectionOptions`]. A
//! `Connection` is only ever handed out connected: any failure on the way
//! drops the half-built handle, which shuts it down.

use crate::error::{MonClientError, Result};
use crate::library::{ClusterHandle, ClusterLibrary};
use crate::options::{ConnectionOptions, Identity};
use async_trait::async_trait;
use auth::{AuthClient, CommandResult, CommandTransport};
use bytes::Bytes;
use std::io::Write;
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Prefix of the temporary files inline keyrings are written to
const KEYRING_FILE_PREFIX: &str = "ceph-keyring-";

/// A connected administrative session
#[derive(Debug)]
pub struct Connection {
    handle: Box<dyn ClusterHandle>,
    identity: Identity,
}

impl Connection {
    /// Create, configure and connect a new handle.
    ///
    /// Steps, in order: create the handle for the selected identity, load
    /// ceph.conf (explicit path or default location), override `mon_host`,
    /// `key` and `keyring`, connect. An inline keyring is written to a
    /// private temporary file that is removed when this function returns.
    pub async fn establish(
        options: &ConnectionOptions,
        library: &dyn ClusterLibrary,
    ) -> Result<Self> {
        options.check_keyring_requirements()?;

        let identity = options.identity();
        debug!(?identity, "creating cluster handle");
        let handle = library.create(&identity)?;

        // From here on dropping `conn` shuts the handle down
        let mut conn = Connection { handle, identity };

        match options.config_path() {
            Some(path) => {
                debug!(path = %path.display(), "reading ceph config");
                conn.handle.read_config_file(path)?;
            }
            None => {
                debug!("reading ceph config from the default location");
                conn.handle.read_default_config()?;
            }
        }

        if !options.mon_host().is_empty() {
            conn.handle
                .set_option("mon_host", &options.mon_host().join(","))?;
        }
        if let Some(key) = options.key() {
            conn.handle.set_option("key", key)?;
        }

        // Must outlive connect(): the library reads the keyring while connecting
        let _keyring_file = match options.keyring() {
            Some(keyring) => {
                let file = write_temp_keyring(keyring)?;
                let path = file.path().to_string_lossy().into_owned();
                conn.handle.set_option("keyring", &path)?;
                Some(file)
            }
            None => None,
        };

        conn.handle.connect().await?;
        info!(identity = ?conn.identity, "connected to ceph cluster");

        Ok(conn)
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Send a raw JSON monitor command
    pub async fn mon_command(&self, cmd: &str, inbl: Bytes) -> Result<CommandResult> {
        self.handle.mon_command(cmd, inbl).await
    }

    /// `auth` command client over this connection
    pub fn auth(&self) -> AuthClient<'_, Self> {
        AuthClient::new(self)
    }
}

#[async_trait]
impl CommandTransport for Connection {
    async fn mon_command(&self, cmd: &str, inbl: Bytes) -> auth::Result<CommandResult> {
        Ok(self.handle.mon_command(cmd, inbl).await?)
    }
}

/// Write keyring text to a fresh 0600 temporary file
fn write_temp_keyring(keyring: &str) -> Result<NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix(KEYRING_FILE_PREFIX)
        .tempfile()
        .map_err(MonClientError::TempKeyring)?;
    file.write_all(keyring.as_bytes())
        .and_then(|_| file.flush())
        .map_err(MonClientError::TempKeyring)?;
    debug!(path = %file.path().display(), "wrote temporary keyring");
    Ok(file)
}
