//! Cluster connection management
//!
//! This crate turns a set of connection options into one live,
//! administrative cluster session and keeps it cached for the lifetime of a
//! provider instance. The session itself is provided by a cluster client
//! library behind the [`ClusterLibrary`] trait.
//!
//! # Example
//!
//! ```no_run
//! # #[cfg(feature = "librados")]
//! # async fn run() -> anyhow::Result<()> {
//! use monclient::{ClusterConfig, ConnectionOptions, Librados};
//! use std::sync::Arc;
//!
//! let options = ConnectionOptions::builder()
//!     .entity("client.admin")
//!     .mon_host("10.0.0.1:6789")
//!     .build()?;
//! let cluster = ClusterConfig::new(options, Arc::new(Librados));
//!
//! let conn = cluster.connection().await?;
//! let record = conn.auth().get(&"client.admin".parse()?).await?;
//! println!("{}", record.keyring());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod connection;
pub mod error;
pub mod library;
#[cfg(feature = "librados")]
pub mod librados;
#[cfg(any(test, feature = "testing"))]
pub mod mock;
pub mod online;
pub mod options;

pub use client::ClusterConfig;
pub use connection::Connection;
pub use error::{MonClientError, Result};
pub use library::{ClusterHandle, ClusterLibrary};
#[cfg(feature = "librados")]
pub use librados::Librados;
pub use online::{poll_until_ok, WaitOptions, DEFAULT_POLL_INTERVAL, DEFAULT_WAIT_TIMEOUT};
pub use options::{ConnectionOptions, ConnectionOptionsBuilder, Identity};
