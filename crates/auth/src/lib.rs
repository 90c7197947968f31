//! Ceph `auth` command codec
//!
//! This crate speaks the monitor's `auth` administrative commands: it builds
//! the JSON request objects for `auth get`, `auth get-or-create`, `auth caps`
//! and `auth rm`, decodes the record arrays the monitor answers with, and
//! formats/parses keyring text.
//!
//! The transport is abstracted behind [`CommandTransport`]; the `monclient`
//! crate implements it for a live cluster connection.
//!
//! # Example
//!
//! ```rust,no_run
//! use auth::{AuthClient, Caps, CommandTransport, EntityName};
//!
//! async fn provision(conn: &impl CommandTransport) -> auth::Result<String> {
//!     let entity: EntityName = "client.demo".parse()?;
//!     let caps: Caps = [("mon", "allow r")].into_iter().collect();
//!     let record = AuthClient::new(conn).get_or_create(&entity, &caps).await?;
//!     Ok(record.keyring())
//! }
//! ```

pub mod client;
pub mod command;
pub mod error;
pub mod keyring;
pub mod types;

pub use client::{AuthClient, CommandResult, CommandTransport, ENOENT};
pub use command::{
    decode_records, decode_single_record, AuthCommand, PREFIX_CAPS, PREFIX_GET,
    PREFIX_GET_OR_CREATE, PREFIX_RM,
};
pub use error::{AuthError, Result};
pub use keyring::{format_keyring_entry, Keyring};
pub use types::{AuthRecord, Caps, CryptoKey, EntityName, CEPH_CRYPTO_AES, ENTITY_TYPES};
