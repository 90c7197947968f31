//! Ceph provider: cephx entities and cluster availability as resources
//!
//! [`Provider::configure`] turns a [`ProviderConfig`] into a provider
//! instance holding one lazily connected cluster handle. Resources and data
//! sources are obtained from it and implement [`Resource`] and
//! [`DataSource`].
//!
//! | type               | kind        | operations                          |
//! |--------------------|-------------|-------------------------------------|
//! | `ceph_auth`        | resource    | create, read, update, delete, import |
//! | `ceph_auth`        | data source | read                                |
//! | `ceph_wait_online` | resource    | create (blocks), read, delete       |
//! | `ceph_wait_online` | data source | read (blocks)                       |

pub mod config;
pub mod entity;
pub mod error;
mod provider;
pub mod resource;
pub mod schema;
pub mod wait_online;

pub use config::ProviderConfig;
pub use entity::{AuthConfig, AuthDataSource, AuthLookup, AuthResource, AuthState};
pub use error::{ProviderError, Result};
pub use provider::Provider;
pub use resource::{DataSource, Plan, Resource};
pub use schema::{Attribute, AttributeType, ProviderSchema, Schema};
pub use wait_online::{
    OnlineStatus, WaitOnlineConfig, WaitOnlineDataSource, WaitOnlineResource, WaitOnlineState,
};
