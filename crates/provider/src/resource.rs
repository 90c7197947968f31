//! Lifecycle interfaces driven by the host framework
//!
//! A [`Resource`] owns a cluster-side object through create, read, update,
//! delete and import. A [`DataSource`] only reads. Each phase is one method;
//! the host picks the method, there is no string-keyed dispatch.

use crate::error::{ProviderError, Result};
use crate::schema::Schema;
use async_trait::async_trait;

/// What applying a new configuration to existing state requires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plan {
    NoOp,
    Update,
    /// Destroy then create
    Replace,
}

#[async_trait]
pub trait Resource: Send + Sync {
    /// Operator input
    type Config: Send + Sync;
    /// Stored state, including computed attributes
    type State: Send + Sync;

    const TYPE_NAME: &'static str;

    fn schema() -> Schema;

    /// Compare stored state with desired configuration
    fn plan(prior: &Self::State, desired: &Self::Config) -> Plan;

    async fn create(&self, config: &Self::Config) -> Result<Self::State>;

    /// Refresh state; `None` means the object no longer exists
    async fn read(&self, state: &Self::State) -> Result<Option<Self::State>>;

    async fn update(&self, prior: &Self::State, config: &Self::Config) -> Result<Self::State> {
        let _ = (prior, config);
        Err(ProviderError::Unsupported {
            resource: Self::TYPE_NAME,
            operation: "update",
        })
    }

    async fn delete(&self, state: &Self::State) -> Result<()>;

    /// Seed state from an external id; a following read fills in the rest
    async fn import(&self, id: &str) -> Result<Self::State> {
        let _ = id;
        Err(ProviderError::Unsupported {
            resource: Self::TYPE_NAME,
            operation: "import",
        })
    }
}

#[async_trait]
pub trait DataSource: Send + Sync {
    type Config: Send + Sync;
    type State: Send + Sync;

    const TYPE_NAME: &'static str;

    fn schema() -> Schema;

    async fn read(&self, config: &Self::Config) -> Result<Self::State>;
}
