//! `ceph_auth`: cephx entities, their capabilities and keys
//!
//! The resource owns an entity through `auth get-or-create`, `auth get`,
//! `auth caps` and `auth rm`. The data source of the same name reads an
//! existing entity without owning it.

use crate::error::{ProviderError, Result};
use crate::resource::{DataSource, Plan, Resource};
use crate::schema::{Attribute, AttributeType, Schema};
use async_trait::async_trait;
use auth::{AuthRecord, Caps, EntityName, PREFIX_CAPS, PREFIX_GET, PREFIX_GET_OR_CREATE, PREFIX_RM};
use monclient::{ClusterConfig, Connection};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const TYPE_NAME: &str = "ceph_auth";

/// Operator input for `ceph_auth`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthConfig {
    pub entity: EntityName,
    #[serde(default)]
    pub caps: Caps,
}

/// Stored state of an entity; `key` and `keyring` are recomputed on every
/// read
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthState {
    pub id: String,
    pub entity: EntityName,
    #[serde(default)]
    pub caps: Caps,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub keyring: String,
}

impl AuthState {
    fn from_record(record: AuthRecord) -> Self {
        let keyring = record.keyring();
        Self {
            id: record.entity.to_string(),
            entity: record.entity,
            caps: record.caps,
            key: record.key,
            keyring,
        }
    }
}

impl fmt::Debug for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthState")
            .field("id", &self.id)
            .field("entity", &self.entity)
            .field("caps", &self.caps)
            .field("key", &"<redacted>")
            .field("keyring", &"<redacted>")
            .finish()
    }
}

fn entity_attribute() -> Attribute {
    Attribute::required(AttributeType::String, "The entity name (i.e.: client.admin)").force_new()
}

fn key_attributes(schema: Schema) -> Schema {
    schema
        .attribute(
            "keyring",
            Attribute::computed(AttributeType::String, "The cephx keyring of the entity")
                .sensitive(),
        )
        .attribute(
            "key",
            Attribute::computed(AttributeType::String, "The cephx key of the entity").sensitive(),
        )
}

async fn connect(cluster: &ClusterConfig) -> Result<Arc<Connection>> {
    cluster.connection().await.map_err(ProviderError::Connect)
}

#[derive(Debug, Clone)]
pub struct AuthResource {
    cluster: Arc<ClusterConfig>,
}

impl AuthResource {
    pub fn new(cluster: Arc<ClusterConfig>) -> Self {
        Self { cluster }
    }
}

#[async_trait]
impl Resource for AuthResource {
    type Config = AuthConfig;
    type State = AuthState;

    const TYPE_NAME: &'static str = TYPE_NAME;

    fn schema() -> Schema {
        key_attributes(
            Schema::new(None)
                .attribute("entity", entity_attribute())
                .attribute(
                    "caps",
                    Attribute::optional(AttributeType::Map, "The caps wanted for the entity"),
                ),
        )
    }

    fn plan(prior: &AuthState, desired: &AuthConfig) -> Plan {
        if prior.entity != desired.entity {
            Plan::Replace
        } else if prior.caps != desired.caps {
            Plan::Update
        } else {
            Plan::NoOp
        }
    }

    async fn create(&self, config: &AuthConfig) -> Result<AuthState> {
        let conn = connect(&self.cluster).await?;
        let record = conn
            .auth()
            .get_or_create(&config.entity, &config.caps)
            .await
            .map_err(ProviderError::command(PREFIX_GET_OR_CREATE))?;

        info!(entity = %record.entity, "created ceph_auth");
        Ok(AuthState::from_record(record))
    }

    async fn read(&self, state: &AuthState) -> Result<Option<AuthState>> {
        let conn = connect(&self.cluster).await?;
        match conn.auth().get(&state.entity).await {
            Ok(record) => Ok(Some(AuthState::from_record(record))),
            Err(e) if e.is_not_found() => {
                warn!(entity = %state.entity, "entity is gone from the cluster, removing from state");
                Ok(None)
            }
            Err(e) => Err(ProviderError::command(PREFIX_GET)(e)),
        }
    }

    async fn update(&self, prior: &AuthState, config: &AuthConfig) -> Result<AuthState> {
        if prior.entity != config.entity {
            return Err(ProviderError::RequiresReplacement {
                resource: TYPE_NAME,
                attribute: "entity",
            });
        }

        let conn = connect(&self.cluster).await?;
        let auth = conn.auth();
        auth.set_caps(&config.entity, &config.caps)
            .await
            .map_err(ProviderError::command(PREFIX_CAPS))?;
        debug!(entity = %config.entity, caps = config.caps.len(), "updated caps");

        let record = auth
            .get(&config.entity)
            .await
            .map_err(ProviderError::command(PREFIX_GET))?;
        Ok(AuthState::from_record(record))
    }

    async fn delete(&self, state: &AuthState) -> Result<()> {
        let conn = connect(&self.cluster).await?;
        conn.auth()
            .remove(&state.entity)
            .await
            .map_err(ProviderError::command(PREFIX_RM))?;
        info!(entity = %state.entity, "removed ceph_auth");
        Ok(())
    }

    async fn import(&self, id: &str) -> Result<AuthState> {
        let entity: EntityName = id.parse().map_err(|e: auth::AuthError| {
            ProviderError::InvalidInput {
                resource: TYPE_NAME,
                message: e.to_string(),
            }
        })?;
        Ok(AuthState {
            id: entity.to_string(),
            entity,
            caps: Caps::new(),
            key: String::new(),
            keyring: String::new(),
        })
    }
}

/// Input of the `ceph_auth` data source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthLookup {
    pub entity: EntityName,
}

#[derive(Debug, Clone)]
pub struct AuthDataSource {
    cluster: Arc<ClusterConfig>,
}

impl AuthDataSource {
    pub fn new(cluster: Arc<ClusterConfig>) -> Self {
        Self { cluster }
    }
}

#[async_trait]
impl DataSource for AuthDataSource {
    type Config = AuthLookup;
    type State = AuthState;

    const TYPE_NAME: &'static str = TYPE_NAME;

    fn schema() -> Schema {
        key_attributes(
            Schema::new(Some(
                "This data source allows you to get information about a ceph client.",
            ))
            .attribute("entity", entity_attribute())
            .attribute(
                "caps",
                Attribute::computed(AttributeType::Map, "The caps of the entity"),
            ),
        )
    }

    async fn read(&self, lookup: &AuthLookup) -> Result<AuthState> {
        let conn = connect(&self.cluster).await?;
        match conn.auth().get(&lookup.entity).await {
            Ok(record) => Ok(AuthState::from_record(record)),
            Err(e) if e.is_not_found() => Err(ProviderError::EntityNotFound(lookup.entity.to_string())),
            Err(e) => Err(ProviderError::command(PREFIX_GET)(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(entity: &str, caps: &[(&str, &str)]) -> AuthState {
        AuthState {
            id: entity.to_string(),
            entity: entity.parse().unwrap(),
            caps: caps.iter().copied().collect(),
            key: String::new(),
            keyring: String::new(),
        }
    }

    fn config(entity: &str, caps: &[(&str, &str)]) -> AuthConfig {
        AuthConfig {
            entity: entity.parse().unwrap(),
            caps: caps.iter().copied().collect(),
        }
    }

    #[test]
    fn test_plan() {
        let prior = state("client.demo", &[("mon", "allow r")]);

        assert_eq!(
            AuthResource::plan(&prior, &config("client.demo", &[("mon", "allow r")])),
            Plan::NoOp
        );
        assert_eq!(
            AuthResource::plan(&prior, &config("client.demo", &[("mon", "allow rw")])),
            Plan::Update
        );
        assert_eq!(
            AuthResource::plan(&prior, &config("client.other", &[("mon", "allow r")])),
            Plan::Replace
        );
    }

    #[test]
    fn test_entity_is_the_only_force_new_attribute() {
        let schema = AuthResource::schema();
        assert_eq!(schema.force_new_attributes().collect::<Vec<_>>(), ["entity"]);
        assert!(schema.attributes["key"].sensitive);
        assert_eq!(schema.attributes["caps"].ty, AttributeType::Map);
    }

    #[test]
    fn test_config_from_json() {
        let config: AuthConfig = serde_json::from_str(
            r#"{"entity": "client.demo", "caps": {"mon": "allow r", "osd": "allow rwx"}}"#,
        )
        .unwrap();
        assert_eq!(config.entity.to_string(), "client.demo");
        assert_eq!(config.caps.get("osd"), Some("allow rwx"));

        let bare: AuthConfig = serde_json::from_str(r#"{"entity": "client.demo"}"#).unwrap();
        assert!(bare.caps.is_empty());
    }

    #[test]
    fn test_state_debug_redacts_key() {
        let mut s = state("client.demo", &[]);
        s.key = "AQD8J8JoSpspNhAAU49nK6K8fO4MgTYFnrk+HQ==".to_string();
        assert!(!format!("{:?}", s).contains("AQD8"));
    }
}
