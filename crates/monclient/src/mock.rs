//! In-memory cluster for tests
//!
//! `MockCluster` implements [`ClusterLibrary`] and answers the `auth`
//! monitor commands from an in-memory entity table. It emulates the parts of
//! librados behaviour the connection builder relies on (config loading,
//! option validation, keyring lookup at connect time) and records every call
//! so tests can assert on them.

use crate::error::{MonClientError, Result};
use crate::library::{ClusterHandle, ClusterLibrary};
use crate::options::Identity;
use async_trait::async_trait;
use auth::{Caps, CommandResult, CryptoKey, Keyring, ENOENT};
use bytes::Bytes;
use cephconfig::{CephConfig, DEFAULT_CLUSTER};
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

const EINVAL: i32 = 22;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockEntity {
    pub key: String,
    pub caps: Caps,
}

/// Shared state of a mock cluster; fields are public for inspection
#[derive(Debug, Default)]
pub struct MockState {
    pub entities: BTreeMap<String, MockEntity>,
    pub online: bool,
    /// Connect attempts still to fail even while online
    pub failing_connects: usize,
    /// Text used as the platform default ceph.conf
    pub default_config: Option<String>,
    /// Reply to get/get-or-create with an empty record array
    pub empty_replies: bool,
    /// Fail every command with this transport error
    pub command_failure: Option<String>,

    pub identities: Vec<Identity>,
    pub config_reads: Vec<Option<PathBuf>>,
    pub options_set: Vec<(String, String)>,
    pub connect_attempts: usize,
    pub connections: usize,
    pub shutdowns: usize,
    /// Keyring file path and contents seen by the last connect
    pub keyring_seen: Option<(PathBuf, String)>,
    pub commands: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct MockCluster {
    state: Arc<Mutex<MockState>>,
}

impl Default for MockCluster {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCluster {
    /// An online cluster whose default config points at one monitor
    pub fn new() -> Self {
        let state = MockState {
            online: true,
            default_config: Some("[global]\nmon host = 127.0.0.1:6789\n".to_string()),
            ..Default::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_online(&self, online: bool) {
        self.state().online = online;
    }

    pub fn fail_next_connects(&self, count: usize) {
        self.state().failing_connects = count;
    }

    /// Add an entity with a freshly generated key; returns the key
    pub fn add_entity(&self, entity: &str, caps: Caps) -> String {
        let key = CryptoKey::generate().to_base64();
        self.state().entities.insert(
            entity.to_string(),
            MockEntity {
                key: key.clone(),
                caps,
            },
        );
        key
    }

    pub fn entity(&self, entity: &str) -> Option<MockEntity> {
        self.state().entities.get(entity).cloned()
    }

    fn execute(&self, cmd: &str) -> Result<CommandResult> {
        #[derive(Deserialize)]
        struct Request {
            prefix: String,
            entity: Option<String>,
            #[serde(default)]
            caps: Vec<String>,
        }

        let mut state = self.state();
        if let Some(message) = &state.command_failure {
            return Err(MonClientError::Command(message.clone()));
        }

        let request: Request = serde_json::from_str(cmd)
            .map_err(|e| MonClientError::Command(format!("malformed command: {}", e)))?;
        state.commands.push(request.prefix.clone());

        let entity = match request.entity {
            Some(entity) => entity,
            None => return Ok(reply_error(-EINVAL, "missing required argument entity")),
        };
        let caps = match Caps::from_flat(request.caps.as_slice()) {
            Ok(caps) => caps,
            Err(e) => return Ok(reply_error(-EINVAL, &e.to_string())),
        };

        let result = match request.prefix.as_str() {
            "auth get" => match state.entities.get(&entity) {
                Some(found) => reply_records(&state, &entity, found),
                None => reply_error(-ENOENT, &format!("failed to find {} in keyring", entity)),
            },
            "auth get-or-create" => {
                if let Some(found) = state.entities.get(&entity) {
                    match caps.iter().find(|(svc, perm)| found.caps.get(svc) != Some(*perm)) {
                        Some((svc, _)) => reply_error(
                            -EINVAL,
                            &format!("key for {} exists but cap {} does not match", entity, svc),
                        ),
                        None => reply_records(&state, &entity, found),
                    }
                } else {
                    let created = MockEntity {
                        key: CryptoKey::generate().to_base64(),
                        caps,
                    };
                    let result = reply_records(&state, &entity, &created);
                    state.entities.insert(entity, created);
                    result
                }
            }
            "auth caps" => match state.entities.get_mut(&entity) {
                Some(found) => {
                    found.caps = caps;
                    CommandResult::new(0, format!("updated caps for {}", entity), Bytes::new())
                }
                None => reply_error(-ENOENT, &format!("couldn't find entity {}", entity)),
            },
            "auth rm" => {
                let outs = match state.entities.remove(&entity) {
                    Some(_) => "updated",
                    None => "entity does not exist",
                };
                CommandResult::new(0, outs, Bytes::new())
            }
            other => reply_error(-EINVAL, &format!("command not known: {}", other)),
        };
        Ok(result)
    }
}

fn reply_error(retval: i32, outs: &str) -> CommandResult {
    CommandResult::new(retval, outs, Bytes::new())
}

fn reply_records(state: &MockState, entity: &str, found: &MockEntity) -> CommandResult {
    let body = if state.empty_replies {
        json!([])
    } else {
        json!([{ "entity": entity, "key": found.key, "caps": found.caps }])
    };
    CommandResult::new(0, "", Bytes::from(body.to_string()))
}

impl ClusterLibrary for MockCluster {
    fn create(&self, identity: &Identity) -> Result<Box<dyn ClusterHandle>> {
        self.state().identities.push(identity.clone());
        Ok(Box::new(MockHandle {
            cluster: self.clone(),
            identity: identity.clone(),
            config: CephConfig::default(),
            connected: false,
        }))
    }
}

#[derive(Debug)]
pub struct MockHandle {
    cluster: MockCluster,
    identity: Identity,
    config: CephConfig,
    connected: bool,
}

impl MockHandle {
    fn entity_name(&self) -> String {
        match &self.identity {
            Identity::ClusterAndEntity { entity, .. } | Identity::Entity(entity) => {
                entity.to_string()
            }
            Identity::Default => "client.admin".to_string(),
        }
    }

    fn cluster_name(&self) -> &str {
        match &self.identity {
            Identity::ClusterAndEntity { cluster, .. } => cluster,
            _ => DEFAULT_CLUSTER,
        }
    }

    fn check_keyring(&self) -> Result<Option<(PathBuf, String)>> {
        let path = match self.config.keyring() {
            Ok(path) => PathBuf::from(path),
            Err(_) => return Ok(None),
        };
        let text = std::fs::read_to_string(&path).map_err(|e| {
            MonClientError::Connect(format!("unable to read keyring {}: {}", path.display(), e))
        })?;
        let keyring = Keyring::from_string(&text)
            .map_err(|e| MonClientError::Connect(e.to_string()))?;
        let entity = self.entity_name();
        if !keyring.has_entity(&entity) {
            return Err(MonClientError::Connect(format!(
                "auth: unable to find a keyring entry for {}",
                entity
            )));
        }
        Ok(Some((path, text)))
    }
}

#[async_trait]
impl ClusterHandle for MockHandle {
    fn read_config_file(&mut self, path: &Path) -> Result<()> {
        self.cluster
            .state()
            .config_reads
            .push(Some(path.to_path_buf()));
        self.config = CephConfig::from_file(path).map_err(|e| MonClientError::ConfigFile {
            path: Some(path.to_path_buf()),
            message: e.to_string(),
        })?;
        Ok(())
    }

    fn read_default_config(&mut self) -> Result<()> {
        let default_config = {
            let mut state = self.cluster.state();
            state.config_reads.push(None);
            state.default_config.clone()
        };
        let parsed = match default_config {
            Some(text) => CephConfig::parse(&text),
            None => CephConfig::from_default_location(self.cluster_name()).map(|(c, _)| c),
        };
        self.config = parsed.map_err(|e| MonClientError::ConfigFile {
            path: None,
            message: e.to_string(),
        })?;
        Ok(())
    }

    fn set_option(&mut self, name: &str, value: &str) -> Result<()> {
        let invalid = |message: String| MonClientError::InvalidOption {
            name: name.to_string(),
            message,
        };
        match name {
            "mon_host" => {
                cephconfig::parse_mon_host(value).map_err(|e| invalid(e.to_string()))?;
            }
            "key" => {
                CryptoKey::from_base64(value).map_err(|e| invalid(e.to_string()))?;
            }
            "keyring" => {
                if !Path::new(value).is_file() {
                    return Err(invalid(format!("{} is not a file", value)));
                }
            }
            _ => return Err(invalid("unrecognized option".to_string())),
        }

        self.cluster
            .state()
            .options_set
            .push((name.to_string(), value.to_string()));
        self.config.set("client", name, value);
        Ok(())
    }

    async fn connect(&mut self) -> Result<()> {
        {
            let mut state = self.cluster.state();
            state.connect_attempts += 1;
            if !state.online {
                return Err(MonClientError::Connect(
                    "error connecting to the cluster: Connection timed out".to_string(),
                ));
            }
            if state.failing_connects > 0 {
                state.failing_connects -= 1;
                return Err(MonClientError::Connect(
                    "error connecting to the cluster: Connection refused".to_string(),
                ));
            }
        }

        self.config
            .mon_addrs()
            .map_err(|e| MonClientError::Connect(format!("no monitors to contact: {}", e)))?;
        let keyring_seen = self.check_keyring()?;

        let mut state = self.cluster.state();
        if keyring_seen.is_some() {
            state.keyring_seen = keyring_seen;
        }
        state.connections += 1;
        self.connected = true;
        Ok(())
    }

    async fn mon_command(&self, cmd: &str, _inbl: Bytes) -> Result<CommandResult> {
        if !self.connected {
            return Err(MonClientError::NotConnected);
        }
        self.cluster.execute(cmd)
    }
}

impl Drop for MockHandle {
    fn drop(&mut self) {
        self.cluster.state().shutdowns += 1;
    }
}
