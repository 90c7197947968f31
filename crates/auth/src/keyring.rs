//! Ceph keyring text parsing and formatting
//!
//! Keyrings are INI-like: one `[entity]` section per identity holding a
//! `key = <base64>` line and optional `caps <service> = "<perm>"` lines.

use crate::error::{AuthError, Result};
use crate::types::{Caps, CryptoKey};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Render the keyring entry for a single entity.
///
/// The layout is what ceph tooling writes and expects:
/// `[<entity>]\n\tkey = <secret>\n`.
pub fn format_keyring_entry(entity: &str, key: &str) -> String {
    format!("[{}]\n\tkey = {}\n", entity, key)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct KeyringEntry {
    key: Option<String>,
    caps: Caps,
}

/// Represents a parsed Ceph keyring
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keyring {
    entries: BTreeMap<String, KeyringEntry>,
}

impl Keyring {
    /// Create a new empty keyring
    pub fn new() -> Self {
        Self::default()
    }

    /// Load keyring from file path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            AuthError::InvalidKeyring(format!(
                "Failed to read keyring file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Self::from_string(&content)
    }

    /// Parse keyring from string content
    pub fn from_string(content: &str) -> Result<Self> {
        let mut keyring = Keyring::new();
        let mut current_entity: Option<String> = None;

        for (lineno, line) in content.lines().enumerate() {
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            if line.starts_with('[') && line.ends_with(']') {
                let entity = line[1..line.len() - 1].trim().to_string();
                debug!("Found entity: {}", entity);
                keyring.entries.entry(entity.clone()).or_default();
                current_entity = Some(entity);
                continue;
            }

            let (key, value) = line.split_once('=').ok_or_else(|| {
                AuthError::InvalidKeyring(format!("line {}: expected 'name = value'", lineno + 1))
            })?;
            let entity = current_entity.as_ref().ok_or_else(|| {
                AuthError::InvalidKeyring(format!(
                    "line {}: '{}' appears before any [entity] section",
                    lineno + 1,
                    key.trim()
                ))
            })?;
            let entry = keyring.entries.entry(entity.clone()).or_default();
            let key = key.trim();
            let value = value.trim();

            match key {
                "key" => {
                    CryptoKey::from_base64(value)?;
                    entry.key = Some(value.to_string());
                }
                key if key.starts_with("caps ") => {
                    let service = key["caps ".len()..].trim();
                    entry.caps.insert(service, value.trim_matches('"'));
                }
                _ => {
                    warn!("Unknown keyring field for {}: {}", entity, key);
                }
            }
        }

        debug!("Loaded {} entities from keyring", keyring.entries.len());
        Ok(keyring)
    }

    /// Add or replace an entity
    pub fn insert(&mut self, entity: impl Into<String>, key: impl Into<String>, caps: Caps) {
        self.entries.insert(
            entity.into(),
            KeyringEntry {
                key: Some(key.into()),
                caps,
            },
        );
    }

    /// Get the base64 key for a specific entity
    pub fn get_key(&self, entity: &str) -> Option<&str> {
        self.entries.get(entity)?.key.as_deref()
    }

    /// Get the capabilities recorded for an entity
    pub fn get_caps(&self, entity: &str) -> Option<&Caps> {
        self.entries.get(entity).map(|e| &e.caps)
    }

    /// List all entities in this keyring
    pub fn entities(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn has_entity(&self, entity: &str) -> bool {
        self.entries.contains_key(entity)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for Keyring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (entity, entry) in &self.entries {
            writeln!(f, "[{}]", entity)?;
            if let Some(key) = &entry.key {
                writeln!(f, "\tkey = {}", key)?;
            }
            for (svc, perm) in entry.caps.iter() {
                writeln!(f, "\tcaps {} = \"{}\"", svc, perm)?;
            }
        }
        Ok(())
    }
}
