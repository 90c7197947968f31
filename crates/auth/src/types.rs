//! Common types for cephx entities and their credentials

use crate::error::{AuthError, Result};
use crate::keyring::format_keyring_entry;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::{Buf, BufMut, Bytes, BytesMut};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

/// Entity types the monitors accept in an entity name
pub const ENTITY_TYPES: &[&str] = &["auth", "mon", "osd", "mds", "mgr", "client"];

/// Entity name (e.g., "client.admin", "osd.0", "client.rgw.gateway1")
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityName {
    entity_type: String,
    entity_id: String,
}

impl EntityName {
    pub fn new(entity_type: impl Into<String>, entity_id: impl Into<String>) -> Result<Self> {
        let entity_type = entity_type.into();
        let entity_id = entity_id.into();

        if !ENTITY_TYPES.contains(&entity_type.as_str()) {
            return Err(AuthError::InvalidEntity(format!(
                "unknown entity type '{}' (expected one of {})",
                entity_type,
                ENTITY_TYPES.join(", ")
            )));
        }
        if entity_id.is_empty() || entity_id.chars().any(char::is_whitespace) {
            return Err(AuthError::InvalidEntity(format!(
                "invalid id '{}' for entity type {}",
                entity_id, entity_type
            )));
        }

        Ok(Self {
            entity_type,
            entity_id,
        })
    }

    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    /// The part after the type, e.g. `admin` for `client.admin`
    pub fn id(&self) -> &str {
        &self.entity_id
    }
}

impl fmt::Display for EntityName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.entity_type, self.entity_id)
    }
}

impl FromStr for EntityName {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self> {
        // Only the first dot separates the type; ids may contain dots
        let (entity_type, entity_id) = s
            .split_once('.')
            .ok_or_else(|| AuthError::InvalidEntity(format!("'{}' is not <type>.<id>", s)))?;
        Self::new(entity_type, entity_id)
    }
}

impl Serialize for EntityName {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for EntityName {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Capability map: service scope ("mon", "osd", ...) to permission string
///
/// On the wire the monitor expects caps as a flat `[svc, perm, svc, perm]`
/// sequence but answers with a JSON object; both views are provided here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Caps(BTreeMap<String, String>);

impl Caps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, service: impl Into<String>, perm: impl Into<String>) -> Option<String> {
        self.0.insert(service.into(), perm.into())
    }

    pub fn get(&self, service: &str) -> Option<&str> {
        self.0.get(service).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Flatten to the `[svc, perm, svc, perm, ...]` wire sequence
    pub fn to_flat(&self) -> Vec<String> {
        self.0
            .iter()
            .flat_map(|(svc, perm)| [svc.clone(), perm.clone()])
            .collect()
    }

    /// Rebuild from a flat `[svc, perm, ...]` sequence
    pub fn from_flat<S: AsRef<str>>(flat: &[S]) -> Result<Self> {
        if flat.len() % 2 != 0 {
            return Err(AuthError::InvalidCaps(format!(
                "flat caps sequence has odd length {}",
                flat.len()
            )));
        }

        let mut caps = Caps::new();
        for pair in flat.chunks(2) {
            let (svc, perm) = (pair[0].as_ref(), pair[1].as_ref());
            if caps.insert(svc, perm).is_some() {
                return Err(AuthError::InvalidCaps(format!("duplicate service '{}'", svc)));
            }
        }
        Ok(caps)
    }

    /// Parse a `svc=perm` assignment, as given on a command line
    pub fn parse_assignment(s: &str) -> Result<(String, String)> {
        let (svc, perm) = s
            .split_once('=')
            .ok_or_else(|| AuthError::InvalidCaps(format!("'{}' is not <service>=<perm>", s)))?;
        let svc = svc.trim();
        if svc.is_empty() {
            return Err(AuthError::InvalidCaps(format!("empty service in '{}'", s)));
        }
        Ok((svc.to_string(), perm.trim().to_string()))
    }
}

impl From<BTreeMap<String, String>> for Caps {
    fn from(map: BTreeMap<String, String>) -> Self {
        Caps(map)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Caps {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Caps(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// One entry of an `auth get` / `auth get-or-create` response
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthRecord {
    pub entity: EntityName,
    pub key: String,
    #[serde(default)]
    pub caps: Caps,
}

impl AuthRecord {
    /// Keyring text for this entity, as consumed by ceph clients
    pub fn keyring(&self) -> String {
        format_keyring_entry(&self.entity.to_string(), &self.key)
    }
}

impl fmt::Debug for AuthRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthRecord")
            .field("entity", &format_args!("{}", self.entity))
            .field("key", &"<redacted>")
            .field("caps", &self.caps)
            .finish()
    }
}

/// Crypto type of an AES cephx secret
pub const CEPH_CRYPTO_AES: u16 = 1;

const AES_SECRET_LEN: usize = 16;
const KEY_HEADER_LEN: usize = 12;

/// A cephx secret in its encoded form
///
/// The base64 text found in keyrings wraps a small header:
/// `u16 type, u32 created.sec, u32 created.nsec, u16 len` followed by `len`
/// secret bytes, all little endian.
#[derive(Clone, PartialEq, Eq)]
pub struct CryptoKey {
    crypto_type: u16,
    created: (u32, u32),
    secret: Bytes,
}

impl CryptoKey {
    /// Generate a fresh AES secret stamped with the current time
    pub fn generate() -> Self {
        let mut secret = [0u8; AES_SECRET_LEN];
        rand::thread_rng().fill_bytes(&mut secret);
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Self {
            crypto_type: CEPH_CRYPTO_AES,
            created: (now.as_secs() as u32, now.subsec_nanos()),
            secret: Bytes::copy_from_slice(&secret),
        }
    }

    pub fn from_base64(base64_str: &str) -> Result<Self> {
        let data = STANDARD
            .decode(base64_str.trim())
            .map_err(|e| AuthError::InvalidKey(format!("Invalid base64 key: {}", e)))?;
        if data.len() < KEY_HEADER_LEN {
            return Err(AuthError::InvalidKey(format!(
                "key is {} bytes, shorter than the {} byte header",
                data.len(),
                KEY_HEADER_LEN
            )));
        }

        let mut buf = Bytes::from(data);
        let crypto_type = buf.get_u16_le();
        let sec = buf.get_u32_le();
        let nsec = buf.get_u32_le();
        let len = buf.get_u16_le() as usize;
        if buf.remaining() != len {
            return Err(AuthError::InvalidKey(format!(
                "key header announces {} secret bytes, found {}",
                len,
                buf.remaining()
            )));
        }

        Ok(Self {
            crypto_type,
            created: (sec, nsec),
            secret: buf,
        })
    }

    pub fn to_base64(&self) -> String {
        let mut buf = BytesMut::with_capacity(KEY_HEADER_LEN + self.secret.len());
        buf.put_u16_le(self.crypto_type);
        buf.put_u32_le(self.created.0);
        buf.put_u32_le(self.created.1);
        buf.put_u16_le(self.secret.len() as u16);
        buf.put_slice(&self.secret);
        STANDARD.encode(&buf)
    }

    pub fn crypto_type(&self) -> u16 {
        self.crypto_type
    }

    pub fn secret_len(&self) -> usize {
        self.secret.len()
    }
}

impl fmt::Debug for CryptoKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CryptoKey")
            .field("crypto_type", &self.crypto_type)
            .field("secret", &"<redacted>")
            .finish()
    }
}
