//! `auth` monitor command encoding and response decoding
//!
//! Requests are JSON objects carrying a `prefix`, `format: "json"`, the
//! target `entity` and, where relevant, a flat caps sequence. Responses to
//! `auth get` and `auth get-or-create` are JSON arrays of records.

use crate::error::{AuthError, Result};
use crate::types::{AuthRecord, Caps, EntityName};
use serde::Serialize;

pub const PREFIX_GET: &str = "auth get";
pub const PREFIX_GET_OR_CREATE: &str = "auth get-or-create";
pub const PREFIX_CAPS: &str = "auth caps";
pub const PREFIX_RM: &str = "auth rm";

/// The `auth` commands this crate issues
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthCommand {
    Get { entity: EntityName },
    GetOrCreate { entity: EntityName, caps: Caps },
    Caps { entity: EntityName, caps: Caps },
    Rm { entity: EntityName },
}

#[derive(Serialize)]
struct CommandRequest {
    prefix: &'static str,
    format: &'static str,
    entity: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    caps: Option<Vec<String>>,
}

impl AuthCommand {
    pub fn prefix(&self) -> &'static str {
        match self {
            AuthCommand::Get { .. } => PREFIX_GET,
            AuthCommand::GetOrCreate { .. } => PREFIX_GET_OR_CREATE,
            AuthCommand::Caps { .. } => PREFIX_CAPS,
            AuthCommand::Rm { .. } => PREFIX_RM,
        }
    }

    pub fn entity(&self) -> &EntityName {
        match self {
            AuthCommand::Get { entity }
            | AuthCommand::GetOrCreate { entity, .. }
            | AuthCommand::Caps { entity, .. }
            | AuthCommand::Rm { entity } => entity,
        }
    }

    /// Whether the monitor answers this command with a record array
    pub fn returns_records(&self) -> bool {
        matches!(self, AuthCommand::Get { .. } | AuthCommand::GetOrCreate { .. })
    }

    /// Serialize to the JSON command string sent to the monitor
    pub fn to_json(&self) -> Result<String> {
        let caps = match self {
            // get-or-create without caps creates an entity with none
            AuthCommand::GetOrCreate { caps, .. } if caps.is_empty() => None,
            AuthCommand::GetOrCreate { caps, .. } => Some(caps.to_flat()),
            // auth caps replaces the whole map, so it is always sent
            AuthCommand::Caps { caps, .. } => Some(caps.to_flat()),
            AuthCommand::Get { .. } | AuthCommand::Rm { .. } => None,
        };

        let request = CommandRequest {
            prefix: self.prefix(),
            format: "json",
            entity: self.entity().to_string(),
            caps,
        };

        serde_json::to_string(&request).map_err(|e| AuthError::Encode {
            prefix: self.prefix().to_string(),
            message: e.to_string(),
        })
    }
}

/// Decode a record array as returned by `auth get` / `auth get-or-create`
pub fn decode_records(prefix: &str, outbl: &[u8]) -> Result<Vec<AuthRecord>> {
    serde_json::from_slice(outbl).map_err(|e| AuthError::Decode {
        prefix: prefix.to_string(),
        message: e.to_string(),
    })
}

/// Decode a response that must carry exactly one record for `entity`.
///
/// An empty array is a contract violation, not "entity absent": absence is
/// signalled by the command's return code.
pub fn decode_single_record(prefix: &str, entity: &EntityName, outbl: &[u8]) -> Result<AuthRecord> {
    let mut records = decode_records(prefix, outbl)?;
    if records.len() != 1 {
        return Err(AuthError::UnexpectedRecordCount {
            prefix: prefix.to_string(),
            entity: entity.to_string(),
            count: records.len(),
        });
    }

    let record = records.remove(0);
    if record.entity != *entity {
        return Err(AuthError::EntityMismatch {
            prefix: prefix.to_string(),
            expected: entity.to_string(),
            actual: record.entity.to_string(),
        });
    }
    Ok(record)
}
