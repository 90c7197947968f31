//! Auth command client
//!
//! `AuthClient` issues one `auth` command per call over any
//! [`CommandTransport`] and maps the reply onto [`AuthRecord`]s. It keeps no
//! state between calls.

use crate::command::{decode_single_record, AuthCommand};
use crate::error::{AuthError, Result};
use crate::types::{AuthRecord, Caps, EntityName};
use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

/// errno the monitor returns for a missing entity
pub const ENOENT: i32 = 2;

/// Result of a monitor command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    /// Return code (0 = success, negative errno on failure)
    pub retval: i32,
    /// Status string
    pub outs: String,
    /// Output buffer
    pub outbl: Bytes,
}

impl CommandResult {
    pub fn new(retval: i32, outs: impl Into<String>, outbl: Bytes) -> Self {
        Self {
            retval,
            outs: outs.into(),
            outbl,
        }
    }

    pub fn is_success(&self) -> bool {
        self.retval == 0
    }
}

/// Something that can send a JSON command to the monitors
#[async_trait]
pub trait CommandTransport: Send + Sync {
    /// Send one command and wait for its reply.
    ///
    /// Errors are transport failures only; a command the monitor rejects is
    /// reported through `CommandResult::retval`.
    async fn mon_command(&self, cmd: &str, inbl: Bytes) -> Result<CommandResult>;
}

/// Client for the `auth` family of monitor commands
pub struct AuthClient<'a, T: ?Sized> {
    transport: &'a T,
}

impl<'a, T: CommandTransport + ?Sized> AuthClient<'a, T> {
    pub fn new(transport: &'a T) -> Self {
        Self { transport }
    }

    /// Fetch an entity; `AuthError::NotFound` if the cluster has no such entity
    pub async fn get(&self, entity: &EntityName) -> Result<AuthRecord> {
        let cmd = AuthCommand::Get {
            entity: entity.clone(),
        };
        let result = self.execute(&cmd).await?;
        decode_single_record(cmd.prefix(), entity, &result.outbl)
    }

    /// Fetch an entity, creating it with `caps` if it does not exist yet
    pub async fn get_or_create(&self, entity: &EntityName, caps: &Caps) -> Result<AuthRecord> {
        let cmd = AuthCommand::GetOrCreate {
            entity: entity.clone(),
            caps: caps.clone(),
        };
        let result = self.execute(&cmd).await?;
        decode_single_record(cmd.prefix(), entity, &result.outbl)
    }

    /// Replace the capability map of an existing entity
    pub async fn set_caps(&self, entity: &EntityName, caps: &Caps) -> Result<()> {
        let cmd = AuthCommand::Caps {
            entity: entity.clone(),
            caps: caps.clone(),
        };
        self.execute(&cmd).await.map(|_| ())
    }

    /// Remove an entity and its key
    pub async fn remove(&self, entity: &EntityName) -> Result<()> {
        let cmd = AuthCommand::Rm {
            entity: entity.clone(),
        };
        self.execute(&cmd).await.map(|_| ())
    }

    async fn execute(&self, cmd: &AuthCommand) -> Result<CommandResult> {
        let json = cmd.to_json()?;
        debug!(prefix = cmd.prefix(), entity = %cmd.entity(), "sending mon command");

        let result = self.transport.mon_command(&json, Bytes::new()).await?;
        debug!(
            prefix = cmd.prefix(),
            retval = result.retval,
            outs = %result.outs,
            "mon command completed"
        );

        match result.retval {
            0 => Ok(result),
            r if r == -ENOENT && matches!(cmd, AuthCommand::Get { .. }) => {
                Err(AuthError::NotFound(cmd.entity().to_string()))
            }
            code => Err(AuthError::CommandFailed {
                prefix: cmd.prefix().to_string(),
                code,
                message: result.outs,
            }),
        }
    }
}
