//! AuthClient behaviour against a scripted transport

use async_trait::async_trait;
use auth::{AuthClient, AuthError, Caps, CommandResult, CommandTransport, EntityName, ENOENT};
use bytes::Bytes;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;

/// Replays canned replies and records every command it is sent
#[derive(Default)]
struct ScriptedTransport {
    replies: Mutex<VecDeque<auth::Result<CommandResult>>>,
    sent: Mutex<Vec<Value>>,
}

impl ScriptedTransport {
    fn reply(self, retval: i32, outs: &str, outbl: &str) -> Self {
        self.replies.lock().unwrap().push_back(Ok(CommandResult::new(
            retval,
            outs,
            Bytes::from(outbl.to_string()),
        )));
        self
    }

    fn fail(self, message: &str) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push_back(Err(AuthError::Transport(message.to_string())));
        self
    }

    fn sent(&self) -> Vec<Value> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandTransport for ScriptedTransport {
    async fn mon_command(&self, cmd: &str, _inbl: Bytes) -> auth::Result<CommandResult> {
        self.sent
            .lock()
            .unwrap()
            .push(serde_json::from_str(cmd).expect("command is JSON"));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected command")
    }
}

fn demo() -> EntityName {
    "client.demo".parse().unwrap()
}

#[tokio::test]
async fn test_get_or_create_scenario() {
    tracing_subscriber::fmt().with_test_writer().try_init().ok();

    let transport = ScriptedTransport::default().reply(
        0,
        "",
        r#"[{"entity":"client.demo","key":"AQBopaque==","caps":{"mon":"allow r"}}]"#,
    );
    let caps: Caps = [("mon", "allow r")].into_iter().collect();

    let record = AuthClient::new(&transport)
        .get_or_create(&demo(), &caps)
        .await
        .unwrap();

    assert_eq!(record.entity.to_string(), "client.demo");
    assert_eq!(record.caps, caps);
    assert_eq!(record.keyring(), "[client.demo]\n\tkey = AQBopaque==\n");

    let sent = transport.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0]["prefix"], "auth get-or-create");
    assert_eq!(sent[0]["format"], "json");
    assert_eq!(sent[0]["caps"], serde_json::json!(["mon", "allow r"]));
}

#[tokio::test]
async fn test_get_missing_entity_is_not_found() {
    let transport = ScriptedTransport::default().reply(
        -ENOENT,
        "failed to find client.demo in keyring",
        "",
    );

    let err = AuthClient::new(&transport).get(&demo()).await.unwrap_err();
    assert_eq!(err, AuthError::NotFound("client.demo".to_string()));
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_get_empty_array_is_not_absence() {
    let transport = ScriptedTransport::default().reply(0, "", "[]");

    let err = AuthClient::new(&transport).get(&demo()).await.unwrap_err();
    assert!(matches!(err, AuthError::UnexpectedRecordCount { count: 0, .. }));
}

#[tokio::test]
async fn test_rejected_command_carries_status() {
    let transport = ScriptedTransport::default().reply(
        -22,
        "key for client.demo exists but cap mon does not match",
        "",
    );
    let caps: Caps = [("mon", "allow rw")].into_iter().collect();

    let err = AuthClient::new(&transport)
        .get_or_create(&demo(), &caps)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        AuthError::CommandFailed {
            prefix: "auth get-or-create".to_string(),
            code: -22,
            message: "key for client.demo exists but cap mon does not match".to_string(),
        }
    );
}

#[tokio::test]
async fn test_enoent_on_rm_is_a_failure() {
    let transport = ScriptedTransport::default().reply(-ENOENT, "no such entity", "");

    let err = AuthClient::new(&transport).remove(&demo()).await.unwrap_err();
    assert!(matches!(err, AuthError::CommandFailed { code, .. } if code == -ENOENT));
}

#[tokio::test]
async fn test_transport_error_is_propagated_verbatim() {
    let transport = ScriptedTransport::default().fail("connection reset by peer");

    let err = AuthClient::new(&transport).get(&demo()).await.unwrap_err();
    assert_eq!(err.to_string(), "Transport error: connection reset by peer");
}

#[tokio::test]
async fn test_set_caps_and_remove_send_one_command_each() {
    let transport = ScriptedTransport::default()
        .reply(0, "updated caps for client.demo", "")
        .reply(0, "", "");
    let client = AuthClient::new(&transport);
    let caps: Caps = [("osd", "allow rwx"), ("mon", "allow r")].into_iter().collect();

    client.set_caps(&demo(), &caps).await.unwrap();
    client.remove(&demo()).await.unwrap();

    let sent = transport.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0]["prefix"], "auth caps");
    assert_eq!(
        sent[0]["caps"],
        serde_json::json!(["mon", "allow r", "osd", "allow rwx"])
    );
    assert_eq!(sent[1]["prefix"], "auth rm");
    assert_eq!(sent[1]["entity"], "client.demo");
}
