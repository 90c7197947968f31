//! Connection building against the in-memory cluster

use auth::{format_keyring_entry, AuthError, Caps, CryptoKey, EntityName};
use monclient::mock::MockCluster;
use monclient::{ClusterConfig, ConnectionOptions, Identity, MonClientError, WaitOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

fn cluster_config(mock: &MockCluster, options: ConnectionOptions) -> ClusterConfig {
    ClusterConfig::new(options, Arc::new(mock.clone()))
}

fn admin_keyring() -> String {
    format_keyring_entry("client.admin", &CryptoKey::generate().to_base64())
}

#[tokio::test]
async fn test_default_identity_connects_once_and_caches() {
    let mock = MockCluster::new();
    let config = cluster_config(&mock, ConnectionOptions::builder().build().unwrap());

    assert!(config.cached_connection().is_none());
    let first = config.connection().await.unwrap();
    let second = config.connection().await.unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.identity(), &Identity::Default);

    let state = mock.state();
    assert_eq!(state.identities, vec![Identity::Default]);
    assert_eq!(state.config_reads, vec![None]);
    assert_eq!(state.connections, 1);
    assert!(state.options_set.is_empty());
}

#[tokio::test]
async fn test_identity_follows_entity_and_cluster() {
    let mock = MockCluster::new();
    let options = ConnectionOptions::builder()
        .entity("client.admin")
        .cluster("backup")
        .build()
        .unwrap();
    let config = cluster_config(&mock, options);

    config.connection().await.unwrap();

    assert_eq!(
        mock.state().identities,
        vec![Identity::ClusterAndEntity {
            cluster: "backup".to_string(),
            entity: "client.admin".parse().unwrap(),
        }]
    );
}

#[tokio::test]
async fn test_inline_keyring_is_written_and_removed() {
    let mock = MockCluster::new();
    let keyring = admin_keyring();
    let key = CryptoKey::generate().to_base64();
    let options = ConnectionOptions::builder()
        .keyring(keyring.clone())
        .key(key.clone())
        .mon_host("10.0.0.1:6789,10.0.0.2:6789")
        .build()
        .unwrap();
    let config = cluster_config(&mock, options);

    config.connection().await.unwrap();

    let state = mock.state();
    let names: Vec<&str> = state.options_set.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, ["mon_host", "key", "keyring"]);
    assert_eq!(state.options_set[0].1, "10.0.0.1:6789,10.0.0.2:6789");
    assert_eq!(state.options_set[1].1, key);

    let (path, contents) = state.keyring_seen.clone().unwrap();
    assert_eq!(contents, keyring);
    assert_eq!(PathBuf::from(&state.options_set[2].1), path);
    assert!(!path.exists(), "temporary keyring should be gone after connect");
}

#[tokio::test]
async fn test_inline_keyring_removed_when_connect_fails() {
    let mock = MockCluster::new();
    mock.set_online(false);
    let options = ConnectionOptions::builder()
        .keyring(admin_keyring())
        .mon_host("10.0.0.1")
        .build()
        .unwrap();
    let config = cluster_config(&mock, options);

    let err = config.connection().await.unwrap_err();
    assert!(matches!(err, MonClientError::Connect(_)));

    let state = mock.state();
    let path = state
        .options_set
        .iter()
        .find(|(name, _)| name == "keyring")
        .map(|(_, value)| PathBuf::from(value))
        .unwrap();
    assert!(!path.exists(), "temporary keyring should be gone after a failed connect");
    assert_eq!(state.connect_attempts, 1);
    assert_eq!(state.shutdowns, 1);
}

#[tokio::test]
async fn test_key_override_is_applied_before_connect() {
    let mock = MockCluster::new();
    let key = CryptoKey::generate().to_base64();
    let options = ConnectionOptions::builder()
        .entity("client.admin")
        .key(key.clone())
        .build()
        .unwrap();
    let config = cluster_config(&mock, options);

    config.connection().await.unwrap();

    assert_eq!(mock.state().options_set, vec![("key".to_string(), key)]);
}

#[tokio::test]
async fn test_keyring_without_entry_fails_and_shuts_down() {
    let mock = MockCluster::new();
    let options = ConnectionOptions::builder()
        .entity("client.other")
        .keyring(admin_keyring())
        .mon_host("10.0.0.1")
        .build()
        .unwrap();
    let config = cluster_config(&mock, options);

    let err = config.connection().await.unwrap_err();
    assert!(matches!(err, MonClientError::Connect(_)));
    assert!(err.to_string().contains("client.other"));
    assert!(config.cached_connection().is_none());

    let state = mock.state();
    assert_eq!(state.connect_attempts, 1);
    assert_eq!(state.shutdowns, 1);
}

#[tokio::test]
async fn test_missing_config_file_fails_before_connect() {
    let mock = MockCluster::new();
    let options = ConnectionOptions::builder()
        .config_path("/nonexistent/ceph.conf")
        .build()
        .unwrap();
    let config = cluster_config(&mock, options);

    let err = config.connection().await.unwrap_err();
    match err {
        MonClientError::ConfigFile { path, .. } => {
            assert_eq!(path, Some(PathBuf::from("/nonexistent/ceph.conf")))
        }
        other => panic!("unexpected error: {:?}", other),
    }

    let state = mock.state();
    assert_eq!(state.connect_attempts, 0);
    assert_eq!(state.shutdowns, 1);
}

#[tokio::test]
async fn test_explicit_config_file_is_read() {
    let mut conf = tempfile::NamedTempFile::new().unwrap();
    writeln!(conf, "[global]\nmon host = [v2:10.1.0.1:3300,v1:10.1.0.1:6789]").unwrap();

    let mock = MockCluster::new();
    mock.state().default_config = None;
    let options = ConnectionOptions::builder()
        .config_path(conf.path())
        .build()
        .unwrap();
    let config = cluster_config(&mock, options);

    config.connection().await.unwrap();
    assert_eq!(
        mock.state().config_reads,
        vec![Some(conf.path().to_path_buf())]
    );
}

#[tokio::test]
async fn test_failed_connect_is_not_cached() {
    let mock = MockCluster::new();
    mock.fail_next_connects(1);
    let config = cluster_config(&mock, ConnectionOptions::default());

    assert!(config.connection().await.is_err());
    config.connection().await.unwrap();

    let state = mock.state();
    assert_eq!(state.identities.len(), 2);
    assert_eq!(state.connections, 1);
    assert_eq!(state.shutdowns, 1);
}

#[tokio::test]
async fn test_dropping_config_shuts_down_connection() {
    let mock = MockCluster::new();
    let config = cluster_config(&mock, ConnectionOptions::default());
    config.connection().await.unwrap();
    assert_eq!(mock.state().shutdowns, 0);

    drop(config);
    assert_eq!(mock.state().shutdowns, 1);
}

#[tokio::test]
async fn test_auth_commands_over_connection() {
    let mock = MockCluster::new();
    let config = cluster_config(&mock, ConnectionOptions::default());
    let conn = config.connection().await.unwrap();
    let entity: EntityName = "client.demo".parse().unwrap();
    let caps: Caps = [("mon", "allow r")].into_iter().collect();

    let created = conn.auth().get_or_create(&entity, &caps).await.unwrap();
    assert_eq!(created.entity, entity);
    assert_eq!(created.caps, caps);
    assert_eq!(mock.entity("client.demo").unwrap().key, created.key);

    let read = conn.auth().get(&entity).await.unwrap();
    assert_eq!(read, created);

    let mut new_caps = Caps::new();
    new_caps.insert("mon", "allow rw");
    new_caps.insert("osd", "allow *");
    conn.auth().set_caps(&entity, &new_caps).await.unwrap();
    assert_eq!(mock.entity("client.demo").unwrap().caps, new_caps);

    conn.auth().remove(&entity).await.unwrap();
    let err = conn.auth().get(&entity).await.unwrap_err();
    assert!(matches!(err, AuthError::NotFound(_)));
}

#[tokio::test(start_paused = true)]
async fn test_wait_for_online_retries_until_connected() {
    let mock = MockCluster::new();
    mock.fail_next_connects(2);
    let config = cluster_config(&mock, ConnectionOptions::default());
    let wait = WaitOptions::new(Duration::from_secs(300), Duration::from_secs(10)).unwrap();
    let start = Instant::now();

    config.wait_for_online(&wait).await.unwrap();

    assert_eq!(start.elapsed(), Duration::from_secs(20));
    assert_eq!(mock.state().connect_attempts, 3);
    assert!(config.cached_connection().is_some());
}

#[tokio::test(start_paused = true)]
async fn test_wait_for_online_times_out() {
    let mock = MockCluster::new();
    mock.set_online(false);
    let config = cluster_config(&mock, ConnectionOptions::default());
    let wait = WaitOptions::new(Duration::from_secs(30), Duration::from_secs(10)).unwrap();
    let start = Instant::now();

    let err = config.wait_for_online(&wait).await.unwrap_err();

    assert_eq!(start.elapsed(), Duration::from_secs(30));
    match err {
        MonClientError::Timeout {
            attempts,
            last_error,
            ..
        } => {
            assert_eq!(attempts, 3);
            assert!(last_error.unwrap().contains("timed out"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(mock.state().shutdowns, 3);
}
