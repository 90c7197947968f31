//! Ceph configuration file parser
//!
//! This crate parses Ceph configuration files (ceph.conf), locates the
//! platform default configuration for a cluster, and parses the handful of
//! option formats the connection layer cares about (`mon host` lists and
//! duration strings).
//!
//! # Example
//!
//! ```no_run
//! use cephconfig::CephConfig;
//!
//! let config = CephConfig::from_file("/etc/ceph/ceph.conf").unwrap();
//! let mon_addrs = config.mon_addrs();
//! let keyring = config.keyring();
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Cluster name used when none is configured
pub const DEFAULT_CLUSTER: &str = "ceph";

/// Environment variable that overrides the configuration search path
pub const CEPH_CONF_ENV: &str = "CEPH_CONF";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(String),

    #[error("Missing required option: {0}")]
    MissingOption(String),

    #[error("Invalid monitor address '{addr}': {reason}")]
    InvalidMonAddr { addr: String, reason: String },

    #[error("No configuration file found (searched: {})", display_paths(.0))]
    NotFound(Vec<PathBuf>),
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Normalize an option name so `mon host`, `mon_host` and `mon-host` match.
pub fn normalize_key(key: &str) -> String {
    key.trim()
        .split(|c: char| c == ' ' || c == '_' || c == '-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

/// Configuration files searched when no explicit path is given, in order.
///
/// `$CEPH_CONF` wins when set; otherwise `/etc/ceph/$cluster.conf`,
/// `~/.ceph/$cluster.conf` and `./$cluster.conf`.
pub fn default_config_paths(cluster: &str) -> Vec<PathBuf> {
    search_paths(
        cluster,
        std::env::var_os(CEPH_CONF_ENV).map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
    )
}

fn search_paths(cluster: &str, env_conf: Option<PathBuf>, home: Option<PathBuf>) -> Vec<PathBuf> {
    if let Some(path) = env_conf.filter(|p| !p.as_os_str().is_empty()) {
        return vec![path];
    }

    let file_name = format!("{}.conf", cluster);
    let mut paths = vec![Path::new("/etc/ceph").join(&file_name)];
    if let Some(home) = home {
        paths.push(home.join(".ceph").join(&file_name));
    }
    paths.push(PathBuf::from(file_name));
    paths
}

/// Parse a `mon host` value into individual monitor addresses.
///
/// Accepts the forms ceph itself accepts: whitespace, comma or semicolon
/// separated lists, optional `v1:`/`v2:` prefixes, bracketed addrvecs such as
/// `[v2:10.0.0.1:3300,v1:10.0.0.1:6789]`, bare hostnames and bracketed IPv6
/// addresses.
pub fn parse_mon_host(mon_host: &str) -> Result<Vec<String>, ConfigError> {
    let mut addrs = Vec::new();

    for part in mon_host.split(|c: char| c.is_whitespace() || c == ',' || c == ';') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        // Strip addrvec brackets, but not the bracket of an IPv6 literal
        let mut addr = part;
        if addr.starts_with("[v") {
            addr = &addr[1..];
        }
        if addr.ends_with(']') && !addr.contains("[") {
            addr = &addr[..addr.len() - 1];
        }

        validate_mon_addr(addr)?;
        addrs.push(addr.to_string());
    }

    if addrs.is_empty() {
        return Err(ConfigError::ParseError(
            "No monitor addresses found in 'mon host'".to_string(),
        ));
    }

    Ok(addrs)
}

fn validate_mon_addr(addr: &str) -> Result<(), ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidMonAddr {
        addr: addr.to_string(),
        reason: reason.to_string(),
    };

    let rest = addr
        .strip_prefix("v1:")
        .or_else(|| addr.strip_prefix("v2:"))
        .unwrap_or(addr);

    let (host, port) = if let Some(v6) = rest.strip_prefix('[') {
        let (host, tail) = v6
            .split_once(']')
            .ok_or_else(|| invalid("unterminated IPv6 literal"))?;
        if host.parse::<std::net::Ipv6Addr>().is_err() {
            return Err(invalid("invalid IPv6 address"));
        }
        match tail {
            "" => (host, None),
            t => (
                host,
                Some(
                    t.strip_prefix(':')
                        .ok_or_else(|| invalid("unexpected characters after IPv6 literal"))?,
                ),
            ),
        }
    } else {
        match rest.rsplit_once(':') {
            Some((host, port)) => (host, Some(port)),
            None => (rest, None),
        }
    };

    if host.is_empty() {
        return Err(invalid("empty host"));
    }
    if !rest.starts_with('[')
        && !host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_')
    {
        return Err(invalid("invalid characters in host"));
    }
    if let Some(port) = port {
        // Strip a trailing nonce (`/0`) as found in monmap dumps
        let port = port.split('/').next().unwrap_or(port);
        port.parse::<u16>()
            .map_err(|_| invalid("port is not a number between 0 and 65535"))?;
    }

    Ok(())
}

/// Parse duration string with time units (s, ms, us, m, h, d)
pub fn parse_duration(s: &str) -> Result<std::time::Duration, ConfigError> {
    let s = s.trim();

    let num_end = s
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(s.len());

    let num_str = &s[..num_end];
    let unit = &s[num_end..].trim().to_lowercase();

    let num: f64 = num_str
        .parse()
        .map_err(|_| ConfigError::ParseError(format!("Invalid number: {}", num_str)))?;

    let seconds = match unit.as_str() {
        "" | "s" | "sec" | "second" | "seconds" => num,
        "ms" | "msec" | "millisecond" | "milliseconds" => num / 1000.0,
        "us" | "usec" | "microsecond" | "microseconds" => num / 1_000_000.0,
        "m" | "min" | "minute" | "minutes" => num * 60.0,
        "h" | "hr" | "hour" | "hours" => num * 3600.0,
        "d" | "day" | "days" => num * 86400.0,
        _ => {
            return Err(ConfigError::ParseError(format!(
                "Unknown time unit: {}",
                unit
            )))
        }
    };

    Ok(std::time::Duration::from_secs_f64(seconds))
}

/// Represents a parsed Ceph configuration
#[derive(Debug, Clone, Default)]
pub struct CephConfig {
    sections: HashMap<String, HashMap<String, String>>,
}

impl CephConfig {
    /// Parse a Ceph configuration file from the given path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Load the first configuration file found on the default search path
    pub fn from_default_location(cluster: &str) -> Result<(Self, PathBuf), ConfigError> {
        let candidates = default_config_paths(cluster);
        for path in &candidates {
            if path.is_file() {
                let config = Self::from_file(path)?;
                return Ok((config, path.clone()));
            }
        }
        Err(ConfigError::NotFound(candidates))
    }

    /// Parse a Ceph configuration from a string
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let mut config = CephConfig::default();
        let mut current_section = String::from("global");

        for (lineno, line) in content.lines().enumerate() {
            let line = line.trim();

            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }

            if line.starts_with('[') {
                if !line.ends_with(']') || line.len() < 3 {
                    return Err(ConfigError::ParseError(format!(
                        "line {}: malformed section header '{}'",
                        lineno + 1,
                        line
                    )));
                }
                current_section = line[1..line.len() - 1].trim().to_string();
                config.sections.entry(current_section.clone()).or_default();
                continue;
            }

            match line.split_once('=') {
                Some((key, value)) => {
                    // Trailing comments need leading whitespace; a bare ';'
                    // is a valid mon host separator
                    let value = [" #", "\t#", " ;", "\t;"]
                        .iter()
                        .filter_map(|marker| value.find(marker))
                        .min()
                        .map_or(value, |end| &value[..end])
                        .trim();
                    config.set(&current_section, key, value);
                }
                None => {
                    return Err(ConfigError::ParseError(format!(
                        "line {}: expected 'key = value', got '{}'",
                        lineno + 1,
                        line
                    )));
                }
            }
        }

        Ok(config)
    }

    /// Set an option in a section, replacing any previous value
    pub fn set(&mut self, section: &str, key: &str, value: &str) {
        self.sections
            .entry(section.to_string())
            .or_default()
            .insert(normalize_key(key), value.to_string());
    }

    /// Get a configuration value from a specific section
    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections
            .get(section)
            .and_then(|s| s.get(&normalize_key(key)))
            .map(|v| v.as_str())
    }

    /// Get a configuration value, checking multiple sections in order
    /// Typically checks: specific section -> client -> global
    pub fn get_with_fallback(&self, sections: &[&str], key: &str) -> Option<&str> {
        sections.iter().find_map(|section| self.get(section, key))
    }

    /// Monitor addresses from the `mon host` option
    pub fn mon_addrs(&self) -> Result<Vec<String>, ConfigError> {
        let mon_host = self
            .get_with_fallback(&["client", "global"], "mon host")
            .ok_or_else(|| ConfigError::MissingOption("mon host".to_string()))?;
        parse_mon_host(mon_host)
    }

    /// Get keyring file path
    pub fn keyring(&self) -> Result<String, ConfigError> {
        self.get_with_fallback(&["client", "global"], "keyring")
            .map(|s| s.to_string())
            .ok_or_else(|| ConfigError::MissingOption("keyring".to_string()))
    }

    /// Get entity name (defaults to "client.admin" if not specified)
    pub fn entity_name(&self) -> String {
        self.get_with_fallback(&["client", "global"], "entity name")
            .unwrap_or("client.admin")
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const TEST_CONFIG: &str = r#"
; Test configuration
[global]
fsid = 7150dbe1-1803-44b9-9a3d-b893308fd02e
mon host = [v2:192.168.1.43:40472,v1:192.168.1.43:40473] [v2:192.168.1.43:40474,v1:192.168.1.43:40475]

[client]
keyring = /etc/ceph/ceph.client.admin.keyring   # admin keyring
log-file = /var/log/ceph/$name.$pid.log

[mon]
debug mon = 20
"#;

    #[test]
    fn test_parse_config() {
        let config = CephConfig::parse(TEST_CONFIG).unwrap();

        assert_eq!(
            config.get("global", "fsid"),
            Some("7150dbe1-1803-44b9-9a3d-b893308fd02e")
        );
        assert_eq!(
            config.get("client", "keyring"),
            Some("/etc/ceph/ceph.client.admin.keyring")
        );
        assert_eq!(config.get("mon", "debug_mon"), Some("20"));
        assert_eq!(
            config.get("client", "log file"),
            Some("/var/log/ceph/$name.$pid.log")
        );
    }

    #[test]
    fn test_key_normalization() {
        assert_eq!(normalize_key("mon host"), "mon_host");
        assert_eq!(normalize_key("mon-host"), "mon_host");
        assert_eq!(normalize_key("  mon__host "), "mon_host");
    }

    #[test]
    fn test_malformed_lines_rejected() {
        assert!(CephConfig::parse("[global\nfoo = bar").is_err());
        assert!(CephConfig::parse("[global]\njust some words").is_err());
    }

    #[test]
    fn test_mon_addrs() {
        let config = CephConfig::parse(TEST_CONFIG).unwrap();
        let addrs = config.mon_addrs().unwrap();

        assert_eq!(
            addrs,
            vec![
                "v2:192.168.1.43:40472",
                "v1:192.168.1.43:40473",
                "v2:192.168.1.43:40474",
                "v1:192.168.1.43:40475",
            ]
        );
    }

    #[test]
    fn test_parse_mon_host_forms() {
        assert_eq!(
            parse_mon_host("10.0.0.1,10.0.0.2:6789 mon3.example.com").unwrap(),
            vec!["10.0.0.1", "10.0.0.2:6789", "mon3.example.com"]
        );
        assert_eq!(
            parse_mon_host("[::1]:3300; v2:[fe80::1]:3300").unwrap(),
            vec!["[::1]:3300", "v2:[fe80::1]:3300"]
        );
        assert_eq!(
            parse_mon_host("v1:10.0.0.1:6789/0").unwrap(),
            vec!["v1:10.0.0.1:6789/0"]
        );
    }

    #[test]
    fn test_parse_mon_host_rejects_garbage() {
        assert!(parse_mon_host("").is_err());
        assert!(parse_mon_host(" , ").is_err());
        assert!(matches!(
            parse_mon_host("10.0.0.1:notaport"),
            Err(ConfigError::InvalidMonAddr { .. })
        ));
        assert!(matches!(
            parse_mon_host("10.0.0.1:70000"),
            Err(ConfigError::InvalidMonAddr { .. })
        ));
        assert!(matches!(
            parse_mon_host("mon!host"),
            Err(ConfigError::InvalidMonAddr { .. })
        ));
        assert!(matches!(
            parse_mon_host("[::1"),
            Err(ConfigError::InvalidMonAddr { .. })
        ));
    }

    #[test]
    fn test_keyring() {
        let config = CephConfig::parse(TEST_CONFIG).unwrap();
        assert_eq!(
            config.keyring().unwrap(),
            "/etc/ceph/ceph.client.admin.keyring"
        );

        let empty = CephConfig::parse("[global]\n").unwrap();
        assert!(matches!(
            empty.keyring(),
            Err(ConfigError::MissingOption(_))
        ));
    }

    #[test]
    fn test_entity_name_default() {
        let config = CephConfig::parse(TEST_CONFIG).unwrap();
        assert_eq!(config.entity_name(), "client.admin");
    }

    #[test]
    fn test_get_with_fallback() {
        let config = CephConfig::parse(TEST_CONFIG).unwrap();

        assert_eq!(
            config.get_with_fallback(&["client", "global"], "fsid"),
            Some("7150dbe1-1803-44b9-9a3d-b893308fd02e")
        );
        assert_eq!(
            config.get_with_fallback(&["client", "global"], "nonexistent"),
            None
        );
    }

    #[test]
    fn test_set_overrides() {
        let mut config = CephConfig::parse(TEST_CONFIG).unwrap();
        config.set("global", "mon-host", "10.1.1.1");
        assert_eq!(config.mon_addrs().unwrap(), vec!["10.1.1.1"]);
    }

    #[test]
    fn test_search_paths() {
        let paths = search_paths("prod", None, Some(PathBuf::from("/home/ops")));
        assert_eq!(
            paths,
            vec![
                PathBuf::from("/etc/ceph/prod.conf"),
                PathBuf::from("/home/ops/.ceph/prod.conf"),
                PathBuf::from("prod.conf"),
            ]
        );

        let paths = search_paths(
            "prod",
            Some(PathBuf::from("/tmp/override.conf")),
            Some(PathBuf::from("/home/ops")),
        );
        assert_eq!(paths, vec![PathBuf::from("/tmp/override.conf")]);

        let paths = search_paths(DEFAULT_CLUSTER, Some(PathBuf::new()), None);
        assert_eq!(paths[0], PathBuf::from("/etc/ceph/ceph.conf"));
    }

    #[test]
    fn test_from_file_missing() {
        let err = CephConfig::from_file("/nonexistent/ceph.conf").unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("30").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("5m").unwrap(), Duration::from_secs(300));
        assert_eq!(parse_duration("5 min").unwrap(), Duration::from_secs(300));
        assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
        assert_eq!(parse_duration("1d").unwrap(), Duration::from_secs(86400));
        assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
        assert!(parse_duration("5 fortnights").is_err());
        assert!(parse_duration("soon").is_err());
    }
}
