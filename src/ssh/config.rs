//! SSH Configuration

use serde::{Deserialize, Serialize};

/// SSH connection configuration for the control channel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SshConfig {
    /// Remote host address
    pub host: String,

    /// SSH port (default: 22)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Username for authentication
    pub username: String,

    /// Authentication method
    pub auth: AuthMethod,

    /// Connection timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Interval between SSH keepalive probes, in seconds
    #[serde(default = "default_keepalive")]
    pub keepalive_interval_secs: u64,

    /// Pinned SHA-256 host key fingerprint (e.g. `SHA256:abc...`).
    /// When `None` every host key is accepted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_key_fingerprint: Option<String>,
}

impl SshConfig {
    /// `host:port` of the SSH server, as shown in connection descriptors
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Authentication methods supported
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthMethod {
    /// Password authentication
    Password { password: String },

    /// SSH key authentication
    Key {
        /// Path to private key file
        key_path: String,
        /// Optional passphrase for encrypted keys
        passphrase: Option<String>,
    },
}

impl AuthMethod {
    pub fn password(password: impl Into<String>) -> Self {
        Self::Password {
            password: password.into(),
        }
    }

    pub fn key(key_path: impl Into<String>, passphrase: Option<String>) -> Self {
        Self::Key {
            key_path: key_path.into(),
            passphrase,
        }
    }
}

fn default_port() -> u16 {
    22
}

fn default_timeout() -> u64 {
    30
}

fn default_keepalive() -> u64 {
    30
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 22,
            username: String::new(),
            auth: AuthMethod::Password {
                password: String::new(),
            },
            timeout_secs: 30,
            keepalive_interval_secs: 30,
            host_key_fingerprint: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_applied_on_deserialize() {
        let config: SshConfig = serde_json::from_str(
            r#"{"host":"bastion","username":"ops","auth":{"type":"password","password":"pw"}}"#,
        )
        .unwrap();
        assert_eq!(config.port, 22);
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.keepalive_interval_secs, 30);
        assert!(config.host_key_fingerprint.is_none());
        assert_eq!(config.server_addr(), "bastion:22");
    }

    #[test]
    fn test_key_auth_roundtrip() {
        let auth = AuthMethod::key("/home/ops/.ssh/id_ed25519", None);
        let json = serde_json::to_string(&auth).unwrap();
        assert!(json.contains(r#""type":"key""#));
    }
}
