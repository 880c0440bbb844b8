use std::env;

use crate::transfer::Protocol;

/// Models offered by the form when DEVICE_MODELS is not set
pub const DEFAULT_MODELS: &[&str] = &[
    "C9200L-24P-4X",
    "C9300L-48P-4X",
    "WS-C3650-48FD-L",
    "ZTP-C9200L-24P-4X",
];

/// Where transfer credentials come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialMode {
    /// Read from environment variables at transfer time
    Env,
    /// Supplied through the login endpoint and kept on the session
    Login,
}

/// Config holds all application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: String,
    pub frontend_dir: String,
    pub templates_dir: String,
    pub network_table: String,
    pub output_dir: String,
    pub record_csv: String,
    pub device_models: Vec<String>,
    pub acl_octets: usize,
    pub transfer_protocol: Protocol,
    pub file_server: String,
    pub transfer_port: Option<u16>,
    pub remote_dir: String,
    pub transfer_timeout_secs: u64,
    pub upload_record_csv: bool,
    pub credential_mode: CredentialMode,
    pub credential_user_var: String,
    pub credential_pass_var: String,
    pub login_verify: bool,
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn load() -> Self {
        let device_models = parse_list(&get_env("DEVICE_MODELS", ""));

        Self {
            listen_addr: get_env("LISTEN_ADDR", "0.0.0.0:8080"),
            frontend_dir: get_env("FRONTEND_DIR", "./frontend"),
            templates_dir: get_env("TEMPLATES_DIR", "./templates"),
            network_table: get_env("NETWORK_TABLE", "./network_config.json"),
            output_dir: get_env("OUTPUT_DIR", "./generated_configs"),
            record_csv: get_env("RECORD_CSV", "./data.csv"),
            device_models: if device_models.is_empty() {
                DEFAULT_MODELS.iter().map(|m| m.to_string()).collect()
            } else {
                device_models
            },
            acl_octets: parse_acl_octets(&get_env("ACL_OCTETS", "3")),
            transfer_protocol: get_env("TRANSFER_PROTOCOL", "sftp")
                .parse()
                .unwrap_or_else(|e| {
                    tracing::warn!("{} - falling back to sftp", e);
                    Protocol::Sftp
                }),
            // Older deployments export the server address as `ftp_server_ip`
            file_server: env::var("FILE_SERVER")
                .or_else(|_| env::var("ftp_server_ip"))
                .unwrap_or_default(),
            transfer_port: env::var("TRANSFER_PORT").ok().and_then(|p| p.parse().ok()),
            remote_dir: get_env("REMOTE_DIR", "ztp"),
            transfer_timeout_secs: parse_timeout_secs(&get_env("TRANSFER_TIMEOUT_SECS", "30")),
            upload_record_csv: parse_bool(&get_env("UPLOAD_RECORD_CSV", "false")),
            credential_mode: match get_env("CREDENTIAL_SOURCE", "env").to_lowercase().as_str() {
                "login" | "prompt" => CredentialMode::Login,
                _ => CredentialMode::Env,
            },
            credential_user_var: get_env("CREDENTIAL_USER_VAR", "username"),
            credential_pass_var: get_env("CREDENTIAL_PASS_VAR", "passwordAD"),
            login_verify: parse_bool(&get_env("LOGIN_VERIFY", "true")),
        }
    }

    /// Port for the configured protocol, honoring an explicit override
    pub fn effective_port(&self) -> u16 {
        self.transfer_port
            .unwrap_or_else(|| self.transfer_protocol.default_port())
    }
}

fn get_env(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

fn parse_bool(raw: &str) -> bool {
    matches!(raw.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

/// ACL prefixes are built from one to three leading octets
fn parse_acl_octets(raw: &str) -> usize {
    match raw.trim().parse::<usize>() {
        Ok(n) if (1..=3).contains(&n) => n,
        _ => {
            tracing::warn!("ACL_OCTETS must be 1-3, got {:?} - using 3", raw);
            3
        }
    }
}

/// Transfer timeout in whole seconds, 1 hour at most
fn parse_timeout_secs(raw: &str) -> u64 {
    match raw.trim().parse::<u64>() {
        Ok(n) if (1..=3600).contains(&n) => n,
        _ => {
            tracing::warn!("TRANSFER_TIMEOUT_SECS must be 1-3600, got {:?} - using 30", raw);
            30
        }
    }
}

#[cfg(test)]
impl Config {
    /// Configuration rooted in a scratch directory, used by tests
    pub fn for_dir(dir: &std::path::Path) -> Self {
        let path = |name: &str| dir.join(name).to_string_lossy().into_owned();
        Self {
            listen_addr: "127.0.0.1:0".to_string(),
            frontend_dir: path("frontend"),
            templates_dir: path("templates"),
            network_table: path("network_config.json"),
            output_dir: path("generated_configs"),
            record_csv: path("data.csv"),
            device_models: DEFAULT_MODELS.iter().map(|m| m.to_string()).collect(),
            acl_octets: 3,
            transfer_protocol: Protocol::Sftp,
            file_server: "127.0.0.1".to_string(),
            transfer_port: None,
            remote_dir: "ztp".to_string(),
            transfer_timeout_secs: 1,
            upload_record_csv: false,
            credential_mode: CredentialMode::Env,
            credential_user_var: "CM_TEST_USER".to_string(),
            credential_pass_var: "CM_TEST_PASS".to_string(),
            login_verify: false,
        }
    }
}
