use serde::{Deserialize, Serialize};

use crate::config::CredentialMode;

/// LoginRequest carries file-server credentials typed into the login dialog
#[derive(Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// SessionInfo reports the current session state
#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    pub credential_source: CredentialMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub logged_in: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_acl_prefix: Option<String>,
    pub transfer_protocol: String,
    pub file_server: String,
}
