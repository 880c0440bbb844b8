use anyhow::Result;
use std::env;

use crate::config::{Config, CredentialMode};

/// Username/password pair for the file server
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Per-operator state carried from one submission to the next
#[derive(Debug, Default)]
pub struct Session {
    pub login: Option<Credentials>,
    pub last_acl_prefix: Option<String>,
}

/// Where transfer credentials come from
pub trait CredentialSource: Send + Sync {
    fn mode(&self) -> CredentialMode;
    fn resolve(&self, session: &Session) -> Result<Credentials>;
}

/// Reads credentials from environment variables at the time of each transfer
#[derive(Debug, Clone)]
pub struct EnvCredentials {
    user_var: String,
    pass_var: String,
}

impl EnvCredentials {
    pub fn new(user_var: impl Into<String>, pass_var: impl Into<String>) -> Self {
        Self {
            user_var: user_var.into(),
            pass_var: pass_var.into(),
        }
    }
}

impl CredentialSource for EnvCredentials {
    fn mode(&self) -> CredentialMode {
        CredentialMode::Env
    }

    fn resolve(&self, _session: &Session) -> Result<Credentials> {
        let username = env::var(&self.user_var)
            .map_err(|_| anyhow::anyhow!("environment variable {} is not set", self.user_var))?;
        let password = env::var(&self.pass_var)
            .map_err(|_| anyhow::anyhow!("environment variable {} is not set", self.pass_var))?;
        Ok(Credentials { username, password })
    }
}

/// Uses whatever was entered in the login dialog for this session
#[derive(Debug, Clone, Default)]
pub struct LoginCredentials;

impl CredentialSource for LoginCredentials {
    fn mode(&self) -> CredentialMode {
        CredentialMode::Login
    }

    fn resolve(&self, session: &Session) -> Result<Credentials> {
        session
            .login
            .clone()
            .ok_or_else(|| anyhow::anyhow!("not logged in - provide file server credentials first"))
    }
}

/// Build the credential source selected by the configuration
pub fn from_config(config: &Config) -> Box<dyn CredentialSource> {
    match config.credential_mode {
        CredentialMode::Env => Box::new(EnvCredentials::new(
            config.credential_user_var.clone(),
            config.credential_pass_var.clone(),
        )),
        CredentialMode::Login => Box::new(LoginCredentials),
    }
}
