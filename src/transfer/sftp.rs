use anyhow::{Context, Result};
use async_trait::async_trait;
use std::io::{Read, Write};
use std::net::TcpStream;
use std::path::{Path, PathBuf};

use super::{run_blocking, Endpoint, FileTransfer, Protocol};
use crate::credentials::Credentials;

/// Keyboard-interactive prompt handler that always responds with the password
struct PasswordPrompt {
    password: String,
}

impl ssh2::KeyboardInteractivePrompt for PasswordPrompt {
    fn prompt<'a>(
        &mut self,
        _username: &str,
        _instructions: &str,
        prompts: &[ssh2::Prompt<'a>],
    ) -> Vec<String> {
        prompts.iter().map(|_| self.password.clone()).collect()
    }
}

/// Create an SSH session and authenticate with password + keyboard-interactive.
/// This is blocking, so call from a spawn_blocking context.
pub fn ssh_connect(endpoint: &Endpoint, creds: &Credentials) -> Result<ssh2::Session> {
    let addr = endpoint.socket_addr()?;
    let tcp = TcpStream::connect_timeout(&addr, endpoint.timeout)
        .with_context(|| format!("TCP connection to {} failed", addr))?;

    tcp.set_read_timeout(Some(endpoint.timeout)).ok();
    tcp.set_write_timeout(Some(endpoint.timeout)).ok();

    let mut session = ssh2::Session::new().context("Failed to create SSH session")?;
    session.set_tcp_stream(tcp);
    session.set_timeout(u32::try_from(endpoint.timeout.as_millis()).unwrap_or(u32::MAX));
    session.handshake().context("SSH handshake failed")?;

    // Try password auth first
    match session.userauth_password(&creds.username, &creds.password) {
        Ok(_) if session.authenticated() => return Ok(session),
        _ => {}
    }

    // Some servers only offer keyboard-interactive
    let mut prompter = PasswordPrompt { password: creds.password.clone() };
    let _ = session.userauth_keyboard_interactive(&creds.username, &mut prompter);

    if session.authenticated() {
        Ok(session)
    } else {
        Err(anyhow::anyhow!("SSH authentication failed for {}", creds.username))
    }
}

/// SFTP upload/download over ssh2
#[derive(Debug, Clone)]
pub struct SftpTransfer {
    endpoint: Endpoint,
}

impl SftpTransfer {
    pub fn new(endpoint: Endpoint) -> Self {
        Self { endpoint }
    }

    fn upload_blocking(&self, creds: &Credentials, local: &Path, remote_name: &str) -> Result<String> {
        let mut content = Vec::new();
        std::fs::File::open(local)
            .and_then(|mut f| f.read_to_end(&mut content))
            .with_context(|| format!("Failed to read {}", local.display()))?;

        let session = ssh_connect(&self.endpoint, creds)?;
        let sftp = session.sftp().context("Failed to start SFTP subsystem")?;

        let remote_path = self.endpoint.remote_path(remote_name);
        let mut remote = sftp
            .create(Path::new(&remote_path))
            .with_context(|| format!("Failed to create remote file {}", remote_path))?;
        remote
            .write_all(&content)
            .with_context(|| format!("Failed to write remote file {}", remote_path))?;

        tracing::info!(
            "Uploaded {} to {} as {} ({} bytes)",
            local.display(),
            self.endpoint.host,
            remote_path,
            content.len()
        );
        Ok(remote_path)
    }

    fn download_blocking(&self, creds: &Credentials, remote_name: &str, local: &Path) -> Result<()> {
        let session = ssh_connect(&self.endpoint, creds)?;
        let sftp = session.sftp().context("Failed to start SFTP subsystem")?;

        let remote_path = self.endpoint.remote_path(remote_name);
        let mut remote = sftp
            .open(Path::new(&remote_path))
            .with_context(|| format!("Failed to open remote file {}", remote_path))?;
        let mut content = Vec::new();
        remote.read_to_end(&mut content)?;

        std::fs::write(local, &content)
            .with_context(|| format!("Failed to write {}", local.display()))?;

        tracing::info!("Downloaded {} from {} to {}", remote_path, self.endpoint.host, local.display());
        Ok(())
    }
}

#[async_trait]
impl FileTransfer for SftpTransfer {
    fn protocol(&self) -> Protocol {
        Protocol::Sftp
    }

    async fn upload(&self, creds: &Credentials, local: &Path, remote_name: &str) -> Result<String> {
        let this = self.clone();
        let creds = creds.clone();
        let local = local.to_path_buf();
        let remote_name = remote_name.to_string();
        run_blocking(move || this.upload_blocking(&creds, &local, &remote_name)).await
    }

    async fn download(&self, creds: &Credentials, remote_name: &str, local: &Path) -> Result<()> {
        let this = self.clone();
        let creds = creds.clone();
        let local: PathBuf = local.to_path_buf();
        let remote_name = remote_name.to_string();
        run_blocking(move || this.download_blocking(&creds, &remote_name, &local)).await
    }

    async fn verify(&self, creds: &Credentials) -> Result<()> {
        let endpoint = self.endpoint.clone();
        let creds = creds.clone();
        run_blocking(move || ssh_connect(&endpoint, &creds).map(|_| ())).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn unreachable_endpoint() -> Endpoint {
        // Bind then drop a listener so the port is closed
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        Endpoint {
            host: "127.0.0.1".into(),
            port,
            remote_dir: "ztp".into(),
            timeout: Duration::from_secs(1),
        }
    }

    #[tokio::test]
    async fn test_upload_missing_local_file() {
        let transfer = SftpTransfer::new(unreachable_endpoint());
        let creds = Credentials::new("u", "p");
        let err = transfer
            .upload(&creds, Path::new("/nonexistent/sw-confg"), "sw-confg")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }

    #[tokio::test]
    async fn test_verify_connection_refused() {
        let transfer = SftpTransfer::new(unreachable_endpoint());
        let err = transfer.verify(&Credentials::new("u", "p")).await.unwrap_err();
        assert!(err.to_string().contains("TCP connection"));
    }
}
