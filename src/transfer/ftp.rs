use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::Path;
use suppaftp::types::FileType;
use suppaftp::FtpStream;

use super::{run_blocking, Endpoint, FileTransfer, Protocol};
use crate::credentials::Credentials;

/// Plain FTP upload/download over suppaftp
#[derive(Debug, Clone)]
pub struct FtpTransfer {
    endpoint: Endpoint,
}

impl FtpTransfer {
    pub fn new(endpoint: Endpoint) -> Self {
        Self { endpoint }
    }

    /// Connect, log in and change into the remote directory
    fn connect(&self, creds: &Credentials) -> Result<FtpStream> {
        let addr = self.endpoint.socket_addr()?;
        let mut ftp = FtpStream::connect_timeout(addr, self.endpoint.timeout)
            .with_context(|| format!("FTP connection to {} failed", addr))?;

        ftp.login(creds.username.as_str(), creds.password.as_str())
            .with_context(|| format!("FTP login failed for {}", creds.username))?;

        let dir = self.endpoint.remote_dir.trim_end_matches('/');
        if !dir.is_empty() {
            ftp.cwd(dir)
                .with_context(|| format!("Failed to change to remote directory {}", dir))?;
        }
        ftp.transfer_type(FileType::Binary)?;
        Ok(ftp)
    }

    fn upload_blocking(&self, creds: &Credentials, local: &Path, remote_name: &str) -> Result<String> {
        let mut file = std::fs::File::open(local)
            .with_context(|| format!("Failed to read {}", local.display()))?;

        let mut ftp = self.connect(creds)?;
        let bytes = ftp
            .put_file(remote_name, &mut file)
            .with_context(|| format!("STOR {} failed", remote_name))?;
        let _ = ftp.quit();

        let remote_path = self.endpoint.remote_path(remote_name);
        tracing::info!(
            "Uploaded {} to {} as {} ({} bytes)",
            local.display(),
            self.endpoint.host,
            remote_path,
            bytes
        );
        Ok(remote_path)
    }

    fn download_blocking(&self, creds: &Credentials, remote_name: &str, local: &Path) -> Result<()> {
        let mut ftp = self.connect(creds)?;
        let buffer = ftp
            .retr_as_buffer(remote_name)
            .with_context(|| format!("RETR {} failed", remote_name))?;
        let _ = ftp.quit();

        std::fs::write(local, buffer.into_inner())
            .with_context(|| format!("Failed to write {}", local.display()))?;

        tracing::info!("Downloaded {} from {} to {}", remote_name, self.endpoint.host, local.display());
        Ok(())
    }
}

#[async_trait]
impl FileTransfer for FtpTransfer {
    fn protocol(&self) -> Protocol {
        Protocol::Ftp
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
        let local = local.to_path_buf();
        let remote_name = remote_name.to_string();
        run_blocking(move || this.download_blocking(&creds, &remote_name, &local)).await
    }

    async fn verify(&self, creds: &Credentials) -> Result<()> {
        let this = self.clone();
        let creds = creds.clone();
        run_blocking(move || {
            let mut ftp = this.connect(&creds)?;
            let _ = ftp.quit();
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_verify_without_server_fails() {
        let transfer = FtpTransfer::new(Endpoint {
            host: String::new(),
            port: 21,
            remote_dir: "ztp".into(),
            timeout: Duration::from_secs(1),
        });
        let err = transfer.verify(&Credentials::new("u", "p")).await.unwrap_err();
        assert!(err.to_string().contains("No file server configured"));
    }

    #[tokio::test]
    async fn test_upload_missing_local_file() {
        let transfer = FtpTransfer::new(Endpoint {
            host: "127.0.0.1".into(),
            port: 21,
            remote_dir: String::new(),
            timeout: Duration::from_secs(1),
        });
        let err = transfer
            .upload(&Credentials::new("u", "p"), Path::new("/nonexistent/data.csv"), "data.csv")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }
}
