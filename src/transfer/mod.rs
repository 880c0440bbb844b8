pub mod ftp;
pub mod sftp;

use anyhow::Result;
use async_trait::async_trait;
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::credentials::Credentials;

pub use ftp::FtpTransfer;
pub use sftp::SftpTransfer;

/// File-server protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Ftp,
    Sftp,
}

impl Protocol {
    pub fn default_port(self) -> u16 {
        match self {
            Protocol::Ftp => 21,
            Protocol::Sftp => 22,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Protocol::Ftp => "ftp",
            Protocol::Sftp => "sftp",
        }
    }
}

impl std::str::FromStr for Protocol {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "ftp" => Ok(Protocol::Ftp),
            "sftp" | "ssh" => Ok(Protocol::Sftp),
            other => Err(anyhow::anyhow!("Unsupported transfer protocol: {}", other)),
        }
    }
}

/// Where and how to reach the file server
#[derive(Debug, Clone)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
    pub remote_dir: String,
    pub timeout: Duration,
}

impl Endpoint {
    pub fn from_config(config: &Config) -> Self {
        Self {
            host: config.file_server.clone(),
            port: config.effective_port(),
            remote_dir: config.remote_dir.clone(),
            timeout: Duration::from_secs(config.transfer_timeout_secs),
        }
    }

    /// Resolve host:port to the first socket address
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        if self.host.is_empty() {
            return Err(anyhow::anyhow!("No file server configured"));
        }
        (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|e| anyhow::anyhow!("Invalid address {}:{}: {}", self.host, self.port, e))?
            .next()
            .ok_or_else(|| anyhow::anyhow!("{}:{} did not resolve", self.host, self.port))
    }

    /// Remote path of a file inside the remote directory
    pub fn remote_path(&self, name: &str) -> String {
        let dir = self.remote_dir.trim_end_matches('/');
        if dir.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", dir, name)
        }
    }
}

/// A blocking file-transfer backend exposed through async methods.
/// Implementations run the library calls on the blocking thread pool.
#[async_trait]
pub trait FileTransfer: Send + Sync {
    fn protocol(&self) -> Protocol;

    /// Upload `local` as `remote_name` inside the remote directory; returns the remote path
    async fn upload(&self, creds: &Credentials, local: &Path, remote_name: &str) -> Result<String>;

    /// Fetch `remote_name` from the remote directory into `local`
    async fn download(&self, creds: &Credentials, remote_name: &str, local: &Path) -> Result<()>;

    /// Connect and authenticate without moving any file
    async fn verify(&self, creds: &Credentials) -> Result<()>;
}

/// Build the transfer backend selected by the configuration
pub fn from_config(config: &Config) -> Arc<dyn FileTransfer> {
    let endpoint = Endpoint::from_config(config);
    match config.transfer_protocol {
        Protocol::Ftp => Arc::new(FtpTransfer::new(endpoint)),
        Protocol::Sftp => Arc::new(SftpTransfer::new(endpoint)),
    }
}

/// Run a blocking transfer closure on the blocking pool
pub(crate) async fn run_blocking<T, F>(f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| anyhow::anyhow!("Task join error: {}", e))?
}
