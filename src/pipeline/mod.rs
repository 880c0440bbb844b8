//! The provisioning pipeline: validate -> persist -> locate -> render -> transfer.
//!
//! Only validation failures abort a submission. Lookup misses, render errors,
//! and transfer errors are logged and reported in the returned outcome so the
//! form stays usable.

use anyhow::Result;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::Config;
use crate::credentials::{self, CredentialSource, Credentials, Session};
use crate::locations::{find_location, LocationTable};
use crate::models::*;
use crate::records;
use crate::render::{Renderer, TemplateVars};
use crate::transfer::{self, FileTransfer};
use crate::utils::{
    acl_prefix, is_single_line_text, is_valid_hostname, is_valid_mac_address, is_valid_vlan_id,
    output_filename, parse_ipv4, ValidationError,
};

/// Remote name used when the record file itself is uploaded or fetched
const RECORD_REMOTE_NAME: &str = "data.csv";

/// Outcome of rendering one record
#[derive(Debug)]
enum RenderResult {
    Rendered {
        location: LocationMatch,
        output_path: PathBuf,
    },
    Skipped(String),
    Failed(String),
}

/// Pipeline wires the configured strategies together
pub struct Pipeline {
    config: Config,
    renderer: Renderer,
    transfer: Arc<dyn FileTransfer>,
    credentials: Box<dyn CredentialSource>,
}

impl Pipeline {
    pub fn new(
        config: Config,
        transfer: Arc<dyn FileTransfer>,
        credentials: Box<dyn CredentialSource>,
    ) -> Self {
        Self {
            renderer: Renderer::new(&config.templates_dir),
            config,
            transfer,
            credentials,
        }
    }

    /// Pipeline with the transfer protocol and credential source chosen by the config
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.clone(),
            transfer::from_config(config),
            credentials::from_config(config),
        )
    }

    /// Turn raw form fields into a DeviceRecord, or report the first bad field
    pub fn validate(&self, req: &SubmitRequest) -> Result<DeviceRecord, ValidationError> {
        let hostname = req.hostname.trim();
        if !is_valid_hostname(hostname) {
            return Err(ValidationError::new(
                "hostname",
                "must be 1-253 characters of letters, digits, '.', '-' or '_'",
            ));
        }

        let ip = parse_ipv4(&req.ip_address)?;

        let model = req.model.trim();
        if !self.config.device_models.iter().any(|m| m == model) {
            return Err(ValidationError::new(
                "model",
                format!("{:?} is not one of {}", model, self.config.device_models.join(", ")),
            ));
        }

        for (field, value) in [("data_vlan_id", &req.data_vlan_id), ("voice_vlan_id", &req.voice_vlan_id)] {
            if !is_valid_vlan_id(value.trim()) {
                return Err(ValidationError::new(field, "must be a VLAN id between 1 and 4094"));
            }
        }

        for (field, value) in [
            ("snmp_location", &req.snmp_location),
            ("data_vlan_name", &req.data_vlan_name),
            ("voice_vlan_name", &req.voice_vlan_name),
        ] {
            if !is_single_line_text(value.trim()) {
                return Err(ValidationError::new(
                    field,
                    "must be a single line without control characters or '\"'",
                ));
            }
        }

        let mac_address = match req.mac_address.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(mac) if is_valid_mac_address(mac) => Some(mac.to_lowercase()),
            Some(_) => {
                return Err(ValidationError::new(
                    "mac_address",
                    "should be 12 characters 0-9 & a-f",
                ));
            }
        };

        Ok(DeviceRecord {
            hostname: hostname.to_string(),
            ip_address: ip.to_string(),
            location: req.snmp_location.trim().to_string(),
            access_vlan_id: req.data_vlan_id.trim().to_string(),
            access_vlan_name: req.data_vlan_name.trim().to_string(),
            voice_vlan_id: req.voice_vlan_id.trim().to_string(),
            voice_vlan_name: req.voice_vlan_name.trim().to_string(),
            model: model.to_string(),
            mac_address,
        })
    }

    /// Run one form submission through the whole pipeline.
    /// Returns `Err` only when the form input is invalid.
    pub async fn submit(
        &self,
        session: &mut Session,
        req: SubmitRequest,
    ) -> Result<SubmitOutcome, ValidationError> {
        let record = self.validate(&req)?;
        let ip = parse_ipv4(&record.ip_address)?;

        let acl = acl_prefix(ip, self.config.acl_octets);
        session.last_acl_prefix = Some(acl.clone());

        let filename = output_filename(&record.hostname, record.mac_address.as_deref());
        if record.mac_address.is_some() {
            tracing::info!("ZTP submission for {} - output file will be {}", record.hostname, filename);
        }

        let mut outcome = SubmitOutcome {
            hostname: record.hostname.clone(),
            filename: filename.clone(),
            acl_prefix: acl.clone(),
            status: render_status::FAILED.to_string(),
            location: None,
            output_path: None,
            csv_upload: UploadStatus::NotRequested,
            upload: UploadStatus::NotRequested,
            message: String::new(),
            completed_at: Utc::now(),
        };

        // Persist
        let csv_path = PathBuf::from(&self.config.record_csv);
        if let Err(e) = records::write_record_async(&csv_path, &record).await {
            tracing::error!("Failed to write record file: {:#}", e);
            outcome.message = format!("Failed to write record file: {:#}", e);
            outcome.completed_at = Utc::now();
            return Ok(outcome);
        }

        if req.upload && self.config.upload_record_csv {
            outcome.csv_upload = self.upload(session, &csv_path, RECORD_REMOTE_NAME).await;
        }

        // Locate + render
        let table = match LocationTable::load(&self.config.network_table).await {
            Ok(t) => t,
            Err(e) => {
                tracing::error!("{:#}", e);
                outcome.message = format!("{:#}", e);
                outcome.completed_at = Utc::now();
                return Ok(outcome);
            }
        };

        match self.render_record(&record, &table, &acl, &filename).await {
            RenderResult::Rendered { location, output_path } => {
                outcome.status = render_status::RENDERED.to_string();
                outcome.location = Some(location);
                outcome.output_path = Some(output_path.to_string_lossy().into_owned());

                if req.upload {
                    outcome.upload = self.upload(session, &output_path, &filename).await;
                }

                outcome.message = match &outcome.upload {
                    UploadStatus::NotRequested => format!("Config written to {}", output_path.display()),
                    UploadStatus::Succeeded { remote_path } => format!("Upload successful: {}", remote_path),
                    UploadStatus::Failed { error } => format!("Upload failed: {}", error),
                };
            }
            RenderResult::Skipped(reason) => {
                outcome.status = render_status::SKIPPED.to_string();
                outcome.message = reason;
            }
            RenderResult::Failed(reason) => {
                outcome.message = reason;
            }
        }

        outcome.completed_at = Utc::now();
        Ok(outcome)
    }

    /// Render every row of the record file, skipping rows that miss or fail.
    pub async fn render_batch(&self, session: &Session, req: RenderBatchRequest) -> Result<BatchReport> {
        let mut report = BatchReport::default();
        let csv_path = PathBuf::from(&self.config.record_csv);

        if req.fetch_remote {
            if let Err(e) = self.download(session, RECORD_REMOTE_NAME, &csv_path).await {
                tracing::warn!("Error downloading {} from file server: {:#}", RECORD_REMOTE_NAME, e);
                report.fetch_error = Some(format!("{:#}", e));
            }
        }

        let rows = records::read_records_async(&csv_path).await?;
        let table = LocationTable::load(&self.config.network_table).await?;

        for (idx, row) in rows.into_iter().enumerate() {
            let row_num = idx + 1;
            let record = match row {
                Ok(r) => r,
                Err(e) => {
                    tracing::warn!("Row {}: {:#}", row_num, e);
                    report.failed.push(BatchIssue { row: row_num, hostname: None, reason: format!("{:#}", e) });
                    continue;
                }
            };

            if !is_valid_hostname(&record.hostname) {
                report.failed.push(BatchIssue {
                    row: row_num,
                    hostname: Some(record.hostname.clone()),
                    reason: "invalid hostname".to_string(),
                });
                continue;
            }

            let acl = parse_ipv4(&record.ip_address)
                .map(|ip| acl_prefix(ip, self.config.acl_octets))
                .unwrap_or_default();
            let filename = output_filename(&record.hostname, None);

            match self.render_record(&record, &table, &acl, &filename).await {
                RenderResult::Rendered { location, output_path } => {
                    let upload = if req.upload {
                        self.upload(session, &output_path, &filename).await
                    } else {
                        UploadStatus::NotRequested
                    };
                    report.rendered.push(RenderedEntry {
                        hostname: record.hostname,
                        filename,
                        output_path: output_path.to_string_lossy().into_owned(),
                        location: location.name,
                        upload,
                    });
                }
                RenderResult::Skipped(reason) => report.skipped.push(BatchIssue {
                    row: row_num,
                    hostname: Some(record.hostname),
                    reason,
                }),
                RenderResult::Failed(reason) => report.failed.push(BatchIssue {
                    row: row_num,
                    hostname: Some(record.hostname),
                    reason,
                }),
            }
        }

        tracing::info!(
            "Batch render finished: {} rendered, {} skipped, {} failed",
            report.rendered.len(),
            report.skipped.len(),
            report.failed.len()
        );
        Ok(report)
    }

    /// Store login credentials on the session, checking them against the file server if configured
    pub async fn login(&self, session: &mut Session, req: LoginRequest) -> Result<()> {
        if req.username.is_empty() || req.password.is_empty() {
            return Err(ValidationError::new("credentials", "username and password are required").into());
        }

        let creds = Credentials::new(req.username, req.password);
        if self.config.login_verify {
            self.transfer.verify(&creds).await?;
        }

        tracing::info!("Logged in as {}", creds.username);
        session.login = Some(creds);
        Ok(())
    }

    pub fn logout(&self, session: &mut Session) {
        if let Some(creds) = session.login.take() {
            tracing::info!("Logged out {}", creds.username);
        }
    }

    pub fn session_info(&self, session: &Session) -> SessionInfo {
        SessionInfo {
            credential_source: self.credentials.mode(),
            username: session.login.as_ref().map(|c| c.username.clone()),
            logged_in: session.login.is_some(),
            last_acl_prefix: session.last_acl_prefix.clone(),
            transfer_protocol: self.transfer.protocol().as_str().to_string(),
            file_server: self.config.file_server.clone(),
        }
    }

    async fn render_record(
        &self,
        record: &DeviceRecord,
        table: &LocationTable,
        acl: &str,
        filename: &str,
    ) -> RenderResult {
        let location = match find_location(&record.ip_address, table) {
            Ok(Some(m)) => m,
            Ok(None) => {
                tracing::warn!("No matching location found for IP address: {}", record.ip_address);
                return RenderResult::Skipped(format!(
                    "No matching location found for IP address: {}",
                    record.ip_address
                ));
            }
            Err(e) => {
                tracing::warn!("Location lookup failed for {}: {}", record.hostname, e);
                return RenderResult::Skipped(format!("Location lookup failed: {}", e));
            }
        };

        let vars = TemplateVars::new(record, &location, acl);
        let rendered = match self.renderer.render(&record.model, &vars).await {
            Ok(out) => out,
            Err(e) => {
                tracing::error!("Render failed for {}: {:#}", record.hostname, e);
                return RenderResult::Failed(format!("Render failed: {:#}", e));
            }
        };

        match write_output(Path::new(&self.config.output_dir), filename, &rendered).await {
            Ok(output_path) => {
                tracing::info!("Rendered {} for {} ({})", filename, record.hostname, location.name);
                RenderResult::Rendered { location, output_path }
            }
            Err(e) => {
                tracing::error!("Failed to write {}: {:#}", filename, e);
                RenderResult::Failed(format!("Failed to write config: {:#}", e))
            }
        }
    }

    /// Upload one file; failures are reported, never retried
    async fn upload(&self, session: &Session, local: &Path, remote_name: &str) -> UploadStatus {
        let creds = match self.credentials.resolve(session) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!("Upload of {} skipped: {}", remote_name, e);
                return UploadStatus::Failed { error: e.to_string() };
            }
        };

        match self.transfer.upload(&creds, local, remote_name).await {
            Ok(remote_path) => UploadStatus::Succeeded { remote_path },
            Err(e) => {
                tracing::error!(
                    "{} upload of {} failed: {:#}",
                    self.transfer.protocol().as_str(),
                    remote_name,
                    e
                );
                UploadStatus::Failed { error: format!("{:#}", e) }
            }
        }
    }

    async fn download(&self, session: &Session, remote_name: &str, local: &Path) -> Result<()> {
        let creds = self.credentials.resolve(session)?;
        self.transfer.download(&creds, remote_name, local).await
    }
}

/// Write rendered text into the output directory, creating it if needed
async fn write_output(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(filename);
    tokio::fs::write(&path, content).await?;
    Ok(path)
}
