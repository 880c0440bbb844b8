use anyhow::Result;
use serde::Serialize;
use std::path::PathBuf;
use tera::{Context, Tera};

use crate::models::{DeviceRecord, LocationMatch, TemplateVariable};
use crate::utils::is_safe_filename;

/// Returned when a model has no `<model>.j2` file in the templates directory
#[derive(Debug)]
pub struct TemplateNotFound {
    pub model: String,
    pub path: PathBuf,
}

impl std::fmt::Display for TemplateNotFound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "no template for model {} ({})", self.model, self.path.display())
    }
}

impl std::error::Error for TemplateNotFound {}

/// Variables passed to every device template
#[derive(Debug, Clone, Serialize)]
pub struct TemplateVars {
    pub model: String,
    pub hostname: String,
    pub ip_address: String,
    pub access_vlan_id: String,
    pub access_vlan_name: String,
    pub voice_vlan_id: String,
    pub voice_vlan_name: String,
    pub location: String,
    pub gateway: String,
    pub subnet: String,
    pub network: String,
    pub ip_acl: String,
    pub mac_address: String,
}

impl TemplateVars {
    pub fn new(record: &DeviceRecord, location: &LocationMatch, ip_acl: &str) -> Self {
        Self {
            model: record.model.clone(),
            hostname: record.hostname.clone(),
            ip_address: record.ip_address.clone(),
            access_vlan_id: record.access_vlan_id.clone(),
            access_vlan_name: record.access_vlan_name.clone(),
            voice_vlan_id: record.voice_vlan_id.clone(),
            voice_vlan_name: record.voice_vlan_name.clone(),
            location: record.location.clone(),
            gateway: location.gateway.clone(),
            subnet: location.subnet_mask.clone(),
            network: location.cidr.clone(),
            ip_acl: ip_acl.to_string(),
            mac_address: record.mac_address.clone().unwrap_or_default(),
        }
    }
}

/// Renderer loads `<model>.j2` templates from a directory and renders them with Tera
#[derive(Debug, Clone)]
pub struct Renderer {
    templates_dir: PathBuf,
}

impl Renderer {
    pub fn new(templates_dir: impl Into<PathBuf>) -> Self {
        Self {
            templates_dir: templates_dir.into(),
        }
    }

    /// Path of the template file for a model
    pub fn template_path(&self, model: &str) -> PathBuf {
        self.templates_dir.join(format!("{}.j2", model))
    }

    /// Render the template for `model`. A missing template file yields `TemplateNotFound`.
    pub async fn render(&self, model: &str, vars: &TemplateVars) -> Result<String> {
        let content = self.load(model).await?;
        render_str(model, &content, vars)
    }

    /// Raw template text for `model`
    pub async fn load(&self, model: &str) -> Result<String> {
        let path = self.template_path(model);
        if !is_safe_filename(model) {
            return Err(TemplateNotFound { model: model.to_string(), path }.into());
        }

        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(TemplateNotFound { model: model.to_string(), path }.into())
            }
            Err(e) => Err(anyhow::anyhow!("Failed to read template {}: {}", path.display(), e)),
        }
    }
}

/// Render template text with the device variables
pub fn render_str(name: &str, content: &str, vars: &TemplateVars) -> Result<String> {
    let mut tera = Tera::default();
    tera.add_raw_template(name, content)
        .map_err(|e| anyhow::anyhow!("Invalid template {}: {}", name, e))?;

    let context = Context::from_serialize(vars)
        .map_err(|e| anyhow::anyhow!("Failed to build template context: {}", e))?;

    tera.render(name, &context)
        .map_err(|e| anyhow::anyhow!("Template rendering failed: {}", e))
}

/// Variables available to config templates
pub fn template_variables() -> Vec<TemplateVariable> {
    let var = |name: &str, description: &str, example: &str| TemplateVariable {
        name: name.into(),
        description: description.into(),
        example: example.into(),
    };

    vec![
        var("model", "Device model (selects the template)", "C9200L-24P-4X"),
        var("hostname", "Device hostname", "ce9333-example"),
        var("ip_address", "Management IP address", "10.36.50.60"),
        var("access_vlan_id", "Data VLAN id", "110"),
        var("access_vlan_name", "Data VLAN name", "DATA"),
        var("voice_vlan_id", "Voice VLAN id", "120"),
        var("voice_vlan_name", "Voice VLAN name", "VOICE"),
        var("location", "SNMP location label", "Building 2 Floor 1"),
        var("gateway", "Default gateway of the matched location", "10.36.50.1"),
        var("subnet", "Subnet mask of the matched location", "255.255.255.0"),
        var("network", "Matched network in CIDR notation", "10.36.50.0/24"),
        var("ip_acl", "Leading octets of the IP, for access-list matches", "10.36.50"),
        var("mac_address", "MAC address (ZTP submissions only)", "001122aabbcc"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars() -> TemplateVars {
        let record = DeviceRecord {
            hostname: "sw-b2-f1".into(),
            ip_address: "10.36.50.60".into(),
            location: "Building 2 Floor 1".into(),
            access_vlan_id: "110".into(),
            access_vlan_name: "DATA".into(),
            voice_vlan_id: "120".into(),
            voice_vlan_name: "VOICE".into(),
            model: "C9200L-24P-4X".into(),
            mac_address: None,
        };
        let location = LocationMatch {
            name: "HQ-Floor1".into(),
            network_address: "10.36.50.0".into(),
            subnet_mask: "255.255.255.0".into(),
            gateway: "10.36.50.1".into(),
            cidr: "10.36.50.0/24".into(),
        };
        TemplateVars::new(&record, &location, "10.36.50")
    }

    const TEMPLATE: &str = "hostname {{ hostname }}\n\
        interface Vlan{{ access_vlan_id }}\n \
        ip address {{ ip_address }} {{ subnet }}\n\
        ip default-gateway {{ gateway }}\n\
        access-list 10 permit {{ ip_acl }}.0 0.0.0.255\n\
        snmp-server location {{ location }}\n";

    #[test]
    fn test_render_str_substitutes_all_fields() {
        let out = render_str("C9200L-24P-4X", TEMPLATE, &vars()).unwrap();
        assert!(out.contains("hostname sw-b2-f1"));
        assert!(out.contains("ip address 10.36.50.60 255.255.255.0"));
        assert!(out.contains("ip default-gateway 10.36.50.1"));
        assert!(out.contains("access-list 10 permit 10.36.50.0 0.0.0.255"));
        assert!(out.contains("snmp-server location Building 2 Floor 1"));
    }

    #[test]
    fn test_render_str_invalid_syntax() {
        let err = render_str("bad", "hostname {{ hostname ", &vars()).unwrap_err();
        assert!(err.to_string().contains("Invalid template"));
    }

    #[tokio::test]
    async fn test_render_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("C9200L-24P-4X.j2"), TEMPLATE).unwrap();

        let renderer = Renderer::new(dir.path());
        let out = renderer.render("C9200L-24P-4X", &vars()).await.unwrap();
        assert!(!out.is_empty());
        assert!(out.contains("sw-b2-f1"));
        assert!(out.contains("10.36.50.60"));
    }

    #[tokio::test]
    async fn test_render_missing_template() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = Renderer::new(dir.path());

        let err = renderer.render("WS-C3650-48FD-L", &vars()).await.unwrap_err();
        let nf = err.downcast_ref::<TemplateNotFound>().unwrap();
        assert_eq!(nf.model, "WS-C3650-48FD-L");
        assert!(nf.path.ends_with("WS-C3650-48FD-L.j2"));
    }

    #[tokio::test]
    async fn test_render_rejects_path_like_model() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = Renderer::new(dir.path());
        let err = renderer.render("../secret", &vars()).await.unwrap_err();
        assert!(err.downcast_ref::<TemplateNotFound>().is_some());
    }

    #[test]
    fn test_template_variables_cover_context() {
        let names: Vec<String> = template_variables().into_iter().map(|v| v.name).collect();
        let context = serde_json::to_value(vars()).unwrap();
        for key in context.as_object().unwrap().keys() {
            assert!(names.contains(key), "undocumented variable {}", key);
        }
    }
}
