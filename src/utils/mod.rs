use std::net::Ipv4Addr;
use std::sync::OnceLock;

use regex_lite::Regex;

/// A form field that failed validation. Aborts the submission it belongs to.
#[derive(Debug)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid {}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Parse a dotted-quad IPv4 address, surrounding whitespace allowed
pub fn parse_ipv4(ip: &str) -> Result<Ipv4Addr, ValidationError> {
    ip.trim()
        .parse::<Ipv4Addr>()
        .map_err(|_| ValidationError::new("ip_address", format!("{:?} is not a valid IPv4 address", ip)))
}

fn mac_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^([0-9A-Fa-f]{2}){6}$").ok())
        .as_ref()
}

/// Validate a bare MAC address: exactly 12 hex characters, no separators.
pub fn is_valid_mac_address(mac: &str) -> bool {
    mac_pattern().is_some_and(|re| re.is_match(mac))
}

/// Validate a hostname.
/// Allows alphanumeric, hyphens, dots, and underscores. No path separators or shell metacharacters.
/// A hostname must also yield a file name `is_safe_filename` accepts.
pub fn is_valid_hostname(hostname: &str) -> bool {
    if hostname.is_empty() || hostname.len() > 253 || hostname.contains("..") {
        return false;
    }
    hostname.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.' || c == '_')
}

/// Free-text form field that is pasted into a template line.
/// Control characters would start a new config line and `"` would close a
/// quoted string in the ZTP scripts.
pub fn is_single_line_text(text: &str) -> bool {
    !text.chars().any(|c| c.is_control() || c == '"')
}

/// Validate a VLAN id field. Empty is allowed (device without that VLAN).
pub fn is_valid_vlan_id(id: &str) -> bool {
    if id.is_empty() {
        return true;
    }
    matches!(id.parse::<u16>(), Ok(n) if (1..=4094).contains(&n))
}

/// Leading `octets` octets of an address joined with dots, e.g. "10.36.50" for 3.
pub fn acl_prefix(ip: Ipv4Addr, octets: usize) -> String {
    ip.octets()
        .iter()
        .take(octets.clamp(1, 4))
        .map(|o| o.to_string())
        .collect::<Vec<_>>()
        .join(".")
}

/// Name of the rendered config file.
/// ZTP flows key the file by MAC address (a Python script the switch pulls on boot);
/// everything else uses the IOS `<hostname>-confg` convention.
pub fn output_filename(hostname: &str, mac_address: Option<&str>) -> String {
    match mac_address {
        Some(mac) => format!("{}.py", mac),
        None => format!("{}-confg", hostname),
    }
}

/// Reject anything that could escape the directory it is joined onto
pub fn is_safe_filename(filename: &str) -> bool {
    !filename.is_empty()
        && !filename.contains("..")
        && !filename.contains('/')
        && !filename.contains('\\')
}
