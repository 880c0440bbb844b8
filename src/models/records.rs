use serde::{Deserialize, Serialize};

/// DeviceRecord is one validated form submission.
///
/// Field order is the CSV column order:
/// hostname, ip_address, location, access_vlan_id, access_vlan_name,
/// voice_vlan_id, voice_vlan_name, model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub hostname: String,
    pub ip_address: String,
    /// SNMP location label
    pub location: String,
    pub access_vlan_id: String,
    pub access_vlan_name: String,
    pub voice_vlan_id: String,
    pub voice_vlan_name: String,
    pub model: String,
    /// Only set for ZTP submissions; never written to the CSV row
    #[serde(skip)]
    pub mac_address: Option<String>,
}

/// SubmitRequest carries the raw form fields
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmitRequest {
    pub hostname: String,
    pub ip_address: String,
    #[serde(default)]
    pub snmp_location: String,
    #[serde(default)]
    pub data_vlan_id: String,
    #[serde(default)]
    pub data_vlan_name: String,
    #[serde(default)]
    pub voice_vlan_id: String,
    #[serde(default)]
    pub voice_vlan_name: String,
    pub model: String,
    #[serde(default)]
    pub mac_address: Option<String>,
    /// "Upload to FTP" checkbox
    #[serde(default)]
    pub upload: bool,
}
