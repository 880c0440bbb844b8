use serde::{Deserialize, Deserializer, Serialize};

/// Fields of one location as stored in the network table JSON
#[derive(Debug, Clone, Deserialize)]
pub struct LocationFields {
    pub network_address: String,
    /// Dotted mask or prefix length; a bare JSON number is read as a prefix length
    #[serde(deserialize_with = "string_or_number")]
    pub subnet_mask: String,
    pub gateway: String,
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string or number, got {}",
            other
        ))),
    }
}

/// LocationEntry is one named network range from the network table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationEntry {
    pub name: String,
    pub network_address: String,
    pub subnet_mask: String,
    pub gateway: String,
}

/// LocationMatch is the entry that contains a looked-up address
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationMatch {
    pub name: String,
    pub network_address: String,
    pub subnet_mask: String,
    pub gateway: String,
    /// Network in CIDR notation, e.g. "10.36.50.0/24"
    pub cidr: String,
}

/// Query string for a single lookup
#[derive(Debug, Clone, Deserialize)]
pub struct LookupQuery {
    pub ip: String,
}

/// ResolveRequest asks for the location of several addresses at once
#[derive(Debug, Clone, Deserialize)]
pub struct ResolveRequest {
    pub ips: Vec<String>,
}

/// One resolved address in a ResolveResponse
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedAddress {
    pub ip_address: String,
    pub location: String,
    pub subnet_mask: String,
    pub gateway: String,
}

/// An address that could not be resolved, with the reason
#[derive(Debug, Clone, Serialize)]
pub struct UnresolvedAddress {
    pub ip_address: String,
    pub reason: String,
}

/// ResolveResponse splits addresses into resolved and unresolved
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResolveResponse {
    pub resolved: Vec<ResolvedAddress>,
    pub unresolved: Vec<UnresolvedAddress>,
}
