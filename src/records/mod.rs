use anyhow::{Context, Result};
use std::path::Path;

use crate::models::DeviceRecord;

/// Overwrite the record file with a single CSV row (no header).
pub fn write_record(path: &Path, record: &DeviceRecord) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("Failed to open {} for writing", path.display()))?;
    writer.serialize(record)?;
    writer.flush()?;

    tracing::info!(
        "Record written to {}: hostname={} ip={} model={}",
        path.display(),
        record.hostname,
        record.ip_address,
        record.model
    );
    Ok(())
}

/// Read every row of a record file. Each row parses independently so one
/// malformed row does not hide the rest.
pub fn read_records(path: &Path) -> Result<Vec<Result<DeviceRecord>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let rows = reader
        .deserialize::<DeviceRecord>()
        .map(|row| row.map_err(|e| anyhow::anyhow!("Malformed record row: {}", e)))
        .collect();

    Ok(rows)
}

/// Async wrapper for write_record - runs in a blocking thread pool
pub async fn write_record_async(path: &Path, record: &DeviceRecord) -> Result<()> {
    let path = path.to_path_buf();
    let record = record.clone();
    tokio::task::spawn_blocking(move || write_record(&path, &record))
        .await
        .map_err(|e| anyhow::anyhow!("Task join error: {}", e))?
}

/// Async wrapper for read_records - runs in a blocking thread pool
pub async fn read_records_async(path: &Path) -> Result<Vec<Result<DeviceRecord>>> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || read_records(&path))
        .await
        .map_err(|e| anyhow::anyhow!("Task join error: {}", e))?
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(hostname: &str) -> DeviceRecord {
        DeviceRecord {
            hostname: hostname.into(),
            ip_address: "10.36.50.60".into(),
            location: "Building 2, Floor 1".into(),
            access_vlan_id: "110".into(),
            access_vlan_name: "DATA".into(),
            voice_vlan_id: "120".into(),
            voice_vlan_name: "VOICE".into(),
            model: "C9200L-24P-4X".into(),
            mac_address: Some("001122aabbcc".into()),
        }
    }

    #[test]
    fn test_write_record_single_row_in_column_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        write_record(&path, &record("sw01")).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "sw01,10.36.50.60,\"Building 2, Floor 1\",110,DATA,120,VOICE,C9200L-24P-4X\n"
        );
    }

    #[test]
    fn test_write_record_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("data.csv");
        write_record(&path, &record("first")).unwrap();
        write_record(&path, &record("second")).unwrap();

        let rows = read_records(&path).unwrap();
        assert_eq!(rows.len(), 1);
        let row = rows.into_iter().next().unwrap().unwrap();
        assert_eq!(row.hostname, "second");
        // MAC address is not part of the row
        assert_eq!(row.mac_address, None);
    }

    #[test]
    fn test_read_records_reports_bad_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        std::fs::write(
            &path,
            "sw01,10.0.0.1,L1,10,D,20,V,C9200L-24P-4X\nshort,row\nsw02,10.0.0.2,L2,11,D,21,V,C9300L-48P-4X\n",
        )
        .unwrap();

        let rows = read_records(&path).unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows[0].is_ok());
        assert!(rows[1].is_err());
        assert_eq!(rows[2].as_ref().unwrap().hostname, "sw02");
    }

    #[test]
    fn test_read_records_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_records(&dir.path().join("missing.csv")).is_err());
    }
}
