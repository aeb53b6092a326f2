use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::time::Instant;
use tokio::sync::Mutex;

use crate::errors::SecretsError;
use crate::kms::CanonicalSignature;
use crate::secrets::SecretInfo;

/// One line of the audit log, describing a single KMS round trip
#[derive(Debug, Serialize)]
pub struct KmsAuditEntry {
    timestamp: DateTime<Utc>,

    operation: String,
    key_id: String,
    payload_len: usize,

    signature_r: Option<String>,
    signature_s: Option<String>,
    recovery_byte: Option<u8>,
    address: Option<String>,

    success: bool,
    error: Option<String>,
    duration_ms: u64,

    #[serde(skip)]
    started: Instant,
}

impl KmsAuditEntry {
    pub fn start(operation: &str, key_id: &str, payload_len: usize) -> Self {
        Self {
            timestamp: Utc::now(),
            operation: operation.to_string(),
            key_id: key_id.to_string(),
            payload_len,
            signature_r: None,
            signature_s: None,
            recovery_byte: None,
            address: None,
            success: false,
            error: None,
            duration_ms: 0,
            started: Instant::now(),
        }
    }

    pub fn set_signature(&mut self, signature: &CanonicalSignature) {
        self.signature_r = Some(format!("0x{}", hex::encode(signature.r())));
        self.signature_s = Some(format!("0x{}", hex::encode(signature.s())));
        self.recovery_byte = Some(signature.v());
        self.success = true;
    }

    pub fn set_info(&mut self, info: &SecretInfo) {
        self.address = Some(info.address.clone());
        self.success = true;
    }

    pub fn set_error(&mut self, error: &SecretsError) {
        self.error = Some(error.to_string());
        self.success = false;
    }

    fn finish(&mut self) {
        self.duration_ms = self.started.elapsed().as_millis() as u64;
    }
}

/// Append-only JSON-lines audit log
#[derive(Debug)]
pub struct AuditLogger {
    file: Mutex<File>,
}

impl AuditLogger {
    pub fn new(log_path: &str) -> Result<Self, SecretsError> {
        let path = Path::new(log_path);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                SecretsError::Internal(format!("Failed to create audit log directory: {e}"))
            })?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| SecretsError::Internal(format!("Failed to open audit log file: {e}")))?;

        Ok(Self {
            file: Mutex::new(file),
        })
    }

    pub async fn log(&self, entry: &mut KmsAuditEntry) -> Result<(), SecretsError> {
        entry.finish();

        let json = serde_json::to_string(entry)
            .map_err(|e| SecretsError::Internal(format!("Failed to serialize audit entry: {e}")))?;

        let mut file = self.file.lock().await;
        writeln!(file, "{json}")
            .and_then(|_| file.flush())
            .map_err(|e| SecretsError::Internal(format!("Failed to write audit log: {e}")))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_entries_are_appended_as_json_lines() {
        let temp_dir = TempDir::new().unwrap();
        let log_path = temp_dir.path().join("audit/kms.log");
        let logger = AuditLogger::new(log_path.to_str().unwrap()).unwrap();

        let mut r = [0u8; 32];
        r[31] = 0x1a;
        let mut s = [0u8; 32];
        s[31] = 0xff;
        let signature = CanonicalSignature::new(r, s, 1).unwrap();

        let mut ok = KmsAuditEntry::start("sign_raw", "node1", 5);
        ok.set_signature(&signature);
        logger.log(&mut ok).await.unwrap();

        let mut failed = KmsAuditEntry::start("info", "node1", 0);
        failed.set_error(&SecretsError::RemoteStatus(500));
        logger.log(&mut failed).await.unwrap();

        let contents = std::fs::read_to_string(&log_path).unwrap();
        let lines: Vec<serde_json::Value> = contents
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["operation"], "sign_raw");
        assert_eq!(lines[0]["success"], true);
        assert_eq!(lines[0]["recovery_byte"], 1);
        assert!(lines[0]["signature_r"].as_str().unwrap().ends_with("1a"));
        assert_eq!(lines[1]["success"], false);
        assert_eq!(lines[1]["error"], "KMS returned HTTP status 500");
    }
}
