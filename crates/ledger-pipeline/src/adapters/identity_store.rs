//! File-backed identity store.
//!
//! Each enrolled user is one JSON file `{dir}/{name}.json`:
//!
//! ```json
//! {
//!   "name": "user1",
//!   "mspId": "Org1MSP",
//!   "enrolled": true,
//!   "certificate": "-----BEGIN CERTIFICATE-----...",
//!   "signingKey": "<64 hex chars, ed25519 seed>"
//! }
//! ```

use crate::domain::{LedgerIdentity, PipelineError};
use crate::ports::IdentityStore;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IdentityFile {
    name: String,
    msp_id: String,
    #[serde(default)]
    enrolled: bool,
    #[serde(default)]
    certificate: String,
    signing_key: String,
}

/// Identity store reading enrollment files from a directory.
#[derive(Debug, Clone)]
pub struct FileIdentityStore {
    dir: PathBuf,
}

impl FileIdentityStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }

    /// Write an enrollment file. Used by provisioning scripts and tests.
    pub fn save(
        &self,
        name: &str,
        msp_id: &str,
        certificate: &str,
        seed: &[u8; 32],
    ) -> std::io::Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let file = IdentityFile {
            name: name.to_string(),
            msp_id: msp_id.to_string(),
            enrolled: true,
            certificate: certificate.to_string(),
            signing_key: hex::encode(seed),
        };
        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        let path = self.path_for(name);
        std::fs::write(&path, json)?;
        Ok(path)
    }
}

fn not_enrolled(name: &str, reason: impl Into<String>) -> PipelineError {
    PipelineError::IdentityNotEnrolled {
        name: name.to_string(),
        reason: reason.into(),
    }
}

fn read_identity(path: &Path, name: &str) -> Result<IdentityFile, PipelineError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| not_enrolled(name, format!("cannot read {}: {e}", path.display())))?;
    serde_json::from_str(&raw)
        .map_err(|e| not_enrolled(name, format!("malformed {}: {e}", path.display())))
}

impl IdentityStore for FileIdentityStore {
    fn load_enrolled_identity(&self, name: &str) -> Result<LedgerIdentity, PipelineError> {
        let path = self.path_for(name);
        let file = read_identity(&path, name)?;

        if !file.enrolled {
            return Err(not_enrolled(name, "user is registered but not enrolled"));
        }
        if file.name != name {
            return Err(not_enrolled(
                name,
                format!("{} belongs to '{}'", path.display(), file.name),
            ));
        }

        let seed: [u8; 32] = hex::decode(&file.signing_key)
            .ok()
            .and_then(|bytes| bytes.try_into().ok())
            .ok_or_else(|| not_enrolled(name, "signing key must be 32 hex-encoded bytes"))?;

        info!(identity = name, msp_id = %file.msp_id, "Loaded enrolled identity");
        Ok(LedgerIdentity::from_seed(
            file.name,
            file.msp_id,
            file.certificate,
            seed,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let store = FileIdentityStore::new(dir.path());
        store.save("user1", "Org1MSP", "cert", &[5u8; 32]).unwrap();

        let identity = store.load_enrolled_identity("user1").unwrap();
        assert_eq!(identity.name(), "user1");
        assert_eq!(identity.msp_id(), "Org1MSP");
        assert_eq!(
            identity.creator(),
            LedgerIdentity::from_seed("user1", "Org1MSP", "cert", [5u8; 32]).creator()
        );
    }

    #[test]
    fn test_missing_file_is_not_enrolled() {
        let dir = TempDir::new().unwrap();
        let store = FileIdentityStore::new(dir.path());
        let err = store.load_enrolled_identity("ghost").unwrap_err();
        assert!(matches!(err, PipelineError::IdentityNotEnrolled { .. }));
    }

    #[test]
    fn test_unenrolled_user_rejected() {
        let dir = TempDir::new().unwrap();
        let store = FileIdentityStore::new(dir.path());
        std::fs::write(
            store.path_for("user1"),
            r#"{"name":"user1","mspId":"Org1MSP","enrolled":false,"signingKey":""}"#,
        )
        .unwrap();
        let err = store.load_enrolled_identity("user1").unwrap_err();
        assert!(err.to_string().contains("not enrolled"));
    }

    #[test]
    fn test_bad_key_rejected() {
        let dir = TempDir::new().unwrap();
        let store = FileIdentityStore::new(dir.path());
        std::fs::write(
            store.path_for("user1"),
            r#"{"name":"user1","mspId":"Org1MSP","enrolled":true,"signingKey":"abcd"}"#,
        )
        .unwrap();
        let err = store.load_enrolled_identity("user1").unwrap_err();
        assert!(err.to_string().contains("32 hex-encoded bytes"));
    }
}
