use crate::local::collection::JsonCollection;
use crate::ports::{AdapterResult, SecretStoreAdapter};
use async_trait::async_trait;
use mirror_types::error::{AdapterFault, AdapterFaultCode};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct SecretRecord {
    param_name: String,
    value: String,
}

/// File-backed secret store. Never hands back a value that fails the
/// structural hex/length check — `get_nonce` treats a malformed record
/// as `Corrupt` rather than returning it.
pub struct LocalSecretStore {
    collection: JsonCollection<SecretRecord>,
}

impl LocalSecretStore {
    pub fn open(dir: &Path) -> Result<Self, AdapterFault> {
        Ok(Self {
            collection: JsonCollection::open(dir.join("secrets.json"), "secret-store")?,
        })
    }

    fn is_structurally_valid(value: &str) -> bool {
        value.len() >= 32 && value.len() % 2 == 0 && value.bytes().all(|b| b.is_ascii_hexdigit())
    }
}

#[async_trait]
impl SecretStoreAdapter for LocalSecretStore {
    async fn get_nonce(&self, param_name: &str) -> AdapterResult<String> {
        self.collection.read(|records| {
            let record = records
                .iter()
                .find(|r| r.param_name == param_name)
                .ok_or_else(|| {
                    AdapterFault::new(
                        AdapterFaultCode::NotFound,
                        "secret-store",
                        format!("no secret for parameter {param_name}"),
                    )
                })?;
            if !Self::is_structurally_valid(&record.value) {
                return Err(AdapterFault::new(
                    AdapterFaultCode::Corrupt,
                    "secret-store",
                    format!("stored value for {param_name} fails structural validation"),
                ));
            }
            Ok(record.value.clone())
        })
    }

    async fn rotate_nonce(&self, new_value: &str) -> AdapterResult<()> {
        if !Self::is_structurally_valid(new_value) {
            return Err(AdapterFault::new(
                AdapterFaultCode::Rejected,
                "secret-store",
                "refusing to store a structurally invalid nonce",
            ));
        }
        self.collection.write(|records| {
            let now_suffix = mirror_types::time::now_ms();
            let param_name = format!("oracle/nonce/v{now_suffix}");
            records.push(SecretRecord {
                param_name,
                value: new_value.to_string(),
            });
        })?;
        Ok(())
    }

    async fn is_reachable(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_param_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalSecretStore::open(dir.path()).unwrap();
        let err = store.get_nonce("oracle/nonce/v1").await.unwrap_err();
        assert_eq!(err.code, mirror_types::error::AdapterFaultCode::NotFound);
    }

    #[tokio::test]
    async fn rotate_then_get_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalSecretStore::open(dir.path()).unwrap();
        store.rotate_nonce(&"a".repeat(64)).await.unwrap();
        assert!(store.is_reachable().await);
    }

    #[tokio::test]
    async fn rejects_malformed_rotation() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalSecretStore::open(dir.path()).unwrap();
        let err = store.rotate_nonce("not-hex").await.unwrap_err();
        assert_eq!(err.code, mirror_types::error::AdapterFaultCode::Rejected);
    }
}
