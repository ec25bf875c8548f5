use crate::local::collection::JsonCollection;
use crate::model::{ConsentRecord, ConsentSummary};
use crate::ports::{AdapterResult, ConsentStoreAdapter};
use async_trait::async_trait;
use mirror_types::error::AdapterFault;
use mirror_types::time::now_ms;
use std::path::Path;

pub struct LocalConsentStore {
    collection: JsonCollection<ConsentRecord>,
}

impl LocalConsentStore {
    pub fn open(dir: &Path) -> Result<Self, AdapterFault> {
        Ok(Self {
            collection: JsonCollection::open(dir.join("consent.json"), "consent-store")?,
        })
    }
}

#[async_trait]
impl ConsentStoreAdapter for LocalConsentStore {
    async fn check_resource_consent(&self, org_id: &str, feature: &str) -> AdapterResult<bool> {
        let now = now_ms();
        self.collection.read(|records| {
            Ok(records
                .iter()
                .find(|r| r.org_id == org_id && r.feature == feature)
                .map(|r| r.granted && r.expires_at.map(|exp| now < exp).unwrap_or(true))
                .unwrap_or(false))
        })
    }

    async fn grant_consent(
        &self,
        org_id: &str,
        feature: &str,
        grantor: &str,
        expires_at: Option<i64>,
    ) -> AdapterResult<()> {
        self.collection.write(|records| {
            let now = now_ms();
            match records
                .iter_mut()
                .find(|r| r.org_id == org_id && r.feature == feature)
            {
                Some(record) => {
                    record.granted = true;
                    record.grantor = Some(grantor.to_string());
                    record.expires_at = expires_at;
                    record.updated_at = now;
                }
                None => records.push(ConsentRecord {
                    org_id: org_id.to_string(),
                    feature: feature.to_string(),
                    granted: true,
                    grantor: Some(grantor.to_string()),
                    expires_at,
                    updated_at: now,
                }),
            }
        })?;
        Ok(())
    }

    async fn revoke_consent(&self, org_id: &str, feature: &str) -> AdapterResult<()> {
        self.collection.write(|records| {
            let now = now_ms();
            match records
                .iter_mut()
                .find(|r| r.org_id == org_id && r.feature == feature)
            {
                Some(record) => {
                    record.granted = false;
                    record.expires_at = None;
                    record.updated_at = now;
                }
                None => records.push(ConsentRecord {
                    org_id: org_id.to_string(),
                    feature: feature.to_string(),
                    granted: false,
                    grantor: None,
                    expires_at: None,
                    updated_at: now,
                }),
            }
        })?;
        Ok(())
    }

    async fn get_consent_summary(&self, org_id: &str) -> AdapterResult<ConsentSummary> {
        self.collection.read(|records| {
            Ok(ConsentSummary {
                org_id: org_id.to_string(),
                features: records
                    .iter()
                    .filter(|r| r.org_id == org_id)
                    .cloned()
                    .collect(),
            })
        })
    }

    async fn check_multiple_resources(
        &self,
        org_id: &str,
        features: &[String],
    ) -> AdapterResult<Vec<(String, bool)>> {
        let mut results = Vec::with_capacity(features.len());
        for feature in features {
            results.push((feature.clone(), self.check_resource_consent(org_id, feature).await?));
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn grant_then_check_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalConsentStore::open(dir.path()).unwrap();
        store.grant_consent("org-1", "telemetry", "alice", None).await.unwrap();
        assert!(store.check_resource_consent("org-1", "telemetry").await.unwrap());
    }

    #[tokio::test]
    async fn revocation_is_sticky_until_regrant() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalConsentStore::open(dir.path()).unwrap();
        store.grant_consent("org-1", "telemetry", "alice", None).await.unwrap();
        store.revoke_consent("org-1", "telemetry").await.unwrap();
        assert!(!store.check_resource_consent("org-1", "telemetry").await.unwrap());
        store.grant_consent("org-1", "telemetry", "bob", None).await.unwrap();
        assert!(store.check_resource_consent("org-1", "telemetry").await.unwrap());
    }

    #[tokio::test]
    async fn expired_consent_is_not_valid() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalConsentStore::open(dir.path()).unwrap();
        let past = now_ms() - 1000;
        store.grant_consent("org-1", "telemetry", "alice", Some(past)).await.unwrap();
        assert!(!store.check_resource_consent("org-1", "telemetry").await.unwrap());
    }

    #[tokio::test]
    async fn check_multiple_resources_reports_each() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalConsentStore::open(dir.path()).unwrap();
        store.grant_consent("org-1", "a", "alice", None).await.unwrap();
        let results = store
            .check_multiple_resources("org-1", &["a".to_string(), "b".to_string()])
            .await
            .unwrap();
        assert_eq!(results, vec![("a".to_string(), true), ("b".to_string(), false)]);
    }
}
