//! The six ports backed by [`super::store::ObjectStoreCollection`].
//!
//! Same record shapes and logic as the local provider; only the
//! persistence primitive differs. Kept in one file since the six
//! implementations are otherwise near-identical wrappers.

use crate::cloud::store::ObjectStoreCollection;
use crate::model::{
    BaselineMeta, BlockCounterEntry, CalibrationResult, ConsentRecord, ConsentSummary, FpEvent,
    FpWindow,
};
use crate::ports::{
    AdapterResult, BaselineStoreAdapter, BlockCounterAdapter, CalibrationStoreAdapter,
    ConsentStoreAdapter, FpStoreAdapter, SecretStoreAdapter,
};
use async_trait::async_trait;
use mirror_types::error::{AdapterFault, AdapterFaultCode};
use mirror_types::time::{hour_bucket, now_ms};
use object_store::ObjectStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const BUCKET_TTL_MS: i64 = 7_200_000;

pub struct CloudFpStore {
    collection: ObjectStoreCollection,
}

impl CloudFpStore {
    pub fn new(store: Arc<dyn ObjectStore>, key_prefix: &str) -> Self {
        Self {
            collection: ObjectStoreCollection::new(store, &format!("{key_prefix}/fp-events.json"), "fp-store"),
        }
    }
}

#[async_trait]
impl FpStoreAdapter for CloudFpStore {
    async fn record_event(&self, event: FpEvent) -> AdapterResult<()> {
        self.collection
            .mutate(|events: &mut Vec<FpEvent>| {
                if events.iter().any(|e| e.event_id == event.event_id) {
                    return Err(AdapterFault::new(
                        AdapterFaultCode::Duplicate,
                        "fp-store",
                        format!("eventId {} already exists", event.event_id),
                    ));
                }
                events.push(event.clone());
                Ok(())
            })
            .await?
    }

    async fn mark_false_positive(
        &self,
        finding_id: &str,
        reviewed_by: &str,
        ticket: Option<&str>,
    ) -> AdapterResult<()> {
        self.collection
            .mutate(|events: &mut Vec<FpEvent>| {
                let event = events
                    .iter_mut()
                    .find(|e| e.finding_id == finding_id)
                    .ok_or_else(|| {
                        AdapterFault::new(
                            AdapterFaultCode::NotFound,
                            "fp-store",
                            format!("no event for findingId {finding_id}"),
                        )
                    })?;
                event.is_false_positive = true;
                event.reviewed_by = Some(reviewed_by.to_string());
                event.suppression_ticket = ticket.map(|t| t.to_string());
                event.reviewed_at = Some(now_ms());
                Ok(())
            })
            .await?
    }

    async fn get_window_by_count(&self, rule_id: &str, n: usize) -> AdapterResult<FpWindow> {
        let events: Vec<FpEvent> = self.collection.load().await?;
        let mut matching: Vec<FpEvent> = events.into_iter().filter(|e| e.rule_id == rule_id).collect();
        matching.sort_by(|a, b| b.timestamp_ms.cmp(&a.timestamp_ms));
        matching.truncate(n);
        Ok(FpWindow::from_events(rule_id, matching))
    }

    async fn get_window_by_since(&self, rule_id: &str, since_ms: i64) -> AdapterResult<FpWindow> {
        let events: Vec<FpEvent> = self.collection.load().await?;
        let mut matching: Vec<FpEvent> = events
            .into_iter()
            .filter(|e| e.rule_id == rule_id && e.timestamp_ms >= since_ms)
            .collect();
        matching.sort_by(|a, b| b.timestamp_ms.cmp(&a.timestamp_ms));
        Ok(FpWindow::from_events(rule_id, matching))
    }

    async fn is_false_positive(&self, finding_id: &str) -> AdapterResult<bool> {
        let events: Vec<FpEvent> = self.collection.load().await?;
        Ok(events
            .iter()
            .find(|e| e.finding_id == finding_id)
            .map(|e| e.is_false_positive)
            .unwrap_or(false))
    }

    async fn is_false_positive_for_rule(&self, rule_id: &str, finding_id: &str) -> AdapterResult<bool> {
        let events: Vec<FpEvent> = self.collection.load().await?;
        Ok(events
            .iter()
            .find(|e| e.rule_id == rule_id && e.finding_id == finding_id)
            .map(|e| e.is_false_positive)
            .unwrap_or(false))
    }
}

pub struct CloudBlockCounter {
    collection: ObjectStoreCollection,
}

impl CloudBlockCounter {
    pub fn new(store: Arc<dyn ObjectStore>, key_prefix: &str) -> Self {
        Self {
            collection: ObjectStoreCollection::new(store, &format!("{key_prefix}/block-counter.json"), "block-counter"),
        }
    }
}

#[async_trait]
impl BlockCounterAdapter for CloudBlockCounter {
    async fn increment(&self, rule_id: &str, org_id: &str) -> AdapterResult<u64> {
        let now = now_ms();
        let key = BlockCounterEntry::bucket_key_for(rule_id, org_id, hour_bucket(now));
        self.collection
            .mutate(|entries: &mut Vec<BlockCounterEntry>| {
                entries.retain(|e| e.expires_at > now || e.bucket_key != key);
                match entries.iter_mut().find(|e| e.bucket_key == key && e.expires_at > now) {
                    Some(entry) => {
                        entry.count += 1;
                        entry.count
                    }
                    None => {
                        entries.push(BlockCounterEntry {
                            bucket_key: key.clone(),
                            count: 1,
                            expires_at: now + BUCKET_TTL_MS,
                        });
                        1
                    }
                }
            })
            .await
    }

    async fn get_count(&self, rule_id: &str, org_id: &str) -> AdapterResult<u64> {
        let now = now_ms();
        let key = BlockCounterEntry::bucket_key_for(rule_id, org_id, hour_bucket(now));
        let entries: Vec<BlockCounterEntry> = self.collection.load().await?;
        Ok(entries
            .iter()
            .find(|e| e.bucket_key == key && e.expires_at > now)
            .map(|e| e.count)
            .unwrap_or(0))
    }

    async fn is_circuit_broken(&self, rule_id: &str, org_id: &str, threshold: u64) -> AdapterResult<bool> {
        Ok(self.get_count(rule_id, org_id).await? >= threshold)
    }
}

pub struct CloudConsentStore {
    collection: ObjectStoreCollection,
}

impl CloudConsentStore {
    pub fn new(store: Arc<dyn ObjectStore>, key_prefix: &str) -> Self {
        Self {
            collection: ObjectStoreCollection::new(store, &format!("{key_prefix}/consent.json"), "consent-store"),
        }
    }
}

#[async_trait]
impl ConsentStoreAdapter for CloudConsentStore {
    async fn check_resource_consent(&self, org_id: &str, feature: &str) -> AdapterResult<bool> {
        let now = now_ms();
        let records: Vec<ConsentRecord> = self.collection.load().await?;
        Ok(records
            .iter()
            .find(|r| r.org_id == org_id && r.feature == feature)
            .map(|r| r.granted && r.expires_at.map(|exp| now < exp).unwrap_or(true))
            .unwrap_or(false))
    }

    async fn grant_consent(
        &self,
        org_id: &str,
        feature: &str,
        grantor: &str,
        expires_at: Option<i64>,
    ) -> AdapterResult<()> {
        self.collection
            .mutate(|records: &mut Vec<ConsentRecord>| {
                let now = now_ms();
                match records.iter_mut().find(|r| r.org_id == org_id && r.feature == feature) {
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
            })
            .await
    }

    async fn revoke_consent(&self, org_id: &str, feature: &str) -> AdapterResult<()> {
        self.collection
            .mutate(|records: &mut Vec<ConsentRecord>| {
                let now = now_ms();
                match records.iter_mut().find(|r| r.org_id == org_id && r.feature == feature) {
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
            })
            .await
    }

    async fn get_consent_summary(&self, org_id: &str) -> AdapterResult<ConsentSummary> {
        let records: Vec<ConsentRecord> = self.collection.load().await?;
        Ok(ConsentSummary {
            org_id: org_id.to_string(),
            features: records.into_iter().filter(|r| r.org_id == org_id).collect(),
        })
    }

    async fn check_multiple_resources(&self, org_id: &str, features: &[String]) -> AdapterResult<Vec<(String, bool)>> {
        let mut results = Vec::with_capacity(features.len());
        for feature in features {
            results.push((feature.clone(), self.check_resource_consent(org_id, feature).await?));
        }
        Ok(results)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct SecretRecord {
    param_name: String,
    value: String,
}

pub struct CloudSecretStore {
    collection: ObjectStoreCollection,
}

impl CloudSecretStore {
    pub fn new(store: Arc<dyn ObjectStore>, key_prefix: &str) -> Self {
        Self {
            collection: ObjectStoreCollection::new(store, &format!("{key_prefix}/secrets.json"), "secret-store"),
        }
    }

    fn is_structurally_valid(value: &str) -> bool {
        value.len() >= 32 && value.len() % 2 == 0 && value.bytes().all(|b| b.is_ascii_hexdigit())
    }
}

#[async_trait]
impl SecretStoreAdapter for CloudSecretStore {
    async fn get_nonce(&self, param_name: &str) -> AdapterResult<String> {
        let records: Vec<SecretRecord> = self.collection.load().await?;
        let record = records
            .iter()
            .find(|r| r.param_name == param_name)
            .ok_or_else(|| AdapterFault::new(AdapterFaultCode::NotFound, "secret-store", format!("no secret for parameter {param_name}")))?;
        if !Self::is_structurally_valid(&record.value) {
            return Err(AdapterFault::new(
                AdapterFaultCode::Corrupt,
                "secret-store",
                format!("stored value for {param_name} fails structural validation"),
            ));
        }
        Ok(record.value.clone())
    }

    async fn rotate_nonce(&self, new_value: &str) -> AdapterResult<()> {
        if !Self::is_structurally_valid(new_value) {
            return Err(AdapterFault::new(
                AdapterFaultCode::Rejected,
                "secret-store",
                "refusing to store a structurally invalid nonce",
            ));
        }
        self.collection
            .mutate(|records: &mut Vec<SecretRecord>| {
                let param_name = format!("oracle/nonce/v{}", now_ms());
                records.push(SecretRecord {
                    param_name,
                    value: new_value.to_string(),
                });
            })
            .await
    }

    async fn is_reachable(&self) -> bool {
        self.collection.load::<SecretRecord>().await.is_ok()
    }
}

pub struct CloudBaselineStore {
    collection: ObjectStoreCollection,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct BaselineRecord {
    key: String,
    version: u64,
    modified_at: i64,
    data_hex: String,
}

impl CloudBaselineStore {
    pub fn new(store: Arc<dyn ObjectStore>, key_prefix: &str) -> Self {
        Self {
            collection: ObjectStoreCollection::new(store, &format!("{key_prefix}/baselines.json"), "baseline-store"),
        }
    }
}

#[async_trait]
impl BaselineStoreAdapter for CloudBaselineStore {
    async fn get_baseline(&self, key: &str) -> AdapterResult<Option<Vec<u8>>> {
        let records: Vec<BaselineRecord> = self.collection.load().await?;
        Ok(records
            .iter()
            .find(|r| r.key == key)
            .and_then(|r| hex::decode(&r.data_hex).ok()))
    }

    async fn put_baseline(&self, key: &str, bytes: Vec<u8>) -> AdapterResult<()> {
        self.collection
            .mutate(|records: &mut Vec<BaselineRecord>| {
                let now = now_ms();
                match records.iter_mut().find(|r| r.key == key) {
                    Some(record) => {
                        record.version += 1;
                        record.modified_at = now;
                        record.data_hex = hex::encode(&bytes);
                    }
                    None => records.push(BaselineRecord {
                        key: key.to_string(),
                        version: 1,
                        modified_at: now,
                        data_hex: hex::encode(&bytes),
                    }),
                }
            })
            .await
    }

    async fn list_baselines(&self) -> AdapterResult<Vec<BaselineMeta>> {
        let records: Vec<BaselineRecord> = self.collection.load().await?;
        let mut metas: Vec<BaselineMeta> = records
            .into_iter()
            .map(|r| BaselineMeta {
                key: r.key,
                version: r.version,
                modified_at: r.modified_at,
            })
            .collect();
        metas.sort_by(|a, b| b.modified_at.cmp(&a.modified_at));
        Ok(metas)
    }

    async fn delete_baseline(&self, key: &str) -> AdapterResult<()> {
        self.collection
            .mutate(|records: &mut Vec<BaselineRecord>| {
                records.retain(|r| r.key != key);
            })
            .await
    }
}

pub struct CloudCalibrationStore {
    collection: ObjectStoreCollection,
}

impl CloudCalibrationStore {
    pub fn new(store: Arc<dyn ObjectStore>, key_prefix: &str) -> Self {
        Self {
            collection: ObjectStoreCollection::new(store, &format!("{key_prefix}/calibration.json"), "calibration-store"),
        }
    }
}

#[async_trait]
impl CalibrationStoreAdapter for CloudCalibrationStore {
    async fn store_calibration_result(&self, result: CalibrationResult) -> AdapterResult<()> {
        self.collection
            .mutate(|results: &mut Vec<CalibrationResult>| {
                match results.iter_mut().find(|r| r.rule_id == result.rule_id) {
                    Some(existing) => *existing = result.clone(),
                    None => results.push(result.clone()),
                }
            })
            .await
    }

    async fn get_calibration_result(&self, rule_id: &str) -> AdapterResult<Option<CalibrationResult>> {
        let results: Vec<CalibrationResult> = self.collection.load().await?;
        Ok(results.into_iter().find(|r| r.rule_id == rule_id))
    }

    async fn get_all_calibration_results(&self) -> AdapterResult<Vec<CalibrationResult>> {
        self.collection.load().await
    }
}
