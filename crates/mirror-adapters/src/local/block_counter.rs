use crate::local::collection::JsonCollection;
use crate::model::BlockCounterEntry;
use crate::ports::{AdapterResult, BlockCounterAdapter};
use async_trait::async_trait;
use mirror_types::error::AdapterFault;
use mirror_types::time::{hour_bucket, now_ms};
use std::path::Path;

/// Bucket lifetime: 2 hours (spec §3 `BlockCounterEntry`).
const BUCKET_TTL_MS: i64 = 7_200_000;

pub struct LocalBlockCounter {
    collection: JsonCollection<BlockCounterEntry>,
}

impl LocalBlockCounter {
    pub fn open(dir: &Path) -> Result<Self, AdapterFault> {
        Ok(Self {
            collection: JsonCollection::open(dir.join("block-counter.json"), "block-counter")?,
        })
    }

    fn bucket_key(rule_id: &str, org_id: &str, now: i64) -> String {
        BlockCounterEntry::bucket_key_for(rule_id, org_id, hour_bucket(now))
    }
}

#[async_trait]
impl BlockCounterAdapter for LocalBlockCounter {
    async fn increment(&self, rule_id: &str, org_id: &str) -> AdapterResult<u64> {
        let now = now_ms();
        let key = Self::bucket_key(rule_id, org_id, now);
        self.collection.write(|entries| {
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
    }

    async fn get_count(&self, rule_id: &str, org_id: &str) -> AdapterResult<u64> {
        let now = now_ms();
        let key = Self::bucket_key(rule_id, org_id, now);
        self.collection.read(|entries| {
            entries
                .iter()
                .find(|e| e.bucket_key == key && e.expires_at > now)
                .map(|e| e.count)
                .unwrap_or(0)
        })
    }

    async fn is_circuit_broken(&self, rule_id: &str, org_id: &str, threshold: u64) -> AdapterResult<bool> {
        Ok(self.get_count(rule_id, org_id).await? >= threshold)
    }
}
