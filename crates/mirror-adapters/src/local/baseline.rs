use crate::local::collection::JsonCollection;
use crate::model::BaselineMeta;
use crate::ports::{AdapterResult, BaselineStoreAdapter};
use async_trait::async_trait;
use mirror_types::error::AdapterFault;
use mirror_types::time::now_ms;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct BaselineRecord {
    key: String,
    version: u64,
    modified_at: i64,
    #[serde(with = "hex_bytes")]
    data: Vec<u8>,
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(d)?;
        hex::decode(s).map_err(serde::de::Error::custom)
    }
}

pub struct LocalBaselineStore {
    collection: JsonCollection<BaselineRecord>,
}

impl LocalBaselineStore {
    pub fn open(dir: &Path) -> Result<Self, AdapterFault> {
        Ok(Self {
            collection: JsonCollection::open(dir.join("baselines.json"), "baseline-store")?,
        })
    }
}

#[async_trait]
impl BaselineStoreAdapter for LocalBaselineStore {
    async fn get_baseline(&self, key: &str) -> AdapterResult<Option<Vec<u8>>> {
        self.collection.read(|records| {
            Ok(records.iter().find(|r| r.key == key).map(|r| r.data.clone()))
        })
    }

    async fn put_baseline(&self, key: &str, bytes: Vec<u8>) -> AdapterResult<()> {
        self.collection.write(|records| {
            let now = now_ms();
            match records.iter_mut().find(|r| r.key == key) {
                Some(record) => {
                    record.version += 1;
                    record.modified_at = now;
                    record.data = bytes;
                }
                None => records.push(BaselineRecord {
                    key: key.to_string(),
                    version: 1,
                    modified_at: now,
                    data: bytes,
                }),
            }
        })?;
        Ok(())
    }

    async fn list_baselines(&self) -> AdapterResult<Vec<BaselineMeta>> {
        self.collection.read(|records| {
            let mut metas: Vec<BaselineMeta> = records
                .iter()
                .map(|r| BaselineMeta {
                    key: r.key.clone(),
                    version: r.version,
                    modified_at: r.modified_at,
                })
                .collect();
            metas.sort_by(|a, b| b.modified_at.cmp(&a.modified_at));
            Ok(metas)
        })
    }

    async fn delete_baseline(&self, key: &str) -> AdapterResult<()> {
        self.collection.write(|records| {
            records.retain(|r| r.key != key);
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBaselineStore::open(dir.path()).unwrap();
        store.put_baseline("k1", vec![1, 2, 3]).await.unwrap();
        assert_eq!(store.get_baseline("k1").await.unwrap(), Some(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn put_twice_bumps_version() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBaselineStore::open(dir.path()).unwrap();
        store.put_baseline("k1", vec![1]).await.unwrap();
        store.put_baseline("k1", vec![2]).await.unwrap();
        let metas = store.list_baselines().await.unwrap();
        assert_eq!(metas[0].version, 2);
    }

    #[tokio::test]
    async fn delete_removes_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBaselineStore::open(dir.path()).unwrap();
        store.put_baseline("k1", vec![1]).await.unwrap();
        store.delete_baseline("k1").await.unwrap();
        assert_eq!(store.get_baseline("k1").await.unwrap(), None);
    }
}
