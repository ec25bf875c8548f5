//! Generic JSON-blob collection over a cloud-agnostic [`ObjectStore`].
//!
//! The same JSON-array-of-records shape as the local provider's
//! `JsonCollection`, but backed by `object_store`'s unified AWS S3 / GCS /
//! HTTP-S3-compatible API instead of the local filesystem — one code path
//! for every cloud provider spec §4.D names.

use mirror_types::error::{AdapterFault, AdapterFaultCode};
use object_store::path::Path as ObjectPath;
use object_store::{ObjectStore, PutMode, PutOptions, UpdateVersion};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

/// Attempts a conditional write may retry before giving up (spec §4.D
/// `increment` "MUST be atomic under concurrent callers").
const MAX_CAS_ATTEMPTS: u32 = 16;

pub struct ObjectStoreCollection {
    store: Arc<dyn ObjectStore>,
    path: ObjectPath,
    source: &'static str,
}

impl ObjectStoreCollection {
    pub fn new(store: Arc<dyn ObjectStore>, key: &str, source: &'static str) -> Self {
        Self {
            store,
            path: ObjectPath::from(key),
            source,
        }
    }

    async fn load_with_version<T: DeserializeOwned>(&self) -> Result<(Vec<T>, Option<UpdateVersion>), AdapterFault> {
        match self.store.get(&self.path).await {
            Ok(result) => {
                let version = UpdateVersion {
                    e_tag: result.meta.e_tag.clone(),
                    version: result.meta.version.clone(),
                };
                let bytes = result
                    .bytes()
                    .await
                    .map_err(|e| AdapterFault::new(AdapterFaultCode::Unreachable, self.source, e.to_string()))?;
                let records = if bytes.is_empty() {
                    Vec::new()
                } else {
                    serde_json::from_slice(&bytes)
                        .map_err(|e| AdapterFault::new(AdapterFaultCode::Corrupt, self.source, e.to_string()))?
                };
                Ok((records, Some(version)))
            }
            Err(object_store::Error::NotFound { .. }) => Ok((Vec::new(), None)),
            Err(e) => Err(AdapterFault::new(AdapterFaultCode::Unreachable, self.source, e.to_string())),
        }
    }

    pub async fn load<T: DeserializeOwned>(&self) -> Result<Vec<T>, AdapterFault> {
        self.load_with_version().await.map(|(records, _)| records)
    }

    pub async fn save<T: Serialize + Sync>(&self, records: &[T]) -> Result<(), AdapterFault> {
        let bytes = serde_json::to_vec(records)
            .map_err(|e| AdapterFault::new(AdapterFaultCode::Io, self.source, e.to_string()))?;
        self.store
            .put(&self.path, bytes.into())
            .await
            .map_err(|e| AdapterFault::new(AdapterFaultCode::Unreachable, self.source, e.to_string()))?;
        Ok(())
    }

    /// Loads, mutates via `f`, and writes back as a compare-and-swap: the
    /// write is conditioned on the `e_tag`/`version` observed at load
    /// time (`PutMode::Update`, or `PutMode::Create` when the object
    /// didn't exist yet). A concurrent writer that wins the race makes
    /// this write fail its precondition instead of silently clobbering
    /// the other writer's update; on that outcome this reloads the
    /// now-current record set, reapplies `f`, and retries, up to
    /// `MAX_CAS_ATTEMPTS` times (spec §4.D: `increment` "MUST be atomic
    /// under concurrent callers"; §5: remote providers rely "on the
    /// backend's atomic increment primitive").
    ///
    /// `f` must be safe to call more than once against successive reloads
    /// of the same records — every caller in this crate only reads and
    /// clones captured inputs, never consumes them, so this holds.
    pub async fn mutate<T, R>(&self, f: impl Fn(&mut Vec<T>) -> R) -> Result<R, AdapterFault>
    where
        T: Serialize + DeserializeOwned + Sync,
        R: Send,
    {
        for attempt in 0..MAX_CAS_ATTEMPTS {
            let (mut records, version) = self.load_with_version().await?;
            let result = f(&mut records);
            let bytes = serde_json::to_vec(&records)
                .map_err(|e| AdapterFault::new(AdapterFaultCode::Io, self.source, e.to_string()))?;
            let mode = match version {
                Some(v) => PutMode::Update(v),
                None => PutMode::Create,
            };
            match self
                .store
                .put_opts(&self.path, bytes.into(), PutOptions { mode, ..Default::default() })
                .await
            {
                Ok(_) => return Ok(result),
                Err(object_store::Error::Precondition { .. }) | Err(object_store::Error::AlreadyExists { .. }) => {
                    tracing::debug!(
                        target: "mirror_adapters",
                        source = self.source,
                        attempt,
                        "conditional write lost a race; reloading and retrying"
                    );
                    continue;
                }
                Err(e) => return Err(AdapterFault::new(AdapterFaultCode::Unreachable, self.source, e.to_string())),
            }
        }
        Err(AdapterFault::new(
            AdapterFaultCode::Rejected,
            self.source,
            format!("exceeded {MAX_CAS_ATTEMPTS} conditional-write retries"),
        ))
    }
}
