//! Cloud-agnostic adapters (spec §4.E "Cloud Adapters").
//!
//! All three cloud providers share one implementation
//! ([`adapters`]) built over `object_store`'s unified
//! `ObjectStore` trait; only construction differs per provider. Oracle
//! Cloud Infrastructure's Object Storage exposes an S3-compatible API,
//! so `build_oracle` reuses the S3 builder pointed at an OCI endpoint
//! rather than a dedicated OCI SDK (see DESIGN.md).

mod adapters;
mod store;

pub use adapters::{
    CloudBaselineStore, CloudBlockCounter, CloudCalibrationStore, CloudConsentStore, CloudFpStore,
    CloudSecretStore,
};

use mirror_types::error::{AdapterFault, AdapterFaultCode};
use object_store::ObjectStore;
use std::sync::Arc;

/// Bundles all six cloud adapters rooted at the same bucket/prefix.
pub struct CloudProvider {
    pub fp_store: CloudFpStore,
    pub block_counter: CloudBlockCounter,
    pub consent_store: CloudConsentStore,
    pub secret_store: CloudSecretStore,
    pub baseline_store: CloudBaselineStore,
    pub calibration_store: CloudCalibrationStore,
}

impl CloudProvider {
    pub fn new(store: Arc<dyn ObjectStore>, key_prefix: &str) -> Self {
        Self {
            fp_store: CloudFpStore::new(store.clone(), key_prefix),
            block_counter: CloudBlockCounter::new(store.clone(), key_prefix),
            consent_store: CloudConsentStore::new(store.clone(), key_prefix),
            secret_store: CloudSecretStore::new(store.clone(), key_prefix),
            baseline_store: CloudBaselineStore::new(store.clone(), key_prefix),
            calibration_store: CloudCalibrationStore::new(store, key_prefix),
        }
    }
}

#[cfg(feature = "aws")]
pub fn build_aws(bucket: &str, region: &str) -> Result<Arc<dyn ObjectStore>, AdapterFault> {
    use object_store::aws::AmazonS3Builder;
    let store = AmazonS3Builder::from_env()
        .with_bucket_name(bucket)
        .with_region(region)
        .build()
        .map_err(|e| AdapterFault::new(AdapterFaultCode::Unreachable, "cloud-provider:aws", e.to_string()))?;
    Ok(Arc::new(store))
}

#[cfg(feature = "gcp")]
pub fn build_gcp(bucket: &str) -> Result<Arc<dyn ObjectStore>, AdapterFault> {
    use object_store::gcp::GoogleCloudStorageBuilder;
    let store = GoogleCloudStorageBuilder::from_env()
        .with_bucket_name(bucket)
        .build()
        .map_err(|e| AdapterFault::new(AdapterFaultCode::Unreachable, "cloud-provider:gcp", e.to_string()))?;
    Ok(Arc::new(store))
}

/// Oracle Cloud Infrastructure Object Storage, via its S3-compatible
/// endpoint (`https://<namespace>.compat.objectstorage.<region>.oraclecloud.com`).
#[cfg(feature = "oracle")]
pub fn build_oracle(bucket: &str, region: &str, endpoint: &str) -> Result<Arc<dyn ObjectStore>, AdapterFault> {
    use object_store::aws::AmazonS3Builder;
    let store = AmazonS3Builder::from_env()
        .with_bucket_name(bucket)
        .with_region(region)
        .with_endpoint(endpoint)
        .with_virtual_hosted_style_request(false)
        .build()
        .map_err(|e| AdapterFault::new(AdapterFaultCode::Unreachable, "cloud-provider:oracle", e.to_string()))?;
    Ok(Arc::new(store))
}
