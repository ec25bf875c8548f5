//! Provider-polymorphic adapter factory (spec §4.D "Local provider" /
//! DESIGN NOTES §9 "Polymorphism over providers": a compile-time
//! interface per adapter, a factory that selects by provider enum, no
//! reflection).

use crate::config::OracleConfig;
use mirror_adapters::ports::{
    BaselineStoreAdapter, BlockCounterAdapter, CalibrationStoreAdapter, ConsentStoreAdapter,
    FpStoreAdapter, SecretStoreAdapter,
};
use mirror_adapters::provider::Provider;
use mirror_types::error::{AdapterFault, AdapterFaultCode};
use std::path::Path;
use std::sync::Arc;

/// The six adapter ports, resolved once at construction and shared by
/// every `analyze` call thereafter (spec §4.G step 1: "resolve adapters
/// from construction-time config").
#[derive(Clone)]
pub struct AdapterSet {
    pub fp_store: Arc<dyn FpStoreAdapter>,
    pub block_counter: Arc<dyn BlockCounterAdapter>,
    pub consent_store: Arc<dyn ConsentStoreAdapter>,
    pub secret_store: Arc<dyn SecretStoreAdapter>,
    pub baseline_store: Arc<dyn BaselineStoreAdapter>,
    pub calibration_store: Arc<dyn CalibrationStoreAdapter>,
}

impl AdapterSet {
    /// Resolves the full adapter set for `config.provider`, matching
    /// DESIGN NOTES §9's factory-selects-by-enum guidance.
    pub fn build(config: &OracleConfig) -> Result<Self, AdapterFault> {
        match config.provider {
            Provider::Local => Self::build_local(config),
            Provider::Aws => Self::build_aws(config),
            Provider::Gcp => Self::build_gcp(config),
            Provider::Oracle => Self::build_oracle_cloud(config),
        }
    }

    fn build_local(config: &OracleConfig) -> Result<Self, AdapterFault> {
        #[cfg(feature = "local")]
        {
            let provider = mirror_adapters::local::LocalProvider::open(Path::new(&config.local_data_dir))?;
            Ok(Self {
                fp_store: Arc::new(provider.fp_store),
                block_counter: Arc::new(provider.block_counter),
                consent_store: Arc::new(provider.consent_store),
                secret_store: Arc::new(provider.secret_store),
                baseline_store: Arc::new(provider.baseline_store),
                calibration_store: Arc::new(provider.calibration_store),
            })
        }
        #[cfg(not(feature = "local"))]
        {
            let _ = config;
            Err(AdapterFault::new(
                AdapterFaultCode::Rejected,
                "adapter-factory",
                "provider Local requires the 'local' feature to be enabled",
            ))
        }
    }

    /// The cloud key prefix under which all six adapters' files live.
    /// `fpTableName` is reused as this prefix (falling back to a fixed
    /// default) since the underlying `CloudProvider` roots every store
    /// at one bucket/prefix pair rather than six independently-named
    /// resources; see DESIGN.md for the full rationale.
    #[cfg(any(feature = "aws", feature = "gcp", feature = "oracle-cloud"))]
    fn cloud_prefix(config: &OracleConfig) -> &str {
        config
            .fp_table_name
            .as_deref()
            .unwrap_or("mirror-dissonance")
    }

    #[cfg(any(feature = "aws", feature = "gcp", feature = "oracle-cloud"))]
    fn cloud_bucket(config: &OracleConfig) -> Result<&str, AdapterFault> {
        config.baseline_bucket.as_deref().ok_or_else(|| {
            AdapterFault::new(
                AdapterFaultCode::Rejected,
                "adapter-factory",
                "cloud providers require baselineBucket to name the backing bucket",
            )
        })
    }

    fn build_aws(config: &OracleConfig) -> Result<Self, AdapterFault> {
        #[cfg(feature = "aws")]
        {
            let bucket = Self::cloud_bucket(config)?;
            let region = config.region.as_deref().ok_or_else(|| {
                AdapterFault::new(AdapterFaultCode::Rejected, "adapter-factory", "provider aws requires region")
            })?;
            let store = mirror_adapters::cloud::build_aws(bucket, region)?;
            Ok(Self::from_cloud_provider(mirror_adapters::cloud::CloudProvider::new(store, Self::cloud_prefix(config))))
        }
        #[cfg(not(feature = "aws"))]
        {
            let _ = config;
            Err(AdapterFault::new(
                AdapterFaultCode::Rejected,
                "adapter-factory",
                "provider Aws requires the 'aws' feature to be enabled",
            ))
        }
    }

    fn build_gcp(config: &OracleConfig) -> Result<Self, AdapterFault> {
        #[cfg(feature = "gcp")]
        {
            let bucket = Self::cloud_bucket(config)?;
            let store = mirror_adapters::cloud::build_gcp(bucket)?;
            Ok(Self::from_cloud_provider(mirror_adapters::cloud::CloudProvider::new(store, Self::cloud_prefix(config))))
        }
        #[cfg(not(feature = "gcp"))]
        {
            let _ = config;
            Err(AdapterFault::new(
                AdapterFaultCode::Rejected,
                "adapter-factory",
                "provider Gcp requires the 'gcp' feature to be enabled",
            ))
        }
    }

    fn build_oracle_cloud(config: &OracleConfig) -> Result<Self, AdapterFault> {
        #[cfg(feature = "oracle-cloud")]
        {
            let bucket = Self::cloud_bucket(config)?;
            let region = config.region.as_deref().ok_or_else(|| {
                AdapterFault::new(AdapterFaultCode::Rejected, "adapter-factory", "provider oracle requires region")
            })?;
            let endpoint = config.endpoint.as_deref().ok_or_else(|| {
                AdapterFault::new(AdapterFaultCode::Rejected, "adapter-factory", "provider oracle requires endpoint")
            })?;
            let store = mirror_adapters::cloud::build_oracle(bucket, region, endpoint)?;
            Ok(Self::from_cloud_provider(mirror_adapters::cloud::CloudProvider::new(store, Self::cloud_prefix(config))))
        }
        #[cfg(not(feature = "oracle-cloud"))]
        {
            let _ = config;
            Err(AdapterFault::new(
                AdapterFaultCode::Rejected,
                "adapter-factory",
                "provider Oracle requires the 'oracle-cloud' feature to be enabled",
            ))
        }
    }

    #[cfg(any(feature = "aws", feature = "gcp", feature = "oracle-cloud"))]
    fn from_cloud_provider(provider: mirror_adapters::cloud::CloudProvider) -> Self {
        Self {
            fp_store: Arc::new(provider.fp_store),
            block_counter: Arc::new(provider.block_counter),
            consent_store: Arc::new(provider.consent_store),
            secret_store: Arc::new(provider.secret_store),
            baseline_store: Arc::new(provider.baseline_store),
            calibration_store: Arc::new(provider.calibration_store),
        }
    }
}
