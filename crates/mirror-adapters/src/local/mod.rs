//! File-backed local provider (spec §4.D "Local provider").
//!
//! Each store is a [`collection::JsonCollection`] over its own file
//! under `localDataDir`, guarded by an in-process mutex. Safe within one
//! process; cross-process use needs an OS-level lock file, which this
//! provider does not implement.

mod baseline;
mod block_counter;
mod calibration;
mod collection;
mod consent;
mod fp;
mod secret;

pub use baseline::LocalBaselineStore;
pub use block_counter::LocalBlockCounter;
pub use calibration::LocalCalibrationStore;
pub use consent::LocalConsentStore;
pub use fp::LocalFpStore;
pub use secret::LocalSecretStore;

use mirror_types::error::AdapterFault;
use std::path::Path;

/// All six local adapters rooted at the same `localDataDir`.
pub struct LocalProvider {
    pub fp_store: LocalFpStore,
    pub block_counter: LocalBlockCounter,
    pub consent_store: LocalConsentStore,
    pub secret_store: LocalSecretStore,
    pub baseline_store: LocalBaselineStore,
    pub calibration_store: LocalCalibrationStore,
}

impl LocalProvider {
    pub fn open(data_dir: &Path) -> Result<Self, AdapterFault> {
        Ok(Self {
            fp_store: LocalFpStore::open(data_dir)?,
            block_counter: LocalBlockCounter::open(data_dir)?,
            consent_store: LocalConsentStore::open(data_dir)?,
            secret_store: LocalSecretStore::open(data_dir)?,
            baseline_store: LocalBaselineStore::open(data_dir)?,
            calibration_store: LocalCalibrationStore::open(data_dir)?,
        })
    }
}
