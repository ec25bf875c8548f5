use crate::local::collection::JsonCollection;
use crate::model::CalibrationResult;
use crate::ports::{AdapterResult, CalibrationStoreAdapter};
use async_trait::async_trait;
use mirror_types::error::AdapterFault;
use std::path::Path;

pub struct LocalCalibrationStore {
    collection: JsonCollection<CalibrationResult>,
}

impl LocalCalibrationStore {
    pub fn open(dir: &Path) -> Result<Self, AdapterFault> {
        Ok(Self {
            collection: JsonCollection::open(dir.join("calibration.json"), "calibration-store")?,
        })
    }
}

#[async_trait]
impl CalibrationStoreAdapter for LocalCalibrationStore {
    async fn store_calibration_result(&self, result: CalibrationResult) -> AdapterResult<()> {
        self.collection.write(|results| {
            match results.iter_mut().find(|r| r.rule_id == result.rule_id) {
                Some(existing) => *existing = result,
                None => results.push(result),
            }
        })?;
        Ok(())
    }

    async fn get_calibration_result(&self, rule_id: &str) -> AdapterResult<Option<CalibrationResult>> {
        self.collection
            .read(|results| Ok(results.iter().find(|r| r.rule_id == rule_id).cloned()))
    }

    async fn get_all_calibration_results(&self) -> AdapterResult<Vec<CalibrationResult>> {
        self.collection.read(|results| Ok(results.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(rule_id: &str, fpr: f64) -> CalibrationResult {
        CalibrationResult {
            rule_id: rule_id.to_string(),
            false_positive_rate: fpr,
            sample_size: 10,
            computed_at: 1000,
            excluded_reporters: Vec::new(),
        }
    }

    #[tokio::test]
    async fn store_then_get_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalCalibrationStore::open(dir.path()).unwrap();
        store.store_calibration_result(result("R1", 0.2)).await.unwrap();
        let got = store.get_calibration_result("R1").await.unwrap().unwrap();
        assert_eq!(got.false_positive_rate, 0.2);
    }

    #[tokio::test]
    async fn storing_again_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalCalibrationStore::open(dir.path()).unwrap();
        store.store_calibration_result(result("R1", 0.2)).await.unwrap();
        store.store_calibration_result(result("R1", 0.5)).await.unwrap();
        let all = store.get_all_calibration_results().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].false_positive_rate, 0.5);
    }
}
