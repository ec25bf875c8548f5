use crate::local::collection::JsonCollection;
use crate::model::{FpEvent, FpWindow};
use crate::ports::{AdapterResult, FpStoreAdapter};
use async_trait::async_trait;
use mirror_types::error::{AdapterFault, AdapterFaultCode};
use std::path::Path;

pub struct LocalFpStore {
    collection: JsonCollection<FpEvent>,
}

impl LocalFpStore {
    pub fn open(dir: &Path) -> Result<Self, AdapterFault> {
        Ok(Self {
            collection: JsonCollection::open(dir.join("fp-events.json"), "fp-store")?,
        })
    }
}

#[async_trait]
impl FpStoreAdapter for LocalFpStore {
    async fn record_event(&self, event: FpEvent) -> AdapterResult<()> {
        self.collection.write(|events| {
            if events.iter().any(|e| e.event_id == event.event_id) {
                return Err(AdapterFault::new(
                    AdapterFaultCode::Duplicate,
                    "fp-store",
                    format!("eventId {} already exists", event.event_id),
                ));
            }
            events.push(event);
            Ok(())
        })?
    }

    async fn mark_false_positive(
        &self,
        finding_id: &str,
        reviewed_by: &str,
        ticket: Option<&str>,
    ) -> AdapterResult<()> {
        self.collection.write(|events| {
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
            event.reviewed_at = Some(mirror_types::time::now_ms());
            Ok(())
        })?
    }

    async fn get_window_by_count(&self, rule_id: &str, n: usize) -> AdapterResult<FpWindow> {
        self.collection.read(|events| {
            let mut matching: Vec<FpEvent> = events
                .iter()
                .filter(|e| e.rule_id == rule_id)
                .cloned()
                .collect();
            matching.sort_by(|a, b| b.timestamp_ms.cmp(&a.timestamp_ms));
            matching.truncate(n);
            Ok(FpWindow::from_events(rule_id, matching))
        })
    }

    async fn get_window_by_since(&self, rule_id: &str, since_ms: i64) -> AdapterResult<FpWindow> {
        self.collection.read(|events| {
            let mut matching: Vec<FpEvent> = events
                .iter()
                .filter(|e| e.rule_id == rule_id && e.timestamp_ms >= since_ms)
                .cloned()
                .collect();
            matching.sort_by(|a, b| b.timestamp_ms.cmp(&a.timestamp_ms));
            Ok(FpWindow::from_events(rule_id, matching))
        })
    }

    async fn is_false_positive(&self, finding_id: &str) -> AdapterResult<bool> {
        self.collection.read(|events| {
            Ok(events
                .iter()
                .find(|e| e.finding_id == finding_id)
                .map(|e| e.is_false_positive)
                .unwrap_or(false))
        })
    }

    async fn is_false_positive_for_rule(
        &self,
        rule_id: &str,
        finding_id: &str,
    ) -> AdapterResult<bool> {
        self.collection.read(|events| {
            Ok(events
                .iter()
                .find(|e| e.rule_id == rule_id && e.finding_id == finding_id)
                .map(|e| e.is_false_positive)
                .unwrap_or(false))
        })
    }
}
