use std::collections::HashMap;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::models::Patient;

/// Abstraction over patient record storage.
/// The mediator only ever hands pseudonym-keyed records across this seam;
/// tokens never reach a backend.
#[async_trait]
pub trait PatientBackend: Send + Sync {
    /// Store records, reporting success per pseudonym.
    async fn store(&self, patients: Vec<Patient>) -> anyhow::Result<HashMap<String, bool>>;

    /// Fetch the records for the given pseudonyms. Unknown pseudonyms are
    /// skipped, not errors.
    async fn fetch(&self, pseudonyms: Vec<String>) -> anyhow::Result<Vec<Patient>>;
}

/// Reference backend keeping records in process memory. Holds whatever was
/// last stored per pseudonym; nothing survives a restart.
#[derive(Default)]
pub struct MemoryBackend {
    records: DashMap<String, Patient>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl PatientBackend for MemoryBackend {
    async fn store(&self, patients: Vec<Patient>) -> anyhow::Result<HashMap<String, bool>> {
        let mut outcome = HashMap::with_capacity(patients.len());
        for patient in patients {
            outcome.insert(patient.pseudonym.clone(), true);
            self.records.insert(patient.pseudonym.clone(), patient);
        }
        Ok(outcome)
    }

    async fn fetch(&self, pseudonyms: Vec<String>) -> anyhow::Result<Vec<Patient>> {
        Ok(pseudonyms
            .iter()
            .filter_map(|p| self.records.get(p).map(|entry| entry.value().clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn store_then_fetch_round_trips() {
        let backend = MemoryBackend::new();
        assert!(backend.is_empty());

        let stored = backend
            .store(vec![
                Patient::new("psn-1", "payload-1"),
                Patient::new("psn-2", "payload-2"),
            ])
            .await
            .unwrap();

        assert_eq!(stored.len(), 2);
        assert_eq!(stored.get("psn-1"), Some(&true));
        assert_eq!(backend.len(), 2);

        let fetched = backend
            .fetch(vec!["psn-2".into(), "psn-1".into()])
            .await
            .unwrap();
        assert_eq!(fetched.len(), 2);
        assert_eq!(fetched[0].pseudonym, "psn-2");
        assert_eq!(fetched[0].mdat, "payload-2");
    }

    #[tokio::test]
    async fn fetch_skips_unknown_pseudonyms() {
        let backend = MemoryBackend::new();
        backend
            .store(vec![Patient::new("psn-1", "payload-1")])
            .await
            .unwrap();

        let fetched = backend
            .fetch(vec!["missing".into(), "psn-1".into()])
            .await
            .unwrap();
        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched[0].pseudonym, "psn-1");
    }

    #[tokio::test]
    async fn store_overwrites_the_previous_record() {
        let backend = MemoryBackend::new();
        backend
            .store(vec![Patient::new("psn-1", "old")])
            .await
            .unwrap();
        backend
            .store(vec![Patient::new("psn-1", "new")])
            .await
            .unwrap();
        assert_eq!(backend.len(), 1);

        let fetched = backend.fetch(vec!["psn-1".into()]).await.unwrap();
        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched[0].mdat, "new");
    }
}
