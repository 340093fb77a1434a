//! In-process identity store.
//!
//! Same contract as the PostgreSQL repository, including write-only passwords and
//! name ordering. Used by the test suites and for running the API without a database.

use super::patients::PatientRepository;
use crate::error::{CoreError, CoreResult};
use crate::patient::{PatientRecord, PatientUpdate};
use crate::types::PatientId;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Clone, Debug, Default)]
pub struct InMemoryPatientRepository {
    records: Arc<RwLock<BTreeMap<PatientId, PatientRecord>>>,
}

impl InMemoryPatientRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl PatientRepository for InMemoryPatientRepository {
    async fn create(&self, record: &PatientRecord) -> CoreResult<()> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.patient_id) {
            return Err(CoreError::Conflict(record.patient_id.to_string()));
        }
        records.insert(record.patient_id.clone(), record.clone());
        Ok(())
    }

    async fn list(&self) -> CoreResult<Vec<PatientRecord>> {
        let records = self.records.read().await;
        let mut listed: Vec<PatientRecord> = records
            .values()
            .cloned()
            .map(PatientRecord::without_password)
            .collect();
        listed.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(listed)
    }

    async fn get(&self, patient_id: &PatientId) -> CoreResult<PatientRecord> {
        self.records
            .read()
            .await
            .get(patient_id)
            .cloned()
            .map(PatientRecord::without_password)
            .ok_or_else(|| CoreError::NotFound(patient_id.to_string()))
    }

    async fn update(&self, patient_id: &PatientId, update: &PatientUpdate) -> CoreResult<()> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(patient_id)
            .ok_or_else(|| CoreError::NotFound(patient_id.to_string()))?;
        update.clone().apply_to(record);
        Ok(())
    }

    async fn delete(&self, patient_id: &PatientId) -> CoreResult<()> {
        self.records
            .write()
            .await
            .remove(patient_id)
            .map(|_| ())
            .ok_or_else(|| CoreError::NotFound(patient_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::decode_create_request;
    use api_shared::CreatePatientReq;
    use chrono::NaiveDate;

    fn record(id: &str, name: &str) -> PatientRecord {
        decode_create_request(&CreatePatientReq {
            patient_id: Some(id.into()),
            name: Some(name.into()),
            email: Some(format!("{id}@example.com")),
            password: Some("secret".into()),
            role: Some("patient".into()),
            date_of_birth: Some("1990-01-15".into()),
            gender: Some("female".into()),
            medical_history: Some("asthma".into()),
        })
        .expect("fixture should decode")
    }

    fn id(raw: &str) -> PatientId {
        PatientId::new(raw).unwrap()
    }

    #[tokio::test]
    async fn create_then_get_matches_except_password() {
        let repo = InMemoryPatientRepository::new();
        let created = record("p1", "Ada");
        repo.create(&created).await.expect("create should succeed");

        let fetched = repo.get(&id("p1")).await.expect("get should succeed");
        assert_eq!(fetched, created.clone().without_password());
        assert!(fetched.password.is_none());
        assert_eq!(fetched.date_of_birth, NaiveDate::from_ymd_opt(1990, 1, 15));
    }

    #[tokio::test]
    async fn duplicate_create_conflicts() {
        let repo = InMemoryPatientRepository::new();
        repo.create(&record("p1", "Ada")).await.unwrap();
        let err = repo.create(&record("p1", "Other")).await.unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn list_is_ordered_by_name() {
        let repo = InMemoryPatientRepository::new();
        repo.create(&record("p1", "Grace")).await.unwrap();
        repo.create(&record("p2", "Ada")).await.unwrap();
        repo.create(&record("p3", "Barbara")).await.unwrap();

        let names: Vec<String> = repo.list().await.unwrap().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["Ada", "Barbara", "Grace"]);
    }

    #[tokio::test]
    async fn update_and_delete_on_unknown_id_are_not_found() {
        let repo = InMemoryPatientRepository::new();
        repo.create(&record("p1", "Ada")).await.unwrap();

        let update = PatientUpdate {
            name: "Nobody".into(),
            date_of_birth: None,
            gender: None,
            email: None,
            medical_history: None,
            role: "patient".into(),
        };
        assert!(matches!(
            repo.update(&id("ghost"), &update).await.unwrap_err(),
            CoreError::NotFound(_)
        ));
        assert!(matches!(
            repo.delete(&id("ghost")).await.unwrap_err(),
            CoreError::NotFound(_)
        ));

        let untouched = repo.get(&id("p1")).await.unwrap();
        assert_eq!(untouched.name, "Ada");
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn update_overwrites_every_mutable_column() {
        let repo = InMemoryPatientRepository::new();
        repo.create(&record("p1", "Ada")).await.unwrap();

        let update = PatientUpdate {
            name: "Ada Lovelace".into(),
            date_of_birth: None,
            gender: None,
            email: Some("ada@x.com".into()),
            medical_history: None,
            role: "doctor".into(),
        };
        repo.update(&id("p1"), &update).await.expect("update should succeed");

        let fetched = repo.get(&id("p1")).await.unwrap();
        assert_eq!(fetched.name, "Ada Lovelace");
        assert_eq!(fetched.date_of_birth, None);
        assert_eq!(fetched.gender, None);
        assert_eq!(fetched.medical_history, None);
        assert_eq!(fetched.role, "doctor");
    }

    #[tokio::test]
    async fn delete_removes_the_record() {
        let repo = InMemoryPatientRepository::new();
        repo.create(&record("p1", "Ada")).await.unwrap();
        repo.delete(&id("p1")).await.expect("delete should succeed");
        assert!(matches!(repo.get(&id("p1")).await.unwrap_err(), CoreError::NotFound(_)));
        assert!(repo.is_empty().await);
    }
}
