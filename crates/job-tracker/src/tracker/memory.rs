use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

use chrono::NaiveDateTime;

use super::domain::{
    default_skills, ApplicationDraft, ApplicationId, ApplicationRecord, Certification,
    CertificationDraft, CertificationId,
};
use super::repository::{RepositoryError, TrackerRepository, TrackerSnapshot};

#[derive(Debug, Default)]
struct TrackerState {
    applications: BTreeMap<ApplicationId, ApplicationRecord>,
    certifications: BTreeMap<CertificationId, Certification>,
    skills: BTreeSet<String>,
    last_application_id: u64,
    last_certification_id: u64,
}

/// Process-local store guarded by a single mutex.
#[derive(Debug, Default)]
pub struct InMemoryTrackerRepository {
    state: Mutex<TrackerState>,
}

impl InMemoryTrackerRepository {
    pub fn with_default_skills() -> Self {
        let repository = Self::default();
        if let Ok(mut state) = repository.state.lock() {
            state.skills = default_skills();
        }
        repository
    }

    fn lock(&self) -> Result<MutexGuard<'_, TrackerState>, RepositoryError> {
        self.state
            .lock()
            .map_err(|_| RepositoryError::Unavailable("tracker store lock poisoned".to_string()))
    }
}

fn newest_first<T, K: Ord + Copy>(
    values: impl Iterator<Item = T>,
    key: impl Fn(&T) -> (NaiveDateTime, K),
) -> Vec<T> {
    let mut values: Vec<T> = values.collect();
    values.sort_by(|left, right| key(right).cmp(&key(left)));
    values
}

impl TrackerRepository for InMemoryTrackerRepository {
    fn insert_application(
        &self,
        draft: ApplicationDraft,
        created_at: NaiveDateTime,
    ) -> Result<ApplicationRecord, RepositoryError> {
        let mut state = self.lock()?;
        state.last_application_id += 1;
        let id = ApplicationId(state.last_application_id);
        let record = ApplicationRecord::from_draft(id, draft, created_at);
        state.applications.insert(id, record.clone());
        Ok(record)
    }

    fn update_application(&self, record: ApplicationRecord) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        match state.applications.get_mut(&record.id) {
            Some(existing) => {
                *existing = record;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch_application(
        &self,
        id: ApplicationId,
    ) -> Result<Option<ApplicationRecord>, RepositoryError> {
        Ok(self.lock()?.applications.get(&id).cloned())
    }

    fn delete_application(&self, id: ApplicationId) -> Result<(), RepositoryError> {
        self.lock()?
            .applications
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    fn applications(&self) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        let state = self.lock()?;
        Ok(newest_first(state.applications.values().cloned(), |record| {
            (record.created_at, record.id)
        }))
    }

    fn insert_certification(
        &self,
        draft: CertificationDraft,
        created_at: NaiveDateTime,
    ) -> Result<Certification, RepositoryError> {
        let mut state = self.lock()?;
        state.last_certification_id += 1;
        let id = CertificationId(state.last_certification_id);
        let certification = Certification {
            id,
            name: draft.name.trim().to_string(),
            obtained_on: draft.obtained_on,
            expires_on: draft.expires_on,
            created_at,
        };
        state.certifications.insert(id, certification.clone());
        Ok(certification)
    }

    fn fetch_certification(
        &self,
        id: CertificationId,
    ) -> Result<Option<Certification>, RepositoryError> {
        Ok(self.lock()?.certifications.get(&id).cloned())
    }

    fn delete_certification(&self, id: CertificationId) -> Result<(), RepositoryError> {
        self.lock()?
            .certifications
            .remove(&id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    fn certifications(&self) -> Result<Vec<Certification>, RepositoryError> {
        let state = self.lock()?;
        Ok(newest_first(state.certifications.values().cloned(), |cert| {
            (cert.created_at, cert.id)
        }))
    }

    fn skills(&self) -> Result<Vec<String>, RepositoryError> {
        Ok(self.lock()?.skills.iter().cloned().collect())
    }

    fn add_skill(&self, name: String) -> Result<(), RepositoryError> {
        if self.lock()?.skills.insert(name) {
            Ok(())
        } else {
            Err(RepositoryError::Conflict)
        }
    }

    fn remove_skill(&self, name: &str) -> Result<(), RepositoryError> {
        if self.lock()?.skills.remove(name) {
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn replace_skills(&self, skills: BTreeSet<String>) -> Result<(), RepositoryError> {
        self.lock()?.skills = skills;
        Ok(())
    }

    fn snapshot(&self) -> Result<TrackerSnapshot, RepositoryError> {
        let state = self.lock()?;
        Ok(TrackerSnapshot {
            applications: newest_first(state.applications.values().cloned(), |record| {
                (record.created_at, record.id)
            }),
            certifications: newest_first(state.certifications.values().cloned(), |cert| {
                (cert.created_at, cert.id)
            }),
            skills: state.skills.clone(),
        })
    }

    fn restore(&self, snapshot: TrackerSnapshot) -> Result<(), RepositoryError> {
        let mut state = self.lock()?;
        state.last_application_id = snapshot
            .applications
            .iter()
            .map(|record| record.id.0)
            .max()
            .unwrap_or(0);
        state.last_certification_id = snapshot
            .certifications
            .iter()
            .map(|cert| cert.id.0)
            .max()
            .unwrap_or(0);
        state.applications = snapshot
            .applications
            .into_iter()
            .map(|record| (record.id, record))
            .collect();
        state.certifications = snapshot
            .certifications
            .into_iter()
            .map(|cert| (cert.id, cert))
            .collect();
        state.skills = snapshot.skills;
        Ok(())
    }
}
