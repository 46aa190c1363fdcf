//! Admission records.
//!
//! An admission is created `admitted` and can only move to `discharged`. Discharge is
//! idempotent: discharging a discharged stay returns it unchanged and keeps the original
//! discharge date.

use crate::error::{FrontDeskError, FrontDeskResult, StoreError};
use crate::id::RecordId;
use crate::models::{Admission, AdmissionStatus, Patient, Transition};
use crate::store::Store;
use chrono::Utc;
use frontdesk_types::NonEmptyText;
use std::sync::Arc;

/// Service for the admissions table.
#[derive(Debug)]
pub struct AdmissionService<S> {
    store: Arc<S>,
}

impl<S> Clone for AdmissionService<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: Store> AdmissionService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Inserts an `admitted` record for `patient` in `bed_id`, dated now.
    ///
    /// The bed is not checked here; occupying it is a separate step.
    ///
    /// # Errors
    ///
    /// Returns [`FrontDeskError::AdmissionCreate`] if the store rejects the insert, including
    /// when the patient already has an open admission for the same bed.
    pub fn create(
        &self,
        patient: &Patient,
        bed_id: RecordId,
        opd_reference: Option<NonEmptyText>,
    ) -> FrontDeskResult<Admission> {
        let admission = Admission {
            id: RecordId::new(),
            patient_id: patient.id,
            patient_name: patient.name.clone(),
            bed_id,
            admission_date: Utc::now(),
            discharge_date: None,
            opd_reference,
            status: AdmissionStatus::Admitted,
        };
        let admission = self
            .store
            .insert(admission)
            .map_err(FrontDeskError::AdmissionCreate)?;

        tracing::info!(admission_id = %admission.id, patient_id = %patient.id, %bed_id, "admission created");
        Ok(admission)
    }

    /// Discharges the admission with `id`.
    ///
    /// # Errors
    ///
    /// Returns [`FrontDeskError::AdmissionUpdate`] if no admission has that id.
    pub fn discharge_by_id(&self, id: RecordId) -> FrontDeskResult<Admission> {
        let now = Utc::now();
        let mut outcome = Transition::Unchanged;
        let admission = self
            .store
            .update(id, |row: &mut Admission| {
                outcome = row.discharge(now);
                Ok(())
            })
            .map_err(FrontDeskError::AdmissionUpdate)?;

        match outcome {
            Transition::Applied => tracing::info!(admission_id = %id, "admission discharged"),
            Transition::Unchanged => {
                tracing::debug!(admission_id = %id, "admission already discharged")
            }
        }
        Ok(admission)
    }

    /// Discharges the open admission for (`patient_id`, `bed_id`).
    ///
    /// When nothing is open for the pair, the most recent discharged admission is returned
    /// untouched, or `None` if the pair was never admitted.
    pub fn discharge_for(
        &self,
        patient_id: RecordId,
        bed_id: RecordId,
    ) -> FrontDeskResult<Option<Admission>> {
        let rows: Vec<Admission> = self
            .store
            .select_all()
            .map_err(FrontDeskError::AdmissionUpdate)?;

        // Rows are newest first, so the first match is the latest stay.
        let mut matching = rows
            .into_iter()
            .filter(|a| a.patient_id == patient_id && a.bed_id == bed_id);

        let Some(latest) = matching.next() else {
            tracing::debug!(%patient_id, %bed_id, "no admission to discharge");
            return Ok(None);
        };
        let open = if latest.is_admitted() {
            Some(latest.clone())
        } else {
            matching.find(Admission::is_admitted)
        };

        match open {
            Some(open) => self.discharge_by_id(open.id).map(Some),
            None => Ok(Some(latest)),
        }
    }

    /// Lists all admissions, most recent first.
    pub fn list(&self) -> FrontDeskResult<Vec<Admission>> {
        self.store.select_all().map_err(FrontDeskError::Store)
    }

    /// Finds the admission with `id`.
    pub fn find(&self, id: RecordId) -> FrontDeskResult<Admission> {
        self.list()?
            .into_iter()
            .find(|a| a.id == id)
            .ok_or(FrontDeskError::Store(StoreError::NotFound {
                table: crate::Table::Admissions,
                id,
            }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewPatient;
    use crate::repositories::patients::PatientService;
    use crate::TableStore;

    fn setup() -> (AdmissionService<TableStore>, Patient) {
        let store = Arc::new(TableStore::in_memory());
        let patient = PatientService::new(store.clone())
            .register(NewPatient::parse("Omar Haddad", 61, None).unwrap())
            .unwrap();
        (AdmissionService::new(store), patient)
    }

    #[test]
    fn create_forces_admitted_status() {
        let (admissions, patient) = setup();
        let bed_id = RecordId::new();
        let reference = NonEmptyText::optional("OPD-114");

        let admission = admissions
            .create(&patient, bed_id, reference.clone())
            .unwrap();
        assert_eq!(admission.status, AdmissionStatus::Admitted);
        assert_eq!(admission.discharge_date, None);
        assert_eq!(admission.patient_name, patient.name);
        assert_eq!(admission.opd_reference, reference);
    }

    #[test]
    fn second_open_admission_for_same_pair_is_rejected() {
        let (admissions, patient) = setup();
        let bed_id = RecordId::new();
        admissions.create(&patient, bed_id, None).unwrap();

        let err = admissions
            .create(&patient, bed_id, None)
            .expect_err("already admitted");
        assert!(matches!(err, FrontDeskError::AdmissionCreate(_)));
        assert!(err.is_conflict());
    }

    #[test]
    fn discharge_for_pair_is_idempotent() {
        let (admissions, patient) = setup();
        let bed_id = RecordId::new();
        let admission = admissions.create(&patient, bed_id, None).unwrap();

        let first = admissions
            .discharge_for(patient.id, bed_id)
            .unwrap()
            .expect("admission exists");
        assert_eq!(first.id, admission.id);
        assert_eq!(first.status, AdmissionStatus::Discharged);
        assert!(first.discharge_date.is_some());

        let second = admissions
            .discharge_for(patient.id, bed_id)
            .unwrap()
            .expect("still reported");
        assert_eq!(second, first);
    }

    #[test]
    fn discharge_for_unknown_pair_is_none() {
        let (admissions, patient) = setup();
        assert_eq!(
            admissions.discharge_for(patient.id, RecordId::new()).unwrap(),
            None
        );
    }

    #[test]
    fn discharge_by_id_keeps_first_discharge_date() {
        let (admissions, patient) = setup();
        let admission = admissions.create(&patient, RecordId::new(), None).unwrap();

        let first = admissions.discharge_by_id(admission.id).unwrap();
        let second = admissions.discharge_by_id(admission.id).unwrap();
        assert_eq!(first.discharge_date, second.discharge_date);

        let err = admissions
            .discharge_by_id(RecordId::new())
            .expect_err("unknown admission");
        assert!(matches!(err, FrontDeskError::AdmissionUpdate(_)));
    }
}
