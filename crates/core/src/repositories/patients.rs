//! Patient registration.
//!
//! Patients are created once per registration and never modified afterwards.

use crate::error::{FrontDeskError, FrontDeskResult, StoreError};
use crate::id::RecordId;
use crate::models::{NewPatient, Patient};
use crate::store::{Store, Table};
use chrono::Utc;
use std::sync::Arc;

/// Service for the patients table.
#[derive(Debug)]
pub struct PatientService<S> {
    store: Arc<S>,
}

impl<S> Clone for PatientService<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: Store> PatientService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Registers a new patient.
    ///
    /// # Errors
    ///
    /// Returns [`FrontDeskError::PatientCreate`] if the store rejects the insert.
    pub fn register(&self, patient: NewPatient) -> FrontDeskResult<Patient> {
        let patient = self
            .store
            .insert(patient.into_patient(Utc::now()))
            .map_err(FrontDeskError::PatientCreate)?;

        tracing::info!(patient_id = %patient.id, "registered patient");
        Ok(patient)
    }

    /// Lists all patients, newest registration first.
    pub fn list(&self) -> FrontDeskResult<Vec<Patient>> {
        self.store.select_all().map_err(FrontDeskError::Store)
    }

    /// Looks up one patient. An unknown id is a [`StoreError::NotFound`].
    pub fn find(&self, id: RecordId) -> FrontDeskResult<Patient> {
        self.lookup(id).map_err(FrontDeskError::Store)
    }

    /// Same as [`PatientService::find`] but leaves the store error unwrapped, so workflows can
    /// attribute the failure to their own step.
    pub(crate) fn lookup(&self, id: RecordId) -> Result<Patient, StoreError> {
        self.store
            .select_all::<Patient>()?
            .into_iter()
            .find(|p| p.id == id)
            .ok_or(StoreError::NotFound {
                table: Table::Patients,
                id,
            })
    }
}
