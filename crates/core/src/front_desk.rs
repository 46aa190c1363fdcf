//! Cross-table front-desk workflows.
//!
//! [`FrontDeskService`] bundles the per-table services over one shared store and runs the
//! workflows that touch several tables:
//! - admitting a patient (resolve patient, create admission, occupy bed)
//! - discharging (close the admission, free the bed)
//! - booking an OPD visit for a walk-in
//! - the dashboard summary
//!
//! ## Partial completion
//!
//! Admission steps are applied one after another and nothing is rolled back. If a later step
//! fails, rows written by earlier steps stay in the store and are handed back in the
//! [`AdmitError`], so the caller can report exactly what was left behind.

use crate::config::CoreConfig;
use crate::constants::RECENT_DISCHARGES_LIMIT;
use crate::error::{FrontDeskError, FrontDeskResult};
use crate::id::RecordId;
use crate::models::{
    Admission, Appointment, Bed, InventoryItem, NewPatient, Patient,
};
use crate::repositories::admissions::AdmissionService;
use crate::repositories::beds::BedService;
use crate::repositories::inventory::InventoryService;
use crate::repositories::opd::OpdService;
use crate::repositories::patients::PatientService;
use crate::store::Store;
use crate::validation::{optional_text, required_id};
use crate::views::{self, DashboardSummary};
use chrono::{NaiveDate, Utc};
use frontdesk_types::NonEmptyText;
use std::fmt;
use std::sync::Arc;

/// Who is being admitted.
#[derive(Clone, Debug)]
pub enum PatientRef {
    /// Register this patient as part of the admission.
    New(NewPatient),
    /// Use an already registered patient.
    Existing(RecordId),
}

/// Input to [`FrontDeskService::admit_patient`].
#[derive(Clone, Debug)]
pub struct AdmitRequest {
    pub patient: PatientRef,
    pub bed_id: RecordId,
    pub opd_reference: Option<NonEmptyText>,
}

impl AdmitRequest {
    /// Admission of a patient registered on the spot.
    pub fn new_patient(
        name: &str,
        age: i64,
        phone: Option<&str>,
        bed_id: &str,
        opd_reference: Option<&str>,
    ) -> FrontDeskResult<Self> {
        Ok(Self {
            patient: PatientRef::New(NewPatient::parse(name, age, phone)?),
            bed_id: required_id("bed id", bed_id)?,
            opd_reference: opd_reference.and_then(optional_text),
        })
    }

    /// Admission of an already registered patient.
    pub fn existing_patient(
        patient_id: &str,
        bed_id: &str,
        opd_reference: Option<&str>,
    ) -> FrontDeskResult<Self> {
        Ok(Self {
            patient: PatientRef::Existing(required_id("patient id", patient_id)?),
            bed_id: required_id("bed id", bed_id)?,
            opd_reference: opd_reference.and_then(optional_text),
        })
    }
}

/// The step of the admission workflow that failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdmissionStep {
    Patient,
    Admission,
    Bed,
}

impl fmt::Display for AdmissionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Patient => "patient",
            Self::Admission => "admission",
            Self::Bed => "bed",
        })
    }
}

/// Everything written by a successful admission.
#[derive(Clone, Debug, PartialEq)]
pub struct AdmissionOutcome {
    pub patient: Patient,
    pub admission: Admission,
    pub bed: Bed,
}

/// A failed admission together with whatever earlier steps already wrote.
#[derive(Debug, thiserror::Error)]
#[error("{source}{}", partial_note(.patient, .admission))]
pub struct AdmitError {
    pub step: AdmissionStep,
    #[source]
    pub source: FrontDeskError,
    /// Patient resolved or created before the failure.
    pub patient: Option<Patient>,
    /// Admission row left in the store when the bed step failed.
    pub admission: Option<Admission>,
}

fn partial_note(patient: &Option<Patient>, admission: &Option<Admission>) -> String {
    match (patient, admission) {
        (_, Some(a)) => format!(" (admission {} for patient {} was kept)", a.id, a.patient_id),
        (Some(p), None) => format!(" (patient {} was kept)", p.id),
        (None, None) => String::new(),
    }
}

impl AdmitError {
    fn at(step: AdmissionStep, source: FrontDeskError) -> Self {
        Self {
            step,
            source,
            patient: None,
            admission: None,
        }
    }

    /// Whether any row was written before the failure.
    pub fn is_partial(&self) -> bool {
        self.patient.is_some() || self.admission.is_some()
    }
}

/// Result of a discharge: the admission update and the bed release are independent calls and
/// each reports its own outcome.
#[derive(Debug)]
pub struct DischargeOutcome {
    /// The discharged admission, or `None` when nothing matched.
    pub admission: FrontDeskResult<Option<Admission>>,
    pub bed: FrontDeskResult<Bed>,
}

impl DischargeOutcome {
    pub fn is_ok(&self) -> bool {
        self.admission.is_ok() && self.bed.is_ok()
    }

    /// Collapses both halves into one result, preferring the admission error.
    pub fn into_result(self) -> FrontDeskResult<(Option<Admission>, Bed)> {
        let admission = self.admission?;
        let bed = self.bed?;
        Ok((admission, bed))
    }
}

/// Entry point for front-desk operations over one store.
#[derive(Debug)]
pub struct FrontDeskService<S> {
    cfg: Arc<CoreConfig>,
    patients: PatientService<S>,
    opd: OpdService<S>,
    beds: BedService<S>,
    admissions: AdmissionService<S>,
    inventory: InventoryService<S>,
}

impl<S> Clone for FrontDeskService<S> {
    fn clone(&self) -> Self {
        Self {
            cfg: self.cfg.clone(),
            patients: self.patients.clone(),
            opd: self.opd.clone(),
            beds: self.beds.clone(),
            admissions: self.admissions.clone(),
            inventory: self.inventory.clone(),
        }
    }
}

impl<S: Store> FrontDeskService<S> {
    pub fn new(store: Arc<S>, cfg: Arc<CoreConfig>) -> Self {
        Self {
            patients: PatientService::new(store.clone()),
            opd: OpdService::new(store.clone(), cfg.clone()),
            beds: BedService::new(store.clone()),
            admissions: AdmissionService::new(store.clone()),
            inventory: InventoryService::new(store),
            cfg,
        }
    }

    pub fn config(&self) -> &CoreConfig {
        &self.cfg
    }

    pub fn patients(&self) -> &PatientService<S> {
        &self.patients
    }

    pub fn opd(&self) -> &OpdService<S> {
        &self.opd
    }

    pub fn beds(&self) -> &BedService<S> {
        &self.beds
    }

    pub fn admissions(&self) -> &AdmissionService<S> {
        &self.admissions
    }

    pub fn inventory(&self) -> &InventoryService<S> {
        &self.inventory
    }

    /// Registers a walk-in and puts them in the OPD queue for now.
    ///
    /// If booking fails the patient record stays registered.
    pub fn book_opd_visit(&self, patient: NewPatient) -> FrontDeskResult<(Patient, Appointment)> {
        let patient = self.patients.register(patient)?;
        let appointment = self.opd.book_appointment(&patient, Utc::now())?;
        Ok((patient, appointment))
    }

    /// Books an OPD appointment for a registered patient.
    ///
    /// # Errors
    ///
    /// An unknown patient is reported as [`FrontDeskError::AppointmentCreate`].
    pub fn book_for_patient(&self, patient_id: RecordId) -> FrontDeskResult<(Patient, Appointment)> {
        let patient = self
            .patients
            .lookup(patient_id)
            .map_err(FrontDeskError::AppointmentCreate)?;
        let appointment = self.opd.book_appointment(&patient, Utc::now())?;
        Ok((patient, appointment))
    }

    /// Admits a patient into a bed.
    ///
    /// Steps, in order:
    /// 1. create the patient, or look up the existing one
    /// 2. insert an `admitted` admission record
    /// 3. mark the bed occupied by the patient
    ///
    /// The bed is not checked before step 2. A missing or occupied bed therefore fails at
    /// step 3, after the admission row exists.
    pub fn admit_patient(&self, request: AdmitRequest) -> Result<AdmissionOutcome, AdmitError> {
        let AdmitRequest {
            patient,
            bed_id,
            opd_reference,
        } = request;

        let patient = match patient {
            PatientRef::New(new) => self.patients.register(new),
            PatientRef::Existing(id) => self
                .patients
                .lookup(id)
                .map_err(FrontDeskError::PatientCreate),
        }
        .map_err(|e| AdmitError::at(AdmissionStep::Patient, e))?;

        let admission = match self.admissions.create(&patient, bed_id, opd_reference) {
            Ok(admission) => admission,
            Err(e) => {
                tracing::warn!(patient_id = %patient.id, %bed_id, "admission stopped after patient step: {e}");
                return Err(AdmitError {
                    patient: Some(patient),
                    ..AdmitError::at(AdmissionStep::Admission, e)
                });
            }
        };

        let bed = match self.beds.occupy(bed_id, patient.id) {
            Ok(bed) => bed,
            Err(e) => {
                tracing::warn!(
                    patient_id = %patient.id,
                    admission_id = %admission.id,
                    %bed_id,
                    "admission stopped after admission step: {e}"
                );
                return Err(AdmitError {
                    patient: Some(patient),
                    admission: Some(admission),
                    ..AdmitError::at(AdmissionStep::Bed, e)
                });
            }
        };

        tracing::info!(
            patient_id = %patient.id,
            admission_id = %admission.id,
            %bed_id,
            "patient admitted"
        );
        Ok(AdmissionOutcome {
            patient,
            admission,
            bed,
        })
    }

    /// Discharges the open admission for (`patient_id`, `bed_id`) and frees the bed.
    ///
    /// Both calls always run. Repeating a discharge is harmless.
    pub fn discharge_patient(&self, patient_id: RecordId, bed_id: RecordId) -> DischargeOutcome {
        let admission = self.admissions.discharge_for(patient_id, bed_id);
        let bed = self.beds.release(bed_id);
        log_discharge(&admission, &bed, bed_id);
        DischargeOutcome { admission, bed }
    }

    /// Discharges a specific admission and frees `bed_id`.
    pub fn discharge_admission(&self, admission_id: RecordId, bed_id: RecordId) -> DischargeOutcome {
        let admission = self.admissions.discharge_by_id(admission_id).map(Some);
        let bed = self.beds.release(bed_id);
        log_discharge(&admission, &bed, bed_id);
        DischargeOutcome { admission, bed }
    }

    /// Frees a bed without touching admissions.
    pub fn release_bed(&self, bed_id: RecordId) -> FrontDeskResult<Bed> {
        self.beds.release(bed_id)
    }

    pub fn waiting_queue(&self) -> FrontDeskResult<Vec<Appointment>> {
        let rows = self.opd.list()?;
        Ok(views::waiting_queue(&rows).into_iter().cloned().collect())
    }

    pub fn current_admissions(&self) -> FrontDeskResult<Vec<Admission>> {
        let rows = self.admissions.list()?;
        Ok(views::current_admissions(&rows)
            .into_iter()
            .cloned()
            .collect())
    }

    pub fn recent_discharges(&self) -> FrontDeskResult<Vec<Admission>> {
        let rows = self.admissions.list()?;
        Ok(views::recent_discharges(&rows, RECENT_DISCHARGES_LIMIT)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Items below the configured low-stock threshold.
    pub fn low_stock(&self) -> FrontDeskResult<Vec<InventoryItem>> {
        let rows = self.inventory.list()?;
        Ok(views::low_stock(&rows, self.cfg.low_stock_threshold())
            .into_iter()
            .cloned()
            .collect())
    }

    /// Items expiring within the configured window of `today`.
    pub fn expiring_soon(&self, today: NaiveDate) -> FrontDeskResult<Vec<InventoryItem>> {
        let rows = self.inventory.list()?;
        Ok(
            views::expiring_soon(&rows, today, self.cfg.expiry_window_days())
                .into_iter()
                .cloned()
                .collect(),
        )
    }

    pub fn dashboard(&self, today: NaiveDate) -> FrontDeskResult<DashboardSummary> {
        Ok(DashboardSummary::compute(
            &self.patients.list()?,
            &self.opd.list()?,
            &self.beds.list()?,
            &self.admissions.list()?,
            &self.inventory.list()?,
            self.cfg.low_stock_threshold(),
            today,
            self.cfg.expiry_window_days(),
        ))
    }
}

fn log_discharge(
    admission: &FrontDeskResult<Option<Admission>>,
    bed: &FrontDeskResult<Bed>,
    bed_id: RecordId,
) {
    match (admission, bed) {
        (Ok(Some(a)), Ok(_)) => tracing::info!(admission_id = %a.id, %bed_id, "discharge complete"),
        (Ok(None), Ok(_)) => tracing::info!(%bed_id, "bed released with no open admission"),
        (Err(e), _) => tracing::warn!(%bed_id, "discharge could not update admission: {e}"),
        (_, Err(e)) => tracing::warn!(%bed_id, "discharge could not release bed: {e}"),
    }
}
