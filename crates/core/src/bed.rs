//! Bed lifecycle.
//!
//! A bed is either `available` or `occupied`:
//!
//! ```text
//! available --occupy(patient)--> occupied
//! occupied  --release-------->   available
//! ```
//!
//! Occupying requires a patient id and is only reached through the admission workflow.
//! Releasing clears the patient id. Releasing an available bed is a no-op. No other states or
//! transitions exist.

use crate::error::{StoreError, StoreResult};
use crate::id::RecordId;
use crate::models::{Bed, BedStatus, Transition};
use chrono::{DateTime, Utc};
use frontdesk_types::NonEmptyText;

impl Bed {
    /// A new bed always starts available.
    pub fn new(bed_number: NonEmptyText, ward: NonEmptyText, now: DateTime<Utc>) -> Self {
        Self {
            id: RecordId::new(),
            bed_number,
            ward,
            status: BedStatus::Available,
            patient_id: None,
            updated_at: now,
        }
    }

    pub fn is_available(&self) -> bool {
        self.status == BedStatus::Available
    }

    /// `available → occupied`. Fails if the bed is already occupied, including by the same
    /// patient.
    pub fn occupy(&mut self, patient_id: RecordId, now: DateTime<Utc>) -> StoreResult<()> {
        if let BedStatus::Occupied = self.status {
            return Err(StoreError::Rejected(format!(
                "bed {} is already occupied",
                self.bed_number
            )));
        }
        self.status = BedStatus::Occupied;
        self.patient_id = Some(patient_id);
        self.updated_at = now;
        Ok(())
    }

    /// `occupied → available`. `updated_at` only moves when the state changes.
    pub fn release(&mut self, now: DateTime<Utc>) -> Transition {
        if self.is_available() {
            return Transition::Unchanged;
        }
        self.status = BedStatus::Available;
        self.patient_id = None;
        self.updated_at = now;
        Transition::Applied
    }

    /// Checks the `patient_id ⇔ occupied` invariant.
    pub fn is_consistent(&self) -> bool {
        self.patient_id.is_some() == (self.status == BedStatus::Occupied)
    }
}
