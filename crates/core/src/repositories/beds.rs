//! Ward beds.

use crate::error::{FrontDeskError, FrontDeskResult};
use crate::id::RecordId;
use crate::models::{Bed, Transition};
use crate::store::Store;
use crate::validation::required_text;
use chrono::Utc;
use std::sync::Arc;

/// Service for the beds table.
#[derive(Debug)]
pub struct BedService<S> {
    store: Arc<S>,
}

impl<S> Clone for BedService<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: Store> BedService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Adds a bed to a ward. New beds are always available.
    pub fn add_bed(&self, bed_number: &str, ward: &str) -> FrontDeskResult<Bed> {
        let bed = Bed::new(
            required_text("bed number", bed_number)?,
            required_text("ward", ward)?,
            Utc::now(),
        );
        let bed = self.store.insert(bed).map_err(FrontDeskError::BedCreate)?;

        tracing::info!(bed_id = %bed.id, bed_number = %bed.bed_number, ward = %bed.ward, "added bed");
        Ok(bed)
    }

    /// Marks a bed occupied by `patient_id`.
    ///
    /// # Errors
    ///
    /// Returns [`FrontDeskError::BedUpdate`] if the bed does not exist or is already occupied.
    pub fn occupy(&self, bed_id: RecordId, patient_id: RecordId) -> FrontDeskResult<Bed> {
        let now = Utc::now();
        let bed = self
            .store
            .update(bed_id, |bed: &mut Bed| bed.occupy(patient_id, now))
            .map_err(FrontDeskError::BedUpdate)?;

        tracing::info!(%bed_id, %patient_id, "bed occupied");
        Ok(bed)
    }

    /// Frees a bed. Freeing an already available bed returns it unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`FrontDeskError::BedUpdate`] if the bed does not exist.
    pub fn release(&self, bed_id: RecordId) -> FrontDeskResult<Bed> {
        let now = Utc::now();
        let mut outcome = Transition::Unchanged;
        let bed = self
            .store
            .update(bed_id, |bed: &mut Bed| {
                outcome = bed.release(now);
                Ok(())
            })
            .map_err(FrontDeskError::BedUpdate)?;

        match outcome {
            Transition::Applied => tracing::info!(%bed_id, "bed released"),
            Transition::Unchanged => tracing::debug!(%bed_id, "bed already available"),
        }
        Ok(bed)
    }

    /// Lists all beds ordered by bed number.
    pub fn list(&self) -> FrontDeskResult<Vec<Bed>> {
        self.store.select_all().map_err(FrontDeskError::Store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BedStatus;
    use crate::TableStore;

    fn service() -> BedService<TableStore> {
        BedService::new(Arc::new(TableStore::in_memory()))
    }

    #[test]
    fn add_bed_validates_and_starts_available() {
        let beds = service();
        let bed = beds.add_bed(" A-1 ", "General").unwrap();
        assert_eq!(bed.bed_number.as_str(), "A-1");
        assert_eq!(bed.status, BedStatus::Available);

        let err = beds.add_bed("A-2", "").expect_err("ward is required");
        assert!(matches!(err, FrontDeskError::Validation(_)));
        assert_eq!(beds.list().unwrap().len(), 1);
    }

    #[test]
    fn occupy_unknown_bed_is_bed_update_error() {
        let err = service()
            .occupy(RecordId::new(), RecordId::new())
            .expect_err("no such bed");
        assert!(matches!(err, FrontDeskError::BedUpdate(_)));
        assert!(err.is_not_found());
    }

    #[test]
    fn release_is_idempotent() {
        let beds = service();
        let bed = beds.add_bed("A-1", "General").unwrap();
        beds.occupy(bed.id, RecordId::new()).unwrap();

        let first = beds.release(bed.id).unwrap();
        assert_eq!(first.status, BedStatus::Available);
        assert_eq!(first.patient_id, None);

        let second = beds.release(bed.id).unwrap();
        assert_eq!(second, first, "second release changes nothing");
    }

    #[test]
    fn occupied_bed_cannot_be_taken_twice() {
        let beds = service();
        let bed = beds.add_bed("A-1", "General").unwrap();
        let first = RecordId::new();
        beds.occupy(bed.id, first).unwrap();

        let err = beds
            .occupy(bed.id, RecordId::new())
            .expect_err("already occupied");
        assert!(err.is_conflict());
        assert_eq!(beds.list().unwrap()[0].patient_id, Some(first));
    }
}
