//! OPD appointments and the walk-in queue.
//!
//! Booking assigns the next queue number (see [`crate::queue`]) and inserts the appointment in
//! `waiting`. How the read-max and the insert are combined depends on the configured
//! [`QueueMode`].

use crate::config::{AppointmentPatientLink, CoreConfig};
use crate::error::{FrontDeskError, FrontDeskResult};
use crate::id::RecordId;
use crate::models::{Appointment, AppointmentStatus, Patient, Transition};
use crate::queue::{next_queue_number, QueueMode};
use crate::store::Store;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Service for the appointments table.
#[derive(Debug)]
pub struct OpdService<S> {
    store: Arc<S>,
    cfg: Arc<CoreConfig>,
}

impl<S> Clone for OpdService<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            cfg: self.cfg.clone(),
        }
    }
}

impl<S: Store> OpdService<S> {
    pub fn new(store: Arc<S>, cfg: Arc<CoreConfig>) -> Self {
        Self { store, cfg }
    }

    /// The number the next booking would receive right now.
    pub fn next_queue_number(&self) -> FrontDeskResult<u32> {
        let rows: Vec<Appointment> = self.store.select_all().map_err(FrontDeskError::Store)?;
        next_queue_number(&rows).map_err(FrontDeskError::Store)
    }

    /// Books a waiting appointment for `patient`.
    ///
    /// The patient name is copied from the patient record. Whether the patient id is stored
    /// depends on [`AppointmentPatientLink`].
    ///
    /// # Errors
    ///
    /// Returns [`FrontDeskError::AppointmentCreate`] if reading the queue or inserting the
    /// appointment fails, or if the queue has no number left to hand out.
    pub fn book_appointment(
        &self,
        patient: &Patient,
        appointment_time: DateTime<Utc>,
    ) -> FrontDeskResult<Appointment> {
        let patient_id = match self.cfg.patient_link() {
            AppointmentPatientLink::Enforce => Some(patient.id),
            AppointmentPatientLink::Detached => None,
        };
        let draft = |queue_number: u32| Appointment {
            id: RecordId::new(),
            patient_id,
            patient_name: patient.name.clone(),
            appointment_time,
            status: AppointmentStatus::Waiting,
            queue_number,
            created_at: Utc::now(),
        };

        let appointment = match self.cfg.queue_mode() {
            QueueMode::Serialized => self
                .store
                .insert_with(|rows: &[Appointment]| next_queue_number(rows).map(draft)),
            QueueMode::Compatible => self
                .store
                .select_all::<Appointment>()
                .and_then(|rows| next_queue_number(&rows))
                .and_then(|number| self.store.insert(draft(number))),
        }
        .map_err(FrontDeskError::AppointmentCreate)?;

        tracing::info!(
            appointment_id = %appointment.id,
            queue_number = appointment.queue_number,
            "booked OPD appointment"
        );
        Ok(appointment)
    }

    /// Moves an appointment forward through waiting → in-progress → completed.
    ///
    /// Re-applying the current status is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`FrontDeskError::AppointmentUpdate`] for an unknown id or a backward move.
    pub fn update_status(
        &self,
        id: RecordId,
        status: AppointmentStatus,
    ) -> FrontDeskResult<Appointment> {
        let mut outcome = Transition::Unchanged;
        let appointment = self
            .store
            .update(id, |row: &mut Appointment| {
                outcome = row.advance_to(status)?;
                Ok(())
            })
            .map_err(|e| {
                tracing::warn!(appointment_id = %id, %status, "appointment update refused: {e}");
                FrontDeskError::AppointmentUpdate(e)
            })?;

        if outcome == Transition::Applied {
            tracing::info!(appointment_id = %id, %status, "appointment status changed");
        }
        Ok(appointment)
    }

    /// Lists all appointments in queue-number order.
    pub fn list(&self) -> FrontDeskResult<Vec<Appointment>> {
        self.store.select_all().map_err(FrontDeskError::Store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreResult;
    use crate::models::NewPatient;
    use crate::repositories::patients::PatientService;
    use crate::repositories::testing::FlakyStore;
    use crate::store::Record;
    use crate::{Table, TableStore};
    use std::sync::atomic::{AtomicBool, Ordering};

    fn cfg(mode: QueueMode) -> Arc<CoreConfig> {
        Arc::new(CoreConfig::default().with_queue_mode(mode))
    }

    fn patient(store: &Arc<TableStore>, name: &str) -> Patient {
        PatientService::new(store.clone())
            .register(NewPatient::parse(name, 30, None).unwrap())
            .unwrap()
    }

    #[test]
    fn bookings_without_departures_are_numbered_one_to_n() {
        let store = Arc::new(TableStore::in_memory());
        let opd = OpdService::new(store.clone(), cfg(QueueMode::Serialized));
        let p = patient(&store, "Sam");

        let numbers: Vec<u32> = (0..6)
            .map(|_| opd.book_appointment(&p, Utc::now()).unwrap().queue_number)
            .collect();
        assert_eq!(numbers, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn completing_the_highest_number_recycles_it() {
        let store = Arc::new(TableStore::in_memory());
        let opd = OpdService::new(store.clone(), cfg(QueueMode::Serialized));
        let p = patient(&store, "Sam");

        let booked: Vec<Appointment> = (0..3)
            .map(|_| opd.book_appointment(&p, Utc::now()).unwrap())
            .collect();
        assert_eq!(booked[2].queue_number, 3);

        opd.update_status(booked[2].id, AppointmentStatus::Completed)
            .unwrap();
        let next = opd.book_appointment(&p, Utc::now()).unwrap();
        assert_eq!(next.queue_number, 3, "vacated maximum is reused");
    }

    #[test]
    fn starting_a_consultation_also_vacates_the_number() {
        let store = Arc::new(TableStore::in_memory());
        let opd = OpdService::new(store.clone(), cfg(QueueMode::Compatible));
        let p = patient(&store, "Sam");

        let first = opd.book_appointment(&p, Utc::now()).unwrap();
        let second = opd.book_appointment(&p, Utc::now()).unwrap();
        opd.update_status(second.id, AppointmentStatus::InProgress)
            .unwrap();

        assert_eq!(opd.next_queue_number().unwrap(), 2);
        assert_eq!(first.queue_number, 1);
    }

    #[test]
    fn patient_link_modes() {
        let store = Arc::new(TableStore::in_memory());
        let p = patient(&store, "Lena Ortiz");

        let linked = OpdService::new(store.clone(), Arc::new(CoreConfig::default()))
            .book_appointment(&p, Utc::now())
            .unwrap();
        assert_eq!(linked.patient_id, Some(p.id));
        assert_eq!(linked.patient_name, p.name);

        let detached_cfg =
            CoreConfig::default().with_patient_link(AppointmentPatientLink::Detached);
        let detached = OpdService::new(store, Arc::new(detached_cfg))
            .book_appointment(&p, Utc::now())
            .unwrap();
        assert_eq!(detached.patient_id, None);
        assert_eq!(detached.patient_name.as_str(), "Lena Ortiz");
    }

    #[test]
    fn backward_status_change_is_rejected_and_same_status_is_a_no_op() {
        let store = Arc::new(TableStore::in_memory());
        let opd = OpdService::new(store.clone(), cfg(QueueMode::Serialized));
        let p = patient(&store, "Sam");
        let a = opd.book_appointment(&p, Utc::now()).unwrap();

        let done = opd.update_status(a.id, AppointmentStatus::Completed).unwrap();
        let again = opd.update_status(a.id, AppointmentStatus::Completed).unwrap();
        assert_eq!(done, again);

        let err = opd
            .update_status(a.id, AppointmentStatus::Waiting)
            .expect_err("cannot go back");
        assert!(matches!(err, FrontDeskError::AppointmentUpdate(_)));

        let err = opd
            .update_status(RecordId::new(), AppointmentStatus::Completed)
            .expect_err("unknown id");
        assert!(err.is_not_found());
    }

    #[test]
    fn rejected_insert_maps_to_appointment_create_in_both_modes() {
        for mode in [QueueMode::Serialized, QueueMode::Compatible] {
            let store = Arc::new(FlakyStore::new().fail_inserts(Table::Appointments));
            let p = PatientService::new(store.clone())
                .register(NewPatient::parse("Sam", 30, None).unwrap())
                .unwrap();

            let opd = OpdService::new(store.clone(), cfg(mode));
            let err = opd
                .book_appointment(&p, Utc::now())
                .expect_err("insert refused");
            assert!(matches!(err, FrontDeskError::AppointmentCreate(_)), "{mode:?}");
            assert!(err.to_string().starts_with("failed to book appointment"));
            assert!(store.inner.select_all::<Appointment>().unwrap().is_empty());
        }
    }

    #[test]
    fn full_queue_refuses_the_booking() {
        for mode in [QueueMode::Serialized, QueueMode::Compatible] {
            let store = Arc::new(TableStore::in_memory());
            let p = patient(&store, "Sam");
            store
                .insert(Appointment {
                    id: RecordId::new(),
                    patient_id: Some(p.id),
                    patient_name: p.name.clone(),
                    appointment_time: Utc::now(),
                    status: AppointmentStatus::Waiting,
                    queue_number: u32::MAX,
                    created_at: Utc::now(),
                })
                .unwrap();

            let opd = OpdService::new(store.clone(), cfg(mode));
            let err = opd
                .book_appointment(&p, Utc::now())
                .expect_err("no number left");
            assert!(matches!(err, FrontDeskError::AppointmentCreate(_)), "{mode:?}");
            assert!(err.to_string().ends_with("queue full"));
            assert_eq!(opd.list().unwrap().len(), 1);
        }
    }

    /// Lets a second operator book between this operator's queue read and insert.
    struct RacingStore {
        inner: Arc<TableStore>,
        rival: Patient,
        fired: AtomicBool,
    }

    impl RacingStore {
        fn rival_books(&self) {
            if !self.fired.swap(true, Ordering::SeqCst) {
                let rival = OpdService::new(self.inner.clone(), cfg(QueueMode::Serialized));
                rival.book_appointment(&self.rival, Utc::now()).unwrap();
            }
        }
    }

    impl Store for RacingStore {
        fn select_all<R: Record>(&self) -> StoreResult<Vec<R>> {
            let rows = self.inner.select_all::<R>()?;
            if R::TABLE == crate::Table::Appointments {
                self.rival_books();
            }
            Ok(rows)
        }

        fn insert<R: Record>(&self, row: R) -> StoreResult<R> {
            self.inner.insert(row)
        }

        fn update<R, F>(&self, id: RecordId, patch: F) -> StoreResult<R>
        where
            R: Record,
            F: FnOnce(&mut R) -> StoreResult<()>,
        {
            self.inner.update(id, patch)
        }

        fn insert_with<R, F>(&self, build: F) -> StoreResult<R>
        where
            R: Record,
            F: FnOnce(&[R]) -> StoreResult<R>,
        {
            if R::TABLE == crate::Table::Appointments {
                self.rival_books();
            }
            self.inner.insert_with(build)
        }
    }

    fn race(mode: QueueMode) -> Vec<u32> {
        let inner = Arc::new(TableStore::in_memory());
        let me = patient(&inner, "First Operator's Patient");
        let rival = patient(&inner, "Second Operator's Patient");
        let racing = Arc::new(RacingStore {
            inner: inner.clone(),
            rival,
            fired: AtomicBool::new(false),
        });

        OpdService::new(racing, cfg(mode))
            .book_appointment(&me, Utc::now())
            .unwrap();

        let mut numbers: Vec<u32> = inner
            .select_all::<Appointment>()
            .unwrap()
            .into_iter()
            .map(|a| a.queue_number)
            .collect();
        numbers.sort_unstable();
        numbers
    }

    #[test]
    fn compatible_mode_reproduces_duplicate_numbers() {
        assert_eq!(race(QueueMode::Compatible), vec![1, 1]);
    }

    #[test]
    fn serialized_mode_never_duplicates() {
        assert_eq!(race(QueueMode::Serialized), vec![1, 2]);
    }

    #[test]
    fn concurrent_serialized_bookings_get_distinct_numbers() {
        let store = Arc::new(TableStore::in_memory());
        let opd = OpdService::new(store.clone(), cfg(QueueMode::Serialized));
        let p = patient(&store, "Sam");

        std::thread::scope(|scope| {
            for _ in 0..8 {
                let opd = opd.clone();
                let p = p.clone();
                scope.spawn(move || {
                    for _ in 0..5 {
                        opd.book_appointment(&p, Utc::now()).unwrap();
                    }
                });
            }
        });

        let mut numbers: Vec<u32> = opd.list().unwrap().iter().map(|a| a.queue_number).collect();
        numbers.sort_unstable();
        assert_eq!(numbers, (1..=40).collect::<Vec<u32>>());
    }
}
