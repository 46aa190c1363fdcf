//! OPD queue-number allocation.
//!
//! The next queue number is a live aggregate: one more than the highest number among
//! appointments that are still `waiting`, or [`FIRST_QUEUE_NUMBER`] when nobody is waiting. It
//! is not a stored sequence, so a number is handed out again as soon as the appointment holding
//! the current maximum leaves the waiting set. With #1, #2 and #3 waiting, completing #3 makes
//! the next booking #3 again.

use crate::constants::FIRST_QUEUE_NUMBER;
use crate::error::{StoreError, StoreResult};
use crate::models::{Appointment, AppointmentStatus};
use crate::FrontDeskError;
use std::str::FromStr;

/// How the read-max-then-insert step of a booking is performed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum QueueMode {
    /// Read the maximum and insert under one store lock. Concurrent bookings always get
    /// distinct numbers.
    #[default]
    Serialized,
    /// Read and insert as two separate store calls. Two operators booking at the same moment
    /// can both observe the same maximum and receive the same number.
    Compatible,
}

impl FromStr for QueueMode {
    type Err = FrontDeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "serialized" | "serialised" => Ok(Self::Serialized),
            "compatible" => Ok(Self::Compatible),
            other => Err(FrontDeskError::Validation(format!(
                "queue mode must be 'serialized' or 'compatible', got '{other}'"
            ))),
        }
    }
}

/// Computes the queue number for the next booking from the current appointment rows.
///
/// # Errors
///
/// Returns [`StoreError::Rejected`] when a waiting appointment already holds `u32::MAX`.
pub fn next_queue_number(appointments: &[Appointment]) -> StoreResult<u32> {
    match appointments
        .iter()
        .filter(|a| a.status == AppointmentStatus::Waiting)
        .map(|a| a.queue_number)
        .max()
    {
        None => Ok(FIRST_QUEUE_NUMBER),
        Some(max) => max
            .checked_add(1)
            .ok_or_else(|| StoreError::Rejected("queue full".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RecordId;
    use chrono::Utc;
    use frontdesk_types::NonEmptyText;

    fn appointment(queue_number: u32, status: AppointmentStatus) -> Appointment {
        Appointment {
            id: RecordId::new(),
            patient_id: None,
            patient_name: NonEmptyText::new("Walk-in").unwrap(),
            appointment_time: Utc::now(),
            status,
            queue_number,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn empty_queue_starts_at_one() {
        assert_eq!(next_queue_number(&[]).unwrap(), 1);
    }

    #[test]
    fn ignores_appointments_that_left_the_queue() {
        let rows = vec![
            appointment(1, AppointmentStatus::Waiting),
            appointment(7, AppointmentStatus::Completed),
            appointment(5, AppointmentStatus::InProgress),
        ];
        assert_eq!(next_queue_number(&rows).unwrap(), 2);
    }

    #[test]
    fn only_completed_rows_means_restart_at_one() {
        let rows = vec![
            appointment(1, AppointmentStatus::Completed),
            appointment(2, AppointmentStatus::Completed),
        ];
        assert_eq!(next_queue_number(&rows).unwrap(), 1);
    }

    #[test]
    fn gaps_below_the_maximum_are_not_filled() {
        let rows = vec![
            appointment(1, AppointmentStatus::Completed),
            appointment(4, AppointmentStatus::Waiting),
        ];
        assert_eq!(next_queue_number(&rows).unwrap(), 5);
    }

    #[test]
    fn highest_possible_number_is_never_handed_out_twice() {
        let rows = vec![appointment(u32::MAX, AppointmentStatus::Waiting)];
        let err = next_queue_number(&rows).expect_err("no number above u32::MAX");
        assert!(matches!(err, StoreError::Rejected(ref msg) if msg == "queue full"));

        let rows = vec![appointment(u32::MAX, AppointmentStatus::Completed)];
        assert_eq!(next_queue_number(&rows).unwrap(), 1);
    }

    #[test]
    fn parses_modes() {
        assert_eq!("Serialized".parse::<QueueMode>().unwrap(), QueueMode::Serialized);
        assert_eq!("compatible".parse::<QueueMode>().unwrap(), QueueMode::Compatible);
        assert!("random".parse::<QueueMode>().is_err());
    }
}
