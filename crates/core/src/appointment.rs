//! Appointment status progression.
//!
//! Appointments only move forward, and only on explicit operator action:
//!
//! ```text
//! waiting --> in-progress --> completed
//!    \___________________________^
//! ```
//!
//! Leaving `waiting` takes the appointment out of the queue-number computation for good.

use crate::error::{StoreError, StoreResult};
use crate::models::{Appointment, AppointmentStatus, Transition};

impl AppointmentStatus {
    fn rank(self) -> u8 {
        match self {
            Self::Waiting => 0,
            Self::InProgress => 1,
            Self::Completed => 2,
        }
    }

    /// True if moving from `self` to `next` goes forward (or stays put).
    pub fn can_advance_to(self, next: AppointmentStatus) -> bool {
        next.rank() >= self.rank()
    }
}

impl Appointment {
    pub fn is_waiting(&self) -> bool {
        self.status == AppointmentStatus::Waiting
    }

    /// Moves the appointment to `next`. Setting the current status again is a no-op; going
    /// backwards is rejected.
    pub fn advance_to(&mut self, next: AppointmentStatus) -> StoreResult<Transition> {
        if self.status == next {
            return Ok(Transition::Unchanged);
        }
        if !self.status.can_advance_to(next) {
            return Err(StoreError::Rejected(format!(
                "appointment #{} cannot go from {} back to {}",
                self.queue_number, self.status, next
            )));
        }
        self.status = next;
        Ok(Transition::Applied)
    }
}
