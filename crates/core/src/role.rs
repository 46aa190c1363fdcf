//! Front-desk roles.
//!
//! A role is a capability flag carried in request scope. It decides which actions a caller may
//! take; it is not an authentication mechanism. Admin and staff can do everything, patients can
//! only see the OPD queue and book a visit.

use crate::{FrontDeskError, FrontDeskResult};
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Role {
    #[default]
    Admin,
    Staff,
    Patient,
}

/// Operations gated by role.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    /// The OPD queue and the next queue number.
    ReadQueue,
    /// Patients, beds, admissions, inventory and dashboard counts.
    ReadRecords,
    RegisterPatient,
    BookAppointment,
    UpdateAppointment,
    ManageBeds,
    Admit,
    Discharge,
    ManageInventory,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Staff => "staff",
            Self::Patient => "patient",
        }
    }

    pub fn permits(self, action: Action) -> bool {
        match self {
            Self::Admin | Self::Staff => true,
            Self::Patient => matches!(action, Action::ReadQueue | Action::BookAppointment),
        }
    }

    pub fn require(self, action: Action) -> FrontDeskResult<()> {
        if self.permits(action) {
            Ok(())
        } else {
            Err(FrontDeskError::PermissionDenied { role: self, action })
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = FrontDeskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "staff" => Ok(Self::Staff),
            "patient" => Ok(Self::Patient),
            other => Err(FrontDeskError::Validation(format!(
                "role must be admin, staff or patient, got '{other}'"
            ))),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::ReadQueue => "view the OPD queue",
            Self::ReadRecords => "read records",
            Self::RegisterPatient => "register patients",
            Self::BookAppointment => "book appointments",
            Self::UpdateAppointment => "update appointments",
            Self::ManageBeds => "manage beds",
            Self::Admit => "admit patients",
            Self::Discharge => "discharge patients",
            Self::ManageInventory => "manage inventory",
        };
        f.write_str(text)
    }
}
