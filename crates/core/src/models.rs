//! Front-desk data model.
//!
//! These are the rows held by the [`Store`](crate::Store). The application only ever holds
//! transient, refetchable copies; the store owns every entity.
//!
//! State-machine rules for beds and appointments live in [`crate::bed`] and
//! [`crate::appointment`].

use crate::id::RecordId;
use crate::validation::{optional_text, parse_age, parse_stock, required_text};
use crate::FrontDeskResult;
use chrono::{DateTime, NaiveDate, Utc};
use frontdesk_types::{Age, NonEmptyText, StockLevel};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Result of applying a state transition to a row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    /// The row moved to the requested state.
    Applied,
    /// The row was already in the requested state; nothing changed.
    Unchanged,
}

// ============================================================================
// PATIENTS
// ============================================================================

/// A registered patient. Immutable once created.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    pub id: RecordId,
    pub name: NonEmptyText,
    pub age: Age,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<NonEmptyText>,
    pub created_at: DateTime<Utc>,
}

/// Demographic fields supplied at registration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewPatient {
    pub name: NonEmptyText,
    pub age: Age,
    pub phone: Option<NonEmptyText>,
}

impl NewPatient {
    /// Validates raw form input. A blank phone number is treated as absent.
    pub fn parse(name: &str, age: i64, phone: Option<&str>) -> FrontDeskResult<Self> {
        Ok(Self {
            name: required_text("patient name", name)?,
            age: parse_age(age)?,
            phone: phone.and_then(optional_text),
        })
    }

    pub(crate) fn into_patient(self, created_at: DateTime<Utc>) -> Patient {
        Patient {
            id: RecordId::new(),
            name: self.name,
            age: self.age,
            phone: self.phone,
            created_at,
        }
    }
}

// ============================================================================
// APPOINTMENTS
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AppointmentStatus {
    Waiting,
    InProgress,
    Completed,
}

impl AppointmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
        }
    }
}

/// An OPD appointment.
///
/// `queue_number` is assigned once at booking and never changes. `patient_name` is copied from
/// the patient at write time for display; `patient_id` is the reference.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: RecordId,
    #[serde(default)]
    pub patient_id: Option<RecordId>,
    pub patient_name: NonEmptyText,
    pub appointment_time: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub queue_number: u32,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// BEDS
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BedStatus {
    Available,
    Occupied,
}

impl BedStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Occupied => "occupied",
        }
    }
}

/// A ward bed. `patient_id` is set exactly when `status` is [`BedStatus::Occupied`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bed {
    pub id: RecordId,
    pub bed_number: NonEmptyText,
    pub ward: NonEmptyText,
    pub status: BedStatus,
    #[serde(default)]
    pub patient_id: Option<RecordId>,
    pub updated_at: DateTime<Utc>,
}

// ============================================================================
// ADMISSIONS
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AdmissionStatus {
    Admitted,
    Discharged,
}

impl AdmissionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admitted => "admitted",
            Self::Discharged => "discharged",
        }
    }
}

/// An inpatient stay linking a patient to a bed.
///
/// `discharge_date` is set exactly when `status` is [`AdmissionStatus::Discharged`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Admission {
    pub id: RecordId,
    pub patient_id: RecordId,
    pub patient_name: NonEmptyText,
    pub bed_id: RecordId,
    pub admission_date: DateTime<Utc>,
    #[serde(default)]
    pub discharge_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opd_reference: Option<NonEmptyText>,
    pub status: AdmissionStatus,
}

impl Admission {
    pub fn is_admitted(&self) -> bool {
        self.status == AdmissionStatus::Admitted
    }

    /// Marks the stay as discharged. Re-discharging keeps the original discharge date.
    pub fn discharge(&mut self, now: DateTime<Utc>) -> Transition {
        if self.status == AdmissionStatus::Discharged {
            return Transition::Unchanged;
        }
        self.status = AdmissionStatus::Discharged;
        self.discharge_date = Some(now);
        Transition::Applied
    }
}

// ============================================================================
// INVENTORY
// ============================================================================

/// A stocked medicine or consumable.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: RecordId,
    pub name: NonEmptyText,
    pub stock: StockLevel,
    pub expiry_date: NaiveDate,
    pub unit: NonEmptyText,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewInventoryItem {
    pub name: NonEmptyText,
    pub stock: StockLevel,
    pub expiry_date: NaiveDate,
    pub unit: NonEmptyText,
}

impl NewInventoryItem {
    /// Validates raw form input. `expiry_date` is an ISO `YYYY-MM-DD` date.
    pub fn parse(name: &str, stock: i64, expiry_date: &str, unit: &str) -> FrontDeskResult<Self> {
        Ok(Self {
            name: required_text("item name", name)?,
            stock: parse_stock(stock)?,
            expiry_date: crate::validation::parse_date("expiry date", expiry_date)?,
            unit: required_text("unit", unit)?,
        })
    }
}

// ============================================================================
// TEXT FORMS
// ============================================================================

macro_rules! status_text {
    ($ty:ident, $what:literal, [$($variant:ident),+]) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = crate::FrontDeskError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim().to_ascii_lowercase();
                [$(Self::$variant),+]
                    .into_iter()
                    .find(|v| v.as_str() == wanted)
                    .ok_or_else(|| {
                        crate::FrontDeskError::Validation(format!(
                            concat!("unknown ", $what, " '{}'"),
                            s
                        ))
                    })
            }
        }
    };
}

status_text!(AppointmentStatus, "appointment status", [Waiting, InProgress, Completed]);
status_text!(BedStatus, "bed status", [Available, Occupied]);
status_text!(AdmissionStatus, "admission status", [Admitted, Discharged]);
