//! # Front Desk Core
//!
//! Core business logic for the hospital front desk.
//!
//! This crate contains the data model and the workflows that operate on it:
//! - Patient registration and the OPD queue (sequential, recycled queue numbers)
//! - Bed allocation with a two-state bed lifecycle
//! - The admission workflow and the matching discharge calls
//! - Medicine inventory with direct stock overwrite
//! - Read-only dashboard projections
//!
//! All state lives in a [`Store`]; services hold no entity state of their own.
//!
//! **No API concerns**: HTTP/gRPC servers and wire types belong in `api-grpc`, `api-rest`, or
//! `api-shared`.

pub mod appointment;
pub mod bed;
pub mod config;
pub mod constants;
pub mod error;
pub mod front_desk;
pub mod id;
pub mod models;
pub mod queue;
pub mod repositories;
pub mod role;
pub mod store;
pub mod validation;
pub mod views;

pub use config::{AppointmentPatientLink, CoreConfig};
pub use constants::*;
pub use error::{FrontDeskError, FrontDeskResult, StoreError, StoreResult};
pub use front_desk::{
    AdmissionOutcome, AdmissionStep, AdmitError, AdmitRequest, DischargeOutcome,
    FrontDeskService, PatientRef,
};
pub use id::RecordId;
pub use models::{
    Admission, AdmissionStatus, Appointment, AppointmentStatus, Bed, BedStatus, InventoryItem,
    NewInventoryItem, NewPatient, Patient, Transition,
};
pub use queue::{next_queue_number, QueueMode};
pub use role::{Action, Role};
pub use store::{Record, Store, Table, TableStore};
pub use views::DashboardSummary;

pub use frontdesk_types::{Age, NonEmptyText, StockLevel, TextError};
