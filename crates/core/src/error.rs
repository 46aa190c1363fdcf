use crate::id::RecordId;
use crate::role::{Action, Role};
use crate::store::Table;

/// Failures reported by a [`Store`](crate::Store).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{table} row {id} not found")]
    NotFound { table: Table, id: RecordId },
    #[error("{table} row conflicts with an existing row: {reason}")]
    Conflict { table: Table, reason: String },
    #[error("{0}")]
    Rejected(String),
    #[error("failed to create data directory: {0}")]
    DataDirCreation(std::io::Error),
    #[error("failed to read table file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to write table file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to serialize {table} table: {source}")]
    Serialization {
        table: Table,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("failed to deserialize {table} table: {source}")]
    Deserialization {
        table: Table,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("store lock poisoned")]
    Poisoned,
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors surfaced by front-desk operations.
///
/// Each store write has its own variant so that a caller can tell which step of a workflow
/// failed. The wrapped [`StoreError`] carries the store's own message.
#[derive(Debug, thiserror::Error)]
pub enum FrontDeskError {
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("role '{role}' is not allowed to {action}")]
    PermissionDenied { role: Role, action: Action },
    #[error("failed to create patient record: {0}")]
    PatientCreate(#[source] StoreError),
    #[error("failed to book appointment: {0}")]
    AppointmentCreate(#[source] StoreError),
    #[error("failed to update appointment status: {0}")]
    AppointmentUpdate(#[source] StoreError),
    #[error("failed to add bed: {0}")]
    BedCreate(#[source] StoreError),
    #[error("failed to update bed status: {0}")]
    BedUpdate(#[source] StoreError),
    #[error("failed to create admission record: {0}")]
    AdmissionCreate(#[source] StoreError),
    #[error("failed to discharge admission: {0}")]
    AdmissionUpdate(#[source] StoreError),
    #[error("failed to add inventory item: {0}")]
    InventoryCreate(#[source] StoreError),
    #[error("failed to update inventory stock: {0}")]
    InventoryUpdate(#[source] StoreError),
    #[error("failed to read from store: {0}")]
    Store(#[source] StoreError),
}

impl FrontDeskError {
    /// Returns the underlying store error, if this failure came from the store.
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            Self::Validation(_) | Self::PermissionDenied { .. } => None,
            Self::PatientCreate(e)
            | Self::AppointmentCreate(e)
            | Self::AppointmentUpdate(e)
            | Self::BedCreate(e)
            | Self::BedUpdate(e)
            | Self::AdmissionCreate(e)
            | Self::AdmissionUpdate(e)
            | Self::InventoryCreate(e)
            | Self::InventoryUpdate(e)
            | Self::Store(e) => Some(e),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self.store_error(), Some(StoreError::NotFound { .. }))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(
            self.store_error(),
            Some(StoreError::Conflict { .. } | StoreError::Rejected(_))
        )
    }
}

pub type FrontDeskResult<T> = std::result::Result<T, FrontDeskError>;
