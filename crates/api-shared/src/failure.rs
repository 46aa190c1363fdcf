//! Transport-neutral classification of core errors.
//!
//! REST maps a [`Failure`] to an HTTP status and gRPC to a status code; both keep the core
//! error's message so callers see which step failed.

use frontdesk_core::FrontDeskError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Failure {
    /// Input was rejected before touching the store.
    Invalid,
    /// The caller's role may not perform the action.
    Forbidden,
    /// The row addressed by the request does not exist.
    NotFound,
    /// A store write or read failed.
    Internal,
}

pub fn classify(err: &FrontDeskError) -> Failure {
    match err {
        FrontDeskError::Validation(_) => Failure::Invalid,
        FrontDeskError::PermissionDenied { .. } => Failure::Forbidden,
        e if e.is_not_found() => Failure::NotFound,
        _ => Failure::Internal,
    }
}
