//! Per-table services.
//!
//! Each service wraps one table of the [`Store`](crate::Store) and maps store failures onto the
//! [`FrontDeskError`](crate::FrontDeskError) variant for that write. Workflows that span tables
//! live in [`crate::front_desk`].

pub mod admissions;
pub mod beds;
pub mod inventory;
pub mod opd;
pub mod patients;

#[cfg(test)]
pub(crate) mod testing;
