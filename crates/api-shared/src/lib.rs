//! # API Shared
//!
//! Shared utilities and definitions for the front-desk APIs.
//!
//! Contains:
//! - Protobuf-generated types (`pb` module)
//! - Conversion from core models to wire types
//! - Access policy: API key check and request role resolution
//! - Classification of core errors into transport-neutral failure kinds
//! - The health service
//!
//! Used by `api-grpc` and `api-rest` for common functionality.

pub mod pb {
    tonic::include_proto!("frontdesk.v1");
}

pub mod auth;
pub mod convert;
pub mod failure;
pub mod health;

pub const FILE_DESCRIPTOR_SET: &[u8] = tonic::include_file_descriptor_set!("proto_descriptor");

pub use auth::AccessPolicy;
pub use failure::{classify, Failure};
pub use health::HealthService;
pub use pb::*;
