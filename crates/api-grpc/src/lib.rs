//! # API gRPC
//!
//! gRPC server implementation for the front desk.
//!
//! Handles:
//! - gRPC service setup and API-key authentication
//! - Service implementations delegating to `frontdesk-core`
//! - Mapping core errors onto gRPC status codes
//!
//! Uses `api-shared` for wire types, conversions and the access policy.

#![warn(rust_2018_idioms)]

pub use service::{auth_interceptor, pb, status_from, FrontDeskGrpc};

pub mod service;
