//! Authenticated client for the GestiBank REST backend.
//!
//! [`ProcurementBackend`] is the seam to the backend; [`HttpBackend`] talks
//! to the real one. [`WorkflowService`] runs every mutation through the
//! workflow engine before anything is sent.

pub mod backend;
pub mod dto;
pub mod error;
pub mod http;
pub mod service;
pub mod session;

pub use backend::{Page, ProcurementBackend};
pub use error::{BackendError, ServiceError, SessionError};
pub use http::HttpBackend;
pub use service::{DemandMutation, Statistics, WorkflowService};
pub use session::Session;
