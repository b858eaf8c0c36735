//! HTTP API for the payroll engine.
//!
//! This module exposes salary structure management, payslip previews and
//! payroll runs as JSON endpoints over axum.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{CreateStructureRequest, PreviewRequest, StartRunRequest};
pub use response::{ApiError, ApiErrorResponse};
pub use state::AppState;
