//! Registration core of the campus ERP.
//!
//! The [`enrollment`] module holds the business rules for seat allocation and drops; the
//! remaining modules supply the storage, identity, grading, and CSV plumbing around it.

pub mod academics;
pub mod campus;
pub mod config;
pub mod enrollment;
pub mod error;
pub mod grading;
pub mod identity;
pub mod router;
pub mod storage;
pub mod telemetry;
pub mod transfer;

pub use campus::Campus;
pub use error::AppError;
