use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::academics::{EnrollmentId, SectionId};
use crate::storage::StorageError;

/// Successful registration: the new enrollment and the section that absorbed it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub enrollment_id: EnrollmentId,
    pub section_id: SectionId,
}

/// Result of a drop that changed at least one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropReceipt {
    pub affected: usize,
}

/// Expected, user-facing refusals. None of these leave a write behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("Student ID not available")]
    MissingStudentId,
    #[error("You are already registered for this course")]
    AlreadyRegistered,
    #[error("Course capacity is full")]
    CourseFull,
    #[error("All sections of this course are full")]
    AllSectionsFull,
    #[error("The drop deadline ({deadline}) has passed")]
    DropDeadlinePassed { deadline: NaiveDate },
    #[error("No active enrollment found")]
    NoActiveEnrollment,
    #[error("You are not currently enrolled in this course")]
    NotEnrolled,
}

impl Rejection {
    /// Stable machine-readable code for API clients.
    pub fn code(&self) -> &'static str {
        match self {
            Rejection::MissingStudentId => "missing_student_id",
            Rejection::AlreadyRegistered => "already_registered",
            Rejection::CourseFull => "course_full",
            Rejection::AllSectionsFull => "all_sections_full",
            Rejection::DropDeadlinePassed { .. } => "drop_deadline_passed",
            Rejection::NoActiveEnrollment => "no_active_enrollment",
            Rejection::NotEnrolled => "not_enrolled",
        }
    }
}

/// Error raised by the enrollment engine.
#[derive(Debug, thiserror::Error)]
pub enum EnrollmentError {
    #[error(transparent)]
    Rejected(#[from] Rejection),
    #[error("registration failed: {0}")]
    Storage(#[from] StorageError),
}

impl EnrollmentError {
    pub fn rejection(&self) -> Option<Rejection> {
        match self {
            EnrollmentError::Rejected(rejection) => Some(*rejection),
            EnrollmentError::Storage(_) => None,
        }
    }
}

impl From<rusqlite::Error> for EnrollmentError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Storage(StorageError::from(err))
    }
}
