//! Assessment scores and final letter grades.
//!
//! Only the instructor assigned to a section may touch its grades; the caller's
//! [`Session`](crate::identity::Session) is checked on every operation.

mod book;
pub mod scale;


pub use book::{FinalGrade, GradeBook, GradingError};
pub(crate) use book::stored_final_grade;
pub use scale::{letter_for, weighted_percentage, ComponentScore};
