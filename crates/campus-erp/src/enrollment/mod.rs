//! Course registration and drop rules.
//!
//! A student holds at most one REGISTERED enrollment per course, counted across all of
//! the course's sections. New registrations are capped by the summed capacity of the
//! sections and land in the least-loaded section that still has room, lowest section
//! id first on ties. Drops are gated by two dates: a configured cutoff for single
//! enrollments and the `COURSE_DROP_DEADLINE` setting for whole courses.

pub mod deadline;
mod engine;
pub mod outcome;
pub mod placement;
mod queries;
pub mod router;
pub mod views;

#[cfg(test)]
mod tests;

pub use engine::EnrollmentEngine;
pub(crate) use engine::{section_roster, student_schedule};
pub(crate) use queries::registration_in_section;
pub use outcome::{DropReceipt, EnrollmentError, Registration, Rejection};
pub use placement::{choose_section, CourseLoad, SectionLoad};
pub use router::enrollment_router;
pub use views::{CourseAvailability, RegistrationStatus, RosterEntry, ScheduleEntry};
