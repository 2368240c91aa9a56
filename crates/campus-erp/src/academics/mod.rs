//! Students, instructors, courses, sections, and global settings.

pub mod catalog;
pub mod domain;
pub mod settings;

pub use catalog::{CatalogError, CatalogRepository, NewSection};
pub use domain::{
    setting_keys, Course, CourseId, Enrollment, EnrollmentId, EnrollmentStatus, Instructor,
    InstructorId, Schedule, Section, SectionId, Student, StudentId,
};
pub use settings::SettingsStore;
