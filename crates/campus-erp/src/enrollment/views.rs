use serde::Serialize;

use super::placement::{CourseLoad, SectionLoad};
use crate::academics::{CourseId, EnrollmentId, Schedule, SectionId, StudentId};

/// Seat summary shown on the course browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourseAvailability {
    pub course_id: CourseId,
    pub capacity: i64,
    pub enrolled: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seats_remaining: Option<i64>,
    pub sections: Vec<SectionLoad>,
}

impl CourseAvailability {
    pub(crate) fn new(course_id: CourseId, load: CourseLoad, sections: Vec<SectionLoad>) -> Self {
        Self {
            course_id,
            capacity: load.capacity,
            enrolled: load.enrolled,
            seats_remaining: load.seats_remaining(),
            sections,
        }
    }
}

/// One REGISTERED course on a student's timetable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleEntry {
    pub enrollment_id: EnrollmentId,
    pub course_id: CourseId,
    pub course_code: String,
    pub course_title: String,
    pub credits: u8,
    pub section_id: SectionId,
    pub schedule: Schedule,
    pub room: String,
    /// "TBA" when the section has no instructor yet.
    pub instructor: String,
}

/// One REGISTERED student in a section roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RosterEntry {
    pub enrollment_id: EnrollmentId,
    pub student_id: StudentId,
    pub name: String,
    pub program: String,
    pub year: u8,
}

/// Registration and drop eligibility for one (student, course) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RegistrationStatus {
    pub registered: bool,
    pub can_drop: bool,
}
